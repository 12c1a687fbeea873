//! Shared types for the fleet interpreter.
//!
//! Data model for evidence, recommendations, and interpretations, plus the
//! error taxonomy and HTTP payload types used by fleetd.

pub mod api;
pub mod error;
pub mod types;

pub use api::{
    ChatRequest, ChatResponse, CohortInterpretRequest, HealthResponse, VinInterpretRequest,
};
pub use error::FleetError;
pub use types::{
    CohortAnomaly, CohortInterpretation, CohortMetric, EvidenceItem, EvidenceRollup,
    EvidenceSummary, RawRow, Recommendation, ReferenceEntry, RiskLevel, SourceModel, Urgency,
    VinInterpretation,
};
