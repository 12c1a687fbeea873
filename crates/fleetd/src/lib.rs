//! fleetd - fleet telemetry interpretation daemon.
//!
//! Turns raw predictive telemetry rows into human-readable interpretations:
//! normalized evidence, a risk classification, prioritized recommendations,
//! and a narrative summary. Workflows run through a validated step graph or
//! a deterministic sequential runner; both produce identical results.

pub mod cohort;
pub mod config;
pub mod consolidate;
pub mod evidence;
pub mod mart;
pub mod narrative;
pub mod orchestrator;
pub mod recommend;
pub mod reference;
pub mod risk;
pub mod routes;
pub mod scoring;
pub mod server;
pub mod textgen;

pub use config::Config;
pub use narrative::NarrativeComposer;
pub use orchestrator::{
    CohortWorkflowRequest, VinWorkflowRequest, WorkflowOrchestrator,
};
pub use server::AppState;
