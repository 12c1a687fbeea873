//! HTTP payload types for the fleetd API.

use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/vin/interpret`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VinInterpretRequest {
    pub vin: String,
}

/// Request body for `POST /v1/cohort/interpret`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortInterpretRequest {
    pub cohort_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_description: Option<String>,
}

/// Request body for `POST /v1/chat`.
///
/// `context` carries structured facts from a previous interpretation
/// (vin / cohort_id, risk_level, evidence_summary, recommendations,
/// anomaly_count). The reply never claims anything beyond it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Response body for `POST /v1/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub request_id: String,
}

/// Response body for `GET /v1/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub graph_engine: bool,
    pub textgen_enabled: bool,
}
