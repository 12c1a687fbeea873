//! Error types for the fleet interpreter.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Invalid VIN format: {0}")]
    InvalidVin(String),

    #[error("Invalid cohort id: {0}")]
    InvalidCohort(String),

    #[error("Mart error: {0}")]
    Mart(String),

    #[error("Reference error: {0}")]
    Reference(String),

    #[error("Text generation error: {0}")]
    TextGen(String),

    #[error("Orchestration error: {0}")]
    Orchestration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FleetError {
    /// Stable numeric code for transport layers.
    pub fn code(&self) -> i32 {
        match self {
            FleetError::InvalidVin(_) => -32000,
            FleetError::InvalidCohort(_) => -32001,
            FleetError::Mart(_) => -32002,
            FleetError::Reference(_) => -32003,
            FleetError::TextGen(_) => -32004,
            FleetError::Orchestration(_) => -32005,
            FleetError::Config(_) => -32006,
            FleetError::Io(_) => -32007,
            FleetError::Json(_) => -32700,
        }
    }
}
