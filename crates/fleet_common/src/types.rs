//! Core data model for VIN and cohort interpretations.
//!
//! Every entity here is constructed fresh per request, immutable after
//! construction, and owned by the interpretation that contains it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A raw upstream mart row, shape unknown until normalization.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Origin dataset of a predictive signal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceModel {
    /// Machine health snapshot.
    Mh,
    /// Maintenance prediction triggers.
    Mp,
    /// Failure-impact model root causes.
    Fim,
}

impl fmt::Display for SourceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SourceModel::Mh => "MH",
            SourceModel::Mp => "MP",
            SourceModel::Fim => "FIM",
        };
        write!(f, "{}", tag)
    }
}

/// Risk level derived from the evidence confidence distribution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Elevated,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Elevated => "ELEVATED",
            RiskLevel::High => "HIGH",
        };
        write!(f, "{}", tag)
    }
}

/// Urgency of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    High,
    Medium,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Urgency::High => "HIGH",
            Urgency::Medium => "MEDIUM",
        };
        write!(f, "{}", tag)
    }
}

/// One atomic predictive signal, normalized from a raw mart row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source_model: SourceModel,
    pub signal_code: String,
    pub description: String,
    /// Closed interval [0, 1].
    pub confidence: f64,
    pub observed_at: DateTime<Utc>,
}

/// Reference dictionary entry for a signal code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub description: String,
    #[serde(default)]
    pub family: Option<String>,
}

/// An actionable item backed by at least one evidence item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub rationale: String,
    pub urgency: Urgency,
    pub suggested_action: String,
    pub evidence: Vec<EvidenceItem>,
}

/// Audit rollup for one `(source_model, signal_code)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRollup {
    pub description: String,
    pub occurrences: usize,
    pub max_confidence: f64,
    pub avg_confidence: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Two-level audit structure: source model -> signal code -> rollup.
pub type EvidenceSummary = BTreeMap<SourceModel, BTreeMap<String, EvidenceRollup>>;

/// Root artifact for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VinInterpretation {
    pub vin: String,
    pub summary: String,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_summary: Option<EvidenceSummary>,
    pub model_version: String,
}

/// One fleet-level metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortMetric {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One fleet-level anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortAnomaly {
    pub title: String,
    pub description: String,
    pub affected_vin_count: u64,
    /// Free-form tag, compared case-insensitively against "HIGH".
    pub severity: String,
    pub related_signals: Vec<String>,
}

impl CohortAnomaly {
    /// Case-insensitive high-severity check.
    pub fn is_high_severity(&self) -> bool {
        self.severity.eq_ignore_ascii_case("HIGH")
    }
}

/// Root artifact for one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortInterpretation {
    pub cohort_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_description: Option<String>,
    pub summary: String,
    pub metrics: Vec<CohortMetric>,
    pub anomalies: Vec<CohortAnomaly>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_distribution: Option<BTreeMap<String, i64>>,
    pub model_version: String,
}
