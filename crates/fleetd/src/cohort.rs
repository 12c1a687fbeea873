//! Cohort aggregation.
//!
//! Fleet-level analog of the VIN pipeline: builds metric and anomaly models
//! from raw cohort rows, derives the risk distribution, and answers bounded
//! questions about the cohort. Row-level defects (unresolvable name or
//! value) are skipped silently, same policy as evidence normalization.

use fleet_common::{CohortAnomaly, CohortMetric, RawRow};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metric-name prefix that feeds the risk distribution.
const RISK_METRIC_PREFIX: &str = "risk_";

/// Default severity when an anomaly row does not carry one.
const DEFAULT_SEVERITY: &str = "MEDIUM";

/// Build metrics from raw rows. Rows missing a resolvable name or value
/// are skipped.
pub fn build_metrics(rows: &[RawRow]) -> Vec<CohortMetric> {
    let mut metrics = Vec::new();
    for row in rows {
        let Some(name) = string_field(row, &["metric_name", "name"]) else {
            continue;
        };
        let Some(value) = numeric_field(row, &["metric_value", "value"]) else {
            continue;
        };
        metrics.push(CohortMetric {
            name,
            value,
            unit: string_field(row, &["unit"]),
            description: string_field(row, &["description"]),
        });
    }
    metrics
}

/// Build anomalies from raw rows. Title and description are required;
/// everything else has defaults.
pub fn build_anomalies(rows: &[RawRow]) -> Vec<CohortAnomaly> {
    let mut anomalies = Vec::new();
    for row in rows {
        let Some(title) = string_field(row, &["title"]) else {
            continue;
        };
        let Some(description) = string_field(row, &["description"]) else {
            continue;
        };

        let affected_vin_count = row
            .get("affected_vin_count")
            .and_then(Value::as_u64)
            .unwrap_or(1);
        let severity =
            string_field(row, &["severity"]).unwrap_or_else(|| DEFAULT_SEVERITY.to_string());
        let related_signals = row
            .get("related_signals")
            .and_then(Value::as_array)
            .map(|codes| {
                codes
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        anomalies.push(CohortAnomaly {
            title,
            description,
            affected_vin_count,
            severity,
            related_signals,
        });
    }
    anomalies
}

/// Derive the risk distribution from `risk_*` metric rows.
///
/// The prefix is stripped and the remainder uppercased as the bucket key.
/// Returns `None` when no such rows exist.
pub fn risk_distribution(rows: &[RawRow]) -> Option<BTreeMap<String, i64>> {
    let mut distribution = BTreeMap::new();
    for row in rows {
        let Some(name) = string_field(row, &["metric_name", "name"]) else {
            continue;
        };
        let Some(bucket) = name.strip_prefix(RISK_METRIC_PREFIX) else {
            continue;
        };
        let Some(value) = numeric_field(row, &["metric_value", "value"]) else {
            continue;
        };
        distribution.insert(bucket.to_uppercase(), value as i64);
    }

    if distribution.is_empty() {
        None
    } else {
        Some(distribution)
    }
}

/// Baseline cohort summary sentence keyed off anomaly severity.
pub fn generate_summary(anomalies: &[CohortAnomaly]) -> String {
    if anomalies.iter().any(CohortAnomaly::is_high_severity) {
        "Cohort shows high-severity anomalies and requires immediate attention.".to_string()
    } else if !anomalies.is_empty() {
        "Cohort shows emerging anomalies; monitor closely.".to_string()
    } else {
        "Cohort shows no anomalies in the current window.".to_string()
    }
}

/// Bounded cohort chat answer. Reports only numbers present in context and
/// never fabricates counts.
pub fn answer_question(
    risk_distribution: Option<&BTreeMap<String, i64>>,
    anomaly_count: Option<usize>,
) -> String {
    if let Some(distribution) = risk_distribution {
        let pairs: Vec<String> = distribution
            .iter()
            .map(|(level, count)| format!("{}={}", level, count))
            .collect();
        return format!("Cohort risk distribution: {}.", pairs.join(", "));
    }

    if let Some(count) = anomaly_count {
        return format!("The cohort currently has {} recorded anomaly(ies).", count);
    }

    "I can summarize cohort metrics, anomalies, and risk distribution once an \
     interpretation has been generated."
        .to_string()
}

fn string_field(row: &RawRow, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        if let Some(Value::String(s)) = row.get(*alias) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

fn numeric_field(row: &RawRow, aliases: &[&str]) -> Option<f64> {
    for alias in aliases {
        match row.get(*alias) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(v) = s.trim().parse::<f64>() {
                    return Some(v);
                }
            }
            _ => {}
        }
    }
    None
}
