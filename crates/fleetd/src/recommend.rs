//! Recommendation building.
//!
//! Turns normalized evidence into a deduplicated, urgency-ranked action
//! list. Deduplication keeps the first occurrence of a signal code in input
//! order: input order encodes source priority (MH before MP before FIM), so
//! a later duplicate is dropped even when its confidence is higher.

use fleet_common::{EvidenceItem, Recommendation, Urgency};
use std::collections::HashSet;

/// Minimum confidence for an item to produce a recommendation.
pub const RECOMMEND_THRESHOLD: f64 = 0.7;

/// Confidence at or above which a recommendation is HIGH urgency.
pub const HIGH_URGENCY_THRESHOLD: f64 = 0.85;

/// Fixed operator instruction attached to every recommendation.
pub const SUGGESTED_ACTION: &str =
    "Schedule diagnostic inspection and review the related predictive signals.";

/// Build recommendations from evidence, preserving retained-item order.
pub fn build(evidence: &[EvidenceItem]) -> Vec<Recommendation> {
    let mut seen_codes: HashSet<&str> = HashSet::new();
    let mut recommendations = Vec::new();

    for item in evidence {
        if item.confidence < RECOMMEND_THRESHOLD {
            continue;
        }
        if !seen_codes.insert(item.signal_code.as_str()) {
            continue;
        }

        let urgency = if item.confidence >= HIGH_URGENCY_THRESHOLD {
            Urgency::High
        } else {
            Urgency::Medium
        };

        recommendations.push(Recommendation {
            title: format!("Investigate {}", item.description),
            rationale: format!(
                "Signal {} reported with {}% confidence.",
                item.signal_code,
                (item.confidence * 100.0).round() as i64
            ),
            urgency,
            suggested_action: SUGGESTED_ACTION.to_string(),
            evidence: vec![item.clone()],
        });
    }

    recommendations
}
