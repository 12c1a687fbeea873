//! Evidence consolidation.
//!
//! Aggregates the full pre-filter evidence sequence into an auditable
//! per-source, per-signal rollup. Consumed as a lookup structure by the VIN
//! artifact and audit views; grouping key order is not significant.

use fleet_common::{EvidenceItem, EvidenceRollup, EvidenceSummary};
use std::collections::BTreeMap;

/// Group evidence by `(source_model, signal_code)` and compute the rollup.
pub fn consolidate(evidence: &[EvidenceItem]) -> EvidenceSummary {
    let mut grouped: BTreeMap<_, BTreeMap<String, Vec<&EvidenceItem>>> = BTreeMap::new();

    for item in evidence {
        grouped
            .entry(item.source_model)
            .or_default()
            .entry(item.signal_code.clone())
            .or_default()
            .push(item);
    }

    let mut summary: EvidenceSummary = BTreeMap::new();
    for (source, signals) in grouped {
        let rollups = summary.entry(source).or_default();
        for (code, items) in signals {
            let occurrences = items.len();
            let max_confidence = items.iter().map(|i| i.confidence).fold(f64::MIN, f64::max);
            let avg_confidence =
                items.iter().map(|i| i.confidence).sum::<f64>() / occurrences as f64;
            let first_seen = items.iter().map(|i| i.observed_at).min().unwrap_or_default();
            let last_seen = items.iter().map(|i| i.observed_at).max().unwrap_or_default();

            rollups.insert(
                code,
                EvidenceRollup {
                    description: items[0].description.clone(),
                    occurrences,
                    max_confidence,
                    avg_confidence,
                    first_seen,
                    last_seen,
                },
            );
        }
    }

    summary
}
