//! Evidence normalization.
//!
//! Converts raw heterogeneous mart rows (MH, MP, FIM schemas) into canonical
//! evidence items. Each logical field may appear under several upstream
//! column names; resolution is first-present-wins over a fixed alias list.
//! Rows with no resolvable signal code are skipped silently - that is the
//! leniency policy for row-level defects, not an error path.

use chrono::{DateTime, Utc};
use fleet_common::{EvidenceItem, RawRow, ReferenceEntry, SourceModel};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Signal code aliases, highest priority first.
const CODE_ALIASES: &[&str] = &["signal_code", "hi_code", "trigger_code", "rootcause_code"];

/// Confidence aliases, highest priority first.
const CONFIDENCE_ALIASES: &[&str] = &[
    "confidence",
    "trigger_probability",
    "rootcause_probability",
];

/// Observation timestamp aliases, highest priority first.
const TIMESTAMP_ALIASES: &[&str] = &["observed_at", "trigger_time", "event_time"];

/// Fallback description for codes missing from the reference map.
pub const NO_DESCRIPTION: &str = "No description available";

/// Sentinel family value meaning "no family known".
const UNKNOWN_FAMILY: &str = "UNKNOWN";

/// Normalize all three sources into one flat evidence sequence.
///
/// Output order is MH rows, then MP, then FIM, preserving row order within
/// each source. This order is what downstream deduplication keys off.
pub fn normalize(
    mh_rows: &[RawRow],
    mp_rows: &[RawRow],
    fim_rows: &[RawRow],
    reference_map: &HashMap<String, ReferenceEntry>,
) -> Vec<EvidenceItem> {
    let mut evidence = Vec::new();
    normalize_source(SourceModel::Mh, mh_rows, reference_map, &mut evidence);
    normalize_source(SourceModel::Mp, mp_rows, reference_map, &mut evidence);
    normalize_source(SourceModel::Fim, fim_rows, reference_map, &mut evidence);
    evidence
}

fn normalize_source(
    source: SourceModel,
    rows: &[RawRow],
    reference_map: &HashMap<String, ReferenceEntry>,
    out: &mut Vec<EvidenceItem>,
) {
    for row in rows {
        let Some(code) = resolve_code(row) else {
            debug!("Skipping {} row with no resolvable signal code", source);
            continue;
        };

        let confidence = resolve_confidence(row).unwrap_or(0.0);
        let observed_at = resolve_timestamp(row).unwrap_or_else(Utc::now);

        out.push(EvidenceItem {
            source_model: source,
            signal_code: code.clone(),
            description: describe(&code, reference_map),
            confidence,
            observed_at,
        });
    }
}

/// First non-empty string under any code alias.
fn resolve_code(row: &RawRow) -> Option<String> {
    for alias in CODE_ALIASES {
        if let Some(Value::String(s)) = row.get(*alias) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// First value under any confidence alias that coerces to f64.
fn resolve_confidence(row: &RawRow) -> Option<f64> {
    for alias in CONFIDENCE_ALIASES {
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

/// First value under any timestamp alias that parses as RFC 3339.
fn resolve_timestamp(row: &RawRow) -> Option<DateTime<Utc>> {
    for alias in TIMESTAMP_ALIASES {
        if let Some(Value::String(s)) = row.get(*alias) {
            if let Ok(ts) = DateTime::parse_from_rfc3339(s.trim()) {
                return Some(ts.with_timezone(&Utc));
            }
        }
    }
    None
}

/// Human description for a code, with the signal family in parentheses
/// when a non-sentinel family is known.
fn describe(code: &str, reference_map: &HashMap<String, ReferenceEntry>) -> String {
    match reference_map.get(code) {
        Some(entry) => {
            let base = if entry.description.is_empty() {
                NO_DESCRIPTION
            } else {
                entry.description.as_str()
            };
            match entry.family.as_deref() {
                Some(family) if family != UNKNOWN_FAMILY => format!("{} ({})", base, family),
                _ => base.to_string(),
            }
        }
        None => NO_DESCRIPTION.to_string(),
    }
}
