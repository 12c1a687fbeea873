//! Mart access layer.
//!
//! Read-only access to predictive telemetry rows. The built-in source is a
//! local sample bundle (JSON); warehouse connectivity lives behind the same
//! seam as an external collaborator. Identifiers are validated before any
//! lookup.

use fleet_common::{FleetError, RawRow};
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

/// Raw rows for one VIN, per source mart.
#[derive(Debug, Clone, Default)]
pub struct VinRows {
    pub mh: Vec<RawRow>,
    pub mp: Vec<RawRow>,
    pub fim: Vec<RawRow>,
}

/// Raw rows for one cohort.
#[derive(Debug, Clone, Default)]
pub struct CohortRows {
    pub description: Option<String>,
    pub metrics: Vec<RawRow>,
    pub anomalies: Vec<RawRow>,
}

fn vin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{5,32}$").unwrap())
}

fn cohort_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:-]{2,128}$").unwrap())
}

/// Normalize and validate a VIN: trimmed, uppercased, pattern-checked.
pub fn normalize_vin(vin: &str) -> Result<String, FleetError> {
    let normalized = vin.trim().to_uppercase();
    if !vin_pattern().is_match(&normalized) {
        return Err(FleetError::InvalidVin(vin.to_string()));
    }
    Ok(normalized)
}

/// Normalize and validate a cohort id: trimmed, pattern-checked.
pub fn normalize_cohort(cohort_id: &str) -> Result<String, FleetError> {
    let normalized = cohort_id.trim().to_string();
    if !cohort_pattern().is_match(&normalized) {
        return Err(FleetError::InvalidCohort(cohort_id.to_string()));
    }
    Ok(normalized)
}

/// Sample-bundle mart loader. The bundle is parsed once and cached for the
/// loader's lifetime.
pub struct MartLoader {
    sample_path: PathBuf,
    bundle: OnceLock<Value>,
}

impl MartLoader {
    pub fn new(sample_path: impl AsRef<Path>) -> Self {
        Self {
            sample_path: sample_path.as_ref().to_path_buf(),
            bundle: OnceLock::new(),
        }
    }

    /// Rows for one VIN. Unknown VINs yield empty row sets, not errors.
    pub fn load_vin_rows(&self, vin: &str) -> Result<VinRows, FleetError> {
        let vin = normalize_vin(vin)?;
        let bundle = self.bundle()?;

        let Some(entry) = find_entry(bundle, "vins", "vin", &vin, true) else {
            return Ok(VinRows::default());
        };

        Ok(VinRows {
            mh: rows_field(entry, "mh"),
            mp: rows_field(entry, "mp"),
            fim: rows_field(entry, "fim"),
        })
    }

    /// Rows for one cohort. Unknown cohorts yield empty row sets.
    pub fn load_cohort_rows(&self, cohort_id: &str) -> Result<CohortRows, FleetError> {
        let cohort_id = normalize_cohort(cohort_id)?;
        let bundle = self.bundle()?;

        let Some(entry) = find_entry(bundle, "cohorts", "cohort_id", &cohort_id, false) else {
            return Ok(CohortRows::default());
        };

        Ok(CohortRows {
            description: entry
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            metrics: rows_field(entry, "metrics"),
            anomalies: rows_field(entry, "anomalies"),
        })
    }

    fn bundle(&self) -> Result<&Value, FleetError> {
        if let Some(bundle) = self.bundle.get() {
            return Ok(bundle);
        }

        let content = std::fs::read_to_string(&self.sample_path).map_err(|e| {
            FleetError::Mart(format!(
                "sample data file not found: {} ({})",
                self.sample_path.display(),
                e
            ))
        })?;
        let parsed: Value = serde_json::from_str(&content)
            .map_err(|e| FleetError::Mart(format!("sample data is not valid JSON: {}", e)))?;
        if !parsed.is_object() {
            return Err(FleetError::Mart(
                "sample data must be a JSON object".to_string(),
            ));
        }

        info!("Loaded sample bundle from {}", self.sample_path.display());
        Ok(self.bundle.get_or_init(|| parsed))
    }
}

/// Find the entry in `bundle[section]` whose `key` matches `target`.
fn find_entry<'a>(
    bundle: &'a Value,
    section: &str,
    key: &str,
    target: &str,
    uppercase_compare: bool,
) -> Option<&'a Value> {
    bundle
        .get(section)
        .and_then(Value::as_array)?
        .iter()
        .find(|entry| {
            entry
                .get(key)
                .and_then(Value::as_str)
                .map(|id| {
                    if uppercase_compare {
                        id.to_uppercase() == target
                    } else {
                        id == target
                    }
                })
                .unwrap_or(false)
        })
}

/// Array of object rows under `field`, tolerating absence and non-objects.
fn rows_field(entry: &Value, field: &str) -> Vec<RawRow> {
    entry
        .get(field)
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_object)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "vins": [
            {
                "vin": "VIN12345",
                "mh": [{"hi_code": "HI-4302", "confidence": 0.92}],
                "mp": [],
                "fim": [{"rootcause_code": "RC-9", "rootcause_probability": 0.75}]
            }
        ],
        "cohorts": [
            {
                "cohort_id": "EU-WEST",
                "description": "Western Europe delivery fleet",
                "metrics": [{"metric_name": "risk_high", "metric_value": 12}],
                "anomalies": []
            }
        ]
    }"#;

    fn loader_with_sample() -> (tempfile::NamedTempFile, MartLoader) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let loader = MartLoader::new(file.path());
        (file, loader)
    }

    #[test]
    fn test_normalize_vin_uppercases_and_trims() {
        assert_eq!(normalize_vin(" vin12345 ").unwrap(), "VIN12345");
    }

    #[test]
    fn test_normalize_vin_rejects_bad_input() {
        assert!(normalize_vin("ab").is_err());
        assert!(normalize_vin("BAD VIN WITH SPACES").is_err());
    }

    #[test]
    fn test_normalize_cohort_rejects_bad_input() {
        assert!(normalize_cohort("x").is_err());
        assert!(normalize_cohort("EU-WEST").is_ok());
    }

    #[test]
    fn test_load_vin_rows() {
        let (_file, loader) = loader_with_sample();
        let rows = loader.load_vin_rows("vin12345").unwrap();
        assert_eq!(rows.mh.len(), 1);
        assert!(rows.mp.is_empty());
        assert_eq!(rows.fim.len(), 1);
    }

    #[test]
    fn test_unknown_vin_yields_empty_rows() {
        let (_file, loader) = loader_with_sample();
        let rows = loader.load_vin_rows("ZZZZZ9999").unwrap();
        assert!(rows.mh.is_empty() && rows.mp.is_empty() && rows.fim.is_empty());
    }

    #[test]
    fn test_load_cohort_rows_with_description() {
        let (_file, loader) = loader_with_sample();
        let rows = loader.load_cohort_rows("EU-WEST").unwrap();
        assert_eq!(rows.description.as_deref(), Some("Western Europe delivery fleet"));
        assert_eq!(rows.metrics.len(), 1);
    }

    #[test]
    fn test_missing_sample_file_is_mart_error() {
        let loader = MartLoader::new("/nonexistent/sample.json");
        assert!(matches!(
            loader.load_vin_rows("VIN12345"),
            Err(FleetError::Mart(_))
        ));
    }
}
