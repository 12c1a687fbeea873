//! Reference dictionary loader.
//!
//! Translates signal codes into human-friendly language. Two YAML assets:
//! a signal catalog (code -> description) and a family map (code ->
//! family). Both merge into one code-indexed reference map.

use fleet_common::{FleetError, ReferenceEntry};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Catalog file name inside the reference directory.
const CATALOG_FILE: &str = "ref_signal_catalog.yaml";

/// Family map file name inside the reference directory.
const FAMILY_FILE: &str = "ref_signal_family_map.yaml";

/// Description used when the catalog has none for a code.
const NO_DESCRIPTION: &str = "No description available";

/// Qualitative label for a confidence value, for prose destined at
/// operators or the text-generation prompt.
pub fn confidence_label(confidence: f64) -> &'static str {
    if confidence >= 0.9 {
        "very high"
    } else if confidence >= 0.75 {
        "high"
    } else if confidence >= 0.5 {
        "moderate"
    } else {
        "low"
    }
}

pub struct ReferenceLoader {
    reference_dir: PathBuf,
}

impl ReferenceLoader {
    pub fn new(reference_dir: impl AsRef<Path>) -> Self {
        Self {
            reference_dir: reference_dir.as_ref().to_path_buf(),
        }
    }

    /// Merge catalog and family dictionaries into one reference map.
    /// Codes present only in the family map still get an entry.
    pub fn load_reference_map(&self) -> Result<HashMap<String, ReferenceEntry>, FleetError> {
        let catalog = self.read_mapping(CATALOG_FILE)?;
        let families = self.read_mapping(FAMILY_FILE)?;

        let mut merged: HashMap<String, ReferenceEntry> = HashMap::new();

        for (code, raw) in &catalog {
            let description = match raw {
                Value::String(s) => s.clone(),
                Value::Mapping(m) => m
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or(NO_DESCRIPTION)
                    .to_string(),
                _ => NO_DESCRIPTION.to_string(),
            };
            merged.insert(
                code.clone(),
                ReferenceEntry {
                    description,
                    family: families
                        .get(code)
                        .and_then(Value::as_str)
                        .map(String::from),
                },
            );
        }

        for (code, family) in &families {
            merged.entry(code.clone()).or_insert_with(|| ReferenceEntry {
                description: NO_DESCRIPTION.to_string(),
                family: family.as_str().map(String::from),
            });
        }

        info!(
            "Reference dictionaries loaded: {} codes from {}",
            merged.len(),
            self.reference_dir.display()
        );
        Ok(merged)
    }

    fn read_mapping(&self, filename: &str) -> Result<HashMap<String, Value>, FleetError> {
        let path = self.reference_dir.join(filename);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            FleetError::Reference(format!("missing reference file {}: {}", path.display(), e))
        })?;
        let parsed: HashMap<String, Value> = serde_yaml::from_str(&content).map_err(|e| {
            FleetError::Reference(format!(
                "reference file {} must contain a mapping: {}",
                path.display(),
                e
            ))
        })?;
        Ok(parsed)
    }
}
