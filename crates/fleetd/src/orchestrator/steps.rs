//! Workflow steps shared by both execution strategies.
//!
//! Each step is a pure transformation of the workflow state. The graph
//! engine dispatches them as named nodes; the sequential runner calls them
//! directly in the fixed order. Both paths therefore produce structurally
//! identical interpretations for the same input.

use crate::narrative::NarrativeComposer;
use crate::{cohort, consolidate, evidence, recommend, risk};
use fleet_common::{
    CohortAnomaly, CohortInterpretation, CohortMetric, EvidenceItem, EvidenceSummary, RawRow,
    Recommendation, ReferenceEntry, RiskLevel, VinInterpretation,
};
use std::collections::{BTreeMap, HashMap};

/// Input for one VIN workflow run.
#[derive(Debug, Clone)]
pub struct VinWorkflowRequest {
    pub vin: String,
    pub mh_rows: Vec<RawRow>,
    pub mp_rows: Vec<RawRow>,
    pub fim_rows: Vec<RawRow>,
    pub reference_map: HashMap<String, ReferenceEntry>,
}

/// Input for one cohort workflow run.
#[derive(Debug, Clone)]
pub struct CohortWorkflowRequest {
    pub cohort_id: String,
    pub cohort_description: Option<String>,
    pub metric_rows: Vec<RawRow>,
    pub anomaly_rows: Vec<RawRow>,
}

/// Mutable state threaded through the VIN workflow.
#[derive(Default)]
pub struct VinState {
    pub vin: String,
    pub evidence: Vec<EvidenceItem>,
    pub summary: String,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<Recommendation>,
    pub evidence_summary: Option<EvidenceSummary>,
    pub interpretation: Option<VinInterpretation>,
}

/// Mutable state threaded through the cohort workflow.
#[derive(Default)]
pub struct CohortState {
    pub cohort_id: String,
    pub cohort_description: Option<String>,
    pub metrics: Vec<CohortMetric>,
    pub anomalies: Vec<CohortAnomaly>,
    pub risk_distribution: Option<BTreeMap<String, i64>>,
    pub summary: String,
    pub interpretation: Option<CohortInterpretation>,
}

/// Shared collaborators for step execution.
pub struct StepContext<'a> {
    pub composer: &'a NarrativeComposer,
    pub model_version: &'a str,
}

// --- VIN steps, fixed order: evidence -> summarize -> recommend ->
//     consolidate -> assemble ---

pub fn vin_build_evidence(request: &VinWorkflowRequest, state: &mut VinState) {
    state.vin = request.vin.trim().to_uppercase();
    state.evidence = evidence::normalize(
        &request.mh_rows,
        &request.mp_rows,
        &request.fim_rows,
        &request.reference_map,
    );
}

pub fn vin_summarize(ctx: &StepContext<'_>, state: &mut VinState) {
    state.risk_level = risk::classify(&state.evidence);
    state.summary = ctx
        .composer
        .compose_vin_summary(&state.vin, state.risk_level, &state.evidence);
}

pub fn vin_recommend(state: &mut VinState) {
    state.recommendations = recommend::build(&state.evidence);
}

pub fn vin_consolidate(state: &mut VinState) {
    state.evidence_summary = Some(consolidate::consolidate(&state.evidence));
}

pub fn vin_assemble(ctx: &StepContext<'_>, state: &mut VinState) {
    state.interpretation = Some(VinInterpretation {
        vin: state.vin.clone(),
        summary: state.summary.clone(),
        risk_level: state.risk_level,
        recommendations: state.recommendations.clone(),
        evidence_summary: state.evidence_summary.clone(),
        model_version: ctx.model_version.to_string(),
    });
}

// --- Cohort steps, fixed order: models -> summarize -> assemble ---

pub fn cohort_build_models(request: &CohortWorkflowRequest, state: &mut CohortState) {
    state.cohort_id = request.cohort_id.trim().to_string();
    state.cohort_description = request.cohort_description.clone();
    state.metrics = cohort::build_metrics(&request.metric_rows);
    state.anomalies = cohort::build_anomalies(&request.anomaly_rows);
    state.risk_distribution = cohort::risk_distribution(&request.metric_rows);
}

pub fn cohort_summarize(ctx: &StepContext<'_>, state: &mut CohortState) {
    state.summary =
        ctx.composer
            .compose_cohort_summary(&state.cohort_id, &state.anomalies, &state.metrics);
}

pub fn cohort_assemble(ctx: &StepContext<'_>, state: &mut CohortState) {
    state.interpretation = Some(CohortInterpretation {
        cohort_id: state.cohort_id.clone(),
        cohort_description: state.cohort_description.clone(),
        summary: state.summary.clone(),
        metrics: state.metrics.clone(),
        anomalies: state.anomalies.clone(),
        risk_distribution: state.risk_distribution.clone(),
        model_version: ctx.model_version.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(vin: &str, confidence: f64) -> VinWorkflowRequest {
        let mut row = RawRow::new();
        row.insert("hi_code".to_string(), json!("HI-1"));
        row.insert("confidence".to_string(), json!(confidence));
        VinWorkflowRequest {
            vin: vin.to_string(),
            mh_rows: vec![row],
            mp_rows: vec![],
            fim_rows: vec![],
            reference_map: HashMap::new(),
        }
    }

    #[test]
    fn test_vin_is_normalized_uppercase_trimmed() {
        let mut state = VinState::default();
        vin_build_evidence(&request("  vin123 ", 0.9), &mut state);
        assert_eq!(state.vin, "VIN123");
    }

    #[test]
    fn test_assemble_carries_consolidation() {
        let composer = NarrativeComposer::deterministic_only();
        let ctx = StepContext {
            composer: &composer,
            model_version: "test",
        };
        let mut state = VinState::default();
        vin_build_evidence(&request("VIN123", 0.9), &mut state);
        vin_summarize(&ctx, &mut state);
        vin_recommend(&mut state);
        vin_consolidate(&mut state);
        vin_assemble(&ctx, &mut state);

        let interpretation = state.interpretation.unwrap();
        assert_eq!(interpretation.model_version, "test");
        assert!(interpretation.evidence_summary.is_some());
        assert_eq!(interpretation.recommendations.len(), 1);
    }
}
