//! End-to-end workflow tests covering both execution strategies, the
//! fallback policy, and determinism of repeated runs.

use fleet_common::{FleetError, RawRow, RiskLevel, SourceModel, Urgency};
use fleetd::config::FeatureConfig;
use fleetd::orchestrator::{
    CohortWorkflowRequest, GraphEngine, StepGraph, VinWorkflowRequest, WorkflowOrchestrator,
    COHORT_NODES,
};
use fleetd::NarrativeComposer;
use serde_json::json;
use std::collections::HashMap;

fn features(enable_graph: bool, allow_fallback: bool) -> FeatureConfig {
    FeatureConfig {
        enable_graph_engine: enable_graph,
        allow_deterministic_fallback: allow_fallback,
    }
}

fn orchestrator(enable_graph: bool, allow_fallback: bool) -> WorkflowOrchestrator {
    WorkflowOrchestrator::new(
        &features(enable_graph, allow_fallback),
        NarrativeComposer::deterministic_only(),
        "fleet-interpreter-test",
    )
    .unwrap()
}

fn mh_row(code: &str, confidence: f64, at: &str) -> RawRow {
    let mut row = RawRow::new();
    row.insert("hi_code".to_string(), json!(code));
    row.insert("confidence".to_string(), json!(confidence));
    row.insert("trigger_time".to_string(), json!(at));
    row
}

fn vin_request() -> VinWorkflowRequest {
    VinWorkflowRequest {
        vin: "WVWZZZ1JZ3W386752".to_string(),
        mh_rows: vec![
            mh_row("HI-4302", 0.92, "2026-07-14T09:21:00Z"),
            mh_row("HI-1100", 0.61, "2026-07-15T16:02:00Z"),
        ],
        mp_rows: vec![],
        fim_rows: vec![],
        reference_map: HashMap::new(),
    }
}

fn cohort_request() -> CohortWorkflowRequest {
    let metric = |name: &str, value: i64| {
        let mut row = RawRow::new();
        row.insert("metric_name".to_string(), json!(name));
        row.insert("metric_value".to_string(), json!(value));
        row
    };
    let mut anomaly = RawRow::new();
    anomaly.insert("title".to_string(), json!("Fuel pressure cluster"));
    anomaly.insert(
        "description".to_string(),
        json!("Fuel pressure instability concentrated in 2024 builds"),
    );
    anomaly.insert("severity".to_string(), json!("HIGH"));
    anomaly.insert("affected_vin_count".to_string(), json!(9));

    CohortWorkflowRequest {
        cohort_id: "EU-WEST-DELIVERY".to_string(),
        cohort_description: Some("Western Europe delivery fleet".to_string()),
        metric_rows: vec![metric("risk_high", 12), metric("risk_low", 40)],
        anomaly_rows: vec![anomaly],
    }
}

/// Engine whose VIN graph validates but cycles at walk time. The cohort
/// graph stays well formed.
fn cycling_engine() -> GraphEngine {
    let vin_graph = StepGraph::with_edges(
        "build_evidence",
        &["build_evidence", "summarize"],
        &[("build_evidence", "summarize"), ("summarize", "build_evidence")],
    );
    GraphEngine::with_graphs(vin_graph, StepGraph::linear(COHORT_NODES)).unwrap()
}

#[test]
fn test_graph_and_sequential_paths_are_equivalent() {
    let via_graph = orchestrator(true, false).interpret_vin(&vin_request()).unwrap();
    let via_sequential = orchestrator(false, true).interpret_vin(&vin_request()).unwrap();

    assert_eq!(
        serde_json::to_value(&via_graph).unwrap(),
        serde_json::to_value(&via_sequential).unwrap()
    );
}

#[test]
fn test_cohort_paths_are_equivalent() {
    let via_graph = orchestrator(true, false)
        .interpret_cohort(&cohort_request())
        .unwrap();
    let via_sequential = orchestrator(false, true)
        .interpret_cohort(&cohort_request())
        .unwrap();

    assert_eq!(
        serde_json::to_value(&via_graph).unwrap(),
        serde_json::to_value(&via_sequential).unwrap()
    );
}

#[test]
fn test_rerun_yields_identical_output() {
    let orchestrator = orchestrator(true, true);
    let first = serde_json::to_string(&orchestrator.interpret_vin(&vin_request()).unwrap()).unwrap();
    let second =
        serde_json::to_string(&orchestrator.interpret_vin(&vin_request()).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_graph_failure_falls_back_sequentially() {
    let broken = WorkflowOrchestrator::with_engine(
        Some(cycling_engine()),
        true,
        NarrativeComposer::deterministic_only(),
        "fleet-interpreter-test",
    );
    let healthy = orchestrator(false, true);

    let fallback_result = broken.interpret_vin(&vin_request()).unwrap();
    let sequential_result = healthy.interpret_vin(&vin_request()).unwrap();
    assert_eq!(
        serde_json::to_value(&fallback_result).unwrap(),
        serde_json::to_value(&sequential_result).unwrap()
    );
}

#[test]
fn test_graph_failure_propagates_when_fallback_disallowed() {
    let broken = WorkflowOrchestrator::with_engine(
        Some(cycling_engine()),
        false,
        NarrativeComposer::deterministic_only(),
        "fleet-interpreter-test",
    );
    assert!(matches!(
        broken.interpret_vin(&vin_request()),
        Err(FleetError::Orchestration(_))
    ));
}

#[test]
fn test_high_confidence_signal_yields_elevated_with_urgent_recommendation() {
    let interpretation = orchestrator(true, true).interpret_vin(&vin_request()).unwrap();

    assert_eq!(interpretation.risk_level, RiskLevel::Elevated);
    assert!(interpretation.summary.contains("elevated predictive risk"));
    assert!(interpretation.summary.contains("HI-4302 (92%)"));

    assert_eq!(interpretation.recommendations.len(), 1);
    assert_eq!(interpretation.recommendations[0].urgency, Urgency::High);
    assert!(interpretation.recommendations[0]
        .rationale
        .contains("HI-4302"));

    let summary = interpretation.evidence_summary.unwrap();
    assert!(summary.contains_key(&SourceModel::Mh));
    assert_eq!(interpretation.model_version, "fleet-interpreter-test");
}

#[test]
fn test_empty_input_yields_low_risk_and_no_recommendations() {
    let request = VinWorkflowRequest {
        vin: "WVWZZZ1JZ3W386752".to_string(),
        mh_rows: vec![],
        mp_rows: vec![],
        fim_rows: vec![],
        reference_map: HashMap::new(),
    };
    let interpretation = orchestrator(true, true).interpret_vin(&request).unwrap();

    assert_eq!(interpretation.risk_level, RiskLevel::Low);
    assert!(interpretation.recommendations.is_empty());
    assert!(interpretation
        .summary
        .contains("no high-confidence anomaly cluster"));
    assert!(interpretation.evidence_summary.unwrap().is_empty());
}

#[test]
fn test_vin_is_normalized_in_output() {
    let request = VinWorkflowRequest {
        vin: "  wvwzzz1jz3w386752 ".to_string(),
        mh_rows: vec![],
        mp_rows: vec![],
        fim_rows: vec![],
        reference_map: HashMap::new(),
    };
    let interpretation = orchestrator(false, true).interpret_vin(&request).unwrap();
    assert_eq!(interpretation.vin, "WVWZZZ1JZ3W386752");
}

#[test]
fn test_cohort_interpretation_carries_distribution_and_summary() {
    let interpretation = orchestrator(true, true)
        .interpret_cohort(&cohort_request())
        .unwrap();

    let distribution = interpretation.risk_distribution.unwrap();
    assert_eq!(distribution["HIGH"], 12);
    assert_eq!(distribution["LOW"], 40);

    assert!(interpretation.summary.contains("requires immediate attention"));
    assert!(interpretation.summary.contains("risk_high=12"));
    assert_eq!(interpretation.anomalies.len(), 1);
    assert_eq!(interpretation.anomalies[0].affected_vin_count, 9);
    assert_eq!(
        interpretation.cohort_description.as_deref(),
        Some("Western Europe delivery fleet")
    );
}
