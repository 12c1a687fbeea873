//! Narrative composition.
//!
//! Renders human-readable summaries and chat replies from structured facts.
//! Two text sources exist: deterministic templates (always available) and
//! an optional external text-generation candidate. The deterministic text
//! is the safety baseline; the external candidate must win the scoring
//! heuristic strictly to be used for chat replies.

use crate::cohort;
use crate::reference;
use crate::risk;
use crate::scoring::score_reply;
use crate::textgen::TextGenClient;
use fleet_common::{CohortAnomaly, CohortMetric, EvidenceItem, RiskLevel};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Composes summaries and chat replies. The text-generation client is
/// injected at construction; `None` means deterministic-only operation.
pub struct NarrativeComposer {
    client: Option<Arc<dyn TextGenClient>>,
}

impl NarrativeComposer {
    pub fn new(client: Option<Arc<dyn TextGenClient>>) -> Self {
        Self { client }
    }

    pub fn deterministic_only() -> Self {
        Self { client: None }
    }

    pub fn textgen_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// VIN summary: external candidate when the service responds, baseline
    /// template otherwise.
    pub fn compose_vin_summary(
        &self,
        vin: &str,
        risk_level: RiskLevel,
        evidence: &[EvidenceItem],
    ) -> String {
        let top = format_top_signals(evidence);

        // The prompt gets the qualitative confidence labels; deterministic
        // output stays percentage-only.
        match self.external_candidate(
            &format!("VIN {}", vin),
            &risk_level.to_string(),
            &format_labeled_signals(evidence),
        ) {
            Some(candidate) => candidate,
            None => risk::baseline_narrative(vin, risk_level, &top),
        }
    }

    /// Cohort summary with the same external-first, deterministic-fallback
    /// policy as VIN summaries.
    pub fn compose_cohort_summary(
        &self,
        cohort_id: &str,
        anomalies: &[CohortAnomaly],
        top_metrics: &[CohortMetric],
    ) -> String {
        let metrics_text = format_top_metrics(top_metrics);
        let risk = if anomalies.iter().any(CohortAnomaly::is_high_severity) {
            RiskLevel::High
        } else if !anomalies.is_empty() {
            RiskLevel::Elevated
        } else {
            RiskLevel::Low
        };

        if let Some(candidate) = self.external_candidate(
            &format!("Cohort {}", cohort_id),
            &risk.to_string(),
            &metrics_text,
        ) {
            return candidate;
        }

        format!(
            "{} Key metrics for {}: {}.",
            cohort::generate_summary(anomalies),
            cohort_id,
            metrics_text
        )
    }

    /// Bounded deterministic chat reply built only from context facts.
    pub fn compose_chat_reply(
        &self,
        _user_message: &str,
        context: &serde_json::Map<String, Value>,
    ) -> String {
        let entity = context
            .get("vin")
            .or_else(|| context.get("cohort_id"))
            .and_then(Value::as_str)
            .unwrap_or("fleet");
        let risk = context
            .get("risk_level")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN");

        let evidence_keys = context
            .get("evidence_summary")
            .and_then(Value::as_object)
            .map(|summary| {
                let mut keys: Vec<&str> = summary.keys().map(String::as_str).collect();
                keys.sort_unstable();
                keys.join(", ")
            })
            .filter(|keys| !keys.is_empty())
            .unwrap_or_else(|| "none".to_string());

        format!(
            "For {}, current risk context is {}. Available evidence sources: {}. \
             Ask about a specific signal or recommendation for more detail.",
            entity, risk, evidence_keys
        )
    }

    /// Hybrid selection between a deterministic reply and the external
    /// candidate. The external candidate wins only on a strictly greater
    /// score; ties and failures keep the deterministic text.
    pub fn compose_hybrid_chat_reply(
        &self,
        user_message: &str,
        context: &serde_json::Map<String, Value>,
        deterministic_reply: &str,
    ) -> String {
        let entity = context
            .get("vin")
            .or_else(|| context.get("cohort_id"))
            .and_then(Value::as_str)
            .unwrap_or("fleet");
        let risk = context
            .get("risk_level")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN");
        let evidence_keys = context
            .get("evidence_summary")
            .and_then(Value::as_object)
            .map(|summary| {
                let mut keys: Vec<&str> = summary.keys().map(String::as_str).collect();
                keys.sort_unstable();
                keys.join(", ")
            })
            .unwrap_or_default();

        let signals = format!(
            "user_question={}; evidence_sources={}",
            user_message, evidence_keys
        );

        let Some(external) = self.external_candidate(entity, risk, &signals) else {
            return deterministic_reply.to_string();
        };

        let deterministic_score = score_reply(deterministic_reply, user_message, context);
        let external_score = score_reply(&external, user_message, context);
        debug!(
            deterministic_score,
            external_score, "Scored chat reply candidates"
        );

        if external_score > deterministic_score {
            external
        } else {
            deterministic_reply.to_string()
        }
    }

    /// One guarded call into the optional external service. Any failure
    /// collapses to `None`; the caller falls back to deterministic text.
    fn external_candidate(&self, entity: &str, risk: &str, signals: &str) -> Option<String> {
        let client = self.client.as_ref()?;
        match client.generate(entity, risk, signals) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                warn!("Text generation failed, using deterministic narrative: {}", e);
                None
            }
        }
    }
}

/// Top three evidence signals by confidence descending: "CODE (92%), ...".
pub fn format_top_signals(evidence: &[EvidenceItem]) -> String {
    if evidence.is_empty() {
        return "none".to_string();
    }

    let mut ranked: Vec<&EvidenceItem> = evidence.iter().collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
        .iter()
        .take(3)
        .map(|item| {
            format!(
                "{} ({}%)",
                item.signal_code,
                (item.confidence * 100.0) as i64
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Same ranking as `format_top_signals`, with the qualitative confidence
/// label included: "CODE (92%, very high)".
fn format_labeled_signals(evidence: &[EvidenceItem]) -> String {
    if evidence.is_empty() {
        return "none".to_string();
    }

    let mut ranked: Vec<&EvidenceItem> = evidence.iter().collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
        .iter()
        .take(3)
        .map(|item| {
            format!(
                "{} ({}%, {})",
                item.signal_code,
                (item.confidence * 100.0) as i64,
                reference::confidence_label(item.confidence)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Top three metrics as "name=value" pairs.
fn format_top_metrics(metrics: &[CohortMetric]) -> String {
    if metrics.is_empty() {
        return "no dominant metrics".to_string();
    }

    metrics
        .iter()
        .take(3)
        .map(|metric| {
            if metric.value.fract() == 0.0 {
                format!("{}={}", metric.name, metric.value as i64)
            } else {
                format!("{}={}", metric.name, metric.value)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textgen::FakeTextGenClient;
    use chrono::Utc;
    use fleet_common::SourceModel;
    use serde_json::json;

    fn item(code: &str, confidence: f64) -> EvidenceItem {
        EvidenceItem {
            source_model: SourceModel::Mh,
            signal_code: code.to_string(),
            description: "test".to_string(),
            confidence,
            observed_at: Utc::now(),
        }
    }

    fn context(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_format_top_signals_ranked_descending() {
        let evidence = vec![item("A", 0.70), item("B", 0.95), item("C", 0.80), item("D", 0.75)];
        assert_eq!(format_top_signals(&evidence), "B (95%), C (80%), D (75%)");
        assert_eq!(format_top_signals(&[]), "none");
    }

    #[test]
    fn test_format_labeled_signals_includes_label() {
        let evidence = vec![item("A", 0.92), item("B", 0.6)];
        assert_eq!(
            format_labeled_signals(&evidence),
            "A (92%, very high), B (60%, moderate)"
        );
    }

    #[test]
    fn test_vin_summary_deterministic_without_client() {
        let composer = NarrativeComposer::deterministic_only();
        let summary = composer.compose_vin_summary("V1", RiskLevel::Elevated, &[item("A", 0.92)]);
        assert!(summary.contains("VIN V1"));
        assert!(summary.contains("elevated predictive risk"));
        assert!(summary.contains("A (92%)"));
    }

    #[test]
    fn test_vin_summary_falls_back_when_client_fails() {
        let composer = NarrativeComposer::new(Some(Arc::new(FakeTextGenClient::failing())));
        let summary = composer.compose_vin_summary("V1", RiskLevel::Low, &[]);
        assert!(summary.contains("no high-confidence anomaly cluster"));
    }

    fn anomaly(severity: &str) -> CohortAnomaly {
        CohortAnomaly {
            title: "t".to_string(),
            description: "d".to_string(),
            affected_vin_count: 1,
            severity: severity.to_string(),
            related_signals: vec![],
        }
    }

    #[test]
    fn test_cohort_summary_tiers() {
        let composer = NarrativeComposer::deterministic_only();
        let metrics = vec![CohortMetric {
            name: "risk_high".to_string(),
            value: 12.0,
            unit: None,
            description: None,
        }];

        let high = composer.compose_cohort_summary("C1", &[anomaly("high")], &metrics);
        assert!(high.contains("requires immediate attention"));
        assert!(high.contains("risk_high=12"));
        assert!(high.contains("C1"));

        let elevated = composer.compose_cohort_summary("C1", &[anomaly("MEDIUM")], &metrics);
        assert!(elevated.contains("monitor closely"));

        let low = composer.compose_cohort_summary("C1", &[], &[]);
        assert!(low.contains("no anomalies"));
        assert!(low.contains("no dominant metrics"));
    }

    #[test]
    fn test_chat_reply_bounded_to_context() {
        let composer = NarrativeComposer::deterministic_only();
        let ctx = context(json!({
            "vin": "VIN123",
            "risk_level": "HIGH",
            "evidence_summary": {"MP": {}, "MH": {}},
        }));
        let reply = composer.compose_chat_reply("status?", &ctx);
        assert_eq!(
            reply,
            "For VIN123, current risk context is HIGH. Available evidence sources: MH, MP. \
             Ask about a specific signal or recommendation for more detail."
        );
    }

    #[test]
    fn test_chat_reply_defaults_without_context() {
        let composer = NarrativeComposer::deterministic_only();
        let reply = composer.compose_chat_reply("status?", &context(json!({})));
        assert!(reply.contains("For fleet"));
        assert!(reply.contains("UNKNOWN"));
        assert!(reply.contains("none"));
    }

    #[test]
    fn test_hybrid_returns_deterministic_without_client() {
        let composer = NarrativeComposer::deterministic_only();
        let reply = composer.compose_hybrid_chat_reply(
            "what is the status?",
            &context(json!({"vin": "VIN123", "risk_level": "HIGH"})),
            "VIN VIN123 is currently assessed as HIGH.",
        );
        assert_eq!(reply, "VIN VIN123 is currently assessed as HIGH.");
    }

    #[test]
    fn test_hybrid_rejects_speculative_candidate() {
        let composer = NarrativeComposer::new(Some(Arc::new(FakeTextGenClient::with_reply(
            "VIN VIN123 might probably be severe, I think maybe inspect soon.",
        ))));
        let deterministic = "VIN VIN123 is currently assessed as HIGH. Evidence sources: MH.";
        let reply = composer.compose_hybrid_chat_reply(
            "what is the risk?",
            &context(json!({
                "vin": "VIN123",
                "risk_level": "HIGH",
                "evidence_summary": {"MH": {}},
            })),
            deterministic,
        );
        assert_eq!(reply, deterministic);
    }

    #[test]
    fn test_hybrid_prefers_better_grounded_candidate() {
        let external = "VIN VIN123 is currently assessed as HIGH. Evidence sources: MH, MP. \
                        There are 2 recommendation(s) based on the available predictive signals.";
        let composer =
            NarrativeComposer::new(Some(Arc::new(FakeTextGenClient::with_reply(external))));
        let reply = composer.compose_hybrid_chat_reply(
            "what is the risk and evidence?",
            &context(json!({
                "vin": "VIN123",
                "risk_level": "HIGH",
                "recommendations": [{}, {}],
                "evidence_summary": {"MH": {}, "MP": {}},
            })),
            "VIN VIN123 has active alerts.",
        );
        assert_eq!(reply, external);
    }

    #[test]
    fn test_hybrid_tie_favors_deterministic() {
        // Same text for both candidates scores identically; the external
        // candidate must not win a tie.
        let text = "VIN VIN123 is currently assessed as HIGH.";
        let composer = NarrativeComposer::new(Some(Arc::new(FakeTextGenClient::with_reply(text))));
        let reply = composer.compose_hybrid_chat_reply(
            "risk?",
            &context(json!({"vin": "VIN123", "risk_level": "HIGH"})),
            text,
        );
        assert_eq!(reply, text);
    }
}
