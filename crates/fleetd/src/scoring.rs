//! Reply scoring for hybrid narrative selection.
//!
//! Scores a candidate reply against the structured facts in the chat
//! context. The heuristic is bounded and integer-valued; the speculative
//! penalty is what keeps hallucination-prone phrasing from winning on
//! length or entity mentions alone. The marker list is a fixed set of
//! English phrases and is locale-specific by design.

use serde_json::Value;

/// Score assigned to a blank reply. Hard reject.
pub const BLANK_REPLY_SCORE: i32 = -100;

/// Speculative-language markers, matched case-insensitively.
pub const SPECULATIVE_MARKERS: &[&str] =
    &["maybe", "probably", "might", "i guess", "i think", "likely"];

/// Score one reply candidate. Higher wins; ties favor deterministic.
pub fn score_reply(
    reply: &str,
    user_message: &str,
    context: &serde_json::Map<String, Value>,
) -> i32 {
    if reply.trim().is_empty() {
        return BLANK_REPLY_SCORE;
    }

    let reply_lower = reply.to_lowercase();
    let mut score = 0;

    let length = reply.chars().count();
    if (80..=450).contains(&length) {
        score += 2;
    } else if length > 700 {
        score -= 2;
    }

    if let Some(entity) = entity_id(context) {
        if reply_lower.contains(&entity.to_lowercase()) {
            score += 1;
        }
    }

    if let Some(risk) = context.get("risk_level").and_then(Value::as_str) {
        if reply_lower.contains(&risk.to_lowercase()) {
            score += 2;
        } else {
            score -= 2;
        }
    }

    if let Some(summary) = context.get("evidence_summary").and_then(Value::as_object) {
        let mentioned = summary
            .keys()
            .any(|key| reply_lower.contains(&key.to_lowercase()));
        score += if mentioned { 2 } else { -1 };
    }

    if let Some(count) = context.get("anomaly_count").and_then(Value::as_i64) {
        if reply.contains(&count.to_string()) {
            score += 1;
        }
    }

    if let Some(recommendations) = context.get("recommendations").and_then(Value::as_array) {
        if reply.contains(&recommendations.len().to_string()) {
            score += 1;
        }
    }

    if question_tokens(user_message)
        .iter()
        .any(|token| reply_lower.contains(token))
    {
        score += 1;
    }

    for marker in SPECULATIVE_MARKERS {
        if reply_lower.contains(marker) {
            score -= 2;
        }
    }

    score
}

/// Entity identifier from context: VIN first, then cohort id.
fn entity_id(context: &serde_json::Map<String, Value>) -> Option<&str> {
    context
        .get("vin")
        .and_then(Value::as_str)
        .or_else(|| context.get("cohort_id").and_then(Value::as_str))
}

/// Alphabetic tokens of length >= 4 from the user's question, lowercased.
fn question_tokens(user_message: &str) -> Vec<String> {
    user_message
        .split(|c: char| !c.is_alphabetic())
        .filter(|token| token.chars().count() >= 4)
        .map(str::to_lowercase)
        .collect()
}
