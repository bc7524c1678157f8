//! Explain Module - reasons and remediation for a verdict
//!
//! Heuristics run over the raw request, not the scaled vector, so the text
//! cites the numbers the agent actually reported.

pub mod rules;
pub mod types;

pub use rules::{Rule, GENERAL_SUGGESTIONS, REASON_RULES, SUGGESTION_RULES};
pub use types::{display_number, Explanation, RawFeatures};

/// Reason given for every non-anomalous verdict
pub const NORMAL_REASON: &str = "Behavior matches normal baseline patterns";

/// Joins the reason clauses of all rules that fired
pub const REASON_SEPARATOR: &str = "; ";

pub fn explain(features: &RawFeatures, is_anomaly: bool, score: f64) -> Explanation {
    Explanation {
        reason: reason(features, is_anomaly, score),
        suggestions: suggestions(features, is_anomaly),
    }
}

pub fn reason(features: &RawFeatures, is_anomaly: bool, score: f64) -> String {
    if !is_anomaly {
        return NORMAL_REASON.to_string();
    }

    let clauses: Vec<String> = REASON_RULES
        .iter()
        .filter_map(|rule| rule.evaluate(features))
        .collect();

    if clauses.is_empty() {
        return format!("Behavioral anomaly detected (score: {:.2})", score);
    }
    clauses.join(REASON_SEPARATOR)
}

pub fn suggestions(features: &RawFeatures, is_anomaly: bool) -> Vec<String> {
    if !is_anomaly {
        return Vec::new();
    }

    SUGGESTION_RULES
        .iter()
        .filter_map(|rule| rule.evaluate(features))
        .chain(GENERAL_SUGGESTIONS.iter().map(|s| s.to_string()))
        .collect()
}
