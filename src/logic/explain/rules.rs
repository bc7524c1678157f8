//! Explanation rule tables
//!
//! Evaluated top to bottom; table order is output order.

use super::types::{display_number, RawFeatures};

/// Processes whose presence is cited in the reason
pub const SUSPICIOUS_PROCESSES: &[&str] = &["nc", "netcat", "ncat", "wget", "curl", "bash", "sh"];

/// Processes that get a dedicated "why is this running" suggestion
pub const SHELL_LIKE_PROCESSES: &[&str] = &["bash", "sh", "nc", "netcat"];

pub const NETWORK_COUNT_LIMIT: f64 = 20.0;
pub const FILE_ACCESS_LIMIT: f64 = 100.0;

/// A predicate over the raw request and the message it produces when it fires
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&RawFeatures) -> bool,
    pub message: fn(&RawFeatures) -> String,
}

impl Rule {
    pub fn evaluate(&self, features: &RawFeatures) -> Option<String> {
        if (self.applies)(features) {
            Some((self.message)(features))
        } else {
            None
        }
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

fn touches_sensitive_files(f: &RawFeatures) -> bool {
    f.number("sensitive_files") > 0.0
}

fn high_network_activity(f: &RawFeatures) -> bool {
    f.number("network_count") > NETWORK_COUNT_LIMIT
}

fn excessive_file_access(f: &RawFeatures) -> bool {
    f.number("file_access_count") > FILE_ACCESS_LIMIT
}

fn suspicious_process(f: &RawFeatures) -> bool {
    f.process_name()
        .map_or(false, |name| SUSPICIOUS_PROCESSES.contains(&name))
}

fn shell_like_process(f: &RawFeatures) -> bool {
    f.process_name()
        .map_or(false, |name| SHELL_LIKE_PROCESSES.contains(&name))
}

fn process_label(f: &RawFeatures) -> String {
    f.process_name().unwrap_or_default().to_string()
}

// ============================================================================
// TABLES
// ============================================================================

pub static REASON_RULES: &[Rule] = &[
    Rule {
        name: "sensitive_files",
        applies: touches_sensitive_files,
        message: |f| format!("Access to {} sensitive file(s)", display_number(f.number("sensitive_files"))),
    },
    Rule {
        name: "network_count",
        applies: high_network_activity,
        message: |f| {
            format!(
                "Unusually high network activity ({} connections)",
                display_number(f.number("network_count"))
            )
        },
    },
    Rule {
        name: "file_access_count",
        applies: excessive_file_access,
        message: |f| {
            format!(
                "Excessive file access ({} operations)",
                display_number(f.number("file_access_count"))
            )
        },
    },
    Rule {
        name: "suspicious_process",
        applies: suspicious_process,
        message: |f| format!("Suspicious process detected: {}", process_label(f)),
    },
];

pub static SUGGESTION_RULES: &[Rule] = &[
    Rule {
        name: "sensitive_files",
        applies: touches_sensitive_files,
        message: |_| "Review file access patterns and restrict unnecessary permissions".to_string(),
    },
    Rule {
        name: "network_count",
        applies: high_network_activity,
        message: |_| "Investigate network connections and apply network policies".to_string(),
    },
    Rule {
        name: "shell_process",
        applies: shell_like_process,
        message: |f| format!("Investigate why {} is running in container", process_label(f)),
    },
];

/// Appended to every anomalous verdict, after the conditional suggestions
pub const GENERAL_SUGGESTIONS: &[&str] = &[
    "Review container security context and capabilities",
    "Check for unauthorized access or container escape attempts",
];
