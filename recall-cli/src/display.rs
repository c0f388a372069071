// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Display Helpers
//!
//! Terminal output formatting and styling.

use console::style;
use recall_core::{ProbeOutcome, ProfileRecord};
use serde_json::Value;

/// Prints a success message.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Prints a warning message.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Prints an info message.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Renders an attribute value without JSON quoting for strings.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Displays a profile record in a formatted box.
pub fn display_record(record: &ProfileRecord) {
    let width = 40;

    println!("{}", "─".repeat(width));
    println!("  {}", style(&record.id).bold().cyan());
    println!("{}", "─".repeat(width));

    if record.attributes.is_empty() {
        println!("  {}", style("(no attributes)").dim());
    } else {
        let key_width = record.attributes.keys().map(|k| k.len()).max().unwrap_or(0);
        for (key, value) in &record.attributes {
            println!(
                "  {:<width$}  {}",
                style(key).dim(),
                format_value(value),
                width = key_width
            );
        }
    }

    println!("{}", "─".repeat(width));
    println!("  {} {}", style("updated").dim(), record.updated_at);
}

/// Prints a probe outcome with a matching severity.
pub fn display_probe(outcome: ProbeOutcome) {
    match outcome {
        ProbeOutcome::Persisting => success("Relay is persisting data"),
        ProbeOutcome::NotPersisting(_) | ProbeOutcome::Failed(_) => {
            warning(&format!("Relay is {}", outcome))
        }
    }
}
