//! CLI output formatting.
//!
//! Every entity is shown by its identity first (positional index and stanza
//! name) with paths and counts as indented context lines.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! 001 gene-attributes → <togostanza-gene-attributes>
//!     Templates: 2
//!     Assets: 5 files
//! 002 widget-a → <togostanza-widget-a>
//!     Templates: 1
//! Built 2 stanzas into dist/stanza in 14ms
//! ```
//!
//! ## Server
//!
//! ```text
//! Serving dist/stanza
//!     Listening: http://127.0.0.1:8080/stanza/
//!     Workers: 4
//!     Development: true
//! Press Ctrl+C to stop
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure.

use crate::provider::BuildReport;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format a finished collection build.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, stanza) in report.stanzas.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} <{}>",
            format_index(i + 1),
            stanza.name,
            stanza.element_name
        ));
        lines.push(format!("{}Templates: {}", indent(1), stanza.templates));
        if stanza.assets > 0 {
            lines.push(format!(
                "{}Assets: {}",
                indent(1),
                plural(stanza.assets, "file", "files")
            ));
        }
    }

    let mode = if report.development { " (development)" } else { "" };
    lines.push(format!(
        "Built {} into {} in {}{}",
        plural(report.stanzas.len(), "stanza", "stanzas"),
        report.dist_dir.display(),
        format_elapsed(report.elapsed),
        mode
    ));

    lines
}

/// Print build output to stdout.
pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Server output
// ============================================================================

/// Format the banner shown once the dev server is listening.
pub fn format_server_banner(
    dist_dir: &Path,
    addr: &str,
    workers: usize,
    development: bool,
) -> Vec<String> {
    vec![
        format!("Serving {}", dist_dir.display()),
        format!("{}Listening: http://{}/stanza/", indent(1), addr),
        format!("{}Workers: {}", indent(1), workers),
        format!("{}Development: {}", indent(1), development),
        "Press Ctrl+C to stop".to_string(),
    ]
}

/// Print the server banner to stdout.
pub fn print_server_banner(dist_dir: &Path, addr: &str, workers: usize, development: bool) {
    for line in format_server_banner(dist_dir, addr, workers, development) {
        println!("{}", line);
    }
}

// ============================================================================
// Scaffold output
// ============================================================================

/// Format the result of `ts new`.
pub fn format_scaffold_output(name: &str, dir: &Path, files: &[String]) -> Vec<String> {
    let mut lines = vec![format!("Created stanza {} at {}", name, dir.display())];
    for file in files {
        lines.push(format!("{}{}", indent(1), file));
    }
    lines
}

/// Print scaffold output to stdout.
pub fn print_scaffold_output(name: &str, dir: &Path, files: &[String]) {
    for line in format_scaffold_output(name, dir, files) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
