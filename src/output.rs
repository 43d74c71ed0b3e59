//! CLI output formatting for pipeline runs.
//!
//! Progress goes to **stderr**: stdout is reserved for the raw pixels the
//! `blit` phase writes.
//!
//! # Output Format
//!
//! ```text
//! ==> findfiles: enumerate input paths
//!     412 files
//! ==> identify: drop binary, generated and vendored files; detect languages
//!     dropped Cargo.lock (generated)
//!     398 kept, 14 dropped
//! ==> htmlize: run the syntax highlighter on each file
//!     001/398 src/main.rs
//!     ...
//! --> pixelate already ran, skipped
//! ==> magick: encode the image
//!     51234 rows → textpixels.png
//! Stopped after magick
//! State saved to state.json
//! ```
//!
//! # Architecture
//!
//! [`format_pipeline_event`] and [`format_run_summary`] return lines and are
//! pure, for testability. The `print_*` wrappers write them to stderr.

use crate::pipeline::{Phase, PhaseOutcome, PipelineEvent, RunSummary};

/// Format a 1-based positional index, zero-padded to the width of `total`.
fn format_index(pos: usize, total: usize) -> String {
    let width = total.to_string().len().max(3);
    format!("{pos:0>width$}")
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

fn format_outcome(outcome: &PhaseOutcome) -> String {
    match outcome {
        PhaseOutcome::Files(n) => plural(*n, "file", "files"),
        PhaseOutcome::Blobs { kept, dropped } => format!("{kept} kept, {dropped} dropped"),
        PhaseOutcome::Html(n) => plural(*n, "file highlighted", "files highlighted"),
        PhaseOutcome::Rows(n) => plural(*n, "row", "rows"),
        PhaseOutcome::Bytes(n) => format!("{n} bytes written"),
        PhaseOutcome::Image { path, rows } => {
            format!("{} → {}", plural(*rows, "row", "rows"), path.display())
        }
    }
}

/// Format a single pipeline event as display lines.
pub fn format_pipeline_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::StateLoaded(path) => vec![format!("State loaded from {}", path.display())],
        PipelineEvent::PhaseStarted(phase) => {
            vec![format!("==> {}: {}", phase, phase.description())]
        }
        PipelineEvent::PhaseSkipped(phase) => vec![format!("--> {phase} already ran, skipped")],
        PipelineEvent::FileDropped { path, reason } => {
            vec![format!("{}dropped {} ({reason})", indent(1), path.display())]
        }
        PipelineEvent::FileHighlighted { index, total, path } => vec![format!(
            "{}{}/{} {}",
            indent(1),
            format_index(*index, *total),
            total,
            path.display()
        )],
        PipelineEvent::PhaseFinished { outcome, .. } => {
            vec![format!("{}{}", indent(1), format_outcome(outcome))]
        }
        PipelineEvent::Stopped(phase) => vec![format!("Stopped after {phase}")],
        PipelineEvent::StateSaved(path) => vec![format!("State saved to {}", path.display())],
    }
}

/// Format the end-of-run summary.
pub fn format_run_summary(summary: &RunSummary) -> Vec<String> {
    let names = |phases: &[Phase]| {
        phases
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut lines = Vec::new();
    if summary.ran.is_empty() {
        lines.push("Nothing to do: every phase already ran".to_string());
    } else {
        lines.push(format!("Ran {}", names(&summary.ran)));
    }
    if !summary.skipped.is_empty() {
        lines.push(format!("{}skipped {}", indent(1), names(&summary.skipped)));
    }
    lines
}

pub fn print_pipeline_event(event: &PipelineEvent) {
    for line in format_pipeline_event(event) {
        eprintln!("{line}");
    }
}

pub fn print_run_summary(summary: &RunSummary) {
    for line in format_run_summary(summary) {
        eprintln!("{line}");
    }
}

/// Format the `phases` command listing.
pub fn format_phase_list() -> Vec<String> {
    let width = Phase::ALL.iter().map(|p| p.name().len()).max().unwrap_or(0);
    Phase::ALL
        .iter()
        .map(|p| {
            let marker = if Phase::DEFAULT.contains(p) { "*" } else { " " };
            format!("{marker} {:<width$}  {}", p.name(), p.description())
        })
        .collect()
}
