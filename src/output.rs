//! CLI output formatting.
//!
//! Progress is rendered from [`ProcessEvent`]s as they arrive; the
//! [`BatchReport`] is rendered once the batch returns.
//!
//! # Output Format
//!
//! ```text
//! Optimizing 2 images → 8 derivatives
//! [1/8] public/images/hero@2x.avif
//! [2/8] public/images/hero@1x.avif
//! ...
//! Skipped banner: stored maxDensity 1 does not match the requested origin density 2
//!     Source: public/images/banner.png
//! Failed public/images/broken.jpg
//!     Error: Failed to read dimensions of public/images/broken.jpg: ...
//! Removed public/images/hero.png
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::process::{BatchReport, ProcessEvent, UnitStatus};

// ============================================================================
// Progress events
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted {
            images,
            total_units,
        } => vec![format!(
            "Optimizing {} {} \u{2192} {} derivatives",
            images,
            plural(*images, "image", "images"),
            total_units
        )],
        ProcessEvent::UnitCompleted {
            completed,
            total,
            output,
            status,
        } => {
            let suffix = match status {
                UnitStatus::Encoded => "",
                UnitStatus::Unchanged => " (unchanged)",
            };
            vec![format!(
                "[{}/{}] {}{}",
                completed,
                total,
                output.display(),
                suffix
            )]
        }
        ProcessEvent::ImageSkipped {
            image_name,
            source_path,
            reason,
        } => vec![
            format!("Skipped {}: {}", image_name, reason),
            format!("    Source: {}", source_path.display()),
        ],
        ProcessEvent::ImageFailed {
            source_path,
            message,
        } => vec![
            format!("Failed {}", source_path.display()),
            format!("    Error: {}", message),
        ],
        ProcessEvent::SourceRemoved { source_path } => {
            vec![format!("Removed {}", source_path.display())]
        }
    }
}

/// Print a progress event to stdout.
pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch report
// ============================================================================

/// Format the end-of-batch summary.
///
/// The summary line comes first, followed by one line per failed image so
/// failures stay visible after the progress output has scrolled away.
pub fn format_report(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![format!("Done: {}", report)];
    if !report.failed.is_empty() {
        lines.push(format!(
            "{} {} failed:",
            report.failed.len(),
            plural(report.failed.len(), "image", "images")
        ));
        for failed in &report.failed {
            lines.push(format!(
                "    {}: {}",
                failed.source_path.display(),
                failed.message
            ));
        }
    }
    lines
}

/// Print the end-of-batch summary to stdout.
pub fn print_report(report: &BatchReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}
