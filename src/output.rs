//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every image is shown by its position in the project and its canonical
//! name, with the source file name as context. Variant lines lead with the
//! preset and format, then say what happened.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! bauhaus-poster (2 images)
//!     skipped 1.jpg (img-01): img-01.jpg already claimed by 01.png
//!     001 cover (cover.jpg) 3000x2000 standard
//!         original jpg: q92 → 1210 KB
//!         original webp: q90 → 830 KB
//!         thumbnail jpg: 400px q85 → 46 KB (target 50 KB)
//!         medium jpg: 800px q85 → 240 KB (target 200 KB), q80 → 188 KB (target 200 KB)
//!         large webp: copied (830 KB)
//!     002 img-01 (01.png)
//!         failed: Decode failed: 01.png: ...
//! bauhaus-poster: 1 complete, 0 partial, 1 failed
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 bauhaus-poster (2 images)
//!     Source: bauhaus-poster/
//!     001 cover (cover.jpg)
//!     002 img-01 (01.png)
//!     duplicate 1.jpg → img-01: img-01.jpg already claimed by 01.png
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::EncodingAttempt;
use crate::process::{ProcessEvent, RunSummary};
use crate::scan::ProjectImageSet;
use crate::variants::{VariantInfo, VariantStatus};
use std::path::Path;

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

/// Project header with image count.
fn project_header(slug: &str, count: usize) -> String {
    let noun = if count == 1 { "image" } else { "images" };
    format!("{} ({} {})", slug, count, noun)
}

/// Image line: position, canonical name, source file in parens.
///
/// ```text
/// 002 img-01 (1.jpg)
/// ```
fn image_line(index: usize, canonical: &str, filename: &str) -> String {
    format!("{} {} ({})", format_index(index), canonical, filename)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Byte count in decimal kilobytes, rounded.
fn format_kb(bytes: usize) -> String {
    format!("{} KB", (bytes + 500) / 1000)
}

/// One encode try: `q85 → 240 KB (target 200 KB)`.
pub fn format_attempt(attempt: &EncodingAttempt, max_bytes: usize) -> String {
    format!(
        "{} → {} (target {})",
        attempt.quality,
        format_kb(attempt.bytes),
        format_kb(max_bytes)
    )
}

fn format_variant(variant: &VariantInfo) -> String {
    let head = format!("{} {}", variant.label, variant.format.extension());
    match &variant.status {
        VariantStatus::Original { quality, bytes } => {
            format!("{}: {} → {}", head, quality, format_kb(*bytes))
        }
        VariantStatus::Encoded {
            width,
            max_bytes,
            attempts,
            met_target,
            ..
        } => {
            let tries: Vec<String> = attempts
                .iter()
                .map(|a| format_attempt(a, *max_bytes))
                .collect();
            let over = if *met_target { "" } else { " over budget" };
            format!("{}: {}px {}{}", head, width, tries.join(", "), over)
        }
        VariantStatus::Copied { bytes } => {
            format!("{}: copied ({})", head, format_kb(*bytes as usize))
        }
        VariantStatus::Failed(reason) => format!("{}: failed: {}", head, reason),
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::ProjectStarted { slug, image_count } => {
            vec![project_header(slug, *image_count)]
        }
        ProcessEvent::DuplicateSkipped {
            filename,
            canonical,
            output,
            kept,
            ..
        } => vec![format!(
            "{}skipped {} ({}): {} already claimed by {}",
            indent(1),
            filename,
            canonical,
            output,
            kept
        )],
        ProcessEvent::ImageProcessed {
            index,
            filename,
            report,
        } => {
            let analysis = &report.analysis;
            let mut lines = vec![format!(
                "{}{} {}x{} {}",
                indent(1),
                image_line(*index, &report.canonical, filename),
                analysis.width,
                analysis.height,
                analysis.class.label()
            )];
            lines.extend(
                report
                    .variants
                    .iter()
                    .map(|v| format!("{}{}", indent(2), format_variant(v))),
            );
            lines
        }
        ProcessEvent::ImageFailed {
            index,
            filename,
            canonical,
            error,
        } => vec![
            format!("{}{}", indent(1), image_line(*index, canonical, filename)),
            format!("{}failed: {}", indent(2), error),
        ],
        ProcessEvent::ProjectSkipped { slug, reason } => {
            vec![format!("skipped project {}: {}", slug, reason)]
        }
        ProcessEvent::ProjectFinished {
            slug,
            complete,
            partial,
            failed,
        } => vec![format!(
            "{}: {} complete, {} partial, {} failed",
            slug, complete, partial, failed
        )],
    }
}

/// Format the end-of-run summary.
pub fn format_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![format!("Processed {}", summary)];
    for skipped in &summary.skipped {
        lines.push(format!("{}skipped {}: {}", indent(1), skipped.slug, skipped.reason));
    }
    lines
}

/// Print the end-of-run summary to stdout.
pub fn print_summary(summary: &RunSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the processing plan: projects, image order and canonical names.
pub fn format_plan(sets: &[ProjectImageSet]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, set) in sets.iter().enumerate() {
        lines.push(format!(
            "{} {}",
            format_index(i + 1),
            project_header(&set.slug, set.len())
        ));
        lines.push(format!("{}Source: {}/", indent(1), set.slug));
        for (j, entry) in set.ordered().iter().enumerate() {
            lines.push(format!(
                "{}{}",
                indent(1),
                image_line(j + 1, &entry.canonical, &entry.filename)
            ));
        }
        for dup in &set.duplicates {
            lines.push(format!(
                "{}duplicate {} → {}: {} already claimed by {}",
                indent(1),
                file_name(&dup.path),
                dup.canonical,
                dup.output,
                file_name(&dup.kept)
            ));
        }
    }
    lines
}

/// Print the processing plan to stdout.
pub fn print_plan(sets: &[ProjectImageSet]) {
    for line in format_plan(sets) {
        println!("{}", line);
    }
}
