//! CLI output formatting for previews and batch exports.
//!
//! # Output Format
//!
//! ## Preview
//!
//! ```text
//! Original  800×600  Size: 240.13 KB
//! Converted 400×300  Size: 18.40 KB (image/webp)
//!     Ratio: 7.7%
//! ```
//!
//! ## Export
//!
//! ```text
//! Exporting 3 images
//! 002 beach.png → reduced-2.webp
//!     400×300, Size: 18.40 KB
//! 001 notes.png → failed
//!     Error: corrupt image data: ...
//! 003 dusk.jpg → reduced-3.webp
//!     640×480, Size: 31.02 KB
//!
//! 2 exported, 1 failed, 0 cancelled
//! ```
//!
//! Entries print in the order they finish; the positional index ties each
//! line back to the registry and to the `reduced-N` file name.
//!
//! Each `format_*` function returns `Vec<String>` and does no I/O. The
//! `print_*` wrappers write to stdout.

use crate::export::{EntryStatus, ExportEvent, ExportSummary};
use crate::imaging::Dimensions;
use crate::preview::Preview;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Byte count as kilobytes with two decimals: `Size: 12.34 KB`.
pub fn format_kb(bytes: usize) -> String {
    format!("Size: {:.2} KB", bytes as f64 / 1024.0)
}

fn size_line(dimensions: Dimensions, bytes: usize) -> String {
    format!("{}, {}", dimensions, format_kb(bytes))
}

// ============================================================================
// Preview
// ============================================================================

pub fn format_preview(preview: &Preview) -> Vec<String> {
    let original = Dimensions::new(preview.original.width, preview.original.height);
    let converted = &preview.converted;
    vec![
        format!(
            "Original  {}  {}",
            original,
            format_kb(preview.original.byte_size)
        ),
        format!(
            "Converted {}  {} ({})",
            converted.output_dimensions(),
            format_kb(converted.output_byte_size),
            converted.mime_type()
        ),
        format!("{}Ratio: {:.1}%", indent(1), preview.size_ratio() * 100.0),
    ]
}

pub fn print_preview(preview: &Preview) {
    for line in format_preview(preview) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::Started { total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Exporting {} {}", total, noun)]
        }
        ExportEvent::EntryFinished {
            position,
            source_name,
            file_name,
            status,
            ..
        } => {
            let header = format!("{} {}", format_index(*position), source_name);
            match status {
                EntryStatus::Exported {
                    dimensions,
                    byte_size,
                } => vec![
                    format!("{} → {}", header, file_name),
                    format!("{}{}", indent(1), size_line(*dimensions, *byte_size)),
                ],
                EntryStatus::Failed { error } => vec![
                    format!("{} → failed", header),
                    format!("{}Error: {}", indent(1), error),
                ],
                EntryStatus::Cancelled => vec![format!("{} → cancelled", header)],
            }
        }
        ExportEvent::Finished(summary) => format_export_summary(summary),
    }
}

pub fn format_export_summary(summary: &ExportSummary) -> Vec<String> {
    vec![String::new(), summary.to_string()]
}

pub fn print_export_event(event: &ExportEvent) {
    for line in format_export_event(event) {
        println!("{}", line);
    }
}
