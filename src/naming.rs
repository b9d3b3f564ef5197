//! File naming for exported images and media-type inference for intake.
//!
//! ## Export names
//!
//! Batch exports are named by position, not by source file name:
//! - 1st registered image → `reduced-1.webp`
//! - 2nd registered image → `reduced-2.webp`
//!
//! The position is the image's place in the registry when the export started,
//! so names stay stable no matter in which order the conversions finish.
//!
//! A single previewed image downloads as `converted.<ext>`.
//!
//! ## Media types
//!
//! Callers that only have a file name (the CLI, for one) infer the declared
//! media type from the extension. Unknown extensions map to
//! `application/octet-stream`, which the registry rejects.

use crate::imaging::OutputFormat;
use image::ImageFormat;
use std::path::Path;

const EXPORT_PREFIX: &str = "reduced";
const SINGLE_DOWNLOAD_STEM: &str = "converted";
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Name for the export at 1-based `position`.
pub fn export_file_name(position: usize, format: OutputFormat) -> String {
    format!("{EXPORT_PREFIX}-{position}.{}", format.extension())
}

pub fn single_download_name(format: OutputFormat) -> String {
    format!("{SINGLE_DOWNLOAD_STEM}.{}", format.extension())
}

/// Declared media type for a file, judged by its extension.
pub fn media_type_for(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or(UNKNOWN_MEDIA_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_names_are_one_based() {
        assert_eq!(export_file_name(1, OutputFormat::WebP), "reduced-1.webp");
        assert_eq!(export_file_name(12, OutputFormat::Jpeg), "reduced-12.jpg");
    }

    #[test]
    fn single_download() {
        assert_eq!(single_download_name(OutputFormat::WebP), "converted.webp");
        assert_eq!(single_download_name(OutputFormat::Jpeg), "converted.jpg");
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(media_type_for(Path::new("a/b/photo.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("scan.png")), "image/png");
        assert_eq!(media_type_for(Path::new("x.webp")), "image/webp");
    }

    #[test]
    fn unknown_extension_is_not_an_image() {
        assert_eq!(media_type_for(Path::new("notes.txt")), UNKNOWN_MEDIA_TYPE);
        assert_eq!(media_type_for(Path::new("Makefile")), UNKNOWN_MEDIA_TYPE);
    }
}
