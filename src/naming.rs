//! Source filename roles and canonical output names.
//!
//! Every source image in a project plays one of three roles, decided from its
//! file stem alone:
//!
//! - `cover` (any case) → the project cover, processed first
//! - purely numeric (`1`, `02`, `17`) → a sequence image, sorted by number
//! - anything else → an extra image, processed after the sequence
//!
//! ## Canonical names
//!
//! All variants of one source share a canonical base name that does not depend
//! on how the file happened to be named:
//!
//! - `cover` → `cover`
//! - `7` → `img-07` (two-digit padding, wider numbers kept as-is: `123` → `img-123`)
//!
//! Numbers are kept as digit strings with leading zeros stripped, so stems of
//! any length stay in the sequence and sort numerically.
//! - `hero-shot` → `img-hero-shot`
//!
//! Variant files append the preset and the format extension:
//! `img-07-medium.webp`, `cover.jpg`.

use crate::imaging::OutputFormat;
use std::path::{Path, PathBuf};

/// Logical name of the project cover.
pub const COVER: &str = "cover";

/// Role of a source image within its project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRole {
    Cover,
    /// Digits without leading zeros (`"0"` for all zeros).
    Numbered(String),
    Other(String),
}

impl ImageRole {
    /// Classify a file stem.
    pub fn from_stem(stem: &str) -> Self {
        if stem.eq_ignore_ascii_case(COVER) {
            return ImageRole::Cover;
        }
        if !is_all_digits(stem) {
            return ImageRole::Other(stem.to_string());
        }
        match stem.trim_start_matches('0') {
            "" => ImageRole::Numbered("0".to_string()),
            digits => ImageRole::Numbered(digits.to_string()),
        }
    }

    /// Numeric sort key for sequence images: shorter digit strings are
    /// smaller, equal lengths compare lexically.
    pub fn sequence_key(&self) -> Option<(usize, &str)> {
        match self {
            ImageRole::Numbered(digits) => Some((digits.len(), digits.as_str())),
            _ => None,
        }
    }

    /// Canonical base name shared by every variant of this image.
    pub fn canonical_name(&self) -> String {
        match self {
            ImageRole::Cover => COVER.to_string(),
            ImageRole::Numbered(digits) => format!("img-{digits:0>2}"),
            ImageRole::Other(name) => format!("img-{name}"),
        }
    }
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Canonical name for a logical image name.
///
/// ```
/// # use folio_optimize::naming::canonical_name;
/// assert_eq!(canonical_name("cover"), "cover");
/// assert_eq!(canonical_name("7"), "img-07");
/// assert_eq!(canonical_name("hero-shot"), "img-hero-shot");
/// ```
pub fn canonical_name(logical: &str) -> String {
    ImageRole::from_stem(logical).canonical_name()
}

/// File name of one variant: `{canonical}[-{preset}].{ext}`.
pub fn variant_filename(canonical: &str, preset: Option<&str>, format: OutputFormat) -> String {
    match preset {
        Some(preset) => format!("{canonical}-{preset}.{}", format.extension()),
        None => format!("{canonical}.{}", format.extension()),
    }
}

/// Every file name one source produces: the full-resolution pair, then one
/// pair per preset.
pub fn output_filenames(canonical: &str, presets: &[&str]) -> Vec<String> {
    std::iter::once(None)
        .chain(presets.iter().map(|p| Some(*p)))
        .flat_map(|preset| {
            OutputFormat::ALL
                .into_iter()
                .map(move |format| variant_filename(canonical, preset, format))
        })
        .collect()
}

/// Full path of one variant inside `output_dir`.
pub fn variant_path(
    output_dir: &Path,
    canonical: &str,
    preset: Option<&str>,
    format: OutputFormat,
) -> PathBuf {
    output_dir.join(variant_filename(canonical, preset, format))
}
