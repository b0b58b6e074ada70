//! Responsive variant sets for one source image.
//!
//! ## Output
//!
//! For a source with canonical name `img-03` and the default presets:
//!
//! ```text
//! public/images/projects/bauhaus-poster/
//! ├── img-03.jpg                 # Full resolution, JPEG q92
//! ├── img-03.webp                # Full resolution, WebP q90
//! ├── img-03-thumbnail.jpg       # 400px, ≤ 50 KB if reachable
//! ├── img-03-thumbnail.webp      # 400px, ≤ 40 KB if reachable
//! ├── img-03-medium.jpg          # 800px
//! ├── img-03-medium.webp
//! ├── img-03-large.jpg           # 1200px
//! ├── img-03-large.webp
//! ├── img-03-desktop.jpg         # 1920px
//! └── img-03-desktop.webp
//! ```
//!
//! That is 2 + 2N files for N presets. When the source is no wider than a
//! preset, that preset's pair is a byte-for-byte copy of the full-resolution
//! pair: small images are never upscaled to a preset's nominal width.
//!
//! ## Failure handling
//!
//! Analysis, decoding or the full-resolution pair failing aborts the image
//! (`Err`). After that, each preset format is independent: a failed encode,
//! write or copy is recorded as [`VariantStatus::Failed`] and the remaining
//! presets still run. [`VariantSetReport::success`] is `false` if any variant
//! failed.

use crate::analyze::{ContentAnalysis, analyze};
use crate::config::{OptimizerConfig, SizePreset};
use crate::imaging::calculations::scaled_budget;
use crate::imaging::{
    BackendError, BudgetError, BudgetTarget, ConstrainedEncode, EncodingAttempt, ImageBackend,
    OutputFormat, Quality, encode_original, encode_within_budget,
};
use crate::naming::variant_path;
use std::path::Path;

/// Label used for the full-resolution pair.
pub const ORIGINAL_LABEL: &str = "original";

/// What happened to one variant file.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantStatus {
    /// Full-resolution encode at fixed quality.
    Original { quality: Quality, bytes: usize },
    /// Budgeted encode.
    Encoded {
        width: u32,
        quality: Quality,
        bytes: usize,
        max_bytes: usize,
        attempts: Vec<EncodingAttempt>,
        met_target: bool,
    },
    /// Source not wider than the preset; full-resolution file copied.
    Copied { bytes: u64 },
    Failed(String),
}

impl VariantStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, VariantStatus::Failed(_))
    }
}

/// One written (or attempted) variant file.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantInfo {
    /// Preset name, or [`ORIGINAL_LABEL`].
    pub label: String,
    pub format: OutputFormat,
    pub status: VariantStatus,
}

/// Outcome of [`build_variant_set`] for one source.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSetReport {
    pub canonical: String,
    pub analysis: ContentAnalysis,
    pub variants: Vec<VariantInfo>,
    /// No variant failed.
    pub success: bool,
}

fn budgeted_status(
    result: Result<ConstrainedEncode, BudgetError>,
    max_bytes: usize,
) -> VariantStatus {
    match result {
        Ok(encoded) => VariantStatus::Encoded {
            width: encoded.width,
            quality: encoded.quality,
            bytes: encoded.bytes,
            max_bytes,
            attempts: encoded.attempts,
            met_target: encoded.met_target,
        },
        Err(e) => VariantStatus::Failed(e.to_string()),
    }
}

fn copy_status(from: &Path, to: &Path) -> VariantStatus {
    match std::fs::copy(from, to) {
        Ok(bytes) => VariantStatus::Copied { bytes },
        Err(e) => VariantStatus::Failed(format!("copy to {} failed: {e}", to.display())),
    }
}

/// Write the full variant set for `source` into `output_dir` under `canonical`.
///
/// `output_dir` must exist.
pub fn build_variant_set(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    canonical: &str,
    config: &OptimizerConfig,
) -> Result<VariantSetReport, BackendError> {
    let analysis = analyze(backend, source)?;
    let image = backend.decode(source)?;
    let budget = config.encoder.budget();

    let mut variants = Vec::with_capacity(2 + 2 * config.presets.len());

    let originals = [
        (OutputFormat::Jpeg, config.originals.jpeg_quality),
        (OutputFormat::WebP, config.originals.webp_quality),
    ];
    for (format, quality) in originals {
        let quality = Quality::new(quality);
        let path = variant_path(output_dir, canonical, None, format);
        let bytes = encode_original(backend, &image, &path, format, quality)?;
        variants.push(VariantInfo {
            label: ORIGINAL_LABEL.to_string(),
            format,
            status: VariantStatus::Original { quality, bytes },
        });
    }

    let mut presets: Vec<&SizePreset> = config.presets.iter().collect();
    presets.sort_by_key(|p| p.width);

    for preset in presets {
        let name = preset.name.as_str();

        if analysis.width <= preset.width {
            for format in OutputFormat::ALL {
                let from = variant_path(output_dir, canonical, None, format);
                let to = variant_path(output_dir, canonical, Some(name), format);
                variants.push(VariantInfo {
                    label: name.to_string(),
                    format,
                    status: copy_status(&from, &to),
                });
            }
            continue;
        }

        let jpeg = encode_within_budget(
            backend,
            &image,
            &variant_path(output_dir, canonical, Some(name), OutputFormat::Jpeg),
            &BudgetTarget {
                format: OutputFormat::Jpeg,
                width: preset.width,
                max_bytes: preset.max_bytes,
                class: analysis.class,
                start_quality: None,
            },
            &budget,
        );
        // WebP picks up where JPEG settled, shifted by the usual WebP offset.
        let webp_start = jpeg
            .as_ref()
            .ok()
            .map(|r| r.quality.reduced_by(budget.webp_offset, Quality(1)));
        variants.push(VariantInfo {
            label: name.to_string(),
            format: OutputFormat::Jpeg,
            status: budgeted_status(jpeg, preset.max_bytes),
        });

        let webp_budget = scaled_budget(preset.max_bytes, config.encoder.webp_budget_ratio);
        let webp = encode_within_budget(
            backend,
            &image,
            &variant_path(output_dir, canonical, Some(name), OutputFormat::WebP),
            &BudgetTarget {
                format: OutputFormat::WebP,
                width: preset.width,
                max_bytes: webp_budget,
                class: analysis.class,
                start_quality: webp_start,
            },
            &budget,
        );
        variants.push(VariantInfo {
            label: name.to_string(),
            format: OutputFormat::WebP,
            status: budgeted_status(webp, webp_budget),
        });
    }

    let success = variants.iter().all(|v| !v.status.is_failed());
    Ok(VariantSetReport {
        canonical: canonical.to_string(),
        analysis,
        variants,
        success,
    })
}
