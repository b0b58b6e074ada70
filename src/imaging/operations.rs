//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they pick
//! dimensions and qualities, call the backend, and write the result.
//!
//! ## Byte budgets are advisory
//!
//! [`encode_within_budget`] lowers quality until the output fits the budget,
//! but never below the per-format floor and never for more than
//! [`BudgetConfig::max_attempts`] encodes. When the floor is hit first the
//! oversize buffer is written anyway and [`ConstrainedEncode::met_target`] is
//! `false`. Callers that need a hard cap must check that flag.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{next_quality, scaled_to_width};
use super::params::{EncodeParams, OutputFormat, Quality};
use crate::analyze::ContentClass;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// A constrained encode that failed, with how far the loop got.
#[derive(Error, Debug)]
#[error("{source} (attempt {attempts} of {max_attempts})")]
pub struct BudgetError {
    /// Encodes tried, counting the one that failed.
    pub attempts: usize,
    pub max_attempts: usize,
    pub source: BackendError,
}

/// Knobs for the quality-reduction loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetConfig {
    /// Hard cap on encodes per target.
    pub max_attempts: u32,
    pub jpeg_floor: Quality,
    pub webp_floor: Quality,
    /// Subtracted from the class base quality for WebP.
    pub webp_offset: u8,
}

impl BudgetConfig {
    /// Lowest quality the loop will go to for `format`.
    pub fn floor(&self, format: OutputFormat) -> Quality {
        match format {
            OutputFormat::Jpeg => self.jpeg_floor,
            OutputFormat::WebP => self.webp_floor,
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            jpeg_floor: Quality(70),
            webp_floor: Quality(65),
            webp_offset: 5,
        }
    }
}

/// What one constrained encode should produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetTarget {
    pub format: OutputFormat,
    /// Requested width; sources narrower than this are not upscaled.
    pub width: u32,
    pub max_bytes: usize,
    pub class: ContentClass,
    /// Explicit starting quality, bypassing the class base and WebP offset.
    pub start_quality: Option<Quality>,
}

/// One encode try inside the reduction loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingAttempt {
    pub quality: Quality,
    pub bytes: usize,
    pub width: u32,
    pub format: OutputFormat,
}

/// Outcome of [`encode_within_budget`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConstrainedEncode {
    /// Quality of the buffer that was written.
    pub quality: Quality,
    /// Size of the written file.
    pub bytes: usize,
    pub width: u32,
    pub height: u32,
    pub attempts: Vec<EncodingAttempt>,
    /// `bytes <= max_bytes`. The budget is advisory: `false` means the
    /// attempt cap or quality floor was reached first.
    pub met_target: bool,
}

/// Starting quality for a constrained encode.
///
/// An explicit `start_quality` wins; otherwise the class base, lowered by
/// the WebP offset for WebP. Never below the format floor.
pub fn initial_quality(target: &BudgetTarget, config: &BudgetConfig) -> Quality {
    let base = match (target.start_quality, target.format) {
        (Some(q), _) => q,
        (None, OutputFormat::Jpeg) => target.class.base_quality(),
        (None, OutputFormat::WebP) => target
            .class
            .base_quality()
            .reduced_by(config.webp_offset, Quality(1)),
    };
    base.max(config.floor(target.format))
}

/// Resize `image` to the target width and encode it, lowering quality until
/// the result fits `target.max_bytes`, then write the last buffer to `output`.
///
/// Always writes a file unless the backend or the filesystem fails.
pub fn encode_within_budget(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    output: &Path,
    target: &BudgetTarget,
    config: &BudgetConfig,
) -> std::result::Result<ConstrainedEncode, BudgetError> {
    let source = Dimensions {
        width: image.width(),
        height: image.height(),
    };
    let dims = scaled_to_width(source, target.width);
    let resized = backend.resize(image, dims.width, dims.height);

    let floor = config.floor(target.format);
    let max_attempts = config.max_attempts.max(1) as usize;
    let mut quality = initial_quality(target, config);
    let mut attempts = Vec::with_capacity(max_attempts);

    let buffer = loop {
        let params = EncodeParams::for_width(target.format, quality, dims.width);
        let buffer = backend
            .encode(&resized, &params)
            .map_err(|source| BudgetError {
                attempts: attempts.len() + 1,
                max_attempts,
                source,
            })?;
        attempts.push(EncodingAttempt {
            quality,
            bytes: buffer.len(),
            width: dims.width,
            format: target.format,
        });

        if buffer.len() <= target.max_bytes || attempts.len() >= max_attempts {
            break buffer;
        }
        let next = next_quality(quality, buffer.len(), target.max_bytes, floor);
        if next == quality {
            // Pinned at the floor: another encode would produce the same bytes.
            break buffer;
        }
        quality = next;
    };

    std::fs::write(output, &buffer).map_err(|e| BudgetError {
        attempts: attempts.len(),
        max_attempts,
        source: BackendError::Io(e),
    })?;

    Ok(ConstrainedEncode {
        quality,
        bytes: buffer.len(),
        width: dims.width,
        height: dims.height,
        met_target: buffer.len() <= target.max_bytes,
        attempts,
    })
}

/// Encode `image` at native resolution with fixed quality and write it.
///
/// Returns the written size.
pub fn encode_original(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    output: &Path,
    format: OutputFormat,
    quality: Quality,
) -> Result<usize> {
    let buffer = backend.encode(image, &EncodeParams::original(format, quality))?;
    std::fs::write(output, &buffer)?;
    Ok(buffer.len())
}
