//! Content analysis for source images.
//!
//! Before an image is encoded the pipeline needs two things from it: its
//! dimensions (to decide which presets are downscales and which are copies)
//! and a coarse [`ContentClass`] that seeds the encoder's starting quality.
//!
//! Only the header is read here. Pixel decoding happens later, once, in the
//! variant builder.
//!
//! ## Classification
//!
//! [`classify`] is a pure function of the container format and the
//! dimensions. Every input currently lands in [`ContentClass::Standard`]; the
//! other tiers carry their own starting qualities so content-aware tuning
//! (detail measurement, flat-color detection) can slot in here without
//! touching the encoder's interface.

use crate::imaging::calculations::aspect_ratio;
use crate::imaging::{BackendError, Dimensions, ImageBackend, Quality, SourceFormat};
use std::path::Path;

/// Either dimension above this counts as a large source.
pub const LARGE_EDGE: u32 = 2000;

/// Expected compressibility of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// Fine texture, noise, foliage. Needs more bits.
    Complex,
    /// Typical photography and renders.
    Standard,
    /// Flat illustration, UI screenshots, large solid areas.
    Simple,
}

impl ContentClass {
    /// Starting encoder quality when no explicit start is given.
    pub fn base_quality(self) -> Quality {
        match self {
            ContentClass::Complex => Quality(90),
            ContentClass::Standard => Quality(85),
            ContentClass::Simple => Quality(80),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentClass::Complex => "complex",
            ContentClass::Standard => "standard",
            ContentClass::Simple => "simple",
        }
    }
}

/// Header facts plus classification for one source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentAnalysis {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub format: SourceFormat,
    /// Either edge exceeds [`LARGE_EDGE`].
    pub large: bool,
    pub class: ContentClass,
}

impl ContentAnalysis {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

/// Classify a source by format and size.
pub fn classify(_format: SourceFormat, _dims: Dimensions) -> ContentClass {
    ContentClass::Standard
}

/// Analyze a source image from its header.
pub fn analyze(backend: &impl ImageBackend, path: &Path) -> Result<ContentAnalysis, BackendError> {
    let info = backend.identify(path)?;
    let dims = info.dimensions;
    if dims.width == 0 || dims.height == 0 {
        return Err(BackendError::Decode(format!(
            "{}: image has zero size",
            path.display()
        )));
    }
    Ok(ContentAnalysis {
        width: dims.width,
        height: dims.height,
        aspect_ratio: aspect_ratio(dims),
        format: info.format,
        large: dims.width > LARGE_EDGE || dims.height > LARGE_EDGE,
        class: classify(info.format, dims),
    })
}
