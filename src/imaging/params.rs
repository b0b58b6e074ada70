//! Parameter types for image operations.
//!
//! These structs describe *what* to encode, not *how*. They are the interface
//! between the high-level [`operations`](super::operations) module (which
//! decides widths, qualities and budgets) and the [`backend`](super::backend)
//! (which does the pixel and codec work). Keeping them separate lets the
//! operations be tested against a mock backend.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`OutputFormat`] — JPEG or WebP, with the per-format extension and quality floor.
//! - [`ChromaSubsampling`] — JPEG chroma layout, picked from the output width.
//! - [`EncodeParams`] — Full specification for one encode: format, quality, codec knobs.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Lower the quality by `step`, never going below `floor`.
    pub fn reduced_by(self, step: u8, floor: Quality) -> Self {
        Self(self.0.saturating_sub(step).max(floor.0).max(1))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Encoded output format of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    WebP,
}

impl OutputFormat {
    /// Both formats, in the order every variant pair is written.
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Jpeg, OutputFormat::WebP];

    /// File extension used for written variants.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }

    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::WebP => "webp",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// JPEG chroma subsampling layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaSubsampling {
    /// Full chroma resolution.
    Yuv444,
    /// Chroma halved in both directions.
    Yuv420,
}

impl ChromaSubsampling {
    /// Width above which 4:2:0 is used. Small renditions keep full chroma so
    /// colored edges stay crisp at thumbnail scale.
    pub const FULL_CHROMA_MAX_WIDTH: u32 = 1000;

    pub fn for_width(width: u32) -> Self {
        if width > Self::FULL_CHROMA_MAX_WIDTH {
            ChromaSubsampling::Yuv420
        } else {
            ChromaSubsampling::Yuv444
        }
    }

    /// Horizontal/vertical pixel block covered by one chroma sample.
    pub fn pixel_size(self) -> (u8, u8) {
        match self {
            ChromaSubsampling::Yuv444 => (1, 1),
            ChromaSubsampling::Yuv420 => (2, 2),
        }
    }
}

/// WebP encoder effort (libwebp `method`, 0 = fast, 6 = slowest/best).
pub const WEBP_METHOD: i32 = 6;

/// WebP alpha plane quality.
pub const WEBP_ALPHA_QUALITY: i32 = 90;

/// Parameters for one in-memory encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub format: OutputFormat,
    pub quality: Quality,
    /// JPEG only.
    pub chroma: ChromaSubsampling,
    /// WebP only.
    pub method: i32,
    /// WebP only.
    pub alpha_quality: i32,
    /// WebP only: sharp RGB→YUV conversion ("smart subsampling").
    pub sharp_yuv: bool,
}

impl EncodeParams {
    /// Web-tuned settings for a rendition `width` pixels wide.
    pub fn for_width(format: OutputFormat, quality: Quality, width: u32) -> Self {
        Self {
            format,
            quality,
            chroma: ChromaSubsampling::for_width(width),
            method: WEBP_METHOD,
            alpha_quality: WEBP_ALPHA_QUALITY,
            sharp_yuv: true,
        }
    }

    /// Settings for the unconstrained full-resolution pair. JPEG keeps full
    /// chroma regardless of size.
    pub fn original(format: OutputFormat, quality: Quality) -> Self {
        Self {
            chroma: ChromaSubsampling::Yuv444,
            ..Self::for_width(format, quality, 0)
        }
    }
}
