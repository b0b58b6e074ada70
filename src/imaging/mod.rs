//! Image transcoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Resize** | Lanczos3, downscale only |
//! | **Encode → JPEG** | `mozjpeg` |
//! | **Encode → WebP** | `webp` (libwebp) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math and quality stepping (unit testable)
//! - **Parameters**: Data structures describing encodes
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The size-budget loop and fixed-quality encodes on top of a backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, SourceFormat, SourceInfo};
pub use calculations::scaled_to_width;
pub use operations::{
    BudgetConfig, BudgetError, BudgetTarget, ConstrainedEncode, EncodingAttempt, encode_original,
    encode_within_budget,
};
pub use params::{ChromaSubsampling, EncodeParams, OutputFormat, Quality};
pub use rust_backend::{RustBackend, supported_input_extensions};
