//! Production codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify (JPEG, PNG) | `image::ImageReader::into_dimensions` (header only) |
//! | Decode | `image` crate (pure Rust decoders) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `mozjpeg` (optimized Huffman tables, progressive scans) |
//! | Encode → WebP | `webp` (libwebp, method 6, sharp YUV) |

use super::backend::{BackendError, Dimensions, ImageBackend, SourceFormat, SourceInfo};
use super::params::{EncodeParams, OutputFormat};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::path::Path;

/// Source extensions the pipeline picks up from a project directory.
const SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Returns the set of image file extensions accepted as sources.
pub fn supported_input_extensions() -> &'static [&'static str] {
    SOURCE_EXTENSIONS
}

/// Backend built on `image` for decoding/resampling and on mozjpeg/libwebp
/// for lossy encoding.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open_reader(
    path: &Path,
) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()
        .map_err(BackendError::Io)
}

fn encode_jpeg(image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
    use mozjpeg::{ColorSpace, Compress, ScanMode};

    let rgb: Cow<'_, image::RgbImage> = match image {
        DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
        _ => Cow::Owned(image.to_rgb8()),
    };
    let (w, h) = rgb.dimensions();
    if w == 0 || h == 0 {
        return Err(BackendError::Encode(format!(
            "cannot encode empty {w}x{h} image"
        )));
    }

    if rgb.as_raw().len() != w as usize * h as usize * 3 {
        return Err(BackendError::Encode(format!(
            "RGB buffer does not match {w}x{h}"
        )));
    }

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(w as usize, h as usize);
    comp.set_color_space(ColorSpace::JCS_YCbCr);
    comp.set_quality(params.quality.value() as f32);
    let chroma = params.chroma.pixel_size();
    comp.set_chroma_sampling_pixel_sizes(chroma, chroma);
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);
    comp.set_optimize_scans(true);
    comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);

    let estimated = (w as usize * h as usize * 3 / 10).max(4096);
    let mut started = comp
        .start_compress(Vec::with_capacity(estimated))
        .map_err(|e| BackendError::Encode(format!("mozjpeg start: {e}")))?;
    started
        .write_scanlines(rgb.as_raw())
        .map_err(|e| BackendError::Encode(format!("mozjpeg scanlines: {e}")))?;
    started
        .finish()
        .map_err(|e| BackendError::Encode(format!("mozjpeg finish: {e}")))
}

fn encode_webp(image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| BackendError::Encode("failed to create WebPConfig".to_string()))?;
    config.quality = params.quality.value() as f32;
    config.method = params.method;
    config.alpha_quality = params.alpha_quality;
    config.use_sharp_yuv = i32::from(params.sharp_yuv);

    let (w, h) = (image.width(), image.height());
    let memory = if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), w, h).encode_advanced(&config)
    } else {
        let rgb = image.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), w, h).encode_advanced(&config)
    }
    .map_err(|e| BackendError::Encode(format!("WebP encode failed: {e:?}")))?;

    Ok(memory.to_vec())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<SourceInfo, BackendError> {
        let reader = open_reader(path)?;
        let format = match reader.format() {
            Some(ImageFormat::Jpeg) => SourceFormat::Jpeg,
            Some(ImageFormat::Png) => SourceFormat::Png,
            other => {
                return Err(BackendError::Decode(format!(
                    "{}: unsupported source format {other:?}",
                    path.display()
                )));
            }
        };
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::Decode(format!("{}: failed to read header: {e}", path.display()))
        })?;
        Ok(SourceInfo {
            dimensions: Dimensions { width, height },
            format,
        })
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        open_reader(path)?
            .decode()
            .map_err(|e| BackendError::Decode(format!("{}: {e}", path.display())))
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        if image.width() == width && image.height() == height {
            return image.clone();
        }
        image.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        match params.format {
            OutputFormat::Jpeg => encode_jpeg(image, params),
            OutputFormat::WebP => encode_webp(image, params),
        }
    }
}
