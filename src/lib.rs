//! # folio-optimize
//!
//! Turns the source images of a design portfolio into responsive JPEG and
//! WebP variants. Each project is a directory of images; each image becomes
//! a full-resolution pair plus one pair per size preset, and every preset is
//! encoded against a byte budget.
//!
//! # Pipeline
//!
//! ```text
//! scan       project dir  →  ordered image set   (cover, 1..n, rest)
//! analyze    source       →  dimensions + class  (header only)
//! variants   source       →  2 + 2N files        (budgeted encodes, copies)
//! process    projects     →  run summary         (events on a channel)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists projects and orders a project's source images |
//! | [`naming`] | Source roles (`cover`, numbered, other) and canonical output names |
//! | [`analyze`] | Source dimensions, aspect ratio and content classification |
//! | [`imaging`] | Codec backend trait, budget loop, quality and size calculations |
//! | [`variants`] | Builds the full variant set of one source |
//! | [`process`] | Batch driver over projects, parallel per image, progress events |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting for progress, summary and `--check` |
//!
//! # Design Decisions
//!
//! ## Byte Budgets Are Advisory
//!
//! The encoder lowers quality a few steps at a time, but never below a
//! per-format floor (JPEG 70, WebP 65) and never for more than five encodes.
//! An image that still does not fit is written at the floor and flagged
//! ([`imaging::ConstrainedEncode::met_target`]). Visual quality wins over the
//! budget.
//!
//! ## Never Upscale
//!
//! When a source is no wider than a preset, the preset's files are plain
//! copies of the full-resolution pair. Pages can always reference every
//! preset name without the tool inventing pixels.
//!
//! ## Injected Backend
//!
//! All codec work goes through [`imaging::ImageBackend`]. Production uses
//! [`imaging::RustBackend`] (`image` for decode and Lanczos3 resampling,
//! mozjpeg and libwebp for encoding); tests use a recording mock so the
//! quality loop can be checked without encoding real pixels.

pub mod analyze;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod variants;
