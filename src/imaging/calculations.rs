//! Pure calculation functions for dimensions and quality stepping.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::Quality;

/// Scale `source` to `target_width`, preserving aspect ratio.
///
/// Never upscales: a target wider than the source returns the source size.
/// Height is rounded and kept at least 1px.
///
/// # Examples
/// ```
/// # use folio_optimize::imaging::{Dimensions, scaled_to_width};
/// let src = Dimensions { width: 3000, height: 2000 };
/// assert_eq!(scaled_to_width(src, 800), Dimensions { width: 800, height: 533 });
/// assert_eq!(scaled_to_width(src, 4000), src);
/// ```
pub fn scaled_to_width(source: Dimensions, target_width: u32) -> Dimensions {
    if target_width >= source.width || source.width == 0 {
        return source;
    }
    let ratio = target_width as f64 / source.width as f64;
    let height = ((source.height as f64 * ratio).round() as u32).max(1);
    Dimensions {
        width: target_width.max(1),
        height,
    }
}

/// Width divided by height, 0.0 for degenerate input.
pub fn aspect_ratio(dims: Dimensions) -> f64 {
    if dims.height == 0 {
        0.0
    } else {
        dims.width as f64 / dims.height as f64
    }
}

/// How far to lower quality after an attempt came out `bytes` against a
/// budget of `max_bytes`.
///
/// - more than 1.5× over → 8
/// - more than 1.2× over → 5
/// - otherwise → 3
pub fn quality_step(bytes: usize, max_bytes: usize) -> u8 {
    let ratio = bytes as f64 / max_bytes.max(1) as f64;
    if ratio > 1.5 {
        8
    } else if ratio > 1.2 {
        5
    } else {
        3
    }
}

/// Quality for the next attempt: current minus [`quality_step`], clamped at `floor`.
pub fn next_quality(current: Quality, bytes: usize, max_bytes: usize, floor: Quality) -> Quality {
    current.reduced_by(quality_step(bytes, max_bytes), floor)
}

/// Scale a byte budget by `ratio` (used for WebP's tighter budget).
pub fn scaled_budget(max_bytes: usize, ratio: f64) -> usize {
    ((max_bytes as f64 * ratio).round() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    // =========================================================================
    // scaled_to_width tests
    // =========================================================================

    #[test]
    fn scales_landscape_down() {
        assert_eq!(scaled_to_width(dims(3000, 2000), 800), dims(800, 533));
    }

    #[test]
    fn scales_portrait_down() {
        assert_eq!(scaled_to_width(dims(1500, 2000), 750), dims(750, 1000));
    }

    #[test]
    fn never_upscales() {
        assert_eq!(scaled_to_width(dims(640, 480), 1920), dims(640, 480));
    }

    #[test]
    fn equal_width_is_unchanged() {
        assert_eq!(scaled_to_width(dims(800, 600), 800), dims(800, 600));
    }

    #[test]
    fn extreme_panorama_keeps_one_pixel_height() {
        assert_eq!(scaled_to_width(dims(10000, 2), 100), dims(100, 1));
    }

    #[test]
    fn aspect_ratio_of_degenerate_is_zero() {
        assert_eq!(aspect_ratio(dims(10, 0)), 0.0);
        assert_eq!(aspect_ratio(dims(300, 200)), 1.5);
    }

    // =========================================================================
    // quality stepping
    // =========================================================================

    #[test]
    fn step_sizes_follow_overshoot() {
        assert_eq!(quality_step(400_000, 200_000), 8);
        assert_eq!(quality_step(300_001, 200_000), 8);
        assert_eq!(quality_step(300_000, 200_000), 5);
        assert_eq!(quality_step(250_000, 200_000), 5);
        assert_eq!(quality_step(240_000, 200_000), 3);
        assert_eq!(quality_step(210_000, 200_000), 3);
    }

    #[test]
    fn next_quality_clamps_to_floor() {
        let floor = Quality::new(70);
        assert_eq!(next_quality(Quality::new(85), 500, 100, floor).value(), 77);
        assert_eq!(next_quality(Quality::new(72), 500, 100, floor).value(), 70);
        assert_eq!(next_quality(Quality::new(70), 500, 100, floor).value(), 70);
    }

    #[test]
    fn zero_budget_does_not_divide_by_zero() {
        assert_eq!(quality_step(10, 0), 8);
    }

    #[test]
    fn webp_budget_is_eighty_percent() {
        assert_eq!(scaled_budget(200_000, 0.8), 160_000);
        assert_eq!(scaled_budget(0, 0.8), 1);
    }
}
