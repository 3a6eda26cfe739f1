//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the dimensions of `source` shrunk to fit inside `bounds`.
///
/// Aspect ratio is preserved and the image is never enlarged: a source that
/// already fits is returned unchanged. Each side is at least 1px.
///
/// # Examples
/// ```
/// # use asset_press::imaging::fit_inside;
/// // 4000x3000 into 1920x1080 → height is the limiting edge
/// assert_eq!(fit_inside((4000, 3000), (1920, 1080)), (1440, 1080));
///
/// // Already small enough → untouched
/// assert_eq!(fit_inside((800, 600), (1920, 1080)), (800, 600));
/// ```
pub fn fit_inside(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let ratio = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * ratio).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * ratio).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Derive bounds as a fraction of the source size.
///
/// `divisor = 2` halves both edges (floored). Bounds never drop below 1px and
/// a zero divisor is treated as 1.
pub fn fraction_bounds(source: (u32, u32), divisor: u32) -> (u32, u32) {
    let d = divisor.max(1);
    ((source.0 / d).max(1), (source.1 / d).max(1))
}
