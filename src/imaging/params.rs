//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the [`planner`](super::planner) (which decides target
//! bounds, fit and format for each source) and the [`backend`](super::backend)
//! (which does the pixel work). The split lets tests drive the planner and the
//! task runner against a mock backend.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100). Clamped on construction.
//! - [`FitMode`] — How a source is mapped onto the instruction's bounds.
//! - [`TargetFormat`] — Output encodings the backend can produce.
//! - [`ScaleInstruction`] — Bounds, fit, metadata policy and encode options for one source.
//! - [`CompressParams`] — Settings for the lossy/lossless recompression stage.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Highest quality, used when a later stage applies the real lossy pass.
    pub fn max() -> Self {
        Self(100)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `u8` most encoders take.
    pub fn as_u8(self) -> u8 {
        self.0.clamp(1, 100) as u8
    }
}

/// How source pixels are mapped onto `max_width` × `max_height`.
///
/// - `Inside`: shrink to fit within the bounds, preserving aspect ratio. Never enlarges.
/// - `Cover`: resize to cover the bounds and center-crop the overflow.
/// - `Fill`: stretch to exactly the bounds, ignoring aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    #[default]
    Inside,
    Cover,
    Fill,
}

/// Encodings the scaling stage can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFormat {
    #[serde(rename = "jpg", alias = "jpeg")]
    Jpeg,
    #[serde(rename = "png")]
    Png,
    #[serde(rename = "webp")]
    WebP,
    #[serde(rename = "avif")]
    Avif,
}

impl TargetFormat {
    /// File extension written for this format, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::WebP => "webp",
            TargetFormat::Avif => "avif",
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Per-format encode options carried by a [`ScaleInstruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub quality: Quality,
}

/// Everything the scaling engine needs to know about one source image.
///
/// Built fresh per source by the planner and consumed once by
/// [`ImageBackend::scale`](super::ImageBackend::scale).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleInstruction {
    pub max_width: u32,
    pub max_height: u32,
    pub fit: FitMode,
    /// Carry embedded metadata (ICC profile) into the output.
    pub metadata: bool,
    /// Output encoding. `None` keeps the source's own format.
    pub format: Option<TargetFormat>,
    pub format_options: FormatOptions,
}

/// Parameters for the recompression stage that runs after scaling.
///
/// - `jpeg_quality`: lossy re-encode quality for JPEG output
/// - `png_level`: oxipng optimization preset (0–6) for PNG output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressParams {
    pub jpeg_quality: Quality,
    pub png_level: u8,
}
