//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the image task
//! needs: read metadata, scale, and compress. Everything above it (planning,
//! naming, task orchestration) is backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate and oxipng.

use super::params::{CompressParams, TargetFormat};
use super::planner::PlannedImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Encoding detected from a source's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Avif,
    Other(String),
}

impl SourceFormat {
    /// The writable format matching this source, if the backend can encode it.
    pub fn as_target(&self) -> Option<TargetFormat> {
        match self {
            SourceFormat::Jpeg => Some(TargetFormat::Jpeg),
            SourceFormat::Png => Some(TargetFormat::Png),
            SourceFormat::WebP => Some(TargetFormat::WebP),
            SourceFormat::Avif => Some(TargetFormat::Avif),
            SourceFormat::Gif | SourceFormat::Other(_) => None,
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Jpeg => f.write_str("jpeg"),
            SourceFormat::Png => f.write_str("png"),
            SourceFormat::WebP => f.write_str("webp"),
            SourceFormat::Gif => f.write_str("gif"),
            SourceFormat::Avif => f.write_str("avif"),
            SourceFormat::Other(name) => f.write_str(name),
        }
    }
}

/// Decoded header information for a source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMetadata {
    pub width: u32,
    pub height: u32,
    pub format: SourceFormat,
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: the task runner calls them from rayon
/// workers, one source per call, with no shared mutable state.
pub trait ImageBackend: Sync {
    /// Read width, height and format without decoding pixels.
    fn read_metadata(&self, bytes: &[u8]) -> Result<SourceMetadata, BackendError>;

    /// Scale a planned image and encode it in its output format.
    fn scale(&self, planned: &PlannedImage) -> Result<Vec<u8>, BackendError>;

    /// Recompress already-encoded bytes of the given format.
    fn compress(
        &self,
        bytes: &[u8],
        format: TargetFormat,
        params: &CompressParams,
    ) -> Result<Vec<u8>, BackendError>;
}
