//! Image rescale planning.
//!
//! Turns a source image and its header metadata into a [`PlannedImage`]: the
//! [`ScaleInstruction`] for the scaling engine plus the output file name. The
//! planner does no pixel work and holds no mutable state, so one planner is
//! shared by every rayon worker of the image task.
//!
//! ## Stock plan
//!
//! ```text
//! bounds   fixed 1920×1080 (not derived from the source)
//! fit      inside (shrink to fit, never enlarge)
//! metadata preserved
//! quality  100 (the compression stage applies the real lossy quality)
//! format   unchanged
//! suffixes none
//! ```

use super::backend::{BackendError, ImageBackend, SourceFormat, SourceMetadata};
use super::calculations::fraction_bounds;
use super::params::{FitMode, FormatOptions, Quality, ScaleInstruction, TargetFormat};
use crate::naming::{SuffixToken, compute_file_name};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Failed to read image metadata of {path}: {source}")]
    MetadataRead { path: PathBuf, source: BackendError },
    #[error("No encoder for {format} source {path}; set images.format to convert it")]
    NoEncoder { path: PathBuf, format: SourceFormat },
}

/// A source file as handed over by the task runner.
///
/// Bytes are shared immutably, so cloning is cheap and a planned copy can
/// never alias mutable state with the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    pub bytes: Arc<[u8]>,
}

impl SourceImage {
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// Where an instruction's bounds come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsPolicy {
    /// The same bounds for every source.
    Fixed { max_width: u32, max_height: u32 },
    /// Source dimensions divided by `divisor` (floored).
    Fraction { divisor: u32 },
}

impl Default for BoundsPolicy {
    fn default() -> Self {
        BoundsPolicy::Fixed {
            max_width: 1920,
            max_height: 1080,
        }
    }
}

/// A source paired with everything needed to scale and name it.
#[derive(Debug, Clone)]
pub struct PlannedImage {
    pub source: SourceImage,
    pub metadata: SourceMetadata,
    pub scale: ScaleInstruction,
    /// Resolved encoding: the instruction's format, or the source's own.
    pub output_format: TargetFormat,
    /// Bare file name, written next to the source.
    pub output_name: String,
}

/// Planning policy for the image task.
#[derive(Debug, Clone)]
pub struct RescalePlanner {
    pub bounds: BoundsPolicy,
    pub fit: FitMode,
    pub metadata: bool,
    pub quality: Quality,
    pub format: Option<TargetFormat>,
    pub suffixes: Vec<SuffixToken>,
}

impl Default for RescalePlanner {
    fn default() -> Self {
        Self {
            bounds: BoundsPolicy::default(),
            fit: FitMode::Inside,
            metadata: true,
            quality: Quality::max(),
            format: None,
            suffixes: Vec::new(),
        }
    }
}

impl RescalePlanner {
    /// Build the scale instruction for a source with the given metadata.
    pub fn instruction_for(&self, metadata: &SourceMetadata) -> ScaleInstruction {
        let (max_width, max_height) = match self.bounds {
            BoundsPolicy::Fixed {
                max_width,
                max_height,
            } => (max_width, max_height),
            BoundsPolicy::Fraction { divisor } => {
                fraction_bounds((metadata.width, metadata.height), divisor)
            }
        };

        ScaleInstruction {
            max_width,
            max_height,
            fit: self.fit,
            metadata: self.metadata,
            format: self.format,
            format_options: FormatOptions {
                quality: self.quality,
            },
        }
    }

    /// Plan one source from the outcome of its metadata read.
    ///
    /// A failed read is returned as [`PlanError::MetadataRead`]; there is no
    /// fallback instruction. The returned plan holds its own handle on the
    /// source, leaving the caller's value untouched.
    pub fn compute_scale_instructions(
        &self,
        source: &SourceImage,
        metadata: Result<SourceMetadata, BackendError>,
    ) -> Result<PlannedImage, PlanError> {
        let metadata = metadata.map_err(|e| PlanError::MetadataRead {
            path: source.path.clone(),
            source: e,
        })?;

        let scale = self.instruction_for(&metadata);
        let output_format = match scale.format.or_else(|| metadata.format.as_target()) {
            Some(format) => format,
            None => {
                return Err(PlanError::NoEncoder {
                    path: source.path.clone(),
                    format: metadata.format,
                });
            }
        };
        let output_name = compute_file_name(&source.path, &scale, &self.suffixes);

        Ok(PlannedImage {
            source: source.clone(),
            metadata,
            scale,
            output_format,
            output_name,
        })
    }

    /// Read metadata through `backend` and plan the source.
    pub fn plan(
        &self,
        backend: &impl ImageBackend,
        source: &SourceImage,
    ) -> Result<PlannedImage, PlanError> {
        let metadata = backend.read_metadata(&source.bytes);
        self.compute_scale_instructions(source, metadata)
    }
}
