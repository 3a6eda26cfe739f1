//! Image processing in pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Read metadata** | `image::ImageReader::into_dimensions` |
//! | **Plan** | [`RescalePlanner`] (bounds, fit, format, output name) |
//! | **Scale → JPEG/PNG/WebP/AVIF** | Lanczos3 resize + `image` encoders |
//! | **Compress** | JPEG re-encode, oxipng for PNG |
//! | **GIF / SVG** | `image` GIF codec, `usvg` tree rewrite |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Planner**: Scale instruction and output name for one source
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Vector**: GIF and SVG optimizers for the `vectors` task

pub mod backend;
mod calculations;
mod params;
pub mod planner;
pub mod rust_backend;
pub mod vector;

pub use backend::{BackendError, ImageBackend, SourceFormat, SourceMetadata};
pub use calculations::{fit_inside, fraction_bounds};
pub use params::{CompressParams, FitMode, FormatOptions, Quality, ScaleInstruction, TargetFormat};
pub use planner::{BoundsPolicy, PlanError, PlannedImage, RescalePlanner, SourceImage};
pub use rust_backend::RustBackend;
