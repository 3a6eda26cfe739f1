//! # asset-press
//!
//! Post-processing for a built static site. Point it at the `public/`
//! directory your generator produced and it minifies JavaScript, CSS and HTML,
//! and shrinks and recompresses images, writing the results back in place.
//!
//! # Architecture: Select → Process → Write Back
//!
//! ```text
//! 1. Select    public/ + globs  →  files per task       (scan)
//! 2. Process   file bytes       →  smaller bytes        (minify / imaging)
//! 3. Write     smaller bytes    →  public/ + ledger     (tasks, cache)
//! ```
//!
//! Every compression and minification algorithm comes from a crate. What
//! this crate decides is *which* files each task touches, *which* engine and
//! options it uses, and for images *what size and name* the output gets.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`tasks`] | Task definitions and the parallel runner ([`tasks::Pipeline`]) |
//! | [`imaging`] | Rescale planner, image backend trait, pure-Rust backend, GIF/SVG optimizers |
//! | [`naming`] | Output file names for rescaled images (suffix tokens, target extension) |
//! | [`minify`] | JavaScript, CSS and HTML minification |
//! | [`scan`] | Include/exclude glob selection over the public tree |
//! | [`cache`] | Ledger of processed files so reruns skip finished work |
//! | [`config`] | `asset-press.toml` loading, merging onto stock defaults, validation |
//! | [`output`] | CLI output formatting for progress, summaries and `check` |
//!
//! # Design Decisions
//!
//! ## In-Place With a Ledger
//!
//! The tool runs after the site generator, over its output, so there is no
//! separate destination tree. That makes reruns dangerous for lossy steps: a
//! JPEG recompressed at quality 80 twice is worse than once. The [`cache`]
//! ledger records the hash of every file this tool left behind; a file whose
//! bytes and task settings still match is skipped. Regenerating the site
//! replaces the files, the hashes stop matching, and they are processed again.
//!
//! ## Plan, Then Encode
//!
//! The [`imaging::RescalePlanner`] turns a source and its metadata into a
//! [`imaging::ScaleInstruction`] and an output name without touching pixels.
//! The [`imaging::ImageBackend`] trait does the pixel work. Tests drive the
//! planner and the runner against a mock backend that records operations.
//!
//! ## Scale at Full Quality, Compress Once
//!
//! The scaling step encodes at quality 100 and the compress step applies the
//! single lossy pass (`compress.jpeg_quality`), so quality is lost once.
//!
//! ## Pure Rust
//!
//! Imaging uses the `image` crate (Lanczos3), `oxipng` and `img-parts` for
//! EXIF; SVG goes through `usvg`; text assets go through `minify-js`,
//! `lightningcss` and `minify-html`. No ImageMagick, no Node, no external
//! binaries.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod minify;
pub mod naming;
pub mod output;
pub mod scan;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_helpers;
