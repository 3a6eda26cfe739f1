//! Output file naming for scaled images.
//!
//! A scaled image is named from three ordered components joined with `.`:
//!
//! ```text
//! <base name> [.<suffix tokens joined by '-'>] .<extension>
//!
//! photo.jpg                      no suffixes, no format override
//! photo.1920w-1080h.jpg          suffixes [width, height]
//! icon.webp                      icon.png with format = "webp"
//! ```
//!
//! ## Extension Rules
//!
//! The extension is the instruction's target format when one is set,
//! otherwise the source's own extension with its case preserved
//! (`photo.JPG` stays `photo.JPG`). A source without an extension and without
//! a target format keeps its name unchanged. Dotfiles such as `.hidden` have
//! no extension.
//!
//! ## Suffix Tokens
//!
//! Suffix tokens disambiguate several scaled variants of one source. The
//! configured list is empty by default, so names normally carry no suffix.

use crate::imaging::ScaleInstruction;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A naming fragment derived from a scale instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuffixToken {
    /// `<max_width>w`, e.g. `1920w`
    Width,
    /// `<max_height>h`, e.g. `1080h`
    Height,
}

impl SuffixToken {
    /// Render this token for an instruction. `None` when the bound is unset (zero).
    pub fn render(self, scale: &ScaleInstruction) -> Option<String> {
        match self {
            SuffixToken::Width if scale.max_width > 0 => Some(format!("{}w", scale.max_width)),
            SuffixToken::Height if scale.max_height > 0 => Some(format!("{}h", scale.max_height)),
            _ => None,
        }
    }
}

/// Build the output file name for a scaled image.
///
/// `output` is the path the source would be written to; only its file name is
/// used. The result is a bare file name, not a path.
///
/// - `"photo.JPG"`, no suffixes, no format → `"photo.JPG"`
/// - `"icon.png"`, format `webp` → `"icon.webp"`
/// - `"photo.jpg"`, suffixes `[Width, Height]` at 1920×1080 → `"photo.1920w-1080h.jpg"`
pub fn compute_file_name(output: &Path, scale: &ScaleInstruction, suffixes: &[SuffixToken]) -> String {
    let base = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let original_ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    let mut parts = vec![base];

    let tokens: Vec<String> = suffixes.iter().filter_map(|s| s.render(scale)).collect();
    if !tokens.is_empty() {
        parts.push(tokens.join("-"));
    }

    match (scale.format, original_ext) {
        (Some(format), _) => parts.push(format.extension().to_string()),
        (None, Some(ext)) => parts.push(ext),
        (None, None) => {}
    }

    parts.join(".")
}
