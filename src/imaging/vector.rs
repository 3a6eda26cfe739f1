//! GIF and SVG optimization for the `vectors` task.
//!
//! Both optimizers return `Ok(None)` when they decide to leave a file alone;
//! the caller additionally keeps the original whenever the optimized bytes are
//! not smaller.

use super::backend::BackendError;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::AnimationDecoder;
use std::io::Cursor;

/// Map an optimization level (1–3) to a GIF encoder speed (30 = fastest, 1 = best).
pub fn gif_encoder_speed(level: u8) -> i32 {
    match level {
        0 | 1 => 30,
        2 => 10,
        _ => 1,
    }
}

/// Read the loop count from a GIF's NETSCAPE2.0 / ANIMEXTS1.0 application block.
///
/// Returns `None` for GIFs without the block (play once). A stored count of
/// zero means loop forever.
fn loop_count(bytes: &[u8]) -> Option<Repeat> {
    const IDS: [&[u8]; 2] = [b"NETSCAPE2.0", b"ANIMEXTS1.0"];
    for id in IDS {
        if let Some(pos) = bytes.windows(id.len()).position(|w| w == id) {
            // sub-block: size (3), id (1), count (u16 LE)
            let sub = bytes.get(pos + id.len()..pos + id.len() + 4)?;
            if sub[0] != 3 || sub[1] != 1 {
                return None;
            }
            let count = u16::from_le_bytes([sub[2], sub[3]]);
            return Some(if count == 0 {
                Repeat::Infinite
            } else {
                Repeat::Finite(count)
            });
        }
    }
    None
}

/// Re-encode every frame of a GIF.
///
/// Frames whose colors fit a 256-entry palette are written with that exact
/// palette, so typical GIFs come out pixel-identical.
pub fn optimize_gif(bytes: &[u8], level: u8) -> Result<Option<Vec<u8>>, BackendError> {
    let decoder = GifDecoder::new(Cursor::new(bytes))
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode GIF: {e}")))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode GIF frames: {e}")))?;

    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut buf, gif_encoder_speed(level));
        if let Some(repeat) = loop_count(bytes) {
            encoder
                .set_repeat(repeat)
                .map_err(|e| BackendError::ProcessingFailed(format!("GIF encode failed: {e}")))?;
        }
        encoder
            .encode_frames(frames)
            .map_err(|e| BackendError::ProcessingFailed(format!("GIF encode failed: {e}")))?;
    }
    Ok(Some(buf))
}

/// Rewrite an SVG as a normalized usvg tree.
///
/// Documents with `<text>` elements are left alone: usvg drops text it has no
/// font for.
pub fn optimize_svg(bytes: &[u8]) -> Result<Option<Vec<u8>>, BackendError> {
    if bytes.windows(5).any(|w| w == b"<text") {
        tracing::debug!("SVG contains text; leaving it untouched");
        return Ok(None);
    }

    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to parse SVG: {e}")))?;
    let options = usvg::WriteOptions {
        coordinates_precision: 3,
        transforms_precision: 3,
        indent: usvg::Indent::None,
        attributes_indent: usvg::Indent::None,
        ..usvg::WriteOptions::default()
    };
    Ok(Some(tree.to_string(&options).into_bytes()))
}
