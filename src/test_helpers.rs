//! Shared test utilities for the asset-press test suite.
//!
//! Synthetic images are generated in memory with the `image` crate so tests
//! need no binary fixtures; [`public_tree`] lays them out in a temp directory
//! shaped like a built site.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = public_tree(&[
//!     ("index.html", b"<p>  hi  </p>".to_vec()),
//!     ("img/photo.jpg", jpeg_bytes(64, 48)),
//! ]);
//! assert!(tmp.path().join("img/photo.jpg").exists());
//! ```

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    })
}

fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// A gradient JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Jpeg)
}

/// A gradient PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Png)
}

/// An animated GIF that loops forever, each frame a different flat color.
pub fn gif_bytes(width: u32, height: u32, frames: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        let frames = (0..frames).map(|i| {
            let shade = (i * 60 % 256) as u8;
            let img = RgbaImage::from_pixel(width, height, Rgba([shade, 0, 255 - shade, 255]));
            Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(100, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }
    buf
}

/// A little-endian EXIF (TIFF) block holding only an Orientation tag.
pub fn exif_block(orientation: u16) -> Vec<u8> {
    let mut exif = b"II\x2a\0".to_vec();
    exif.extend_from_slice(&8u32.to_le_bytes());
    exif.extend_from_slice(&1u16.to_le_bytes());
    // tag 0x0112, type SHORT, count 1, value
    exif.extend_from_slice(&0x0112u16.to_le_bytes());
    exif.extend_from_slice(&3u16.to_le_bytes());
    exif.extend_from_slice(&1u32.to_le_bytes());
    exif.extend_from_slice(&orientation.to_le_bytes());
    exif.extend_from_slice(&[0, 0]);
    // no next IFD
    exif.extend_from_slice(&0u32.to_le_bytes());
    exif
}

/// Embed an EXIF block into JPEG bytes as an APP1 segment.
pub fn with_exif(jpeg: Vec<u8>, exif: &[u8]) -> Vec<u8> {
    let mut image = Jpeg::from_bytes(Bytes::from(jpeg)).unwrap();
    image.set_exif(Some(Bytes::copy_from_slice(exif)));
    let mut out = Vec::new();
    image.encoder().write_to(&mut out).unwrap();
    out
}

// =========================================================================
// Public tree fixtures
// =========================================================================

/// Write `(relative path, contents)` pairs into a fresh temp directory.
pub fn public_tree(files: &[(&str, Vec<u8>)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (relative, contents) in files {
        write_file(tmp.path(), relative, contents);
    }
    tmp
}

/// Write one file below `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}
