//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Metadata (dimensions, format) | `image::ImageReader::into_decoder` (header only), axes swapped per EXIF orientation |
//! | Decode (JPEG, PNG, WebP, GIF) | `image` crate decoders, ICC profile via `ImageDecoder::icc_profile` |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | EXIF carry-over | `img_parts` (`ImageEXIF::exif` / `set_exif`) on JPEG, PNG and WebP |
//! | Resize | `image::DynamicImage::resize_exact` / `resize_to_fill` with `Lanczos3` |
//! | Encode → JPEG / PNG / WebP | `image` encoders (WebP is lossless) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Recompress JPEG | decode + `JpegEncoder` at the configured quality |
//! | Recompress PNG | `oxipng::optimize_from_memory` with a level preset |
//!
//! ## Orientation and metadata
//!
//! Pixels are always rotated upright on decode, and metadata reports the
//! upright dimensions, so bounds apply to the image as displayed. With
//! `metadata = true` the source's ICC profile and EXIF block are written to
//! the output, the EXIF Orientation tag reset to 1 (upright). AVIF output
//! keeps neither.

use super::backend::{BackendError, ImageBackend, SourceFormat, SourceMetadata};
use super::calculations::fit_inside;
use super::params::{CompressParams, FitMode, Quality, TargetFormat};
use super::planner::PlannedImage;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader};
use img_parts::{Bytes, DynImage, ImageEXIF};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn source_format(format: Option<ImageFormat>) -> SourceFormat {
    match format {
        Some(ImageFormat::Jpeg) => SourceFormat::Jpeg,
        Some(ImageFormat::Png) => SourceFormat::Png,
        Some(ImageFormat::WebP) => SourceFormat::WebP,
        Some(ImageFormat::Gif) => SourceFormat::Gif,
        Some(ImageFormat::Avif) => SourceFormat::Avif,
        Some(other) => SourceFormat::Other(format!("{other:?}").to_lowercase()),
        None => SourceFormat::Other("unknown".to_string()),
    }
}

/// Whether an orientation turns the image on its side.
fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

fn read_orientation(decoder: &mut impl ImageDecoder) -> Result<Orientation, BackendError> {
    decoder
        .orientation()
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to read orientation: {e}")))
}

/// Decoded, upright pixels and the ICC profile that came with them.
struct Decoded {
    image: DynamicImage,
    icc: Option<Vec<u8>>,
}

fn decode(bytes: &[u8]) -> Result<Decoded, BackendError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode: {e}")))?;
    let icc = decoder
        .icc_profile()
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to read ICC profile: {e}")))?;
    let orientation = read_orientation(&mut decoder)?;
    let mut image = DynamicImage::from_decoder(decoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode: {e}")))?;
    image.apply_orientation(orientation);
    Ok(Decoded { image, icc })
}

/// The raw EXIF (TIFF) block of a JPEG, PNG or WebP, with its Orientation
/// reset to upright to match pixels that went through [`decode`].
fn upright_exif(bytes: &[u8]) -> Option<Vec<u8>> {
    let image = DynImage::from_bytes(Bytes::copy_from_slice(bytes)).ok()??;
    let mut exif = image.exif()?.to_vec();
    reset_orientation(&mut exif);
    Some(exif)
}

/// Set the Orientation tag (0x0112) of IFD0 to 1 in place. Blocks that do not
/// parse as TIFF are left as they are.
fn reset_orientation(exif: &mut [u8]) {
    let little_endian = match exif.get(..2) {
        Some(b"II") => true,
        Some(b"MM") => false,
        _ => return,
    };
    let u16_at = |data: &[u8], pos: usize| -> Option<u16> {
        let b = data.get(pos..pos + 2)?;
        Some(if little_endian {
            u16::from_le_bytes([b[0], b[1]])
        } else {
            u16::from_be_bytes([b[0], b[1]])
        })
    };
    let Some(ifd) = exif.get(4..8).map(|b| {
        let b = [b[0], b[1], b[2], b[3]];
        if little_endian {
            u32::from_le_bytes(b)
        } else {
            u32::from_be_bytes(b)
        }
    }) else {
        return;
    };
    let ifd = ifd as usize;
    let Some(count) = u16_at(exif, ifd) else {
        return;
    };
    for i in 0..count as usize {
        let entry = ifd + 2 + i * 12;
        if u16_at(exif, entry) == Some(0x0112) {
            let upright = if little_endian {
                1u16.to_le_bytes()
            } else {
                1u16.to_be_bytes()
            };
            if let Some(value) = exif.get_mut(entry + 8..entry + 10) {
                value.copy_from_slice(&upright);
            }
            return;
        }
    }
}

/// Embed an EXIF block into encoded bytes. Containers `img_parts` cannot
/// write (AVIF) are returned without it.
fn attach_exif(encoded: Vec<u8>, exif: Option<&[u8]>) -> Result<Vec<u8>, BackendError> {
    let Some(exif) = exif else {
        return Ok(encoded);
    };
    let encoded = Bytes::from(encoded);
    let image = DynImage::from_bytes(encoded.clone()).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to parse encoded image for EXIF: {e}"))
    })?;
    let Some(mut image) = image else {
        tracing::debug!("output container does not carry EXIF; dropping it");
        return Ok(encoded.to_vec());
    };
    image.set_exif(Some(Bytes::copy_from_slice(exif)));
    let mut out = Vec::new();
    image.encoder().write_to(&mut out)?;
    Ok(out)
}

/// Attach an ICC profile when the encoder supports one. Formats without
/// profile support silently drop it.
fn attach_icc(encoder: &mut impl ImageEncoder, icc: Option<Vec<u8>>) {
    if let Some(profile) = icc
        && encoder.set_icc_profile(profile).is_err()
    {
        tracing::debug!("encoder does not embed ICC profiles; dropping it");
    }
}

/// Encode `img` as `format`.
fn encode(
    img: &DynamicImage,
    format: TargetFormat,
    quality: Quality,
    icc: Option<Vec<u8>>,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let result = match format {
        TargetFormat::Jpeg => {
            // JPEG has no alpha channel
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.as_u8());
            attach_icc(&mut encoder, icc);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        TargetFormat::Png => {
            let mut encoder = PngEncoder::new(&mut buf);
            attach_icc(&mut encoder, icc);
            img.write_with_encoder(encoder)
        }
        TargetFormat::WebP => {
            let mut encoder = WebPEncoder::new_lossless(&mut buf);
            attach_icc(&mut encoder, icc);
            DynamicImage::ImageRgba8(img.to_rgba8()).write_with_encoder(encoder)
        }
        TargetFormat::Avif => {
            let encoder = AvifEncoder::new_with_speed_quality(&mut buf, 6, quality.as_u8());
            img.write_with_encoder(encoder)
        }
    };
    result.map_err(|e| BackendError::ProcessingFailed(format!("{format} encode failed: {e}")))?;
    Ok(buf)
}

/// Apply the instruction's fit to decoded pixels.
fn resize(img: DynamicImage, max_width: u32, max_height: u32, fit: FitMode) -> DynamicImage {
    match fit {
        FitMode::Inside => {
            let current = (img.width(), img.height());
            let (w, h) = fit_inside(current, (max_width, max_height));
            if (w, h) == current {
                img
            } else {
                img.resize_exact(w, h, FilterType::Lanczos3)
            }
        }
        FitMode::Cover => img.resize_to_fill(max_width, max_height, FilterType::Lanczos3),
        FitMode::Fill => img.resize_exact(max_width, max_height, FilterType::Lanczos3),
    }
}

impl ImageBackend for RustBackend {
    fn read_metadata(&self, bytes: &[u8]) -> Result<SourceMetadata, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = source_format(reader.format());
        let mut decoder = reader.into_decoder().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {e}"))
        })?;
        let (mut width, mut height) = decoder.dimensions();
        if swaps_axes(read_orientation(&mut decoder)?) {
            std::mem::swap(&mut width, &mut height);
        }
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Image has empty dimensions {width}x{height}"
            )));
        }
        Ok(SourceMetadata {
            width,
            height,
            format,
        })
    }

    fn scale(&self, planned: &PlannedImage) -> Result<Vec<u8>, BackendError> {
        let Decoded { image, icc } = decode(&planned.source.bytes)?;
        let scale = &planned.scale;
        let resized = resize(image, scale.max_width, scale.max_height, scale.fit);
        let (icc, exif) = if scale.metadata {
            (icc, upright_exif(&planned.source.bytes))
        } else {
            (None, None)
        };
        let encoded = encode(
            &resized,
            planned.output_format,
            scale.format_options.quality,
            icc,
        )?;
        attach_exif(encoded, exif.as_deref())
    }

    fn compress(
        &self,
        bytes: &[u8],
        format: TargetFormat,
        params: &CompressParams,
    ) -> Result<Vec<u8>, BackendError> {
        match format {
            TargetFormat::Jpeg => {
                let Decoded { image, icc } = decode(bytes)?;
                let encoded = encode(&image, TargetFormat::Jpeg, params.jpeg_quality, icc)?;
                attach_exif(encoded, upright_exif(bytes).as_deref())
            }
            TargetFormat::Png => {
                let options = oxipng::Options::from_preset(params.png_level);
                oxipng::optimize_from_memory(bytes, &options).map_err(|e| {
                    BackendError::ProcessingFailed(format!("PNG optimization failed: {e}"))
                })
            }
            // Lossless WebP and AVIF are already final at this point
            TargetFormat::WebP | TargetFormat::Avif => Ok(bytes.to_vec()),
        }
    }
}
