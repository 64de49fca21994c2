//! Image preparation for inline storage.
//!
//! Community wall photos are stored inside their post document rather than
//! as separate blobs, so every upload is shrunk to fit a small per-document
//! ceiling: decoded, scaled so neither side exceeds [`MAX_DIMENSION`],
//! re-encoded as JPEG and wrapped in a `data:` URL.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use thiserror::Error;
use tracing::debug;

/// Largest width or height of a stored image, in pixels.
pub const MAX_DIMENSION: u32 = 800;

/// JPEG quality on the 1-100 scale.
pub const JPEG_QUALITY: u8 = 60;

/// Ceiling for the encoded data URL. Leaves room under a 1 MiB document for
/// the caption and author fields.
pub const MAX_INLINE_BYTES: usize = 1024 * 1024 - 16 * 1024;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("image is empty")]
    Empty,

    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("encoded image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// A downscaled image ready to be embedded in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub width: u32,
    pub height: u32,
    pub data_url: String,
}

/// Target size for an image of `width` x `height` so that neither side
/// exceeds `bound`. The longer side is clamped to the bound and the other
/// side is scaled by the same factor, rounded, never below 1px. Images that
/// already fit are left as they are.
pub fn scaled_dimensions(width: u32, height: u32, bound: u32) -> (u32, u32) {
    let scale = |side: u32, long: u32| -> u32 {
        let scaled = (f64::from(side) * f64::from(bound) / f64::from(long)).round() as u32;
        scaled.max(1)
    };

    if width > height {
        if width > bound {
            return (bound, scale(height, width));
        }
    } else if height > bound {
        return (scale(width, height), bound);
    }

    (width, height)
}

/// Decode `bytes`, shrink to [`MAX_DIMENSION`] and re-encode at
/// [`JPEG_QUALITY`].
pub fn downscale(bytes: &[u8]) -> Result<InlineImage, MediaError> {
    downscale_with(bytes, MAX_DIMENSION, JPEG_QUALITY, MAX_INLINE_BYTES)
}

pub fn downscale_with(
    bytes: &[u8],
    bound: u32,
    quality: u8,
    max_inline_bytes: usize,
) -> Result<InlineImage, MediaError> {
    if bytes.is_empty() {
        return Err(MediaError::Empty);
    }

    let img = image::load_from_memory(bytes).map_err(MediaError::Decode)?;
    let (width, height) = scaled_dimensions(img.width(), img.height(), bound);

    let img = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    };

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&rgb)
        .map_err(MediaError::Encode)?;

    let data_url = format!("{}{}", DATA_URL_PREFIX, B64.encode(&jpeg));
    if data_url.len() > max_inline_bytes {
        return Err(MediaError::TooLarge {
            size: data_url.len(),
            limit: max_inline_bytes,
        });
    }

    debug!(
        "Downscaled {} byte upload to {}x{} ({} byte data URL)",
        bytes.len(),
        width,
        height,
        data_url.len()
    );

    Ok(InlineImage {
        width,
        height,
        data_url,
    })
}

/// Decode the JPEG payload of a data URL produced by [`downscale`].
pub fn decode_data_url(data_url: &str) -> Option<Vec<u8>> {
    let payload = data_url.strip_prefix(DATA_URL_PREFIX)?;
    B64.decode(payload).ok()
}
