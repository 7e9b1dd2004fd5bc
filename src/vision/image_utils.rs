//! Decoding of uploaded image bytes.

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Upload size cap (10MB). Anything larger is rejected before decoding.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image data is empty")]
    EmptyData,

    #[error("image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("failed to decode image: {0}")]
    DecodeFailed(String),
}

/// Metadata captured while decoding an upload.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub size_bytes: usize,
}

/// Decodes raw uploaded bytes into an image.
///
/// The format is detected from magic bytes rather than trusting any
/// client-supplied content type. Channel normalization to RGB happens later,
/// during model preprocessing.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ImageError::TooLarge(bytes.len(), MAX_UPLOAD_BYTES));
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detects the image format from magic bytes.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),
        _ => Err(ImageError::UnsupportedFormat),
    }
}
