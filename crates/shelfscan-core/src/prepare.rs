//! Image preparation for upload.
//!
//! Validates a user-selected image and re-encodes it as a bounded JPEG.
//! This is a pure transform: no network, no shared state, and validation
//! failures leave nothing behind.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::error::{ScanError, ScanResult};

/// Largest accepted input file.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Output bounding box. Images already inside it are never upscaled.
pub const MAX_WIDTH: u32 = 1920;
pub const MAX_HEIGHT: u32 = 1080;

/// JPEG quality for the interactive upload path.
pub const INTERACTIVE_QUALITY: u8 = 85;
/// JPEG quality when the caller does not care.
pub const DEFAULT_QUALITY: u8 = 80;

const ALLOWED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// An upload-ready image payload.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// JPEG-encoded bytes, bounded to [`MAX_WIDTH`]×[`MAX_HEIGHT`]
    pub bytes: Bytes,
    /// Always `image/jpeg` after re-encoding
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    /// Byte size of the caller's original file
    pub original_size: usize,
    /// Byte size of the re-encoded payload
    pub encoded_size: usize,
    /// Original name with its extension swapped for `.jpg`
    pub file_name: String,
}

/// Validate and re-encode an image at the given JPEG quality.
///
/// Fails with `unsupported_type` when the bytes are not one of
/// JPEG/PNG/GIF/WEBP (or cannot be decoded), and with `too_large` when the
/// input exceeds [`MAX_UPLOAD_BYTES`]. Downscales to fit the bounding box
/// with Lanczos resampling, preserving aspect ratio; smaller images keep
/// their dimensions.
pub fn prepare(bytes: &[u8], file_name: &str, quality: u8) -> ScanResult<PreparedImage> {
    let format = image::guess_format(bytes).map_err(|_| ScanError::unsupported_type())?;
    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ScanError::unsupported_type());
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ScanError::too_large());
    }

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ScanError::unsupported_type_with(format!("Could not decode image: {e}")))?;

    let bounded = if decoded.width() > MAX_WIDTH || decoded.height() > MAX_HEIGHT {
        decoded.resize(MAX_WIDTH, MAX_HEIGHT, FilterType::Lanczos3)
    } else {
        decoded
    };

    // JPEG carries no alpha channel
    let flattened = DynamicImage::ImageRgb8(bounded.to_rgb8());

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    flattened
        .write_with_encoder(encoder)
        .map_err(|e| ScanError::internal(format!("JPEG encoding failed: {e}")))?;

    let encoded_size = encoded.len();
    Ok(PreparedImage {
        bytes: Bytes::from(encoded),
        mime: "image/jpeg",
        width: flattened.width(),
        height: flattened.height(),
        original_size: bytes.len(),
        encoded_size,
        file_name: jpg_file_name(file_name),
    })
}

/// [`prepare`] at [`DEFAULT_QUALITY`].
pub fn prepare_default(bytes: &[u8], file_name: &str) -> ScanResult<PreparedImage> {
    prepare(bytes, file_name, DEFAULT_QUALITY)
}

fn jpg_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.jpg"),
        _ => format!("{file_name}.jpg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = prepare(b"definitely not an image", "notes.txt", DEFAULT_QUALITY).unwrap_err();
        assert!(matches!(err, ScanError::UnsupportedType { .. }));
    }

    #[test]
    fn rejects_disallowed_format() {
        // BMP magic is enough for format sniffing
        let err = prepare(b"BM000000", "photo.bmp", DEFAULT_QUALITY).unwrap_err();
        assert!(matches!(err, ScanError::UnsupportedType { .. }));
    }

    #[test]
    fn rejects_oversized_file() {
        // Valid PNG magic followed by padding past the limit; the size check
        // fires before any decode is attempted
        let mut bytes = png_bytes(4, 4);
        bytes.resize(MAX_UPLOAD_BYTES + 1, 0);
        let err = prepare(&bytes, "huge.png", DEFAULT_QUALITY).unwrap_err();
        assert!(matches!(err, ScanError::TooLarge { .. }));
    }

    #[test]
    fn downscales_to_bounding_box() {
        let prepared = prepare(&png_bytes(3000, 2000), "shelf.png", INTERACTIVE_QUALITY).unwrap();
        assert_eq!((prepared.width, prepared.height), (1620, 1080));
        assert_eq!(prepared.mime, "image/jpeg");
        assert_eq!(prepared.file_name, "shelf.jpg");
        assert_eq!(
            image::guess_format(&prepared.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn never_upscales() {
        let prepared = prepare(&png_bytes(800, 600), "small.png", DEFAULT_QUALITY).unwrap();
        assert_eq!((prepared.width, prepared.height), (800, 600));
    }

    #[test]
    fn deterministic_dimensions() {
        let bytes = png_bytes(2500, 1400);
        let a = prepare(&bytes, "a.png", DEFAULT_QUALITY).unwrap();
        let b = prepare(&bytes, "a.png", DEFAULT_QUALITY).unwrap();
        assert_eq!((a.width, a.height), (b.width, b.height));
    }

    #[test]
    fn records_sizes() {
        let bytes = png_bytes(640, 480);
        let prepared = prepare(&bytes, "shelf.jpeg", DEFAULT_QUALITY).unwrap();
        assert_eq!(prepared.original_size, bytes.len());
        assert_eq!(prepared.encoded_size, prepared.bytes.len());
        assert_eq!(prepared.file_name, "shelf.jpg");
    }
}
