//! Image validation for recipe pictures and user avatars.
//!
//! Clients submit images inline as base64 data URIs. The payload is decoded,
//! sniffed from its magic bytes and fully decoded once so that only real
//! images in an allowed format reach the database.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, ImageReader};

use crate::error::ImageError;

/// Allowed image formats for recipe images and avatars.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum decoded image size (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// An image that passed validation, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub data: Vec<u8>,
    /// Detected content type (e.g., "image/png").
    pub content_type: String,
}

/// Decode a `data:image/<type>;base64,<payload>` string.
///
/// The declared type is not trusted; the content type is taken from the
/// decoded bytes.
pub fn decode_data_uri(value: &str) -> Result<DecodedImage, ImageError> {
    let rest = value
        .trim()
        .strip_prefix("data:image")
        .ok_or(ImageError::NotDataUri)?;
    let (_, payload) = rest
        .split_once(";base64,")
        .ok_or(ImageError::NotDataUri)?;

    // Reject oversized payloads before allocating the decoded buffer.
    if payload.len() / 4 * 3 > MAX_FILE_SIZE + 3 {
        return Err(ImageError::TooLarge { max: MAX_FILE_SIZE });
    }

    let data = STANDARD
        .decode(payload.trim())
        .map_err(|_| ImageError::InvalidBase64)?;

    if data.len() > MAX_FILE_SIZE {
        return Err(ImageError::TooLarge { max: MAX_FILE_SIZE });
    }

    let content_type = validate_image(&data)?;

    Ok(DecodedImage { data, content_type })
}

/// Validate raw image bytes: check the format is allowed and that the image decodes.
///
/// Returns the content type on success (e.g., "image/jpeg").
pub fn validate_image(data: &[u8]) -> Result<String, ImageError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let format = reader.format().ok_or(ImageError::UnknownFormat)?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::UnsupportedFormat(format!("{:?}", format)));
    }

    let content_type = format.to_mime_type().to_string();

    reader
        .decode()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    Ok(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png_data_uri() {
        let data = png_bytes();
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(&data));

        let decoded = decode_data_uri(&uri).unwrap();
        assert_eq!(decoded.content_type, "image/png");
        assert_eq!(decoded.data, data);
    }

    #[test]
    fn test_declared_type_is_ignored() {
        let uri = format!("data:image/jpeg;base64,{}", STANDARD.encode(png_bytes()));

        let decoded = decode_data_uri(&uri).unwrap();
        assert_eq!(decoded.content_type, "image/png");
    }

    #[test]
    fn test_rejects_plain_url() {
        assert_eq!(
            decode_data_uri("http://example.com/cat.png"),
            Err(ImageError::NotDataUri)
        );
        assert_eq!(
            decode_data_uri("data:image/png,rawbytes"),
            Err(ImageError::NotDataUri)
        );
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert_eq!(
            decode_data_uri("data:image/png;base64,!!!not-base64!!!"),
            Err(ImageError::InvalidBase64)
        );
    }

    #[test]
    fn test_rejects_non_image_bytes() {
        let uri = format!(
            "data:image/png;base64,{}",
            STANDARD.encode(b"definitely not an image")
        );
        assert_eq!(decode_data_uri(&uri), Err(ImageError::UnknownFormat));
    }

    #[test]
    fn test_rejects_truncated_png() {
        let mut data = png_bytes();
        data.truncate(20);
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(&data));

        assert!(matches!(decode_data_uri(&uri), Err(ImageError::Decode(_))));
    }
}
