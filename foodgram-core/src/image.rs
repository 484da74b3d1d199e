//! Decoding of image payloads sent by clients.
//!
//! Recipe images and avatars arrive either as `data:image/<fmt>;base64,<payload>`
//! strings inside JSON bodies or as raw file parts of a multipart form. A bare
//! base64 string is accepted too, in which case the format is taken from the
//! decoded bytes.

use std::io::Cursor;

use base64::Engine;
use image::{ImageFormat, ImageReader};

use crate::error::ImageError;

/// Formats accepted for recipe images and avatars.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum decoded image size (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Image bytes that passed format and decode checks.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

impl DecodedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// File extension used when the image is written to media storage.
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

/// An image field as it arrived on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Data-URI or bare base64 text
    Inline(String),
    /// Raw bytes of an uploaded file
    Upload(Vec<u8>),
}

impl ImagePayload {
    pub fn decode(self) -> Result<DecodedImage, ImageError> {
        match self {
            ImagePayload::Inline(text) => decode_image_payload(&text),
            ImagePayload::Upload(data) => {
                if data.is_empty() {
                    return Err(ImageError::Empty);
                }
                let format = validate_image(&data)?;
                Ok(DecodedImage { data, format })
            }
        }
    }
}

/// Decode a data-URI (or bare base64) image payload and check that it is an
/// allowed, decodable image.
pub fn decode_image_payload(payload: &str) -> Result<DecodedImage, ImageError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(ImageError::Empty);
    }

    let encoded = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (media_type, data) = rest
                .split_once(";base64,")
                .ok_or(ImageError::NotAnImage)?;
            if !media_type.starts_with("image/") {
                return Err(ImageError::NotAnImage);
            }
            data
        }
        None => payload,
    };

    // Clients commonly wrap long base64 payloads
    let encoded: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let data = base64::engine::general_purpose::STANDARD.decode(encoded)?;
    if data.is_empty() {
        return Err(ImageError::Empty);
    }

    let format = validate_image(&data)?;
    Ok(DecodedImage { data, format })
}

/// Check that `data` is a complete image in one of [`ALLOWED_FORMATS`].
pub fn validate_image(data: &[u8]) -> Result<ImageFormat, ImageError> {
    if data.len() > MAX_FILE_SIZE {
        return Err(ImageError::TooLarge {
            size: data.len(),
            max: MAX_FILE_SIZE,
        });
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let format = reader.format().ok_or(ImageError::UnknownFormat)?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::UnsupportedFormat(format!("{:?}", format)));
    }

    // A truncated file sniffs fine but fails here
    reader
        .decode()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes() -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(2, 2, Rgb([200, 10, 10]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn encode(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(data)
    }

    #[test]
    fn test_decode_data_uri() {
        let payload = format!("data:image/png;base64,{}", encode(&png_bytes()));
        let image = decode_image_payload(&payload).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.content_type(), "image/png");
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn test_decode_bare_base64() {
        let image = decode_image_payload(&encode(&png_bytes())).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
    }

    #[test]
    fn test_decode_wrapped_base64() {
        let encoded = encode(&png_bytes());
        let wrapped: Vec<String> = encoded
            .as_bytes()
            .chunks(40)
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect();
        let payload = format!("data:image/png;base64,{}", wrapped.join("\r\n"));
        let image = decode_image_payload(&payload).unwrap();
        assert_eq!(image.data, png_bytes());
    }

    #[test]
    fn test_uploaded_bytes() {
        let image = ImagePayload::Upload(png_bytes()).decode().unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert!(matches!(
            ImagePayload::Upload(Vec::new()).decode(),
            Err(ImageError::Empty)
        ));
        assert!(ImagePayload::Upload(b"GIF89a".to_vec()).decode().is_err());
    }

    #[test]
    fn test_declared_type_must_be_image() {
        let payload = format!("data:text/plain;base64,{}", encode(&png_bytes()));
        assert!(matches!(
            decode_image_payload(&payload),
            Err(ImageError::NotAnImage)
        ));
    }

    #[test]
    fn test_missing_base64_marker() {
        assert!(matches!(
            decode_image_payload("data:image/png,abcd"),
            Err(ImageError::NotAnImage)
        ));
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            decode_image_payload("data:image/png;base64,@@@"),
            Err(ImageError::Base64(_))
        ));
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(decode_image_payload("  "), Err(ImageError::Empty)));
        assert!(matches!(
            decode_image_payload("data:image/png;base64,"),
            Err(ImageError::Empty)
        ));
    }

    #[test]
    fn test_not_an_image() {
        let payload = format!("data:image/png;base64,{}", encode(b"not an image"));
        assert!(decode_image_payload(&payload).is_err());
    }

    #[test]
    fn test_truncated_png_is_rejected() {
        let mut data = png_bytes();
        data.truncate(20);
        assert!(validate_image(&data).is_err());
    }
}
