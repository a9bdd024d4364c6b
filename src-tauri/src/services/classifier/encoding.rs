use crate::error::ClassifyError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;

/// Upload quality. The service expects full-quality JPEG.
const UPLOAD_QUALITY: u8 = 100;

/// Encode the bitmap as a JPEG byte stream. Alpha is dropped.
pub fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, ClassifyError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, UPLOAD_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ClassifyError::Encoding(e.to_string()))?;
    Ok(buffer.into_inner())
}
