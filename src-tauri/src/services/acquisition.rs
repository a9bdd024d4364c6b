use crate::error::AppError;
use crate::models::ui_types::ImagePreview;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tauri_plugin_dialog::FilePath;

const PREVIEW_QUALITY: u8 = 80;

/// Extensions offered by the gallery picker.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "webp", "bmp", "gif", "tiff"];

/// An image owned by the session together with its display preview.
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    pub bitmap: Arc<DynamicImage>,
    pub preview: ImagePreview,
}

/// Decode an acquired resource (gallery file contents or a camera frame).
pub fn acquire_from_bytes(bytes: &[u8], preview_max_dim: u32) -> Result<AcquiredImage, AppError> {
    let bitmap = decode_image_bytes(bytes)?;
    let preview = make_preview(&bitmap, preview_max_dim)?;
    Ok(AcquiredImage {
        bitmap: Arc::new(bitmap),
        preview,
    })
}

pub fn acquire_from_file(path: &Path, preview_max_dim: u32) -> Result<AcquiredImage, AppError> {
    let bytes = std::fs::read(path).map_err(|e| AppError {
        message: format!("Failed to open image {}: {}", path.display(), e),
    })?;
    acquire_from_bytes(&bytes, preview_max_dim)
}

/// Resolve what the media picker returned and load it.
///
/// Only filesystem paths are readable; other locations (such as
/// `content://` URIs) are reported as errors.
pub fn acquire_picked(file: FilePath, preview_max_dim: u32) -> Result<AcquiredImage, AppError> {
    let path = file.into_path().map_err(|e| AppError {
        message: format!("Unsupported file location: {}", e),
    })?;
    acquire_from_file(&path, preview_max_dim)
}

/// Decode bytes of any supported format and apply EXIF orientation.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DynamicImage, AppError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError { message: e.to_string() })?
        .decode()
        .map_err(|e| AppError {
            message: format!("Failed to decode image: {}", e),
        })?;

    let orientation = read_orientation(bytes);
    Ok(apply_orientation(img, orientation))
}

/// EXIF orientation tag, 1 when absent or unreadable.
fn read_orientation(bytes: &[u8]) -> u32 {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(e) => e,
        Err(_) => return 1,
    };

    match exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        Some(field) => match field.value {
            exif::Value::Short(ref v) => *v.first().unwrap_or(&1) as u32,
            exif::Value::Long(ref v) => *v.first().unwrap_or(&1),
            _ => 1,
        },
        None => 1,
    }
}

fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.fliph().rotate90(),
        6 => img.rotate90(),
        7 => img.fliph().rotate270(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Downscale to fit `max_dim` and return as a JPEG data URI.
pub fn make_preview(img: &DynamicImage, max_dim: u32) -> Result<ImagePreview, AppError> {
    let max_dim = max_dim.max(1);
    let small = if img.width() > max_dim || img.height() > max_dim {
        img.resize(max_dim, max_dim, FilterType::Triangle)
    } else {
        img.clone()
    };

    let rgb = DynamicImage::ImageRgb8(small.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, PREVIEW_QUALITY);
    rgb.write_with_encoder(encoder).map_err(|e| AppError {
        message: format!("Failed to encode preview: {}", e),
    })?;

    let b64 = base64::engine::general_purpose::STANDARD.encode(buffer.into_inner());
    Ok(ImagePreview {
        data_uri: format!("data:image/jpeg;base64,{}", b64),
        width: rgb.width(),
        height: rgb.height(),
    })
}
