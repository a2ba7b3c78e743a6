//! Logo asset loading.
//!
//! A logo that cannot be read or decoded is an [`AssetError`]; callers log it and
//! render without a logo rather than failing the run.

use std::path::Path;
use std::sync::Arc;

use image::{Rgb, RgbImage, Rgba};
use thiserror::Error;

use crate::layout::LogoSize;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read logo '{source_name}': {error}")]
    Read {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    #[error("failed to decode logo '{source_name}': {message}")]
    Decode { source_name: String, message: String },

    #[error("logo '{0}' has no pixels")]
    Empty(String),
}

/// Decoded logo, flattened onto white as 8-bit RGB so PDF needs no soft mask.
#[derive(Debug, Clone)]
pub struct LogoAsset {
    pub source_name: String,
    pub width_px: u32,
    pub height_px: u32,
    rgb: Arc<Vec<u8>>,
}

impl LogoAsset {
    /// Decodes PNG or JPEG bytes.
    pub fn from_bytes(source_name: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;

        let rgba = decoded.to_rgba8();
        let (width_px, height_px) = rgba.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(AssetError::Empty(source_name.to_string()));
        }

        // Composite against white background
        let mut rgb = RgbImage::new(width_px, height_px);
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let Rgba([r, g, b, a]) = *pixel;
            let alpha = a as f32 / 255.0;
            let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
            rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
        }

        Ok(Self {
            source_name: source_name.to_string(),
            width_px,
            height_px,
            rgb: Arc::new(rgb.into_raw()),
        })
    }

    pub fn size(&self) -> LogoSize {
        LogoSize {
            width_px: self.width_px,
            height_px: self.height_px,
        }
    }

    /// Row-major RGB8 pixels, `width_px × height_px × 3` bytes.
    pub fn rgb_pixels(&self) -> &[u8] {
        &self.rgb
    }
}

/// Reads and decodes a logo from disk.
pub fn load_logo(path: &Path) -> Result<LogoAsset, AssetError> {
    let source_name = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|error| AssetError::Read {
        source_name: source_name.clone(),
        error,
    })?;
    LogoAsset::from_bytes(&source_name, &bytes)
}
