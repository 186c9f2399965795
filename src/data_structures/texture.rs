//! Decoded texture resources.
//!
//! This module provides [`Texture`], a CPU-side decoded image with its pixel
//! dimensions. Atlas texture pages hold shared references to these; the
//! renderer uploads them on demand, which keeps the loading path free of any
//! GPU coupling.

use anyhow::*;
use image::{ImageFormat, load_from_memory_with_format};

/// A decoded texture with pixel data and dimensions.
///
/// Typically created via [`from_bytes`](Self::from_bytes) from raw image file
/// contents. Shared between the engine texture cache and atlas pages through
/// `Arc`, so dropping one reference never frees a texture still in use.
#[derive(Clone, Debug)]
pub struct Texture {
    pub label: String,
    pub rgba: image::RgbaImage,
    /// Normal maps are sampled linearly instead of as sRGB at upload time.
    pub is_normal_map: bool,
}

impl Texture {
    /// Decode a texture from raw byte data (image file contents).
    ///
    /// # Arguments
    ///
    /// * `bytes` represent raw image file data (PNG, JPEG, etc.)
    /// * `label` is used as a debug name and in error messages
    /// * `format` is an optional file format hint (e.g., "png"). If None, auto-detect.
    /// * `is_normal_map` toggles between sRGB (false) and linear (true) color space
    pub fn from_bytes(
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
        is_normal_map: bool,
    ) -> Result<Self> {
        let img = match format {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => {
                let format = ImageFormat::from_extension(fmt)
                    .ok_or_else(|| anyhow!("unknown image format hint '{fmt}' for {label}"))?;
                load_from_memory_with_format(bytes, format)?
            }
        };
        Ok(Self::from_image(&img, label, is_normal_map))
    }

    pub fn from_image(img: &image::DynamicImage, label: &str, is_normal_map: bool) -> Self {
        Self {
            label: label.to_string(),
            rgba: img.to_rgba8(),
            is_normal_map,
        }
    }

    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }
}
