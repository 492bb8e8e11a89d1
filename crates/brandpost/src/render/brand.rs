//! Brand assets decoded once at startup and shared by every composition.

use std::path::Path;

use ab_glyph::FontVec;
use image::{DynamicImage, Rgba};

use crate::config::{parse_hex_color, BrandingConfig};
use crate::error::RenderError;

#[derive(Debug)]
pub struct BrandKit {
    pub logo: DynamicImage,
    pub overlay: DynamicImage,
    pub font: FontVec,
    pub brand_text: String,
    pub background: Rgba<u8>,
    pub highlight: Rgba<u8>,
    pub text_color: Rgba<u8>,
}

impl BrandKit {
    /// Loads and decodes every brand asset. Fails up front so the pipeline
    /// never starts with unusable branding.
    pub fn load(config: &BrandingConfig) -> Result<Self, RenderError> {
        let logo = load_image(&config.logo_path)?;
        let overlay = load_image(&config.overlay_path)?;
        let font = load_font(&config.font_path)?;

        Ok(Self {
            logo,
            overlay,
            font,
            brand_text: config.brand_text.clone(),
            background: rgba(&config.background_color),
            highlight: rgba(&config.highlight_color),
            text_color: rgba(&config.text_color),
        })
    }
}

fn load_image(path: &str) -> Result<DynamicImage, RenderError> {
    let path = Path::new(path);
    let bytes = std::fs::read(path).map_err(|e| RenderError::ReadAsset {
        path: path.to_path_buf(),
        source: e,
    })?;
    image::load_from_memory(&bytes).map_err(|e| RenderError::DecodeAsset {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn load_font(path: &str) -> Result<FontVec, RenderError> {
    let path = Path::new(path);
    let bytes = std::fs::read(path).map_err(|e| RenderError::ReadAsset {
        path: path.to_path_buf(),
        source: e,
    })?;
    FontVec::try_from_vec(bytes).map_err(|e| RenderError::FontLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Config colors are schema-validated hex; fall back to opaque black if a
/// hand-built config slips through.
fn rgba(hex: &str) -> Rgba<u8> {
    let [r, g, b] = parse_hex_color(hex).unwrap_or([0, 0, 0]);
    Rgba([r, g, b, 255])
}
