//! Card rendering.
//!
//! Rendering is split into three steps: [`scene::compose`] places every
//! element, [`raster::rasterize`] paints the scene, and [`encode_png`] turns
//! the bitmap into bytes. Given the same build, theme and asset files the
//! output is byte-identical.

pub mod format;
pub mod layout;
pub mod png_text;
pub mod raster;
pub mod scene;
pub mod text;
pub mod theme;

use std::fmt;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assets::AssetResolver;
use crate::model::CharacterBuild;
use png_text::PngTextError;
use theme::CardTheme;

/// `tEXt` keyword carrying [`CardMetadata`].
pub const METADATA_KEYWORD: &str = "relicard";

#[derive(Debug)]
pub enum RenderError {
    Encode(ImageError),
    Metadata(PngTextError),
    MetadataJson(serde_json::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Encode(err) => write!(f, "failed to encode card PNG: {}", err),
            RenderError::Metadata(err) => write!(f, "card metadata: {}", err),
            RenderError::MetadataJson(err) => write!(f, "card metadata is not valid JSON: {}", err),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Encode(err) => Some(err),
            RenderError::Metadata(err) => Some(err),
            RenderError::MetadataJson(err) => Some(err),
        }
    }
}

impl From<ImageError> for RenderError {
    fn from(err: ImageError) -> Self {
        RenderError::Encode(err)
    }
}

impl From<PngTextError> for RenderError {
    fn from(err: PngTextError) -> Self {
        RenderError::Metadata(err)
    }
}

/// Identifies which build a card PNG shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMetadata {
    pub uid: u64,
    pub character_id: u32,
    pub name: String,
    pub theme: String,
}

impl CardMetadata {
    pub fn for_build(build: &CharacterBuild, theme: &CardTheme) -> Self {
        Self {
            uid: build.uid,
            character_id: build.character_id,
            name: build.name.clone(),
            theme: theme.id.clone(),
        }
    }
}

/// Render the card bitmap. Missing data and missing assets degrade to
/// placeholders; this cannot fail.
pub fn render(build: &CharacterBuild, theme: &CardTheme, resolver: &AssetResolver) -> RgbaImage {
    let scene = scene::compose(build, theme);
    debug!(
        character = %build.name,
        items = scene.items.len(),
        theme = %theme.id,
        "Composed card scene"
    );
    raster::rasterize(&scene, resolver)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Render, encode, and tag the PNG with [`CardMetadata`].
pub fn render_png(
    build: &CharacterBuild,
    theme: &CardTheme,
    resolver: &AssetResolver,
) -> Result<Vec<u8>, RenderError> {
    let png = encode_png(&render(build, theme, resolver))?;
    let metadata = serde_json::to_string(&CardMetadata::for_build(build, theme))
        .map_err(RenderError::MetadataJson)?;
    Ok(png_text::insert_text(&png, METADATA_KEYWORD, &metadata)?)
}

pub fn read_metadata(png: &[u8]) -> Result<CardMetadata, RenderError> {
    let text = png_text::extract_text(png, METADATA_KEYWORD)?;
    serde_json::from_str(&text).map_err(RenderError::MetadataJson)
}
