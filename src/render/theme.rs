//! Card themes: palette plus panel geometry.

use image::Rgba;
use serde::Deserialize;
use std::fmt;
use tracing::warn;

use crate::core::config::data::CustomTheme;

pub const DEFAULT_THEME_ID: &str = "optimizer-purple";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeError {
    UnknownTheme(String),
    InvalidColor { field: &'static str, value: String },
    InvalidGeometry(String),
}

impl fmt::Display for ThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeError::UnknownTheme(id) => write!(f, "unknown theme '{}'", id),
            ThemeError::InvalidColor { field, value } => {
                write!(f, "invalid colour '{}' for {}", value, field)
            }
            ThemeError::InvalidGeometry(reason) => write!(f, "invalid card geometry: {}", reason),
        }
    }
}

impl std::error::Error for ThemeError {}

/// Pixel geometry of the card. Every region is derived from these numbers
/// alone; nothing about a build changes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardGeometry {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Outer margin around all three columns.
    pub padding: u32,
    pub column_gap: u32,
    pub portrait_width: u32,
    pub stats_width: u32,
    /// Gap between relic tiles.
    pub relic_gap: u32,
    pub uid_strip_height: u32,
}

impl Default for CardGeometry {
    fn default() -> Self {
        Self {
            canvas_width: 1280,
            canvas_height: 720,
            padding: 10,
            column_gap: 10,
            portrait_width: 500,
            stats_width: 310,
            relic_gap: 10,
            uid_strip_height: 36,
        }
    }
}

/// Smallest regions the fixed content offsets fit into.
pub const MIN_TILE_WIDTH: u32 = 180;
pub const MIN_TILE_HEIGHT: u32 = 220;
pub const MIN_STATS_WIDTH: u32 = 240;
pub const MIN_CONTENT_HEIGHT: u32 = 600;
pub const MAX_CANVAS_SIDE: u32 = 4096;

impl CardGeometry {
    pub fn validate(&self) -> Result<(), ThemeError> {
        let invalid = |reason: String| Err(ThemeError::InvalidGeometry(reason));
        let overflow = || ThemeError::InvalidGeometry("column widths overflow".to_string());
        if self.canvas_width > MAX_CANVAS_SIDE || self.canvas_height > MAX_CANVAS_SIDE {
            return invalid(format!(
                "canvas {}x{} exceeds {}x{}",
                self.canvas_width, self.canvas_height, MAX_CANVAS_SIDE, MAX_CANVAS_SIDE
            ));
        }
        let margins = self.padding.checked_mul(2).ok_or_else(overflow)?;
        let content_height = self.canvas_height.saturating_sub(margins);
        if content_height < MIN_CONTENT_HEIGHT {
            return invalid(format!(
                "content height {} is below {}",
                content_height, MIN_CONTENT_HEIGHT
            ));
        }
        if self.portrait_width == 0 {
            return invalid("portrait column has no width".to_string());
        }
        if self.stats_width < MIN_STATS_WIDTH {
            return invalid(format!(
                "stats column width {} is below {}",
                self.stats_width, MIN_STATS_WIDTH
            ));
        }
        if self.uid_strip_height >= content_height {
            return invalid("UID strip is taller than the portrait".to_string());
        }
        let used = [
            self.portrait_width,
            self.stats_width,
            self.column_gap,
            self.column_gap,
        ]
        .into_iter()
        .try_fold(margins, u32::checked_add)
        .ok_or_else(overflow)?;
        let relic_width = self.canvas_width.saturating_sub(used);
        let tile_width = relic_width.saturating_sub(self.relic_gap) / 2;
        let tile_height = content_height.saturating_sub(self.relic_gap.saturating_mul(2)) / 3;
        if tile_width < MIN_TILE_WIDTH || tile_height < MIN_TILE_HEIGHT {
            return invalid(format!(
                "relic tiles would be {}x{}, need at least {}x{}",
                tile_width, tile_height, MIN_TILE_WIDTH, MIN_TILE_HEIGHT
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background_top: Rgba<u8>,
    pub background_bottom: Rgba<u8>,
    pub panel: Rgba<u8>,
    pub panel_border: Rgba<u8>,
    pub text_primary: Rgba<u8>,
    pub text_secondary: Rgba<u8>,
    pub accent: Rgba<u8>,
    /// Fill of an empty relic slot.
    pub placeholder: Rgba<u8>,
}

impl Palette {
    fn fallback() -> Self {
        Self {
            background_top: Rgba([38, 22, 60, 255]),
            background_bottom: Rgba([24, 11, 41, 255]),
            panel: Rgba([48, 33, 72, 220]),
            panel_border: Rgba([128, 94, 176, 255]),
            text_primary: Rgba([235, 228, 255, 255]),
            text_secondary: Rgba([175, 160, 210, 255]),
            accent: Rgba([255, 204, 102, 255]),
            placeholder: Rgba([36, 24, 52, 255]),
        }
    }
}

/// Read-only rendering configuration supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTheme {
    pub id: String,
    pub display_name: String,
    pub geometry: CardGeometry,
    pub palette: Palette,
}

impl Default for CardTheme {
    fn default() -> Self {
        CardTheme::builtin(DEFAULT_THEME_ID).unwrap_or_else(|_| CardTheme {
            id: DEFAULT_THEME_ID.to_string(),
            display_name: "Optimizer Purple".to_string(),
            geometry: CardGeometry::default(),
            palette: Palette::fallback(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeometrySpec {
    pub canvas_width: Option<u32>,
    pub canvas_height: Option<u32>,
    pub padding: Option<u32>,
    pub column_gap: Option<u32>,
    pub portrait_width: Option<u32>,
    pub stats_width: Option<u32>,
    pub relic_gap: Option<u32>,
    pub uid_strip_height: Option<u32>,
}

/// Theme as written in TOML. Absent colours come from the base theme.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeSpec {
    pub id: String,
    pub display_name: String,
    pub base: Option<String>,
    pub background_top: Option<String>,
    pub background_bottom: Option<String>,
    pub panel: Option<String>,
    pub panel_border: Option<String>,
    pub text_primary: Option<String>,
    pub text_secondary: Option<String>,
    pub accent: Option<String>,
    pub placeholder: Option<String>,
    #[serde(default)]
    pub geometry: Option<GeometrySpec>,
}

#[derive(Debug, Deserialize)]
struct BuiltinThemesConfig {
    themes: Vec<ThemeSpec>,
}

pub fn load_builtin_themes() -> Vec<ThemeSpec> {
    const CONFIG_CONTENT: &str = include_str!("../builtin_themes.toml");
    match toml::from_str::<BuiltinThemesConfig>(CONFIG_CONTENT) {
        Ok(config) => config.themes,
        Err(err) => {
            warn!(error = %err, "Failed to parse builtin_themes.toml");
            Vec::new()
        }
    }
}

pub fn find_builtin_theme(id: &str) -> Option<ThemeSpec> {
    load_builtin_themes()
        .into_iter()
        .find(|t| t.id.eq_ignore_ascii_case(id))
}

/// Convert a `CustomTheme` from config into a `ThemeSpec`.
pub fn theme_spec_from_custom(ct: &CustomTheme) -> ThemeSpec {
    ThemeSpec {
        id: ct.id.clone(),
        display_name: ct.display_name.clone(),
        base: ct.base.clone(),
        background_top: ct.background_top.clone(),
        background_bottom: ct.background_bottom.clone(),
        panel: ct.panel.clone(),
        panel_border: ct.panel_border.clone(),
        text_primary: ct.text_primary.clone(),
        text_secondary: ct.text_secondary.clone(),
        accent: ct.accent.clone(),
        placeholder: ct.placeholder.clone(),
        geometry: None,
    }
}

impl CardTheme {
    pub fn builtin(id: &str) -> Result<Self, ThemeError> {
        let spec = find_builtin_theme(id).ok_or_else(|| ThemeError::UnknownTheme(id.to_string()))?;
        Self::from_spec(&spec, Palette::fallback(), CardGeometry::default())
    }

    /// Apply `spec` on top of a base palette and geometry.
    pub fn from_spec(
        spec: &ThemeSpec,
        base_palette: Palette,
        base_geometry: CardGeometry,
    ) -> Result<Self, ThemeError> {
        let mut palette = base_palette;
        for (field, value, slot) in [
            ("background_top", &spec.background_top, &mut palette.background_top),
            ("background_bottom", &spec.background_bottom, &mut palette.background_bottom),
            ("panel", &spec.panel, &mut palette.panel),
            ("panel_border", &spec.panel_border, &mut palette.panel_border),
            ("text_primary", &spec.text_primary, &mut palette.text_primary),
            ("text_secondary", &spec.text_secondary, &mut palette.text_secondary),
            ("accent", &spec.accent, &mut palette.accent),
            ("placeholder", &spec.placeholder, &mut palette.placeholder),
        ] {
            if let Some(value) = value {
                *slot = parse_hex_color(value).ok_or_else(|| ThemeError::InvalidColor {
                    field,
                    value: value.clone(),
                })?;
            }
        }

        let mut geometry = base_geometry;
        if let Some(g) = &spec.geometry {
            let pick = |v: Option<u32>, current: u32| v.unwrap_or(current);
            geometry = CardGeometry {
                canvas_width: pick(g.canvas_width, geometry.canvas_width),
                canvas_height: pick(g.canvas_height, geometry.canvas_height),
                padding: pick(g.padding, geometry.padding),
                column_gap: pick(g.column_gap, geometry.column_gap),
                portrait_width: pick(g.portrait_width, geometry.portrait_width),
                stats_width: pick(g.stats_width, geometry.stats_width),
                relic_gap: pick(g.relic_gap, geometry.relic_gap),
                uid_strip_height: pick(g.uid_strip_height, geometry.uid_strip_height),
            };
        }
        geometry.validate()?;

        Ok(CardTheme {
            id: spec.id.clone(),
            display_name: spec.display_name.clone(),
            geometry,
            palette,
        })
    }
}

/// Resolve a theme id against config-defined themes first, then built-ins.
/// A custom theme inherits from its `base` (default: the default theme).
pub fn resolve_theme(id: &str, custom: &[CustomTheme]) -> Result<CardTheme, ThemeError> {
    if let Some(ct) = custom.iter().find(|ct| ct.id.eq_ignore_ascii_case(id)) {
        let spec = theme_spec_from_custom(ct);
        let base_id = spec.base.as_deref().unwrap_or(DEFAULT_THEME_ID);
        let base = CardTheme::builtin(base_id)?;
        return CardTheme::from_spec(&spec, base.palette, base.geometry);
    }
    CardTheme::builtin(id)
}

/// Like [`resolve_theme`], but any failure falls back to the default theme.
pub fn resolve_theme_or_default(id: &str, custom: &[CustomTheme]) -> CardTheme {
    match resolve_theme(id, custom) {
        Ok(theme) => theme,
        Err(err) => {
            warn!(theme = id, error = %err, "Falling back to default card theme");
            CardTheme::default()
        }
    }
}

/// `#RRGGBB` or `#RRGGBBAA`, leading `#` optional.
pub fn parse_hex_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}
