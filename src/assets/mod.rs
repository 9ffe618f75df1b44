//! Local asset store lookups with a deterministic placeholder fallback.
//!
//! Files live at `<icon_root>/<category>/<name>.<ext>`. A key is tried
//! against its alias names first, then against its numeric id. Nothing here
//! touches the network; a missing file is an ordinary outcome.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::model::StatKey;
use crate::normalize::stats::{identify, StatTarget};

pub const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([60, 60, 60, 255]);

const EXTENSIONS: [&str; 4] = ["png", "webp", "jpg", "jpeg"];
const PORTRAIT_DIRS: [&str; 3] = ["character_portrait", "character_preview", "character"];

/// Logical identifier of an image in the asset store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKey {
    /// A stat, by any name the stat alias table understands.
    Property(String),
    Element(String),
    Path(String),
    Relic {
        id: u32,
        set_id: Option<u32>,
        slot: u8,
    },
    LightCone(u32),
    /// `CharacterBuild::portrait_path`, relative to the icon root.
    Portrait(String),
}

impl AssetKey {
    fn category(&self) -> &'static str {
        match self {
            AssetKey::Property(_) => "property",
            AssetKey::Element(_) => "element",
            AssetKey::Path(_) => "path",
            AssetKey::Relic { .. } => "relic",
            AssetKey::LightCone(_) => "light_cone",
            AssetKey::Portrait(_) => "character_portrait",
        }
    }
}

/// How a source image is mapped onto the requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fit {
    Stretch,
    /// Center-crop to the target aspect ratio, then scale. No distortion.
    Cover,
}

type CacheKey = (AssetKey, u32, u32, Fit);

pub struct AssetResolver {
    root: Option<PathBuf>,
    cache: RwLock<HashMap<CacheKey, Arc<RgbaImage>>>,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A resolver with no asset store; every lookup yields a placeholder.
    pub fn placeholders_only() -> Self {
        Self {
            root: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Icon for `key` stretched to `size`.
    pub fn resolve_icon(&self, key: &AssetKey, size: (u32, u32)) -> Arc<RgbaImage> {
        self.resolve(key, size, Fit::Stretch)
    }

    /// Bitmap for `key` at exactly `size`. Results are memoized per
    /// `(key, size, fit)` for the life of the resolver.
    pub fn resolve(&self, key: &AssetKey, size: (u32, u32), fit: Fit) -> Arc<RgbaImage> {
        let (width, height) = (size.0.max(1), size.1.max(1));
        let cache_key = (key.clone(), width, height, fit);
        if let Ok(cache) = self.cache.read() {
            if let Some(hit) = cache.get(&cache_key) {
                return Arc::clone(hit);
            }
        }

        let bitmap = Arc::new(self.load(key, width, height, fit));
        if let Ok(mut cache) = self.cache.write() {
            cache.entry(cache_key).or_insert_with(|| Arc::clone(&bitmap));
        }
        bitmap
    }

    /// Path of the first existing file for `key`, if any.
    pub fn locate(&self, key: &AssetKey) -> Option<PathBuf> {
        let root = self.root.as_deref()?;
        if let AssetKey::Portrait(relative) = key {
            if let Some(path) = explicit_portrait(root, relative) {
                return Some(path);
            }
        }
        let dirs: Vec<&str> = match key {
            AssetKey::Portrait(_) => PORTRAIT_DIRS.to_vec(),
            other => vec![other.category()],
        };
        let names = candidate_names(key);
        dirs.iter().find_map(|dir| {
            names
                .iter()
                .find_map(|name| find_with_extension(&root.join(dir), name))
        })
    }

    fn load(&self, key: &AssetKey, width: u32, height: u32, fit: Fit) -> RgbaImage {
        let Some(path) = self.locate(key) else {
            debug!(key = ?key, "Asset not found; using placeholder");
            return placeholder(width, height);
        };
        let source = match image::open(&path) {
            Ok(decoded) => decoded.to_rgba8(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to decode asset; using placeholder");
                return placeholder(width, height);
            }
        };
        fit_image(&source, width, height, fit)
    }
}

/// Solid gray bitmap of the requested size.
pub fn placeholder(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width.max(1), height.max(1), PLACEHOLDER_COLOR)
}

pub fn fit_image(source: &RgbaImage, width: u32, height: u32, fit: Fit) -> RgbaImage {
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return placeholder(width, height);
    }
    if (src_w, src_h) == (width, height) {
        return source.clone();
    }
    match fit {
        Fit::Stretch => imageops::resize(source, width, height, FilterType::Lanczos3),
        Fit::Cover => {
            let target = f64::from(width) / f64::from(height);
            let aspect = f64::from(src_w) / f64::from(src_h);
            let (crop_w, crop_h) = if aspect > target {
                let w = (f64::from(src_h) * target).round() as u32;
                (w.clamp(1, src_w), src_h)
            } else {
                let h = (f64::from(src_w) / target).round() as u32;
                (src_w, h.clamp(1, src_h))
            };
            let x = (src_w - crop_w) / 2;
            let y = (src_h - crop_h) / 2;
            let cropped = imageops::crop_imm(source, x, y, crop_w, crop_h).to_image();
            imageops::resize(&cropped, width, height, FilterType::Lanczos3)
        }
    }
}

/// File stems to try for `key`, alias names first.
fn candidate_names(key: &AssetKey) -> Vec<String> {
    let mut names = Vec::new();
    match key {
        AssetKey::Property(name) => {
            if let Some(icon) = property_icon(name) {
                names.push(icon.to_string());
            }
            names.push(name.clone());
        }
        AssetKey::Element(name) => {
            if let Some(alias) = element_alias(name) {
                names.push(alias.to_string());
            }
            names.push(name.clone());
        }
        AssetKey::Path(name) => {
            if let Some(alias) = path_alias(name) {
                names.push(alias.to_string());
            }
            names.push(name.clone());
        }
        AssetKey::Relic { id, set_id, slot } => {
            if let Some(set_id) = set_id {
                // cavern pieces are numbered 0-3, planar ornaments 0-1
                let index = if *slot >= 5 { slot - 5 } else { slot.saturating_sub(1) };
                names.push(format!("{}_{}", set_id, index));
            }
            if *id != 0 {
                names.push(id.to_string());
            }
            if let Some(set_id) = set_id {
                names.push(set_id.to_string());
            }
        }
        AssetKey::LightCone(id) => {
            if *id != 0 {
                names.push(id.to_string());
            }
        }
        AssetKey::Portrait(relative) => {
            if let Some(id) = numeric_stem(relative) {
                names.push(id);
            }
        }
    }
    names.retain(|name| is_plain_file_name(name));
    names
}

fn find_with_extension(dir: &Path, stem: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.is_file())
}

/// A payload-supplied path, accepted only when it stays under `root`.
fn explicit_portrait(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative.trim());
    if relative.as_os_str().is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return None;
    }
    let path = root.join(relative);
    path.is_file().then_some(path)
}

fn numeric_stem(relative: &str) -> Option<String> {
    let stem = Path::new(relative).file_stem()?.to_str()?;
    (!stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit())).then(|| stem.to_string())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// Path display names to the ids used for path icons.
pub fn path_alias(name: &str) -> Option<&'static str> {
    let alias = match name.trim().to_ascii_lowercase().as_str() {
        "destruction" => "Warrior",
        "the hunt" | "hunt" => "Rogue",
        "erudition" => "Mage",
        "harmony" => "Shaman",
        "nihility" => "Warlock",
        "preservation" => "Knight",
        "abundance" => "Priest",
        "remembrance" => "Memory",
        _ => return None,
    };
    Some(alias)
}

/// Element display names to the ids used for element icons.
pub fn element_alias(name: &str) -> Option<&'static str> {
    let alias = match name.trim().to_ascii_lowercase().as_str() {
        "lightning" => "Thunder",
        "physical" => "Physical",
        "fire" => "Fire",
        "ice" => "Ice",
        "wind" => "Wind",
        "quantum" => "Quantum",
        "imaginary" => "Imaginary",
        _ => return None,
    };
    Some(alias)
}

/// Icon file stem for any stat name the alias table recognizes.
pub fn property_icon(name: &str) -> Option<&'static str> {
    let property = identify(name)?;
    let icon = match property.target {
        StatTarget::Fixed(key) => match key {
            StatKey::Hp => "IconMaxHP",
            StatKey::Atk => "IconAttack",
            StatKey::Def => "IconDefence",
            StatKey::Spd => "IconSpeed",
            StatKey::CritRate => "IconCriticalChance",
            StatKey::CritDmg => "IconCriticalDamage",
            StatKey::EffectHitRate => "IconStatusProbability",
            StatKey::EffectRes => "IconStatusResistance",
            StatKey::BreakEffect => "IconBreakUp",
        },
        StatTarget::Extra(extra) => match extra {
            "Outgoing Healing Boost" => "IconHealRatio",
            "Energy Regeneration Rate" => "IconEnergyRecovery",
            "Physical DMG Boost" => "IconPhysicalAddedRatio",
            "Fire DMG Boost" => "IconFireAddedRatio",
            "Ice DMG Boost" => "IconIceAddedRatio",
            "Lightning DMG Boost" => "IconThunderAddedRatio",
            "Wind DMG Boost" => "IconWindAddedRatio",
            "Quantum DMG Boost" => "IconQuantumAddedRatio",
            "Imaginary DMG Boost" => "IconImaginaryAddedRatio",
            _ => return None,
        },
    };
    Some(icon)
}
