//! Read-only snapshot of the static game database.
//!
//! The snapshot mirrors the StarRailRes index layout: one JSON object per
//! category, keyed by numeric-string (or type-string) ids. Refreshing the
//! files is someone else's job; this module only loads a directory once and
//! answers point lookups. Missing category files are normal and leave the
//! category empty.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Errors raised while loading a database directory.
#[derive(Debug)]
pub enum GameDataError {
    /// A category file exists but could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A category file is not valid JSON of the expected shape.
    Parse {
        category: GameDataCategory,
        source: serde_json::Error,
    },
}

impl fmt::Display for GameDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameDataError::Io { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            GameDataError::Parse { category, source } => {
                write!(f, "Failed to parse {}: {}", category.file_name(), source)
            }
        }
    }
}

impl std::error::Error for GameDataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameDataError::Io { source, .. } => Some(source),
            GameDataError::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameDataCategory {
    Characters,
    LightCones,
    Relics,
    RelicSets,
    RelicMainAffixes,
    RelicSubAffixes,
    Paths,
    Elements,
    Properties,
}

impl GameDataCategory {
    pub const ALL: [GameDataCategory; 9] = [
        GameDataCategory::Characters,
        GameDataCategory::LightCones,
        GameDataCategory::Relics,
        GameDataCategory::RelicSets,
        GameDataCategory::RelicMainAffixes,
        GameDataCategory::RelicSubAffixes,
        GameDataCategory::Paths,
        GameDataCategory::Elements,
        GameDataCategory::Properties,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            GameDataCategory::Characters => "characters.json",
            GameDataCategory::LightCones => "light_cones.json",
            GameDataCategory::Relics => "relics.json",
            GameDataCategory::RelicSets => "relic_sets.json",
            GameDataCategory::RelicMainAffixes => "relic_main_affixes.json",
            GameDataCategory::RelicSubAffixes => "relic_sub_affixes.json",
            GameDataCategory::Paths => "paths.json",
            GameDataCategory::Elements => "elements.json",
            GameDataCategory::Properties => "properties.json",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CharacterEntry {
    pub id: String,
    pub name: String,
    pub rarity: u8,
    /// Path id, e.g. `Warrior`.
    pub path: String,
    /// Element id, e.g. `Thunder`.
    pub element: String,
    pub icon: String,
    pub preview: String,
    pub portrait: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LightConeEntry {
    pub id: String,
    pub name: String,
    pub rarity: u8,
    pub path: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelicEntry {
    pub id: String,
    pub set_id: String,
    pub name: String,
    pub rarity: u8,
    /// Body slot: `HEAD`, `HAND`, `BODY`, `FOOT`, `NECK` or `OBJECT`.
    #[serde(rename = "type")]
    pub slot_type: String,
    pub main_affix_id: String,
    pub sub_affix_id: String,
    pub icon: String,
}

/// Entry shape shared by relic sets, paths and elements.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamedEntry {
    pub id: String,
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PropertyEntry {
    #[serde(rename = "type")]
    pub property_type: String,
    pub name: String,
    pub field: String,
    pub percent: bool,
    pub icon: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AffixEntry {
    pub affix_id: String,
    pub property: String,
    pub base: f64,
    pub step: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AffixGroup {
    pub id: String,
    pub affixes: HashMap<String, AffixEntry>,
}

/// Immutable lookup tables, injected into the normalizer.
#[derive(Debug, Clone, Default)]
pub struct StaticGameDatabase {
    characters: HashMap<String, CharacterEntry>,
    light_cones: HashMap<String, LightConeEntry>,
    relics: HashMap<String, RelicEntry>,
    relic_sets: HashMap<String, NamedEntry>,
    relic_main_affixes: HashMap<String, AffixGroup>,
    relic_sub_affixes: HashMap<String, AffixGroup>,
    paths: HashMap<String, NamedEntry>,
    elements: HashMap<String, NamedEntry>,
    properties: HashMap<String, PropertyEntry>,
}

impl StaticGameDatabase {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every known category file from `dir`. A missing directory or
    /// missing file leaves the matching categories empty.
    pub fn load_dir(dir: &Path) -> Result<Self, GameDataError> {
        let mut db = Self::default();
        for category in GameDataCategory::ALL {
            let path = dir.join(category.file_name());
            let contents = match std::fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Game data file missing; category left empty");
                    continue;
                }
                Err(source) => return Err(GameDataError::Io { path, source }),
            };
            db.load_category(category, &contents)?;
        }
        Ok(db)
    }

    /// Like [`load_dir`](Self::load_dir) but degrades to an empty snapshot.
    pub fn load_dir_or_empty(dir: &Path) -> Self {
        match Self::load_dir(dir) {
            Ok(db) => db,
            Err(err) => {
                warn!(error = %err, "Static game database unavailable; using names from payloads only");
                Self::default()
            }
        }
    }

    /// Replace one category with the parsed contents of `json`.
    pub fn load_category(
        &mut self,
        category: GameDataCategory,
        json: &str,
    ) -> Result<(), GameDataError> {
        match category {
            GameDataCategory::Characters => self.characters = parse(category, json)?,
            GameDataCategory::LightCones => self.light_cones = parse(category, json)?,
            GameDataCategory::Relics => self.relics = parse(category, json)?,
            GameDataCategory::RelicSets => self.relic_sets = parse(category, json)?,
            GameDataCategory::RelicMainAffixes => {
                self.relic_main_affixes = parse(category, json)?
            }
            GameDataCategory::RelicSubAffixes => self.relic_sub_affixes = parse(category, json)?,
            GameDataCategory::Paths => self.paths = parse(category, json)?,
            GameDataCategory::Elements => self.elements = parse(category, json)?,
            GameDataCategory::Properties => self.properties = parse(category, json)?,
        }
        Ok(())
    }

    pub fn character(&self, id: u32) -> Option<&CharacterEntry> {
        self.characters.get(&id.to_string())
    }

    pub fn light_cone(&self, id: u32) -> Option<&LightConeEntry> {
        self.light_cones.get(&id.to_string())
    }

    pub fn relic(&self, id: u32) -> Option<&RelicEntry> {
        self.relics.get(&id.to_string())
    }

    pub fn relic_set_name(&self, set_id: u32) -> Option<&str> {
        non_empty(self.relic_sets.get(&set_id.to_string()).map(|e| e.name.as_str()))
    }

    /// Display name for a path id (`Warrior` -> `Destruction`). Unknown ids
    /// are returned unchanged.
    pub fn path_name<'a>(&'a self, id: &'a str) -> &'a str {
        non_empty(self.paths.get(id).map(|e| e.name.as_str())).unwrap_or(id)
    }

    /// Display name for an element id (`Thunder` -> `Lightning`).
    pub fn element_name<'a>(&'a self, id: &'a str) -> &'a str {
        non_empty(self.elements.get(id).map(|e| e.name.as_str())).unwrap_or(id)
    }

    pub fn property(&self, property_type: &str) -> Option<&PropertyEntry> {
        self.properties.get(property_type)
    }

    pub fn main_affix(&self, group: &str, affix_id: &str) -> Option<&AffixEntry> {
        self.relic_main_affixes.get(group)?.affixes.get(affix_id)
    }

    pub fn sub_affix(&self, group: &str, affix_id: &str) -> Option<&AffixEntry> {
        self.relic_sub_affixes.get(group)?.affixes.get(affix_id)
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
            && self.light_cones.is_empty()
            && self.relics.is_empty()
            && self.relic_sets.is_empty()
            && self.paths.is_empty()
            && self.elements.is_empty()
            && self.properties.is_empty()
    }
}

fn parse<T: DeserializeOwned>(
    category: GameDataCategory,
    json: &str,
) -> Result<HashMap<String, T>, GameDataError> {
    serde_json::from_str(json).map_err(|source| GameDataError::Parse { category, source })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CHARACTERS: &str = r#"{
        "1308": {"id": "1308", "name": "Acheron", "rarity": 5, "path": "Warlock",
                 "element": "Thunder", "portrait": "image/character_portrait/1308.png"}
    }"#;

    #[test]
    fn missing_directory_gives_empty_database() {
        let dir = TempDir::new().unwrap();
        let db = StaticGameDatabase::load_dir(&dir.path().join("nope")).unwrap();
        assert!(db.is_empty());
        assert!(db.character(1308).is_none());
    }

    #[test]
    fn loads_available_categories_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("characters.json"), CHARACTERS).unwrap();
        fs::write(
            dir.path().join("paths.json"),
            r#"{"Warlock": {"id": "Warlock", "name": "Nihility"}}"#,
        )
        .unwrap();

        let db = StaticGameDatabase::load_dir(dir.path()).unwrap();
        let acheron = db.character(1308).expect("character present");
        assert_eq!(acheron.name, "Acheron");
        assert_eq!(db.path_name(&acheron.path), "Nihility");
        // elements.json absent: id passes through
        assert_eq!(db.element_name(&acheron.element), "Thunder");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("relic_sets.json"), "[1, 2").unwrap();
        let err = StaticGameDatabase::load_dir(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            GameDataError::Parse {
                category: GameDataCategory::RelicSets,
                ..
            }
        ));
        assert!(StaticGameDatabase::load_dir_or_empty(dir.path()).is_empty());
    }

    #[test]
    fn affix_lookup_by_group_and_id() {
        let mut db = StaticGameDatabase::empty();
        db.load_category(
            GameDataCategory::RelicSubAffixes,
            r#"{"5": {"id": "5", "affixes": {"9": {"affix_id": "9",
                "property": "CriticalChanceBase", "base": 0.0324, "step": 0.0032}}}}"#,
        )
        .unwrap();
        let affix = db.sub_affix("5", "9").unwrap();
        assert_eq!(affix.property, "CriticalChanceBase");
        assert!(db.sub_affix("5", "10").is_none());
        assert!(db.sub_affix("4", "9").is_none());
    }
}
