//! Schema normalizer: any provider payload to a canonical [`Profile`].
//!
//! Normalization never fails on missing optional data. The only error is a
//! payload with no recognizable character list at all.

mod character;
mod relics;
pub mod shapes;
pub mod stats;
mod value;


use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::gamedata::StaticGameDatabase;
use crate::model::{CharacterBuild, PlayerInfo, Profile, Uid};
use crate::scoring::{LinearScorer, RelicScorer};
use shapes::{locate, Located, SchemaFlavor};
use value::{str_at, u32_at};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// No known shape matched. Carries the payload's top-level keys.
    UnrecognizedSchema { keys: Vec<String> },
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::UnrecognizedSchema { keys } if keys.is_empty() => {
                write!(f, "payload has no recognizable character list")
            }
            NormalizeError::UnrecognizedSchema { keys } => write!(
                f,
                "payload has no recognizable character list (top-level keys: {})",
                keys.join(", ")
            ),
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Unit convention of a provider's percentage values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentScale {
    /// `7.3` means 7.3%.
    Percent,
    /// `0.073` means 7.3%.
    Fraction,
}

impl PercentScale {
    /// Convert a value to percent units. Flat values pass through.
    pub fn apply(self, value: f64, is_percent: bool) -> f64 {
        match self {
            PercentScale::Fraction if is_percent => (value * 100.0 * 1e6).round() / 1e6,
            _ => value,
        }
    }
}

/// Borrowed state shared by the extraction helpers for one character.
pub(crate) struct Extraction<'a> {
    pub db: &'a StaticGameDatabase,
    pub scorer: &'a dyn RelicScorer,
    pub scale: PercentScale,
}

#[derive(Clone)]
pub struct Normalizer {
    db: Arc<StaticGameDatabase>,
    scorer: Arc<dyn RelicScorer>,
}

impl Normalizer {
    pub fn new(db: Arc<StaticGameDatabase>) -> Self {
        Self {
            db,
            scorer: Arc::new(LinearScorer::default()),
        }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn RelicScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Reduce a raw payload to a [`Profile`]. Character order follows the
    /// payload.
    pub fn normalize(&self, payload: &Value, uid: Uid) -> Result<Profile, NormalizeError> {
        let view = match locate(payload) {
            Located::Found(view) => view,
            Located::Empty(view) => {
                debug!(uid = %uid, shape = view.shape, "Character list present but empty");
                view
            }
            Located::NotFound => {
                let keys: Vec<String> = payload
                    .as_object()
                    .map(|map| map.keys().cloned().collect())
                    .unwrap_or_default();
                warn!(uid = %uid, keys = ?keys, "Unrecognized profile payload shape");
                return Err(NormalizeError::UnrecognizedSchema { keys });
            }
        };

        debug!(uid = %uid, shape = view.shape, count = view.entries.len(), "Normalizing profile");
        let characters = view
            .entries
            .iter()
            .map(|raw| self.normalize_character(raw, uid.get()))
            .collect();

        Ok(Profile {
            uid: uid.get(),
            player: view.player.map(player_info).unwrap_or_default(),
            characters,
        })
    }

    /// Reduce one character entry. Never fails; absent fields take their
    /// documented defaults.
    pub fn normalize_character(&self, raw_char: &Value, uid: u64) -> CharacterBuild {
        let cx = Extraction {
            db: &self.db,
            scorer: self.scorer.as_ref(),
            scale: SchemaFlavor::detect(raw_char).percent_scale(),
        };
        character::build_character(raw_char, uid, &cx)
    }
}

/// Reduce one character entry against `db` with the default relic scorer.
pub fn normalize_character(raw_char: &Value, db: &StaticGameDatabase) -> CharacterBuild {
    let scorer = LinearScorer::default();
    let cx = Extraction {
        db,
        scorer: &scorer,
        scale: SchemaFlavor::detect(raw_char).percent_scale(),
    };
    character::build_character(raw_char, 0, &cx)
}

fn player_info(player: &Value) -> PlayerInfo {
    PlayerInfo {
        nickname: str_at(player, &["nickname", "nickName"]).map(str::to_string),
        level: u32_at(player, &["level", "lv"]),
    }
}
