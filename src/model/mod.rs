//! Canonical, strongly-typed view of a player's characters.
//!
//! Every provider payload is reduced to these records by
//! [`crate::normalize`]. Ownership is strictly tree-shaped: a [`Profile`]
//! owns its [`CharacterBuild`]s, each build owns one [`LightCone`] and up to
//! six [`Relic`]s, each relic owns up to four [`RelicSubStat`]s.
//!
//! Percentage-flavoured values are stored in percent units (`70.0` means
//! 70%), never as fractions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

pub const MAX_RELICS: usize = 6;
pub const MAX_SUB_STATS: usize = 4;
pub const MAX_CHARACTER_LEVEL: u32 = 80;
pub const MAX_EIDOLON: u32 = 6;
pub const MAX_SUPERIMPOSE: u32 = 5;
pub const MAX_RELIC_LEVEL: u32 = 15;

/// Public numeric identifier of a player account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(NonZeroU64);

impl Uid {
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidUid(pub String);

impl fmt::Display for InvalidUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a positive integer UID", self.0)
    }
}

impl std::error::Error for InvalidUid {}

impl FromStr for Uid {
    type Err = InvalidUid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(Uid::new)
            .ok_or_else(|| InvalidUid(s.to_string()))
    }
}

/// The fixed, ordered set of stats every card shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Hp,
    Atk,
    Def,
    Spd,
    CritRate,
    CritDmg,
    EffectHitRate,
    EffectRes,
    BreakEffect,
}

impl StatKey {
    /// Row order on the card.
    pub const ALL: [StatKey; 9] = [
        StatKey::Hp,
        StatKey::Atk,
        StatKey::Def,
        StatKey::Spd,
        StatKey::CritRate,
        StatKey::CritDmg,
        StatKey::EffectHitRate,
        StatKey::EffectRes,
        StatKey::BreakEffect,
    ];

    /// Whether the character total for this stat is a percentage.
    pub fn is_percent(self) -> bool {
        !matches!(
            self,
            StatKey::Hp | StatKey::Atk | StatKey::Def | StatKey::Spd
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            StatKey::Hp => "HP",
            StatKey::Atk => "ATK",
            StatKey::Def => "DEF",
            StatKey::Spd => "SPD",
            StatKey::CritRate => "CRIT Rate",
            StatKey::CritDmg => "CRIT DMG",
            StatKey::EffectHitRate => "Effect Hit Rate",
            StatKey::EffectRes => "Effect RES",
            StatKey::BreakEffect => "Break Effect",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            StatKey::Hp => "HP",
            StatKey::Atk => "ATK",
            StatKey::Def => "DEF",
            StatKey::Spd => "SPD",
            StatKey::CritRate => "CR",
            StatKey::CritDmg => "CD",
            StatKey::EffectHitRate => "EHR",
            StatKey::EffectRes => "RES",
            StatKey::BreakEffect => "BE",
        }
    }
}

/// Character totals: nine named stats plus anything else the provider knew.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit_dmg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_hit_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_res: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_effect: Option<f64>,
    /// Stats outside the fixed set, keyed by display name. Never holds a
    /// fixed-set stat.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, f64>,
}

impl StatBlock {
    pub fn get(&self, key: StatKey) -> Option<f64> {
        *self.slot(key)
    }

    /// Overwrite a fixed stat. Negative or non-finite values are ignored.
    pub fn set(&mut self, key: StatKey, value: f64) {
        if accept_stat_value(value) {
            *self.slot_mut(key) = Some(value);
        }
    }

    /// Accumulate into a fixed stat, treating an absent value as zero.
    pub fn add(&mut self, key: StatKey, value: f64) {
        if !value.is_finite() {
            return;
        }
        let slot = self.slot_mut(key);
        let total = slot.unwrap_or(0.0) + value;
        if total >= 0.0 {
            *slot = Some(total);
        }
    }

    pub fn add_extra(&mut self, name: &str, value: f64) {
        if !value.is_finite() {
            return;
        }
        let entry = self.extra.entry(name.to_string()).or_insert(0.0);
        *entry += value;
        if *entry < 0.0 {
            *entry = 0.0;
        }
    }

    /// True when no fixed stat and no extra stat is present.
    pub fn is_empty(&self) -> bool {
        StatKey::ALL.iter().all(|key| self.get(*key).is_none()) && self.extra.is_empty()
    }

    fn slot(&self, key: StatKey) -> &Option<f64> {
        match key {
            StatKey::Hp => &self.hp,
            StatKey::Atk => &self.atk,
            StatKey::Def => &self.def,
            StatKey::Spd => &self.spd,
            StatKey::CritRate => &self.crit_rate,
            StatKey::CritDmg => &self.crit_dmg,
            StatKey::EffectHitRate => &self.effect_hit_rate,
            StatKey::EffectRes => &self.effect_res,
            StatKey::BreakEffect => &self.break_effect,
        }
    }

    fn slot_mut(&mut self, key: StatKey) -> &mut Option<f64> {
        match key {
            StatKey::Hp => &mut self.hp,
            StatKey::Atk => &mut self.atk,
            StatKey::Def => &mut self.def,
            StatKey::Spd => &mut self.spd,
            StatKey::CritRate => &mut self.crit_rate,
            StatKey::CritDmg => &mut self.crit_dmg,
            StatKey::EffectHitRate => &mut self.effect_hit_rate,
            StatKey::EffectRes => &mut self.effect_res,
            StatKey::BreakEffect => &mut self.break_effect,
        }
    }
}

fn accept_stat_value(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// One random sub-roll on a relic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelicSubStat {
    pub id: u32,
    pub name: String,
    pub value: f64,
    pub is_percent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relic {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_name: Option<String>,
    pub main_stat: String,
    /// `None` when the payload carries no main value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_value: Option<f64>,
    #[serde(default)]
    pub main_is_percent: bool,
    /// 0–15.
    pub level: u32,
    /// Derived quality, 0–100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub sub_stats: Vec<RelicSubStat>,
    /// 1–6, unique within a character.
    pub slot_position: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightConeStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightCone {
    /// `0` when the character has nothing equipped.
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<u8>,
    pub level: u32,
    pub superimpose: u32,
    #[serde(default)]
    pub base_stats: LightConeStats,
}

impl LightCone {
    pub fn is_equipped(&self) -> bool {
        self.id != 0 || self.name.is_some()
    }
}

impl Default for LightCone {
    fn default() -> Self {
        Self {
            id: 0,
            name: None,
            rarity: None,
            level: 1,
            superimpose: 1,
            base_stats: LightConeStats::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterBuild {
    pub uid: u64,
    pub character_id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<u8>,
    /// 1–80.
    pub level: u32,
    /// 0–6.
    pub eidolon: u32,
    #[serde(default)]
    pub stats: StatBlock,
    #[serde(default)]
    pub light_cone: LightCone,
    /// Sorted by `slot_position`.
    #[serde(default)]
    pub relics: Vec<Relic>,
    #[serde(default)]
    pub portrait_path: String,
}

impl CharacterBuild {
    /// A build with only a name; every other field at its documented default.
    pub fn named(uid: u64, name: impl Into<String>) -> Self {
        Self {
            uid,
            character_id: 0,
            name: name.into(),
            element: None,
            path: None,
            rarity: None,
            level: 1,
            eidolon: 0,
            stats: StatBlock::default(),
            light_cone: LightCone::default(),
            relics: Vec::new(),
            portrait_path: String::new(),
        }
    }

    pub fn relic_in_slot(&self, slot: u8) -> Option<&Relic> {
        self.relics.iter().find(|relic| relic.slot_position == slot)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

/// Root of one normalization cycle for a UID. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub uid: u64,
    pub player: PlayerInfo,
    pub characters: Vec<CharacterBuild>,
}

impl Profile {
    /// Select a character, falling back to the first one when `index` is out
    /// of range. Returns the index actually used.
    pub fn character_or_first(&self, index: usize) -> Option<(usize, &CharacterBuild)> {
        match self.characters.get(index) {
            Some(build) => Some((index, build)),
            None => self.characters.first().map(|build| (0, build)),
        }
    }
}
