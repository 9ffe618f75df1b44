//! Stat-key aliasing and character stat extraction.
//!
//! Providers name the same stat a dozen ways (`CriticalChanceBase`,
//! `crit_rate`, `CRIT Rate`, numeric id `20`). [`identify`] folds all of them
//! onto a [`Property`]; anything it does not know is dropped by callers.

use serde_json::Value;

use super::value::{as_f64, as_u32, bool_at, get_any, object_entries, str_at};
use super::PercentScale;
use crate::model::{StatBlock, StatKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatTarget {
    Fixed(StatKey),
    /// Known stat outside the fixed set, by display name.
    Extra(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    pub target: StatTarget,
    /// `Some(true)` for ratio variants (`HPAddedRatio`, `ATK%`), `Some(false)`
    /// for flat deltas, `None` when the key alone does not say.
    pub percent_hint: Option<bool>,
}

impl Property {
    /// Whether a value of this property is a percentage.
    pub fn is_percent(self) -> bool {
        match (self.percent_hint, self.target) {
            (Some(hint), _) => hint,
            (None, StatTarget::Fixed(key)) => key.is_percent(),
            (None, StatTarget::Extra(_)) => true,
        }
    }

    pub fn label(self) -> &'static str {
        match self.target {
            StatTarget::Fixed(key) => key.label(),
            StatTarget::Extra(name) => name,
        }
    }
}

use StatKey::*;
use StatTarget::{Extra, Fixed};

const HEALING: &str = "Outgoing Healing Boost";
const ENERGY: &str = "Energy Regeneration Rate";
const PHYSICAL: &str = "Physical DMG Boost";
const FIRE: &str = "Fire DMG Boost";
const ICE: &str = "Ice DMG Boost";
const LIGHTNING: &str = "Lightning DMG Boost";
const WIND: &str = "Wind DMG Boost";
const QUANTUM: &str = "Quantum DMG Boost";
const IMAGINARY: &str = "Imaginary DMG Boost";

/// (folded key, target, percent hint). Keys are lowercase ASCII
/// alphanumerics only; see [`fold_key`].
const ALIASES: &[(&str, StatTarget, Option<bool>)] = &[
    // HP
    ("hp", Fixed(Hp), None),
    ("maxhp", Fixed(Hp), Some(false)),
    ("basehp", Fixed(Hp), Some(false)),
    ("hpdelta", Fixed(Hp), Some(false)),
    ("hpaddedratio", Fixed(Hp), Some(true)),
    // ATK
    ("atk", Fixed(Atk), None),
    ("attack", Fixed(Atk), None),
    ("baseattack", Fixed(Atk), Some(false)),
    ("attackdelta", Fixed(Atk), Some(false)),
    ("attackaddedratio", Fixed(Atk), Some(true)),
    // DEF
    ("def", Fixed(Def), None),
    ("defence", Fixed(Def), None),
    ("defense", Fixed(Def), None),
    ("basedefence", Fixed(Def), Some(false)),
    ("defencedelta", Fixed(Def), Some(false)),
    ("defenceaddedratio", Fixed(Def), Some(true)),
    // SPD
    ("spd", Fixed(Spd), Some(false)),
    ("speed", Fixed(Spd), Some(false)),
    ("speeddelta", Fixed(Spd), Some(false)),
    ("basespeed", Fixed(Spd), Some(false)),
    // Crit
    ("critrate", Fixed(CritRate), Some(true)),
    ("critchance", Fixed(CritRate), Some(true)),
    ("criticalchance", Fixed(CritRate), Some(true)),
    ("criticalchancebase", Fixed(CritRate), Some(true)),
    ("critdmg", Fixed(CritDmg), Some(true)),
    ("critdamage", Fixed(CritDmg), Some(true)),
    ("criticaldamage", Fixed(CritDmg), Some(true)),
    ("criticaldamagebase", Fixed(CritDmg), Some(true)),
    // Effect hit / res
    ("effecthitrate", Fixed(EffectHitRate), Some(true)),
    ("effecthit", Fixed(EffectHitRate), Some(true)),
    ("statusprobability", Fixed(EffectHitRate), Some(true)),
    ("statusprobabilitybase", Fixed(EffectHitRate), Some(true)),
    ("effectres", Fixed(EffectRes), Some(true)),
    ("effectresistance", Fixed(EffectRes), Some(true)),
    ("statusresistance", Fixed(EffectRes), Some(true)),
    ("statusresistancebase", Fixed(EffectRes), Some(true)),
    // Break
    ("breakeffect", Fixed(BreakEffect), Some(true)),
    ("breakdmg", Fixed(BreakEffect), Some(true)),
    ("breakdamageaddedratio", Fixed(BreakEffect), Some(true)),
    ("breakdamageaddedratiobase", Fixed(BreakEffect), Some(true)),
    // Outside the fixed set
    ("healrate", Extra(HEALING), Some(true)),
    ("healratio", Extra(HEALING), Some(true)),
    ("healratiobase", Extra(HEALING), Some(true)),
    ("outgoinghealingboost", Extra(HEALING), Some(true)),
    ("sprate", Extra(ENERGY), Some(true)),
    ("spratio", Extra(ENERGY), Some(true)),
    ("spratiobase", Extra(ENERGY), Some(true)),
    ("energyregenerationrate", Extra(ENERGY), Some(true)),
    ("energyregen", Extra(ENERGY), Some(true)),
    ("physicaldmg", Extra(PHYSICAL), Some(true)),
    ("physicaladdedratio", Extra(PHYSICAL), Some(true)),
    ("physicaldmgboost", Extra(PHYSICAL), Some(true)),
    ("firedmg", Extra(FIRE), Some(true)),
    ("fireaddedratio", Extra(FIRE), Some(true)),
    ("firedmgboost", Extra(FIRE), Some(true)),
    ("icedmg", Extra(ICE), Some(true)),
    ("iceaddedratio", Extra(ICE), Some(true)),
    ("icedmgboost", Extra(ICE), Some(true)),
    ("lightningdmg", Extra(LIGHTNING), Some(true)),
    ("thunderaddedratio", Extra(LIGHTNING), Some(true)),
    ("lightningdmgboost", Extra(LIGHTNING), Some(true)),
    ("winddmg", Extra(WIND), Some(true)),
    ("windaddedratio", Extra(WIND), Some(true)),
    ("winddmgboost", Extra(WIND), Some(true)),
    ("quantumdmg", Extra(QUANTUM), Some(true)),
    ("quantumaddedratio", Extra(QUANTUM), Some(true)),
    ("quantumdmgboost", Extra(QUANTUM), Some(true)),
    ("imaginarydmg", Extra(IMAGINARY), Some(true)),
    ("imaginaryaddedratio", Extra(IMAGINARY), Some(true)),
    ("imaginarydmgboost", Extra(IMAGINARY), Some(true)),
];

/// Numeric property ids used by the legacy `propMap` shape.
const LEGACY_PROPERTY_IDS: &[(u32, StatKey)] = &[
    (7, Hp),
    (8, Atk),
    (9, Def),
    (10, Spd),
    (20, CritRate),
    (22, CritDmg),
    (23, EffectHitRate),
    (24, EffectRes),
    (27, BreakEffect),
];

/// Lowercase, ASCII-alphanumeric-only form of a stat key. A trailing `%`
/// is reported separately because it carries meaning (`ATK%`).
fn fold_key(raw: &str) -> (String, bool) {
    let has_percent_sign = raw.contains('%');
    let folded = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (folded, has_percent_sign)
}

/// Recognize a stat key in any provider spelling.
pub fn identify(raw: &str) -> Option<Property> {
    let (folded, has_percent_sign) = fold_key(raw);
    let (folded, suffix_percent) = match folded.strip_suffix("percent") {
        Some(stripped) if !stripped.is_empty() => (stripped.to_string(), true),
        _ => (folded, false),
    };
    let (_, target, hint) = ALIASES.iter().find(|(key, _, _)| *key == folded)?;
    let percent_hint = if has_percent_sign || suffix_percent {
        Some(true)
    } else {
        *hint
    };
    Some(Property {
        target: *target,
        percent_hint,
    })
}

pub fn legacy_property(id: u32) -> Option<StatKey> {
    LEGACY_PROPERTY_IDS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, key)| *key)
}

/// Identify a stat record such as `{"field": "crit_rate", ...}` by trying
/// each naming key in turn.
pub fn identify_record(record: &Value) -> Option<(Property, &str)> {
    ["field", "type", "property", "name", "key", "stat"]
        .iter()
        .filter_map(|key| str_at(record, &[*key]))
        .find_map(|raw| identify(raw).map(|prop| (prop, raw)))
}

/// Build the character stat totals. Sources are tried in precedence order
/// and the first one present wins, so totals are never double counted:
/// an explicit `stats` object or list, then `attributes` + `additions`
/// (summed), then the legacy numeric `propMap`, then bare top-level keys.
pub fn extract_stat_block(raw_char: &Value, scale: PercentScale) -> StatBlock {
    let mut stats = StatBlock::default();

    if let Some(explicit) = get_any(raw_char, &["stats", "stat_block", "finalStats"]) {
        accumulate(&mut stats, explicit, scale);
        return stats;
    }

    let attributes = get_any(raw_char, &["attributes"]);
    let additions = get_any(raw_char, &["additions"]);
    if attributes.is_some() || additions.is_some() {
        for source in [attributes, additions].into_iter().flatten() {
            accumulate(&mut stats, source, scale);
        }
        return stats;
    }

    if let Some(prop_map) = get_any(raw_char, &["propertyMap", "propMap", "fightPropMap"]) {
        accumulate_legacy(&mut stats, prop_map, scale);
        return stats;
    }

    for key in StatKey::ALL {
        let value = match key {
            Def => get_any(raw_char, &["def", "def_"]),
            _ => get_any(raw_char, &[snake_name(key)]),
        };
        if let Some(value) = value.and_then(as_f64) {
            stats.set(key, scale_total(key, value, scale));
        }
    }
    stats
}

fn snake_name(key: StatKey) -> &'static str {
    match key {
        Hp => "hp",
        Atk => "atk",
        Def => "def",
        Spd => "spd",
        CritRate => "crit_rate",
        CritDmg => "crit_dmg",
        EffectHitRate => "effect_hit_rate",
        EffectRes => "effect_res",
        BreakEffect => "break_effect",
    }
}

fn scale_total(key: StatKey, value: f64, scale: PercentScale) -> f64 {
    scale.apply(value, key.is_percent())
}

/// Accept both `[{name, value}, ...]` and `{key: {value}}` / `{key: value}`.
fn accumulate(stats: &mut StatBlock, source: &Value, scale: PercentScale) {
    match source {
        Value::Array(_) => {
            for record in object_entries(source) {
                let Some((property, _)) = identify_record(record) else {
                    continue;
                };
                let Some(value) = get_any(record, &["value", "val", "amount"]).and_then(as_f64)
                else {
                    continue;
                };
                let explicit_percent = bool_at(record, &["is_percent", "percent", "isPercent"]);
                add_total(stats, property, explicit_percent, value, scale);
            }
        }
        Value::Object(map) => {
            for (key, entry) in map {
                let Some(property) = identify(key) else {
                    continue;
                };
                let value = match entry {
                    Value::Object(_) => get_any(entry, &["value", "val"]).and_then(as_f64),
                    other => as_f64(other),
                };
                let Some(value) = value else {
                    continue;
                };
                let explicit_percent = bool_at(entry, &["is_percent", "percent", "isPercent"]);
                add_total(stats, property, explicit_percent, value, scale);
            }
        }
        _ => {}
    }
}

fn add_total(
    stats: &mut StatBlock,
    property: Property,
    explicit_percent: Option<bool>,
    value: f64,
    scale: PercentScale,
) {
    match property.target {
        StatTarget::Fixed(key) => {
            // A ratio bonus on a flat stat (HP%) is not a character total.
            if !key.is_percent() && property.percent_hint == Some(true) {
                return;
            }
            let is_percent = explicit_percent.unwrap_or(key.is_percent());
            stats.add(key, scale.apply(value, is_percent));
        }
        StatTarget::Extra(name) => {
            let is_percent = explicit_percent.unwrap_or(true);
            stats.add_extra(name, scale.apply(value, is_percent));
        }
    }
}

fn accumulate_legacy(stats: &mut StatBlock, prop_map: &Value, scale: PercentScale) {
    let Some(map) = prop_map.as_object() else {
        return;
    };
    for (id, entry) in map {
        let key = match id.parse::<u32>().ok().and_then(legacy_property) {
            Some(key) => key,
            None => match identify(id) {
                Some(Property {
                    target: StatTarget::Fixed(key),
                    ..
                }) => key,
                _ => continue,
            },
        };
        let value = match entry {
            Value::Object(_) => get_any(entry, &["value", "val"]).and_then(as_f64),
            other => as_f64(other),
        };
        if let Some(value) = value {
            stats.set(key, scale_total(key, value, scale));
        }
    }
}

/// Identify a stat referenced by a numeric id or any string spelling.
pub fn identify_value(value: &Value) -> Option<Property> {
    match value {
        Value::String(s) => identify(s),
        other => as_u32(other).and_then(legacy_property).map(|key| Property {
            target: StatTarget::Fixed(key),
            percent_hint: None,
        }),
    }
}
