//! Relic extraction: main stat, sub-stats, level, set and slot.

use serde_json::Value;
use tracing::{debug, warn};

use super::stats::{identify, identify_record, identify_value, Property};
use super::value::{as_u32, bool_at, f64_at, get_any, object_entries, str_at, u32_at};
use super::{Extraction, PercentScale};
use crate::gamedata::StaticGameDatabase;
use crate::model::{Relic, RelicSubStat, MAX_RELICS, MAX_RELIC_LEVEL, MAX_SUB_STATS};

const RELIC_LIST_KEYS: &[&str] = &["relics", "relicList", "relic_list", "reliquaryList"];
const SUB_LIST_KEYS: &[&str] = &[
    "sub_affix",
    "sub_affix_list",
    "subAffixList",
    "sub_stats",
    "substats",
    "sub_affixes",
];
const PERCENT_FLAG_KEYS: &[&str] = &["is_percent", "percent", "isPercent"];

/// Slot names used by the static database and by some payloads.
const SLOT_NAMES: [&str; MAX_RELICS] = ["HEAD", "HAND", "BODY", "FOOT", "NECK", "OBJECT"];

/// A relic before slot assignment.
struct Pending {
    relic: Relic,
    slot: Option<u8>,
}

/// Extract and slot every relic on a character entry. The result is sorted
/// by `slot_position` and never holds two relics in the same slot.
pub fn extract_relics(raw_char: &Value, cx: &Extraction<'_>) -> Vec<Relic> {
    let Some(list) = get_any(raw_char, RELIC_LIST_KEYS) else {
        return Vec::new();
    };
    let pending = object_entries(list)
        .into_iter()
        .map(|raw| extract_relic(raw, cx))
        .collect();
    assign_slots(pending)
}

fn extract_relic(raw: &Value, cx: &Extraction<'_>) -> Pending {
    let id = u32_at(raw, &["id", "tid", "relicId", "relic_id", "itemId"]).unwrap_or(0);
    let db_entry = cx.db.relic(id);
    let flat_props = raw
        .get("_flat")
        .and_then(|flat| flat.get("props"))
        .map(object_entries)
        .unwrap_or_default();

    let level = u32_at(raw, &["level", "lvl"])
        .map(|level| level.min(MAX_RELIC_LEVEL))
        .unwrap_or(0);

    let set_id = u32_at(raw, &["set_id", "setId"])
        .or_else(|| raw.get("_flat").and_then(|flat| u32_at(flat, &["setID", "setId"])))
        .or_else(|| db_entry.and_then(|entry| entry.set_id.parse().ok()));
    let set_name = str_at(raw, &["set_name", "setName"])
        .or_else(|| raw.get("_flat").and_then(|flat| str_at(flat, &["setName"])))
        .map(str::to_string)
        .or_else(|| set_id.and_then(|id| cx.db.relic_set_name(id)).map(str::to_string));

    let main = extract_main_stat(raw, flat_props.first().copied(), level, cx);
    let sub_stats = extract_sub_stats(raw, &flat_props, cx);

    let score = f64_at(raw, &["score"])
        .map(|score| score.clamp(0.0, 100.0))
        .or_else(|| cx.scorer.score(&sub_stats));

    let slot = slot_from_payload(raw)
        .or_else(|| db_entry.and_then(|entry| slot_from_name(&entry.slot_type)))
        .or_else(|| slot_from_relic_id(id));

    let (main_stat, main_value, main_is_percent) = main.unwrap_or_default();
    Pending {
        relic: Relic {
            id,
            set_id,
            set_name,
            main_stat,
            main_value,
            main_is_percent,
            level,
            score,
            sub_stats,
            slot_position: 0,
        },
        slot,
    }
}

/// `(name, value, is_percent)` of the main stat.
fn extract_main_stat(
    raw: &Value,
    flat_main: Option<&Value>,
    level: u32,
    cx: &Extraction<'_>,
) -> Option<(String, Option<f64>, bool)> {
    if let Some(main) = get_any(raw, &["main_affix", "mainAffix", "main_stat", "mainStat"])
        .filter(|main| main.is_object())
    {
        if let Some((name, value, is_percent)) = stat_record(main, cx.scale) {
            return Some((name, Some(value), is_percent));
        }
    }

    if let Some(name) = str_at(raw, &["main_stat", "mainStat", "main_stat_name"]) {
        let property = identify(name);
        let is_percent = bool_at(raw, &["main_is_percent", "main_percent"])
            .or_else(|| property.map(Property::is_percent))
            .unwrap_or(false);
        let value = f64_at(raw, &["main_value", "mainValue", "main_stat_value"])
            .map(|value| cx.scale.apply(value, is_percent));
        return Some((name.to_string(), value, is_percent));
    }

    if let Some((name, value, is_percent)) = flat_main.and_then(|prop| stat_record(prop, cx.scale)) {
        return Some((name, Some(value), is_percent));
    }

    let affix_id = u32_at(raw, &["mainAffixId", "main_affix_id"])?;
    let group = cx
        .db
        .relic(u32_at(raw, &["tid", "id"]).unwrap_or(0))?
        .main_affix_id
        .clone();
    let affix = cx.db.main_affix(&group, &affix_id.to_string())?;
    let property = identify(&affix.property)?;
    let is_percent = property.is_percent();
    let value = affix.base + affix.step * f64::from(level);
    Some((
        display_name(cx, &affix.property, property),
        Some(PercentScale::Fraction.apply(value, is_percent)),
        is_percent,
    ))
}

fn extract_sub_stats(
    raw: &Value,
    flat_props: &[&Value],
    cx: &Extraction<'_>,
) -> Vec<RelicSubStat> {
    let listed = get_any(raw, SUB_LIST_KEYS)
        .map(object_entries)
        .unwrap_or_default();

    let mut subs: Vec<RelicSubStat> = if flat_props.len() > 1 {
        flat_props[1..]
            .iter()
            .enumerate()
            .filter_map(|(i, prop)| {
                let (name, value, is_percent) = stat_record(prop, cx.scale)?;
                let id = listed
                    .get(i)
                    .and_then(|entry| u32_at(entry, &["affixId", "affix_id", "id"]))
                    .unwrap_or(0);
                Some(RelicSubStat {
                    id,
                    name,
                    value,
                    is_percent,
                })
            })
            .collect()
    } else {
        let relic_id = u32_at(raw, &["tid", "id"]).unwrap_or(0);
        listed
            .iter()
            .filter_map(|entry| {
                sub_from_record(entry, cx).or_else(|| sub_from_affix(entry, relic_id, cx))
            })
            .collect()
    };

    if subs.len() > MAX_SUB_STATS {
        debug!(count = subs.len(), "Relic carries more sub-stats than fit; extra dropped");
        subs.truncate(MAX_SUB_STATS);
    }
    subs
}

fn sub_from_record(entry: &Value, cx: &Extraction<'_>) -> Option<RelicSubStat> {
    let (name, value, is_percent) = stat_record(entry, cx.scale)?;
    let id = u32_at(entry, &["id", "affixId", "affix_id"]).unwrap_or(0);
    Some(RelicSubStat {
        id,
        name,
        value,
        is_percent,
    })
}

/// Rebuild a sub-stat from the affix table when the payload only carries
/// `{affixId, cnt, step}`.
fn sub_from_affix(entry: &Value, relic_id: u32, cx: &Extraction<'_>) -> Option<RelicSubStat> {
    let affix_id = u32_at(entry, &["affixId", "affix_id"])?;
    let group = &cx.db.relic(relic_id)?.sub_affix_id;
    let affix = cx.db.sub_affix(group, &affix_id.to_string())?;
    let property = identify(&affix.property)?;
    let count = f64::from(u32_at(entry, &["cnt", "count"]).unwrap_or(1));
    let steps = f64::from(u32_at(entry, &["step"]).unwrap_or(0));
    let is_percent = property.is_percent();
    let value = affix.base * count + affix.step * steps;
    Some(RelicSubStat {
        id: affix_id,
        name: display_name(cx, &affix.property, property),
        value: PercentScale::Fraction.apply(value, is_percent),
        is_percent,
    })
}

/// A `{name|type|field, value, percent}` record. Records with no value are
/// skipped; records with an unrecognized key keep their payload name.
fn stat_record(record: &Value, scale: PercentScale) -> Option<(String, f64, bool)> {
    let value = f64_at(record, &["value", "val", "amount"])?;
    let property = identify_record(record)
        .map(|(property, _)| property)
        .or_else(|| get_any(record, &["type", "property"]).and_then(identify_value));
    let name = str_at(record, &["name", "display_name"])
        .map(str::to_string)
        .or_else(|| property.map(|p| p.label().to_string()))
        .or_else(|| str_at(record, &["type", "field"]).map(str::to_string))?;
    let is_percent = bool_at(record, PERCENT_FLAG_KEYS)
        .or_else(|| property.map(Property::is_percent))
        .unwrap_or(false);
    Some((name, scale.apply(value, is_percent), is_percent))
}

fn display_name(cx: &Extraction<'_>, property_type: &str, property: Property) -> String {
    cx.db
        .property(property_type)
        .map(|entry| entry.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| property.label())
        .to_string()
}

fn slot_from_payload(raw: &Value) -> Option<u8> {
    let value = get_any(raw, &["slot_position", "slot", "pos", "position", "type"])?;
    match value {
        Value::String(s) => slot_from_name(s).or_else(|| as_u32(value).and_then(slot_from_number)),
        other => as_u32(other).and_then(slot_from_number),
    }
}

fn slot_from_number(n: u32) -> Option<u8> {
    u8::try_from(n)
        .ok()
        .filter(|slot| (1..=MAX_RELICS as u8).contains(slot))
}

fn slot_from_name(name: &str) -> Option<u8> {
    let upper = name.trim().to_ascii_uppercase();
    SLOT_NAMES
        .iter()
        .position(|slot| *slot == upper)
        .map(|index| index as u8 + 1)
}

/// Five-digit relic ids end in their slot number (`61141` is a head piece).
fn slot_from_relic_id(id: u32) -> Option<u8> {
    if (10_000..100_000).contains(&id) {
        slot_from_number(id % 10)
    } else {
        None
    }
}

/// Relics that name a free slot keep it; relics with a taken slot or no
/// slot take the lowest free one; anything past six is dropped.
fn assign_slots(pending: Vec<Pending>) -> Vec<Relic> {
    let mut taken = [false; MAX_RELICS];
    let mut placed: Vec<Relic> = Vec::with_capacity(MAX_RELICS);
    let mut deferred: Vec<Relic> = Vec::new();

    for Pending { mut relic, slot } in pending {
        match slot {
            Some(slot) if !taken[usize::from(slot) - 1] => {
                taken[usize::from(slot) - 1] = true;
                relic.slot_position = slot;
                placed.push(relic);
            }
            Some(slot) => {
                warn!(relic_id = relic.id, slot, "Relic slot already occupied; moving to a free slot");
                deferred.push(relic);
            }
            None => deferred.push(relic),
        }
    }

    for mut relic in deferred {
        match taken.iter().position(|used| !used) {
            Some(free) => {
                taken[free] = true;
                relic.slot_position = free as u8 + 1;
                placed.push(relic);
            }
            None => {
                warn!(relic_id = relic.id, "More than six relics on one character; dropping extra");
            }
        }
    }

    placed.sort_by_key(|relic| relic.slot_position);
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamedata::GameDataCategory;
    use crate::scoring::LinearScorer;
    use serde_json::json;
    use std::collections::HashSet;

    fn extract(raw: &Value, scale: PercentScale, db: &StaticGameDatabase) -> Vec<Relic> {
        let scorer = LinearScorer::default();
        let cx = Extraction {
            db,
            scorer: &scorer,
            scale,
        };
        extract_relics(raw, &cx)
    }

    #[test]
    fn named_main_stat_without_value_stays_unset() {
        let raw = json!({"relics": [{"id": 61142, "main_stat": "ATK%", "level": 9, "slot_position": 2}]});
        let relics = extract(&raw, PercentScale::Percent, &StaticGameDatabase::empty());
        assert_eq!(relics[0].main_stat, "ATK%");
        assert_eq!(relics[0].main_value, None);
    }

    #[test]
    fn flat_relic_keeps_percent_values_verbatim() {
        let raw = json!({"relics": [{
            "id": 61141, "main_stat": "HP", "main_value": 705.6, "level": 15,
            "slot_position": 1,
            "sub_stats": [{"name": "Crit Rate", "value": 7.3, "is_percent": true},
                          {"name": "SPD", "value": 4, "is_percent": false}]
        }]});
        let relics = extract(&raw, PercentScale::Percent, &StaticGameDatabase::empty());
        assert_eq!(relics.len(), 1);
        let relic = &relics[0];
        assert_eq!(relic.main_stat, "HP");
        assert_eq!(relic.main_value, Some(705.6));
        assert!(!relic.main_is_percent);
        assert_eq!(relic.sub_stats[0].value, 7.3);
        assert!(relic.sub_stats[0].is_percent);
        assert!(relic.score.is_some());
    }

    #[test]
    fn parsed_api_fractions_are_scaled() {
        let raw = json!({"relics": [{
            "id": "63145", "set_id": "314", "set_name": "Izumo", "level": 15,
            "main_affix": {"type": "CriticalDamageBase", "name": "CRIT DMG",
                           "value": 0.648, "percent": true},
            "sub_affix": [{"type": "CriticalChanceBase", "name": "CRIT Rate",
                           "value": 0.0648, "percent": true, "count": 2, "step": 2}],
            "score": 140
        }]});
        let relics = extract(&raw, PercentScale::Fraction, &StaticGameDatabase::empty());
        let relic = &relics[0];
        assert_eq!(relic.slot_position, 5);
        assert_eq!(relic.set_id, Some(314));
        assert!((relic.main_value.unwrap() - 64.8).abs() < 1e-9);
        assert!((relic.sub_stats[0].value - 6.48).abs() < 1e-9);
        assert_eq!(relic.score, Some(100.0));
    }

    #[test]
    fn flat_props_supply_values_and_affix_ids() {
        let raw = json!({"relicList": [{
            "tid": 61011, "type": 1, "level": 15, "mainAffixId": 1,
            "subAffixList": [{"affixId": 9, "cnt": 2}, {"affixId": 4, "cnt": 1}],
            "_flat": {"setID": 101, "setName": "Passerby", "props": [
                {"type": "HPDelta", "value": 705.6},
                {"type": "CriticalChanceBase", "value": 0.058},
                {"type": "AttackAddedRatio", "value": 0.0389}
            ]}
        }]});
        let relics = extract(&raw, PercentScale::Fraction, &StaticGameDatabase::empty());
        let relic = &relics[0];
        assert_eq!(relic.set_name.as_deref(), Some("Passerby"));
        assert_eq!(relic.main_stat, "HP");
        assert_eq!(relic.sub_stats.len(), 2);
        assert_eq!(relic.sub_stats[0].id, 9);
        assert_eq!(relic.sub_stats[0].name, "CRIT Rate");
        assert!((relic.sub_stats[0].value - 5.8).abs() < 1e-9);
        assert_eq!(relic.sub_stats[1].name, "ATK");
        assert!(relic.sub_stats[1].is_percent);
    }

    #[test]
    fn affix_ids_alone_are_rebuilt_from_tables() {
        let mut db = StaticGameDatabase::empty();
        db.load_category(
            GameDataCategory::Relics,
            r#"{"61011": {"id": "61011", "set_id": "101", "type": "HEAD",
                "main_affix_id": "51", "sub_affix_id": "5"}}"#,
        )
        .unwrap();
        db.load_category(
            GameDataCategory::RelicMainAffixes,
            r#"{"51": {"id": "51", "affixes": {"1": {"affix_id": "1",
                "property": "HPDelta", "base": 112.896, "step": 39.5136}}}}"#,
        )
        .unwrap();
        db.load_category(
            GameDataCategory::RelicSubAffixes,
            r#"{"5": {"id": "5", "affixes": {"9": {"affix_id": "9",
                "property": "CriticalChanceBase", "base": 0.02592, "step": 0.00324}}}}"#,
        )
        .unwrap();
        db.load_category(
            GameDataCategory::RelicSets,
            r#"{"101": {"id": "101", "name": "Passerby of Wandering Cloud"}}"#,
        )
        .unwrap();

        let raw = json!({"relicList": [{
            "tid": 61011, "level": 15, "mainAffixId": 1,
            "subAffixList": [{"affixId": 9, "cnt": 3, "step": 4}]
        }]});
        let relics = extract(&raw, PercentScale::Fraction, &db);
        let relic = &relics[0];
        assert_eq!(relic.slot_position, 1);
        assert_eq!(relic.set_name.as_deref(), Some("Passerby of Wandering Cloud"));
        assert!((relic.main_value.unwrap() - (112.896 + 39.5136 * 15.0)).abs() < 1e-6);
        assert!(!relic.main_is_percent);
        let sub = &relic.sub_stats[0];
        assert_eq!(sub.id, 9);
        assert!(sub.is_percent);
        assert!((sub.value - (0.02592 * 3.0 + 0.00324 * 4.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn colliding_and_missing_slots_get_unique_positions() {
        let raw = json!({"relics": [
            {"id": 1, "slot": 2, "main_stat": "HP"},
            {"id": 2, "slot": 2, "main_stat": "ATK"},
            {"id": 3, "main_stat": "DEF"},
            {"id": 4, "slot": "BODY", "main_stat": "SPD"},
            {"id": 5, "slot": 9},
            {"id": 6},
            {"id": 7},
            {"id": 8}
        ]});
        let relics = extract(&raw, PercentScale::Percent, &StaticGameDatabase::empty());
        assert_eq!(relics.len(), MAX_RELICS);
        let slots: HashSet<u8> = relics.iter().map(|r| r.slot_position).collect();
        assert_eq!(slots.len(), MAX_RELICS);
        assert!(relics.windows(2).all(|w| w[0].slot_position < w[1].slot_position));
        assert_eq!(relics[1].id, 1);
        assert_eq!(relics[2].id, 4);
        // first deferred relic takes the lowest free slot
        assert_eq!(relics[0].id, 2);
    }

    #[test]
    fn sub_stats_are_capped_at_four() {
        let subs: Vec<Value> = (0..6)
            .map(|i| json!({"name": "SPD", "value": i + 1, "is_percent": false}))
            .collect();
        let raw = json!({"relics": [{"id": 1, "slot": 1, "sub_stats": subs}]});
        let relics = extract(&raw, PercentScale::Percent, &StaticGameDatabase::empty());
        assert_eq!(relics[0].sub_stats.len(), MAX_SUB_STATS);
    }
}
