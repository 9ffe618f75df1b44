//! One character entry to one [`CharacterBuild`].

use serde_json::Value;

use super::relics::extract_relics;
use super::stats::{extract_stat_block, identify, identify_record, StatTarget};
use super::value::{as_f64, as_str, clamp_u32, f64_at, get_any, object_entries, str_at, u32_at};
use super::Extraction;
use crate::gamedata::{CharacterEntry, StaticGameDatabase};
use crate::model::{
    CharacterBuild, LightCone, LightConeStats, StatKey, MAX_CHARACTER_LEVEL, MAX_EIDOLON,
    MAX_SUPERIMPOSE,
};

const ID_KEYS: &[&str] = &["id", "avatarId", "avatar_id", "character_id", "characterId"];
const LIGHT_CONE_KEYS: &[&str] = &["light_cone", "lightCone", "equipment", "equip", "weapon"];

pub fn build_character(raw: &Value, uid: u64, cx: &Extraction<'_>) -> CharacterBuild {
    let character_id = u32_at(raw, ID_KEYS).unwrap_or(0);
    let entry = cx.db.character(character_id);

    let name = str_at(raw, &["name", "avatarName", "character_name"])
        .map(str::to_string)
        .or_else(|| entry.map(|e| e.name.clone()).filter(|n| !n.is_empty()))
        .unwrap_or_else(|| character_id.to_string());

    let element = tag(
        raw,
        &["element", "damage_type", "damageType"],
        cx.db,
        StaticGameDatabase::element_name,
    )
    .or_else(|| {
        entry
            .map(|e| e.element.as_str())
            .filter(|id| !id.is_empty())
            .map(|id| cx.db.element_name(id).to_string())
    });
    let path = tag(
        raw,
        &["path", "base_type", "baseType"],
        cx.db,
        StaticGameDatabase::path_name,
    )
    .or_else(|| {
        entry
            .map(|e| e.path.as_str())
            .filter(|id| !id.is_empty())
            .map(|id| cx.db.path_name(id).to_string())
    });

    let rarity = u32_at(raw, &["rarity", "star"])
        .and_then(|r| u8::try_from(r).ok())
        .or_else(|| entry.map(|e| e.rarity))
        .filter(|r| *r > 0);

    CharacterBuild {
        uid,
        character_id,
        name,
        element,
        path,
        rarity,
        level: clamp_u32(u32_at(raw, &["level", "lvl"]), 1, MAX_CHARACTER_LEVEL, 1),
        eidolon: clamp_u32(u32_at(raw, &["eidolon", "rank", "eidolons"]), 0, MAX_EIDOLON, 0),
        stats: extract_stat_block(raw, cx.scale),
        light_cone: extract_light_cone(raw, cx.db),
        relics: extract_relics(raw, cx),
        portrait_path: portrait_path(raw, character_id, entry),
    }
}

/// A categorical tag that may arrive as a plain string or as `{id, name}`.
fn tag(
    raw: &Value,
    keys: &[&str],
    db: &StaticGameDatabase,
    lookup: for<'a> fn(&'a StaticGameDatabase, &'a str) -> &'a str,
) -> Option<String> {
    let value = get_any(raw, keys)?;
    match value {
        Value::String(_) => as_str(value).map(|s| lookup(db, s).to_string()),
        Value::Object(_) => str_at(value, &["name"])
            .map(str::to_string)
            .or_else(|| str_at(value, &["id"]).map(|id| lookup(db, id).to_string())),
        _ => None,
    }
}

fn portrait_path(raw: &Value, character_id: u32, entry: Option<&CharacterEntry>) -> String {
    if let Some(path) = str_at(raw, &["portrait", "portrait_path", "portraitPath", "preview"]) {
        return path.to_string();
    }
    if let Some(path) = entry
        .and_then(|e| [&e.portrait, &e.preview].into_iter().find(|p| !p.is_empty()))
    {
        return path.clone();
    }
    if character_id != 0 {
        return format!("image/character_portrait/{}.png", character_id);
    }
    String::new()
}

fn extract_light_cone(raw: &Value, db: &StaticGameDatabase) -> LightCone {
    let cone = get_any(raw, LIGHT_CONE_KEYS)
        .filter(|v| v.is_object())
        .or_else(|| {
            get_any(raw, &["equipList"])
                .and_then(|list| object_entries(list).into_iter().next())
        });
    let Some(cone) = cone else {
        return LightCone::default();
    };

    let id = u32_at(cone, &["id", "tid", "itemId"]).unwrap_or(0);
    let entry = db.light_cone(id);
    let name = str_at(cone, &["name"])
        .or_else(|| cone.get("_flat").and_then(|flat| str_at(flat, &["name"])))
        .map(str::to_string)
        .or_else(|| entry.map(|e| e.name.clone()).filter(|n| !n.is_empty()));
    let rarity = u32_at(cone, &["rarity", "star"])
        .and_then(|r| u8::try_from(r).ok())
        .or_else(|| entry.map(|e| e.rarity))
        .filter(|r| *r > 0);

    LightCone {
        id,
        name,
        rarity,
        level: clamp_u32(u32_at(cone, &["level", "lvl"]), 1, MAX_CHARACTER_LEVEL, 1),
        superimpose: clamp_u32(
            u32_at(cone, &["superimpose", "superimposition", "rank", "refinement"]),
            1,
            MAX_SUPERIMPOSE,
            1,
        ),
        base_stats: light_cone_stats(cone),
    }
}

/// Light cone base stats are flat values in every shape.
fn light_cone_stats(cone: &Value) -> LightConeStats {
    let mut stats = LightConeStats::default();
    let records = get_any(cone, &["attributes", "base_stats", "stats", "properties"])
        .or_else(|| cone.get("_flat").and_then(|flat| flat.get("props")));
    let Some(records) = records else {
        return stats;
    };

    let mut apply = |property: Option<StatTarget>, value: Option<f64>| {
        let (Some(StatTarget::Fixed(key)), Some(value)) = (property, value) else {
            return;
        };
        if !value.is_finite() || value < 0.0 {
            return;
        }
        match key {
            StatKey::Hp => stats.hp = Some(value),
            StatKey::Atk => stats.atk = Some(value),
            StatKey::Def => stats.def = Some(value),
            _ => {}
        }
    };

    match records {
        Value::Array(_) => {
            for record in object_entries(records) {
                let property = identify_record(record).map(|(p, _)| p.target);
                apply(property, f64_at(record, &["value", "val"]));
            }
        }
        Value::Object(map) => {
            for (key, value) in map {
                let property = identify(key).map(|p| p.target);
                let value = match value {
                    Value::Object(_) => f64_at(value, &["value", "val"]),
                    other => as_f64(other),
                };
                apply(property, value);
            }
        }
        _ => {}
    }
    stats
}
