//! Ordered shape matchers that locate the character list in a payload.
//!
//! Each matcher is a pure function from the raw payload to an optional view
//! of its character list. [`locate`] tries them in order; the first one that
//! yields a non-empty list wins.

use serde_json::Value;

use super::value::{get_any, object_entries};
use super::PercentScale;

/// Borrowed view of one provider's character list.
#[derive(Debug, Clone)]
pub struct CharacterListView<'a> {
    pub shape: &'static str,
    pub entries: Vec<&'a Value>,
    /// Object carrying the player header, when the shape has one.
    pub player: Option<&'a Value>,
}

pub struct ShapeMatcher {
    pub name: &'static str,
    pub matches: for<'a> fn(&'a Value) -> Option<CharacterListView<'a>>,
}

/// Tried top to bottom.
pub const SHAPE_MATCHERS: &[ShapeMatcher] = &[
    ShapeMatcher {
        name: "characters",
        matches: match_characters,
    },
    ShapeMatcher {
        name: "avatars",
        matches: match_avatars,
    },
    ShapeMatcher {
        name: "detail_info",
        matches: match_detail_info,
    },
    ShapeMatcher {
        name: "avatar_detail_list",
        matches: match_avatar_detail_list,
    },
    ShapeMatcher {
        name: "avatar_info_list",
        matches: match_avatar_info_list,
    },
    ShapeMatcher {
        name: "showcase",
        matches: match_showcase,
    },
];

/// Outcome of running every matcher over a payload.
#[derive(Debug)]
pub enum Located<'a> {
    /// A non-empty character list.
    Found(CharacterListView<'a>),
    /// A recognized list key was present but every candidate list was empty.
    Empty(CharacterListView<'a>),
    NotFound,
}

pub fn locate(payload: &Value) -> Located<'_> {
    let mut first_empty = None;
    for matcher in SHAPE_MATCHERS {
        let Some(view) = (matcher.matches)(payload) else {
            continue;
        };
        if !view.entries.is_empty() {
            return Located::Found(view);
        }
        if first_empty.is_none() {
            first_empty = Some(view);
        }
    }
    match first_empty {
        Some(view) => Located::Empty(view),
        None => Located::NotFound,
    }
}

/// True when `payload` carries a non-empty character list in any known shape.
pub fn has_character_list(payload: &Value) -> bool {
    matches!(locate(payload), Located::Found(_))
}

fn list_at<'a>(
    shape: &'static str,
    container: &'a Value,
    keys: &[&str],
    player: Option<&'a Value>,
) -> Option<CharacterListView<'a>> {
    let list = get_any(container, keys)?;
    if !(list.is_array() || list.is_object()) {
        return None;
    }
    Some(CharacterListView {
        shape,
        entries: object_entries(list),
        player,
    })
}

fn match_characters(payload: &Value) -> Option<CharacterListView<'_>> {
    list_at("characters", payload, &["characters"], get_any(payload, &["player"]))
}

fn match_avatars(payload: &Value) -> Option<CharacterListView<'_>> {
    list_at(
        "avatars",
        payload,
        &["avatars"],
        get_any(payload, &["player", "playerInfo"]),
    )
}

fn match_detail_info(payload: &Value) -> Option<CharacterListView<'_>> {
    let detail = get_any(payload, &["detailInfo"])?;
    list_at("detail_info", detail, &["avatarDetailList"], Some(detail))
}

fn match_avatar_detail_list(payload: &Value) -> Option<CharacterListView<'_>> {
    list_at(
        "avatar_detail_list",
        payload,
        &["avatarDetailList"],
        get_any(payload, &["playerInfo", "player"]),
    )
}

fn match_avatar_info_list(payload: &Value) -> Option<CharacterListView<'_>> {
    if let Some(view) = list_at(
        "avatar_info_list",
        payload,
        &["avatarInfoList"],
        get_any(payload, &["playerInfo", "player"]),
    ) {
        return Some(view);
    }
    ["player", "playerInfo"].iter().find_map(|key| {
        let container = get_any(payload, &[*key])?;
        list_at("avatar_info_list", container, &["avatarInfoList"], Some(container))
    })
}

fn match_showcase(payload: &Value) -> Option<CharacterListView<'_>> {
    if let Some(detail) = get_any(payload, &["detailInfo"]) {
        if let Some(view) = list_at("showcase", detail, &["assistAvatarList"], Some(detail)) {
            return Some(view);
        }
        if let Some(single) = get_any(detail, &["assistAvatarDetail"]).filter(|v| v.is_object()) {
            return Some(CharacterListView {
                shape: "showcase",
                entries: vec![single],
                player: Some(detail),
            });
        }
    }
    let display = get_any(payload, &["playerDetailInfo"])?;
    list_at("showcase", display, &["displayAvatarList"], Some(display))
}

/// How a single character entry is laid out. Determines both the field
/// vocabulary and the percent convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFlavor {
    /// Hand-assembled or already-normalized records, percent units.
    Flat,
    /// Pre-parsed API (`attributes`/`additions`), fractions.
    Parsed,
    /// Raw v2 API (`avatarId`, `relicList`, `_flat`), fractions.
    Detailed,
    /// Legacy API with numeric `propMap`, fractions.
    Legacy,
}

impl SchemaFlavor {
    pub fn detect(entry: &Value) -> Self {
        let has = |keys: &[&str]| get_any(entry, keys).is_some();
        if has(&["propMap", "propertyMap", "fightPropMap"]) {
            SchemaFlavor::Legacy
        } else if has(&["avatarId", "relicList", "equipment", "_flat"]) {
            SchemaFlavor::Detailed
        } else if has(&["attributes", "additions", "relic_sets", "rank_icons", "promotion"]) {
            SchemaFlavor::Parsed
        } else {
            SchemaFlavor::Flat
        }
    }

    pub fn percent_scale(self) -> PercentScale {
        match self {
            SchemaFlavor::Flat => PercentScale::Percent,
            SchemaFlavor::Parsed | SchemaFlavor::Detailed | SchemaFlavor::Legacy => {
                PercentScale::Fraction
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shape_of(payload: &Value) -> Option<&'static str> {
        match locate(payload) {
            Located::Found(view) => Some(view.shape),
            _ => None,
        }
    }

    #[test]
    fn first_non_empty_list_wins() {
        let payload = json!({
            "characters": [],
            "avatars": [{"name": "March 7th"}]
        });
        assert_eq!(shape_of(&payload), Some("avatars"));
    }

    #[test]
    fn nested_shapes_are_found() {
        let v2 = json!({"detailInfo": {"nickname": "Trailblazer",
            "avatarDetailList": [{"avatarId": 1308}]}});
        assert_eq!(shape_of(&v2), Some("detail_info"));

        let legacy = json!({"player": {"avatarInfoList": [{"avatarId": 1005}]}});
        assert_eq!(shape_of(&legacy), Some("avatar_info_list"));

        let showcase = json!({"detailInfo": {"assistAvatarDetail": {"avatarId": 1102}}});
        assert_eq!(shape_of(&showcase), Some("showcase"));
    }

    #[test]
    fn present_but_empty_list_is_distinguished_from_unknown() {
        assert!(matches!(locate(&json!({"characters": []})), Located::Empty(_)));
        assert!(matches!(locate(&json!({"message": "nope"})), Located::NotFound));
        assert!(matches!(locate(&json!([1, 2, 3])), Located::NotFound));
        assert!(!has_character_list(&json!({"avatars": []})));
    }

    #[test]
    fn flavor_detection() {
        assert_eq!(SchemaFlavor::detect(&json!({"name": "A"})), SchemaFlavor::Flat);
        assert_eq!(
            SchemaFlavor::detect(&json!({"attributes": []})),
            SchemaFlavor::Parsed
        );
        assert_eq!(
            SchemaFlavor::detect(&json!({"avatarId": 1, "relicList": []})),
            SchemaFlavor::Detailed
        );
        assert_eq!(
            SchemaFlavor::detect(&json!({"avatarId": 1, "propMap": {}})),
            SchemaFlavor::Legacy
        );
        assert_eq!(SchemaFlavor::Flat.percent_scale(), PercentScale::Percent);
    }
}
