//! Card composition: a build and a theme become an ordered list of drawing
//! primitives. Positions are fixed offsets inside the layout regions, so a
//! missing field leaves a gap instead of moving its neighbours.

use image::Rgba;

use super::format::{
    format_character_level, format_level_badge, format_light_cone_level, format_score,
    format_stat, format_value, short_stat_label, MISSING,
};
use super::layout::{CardLayout, Rect};
use super::text::{fit_text, text_height};
use super::theme::{CardTheme, Palette};
use crate::assets::{AssetKey, Fit};
use crate::model::{CharacterBuild, LightCone, Relic, StatKey, MAX_RELICS};

const PANEL_BORDER_WIDTH: u32 = 2;
const INNER_PAD: i32 = 16;

const NAME_SCALE: u32 = 3;
const BODY_SCALE: u32 = 2;
const SMALL_SCALE: u32 = 1;

const TAG_ICON: u32 = 32;
const STAT_ICON: u32 = 24;
const STAT_ROWS_TOP: i32 = 112;
const STAT_ROW_HEIGHT: i32 = 36;
const STAT_VALUE_WIDTH: u32 = 84;
const LIGHT_CONE_ICON: u32 = 64;

const RELIC_ICON: u32 = 72;
const RELIC_PAD: i32 = 10;
const MAIN_LINE_TOP: i32 = 92;
const MAIN_ICON: u32 = 20;
const SUB_LINES_TOP: i32 = 118;
const SUB_LINE_HEIGHT: i32 = 22;
const SUB_ICON: u32 = 16;
const RELIC_VALUE_WIDTH: u32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Left,
    /// `x` is the right edge of the text.
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem {
    Gradient {
        rect: Rect,
        top: Rgba<u8>,
        bottom: Rgba<u8>,
    },
    Fill {
        rect: Rect,
        color: Rgba<u8>,
    },
    Outline {
        rect: Rect,
        color: Rgba<u8>,
        width: u32,
    },
    Image {
        key: AssetKey,
        rect: Rect,
        fit: Fit,
    },
    Text {
        text: String,
        x: i32,
        y: i32,
        scale: u32,
        color: Rgba<u8>,
        anchor: Anchor,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardScene {
    pub width: u32,
    pub height: u32,
    pub items: Vec<SceneItem>,
}

impl CardScene {
    /// Every text string in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            SceneItem::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = (&AssetKey, &Rect)> {
        self.items.iter().filter_map(|item| match item {
            SceneItem::Image { key, rect, .. } => Some((key, rect)),
            _ => None,
        })
    }
}

struct SceneBuilder<'a> {
    palette: &'a Palette,
    items: Vec<SceneItem>,
}

impl SceneBuilder<'_> {
    fn fill(&mut self, rect: Rect, color: Rgba<u8>) {
        self.items.push(SceneItem::Fill { rect, color });
    }

    fn outline(&mut self, rect: Rect, color: Rgba<u8>) {
        self.items.push(SceneItem::Outline {
            rect,
            color,
            width: PANEL_BORDER_WIDTH,
        });
    }

    fn panel(&mut self, rect: Rect) {
        self.fill(rect, self.palette.panel);
        self.outline(rect, self.palette.panel_border);
    }

    fn image(&mut self, key: AssetKey, rect: Rect, fit: Fit) {
        self.items.push(SceneItem::Image { key, rect, fit });
    }

    fn icon(&mut self, key: AssetKey, x: i32, y: i32, size: u32) {
        self.image(key, Rect::new(x, y, size, size), Fit::Stretch);
    }

    /// Text fitted into `max_width`, shrinking from `scale` down to `min_scale`.
    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        max_width: u32,
        scale: u32,
        min_scale: u32,
        color: Rgba<u8>,
        anchor: Anchor,
    ) {
        let (text, scale) = fit_text(text, max_width, scale, min_scale);
        if text.is_empty() {
            return;
        }
        self.items.push(SceneItem::Text {
            text,
            x,
            y,
            scale,
            color,
            anchor,
        });
    }
}

/// Lay out `build` on the card described by `theme`. Never fails: absent
/// data becomes `-`, an empty tile or a placeholder image.
pub fn compose(build: &CharacterBuild, theme: &CardTheme) -> CardScene {
    let layout = CardLayout::compute(&theme.geometry);
    let palette = &theme.palette;
    let mut scene = SceneBuilder {
        palette,
        items: Vec::new(),
    };

    scene.items.push(SceneItem::Gradient {
        rect: layout.canvas,
        top: palette.background_top,
        bottom: palette.background_bottom,
    });

    compose_portrait(&mut scene, build, &layout);
    compose_stats(&mut scene, build, layout.stats);
    for slot in 1..=MAX_RELICS as u8 {
        if let Some(tile) = layout.tile(slot) {
            compose_relic_tile(&mut scene, build.relic_in_slot(slot), tile);
        }
    }

    CardScene {
        width: theme.geometry.canvas_width,
        height: theme.geometry.canvas_height,
        items: scene.items,
    }
}

fn compose_portrait(scene: &mut SceneBuilder<'_>, build: &CharacterBuild, layout: &CardLayout) {
    let palette = scene.palette;
    let area = layout.portrait;
    scene.fill(area, palette.panel);
    scene.image(AssetKey::Portrait(build.portrait_path.clone()), area, Fit::Cover);

    let strip = layout.uid_strip;
    scene.fill(strip, palette.panel);
    let text_y = strip.y + (strip.h as i32 - text_height(BODY_SCALE) as i32) / 2;
    scene.text(
        &format!("UID {}", build.uid),
        strip.x + INNER_PAD,
        text_y,
        strip.w.saturating_sub(2 * INNER_PAD as u32),
        BODY_SCALE,
        SMALL_SCALE,
        palette.text_secondary,
        Anchor::Left,
    );
    scene.outline(area, palette.panel_border);
}

fn compose_stats(scene: &mut SceneBuilder<'_>, build: &CharacterBuild, area: Rect) {
    let palette = scene.palette;
    scene.panel(area);
    let left = area.x + INNER_PAD;
    let right = area.right() - INNER_PAD;
    let inner_w = area.w.saturating_sub(2 * INNER_PAD as u32);

    scene.text(
        &build.name,
        left,
        area.y + INNER_PAD,
        inner_w,
        NAME_SCALE,
        BODY_SCALE,
        palette.text_primary,
        Anchor::Left,
    );

    let tag_y = area.y + 56;
    if let Some(element) = &build.element {
        scene.icon(AssetKey::Element(element.clone()), left, tag_y, TAG_ICON);
    }
    if let Some(path) = &build.path {
        scene.icon(AssetKey::Path(path.clone()), left + 40, tag_y, TAG_ICON);
    }
    scene.text(
        &format_character_level(build.level, build.eidolon),
        right,
        tag_y + 9,
        inner_w.saturating_sub(88),
        BODY_SCALE,
        SMALL_SCALE,
        palette.text_secondary,
        Anchor::Right,
    );
    scene.fill(
        Rect::new(left, area.y + STAT_ROWS_TOP - 12, inner_w, 1),
        palette.panel_border,
    );

    let label_width = inner_w.saturating_sub(STAT_ICON + 8 + STAT_VALUE_WIDTH + 8);
    for (row, key) in StatKey::ALL.iter().enumerate() {
        let row_y = area.y + STAT_ROWS_TOP + row as i32 * STAT_ROW_HEIGHT;
        scene.icon(
            AssetKey::Property(key.label().to_string()),
            left,
            row_y,
            STAT_ICON,
        );
        scene.text(
            key.label(),
            left + STAT_ICON as i32 + 8,
            row_y + 5,
            label_width,
            BODY_SCALE,
            SMALL_SCALE,
            palette.text_secondary,
            Anchor::Left,
        );
        scene.text(
            &format_stat(build.stats.get(*key), key.is_percent()),
            right,
            row_y + 5,
            STAT_VALUE_WIDTH,
            BODY_SCALE,
            SMALL_SCALE,
            palette.text_primary,
            Anchor::Right,
        );
    }

    let cone_top = area.y + STAT_ROWS_TOP + StatKey::ALL.len() as i32 * STAT_ROW_HEIGHT + 12;
    scene.fill(Rect::new(left, cone_top - 6, inner_w, 1), palette.panel_border);
    compose_light_cone(scene, &build.light_cone, left, cone_top + 4, inner_w);
}

fn compose_light_cone(scene: &mut SceneBuilder<'_>, cone: &LightCone, left: i32, top: i32, width: u32) {
    let palette = scene.palette;
    let icon_rect = Rect::new(left, top, LIGHT_CONE_ICON, LIGHT_CONE_ICON);
    if cone.is_equipped() {
        scene.image(AssetKey::LightCone(cone.id), icon_rect, Fit::Stretch);
    }
    scene.outline(icon_rect, palette.panel_border);

    let text_x = left + LIGHT_CONE_ICON as i32 + 12;
    let text_w = width.saturating_sub(LIGHT_CONE_ICON + 12);
    let name = cone.name.as_deref().unwrap_or(MISSING);
    scene.text(
        name,
        text_x,
        top + 6,
        text_w,
        BODY_SCALE,
        SMALL_SCALE,
        palette.text_primary,
        Anchor::Left,
    );
    let level = if cone.is_equipped() {
        format_light_cone_level(cone.level, cone.superimpose)
    } else {
        MISSING.to_string()
    };
    scene.text(
        &level,
        text_x,
        top + 32,
        text_w,
        BODY_SCALE,
        SMALL_SCALE,
        palette.text_secondary,
        Anchor::Left,
    );

    let base = &cone.base_stats;
    let parts: Vec<String> = [("HP", base.hp), ("ATK", base.atk), ("DEF", base.def)]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| format!("{} {}", label, format_value(v, false))))
        .collect();
    if !parts.is_empty() {
        scene.text(
            &parts.join("  "),
            left,
            top + LIGHT_CONE_ICON as i32 + 12,
            width,
            BODY_SCALE,
            SMALL_SCALE,
            palette.text_secondary,
            Anchor::Left,
        );
    }
}

fn compose_relic_tile(scene: &mut SceneBuilder<'_>, relic: Option<&Relic>, tile: Rect) {
    let palette = scene.palette;
    let Some(relic) = relic else {
        scene.fill(tile, palette.placeholder);
        scene.outline(tile, palette.panel_border);
        return;
    };
    scene.panel(tile);

    let left = tile.x + RELIC_PAD;
    let right = tile.right() - RELIC_PAD;
    let inner_w = tile.w.saturating_sub(2 * RELIC_PAD as u32);

    scene.icon(
        AssetKey::Relic {
            id: relic.id,
            set_id: relic.set_id,
            slot: relic.slot_position,
        },
        left,
        tile.y + RELIC_PAD,
        RELIC_ICON,
    );
    scene.text(
        &format_level_badge(relic.level),
        right,
        tile.y + RELIC_PAD,
        48,
        BODY_SCALE,
        SMALL_SCALE,
        palette.accent,
        Anchor::Right,
    );
    if let Some(set_name) = &relic.set_name {
        scene.text(
            set_name,
            left + RELIC_ICON as i32 + 8,
            tile.y + 44,
            inner_w.saturating_sub(RELIC_ICON + 8),
            SMALL_SCALE,
            SMALL_SCALE,
            palette.text_secondary,
            Anchor::Left,
        );
    }

    let main_y = tile.y + MAIN_LINE_TOP;
    let label_x = left + MAIN_ICON as i32 + 6;
    let label_w = inner_w.saturating_sub(MAIN_ICON + 6 + RELIC_VALUE_WIDTH + 6);
    if !relic.main_stat.is_empty() {
        scene.icon(AssetKey::Property(relic.main_stat.clone()), left, main_y, MAIN_ICON);
    }
    let main_label = if relic.main_stat.is_empty() {
        MISSING.to_string()
    } else {
        short_stat_label(&relic.main_stat)
    };
    scene.text(
        &main_label,
        label_x,
        main_y + 3,
        label_w,
        BODY_SCALE,
        SMALL_SCALE,
        palette.text_primary,
        Anchor::Left,
    );
    scene.text(
        &format_stat(relic.main_value, relic.main_is_percent),
        right,
        main_y + 3,
        RELIC_VALUE_WIDTH,
        BODY_SCALE,
        SMALL_SCALE,
        palette.text_primary,
        Anchor::Right,
    );

    let sub_label_x = left + SUB_ICON as i32 + 6;
    let sub_label_w = inner_w.saturating_sub(SUB_ICON + 6 + RELIC_VALUE_WIDTH + 6);
    for (index, sub) in relic.sub_stats.iter().take(4).enumerate() {
        let y = tile.y + SUB_LINES_TOP + index as i32 * SUB_LINE_HEIGHT;
        scene.icon(AssetKey::Property(sub.name.clone()), left, y, SUB_ICON);
        scene.text(
            &short_stat_label(&sub.name),
            sub_label_x,
            y + 1,
            sub_label_w,
            BODY_SCALE,
            SMALL_SCALE,
            palette.text_secondary,
            Anchor::Left,
        );
        scene.text(
            &format_stat(Some(sub.value), sub.is_percent),
            right,
            y + 1,
            RELIC_VALUE_WIDTH,
            BODY_SCALE,
            SMALL_SCALE,
            palette.text_primary,
            Anchor::Right,
        );
    }

    if let Some(score) = relic.score {
        scene.text(
            &format_score(score),
            right,
            tile.bottom() - RELIC_PAD - text_height(BODY_SCALE) as i32,
            inner_w,
            BODY_SCALE,
            SMALL_SCALE,
            palette.accent,
            Anchor::Right,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelicSubStat;

    fn relic(slot: u8) -> Relic {
        Relic {
            id: 61000 + u32::from(slot),
            set_id: Some(101),
            set_name: Some("Passerby of Wandering Cloud".to_string()),
            main_stat: "HP".to_string(),
            main_value: Some(705.6),
            main_is_percent: false,
            level: 15,
            score: Some(42.0),
            sub_stats: vec![RelicSubStat {
                id: 9,
                name: "Crit Rate".to_string(),
                value: 7.3,
                is_percent: true,
            }],
            slot_position: slot,
        }
    }

    fn relic_tile_outlines(scene: &CardScene, theme: &CardTheme) -> usize {
        let layout = CardLayout::compute(&theme.geometry);
        scene
            .items
            .iter()
            .filter(|item| {
                matches!(item, SceneItem::Outline { rect, .. } if layout.relic_tiles.contains(rect))
            })
            .count()
    }

    #[test]
    fn bare_build_has_name_and_six_empty_tiles() {
        let theme = CardTheme::default();
        let build = CharacterBuild::named(1, "Acheron");
        let scene = compose(&build, &theme);

        assert!(scene.texts().any(|t| t == "Acheron"));
        assert_eq!(relic_tile_outlines(&scene, &theme), 6);
        assert!(scene
            .images()
            .all(|(key, _)| !matches!(key, AssetKey::Relic { .. })));
        // nine stat rows, all missing
        assert_eq!(scene.texts().filter(|t| *t == "-").count(), 9 + 2);
    }

    #[test]
    fn stat_rows_are_fixed_and_ordered() {
        let theme = CardTheme::default();
        let mut build = CharacterBuild::named(1, "Acheron");
        build.stats.set(StatKey::CritRate, 67.2);
        build.stats.set(StatKey::Atk, 3456.9);
        build.stats.add_extra("Lightning DMG Boost", 38.8);
        let scene = compose(&build, &theme);

        let texts: Vec<&str> = scene.texts().collect();
        let labels: Vec<usize> = StatKey::ALL
            .iter()
            .map(|key| texts.iter().position(|t| *t == key.label()).unwrap())
            .collect();
        assert!(labels.windows(2).all(|w| w[0] < w[1]));
        assert!(texts.contains(&"67.2%"));
        assert!(texts.contains(&"3456"));
        assert!(!texts.iter().any(|t| t.contains("Lightning")));
    }

    #[test]
    fn occupied_tile_shows_badge_main_sub_and_score() {
        let theme = CardTheme::default();
        let mut build = CharacterBuild::named(1, "Seele");
        build.relics = vec![relic(1), relic(4)];
        let scene = compose(&build, &theme);
        let texts: Vec<&str> = scene.texts().collect();

        assert_eq!(texts.iter().filter(|t| **t == "+15").count(), 2);
        assert_eq!(texts.iter().filter(|t| **t == "7.3%").count(), 2);
        assert!(texts.contains(&"705"));
        assert!(texts.contains(&"CR"));
        assert_eq!(texts.iter().filter(|t| **t == "Score 42.0").count(), 2);
        assert_eq!(
            scene
                .images()
                .filter(|(key, _)| matches!(key, AssetKey::Relic { .. }))
                .count(),
            2
        );
        // every tile still gets its border
        assert_eq!(relic_tile_outlines(&scene, &theme), 6);
    }

    #[test]
    fn missing_tags_do_not_shift_layout() {
        let theme = CardTheme::default();
        let mut with_tags = CharacterBuild::named(1, "Kafka");
        with_tags.element = Some("Lightning".to_string());
        with_tags.path = Some("Nihility".to_string());
        let mut path_only = with_tags.clone();
        path_only.element = None;

        let path_rect = |scene: &CardScene| {
            scene
                .images()
                .find(|(key, _)| matches!(key, AssetKey::Path(_)))
                .map(|(_, rect)| *rect)
        };
        let a = compose(&with_tags, &theme);
        let b = compose(&path_only, &theme);
        assert_eq!(path_rect(&a), path_rect(&b));
        assert!(!b.images().any(|(key, _)| matches!(key, AssetKey::Element(_))));
    }

    #[test]
    fn uid_strip_and_light_cone_block() {
        let theme = CardTheme::default();
        let mut build = CharacterBuild::named(800123456, "Acheron");
        build.light_cone = LightCone {
            id: 23024,
            name: Some("Along the Passing Shore".to_string()),
            rarity: Some(5),
            level: 80,
            superimpose: 1,
            base_stats: Default::default(),
        };
        let scene = compose(&build, &theme);
        let texts: Vec<&str> = scene.texts().collect();
        assert!(texts.contains(&"UID 800123456"));
        assert!(texts.contains(&"Lv.80 S1"));
        assert!(scene
            .images()
            .any(|(key, _)| *key == AssetKey::LightCone(23024)));
    }

    #[test]
    fn relic_without_main_value_shows_dash() {
        let theme = CardTheme::default();
        let mut piece = relic(2);
        piece.main_value = None;
        let mut build = CharacterBuild::named(1, "Seele");
        build.relics = vec![piece];
        let texts: Vec<String> = compose(&build, &theme).texts().map(str::to_string).collect();

        assert!(texts.iter().any(|t| t == "HP"));
        assert!(!texts.iter().any(|t| t == "0"));
        // nine stat rows, the light cone name and level, and the main value
        assert_eq!(texts.iter().filter(|t| *t == "-").count(), 9 + 2 + 1);
    }

    #[test]
    fn cyrillic_names_are_laid_out_and_drawn() {
        let theme = CardTheme::default();
        let resolver = crate::assets::AssetResolver::placeholders_only();
        let mut piece = relic(1);
        piece.set_name = Some("Странник".to_string());
        let mut build = CharacterBuild::named(800123456, "Ахерон");
        build.relics = vec![piece];

        let scene = compose(&build, &theme);
        assert!(scene.texts().any(|t| t == "Ахерон"));
        assert!(scene.texts().any(|t| t == "Странник"));

        let mut other = build.clone();
        other.name = "ЖЖЖЖЖЖ".to_string();
        assert_ne!(
            crate::render::render(&build, &theme, &resolver),
            crate::render::render(&other, &theme, &resolver)
        );
    }
}
