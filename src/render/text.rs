//! Card text metrics and rasterization.
//!
//! Text is drawn with DejaVu Sans, embedded in the binary, so Latin and
//! Cyrillic names render the same on every machine. Characters the font
//! lacks draw as its `.notdef` box. `scale` is an integer size step:
//! one step is a line height of [`PX_PER_SCALE`] pixels.

use std::sync::OnceLock;

use ab_glyph::{point, Font, FontRef, GlyphId, PxScale, ScaleFont};
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

pub const PX_PER_SCALE: f32 = 10.0;

const FONT_DATA: &[u8] = include_bytes!("../../fonts/DejaVuSans.ttf");
const ELLIPSIS: &str = "..";

/// The embedded card font, parsed once.
pub fn font() -> Option<&'static FontRef<'static>> {
    static FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();
    FONT.get_or_init(|| match FontRef::try_from_slice(FONT_DATA) {
        Ok(font) => Some(font),
        Err(err) => {
            warn!(error = %err, "Embedded card font is unreadable; text will not be drawn");
            None
        }
    })
    .as_ref()
}

fn px_scale(scale: u32) -> PxScale {
    PxScale::from(PX_PER_SCALE * scale as f32)
}

/// Glyph ids with their caret offsets, plus the total advance.
fn layout_glyphs(font: &FontRef<'static>, text: &str, scale: u32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(px_scale(scale));
    let mut glyphs = Vec::with_capacity(text.len());
    let mut caret = 0.0f32;
    let mut previous: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push((id, caret));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }
    (glyphs, caret)
}

pub fn glyph_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Advance width of `text` in whole pixels.
pub fn text_width(text: &str, scale: u32) -> u32 {
    let Some(font) = font() else {
        return 0;
    };
    let (_, advance) = layout_glyphs(font, text, scale);
    advance.max(0.0).ceil() as u32
}

pub fn text_height(scale: u32) -> u32 {
    (PX_PER_SCALE * scale as f32).ceil() as u32
}

/// Anti-aliased coverage of `text` at `scale` as `(dx, dy, alpha)` offsets
/// from its top-left corner. Offsets can be slightly negative where a glyph
/// overhangs its origin.
pub fn glyph_coverage(text: &str, scale: u32) -> Vec<(i32, i32, u8)> {
    let Some(font) = font() else {
        return Vec::new();
    };
    let ascent = font.as_scaled(px_scale(scale)).ascent();
    let (glyphs, _) = layout_glyphs(font, text, scale);

    let mut pixels = Vec::new();
    for (id, caret) in glyphs {
        let glyph = id.with_scale_and_position(px_scale(scale), point(caret, ascent));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        let (left, top) = (bounds.min.x as i32, bounds.min.y as i32);
        outlined.draw(|gx, gy, coverage| {
            let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            if alpha > 0 {
                pixels.push((left + gx as i32, top + gy as i32, alpha));
            }
        });
    }
    pixels
}

/// Largest scale in `min_scale..=max_scale` at which `text` fits within
/// `max_width`; at the minimum scale the text is cut on a grapheme boundary
/// and ends with `..`.
pub fn fit_text(text: &str, max_width: u32, max_scale: u32, min_scale: u32) -> (String, u32) {
    let min_scale = min_scale.max(1);
    let max_scale = max_scale.max(min_scale);
    for scale in (min_scale..=max_scale).rev() {
        if text_width(text, scale) <= max_width {
            return (text.to_string(), scale);
        }
    }

    let graphemes: Vec<&str> = text.graphemes(true).collect();
    let mut keep = graphemes.len();
    while keep > 0 {
        keep -= 1;
        let candidate = format!("{}{}", graphemes[..keep].concat(), ELLIPSIS);
        if text_width(&candidate, min_scale) <= max_width {
            return (candidate, min_scale);
        }
    }
    (String::new(), min_scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_font_covers_latin_and_cyrillic() {
        let font = font().expect("embedded font parses");
        for ch in ['A', 'z', '%', 'А', 'х', 'Ж', 'ё'] {
            assert_ne!(font.glyph_id(ch).0, 0, "no glyph for {ch:?}");
        }
    }

    #[test]
    fn distinct_cyrillic_names_draw_differently() {
        let acheron = glyph_coverage("Ахерон", 2);
        assert!(!acheron.is_empty());
        assert_ne!(acheron, glyph_coverage("ЖЖЖЖЖЖ", 2));
        assert_ne!(glyph_coverage("Зеле", 1), glyph_coverage("Цзинлю", 1));
    }

    #[test]
    fn width_grows_with_text_and_scale() {
        assert_eq!(text_width("", 2), 0);
        assert!(text_width("7.3%", 2) > text_width("7.3%", 1));
        assert!(text_width("Acheron", 1) > text_width("Ache", 1));
        assert!(text_width("Ахерон", 2) > 0);
    }

    #[test]
    fn blank_text_has_no_coverage() {
        assert!(glyph_coverage("", 2).is_empty());
        assert!(glyph_coverage("   ", 2).is_empty());
        assert!(text_width("   ", 2) > 0);
    }

    #[test]
    fn fit_prefers_largest_scale_then_truncates() {
        let at_three = text_width("Acheron", 3);
        assert_eq!(fit_text("Acheron", at_three, 3, 2), ("Acheron".to_string(), 3));
        assert_eq!(fit_text("Acheron", at_three - 1, 3, 2), ("Acheron".to_string(), 2));

        let (cut, scale) = fit_text("Along the Passing Shore", 60, 2, 1);
        assert_eq!(scale, 1);
        assert!(cut.ends_with(".."));
        assert!(text_width(&cut, 1) <= 60);

        let (cut, _) = fit_text("Пассажир Странствующего Облака", 80, 1, 1);
        assert!(cut.starts_with("Пасс"));
        assert!(cut.ends_with(".."));

        assert_eq!(fit_text("abc", 0, 2, 1), (String::new(), 1));
    }
}
