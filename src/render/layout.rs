use crate::model::MAX_RELICS;
use crate::render::theme::CardGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }
}

/// The three card regions, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLayout {
    pub canvas: Rect,
    pub portrait: Rect,
    pub uid_strip: Rect,
    pub stats: Rect,
    pub relic_area: Rect,
    /// Indexed by `slot_position - 1`; two columns, three rows.
    pub relic_tiles: [Rect; MAX_RELICS],
}

impl CardLayout {
    pub fn compute(geometry: &CardGeometry) -> Self {
        let pad = geometry.padding as i32;
        let gap = geometry.column_gap as i32;
        let content_h = geometry.canvas_height.saturating_sub(2 * geometry.padding);

        let portrait = Rect::new(pad, pad, geometry.portrait_width, content_h);
        let strip_h = geometry.uid_strip_height.min(content_h);
        let uid_strip = Rect::new(
            portrait.x,
            portrait.bottom() - strip_h as i32,
            portrait.w,
            strip_h,
        );
        let stats = Rect::new(portrait.right() + gap, pad, geometry.stats_width, content_h);

        let relic_x = stats.right() + gap;
        let relic_w = (geometry.canvas_width as i32 - pad - relic_x).max(0) as u32;
        let relic_area = Rect::new(relic_x, pad, relic_w, content_h);

        let tile_gap = geometry.relic_gap;
        let tile_w = relic_w.saturating_sub(tile_gap) / 2;
        let tile_h = content_h.saturating_sub(2 * tile_gap) / 3;
        let relic_tiles = std::array::from_fn(|index| {
            let col = (index % 2) as u32;
            let row = (index / 2) as u32;
            Rect::new(
                relic_x + (col * (tile_w + tile_gap)) as i32,
                pad + (row * (tile_h + tile_gap)) as i32,
                tile_w,
                tile_h,
            )
        });

        CardLayout {
            canvas: Rect::new(0, 0, geometry.canvas_width, geometry.canvas_height),
            portrait,
            uid_strip,
            stats,
            relic_area,
            relic_tiles,
        }
    }

    /// Tile for a relic slot (1-6).
    pub fn tile(&self, slot: u8) -> Option<Rect> {
        let index = usize::from(slot).checked_sub(1)?;
        self.relic_tiles.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_regions_are_left_to_right_and_disjoint() {
        let layout = CardLayout::compute(&CardGeometry::default());
        assert!(layout.portrait.right() <= layout.stats.x);
        assert!(layout.stats.right() <= layout.relic_area.x);
        assert!(layout.relic_area.right() <= layout.canvas.right());
        assert_eq!(layout.relic_area, Rect::new(840, 10, 430, 700));
        assert_eq!(layout.uid_strip.bottom(), layout.portrait.bottom());
    }

    #[test]
    fn tiles_form_two_columns_by_three_rows() {
        let layout = CardLayout::compute(&CardGeometry::default());
        let t = &layout.relic_tiles;
        assert_eq!(t[0], Rect::new(840, 10, 210, 226));
        assert_eq!(t[1].x, 1060);
        assert_eq!(t[0].y, t[1].y);
        assert_eq!(t[2].x, t[0].x);
        assert_eq!(t[2].y, 246);
        assert!(t[5].bottom() <= layout.relic_area.bottom());
        assert_eq!(layout.tile(6), Some(t[5]));
        assert_eq!(layout.tile(0), None);
        assert_eq!(layout.tile(7), None);
    }
}
