use image::{imageops, Rgba, RgbaImage};

use super::layout::Rect;
use super::scene::{Anchor, CardScene, SceneItem};
use super::text::{glyph_coverage, text_width};
use crate::assets::AssetResolver;

/// Paint a composed scene. Images come from `resolver`, which substitutes
/// placeholders for anything it cannot load, so this never fails.
pub fn rasterize(scene: &CardScene, resolver: &AssetResolver) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(scene.width, scene.height, Rgba([0, 0, 0, 255]));
    for item in &scene.items {
        match item {
            SceneItem::Gradient { rect, top, bottom } => {
                draw_gradient(&mut canvas, *rect, *top, *bottom)
            }
            SceneItem::Fill { rect, color } => fill_rect(&mut canvas, *rect, *color),
            SceneItem::Outline { rect, color, width } => {
                draw_outline(&mut canvas, *rect, *color, *width)
            }
            SceneItem::Image { key, rect, fit } => {
                if rect.w == 0 || rect.h == 0 {
                    continue;
                }
                let bitmap = resolver.resolve(key, (rect.w, rect.h), *fit);
                imageops::overlay(&mut canvas, &*bitmap, i64::from(rect.x), i64::from(rect.y));
            }
            SceneItem::Text {
                text,
                x,
                y,
                scale,
                color,
                anchor,
            } => {
                let left = match anchor {
                    Anchor::Left => *x,
                    Anchor::Right => *x - text_width(text, *scale) as i32,
                };
                draw_text(&mut canvas, text, left, *y, *scale, *color);
            }
        }
    }
    canvas
}

/// Source-over blend of `src` onto `dst`, in integer arithmetic.
pub fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let alpha = u32::from(src[3]);
    match alpha {
        0 => dst,
        255 => src,
        _ => {
            let inv = 255 - alpha;
            let mix = |s: u8, d: u8| ((u32::from(s) * alpha + u32::from(d) * inv + 127) / 255) as u8;
            let out_alpha = alpha + (u32::from(dst[3]) * inv + 127) / 255;
            Rgba([
                mix(src[0], dst[0]),
                mix(src[1], dst[1]),
                mix(src[2], dst[2]),
                out_alpha.min(255) as u8,
            ])
        }
    }
}

fn clip(canvas: &RgbaImage, rect: Rect) -> Option<(u32, u32, u32, u32)> {
    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = rect.right().min(canvas.width() as i32);
    let y1 = rect.bottom().min(canvas.height() as i32);
    (x0 < x1 && y0 < y1).then_some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

pub fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let Some((x0, y0, x1, y1)) = clip(canvas, rect) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = canvas.get_pixel_mut(x, y);
            *pixel = blend(*pixel, color);
        }
    }
}

fn draw_outline(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>, width: u32) {
    let width = width.min(rect.w / 2).min(rect.h / 2);
    if width == 0 {
        return;
    }
    let inner_h = rect.h - 2 * width;
    fill_rect(canvas, Rect::new(rect.x, rect.y, rect.w, width), color);
    fill_rect(
        canvas,
        Rect::new(rect.x, rect.bottom() - width as i32, rect.w, width),
        color,
    );
    fill_rect(
        canvas,
        Rect::new(rect.x, rect.y + width as i32, width, inner_h),
        color,
    );
    fill_rect(
        canvas,
        Rect::new(rect.right() - width as i32, rect.y + width as i32, width, inner_h),
        color,
    );
}

fn draw_gradient(canvas: &mut RgbaImage, rect: Rect, top: Rgba<u8>, bottom: Rgba<u8>) {
    let span = rect.h.saturating_sub(1).max(1);
    for row in 0..rect.h {
        let t = row.min(span);
        let lerp = |a: u8, b: u8| {
            let (a, b) = (u32::from(a), u32::from(b));
            ((a * (span - t) + b * t + span / 2) / span) as u8
        };
        let color = Rgba([
            lerp(top[0], bottom[0]),
            lerp(top[1], bottom[1]),
            lerp(top[2], bottom[2]),
            lerp(top[3], bottom[3]),
        ]);
        fill_rect(canvas, Rect::new(rect.x, rect.y + row as i32, rect.w, 1), color);
    }
}

fn draw_text(canvas: &mut RgbaImage, text: &str, x: i32, y: i32, scale: u32, color: Rgba<u8>) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    for (dx, dy, coverage) in glyph_coverage(text, scale) {
        let (px, py) = (x + dx, y + dy);
        if px < 0 || py < 0 || px >= width || py >= height {
            continue;
        }
        let alpha = (u32::from(color[3]) * u32::from(coverage) + 127) / 255;
        let pixel = canvas.get_pixel_mut(px as u32, py as u32);
        *pixel = blend(*pixel, Rgba([color[0], color[1], color[2], alpha as u8]));
    }
}
