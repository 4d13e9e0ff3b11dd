/// Software rasterizer for the tile display list
///
/// Pixel coordinates are computed in `i64` and clipped to the surface before
/// anything is sampled, so elements placed far outside the tile cost nothing
/// and never wrap back onto it.

use crate::assets::IconImage;
use crate::model::FontWeight;
use crate::rendering::font::{GlyphBitmap, Typeface};
use crate::rendering::layout::Rect;
use crate::rendering::paint::PaintCommand;
use crate::rendering::{Surface, TILE_SIZE};

/// Largest icon side that is resampled directly. Bigger icons are resampled to
/// this side and magnified by nearest sampling over the visible window.
pub const ICON_RESAMPLE_LIMIT: u32 = 2 * TILE_SIZE;

/// Largest font size glyphs are rasterized at. Bigger text is magnified from
/// bitmaps of this size.
pub const GLYPH_RASTER_LIMIT: f32 = (2 * TILE_SIZE) as f32;

/// What paint commands may refer to besides their own fields.
pub struct Resources<'a> {
    pub typeface: &'a Typeface,
    pub icon: Option<&'a IconImage>,
}

/// Paint `commands` in order onto `surface`.
pub fn execute(surface: &mut Surface, commands: &[PaintCommand], res: &Resources<'_>) {
    for cmd in commands {
        match cmd {
            PaintCommand::Clear => surface.clear(),
            PaintCommand::FillRoundedRect { rect, radius, rgba } => {
                fill_rounded_rect(surface, *rect, *radius, *rgba)
            }
            PaintCommand::Icon { rect } => match res.icon {
                Some(icon) => draw_icon(surface, *rect, icon),
                None => log::debug!("icon command without a decoded icon, skipped"),
            },
            PaintCommand::Text {
                x,
                y,
                text,
                size,
                weight,
                rgba,
            } => draw_text(surface, res.typeface, (*x, *y), text, *size, *weight, *rgba),
        }
    }
}

/// The part of `[origin, origin + len)` that lies inside `[0, limit)`.
fn visible_span(origin: i64, len: i64, limit: u32) -> Option<(i64, i64)> {
    let start = origin.max(0);
    let end = origin.saturating_add(len).min(limit as i64);
    (start < end).then_some((start, end))
}

fn scale_len(n: i64, factor: f64) -> i64 {
    (n as f64 * factor).round() as i64
}

fn draw_text(
    surface: &mut Surface,
    typeface: &Typeface,
    origin: (i32, i32),
    text: &str,
    size: u32,
    weight: FontWeight,
    rgba: [u8; 4],
) {
    let run = typeface.shape(text, size as f32, weight);
    let baseline = origin.1 as i64 + run.ascent.round() as i64;
    let raster_size = run.size.min(GLYPH_RASTER_LIMIT);
    let factor = (run.size / raster_size) as f64;
    for g in &run.glyphs {
        let bitmap = typeface.rasterize(g.ch, raster_size, run.weight);
        if bitmap.width == 0 || bitmap.height == 0 {
            continue;
        }
        let pen = origin.0 as i64 + g.pen_x.round() as i64;
        let gx = pen + scale_len(bitmap.xmin as i64, factor);
        let gy = baseline - scale_len(bitmap.height as i64 + bitmap.ymin as i64, factor);
        let w = scale_len(bitmap.width as i64, factor).max(1);
        let h = scale_len(bitmap.height as i64, factor).max(1);
        blit_coverage(surface, (gx, gy), (w, h), &bitmap, rgba);
    }
}

/// Blend a glyph bitmap stretched to `w`×`h` at `(gx, gy)`, visible part only.
fn blit_coverage(
    surface: &mut Surface,
    (gx, gy): (i64, i64),
    (w, h): (i64, i64),
    bitmap: &GlyphBitmap,
    rgba: [u8; 4],
) {
    let Some((x0, x1)) = visible_span(gx, w, surface.width()) else {
        return;
    };
    let Some((y0, y1)) = visible_span(gy, h, surface.height()) else {
        return;
    };
    let (bw, bh) = (bitmap.width as i64, bitmap.height as i64);
    for py in y0..y1 {
        let sy = ((py - gy) * bh / h) as usize;
        for px in x0..x1 {
            let sx = ((px - gx) * bw / w) as usize;
            let alpha = bitmap.coverage[sy * bitmap.width + sx];
            if alpha > 0 {
                surface.blend(px as i32, py as i32, rgba, alpha);
            }
        }
    }
}

/// Anti-aliased rounded rectangle. Corner coverage is the distance of the pixel
/// center to the corner arc, clamped to one pixel of falloff.
fn fill_rounded_rect(surface: &mut Surface, rect: Rect, radius: u32, rgba: [u8; 4]) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let Some((x0, x1)) = visible_span(rect.x as i64, rect.width as i64, surface.width()) else {
        return;
    };
    let Some((y0, y1)) = visible_span(rect.y as i64, rect.height as i64, surface.height()) else {
        return;
    };
    let r = radius.min(rect.width / 2).min(rect.height / 2) as f32;
    let (left, top) = (rect.x as f32, rect.y as f32);
    let (right, bottom) = (left + rect.width as f32, top + rect.height as f32);

    for py in y0..y1 {
        let cy = py as f32 + 0.5;
        for px in x0..x1 {
            let cx = px as f32 + 0.5;
            let ccx = if cx < left + r {
                Some(left + r)
            } else if cx > right - r {
                Some(right - r)
            } else {
                None
            };
            let ccy = if cy < top + r {
                Some(top + r)
            } else if cy > bottom - r {
                Some(bottom - r)
            } else {
                None
            };
            let coverage = match (ccx, ccy) {
                (Some(ax), Some(ay)) => {
                    let d = ((cx - ax).powi(2) + (cy - ay).powi(2)).sqrt();
                    (r - d + 0.5).clamp(0.0, 1.0)
                }
                _ => 1.0,
            };
            let alpha = (coverage * 255.0).round() as u8;
            if alpha > 0 {
                surface.blend(px as i32, py as i32, rgba, alpha);
            }
        }
    }
}

fn draw_icon(surface: &mut Surface, rect: Rect, icon: &IconImage) {
    let (w, h) = (rect.width as i64, rect.height as i64);
    let Some((x0, x1)) = visible_span(rect.x as i64, w, surface.width()) else {
        return;
    };
    let Some((y0, y1)) = visible_span(rect.y as i64, h, surface.height()) else {
        return;
    };
    let src_side = rect.width.min(ICON_RESAMPLE_LIMIT);
    let scaled = icon.resized(src_side);
    let src = src_side as i64;
    for py in y0..y1 {
        let sy = ((py - rect.y as i64) * src / h) as u32;
        for px in x0..x1 {
            let sx = ((px - rect.x as i64) * src / w) as u32;
            surface.blend(px as i32, py as i32, scaled.get_pixel(sx, sy).0, 255);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> Typeface {
        Typeface::builtin()
    }

    #[test]
    fn rounded_rect_leaves_corners_transparent() {
        let tf = builtin();
        let mut s = Surface::tile();
        let cmds = vec![
            PaintCommand::Clear,
            PaintCommand::FillRoundedRect {
                rect: Rect::tile(),
                radius: 30,
                rgba: [0x68, 0x70, 0xef, 255],
            },
        ];
        execute(&mut s, &cmds, &Resources { typeface: &tf, icon: None });
        assert_eq!(s.pixel(0, 0)[3], 0);
        assert_eq!(s.pixel(449, 449)[3], 0);
        assert_eq!(s.pixel(225, 225), [0x68, 0x70, 0xef, 255]);
        assert_eq!(s.pixel(0, 225), [0x68, 0x70, 0xef, 255]);
        assert_eq!(s.pixel(30, 30), [0x68, 0x70, 0xef, 255]);
    }

    #[test]
    fn zero_radius_fills_everything() {
        let tf = builtin();
        let mut s = Surface::new(10, 10);
        let cmds = vec![PaintCommand::FillRoundedRect {
            rect: Rect { x: 0, y: 0, width: 10, height: 10 },
            radius: 0,
            rgba: [1, 2, 3, 255],
        }];
        execute(&mut s, &cmds, &Resources { typeface: &tf, icon: None });
        assert_eq!(s.pixel(0, 0), [1, 2, 3, 255]);
        assert_eq!(s.pixel(9, 9), [1, 2, 3, 255]);
    }

    #[test]
    fn icon_is_composited_into_its_rect() {
        let tf = builtin();
        let icon = IconImage::from_rgba(image::RgbaImage::from_pixel(
            4,
            4,
            image::Rgba([255, 0, 0, 255]),
        ));
        let mut s = Surface::new(20, 20);
        let cmds = vec![PaintCommand::Icon {
            rect: Rect { x: 5, y: 5, width: 4, height: 4 },
        }];
        execute(&mut s, &cmds, &Resources { typeface: &tf, icon: Some(&icon) });
        assert_eq!(s.pixel(5, 5), [255, 0, 0, 255]);
        assert_eq!(s.pixel(8, 8), [255, 0, 0, 255]);
        assert_eq!(s.pixel(9, 9)[3], 0);
        assert_eq!(s.pixel(4, 4)[3], 0);
    }

    #[test]
    fn icon_command_without_image_is_skipped() {
        let tf = builtin();
        let mut s = Surface::new(8, 8);
        let cmds = vec![PaintCommand::Icon {
            rect: Rect { x: 0, y: 0, width: 8, height: 8 },
        }];
        execute(&mut s, &cmds, &Resources { typeface: &tf, icon: None });
        assert!(s.as_raw().iter().all(|b| *b == 0));
    }

    #[test]
    fn text_ink_stays_inside_its_box() {
        let tf = builtin();
        let mut s = Surface::new(100, 60);
        let cmds = vec![PaintCommand::Text {
            x: 10,
            y: 10,
            text: "ab".into(),
            size: 20,
            weight: FontWeight::Semibold,
            rgba: [255, 255, 255, 255],
        }];
        execute(&mut s, &cmds, &Resources { typeface: &tf, icon: None });
        let width = tf.measure("ab", 20.0, FontWeight::Semibold) as u32;
        for y in 0..60 {
            for x in 0..100 {
                if s.pixel(x, y)[3] > 0 {
                    assert!(x >= 10 && x < 10 + width, "ink at x={}", x);
                    assert!(y >= 10 && y < 30, "ink at y={}", y);
                }
            }
        }
        assert_eq!(s.pixel(15, 20), [255, 255, 255, 255]);
    }

    fn red_icon(side: u32) -> IconImage {
        IconImage::from_rgba(image::RgbaImage::from_pixel(
            side,
            side,
            image::Rgba([255, 0, 0, 255]),
        ))
    }

    #[test]
    fn far_away_elements_are_culled() {
        let tf = builtin();
        let icon = red_icon(4);
        let mut s = Surface::new(20, 20);
        let cmds = vec![
            PaintCommand::Icon {
                rect: Rect { x: i32::MAX, y: 5, width: 200, height: 200 },
            },
            PaintCommand::Text {
                x: i32::MAX,
                y: 2,
                text: "far".into(),
                size: 12,
                weight: FontWeight::Bold,
                rgba: [255, 255, 255, 255],
            },
            PaintCommand::Text {
                x: 2,
                y: i32::MIN,
                text: "far".into(),
                size: 12,
                weight: FontWeight::Bold,
                rgba: [255, 255, 255, 255],
            },
        ];
        execute(&mut s, &cmds, &Resources { typeface: &tf, icon: Some(&icon) });
        assert!(s.as_raw().iter().all(|b| *b == 0));
    }

    #[test]
    fn huge_icon_only_fills_visible_window() {
        let tf = builtin();
        let icon = red_icon(8);
        let mut s = Surface::new(30, 30);
        let side = ICON_RESAMPLE_LIMIT * 50;
        let cmds = vec![PaintCommand::Icon {
            rect: Rect { x: -(side as i32) / 2, y: -(side as i32) / 2, width: side, height: side },
        }];
        execute(&mut s, &cmds, &Resources { typeface: &tf, icon: Some(&icon) });
        for (x, y) in [(0, 0), (29, 29)] {
            let p = s.pixel(x, y);
            assert!(p[0] >= 250 && p[1] <= 5 && p[3] >= 250, "{:?}", p);
        }

        // A side that saturates the pixel range still paints without allocating it.
        let mut s = Surface::new(30, 30);
        let cmds = vec![PaintCommand::Icon {
            rect: Rect { x: i32::MIN, y: i32::MIN, width: u32::MAX, height: u32::MAX },
        }];
        execute(&mut s, &cmds, &Resources { typeface: &tf, icon: Some(&icon) });
        assert!(s.pixel(15, 15)[3] >= 250);
    }

    #[test]
    fn huge_text_is_magnified_from_a_bounded_bitmap() {
        let tf = builtin();
        let mut s = Surface::new(40, 40);
        let cmds = vec![PaintCommand::Text {
            x: -100_000,
            y: -100_000,
            text: "W".into(),
            size: 1_000_000,
            weight: FontWeight::Semibold,
            rgba: [255, 255, 255, 255],
        }];
        execute(&mut s, &cmds, &Resources { typeface: &tf, icon: None });
        assert_eq!(s.pixel(20, 20), [255, 255, 255, 255]);
    }
}
