/// Layout boxes of the tile elements.
///
/// Hit-testing and painting both take their geometry from here, so the box a
/// pointer can grab is the box that gets drawn.

use serde::{Deserialize, Serialize};

use crate::model::{EditorState, FontWeight, Point, TextAlign};
use crate::rendering::font::{TextRun, Typeface};
use crate::rendering::TILE_SIZE;

/// Horizontal margin kept free on the right when text is ellipsized.
pub const TEXT_RIGHT_MARGIN: f64 = 40.0;

const ELLIPSIS: char = '\u{2026}';

/// What happens to text wider than the space left of the right margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOverflow {
    /// Draw the whole string, even past the tile edge
    #[default]
    Visible,
    /// Trim and append an ellipsis
    Ellipsis,
}

/// Integer pixel rectangle used by paint commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn tile() -> Self {
        Self {
            x: 0,
            y: 0,
            width: TILE_SIZE,
            height: TILE_SIZE,
        }
    }
}

/// Continuous box in tile coordinates, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

/// Side of the icon square in exact tile units.
pub fn icon_extent(scale: f64) -> f64 {
    TILE_SIZE as f64 * scale
}

/// Side of the icon square in whole pixels, never below one.
pub fn icon_side(scale: f64) -> u32 {
    (icon_extent(scale) as u32).max(1)
}

/// Box the pointer can grab the icon by.
pub fn icon_bounds(state: &EditorState) -> Bounds {
    let c = state.icon_position();
    let half = icon_extent(state.icon_scale()) / 2.0;
    Bounds {
        left: c.x - half,
        top: c.y - half,
        right: c.x + half,
        bottom: c.y + half,
    }
}

/// Pixel square the icon is drawn into, centered on the icon position.
pub fn icon_rect(state: &EditorState) -> Rect {
    let c = state.icon_position();
    let side = icon_side(state.icon_scale());
    let half = side as f64 / 2.0;
    Rect {
        x: (c.x - half).floor() as i32,
        y: (c.y - half).floor() as i32,
        width: side,
        height: side,
    }
}

/// Shaped text with its box in tile coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// The string as drawn, after any overflow trimming
    pub text: String,
    pub run: TextRun,
    pub bounds: Bounds,
}

/// Lay out `text` of the given size and style with its anchor at `anchor`.
///
/// The anchor is the top edge of the box and, depending on `align`, its left
/// edge, horizontal center or right edge.
pub fn layout_text(
    typeface: &Typeface,
    text: &str,
    anchor: Point,
    size: u32,
    weight: FontWeight,
    align: TextAlign,
) -> TextBox {
    let run = typeface.shape(text, size as f32, weight);
    let width = run.width as f64;
    let left = match align {
        TextAlign::Left => anchor.x,
        TextAlign::Center => anchor.x - width / 2.0,
        TextAlign::Right => anchor.x - width,
    };
    TextBox {
        text: text.to_string(),
        run,
        bounds: Bounds {
            left,
            top: anchor.y,
            right: left + width,
            bottom: anchor.y + size as f64,
        },
    }
}

/// The text box of the editor state, trimmed by `overflow` and measured with
/// the typeface the projector draws with.
pub fn text_box(state: &EditorState, typeface: &Typeface, overflow: TextOverflow) -> TextBox {
    let style = state.layout_style();
    let text = match overflow {
        TextOverflow::Visible => state.text().to_string(),
        TextOverflow::Ellipsis => ellipsize(
            typeface,
            state.text(),
            state.text_size(),
            style.font_weight,
            text_width_budget(state.text_position().x),
        ),
    };
    layout_text(
        typeface,
        &text,
        state.text_position(),
        state.text_size(),
        style.font_weight,
        style.align,
    )
}

/// Width available to text anchored at `x` before the right margin.
pub fn text_width_budget(x: f64) -> f64 {
    TILE_SIZE as f64 - x.trunc() - TEXT_RIGHT_MARGIN
}

/// Trim `text` from the end until it fits `max_width` with a trailing ellipsis.
/// Text that already fits is returned unchanged.
pub fn ellipsize(
    typeface: &Typeface,
    text: &str,
    size: u32,
    weight: FontWeight,
    max_width: f64,
) -> String {
    let size = size as f32;
    if typeface.measure(text, size, weight) as f64 <= max_width {
        return text.to_string();
    }
    let mut trimmed: Vec<char> = text.chars().collect();
    while !trimmed.is_empty() {
        let candidate: String = trimmed.iter().chain(std::iter::once(&ELLIPSIS)).collect();
        if typeface.measure(&candidate, size, weight) as f64 <= max_width {
            return candidate;
        }
        trimmed.pop();
    }
    ELLIPSIS.to_string()
}
