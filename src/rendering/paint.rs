/// Display list produced by the projector and consumed by the rasterizer

use crate::model::FontWeight;
use crate::rendering::layout::Rect;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Reset every pixel to transparent.
    Clear,
    /// Fill `rect` clipped to a rounded rectangle with corner `radius`.
    FillRoundedRect {
        rect: Rect,
        radius: u32,
        rgba: [u8; 4],
    },
    /// Draw the icon image resampled into `rect`.
    Icon { rect: Rect },
    /// Draw a single line of text with its top-left corner at (x, y).
    Text {
        x: i32,
        y: i32,
        text: String,
        size: u32,
        weight: FontWeight,
        rgba: [u8; 4],
    },
}

impl PaintCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            PaintCommand::Clear => "clear",
            PaintCommand::FillRoundedRect { .. } => "fill-rounded-rect",
            PaintCommand::Icon { .. } => "icon",
            PaintCommand::Text { .. } => "text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_command_kind() {
        let cmd = PaintCommand::FillRoundedRect {
            rect: Rect::tile(),
            radius: 30,
            rgba: [255, 0, 0, 255],
        };
        assert_eq!(cmd.kind(), "fill-rounded-rect");
        match cmd {
            PaintCommand::FillRoundedRect { rect, .. } => assert_eq!(rect.width, 450),
            _ => panic!("unexpected"),
        }
    }
}
