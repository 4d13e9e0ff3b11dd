//! Projects editor state onto pixels.
//!
//! The projector owns the typeface and the text overflow policy. It reads the
//! editor state and never writes to it.

use crate::assets::IconImage;
use crate::model::EditorState;
use crate::rendering::font::Typeface;
use crate::rendering::layout::{self, Rect, TextBox};
use crate::rendering::paint::PaintCommand;
use crate::rendering::raster::{self, Resources};
use crate::rendering::Surface;
use crate::{EditorConfig, Result};

const TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];

pub use crate::rendering::layout::TextOverflow;

#[derive(Debug, Clone, Default)]
pub struct Projector {
    typeface: Typeface,
    overflow: TextOverflow,
}

impl Projector {
    pub fn new(typeface: Typeface, overflow: TextOverflow) -> Self {
        Self { typeface, overflow }
    }

    pub fn from_config(config: &EditorConfig) -> Result<Self> {
        Ok(Self::new(Typeface::load(&config.fonts)?, config.text_overflow))
    }

    pub fn typeface(&self) -> &Typeface {
        &self.typeface
    }

    pub fn overflow(&self) -> TextOverflow {
        self.overflow
    }

    /// The text box as this projector draws it. Hit-testing uses the same box.
    pub fn text_box(&self, state: &EditorState) -> TextBox {
        layout::text_box(state, &self.typeface, self.overflow)
    }

    /// Build the display list for `state`.
    ///
    /// The icon is only painted when one is selected and its image is decoded;
    /// an undecodable icon renders the tile without it.
    pub fn display_list(&self, state: &EditorState, icon: Option<&IconImage>) -> Vec<PaintCommand> {
        let style = state.layout_style();
        let mut cmds = vec![
            PaintCommand::Clear,
            PaintCommand::FillRoundedRect {
                rect: Rect::tile(),
                radius: style.corner_radius_px,
                rgba: state.selected_color().rgba(),
            },
        ];

        if state.selected_icon().is_some() {
            if icon.is_some() {
                cmds.push(PaintCommand::Icon {
                    rect: layout::icon_rect(state),
                });
            } else {
                log::warn!("selected icon has no decoded image, rendering without it");
            }
        }

        if !state.text().is_empty() {
            let tb = self.text_box(state);
            cmds.push(PaintCommand::Text {
                x: tb.bounds.left.floor() as i32,
                y: tb.bounds.top.floor() as i32,
                text: tb.text,
                size: state.text_size(),
                weight: style.font_weight,
                rgba: TEXT_COLOR,
            });
        }
        cmds
    }

    /// Repaint `surface` from scratch for `state`.
    pub fn render_into(&self, surface: &mut Surface, state: &EditorState, icon: Option<&IconImage>) {
        let cmds = self.display_list(state, icon);
        raster::execute(
            surface,
            &cmds,
            &Resources {
                typeface: &self.typeface,
                icon,
            },
        );
    }

    pub fn render(&self, state: &EditorState, icon: Option<&IconImage>) -> Surface {
        let mut surface = Surface::tile();
        self.render_into(&mut surface, state, icon);
        surface
    }
}
