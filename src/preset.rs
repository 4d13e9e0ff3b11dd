//! Layout presets and the canonical layout document.
//!
//! A layout document captures geometry and text style only. Content (text,
//! color, icon) is never part of it, so one preset can be reused across
//! different tiles. The mapping between [`EditorState`] and [`LayoutParams`]
//! is lossless for every geometric field.

use serde::{Deserialize, Serialize};

use crate::model::{
    self, EditorState, FontWeight, LayoutStyle, Point, TextAlign, DEFAULT_CORNER_RADIUS,
    DEFAULT_ICON_POSITION, DEFAULT_ICON_SCALE, DEFAULT_LAYOUT_NAME, DEFAULT_TEXT_POSITION,
    DEFAULT_TEXT_SIZE,
};
use crate::store::TileStore;
use crate::{Error, Result};

/// The canonical layout document shared by the editor and the tile renderer.
///
/// Every field is optional on input; missing fields take the Default layout values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub name: String,
    pub corner_radius_px: u32,
    pub icon: IconParams,
    pub text: TextParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconParams {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextParams {
    pub x: f64,
    pub y: f64,
    pub font_size: u32,
    pub font_weight: FontWeight,
    pub align: TextAlign,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            name: DEFAULT_LAYOUT_NAME.to_string(),
            corner_radius_px: DEFAULT_CORNER_RADIUS,
            icon: IconParams::default(),
            text: TextParams::default(),
        }
    }
}

impl Default for IconParams {
    fn default() -> Self {
        Self {
            x: DEFAULT_ICON_POSITION.x,
            y: DEFAULT_ICON_POSITION.y,
            scale: DEFAULT_ICON_SCALE,
        }
    }
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            x: DEFAULT_TEXT_POSITION.x,
            y: DEFAULT_TEXT_POSITION.y,
            font_size: DEFAULT_TEXT_SIZE,
            font_weight: FontWeight::default(),
            align: TextAlign::default(),
        }
    }
}

impl LayoutParams {
    /// Reject documents whose scale or font size could not be applied.
    pub fn validate(&self) -> Result<()> {
        model::validate_scale(self.icon.scale)?;
        model::validate_text_size(self.text.font_size)
    }

    pub fn icon_position(&self) -> Point {
        Point::new(self.icon.x, self.icon.y)
    }

    pub fn text_position(&self) -> Point {
        Point::new(self.text.x, self.text.y)
    }

    pub fn style(&self) -> LayoutStyle {
        LayoutStyle {
            name: self.name.clone(),
            corner_radius_px: self.corner_radius_px,
            font_weight: self.text.font_weight,
            align: self.text.align,
        }
    }
}

/// A named, persisted layout document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPreset {
    pub id: String,
    pub name: String,
    pub params: LayoutParams,
}

/// Snapshot the layout of `state` as a canonical document.
pub fn to_document(state: &EditorState) -> LayoutParams {
    let style = state.layout_style();
    let icon = state.icon_position();
    let text = state.text_position();
    LayoutParams {
        name: style.name.clone(),
        corner_radius_px: style.corner_radius_px,
        icon: IconParams {
            x: icon.x,
            y: icon.y,
            scale: state.icon_scale(),
        },
        text: TextParams {
            x: text.x,
            y: text.y,
            font_size: state.text_size(),
            font_weight: style.font_weight,
            align: style.align,
        },
    }
}

/// Apply a layout document to `state`.
///
/// Overwrites icon/text placement, icon scale, text size and the layout style.
/// Text, color and the selected icon are left untouched. The document is
/// validated first, so a rejected document leaves `state` unchanged.
pub fn apply_document(doc: &LayoutParams, state: &mut EditorState) -> Result<()> {
    doc.validate()?;
    state.set_icon_position(doc.icon_position());
    state.set_icon_scale(doc.icon.scale)?;
    state.set_text_position(doc.text_position());
    state.set_text_size(doc.text.font_size)?;
    state.set_layout_style(doc.style());
    log::debug!(
        "applied layout '{}': icon=({}, {}) x{} text=({}, {}) {}px",
        doc.name,
        doc.icon.x,
        doc.icon.y,
        doc.icon.scale,
        doc.text.x,
        doc.text.y,
        doc.text.font_size
    );
    Ok(())
}

fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::ValidationError("Preset name must not be empty".into()));
    }
    Ok(trimmed)
}

/// Persist `doc` under `name`. Empty names are rejected before the store is called.
pub fn save_preset<S: TileStore + ?Sized>(
    store: &S,
    name: &str,
    doc: &LayoutParams,
) -> Result<LayoutPreset> {
    let name = validate_name(name)?;
    let mut params = doc.clone();
    params.name = name.to_string();
    let id = store.create_preset(name, &params)?;
    log::info!("saved layout preset '{}' as {}", name, id);
    Ok(LayoutPreset {
        id,
        name: name.to_string(),
        params,
    })
}

/// Replace the name and document of an existing preset.
pub fn update_preset<S: TileStore + ?Sized>(
    store: &S,
    id: &str,
    name: &str,
    doc: &LayoutParams,
) -> Result<LayoutPreset> {
    let name = validate_name(name)?;
    let mut params = doc.clone();
    params.name = name.to_string();
    store.update_preset(id, name, &params)?;
    log::info!("updated layout preset {} ('{}')", id, name);
    Ok(LayoutPreset {
        id: id.to_string(),
        name: name.to_string(),
        params,
    })
}

pub fn delete_preset<S: TileStore + ?Sized>(store: &S, id: &str) -> Result<()> {
    store.delete_preset(id)?;
    log::info!("deleted layout preset {}", id);
    Ok(())
}
