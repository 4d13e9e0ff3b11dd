//! Editor state: placement, scale, text and color of the tile being composed.
//!
//! This module is pure data. Setters never trigger rendering; callers decide when
//! a new frame is needed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

pub const DEFAULT_COLOR: &str = "#6870ef";
pub const DEFAULT_TEXT: &str = "Alarm";
pub const DEFAULT_ICON_POSITION: Point = Point { x: 300.0, y: 170.0 };
pub const DEFAULT_ICON_SCALE: f64 = 0.45;
pub const DEFAULT_TEXT_POSITION: Point = Point { x: 60.0, y: 360.0 };
pub const DEFAULT_TEXT_SIZE: u32 = 48;
pub const DEFAULT_CORNER_RADIUS: u32 = 30;
pub const DEFAULT_LAYOUT_NAME: &str = "Default";

/// A point in tile coordinates (0..450 on both axes for visible content).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A `#rrggbb` color. Parsing is case-insensitive; the stored form is lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorHex(String);

impl ColorHex {
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| Error::ValidationError("Invalid color hex".into()))?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::ValidationError("Invalid color hex".into()));
        }
        Ok(Self(format!("#{}", digits.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Opaque RGBA channels of this color.
    pub fn rgba(&self) -> [u8; 4] {
        let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or(0);
        [channel(1), channel(3), channel(5), 255]
    }
}

impl Default for ColorHex {
    fn default() -> Self {
        Self(DEFAULT_COLOR.to_string())
    }
}

impl fmt::Display for ColorHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ColorHex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ColorHex {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ColorHex> for String {
    fn from(value: ColorHex) -> Self {
        value.0
    }
}

/// Weak reference to an icon in the store. The editor never owns the asset bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRef {
    pub id: String,
    pub name: String,
    pub preview_url: String,
}

/// The element currently bound to pointer movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragTarget {
    #[default]
    None,
    Icon,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[serde(alias = "normal")]
    Regular,
    Medium,
    #[default]
    Semibold,
    Bold,
}

impl FontWeight {
    /// CSS numeric weight.
    pub fn numeric(self) -> u16 {
        match self {
            FontWeight::Regular => 400,
            FontWeight::Medium => 500,
            FontWeight::Semibold => 600,
            FontWeight::Bold => 700,
        }
    }

    /// Whether the bold face is used for this weight.
    pub fn is_bold(self) -> bool {
        matches!(self, FontWeight::Semibold | FontWeight::Bold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Non-geometric fields of the active layout document.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutStyle {
    pub name: String,
    pub corner_radius_px: u32,
    pub font_weight: FontWeight,
    pub align: TextAlign,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            name: DEFAULT_LAYOUT_NAME.to_string(),
            corner_radius_px: DEFAULT_CORNER_RADIUS,
            font_weight: FontWeight::default(),
            align: TextAlign::default(),
        }
    }
}

/// The single mutable editor state of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    selected_icon: Option<IconRef>,
    selected_color: ColorHex,
    text: String,
    icon_position: Point,
    icon_scale: f64,
    text_position: Point,
    text_size: u32,
    layout_style: LayoutStyle,
    drag_target: DragTarget,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            selected_icon: None,
            selected_color: ColorHex::default(),
            text: DEFAULT_TEXT.to_string(),
            icon_position: DEFAULT_ICON_POSITION,
            icon_scale: DEFAULT_ICON_SCALE,
            text_position: DEFAULT_TEXT_POSITION,
            text_size: DEFAULT_TEXT_SIZE,
            layout_style: LayoutStyle::default(),
            drag_target: DragTarget::None,
        }
    }
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_icon(&self) -> Option<&IconRef> {
        self.selected_icon.as_ref()
    }

    /// Select or clear the icon. Clearing the icon while it is being dragged
    /// releases the drag.
    pub fn set_selected_icon(&mut self, icon: Option<IconRef>) {
        if icon.is_none() && self.drag_target == DragTarget::Icon {
            self.drag_target = DragTarget::None;
        }
        self.selected_icon = icon;
    }

    pub fn selected_color(&self) -> &ColorHex {
        &self.selected_color
    }

    pub fn set_selected_color(&mut self, color: ColorHex) {
        self.selected_color = color;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn icon_position(&self) -> Point {
        self.icon_position
    }

    pub fn set_icon_position(&mut self, position: Point) {
        self.icon_position = position;
    }

    pub fn icon_scale(&self) -> f64 {
        self.icon_scale
    }

    pub fn set_icon_scale(&mut self, scale: f64) -> Result<()> {
        validate_scale(scale)?;
        self.icon_scale = scale;
        Ok(())
    }

    pub fn text_position(&self) -> Point {
        self.text_position
    }

    pub fn set_text_position(&mut self, position: Point) {
        self.text_position = position;
    }

    pub fn text_size(&self) -> u32 {
        self.text_size
    }

    pub fn set_text_size(&mut self, size: u32) -> Result<()> {
        validate_text_size(size)?;
        self.text_size = size;
        Ok(())
    }

    pub fn layout_style(&self) -> &LayoutStyle {
        &self.layout_style
    }

    pub fn set_layout_style(&mut self, style: LayoutStyle) {
        self.layout_style = style;
    }

    pub fn drag_target(&self) -> DragTarget {
        self.drag_target
    }

    /// Bind the pointer to an element. `Icon` is refused while no icon is selected.
    pub fn set_drag_target(&mut self, target: DragTarget) -> Result<()> {
        if target == DragTarget::Icon && self.selected_icon.is_none() {
            return Err(Error::ValidationError(
                "Cannot drag the icon: no icon selected".into(),
            ));
        }
        self.drag_target = target;
        Ok(())
    }
}

pub(crate) fn validate_scale(scale: f64) -> Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(Error::ValidationError(format!(
            "Icon scale must be positive, got {}",
            scale
        )))
    }
}

pub(crate) fn validate_text_size(size: u32) -> Result<()> {
    if size == 0 {
        return Err(Error::ValidationError("Font size must be positive".into()));
    }
    Ok(())
}
