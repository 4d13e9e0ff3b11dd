//! Kachel tile composer
//!
//! Composes a 450×450 tile from a background color, an optional icon and a line
//! of text. Icon and text can be dragged around, their size adjusted, and the
//! resulting layout saved as a reusable preset.
//!
//! # Features
//!
//! - **Deterministic rendering**: same state and icon bytes give identical pixels
//! - **Layout presets**: geometry documents independent of color, icon and text
//! - **Pointer interaction**: toolkit-independent drag state machine
//! - **Pluggable store**: HTTP backend (feature `http`, default) or in-memory
//!
//! # Example
//!
//! ```
//! use kachel::controller::PointerEvent;
//! use kachel::model::Point;
//! use kachel::rendering::font::Typeface;
//! use kachel::rendering::projector::{Projector, TextOverflow};
//! use kachel::session::EditorSession;
//! use kachel::store::MemoryStore;
//!
//! # fn main() -> kachel::Result<()> {
//! let projector = Projector::new(Typeface::builtin(), TextOverflow::Visible);
//! let mut session = EditorSession::with_projector(projector, MemoryStore::new());
//! session.load()?;
//!
//! // Grab the text and drop it near the top.
//! session.pointer(PointerEvent::Down(Point::new(70.0, 370.0)));
//! session.pointer(PointerEvent::Move(Point::new(40.0, 40.0)));
//! session.pointer(PointerEvent::Up);
//!
//! let frame = session.take_frame().expect("state changed");
//! assert_eq!(frame.surface.width(), 450);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod error;
pub use error::{Error, Result};

pub mod assets;
pub mod controller;
pub mod model;
pub mod preset;
pub mod rendering;
pub mod session;
pub mod store;

// HTTP tile store (reqwest blocking client)
#[cfg(feature = "http")]
pub mod http;

// Async editor facade (worker thread + tokio channels)
pub mod async_api;

pub use async_api::Editor;
pub use model::{EditorState, Point};
pub use preset::{LayoutParams, LayoutPreset};
pub use rendering::font::FontConfig;
pub use rendering::projector::TextOverflow;

/// Configuration for an editor session
///
/// The defaults point at a tile service on the local machine and search the
/// system for DejaVu Sans, falling back to the built-in block face.
///
/// # Examples
///
/// ```
/// let cfg = kachel::EditorConfig::default();
/// assert!(cfg.api_base_url.starts_with("http://"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Base URL of the tile service API
    pub api_base_url: String,
    /// Timeout for each store request in milliseconds
    pub timeout_ms: u64,
    /// User agent sent with store requests
    pub user_agent: String,
    /// Typeface files
    pub fonts: FontConfig,
    /// Handling of text wider than the tile
    pub text_overflow: TextOverflow,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 30000,
            user_agent: format!("kachel/{}", env!("CARGO_PKG_VERSION")),
            fonts: FontConfig::default(),
            text_overflow: TextOverflow::Visible,
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::ConfigError(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.timeout_ms, 30000);
        assert_eq!(config.text_overflow, TextOverflow::Visible);
        assert!(config.fonts.search_system);
    }

    #[test]
    fn test_partial_toml() {
        let config = EditorConfig::from_toml_str(
            r#"
            api_base_url = "http://tiles.local:8080"
            text_overflow = "ellipsis"

            [fonts]
            search_system = false
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "http://tiles.local:8080");
        assert_eq!(config.text_overflow, TextOverflow::Ellipsis);
        assert!(!config.fonts.search_system);
        assert_eq!(config.timeout_ms, 30000);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            EditorConfig::from_toml_str("timeout_ms = \"soon\""),
            Err(Error::ConfigError(_))
        ));
    }
}
