//! The tile store boundary: color presets, icons, layout presets and renders.
//!
//! [`TileStore`] is what the editor consumes. `HttpStore` (feature `http`)
//! talks to the tile service over HTTP; [`MemoryStore`] keeps everything in
//! process and renders tiles with this crate's own projector, which makes it a
//! complete offline backend and the default for tests.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::assets::{self, IconImage};
use crate::model::{ColorHex, EditorState, IconRef};
use crate::preset::{self, LayoutParams, LayoutPreset};
use crate::rendering::font::Typeface;
use crate::rendering::projector::{Projector, TextOverflow};
use crate::{Error, Result};

/// Side of the PNG preview generated for uploaded icons.
pub const PREVIEW_SIZE: u32 = 256;
/// Number of renders returned by the history listing.
pub const HISTORY_LIMIT: usize = 50;

/// Color presets seeded into a fresh store.
pub const COLOR_PRESETS: &[(&str, &str)] = &[
    ("AXE Green", "#4ccd4f"),
    ("AXE Azure Blue", "#549fe9"),
    ("AXE Indigo Blue", "#6870ef"),
    ("AXE Ultra Violet", "#9051e4"),
    ("AXE Berry Red", "#e74382"),
    ("AXE Coral Red", "#e94a54"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Option<String>,
    pub preview_url: String,
}

impl IconRecord {
    pub fn to_ref(&self) -> IconRef {
        IconRef {
            id: self.id.clone(),
            name: self.name.clone(),
            preview_url: self.preview_url.clone(),
        }
    }
}

/// Icon listing filter. Both terms match case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconQuery {
    pub query: Option<String>,
    pub tag: Option<String>,
}

impl IconQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, record: &IconRecord) -> bool {
        let contains = |haystack: &str, needle: &Option<String>| match needle {
            Some(n) if !n.is_empty() => haystack.to_lowercase().contains(&n.to_lowercase()),
            _ => true,
        };
        contains(&record.name, &self.query)
            && contains(record.tags.as_deref().unwrap_or(""), &self.tag)
    }
}

/// An icon file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconUpload {
    pub file_name: String,
    pub name: String,
    pub tags: Option<String>,
    pub bytes: Vec<u8>,
}

/// Everything the renderer needs to reproduce a tile, snapshotted at request time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub name: String,
    pub icon_id: Option<String>,
    pub color_hex: String,
    pub text: String,
    pub layout_params: LayoutParams,
}

impl RenderRequest {
    pub fn from_state(name: &str, state: &EditorState) -> Self {
        Self {
            name: name.to_string(),
            icon_id: state.selected_icon().map(|i| i.id.clone()),
            color_hex: state.selected_color().to_string(),
            text: state.text().to_string(),
            layout_params: preset::to_document(state),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderReceipt {
    #[serde(default)]
    pub render_id: String,
    pub download_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl RenderReceipt {
    /// The download URL with `download=1`, which asks for an attachment.
    pub fn download_link(&self) -> String {
        with_download_flag(&self.download_url)
    }
}

pub(crate) fn with_download_flag(url: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}download=1", url, sep)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRecord {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color_hex: String,
    #[serde(default)]
    pub icon_id: Option<String>,
    #[serde(default)]
    pub layout_params: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: String,
    pub download_url: String,
}

/// Storage and rendering collaborator of the editor.
pub trait TileStore: Send + Sync {
    fn list_colors(&self) -> Result<Vec<ColorPreset>>;

    /// Icons, newest first, filtered by `query`.
    fn list_icons(&self, query: &IconQuery) -> Result<Vec<IconRecord>>;

    /// Store an icon and return its id.
    fn upload_icon(&self, upload: &IconUpload) -> Result<String>;

    fn delete_icon(&self, id: &str) -> Result<()>;

    /// Layout presets, newest first.
    fn list_presets(&self) -> Result<Vec<LayoutPreset>>;

    /// Store a preset and return its id.
    fn create_preset(&self, name: &str, params: &LayoutParams) -> Result<String>;

    fn update_preset(&self, id: &str, name: &str, params: &LayoutParams) -> Result<()>;

    fn delete_preset(&self, id: &str) -> Result<()>;

    /// Render a tile and keep it in the history.
    fn render(&self, request: &RenderRequest) -> Result<RenderReceipt>;

    /// Most recent renders, newest first.
    fn list_renders(&self) -> Result<Vec<RenderRecord>>;

    /// Bytes behind an asset locator (preview URL, download URL or `data:` URL).
    fn fetch_asset(&self, locator: &str) -> Result<Vec<u8>>;
}

impl<T: TileStore + ?Sized> TileStore for Arc<T> {
    fn list_colors(&self) -> Result<Vec<ColorPreset>> {
        (**self).list_colors()
    }
    fn list_icons(&self, query: &IconQuery) -> Result<Vec<IconRecord>> {
        (**self).list_icons(query)
    }
    fn upload_icon(&self, upload: &IconUpload) -> Result<String> {
        (**self).upload_icon(upload)
    }
    fn delete_icon(&self, id: &str) -> Result<()> {
        (**self).delete_icon(id)
    }
    fn list_presets(&self) -> Result<Vec<LayoutPreset>> {
        (**self).list_presets()
    }
    fn create_preset(&self, name: &str, params: &LayoutParams) -> Result<String> {
        (**self).create_preset(name, params)
    }
    fn update_preset(&self, id: &str, name: &str, params: &LayoutParams) -> Result<()> {
        (**self).update_preset(id, name, params)
    }
    fn delete_preset(&self, id: &str) -> Result<()> {
        (**self).delete_preset(id)
    }
    fn render(&self, request: &RenderRequest) -> Result<RenderReceipt> {
        (**self).render(request)
    }
    fn list_renders(&self) -> Result<Vec<RenderRecord>> {
        (**self).list_renders()
    }
    fn fetch_asset(&self, locator: &str) -> Result<Vec<u8>> {
        (**self).fetch_asset(locator)
    }
}

struct StoredIcon {
    record: IconRecord,
    bytes: Vec<u8>,
    preview_png: Vec<u8>,
}

struct StoredRender {
    record: RenderRecord,
    png: Vec<u8>,
}

struct Inner {
    colors: Vec<ColorPreset>,
    icons: Vec<StoredIcon>,
    presets: Vec<LayoutPreset>,
    renders: Vec<StoredRender>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// In-process tile store with the tile service's semantics.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    projector: Projector,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store seeded with the color presets and the Default layout, rendering
    /// with the built-in typeface.
    pub fn new() -> Self {
        Self::with_projector(Projector::new(Typeface::builtin(), TextOverflow::Ellipsis))
    }

    pub fn with_projector(projector: Projector) -> Self {
        let colors = COLOR_PRESETS
            .iter()
            .enumerate()
            .map(|(i, (name, hex))| ColorPreset {
                id: Some(i as i64 + 1),
                name: name.to_string(),
                hex: hex.to_string(),
            })
            .collect();
        let mut inner = Inner {
            colors,
            icons: Vec::new(),
            presets: Vec::new(),
            renders: Vec::new(),
            next_id: 0,
        };
        let default = LayoutParams::default();
        let id = inner.next_id("preset");
        inner.presets.push(LayoutPreset {
            id,
            name: default.name.clone(),
            params: default,
        });
        Self {
            inner: Mutex::new(inner),
            projector,
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// PNG bytes of a stored render.
    pub fn render_png(&self, render_id: &str) -> Result<Vec<u8>> {
        self.inner()
            .renders
            .iter()
            .find(|r| r.record.id == render_id)
            .map(|r| r.png.clone())
            .ok_or_else(|| Error::NotFound("Not found".into()))
    }

    fn icon_image(&self, icon_id: &str) -> Option<IconImage> {
        let bytes = self
            .inner()
            .icons
            .iter()
            .find(|i| i.record.id == icon_id)
            .map(|i| i.bytes.clone())?;
        match IconImage::decode(&bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                log::warn!("icon {} failed to decode, rendering without it: {}", icon_id, e);
                None
            }
        }
    }
}

fn timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_default()
}

fn path_id<'a>(locator: &'a str, prefix: &str, suffix: &str) -> Option<&'a str> {
    let path = locator.split('?').next().unwrap_or(locator);
    path.strip_prefix(prefix)?.strip_suffix(suffix)
}

impl TileStore for MemoryStore {
    fn list_colors(&self) -> Result<Vec<ColorPreset>> {
        Ok(self.inner().colors.clone())
    }

    fn list_icons(&self, query: &IconQuery) -> Result<Vec<IconRecord>> {
        Ok(self
            .inner()
            .icons
            .iter()
            .map(|i| &i.record)
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }

    fn upload_icon(&self, upload: &IconUpload) -> Result<String> {
        if upload.bytes.is_empty() || upload.name.is_empty() {
            return Err(Error::ValidationError("Missing file or name".into()));
        }
        let is_png = upload.file_name.to_lowercase().ends_with(".png");
        if !is_png {
            return Err(Error::ValidationError("Only PNG supported".into()));
        }
        let image = IconImage::decode(&upload.bytes)?;
        let preview = image::DynamicImage::ImageRgba8(image.resized(PREVIEW_SIZE));
        let mut preview_png = std::io::Cursor::new(Vec::new());
        preview
            .write_to(&mut preview_png, image::ImageOutputFormat::Png)
            .map_err(|e| Error::RenderError(format!("preview encoding failed: {}", e)))?;

        let mut inner = self.inner();
        let id = inner.next_id("icon");
        let record = IconRecord {
            id: id.clone(),
            name: upload.name.clone(),
            tags: upload.tags.clone(),
            preview_url: format!("/api/icons/{}/preview", id),
        };
        inner.icons.insert(
            0,
            StoredIcon {
                record,
                bytes: upload.bytes.clone(),
                preview_png: preview_png.into_inner(),
            },
        );
        log::info!("stored icon '{}' as {}", upload.name, id);
        Ok(id)
    }

    fn delete_icon(&self, id: &str) -> Result<()> {
        let mut inner = self.inner();
        let before = inner.icons.len();
        inner.icons.retain(|i| i.record.id != id);
        if inner.icons.len() == before {
            return Err(Error::NotFound("Not found".into()));
        }
        Ok(())
    }

    fn list_presets(&self) -> Result<Vec<LayoutPreset>> {
        Ok(self.inner().presets.clone())
    }

    fn create_preset(&self, name: &str, params: &LayoutParams) -> Result<String> {
        if name.is_empty() {
            return Err(Error::ValidationError("Missing name or params".into()));
        }
        let mut inner = self.inner();
        let id = inner.next_id("preset");
        inner.presets.insert(
            0,
            LayoutPreset {
                id: id.clone(),
                name: name.to_string(),
                params: params.clone(),
            },
        );
        Ok(id)
    }

    fn update_preset(&self, id: &str, name: &str, params: &LayoutParams) -> Result<()> {
        if name.is_empty() {
            return Err(Error::ValidationError("Missing name or params".into()));
        }
        if let Some(p) = self.inner().presets.iter_mut().find(|p| p.id == id) {
            p.name = name.to_string();
            p.params = params.clone();
        }
        Ok(())
    }

    fn delete_preset(&self, id: &str) -> Result<()> {
        self.inner().presets.retain(|p| p.id != id);
        Ok(())
    }

    fn render(&self, request: &RenderRequest) -> Result<RenderReceipt> {
        if request.color_hex.is_empty() {
            return Err(Error::ValidationError("Missing color".into()));
        }
        let color = ColorHex::parse(&request.color_hex)?;

        let mut state = EditorState::new();
        preset::apply_document(&request.layout_params, &mut state)?;
        state.set_selected_color(color);
        state.set_text(request.text.clone());

        let icon = match &request.icon_id {
            Some(id) => {
                let record = self
                    .inner()
                    .icons
                    .iter()
                    .find(|i| &i.record.id == id)
                    .map(|i| i.record.to_ref());
                state.set_selected_icon(record);
                self.icon_image(id)
            }
            None => None,
        };

        let surface = self.projector.render(&state, icon.as_ref());
        let png = surface.encode_png()?;

        let mut inner = self.inner();
        let id = inner.next_id("render");
        let download_url = format!("/api/renders/{}/download", id);
        let record = RenderRecord {
            id: id.clone(),
            name: request.name.clone(),
            color_hex: request.color_hex.clone(),
            icon_id: request.icon_id.clone(),
            layout_params: Some(serde_json::json!({
                "layout": request.layout_params,
                "text": request.text,
            })),
            created_at: timestamp(),
            download_url: download_url.clone(),
        };
        inner.renders.insert(0, StoredRender { record, png });
        log::info!("rendered '{}' as {} ({})", request.name, id, surface.digest());
        Ok(RenderReceipt {
            render_id: id,
            download_url: download_url.clone(),
            thumbnail_url: Some(download_url),
        })
    }

    fn list_renders(&self) -> Result<Vec<RenderRecord>> {
        Ok(self
            .inner()
            .renders
            .iter()
            .take(HISTORY_LIMIT)
            .map(|r| r.record.clone())
            .collect())
    }

    fn fetch_asset(&self, locator: &str) -> Result<Vec<u8>> {
        if let Some(decoded) = assets::decode_data_url(locator) {
            return decoded;
        }
        if let Some(id) = path_id(locator, "/api/icons/", "/preview") {
            return self
                .inner()
                .icons
                .iter()
                .find(|i| i.record.id == id)
                .map(|i| i.preview_png.clone())
                .ok_or_else(|| Error::NotFound("Not found".into()));
        }
        if let Some(id) = path_id(locator, "/api/renders/", "/download") {
            return self.render_png(id);
        }
        Err(Error::NotFound(format!("Unknown asset locator {}", locator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::png_fixture;

    fn upload(name: &str, tags: &str) -> IconUpload {
        IconUpload {
            file_name: "icon.png".into(),
            name: name.into(),
            tags: Some(tags.into()),
            bytes: png_fixture(64, 64, [255, 0, 0, 255]),
        }
    }

    #[test]
    fn seeded_with_colors_and_default_layout() {
        let store = MemoryStore::new();
        let colors = store.list_colors().unwrap();
        assert_eq!(colors.len(), 6);
        assert!(colors.iter().all(|c| c.hex.starts_with('#')));
        let presets = store.list_presets().unwrap();
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].name, "Default");
    }

    #[test]
    fn upload_list_preview_and_delete() {
        let store = MemoryStore::new();
        let id = store.upload_icon(&upload("Test Icon", "sample,icon")).unwrap();
        let icons = store.list_icons(&IconQuery::all()).unwrap();
        assert!(icons.iter().any(|i| i.id == id));
        let preview = store.fetch_asset(&icons[0].preview_url).unwrap();
        let decoded = IconImage::decode(&preview).unwrap();
        assert_eq!(decoded.width(), PREVIEW_SIZE);
        store.delete_icon(&id).unwrap();
        assert!(matches!(store.delete_icon(&id), Err(Error::NotFound(_))));
    }

    #[test]
    fn icon_search_filters_by_name_and_tag() {
        let store = MemoryStore::new();
        store.upload_icon(&upload("Door Bell", "home")).unwrap();
        store.upload_icon(&upload("Alarm Clock", "time,home")).unwrap();
        let q = IconQuery {
            query: Some("bell".into()),
            tag: None,
        };
        assert_eq!(store.list_icons(&q).unwrap().len(), 1);
        let q = IconQuery {
            query: None,
            tag: Some("TIME".into()),
        };
        let hits = store.list_icons(&q).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Alarm Clock");
    }

    #[test]
    fn upload_validation_messages() {
        let store = MemoryStore::new();
        let mut bad = upload("", "");
        assert_eq!(
            store.upload_icon(&bad).unwrap_err().user_message(),
            "Missing file or name"
        );
        bad.name = "x".into();
        bad.file_name = "icon.svg".into();
        assert_eq!(
            store.upload_icon(&bad).unwrap_err().user_message(),
            "Only PNG supported"
        );
    }

    #[test]
    fn render_validates_color() {
        let store = MemoryStore::new();
        let mut req = RenderRequest::from_state("Demo", &EditorState::new());
        req.color_hex = String::new();
        assert_eq!(store.render(&req).unwrap_err().user_message(), "Missing color");
        req.color_hex = "123456".into();
        assert_eq!(store.render(&req).unwrap_err().user_message(), "Invalid color hex");
    }

    #[test]
    fn render_happy_path_is_downloadable() {
        let store = MemoryStore::new();
        let req = RenderRequest::from_state("Demo", &EditorState::new());
        let receipt = store.render(&req).unwrap();
        let png = store.fetch_asset(&receipt.download_link()).unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
        let history = store.list_renders().unwrap();
        assert_eq!(history[0].name, "Demo");
        assert_eq!(history[0].download_url, receipt.download_url);
    }

    #[test]
    fn preset_lifecycle() {
        let store = MemoryStore::new();
        let mut params = LayoutParams::default();
        params.corner_radius_px = 10;
        let id = store.create_preset("Custom", &params).unwrap();
        params.corner_radius_px = 12;
        store.update_preset(&id, "Updated", &params).unwrap();
        let listed = store.list_presets().unwrap();
        assert_eq!(listed[0].name, "Updated");
        assert_eq!(listed[0].params.corner_radius_px, 12);
        store.delete_preset(&id).unwrap();
        assert!(store.list_presets().unwrap().iter().all(|p| p.id != id));
        assert_eq!(
            store.create_preset("", &params).unwrap_err().user_message(),
            "Missing name or params"
        );
    }

    #[test]
    fn download_flag_respects_existing_query() {
        assert_eq!(with_download_flag("/r/1"), "/r/1?download=1");
        assert_eq!(with_download_flag("/r/1?v=2"), "/r/1?v=2&download=1");
    }
}
