//! The editor session: the explicitly owned context of one editing session.
//!
//! A session owns the editor state, the interaction controller, the projector,
//! the tile store and the catalogs loaded from it. All mutation goes through
//! here, on one thread. Re-rendering is coalesced: any number of changes mark a
//! single pending frame, and [`EditorSession::take_frame`] paints at most once.

use crate::assets::{self, IconImage};
use crate::controller::{InteractionController, PointerEvent};
use crate::model::{ColorHex, EditorState};
use crate::preset::{self, LayoutPreset};
use crate::rendering::projector::Projector;
use crate::rendering::Surface;
use crate::store::{
    ColorPreset, IconQuery, IconRecord, IconUpload, RenderReceipt, RenderRecord, RenderRequest,
    TileStore,
};
use crate::{EditorConfig, Error, Result};

/// Reference data loaded from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub colors: Vec<ColorPreset>,
    pub icons: Vec<IconRecord>,
    pub presets: Vec<LayoutPreset>,
    pub renders: Vec<RenderRecord>,
}

/// Result of a submitted render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub receipt: RenderReceipt,
    /// Download URL asking for an attachment (`?download=1`)
    pub download_link: String,
}

/// A rendered frame and the number of the state revision it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub revision: u64,
    pub surface: Surface,
}

pub struct EditorSession<S: TileStore> {
    store: S,
    state: EditorState,
    controller: InteractionController,
    projector: Projector,
    catalog: Catalog,
    icon_image: Option<IconImage>,
    revision: u64,
    rendered_revision: Option<u64>,
}

impl<S: TileStore> EditorSession<S> {
    pub fn new(config: &EditorConfig, store: S) -> Result<Self> {
        Ok(Self::with_projector(Projector::from_config(config)?, store))
    }

    pub fn with_projector(projector: Projector, store: S) -> Self {
        Self {
            store,
            state: EditorState::new(),
            controller: InteractionController::new(),
            projector,
            catalog: Catalog::default(),
            icon_image: None,
            revision: 0,
            rendered_revision: None,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn icon_image(&self) -> Option<&IconImage> {
        self.icon_image.as_ref()
    }

    /// Fetch colors, icons, presets and render history, one after another.
    pub fn load(&mut self) -> Result<()> {
        let colors = self.store.list_colors()?;
        let icons = self.store.list_icons(&IconQuery::all())?;
        let presets = self.store.list_presets()?;
        let renders = self.store.list_renders()?;
        log::info!(
            "loaded {} colors, {} icons, {} presets, {} renders",
            colors.len(),
            icons.len(),
            presets.len(),
            renders.len()
        );
        self.catalog = Catalog {
            colors,
            icons,
            presets,
            renders,
        };
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.revision += 1;
    }

    /// True when the state changed since the last rendered frame.
    pub fn is_dirty(&self) -> bool {
        self.rendered_revision != Some(self.revision)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn select_color(&mut self, hex: &str) -> Result<()> {
        let color = ColorHex::parse(hex)?;
        if &color != self.state.selected_color() {
            self.state.set_selected_color(color);
            self.invalidate();
        }
        Ok(())
    }

    /// Select an icon from the catalog and decode its preview.
    ///
    /// A preview that cannot be fetched or decoded keeps the icon selected but
    /// undrawable; the tile renders without it and a warning is logged.
    pub fn select_icon(&mut self, id: &str) -> Result<()> {
        let record = self
            .catalog
            .icons
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::NotFound(format!("icon {}", id)))?;
        let icon = record.to_ref();
        self.icon_image = match assets::load_icon(&self.store, &icon) {
            Ok(img) => Some(img),
            Err(e) => {
                log::warn!("icon {} unavailable, rendering without it: {}", id, e);
                None
            }
        };
        self.state.set_selected_icon(Some(icon));
        self.invalidate();
        Ok(())
    }

    pub fn clear_icon(&mut self) {
        self.state.set_selected_icon(None);
        self.icon_image = None;
        self.invalidate();
    }

    pub fn set_text(&mut self, text: &str) {
        if text != self.state.text() {
            self.state.set_text(text);
            self.invalidate();
        }
    }

    pub fn set_icon_scale(&mut self, scale: f64) -> Result<()> {
        self.state.set_icon_scale(scale)?;
        self.invalidate();
        Ok(())
    }

    pub fn set_text_size(&mut self, size: u32) -> Result<()> {
        self.state.set_text_size(size)?;
        self.invalidate();
        Ok(())
    }

    /// Route a pointer event through the interaction controller.
    /// Returns true when the event changed what the tile shows.
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        let redraw = self
            .controller
            .handle(&mut self.state, &self.projector, event);
        if redraw {
            self.invalidate();
        }
        redraw
    }

    pub fn apply_preset(&mut self, id: &str) -> Result<()> {
        let preset = self
            .catalog
            .presets
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("layout preset {}", id)))?;
        preset::apply_document(&preset.params, &mut self.state)?;
        log::info!("applied layout preset '{}'", preset.name);
        self.invalidate();
        Ok(())
    }

    /// Save the current layout as a new preset and add it to the catalog.
    pub fn save_preset(&mut self, name: &str) -> Result<LayoutPreset> {
        let doc = preset::to_document(&self.state);
        let saved = preset::save_preset(&self.store, name, &doc)?;
        self.catalog.presets.insert(0, saved.clone());
        Ok(saved)
    }

    /// Overwrite an existing preset with the current layout.
    pub fn update_preset(&mut self, id: &str, name: &str) -> Result<LayoutPreset> {
        let doc = preset::to_document(&self.state);
        let updated = preset::update_preset(&self.store, id, name, &doc)?;
        if let Some(p) = self.catalog.presets.iter_mut().find(|p| p.id == id) {
            *p = updated.clone();
        }
        Ok(updated)
    }

    pub fn delete_preset(&mut self, id: &str) -> Result<()> {
        preset::delete_preset(&self.store, id)?;
        self.catalog.presets.retain(|p| p.id != id);
        Ok(())
    }

    /// Upload an icon and refresh the icon catalog.
    pub fn upload_icon(&mut self, upload: &IconUpload) -> Result<String> {
        if upload.name.trim().is_empty() || upload.bytes.is_empty() {
            return Err(Error::ValidationError("Missing file or name".into()));
        }
        let id = self.store.upload_icon(upload)?;
        self.catalog.icons = self.store.list_icons(&IconQuery::all())?;
        Ok(id)
    }

    /// Delete an icon; deselects it first when it is the current one.
    pub fn delete_icon(&mut self, id: &str) -> Result<()> {
        self.store.delete_icon(id)?;
        self.catalog.icons.retain(|i| i.id != id);
        if self.state.selected_icon().map(|i| i.id.as_str()) == Some(id) {
            self.clear_icon();
        }
        Ok(())
    }

    pub fn search_icons(&self, query: &IconQuery) -> Result<Vec<IconRecord>> {
        self.store.list_icons(query)
    }

    /// Send the current tile to the renderer and refresh the history.
    pub fn submit_render(&mut self, name: &str) -> Result<RenderOutcome> {
        let request = RenderRequest::from_state(name, &self.state);
        let receipt = self.store.render(&request)?;
        match self.store.list_renders() {
            Ok(renders) => self.catalog.renders = renders,
            Err(e) => log::warn!("render history refresh failed: {}", e),
        }
        let download_link = receipt.download_link();
        Ok(RenderOutcome {
            receipt,
            download_link,
        })
    }

    /// Paint the current state unconditionally.
    pub fn render_frame(&mut self) -> Frame {
        let surface = self.projector.render(&self.state, self.icon_image.as_ref());
        self.rendered_revision = Some(self.revision);
        Frame {
            revision: self.revision,
            surface,
        }
    }

    /// Paint only if something changed since the last frame.
    pub fn take_frame(&mut self) -> Option<Frame> {
        if self.is_dirty() {
            Some(self.render_frame())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::png_fixture;
    use crate::model::{DragTarget, Point};
    use crate::rendering::font::Typeface;
    use crate::rendering::projector::TextOverflow;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn session() -> EditorSession<Arc<MemoryStore>> {
        let store = Arc::new(MemoryStore::new());
        let mut s = EditorSession::with_projector(
            Projector::new(Typeface::builtin(), TextOverflow::Visible),
            store,
        );
        s.load().unwrap();
        s
    }

    fn upload(s: &mut EditorSession<Arc<MemoryStore>>) -> String {
        s.upload_icon(&IconUpload {
            file_name: "bell.png".into(),
            name: "Bell".into(),
            tags: None,
            bytes: png_fixture(32, 32, [0, 0, 0, 255]),
        })
        .unwrap()
    }

    #[test]
    fn load_fills_catalog() {
        let s = session();
        assert_eq!(s.catalog().colors.len(), 6);
        assert_eq!(s.catalog().presets.len(), 1);
    }

    #[test]
    fn frames_are_coalesced() {
        let mut s = session();
        assert!(s.take_frame().is_some());
        assert!(s.take_frame().is_none());
        s.pointer(PointerEvent::Down(Point::new(65.0, 365.0)));
        for i in 0..10 {
            s.pointer(PointerEvent::Move(Point::new(100.0 + i as f64, 50.0)));
        }
        let frame = s.take_frame().expect("dirty after drag");
        assert_eq!(frame.revision, s.revision());
        assert_eq!(s.state().text_position(), Point::new(109.0, 50.0));
        assert!(s.take_frame().is_none());
    }

    #[test]
    fn select_icon_decodes_preview() {
        let mut s = session();
        let id = upload(&mut s);
        s.select_icon(&id).unwrap();
        assert!(s.icon_image().is_some());
        assert_eq!(s.state().selected_icon().unwrap().id, id);
        s.delete_icon(&id).unwrap();
        assert!(s.state().selected_icon().is_none());
    }

    #[test]
    fn unknown_icon_is_not_found() {
        let mut s = session();
        assert!(matches!(s.select_icon("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn icon_drag_snaps_to_pointer() {
        let mut s = session();
        let id = upload(&mut s);
        s.select_icon(&id).unwrap();
        s.pointer(PointerEvent::Down(Point::new(310.0, 180.0)));
        assert_eq!(s.state().drag_target(), DragTarget::Icon);
        s.pointer(PointerEvent::Move(Point::new(120.0, 130.0)));
        assert_eq!(s.state().icon_position(), Point::new(120.0, 130.0));
        s.pointer(PointerEvent::Up);
        assert_eq!(s.state().drag_target(), DragTarget::None);
    }

    #[test]
    fn save_and_apply_preset() {
        let mut s = session();
        s.set_icon_scale(0.7).unwrap();
        let saved = s.save_preset("Wide").unwrap();
        s.set_icon_scale(0.2).unwrap();
        s.apply_preset(&saved.id).unwrap();
        assert_eq!(s.state().icon_scale(), 0.7);
        assert_eq!(s.catalog().presets[0].name, "Wide");
        assert!(matches!(s.save_preset(""), Err(Error::ValidationError(_))));
    }

    #[test]
    fn submit_render_returns_download_link_and_history() {
        let mut s = session();
        let out = s.submit_render("kachel").unwrap();
        assert!(out.download_link.ends_with("?download=1"));
        assert_eq!(s.catalog().renders.len(), 1);
    }

    #[test]
    fn invalid_color_leaves_state() {
        let mut s = session();
        assert!(s.select_color("blue").is_err());
        assert_eq!(s.state().selected_color().as_str(), "#6870ef");
        s.select_color("#E94A54").unwrap();
        assert_eq!(s.state().selected_color().as_str(), "#e94a54");
    }

    /// A store whose catalog lists one icon with an undecodable preview.
    struct BrokenPreview(MemoryStore);

    impl TileStore for BrokenPreview {
        fn list_colors(&self) -> Result<Vec<ColorPreset>> {
            self.0.list_colors()
        }
        fn list_icons(&self, query: &IconQuery) -> Result<Vec<IconRecord>> {
            let mut icons = self.0.list_icons(query)?;
            icons.push(IconRecord {
                id: "broken".into(),
                name: "Broken".into(),
                tags: None,
                preview_url: "data:,not-an-image".into(),
            });
            Ok(icons)
        }
        fn upload_icon(&self, upload: &IconUpload) -> Result<String> {
            self.0.upload_icon(upload)
        }
        fn delete_icon(&self, id: &str) -> Result<()> {
            self.0.delete_icon(id)
        }
        fn list_presets(&self) -> Result<Vec<LayoutPreset>> {
            self.0.list_presets()
        }
        fn create_preset(&self, name: &str, params: &crate::preset::LayoutParams) -> Result<String> {
            self.0.create_preset(name, params)
        }
        fn update_preset(&self, id: &str, name: &str, params: &crate::preset::LayoutParams) -> Result<()> {
            self.0.update_preset(id, name, params)
        }
        fn delete_preset(&self, id: &str) -> Result<()> {
            self.0.delete_preset(id)
        }
        fn render(&self, request: &RenderRequest) -> Result<RenderReceipt> {
            self.0.render(request)
        }
        fn list_renders(&self) -> Result<Vec<RenderRecord>> {
            self.0.list_renders()
        }
        fn fetch_asset(&self, locator: &str) -> Result<Vec<u8>> {
            self.0.fetch_asset(locator)
        }
    }

    #[test]
    fn undecodable_icon_stays_selected_and_is_skipped() {
        let mut s = EditorSession::with_projector(
            Projector::new(Typeface::builtin(), TextOverflow::Visible),
            BrokenPreview(MemoryStore::new()),
        );
        s.load().unwrap();
        s.take_frame();

        s.select_icon("broken").unwrap();
        assert!(s.icon_image().is_none());
        assert_eq!(s.state().selected_icon().unwrap().id, "broken");

        let frame = s.take_frame().expect("selection marks the tile dirty");
        // Inside the icon square, which is left unpainted.
        assert_eq!(frame.surface.pixel(225, 225), [0x68, 0x70, 0xef, 255]);
        // Inside the first glyph of "Alarm".
        assert_eq!(frame.surface.pixel(70, 380), [255, 255, 255, 255]);
    }
}
