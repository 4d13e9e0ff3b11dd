use crate::controller::PointerEvent;
use crate::model::EditorState;
use crate::preset::LayoutPreset;
use crate::session::{Catalog, EditorSession, Frame, RenderOutcome};
use crate::store::{IconQuery, IconRecord, IconUpload, TileStore};
use crate::{Error, Result};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use tokio::sync::{oneshot, watch};

enum Command {
    Load(oneshot::Sender<Result<Catalog>>),
    Pointer(PointerEvent),
    SelectColor(String, oneshot::Sender<Result<()>>),
    SelectIcon(String, oneshot::Sender<Result<()>>),
    ClearIcon(oneshot::Sender<Result<()>>),
    SetText(String, oneshot::Sender<Result<()>>),
    SetIconScale(f64, oneshot::Sender<Result<()>>),
    SetTextSize(u32, oneshot::Sender<Result<()>>),

    // Presets
    ApplyPreset(String, oneshot::Sender<Result<()>>),
    SavePreset(String, oneshot::Sender<Result<LayoutPreset>>),
    UpdatePreset(String, String, oneshot::Sender<Result<LayoutPreset>>),
    DeletePreset(String, oneshot::Sender<Result<()>>),

    // Icons
    UploadIcon(IconUpload, oneshot::Sender<Result<String>>),
    DeleteIcon(String, oneshot::Sender<Result<()>>),
    SearchIcons(IconQuery, oneshot::Sender<Result<Vec<IconRecord>>>),

    SubmitRender(String, oneshot::Sender<Result<RenderOutcome>>),
    Snapshot(oneshot::Sender<Result<EditorState>>),

    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly editor backed by a dedicated worker thread.
///
/// The worker owns the [`EditorSession`] and processes commands one at a time,
/// so there is never more than one render pass in flight. Pointer events are
/// fire-and-forget: the worker applies every queued pointer event before it
/// paints, so a burst of moves produces a single frame showing the final
/// position. Frames are published through a watch channel that always holds the
/// latest one.
#[derive(Clone)]
pub struct Editor {
    cmd_tx: Sender<Command>,
    frames: watch::Receiver<Option<Arc<Frame>>>,
}

impl Editor {
    /// Spawn the worker thread that owns `session`.
    pub fn spawn<S: TileStore + 'static>(session: EditorSession<S>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (frame_tx, frames) = watch::channel(None);

        thread::spawn(move || worker_loop(session, cmd_rx, frame_tx));

        Self { cmd_tx, frames }
    }

    /// Latest rendered frame, if any.
    pub fn frame(&self) -> Option<Arc<Frame>> {
        self.frames.borrow().clone()
    }

    /// A receiver that is notified on every new frame.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.frames.clone()
    }

    /// Queue a pointer event. Never waits for the render it triggers.
    pub fn pointer(&self, event: PointerEvent) -> Result<()> {
        self.cmd_tx
            .send(Command::Pointer(event))
            .map_err(|_| Error::Other("Editor worker has stopped".into()))
    }

    async fn request<T>(
        &self,
        what: &str,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::Other(format!("{} failed: editor worker has stopped", what)))?;
        rx.await
            .map_err(|e| Error::Other(format!("{} canceled: {}", what, e)))?
    }

    /// Load reference data from the store.
    pub async fn load(&self) -> Result<Catalog> {
        self.request("Load", Command::Load).await
    }

    pub async fn select_color(&self, hex: &str) -> Result<()> {
        let hex = hex.to_string();
        self.request("SelectColor", |tx| Command::SelectColor(hex, tx)).await
    }

    pub async fn select_icon(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.request("SelectIcon", |tx| Command::SelectIcon(id, tx)).await
    }

    pub async fn clear_icon(&self) -> Result<()> {
        self.request("ClearIcon", Command::ClearIcon).await
    }

    pub async fn set_text(&self, text: &str) -> Result<()> {
        let text = text.to_string();
        self.request("SetText", |tx| Command::SetText(text, tx)).await
    }

    pub async fn set_icon_scale(&self, scale: f64) -> Result<()> {
        self.request("SetIconScale", |tx| Command::SetIconScale(scale, tx)).await
    }

    pub async fn set_text_size(&self, size: u32) -> Result<()> {
        self.request("SetTextSize", |tx| Command::SetTextSize(size, tx)).await
    }

    pub async fn apply_preset(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.request("ApplyPreset", |tx| Command::ApplyPreset(id, tx)).await
    }

    pub async fn save_preset(&self, name: &str) -> Result<LayoutPreset> {
        let name = name.to_string();
        self.request("SavePreset", |tx| Command::SavePreset(name, tx)).await
    }

    /// Overwrite preset `id` with the current layout under `name`.
    pub async fn update_preset(&self, id: &str, name: &str) -> Result<LayoutPreset> {
        let (id, name) = (id.to_string(), name.to_string());
        self.request("UpdatePreset", |tx| Command::UpdatePreset(id, name, tx)).await
    }

    pub async fn delete_preset(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.request("DeletePreset", |tx| Command::DeletePreset(id, tx)).await
    }

    pub async fn upload_icon(&self, upload: IconUpload) -> Result<String> {
        self.request("UploadIcon", |tx| Command::UploadIcon(upload, tx)).await
    }

    pub async fn delete_icon(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.request("DeleteIcon", |tx| Command::DeleteIcon(id, tx)).await
    }

    pub async fn search_icons(&self, query: IconQuery) -> Result<Vec<IconRecord>> {
        self.request("SearchIcons", |tx| Command::SearchIcons(query, tx)).await
    }

    pub async fn submit_render(&self, name: &str) -> Result<RenderOutcome> {
        let name = name.to_string();
        self.request("SubmitRender", |tx| Command::SubmitRender(name, tx)).await
    }

    /// A copy of the editor state after every queued command has been applied.
    pub async fn state(&self) -> Result<EditorState> {
        self.request("Snapshot", Command::Snapshot).await
    }

    /// Stop the worker thread.
    pub async fn close(self) -> Result<()> {
        self.request("Close", Command::Close).await
    }
}

fn worker_loop<S: TileStore>(
    mut session: EditorSession<S>,
    cmd_rx: Receiver<Command>,
    frame_tx: watch::Sender<Option<Arc<Frame>>>,
) {
    let mut pending: Option<Command> = None;
    loop {
        let cmd = match pending.take() {
            Some(cmd) => cmd,
            None => match cmd_rx.recv() {
                Ok(cmd) => cmd,
                Err(_) => break,
            },
        };

        if let Command::Pointer(event) = cmd {
            session.pointer(event);
            // Drain queued pointer events so only the final position is painted.
            loop {
                match cmd_rx.try_recv() {
                    Ok(Command::Pointer(event)) => {
                        session.pointer(event);
                    }
                    Ok(other) => {
                        pending = Some(other);
                        break;
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
            publish(&mut session, &frame_tx);
            continue;
        }

        if !handle(&mut session, cmd) {
            break;
        }
        publish(&mut session, &frame_tx);
    }
    log::debug!("editor worker stopped");
}

fn publish<S: TileStore>(session: &mut EditorSession<S>, frame_tx: &watch::Sender<Option<Arc<Frame>>>) {
    if let Some(frame) = session.take_frame() {
        let _ = frame_tx.send(Some(Arc::new(frame)));
    }
}

/// Run one non-pointer command. Returns false when the worker should stop.
fn handle<S: TileStore>(session: &mut EditorSession<S>, cmd: Command) -> bool {
    match cmd {
        Command::Load(resp) => {
            let res = session.load().map(|_| session.catalog().clone());
            let _ = resp.send(res);
        }
        Command::Pointer(event) => {
            session.pointer(event);
        }
        Command::SelectColor(hex, resp) => {
            let _ = resp.send(session.select_color(&hex));
        }
        Command::SelectIcon(id, resp) => {
            let _ = resp.send(session.select_icon(&id));
        }
        Command::ClearIcon(resp) => {
            session.clear_icon();
            let _ = resp.send(Ok(()));
        }
        Command::SetText(text, resp) => {
            session.set_text(&text);
            let _ = resp.send(Ok(()));
        }
        Command::SetIconScale(scale, resp) => {
            let _ = resp.send(session.set_icon_scale(scale));
        }
        Command::SetTextSize(size, resp) => {
            let _ = resp.send(session.set_text_size(size));
        }
        Command::ApplyPreset(id, resp) => {
            let _ = resp.send(session.apply_preset(&id));
        }
        Command::SavePreset(name, resp) => {
            let _ = resp.send(session.save_preset(&name));
        }
        Command::UpdatePreset(id, name, resp) => {
            let _ = resp.send(session.update_preset(&id, &name));
        }
        Command::DeletePreset(id, resp) => {
            let _ = resp.send(session.delete_preset(&id));
        }
        Command::UploadIcon(upload, resp) => {
            let _ = resp.send(session.upload_icon(&upload));
        }
        Command::DeleteIcon(id, resp) => {
            let _ = resp.send(session.delete_icon(&id));
        }
        Command::SearchIcons(query, resp) => {
            let _ = resp.send(session.search_icons(&query));
        }
        Command::SubmitRender(name, resp) => {
            let _ = resp.send(session.submit_render(&name));
        }
        Command::Snapshot(resp) => {
            let _ = resp.send(Ok(session.state().clone()));
        }
        Command::Close(resp) => {
            let _ = resp.send(Ok(()));
            return false;
        }
    }
    true
}
