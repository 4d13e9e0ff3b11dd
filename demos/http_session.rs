//! Drive an editor session against a running tile service.
//!
//! cargo run --example http_session -- http://127.0.0.1:5000

use kachel::http::HttpStore;
use kachel::session::EditorSession;
use kachel::{Editor, EditorConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut cfg = EditorConfig::default();
    if let Some(base) = std::env::args().nth(1) {
        cfg.api_base_url = base;
    }

    // The blocking HTTP client must be built and dropped off the async runtime.
    let editor = tokio::task::spawn_blocking(move || -> kachel::Result<Editor> {
        let store = HttpStore::new(&cfg)?;
        Ok(Editor::spawn(EditorSession::new(&cfg, store)?))
    })
    .await??;

    let catalog = editor.load().await?;
    println!(
        "{} colors, {} icons, {} presets, {} renders",
        catalog.colors.len(),
        catalog.icons.len(),
        catalog.presets.len(),
        catalog.renders.len()
    );

    if let Some(color) = catalog.colors.first() {
        editor.select_color(&color.hex).await?;
    }
    if let Some(icon) = catalog.icons.first() {
        editor.select_icon(&icon.id).await?;
    }
    editor.set_text("Hello").await?;

    let outcome = editor.submit_render("http-session demo").await?;
    println!("render {} -> {}", outcome.receipt.render_id, outcome.download_link);

    editor.close().await?;
    Ok(())
}
