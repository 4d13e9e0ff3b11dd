//! Compose a tile entirely offline and write it as PNG.
//!
//! cargo run --example offline_render -- out.png

use std::sync::Arc;

use kachel::controller::PointerEvent;
use kachel::model::Point;
use kachel::rendering::font::Typeface;
use kachel::rendering::projector::{Projector, TextOverflow};
use kachel::session::EditorSession;
use kachel::store::MemoryStore;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let out = std::env::args().nth(1).unwrap_or_else(|| "tile.png".to_string());

    let store = Arc::new(MemoryStore::new());
    let projector = Projector::new(Typeface::builtin(), TextOverflow::Ellipsis);
    let mut session = EditorSession::with_projector(projector, store.clone());
    session.load()?;

    session.select_color("#e74382")?;
    session.set_text("Coffee break");
    session.set_text_size(40)?;

    // Drag the text up a little, the way a user would.
    session.pointer(PointerEvent::Down(Point::new(70.0, 370.0)));
    session.pointer(PointerEvent::Move(Point::new(50.0, 330.0)));
    session.pointer(PointerEvent::Up);

    let saved = session.save_preset("Raised text")?;
    println!("saved preset {} ({})", saved.name, saved.id);

    let outcome = session.submit_render("coffee")?;
    let png = store.render_png(&outcome.receipt.render_id)?;
    std::fs::write(&out, png)?;
    println!("wrote {} (download link {})", out, outcome.download_link);
    Ok(())
}
