mod common;

use std::sync::Arc;

use kachel::controller::PointerEvent;
use kachel::model::{DragTarget, Point};
use kachel::session::EditorSession;
use kachel::store::{IconQuery, IconUpload, MemoryStore, TileStore};
use kachel::{Editor, Error};

fn editor() -> (Editor, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let session = EditorSession::with_projector(common::projector(), store.clone());
    (Editor::spawn(session), store)
}

#[tokio::test]
async fn pointer_burst_lands_on_final_position() {
    let (editor, _store) = editor();
    let catalog = editor.load().await.unwrap();
    assert_eq!(catalog.colors.len(), 6);

    editor.pointer(PointerEvent::Down(Point::new(61.0, 361.0))).unwrap();
    for i in 0..200 {
        editor
            .pointer(PointerEvent::Move(Point::new(i as f64, 20.0 + i as f64)))
            .unwrap();
    }
    editor.pointer(PointerEvent::Up).unwrap();

    let state = editor.state().await.unwrap();
    assert_eq!(state.text_position(), Point::new(199.0, 219.0));
    assert_eq!(state.drag_target(), DragTarget::None);

    let frame = editor.frame().expect("a frame was published");
    assert_eq!(frame.surface.width(), 450);
    editor.close().await.unwrap();
}

#[tokio::test]
async fn frames_follow_edits() {
    let (editor, _store) = editor();
    editor.load().await.unwrap();
    // The snapshot is answered after the load frame went out.
    editor.state().await.unwrap();
    let mut frames = editor.subscribe();
    let first = frames.borrow_and_update().clone().expect("frame after load");

    editor.select_color("#22B07D").await.unwrap();
    frames.changed().await.unwrap();
    let second = frames.borrow().clone().unwrap();
    assert!(second.revision > first.revision);
    assert_eq!(second.surface.pixel(225, 225), [0x22, 0xb0, 0x7d, 255]);
    editor.close().await.unwrap();
}

#[tokio::test]
async fn errors_come_back_to_the_caller() {
    let (editor, _store) = editor();
    editor.load().await.unwrap();
    assert!(matches!(
        editor.select_color("green").await,
        Err(Error::ValidationError(_))
    ));
    assert!(matches!(
        editor.set_icon_scale(0.0).await,
        Err(Error::ValidationError(_))
    ));
    assert!(matches!(
        editor.apply_preset("missing").await,
        Err(Error::NotFound(_))
    ));
    editor.close().await.unwrap();
}

#[tokio::test]
async fn upload_select_and_render() {
    let (editor, store) = editor();
    editor.load().await.unwrap();
    let id = editor
        .upload_icon(IconUpload {
            file_name: "bell.png".into(),
            name: "Bell".into(),
            tags: Some("alarm".into()),
            bytes: common::png(48, 48, [250, 250, 250, 255]),
        })
        .await
        .unwrap();
    editor.select_icon(&id).await.unwrap();
    editor.set_text("Bell").await.unwrap();

    let saved = editor.save_preset("Mine").await.unwrap();
    assert_eq!(saved.params.name, "Mine");

    let out = editor.submit_render("bell-tile").await.unwrap();
    assert!(out.download_link.ends_with("?download=1"));
    let png = store.render_png(&out.receipt.render_id).unwrap();
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    editor.close().await.unwrap();
}

#[tokio::test]
async fn preset_and_icon_maintenance() {
    let (editor, store) = editor();
    editor.load().await.unwrap();

    let saved = editor.save_preset("Draft").await.unwrap();
    editor.set_icon_scale(0.8).await.unwrap();
    let updated = editor.update_preset(&saved.id, "Final").await.unwrap();
    assert_eq!(updated.params.icon.scale, 0.8);
    let listed = store.list_presets().unwrap();
    assert_eq!(listed[0].name, "Final");
    assert_eq!(listed[0].params.icon.scale, 0.8);

    let id = editor
        .upload_icon(IconUpload {
            file_name: "cup.png".into(),
            name: "Coffee cup".into(),
            tags: Some("drink".into()),
            bytes: common::png(16, 16, [120, 60, 20, 255]),
        })
        .await
        .unwrap();
    let found = editor
        .search_icons(IconQuery {
            query: Some("CUP".into()),
            tag: None,
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);

    editor.select_icon(&id).await.unwrap();
    editor.delete_icon(&id).await.unwrap();
    assert!(editor.state().await.unwrap().selected_icon().is_none());
    assert!(editor.search_icons(IconQuery::all()).await.unwrap().is_empty());
    editor.close().await.unwrap();
}
