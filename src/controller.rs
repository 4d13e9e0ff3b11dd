//! Pointer interaction: which element is being dragged and where it goes.
//!
//! [`transition`] is the event table. It is a pure function of the current drag
//! target, the event and the hit-test result, so it can be exercised without any
//! rendering surface. [`InteractionController`] applies its outcome to the
//! editor state.

use crate::model::{DragTarget, EditorState, Point};
use crate::rendering::layout;
use crate::rendering::projector::Projector;

/// A single-pointer input event in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
    Leave,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    None,
    MoveIcon(Point),
    MoveText(Point),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: DragTarget,
    pub effect: Effect,
}

/// The drag state machine.
///
/// `hit` is the element under the pointer for `Down` events and is ignored for
/// every other event.
pub fn transition(current: DragTarget, event: PointerEvent, hit: DragTarget) -> Transition {
    match event {
        PointerEvent::Down(_) => Transition {
            next: hit,
            effect: Effect::None,
        },
        PointerEvent::Move(p) => Transition {
            next: current,
            effect: match current {
                DragTarget::None => Effect::None,
                DragTarget::Icon => Effect::MoveIcon(p),
                DragTarget::Text => Effect::MoveText(p),
            },
        },
        PointerEvent::Up | PointerEvent::Leave => Transition {
            next: DragTarget::None,
            effect: Effect::None,
        },
    }
}

/// Element under `p`. The icon wins over the text when both boxes contain the
/// point, and is only considered while an icon is selected. The text box is the
/// one `projector` draws, overflow trimming included.
pub fn hit_test(state: &EditorState, projector: &Projector, p: Point) -> DragTarget {
    if state.selected_icon().is_some() && layout::icon_bounds(state).contains(p) {
        return DragTarget::Icon;
    }
    if !state.text().is_empty() && projector.text_box(state).bounds.contains(p) {
        return DragTarget::Text;
    }
    DragTarget::None
}

/// Applies pointer events to the editor state.
#[derive(Debug, Default)]
pub struct InteractionController {
    events: u64,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events handled so far.
    pub fn events_handled(&self) -> u64 {
        self.events
    }

    /// Handle one event. Returns true when the tile needs to be redrawn.
    ///
    /// `projector` must be the one that paints the tile, so the text hit box
    /// matches the painted text.
    pub fn handle(&mut self, state: &mut EditorState, projector: &Projector, event: PointerEvent) -> bool {
        self.events += 1;
        let hit = match event {
            PointerEvent::Down(p) => hit_test(state, projector, p),
            _ => DragTarget::None,
        };
        let t = transition(state.drag_target(), event, hit);
        if t.next != state.drag_target() {
            log::debug!("drag target {:?} -> {:?} on {:?}", state.drag_target(), t.next, event);
        }
        if state.set_drag_target(t.next).is_err() {
            // The icon was deselected between hit-test and apply.
            let _ = state.set_drag_target(DragTarget::None);
        }
        match t.effect {
            Effect::None => false,
            Effect::MoveIcon(p) => {
                state.set_icon_position(p);
                true
            }
            Effect::MoveText(p) => {
                state.set_text_position(p);
                true
            }
        }
    }
}
