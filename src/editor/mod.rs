//! Toolkit-free core of the bubble editor.
//!
//! [`Editor`] owns the panels and reacts to discrete [`EditorEvent`]s. Only one
//! bubble can be dragged, edited or rotated at a time; live values are kept in
//! the active [`Interaction`] and written back to the panel when it ends
//! (text input is the exception and is written through immediately).

mod export;
mod interaction;
mod session;

pub use export::{CaptureTarget, Export, OverlayRasterizer, Rasterizer};
pub use interaction::{Interaction, Point, Rect, drag_position, tail_angle};
pub use session::{Session, SessionError};

use tracing::debug;

use crate::api::CaptureRequest;
use crate::model::{Bubble, BubbleKind, Panel, Position};

/// Addresses one bubble: panel index, list and index within the list.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct BubbleRef {
    /// Panel index.
    pub panel: usize,
    /// Dialogue or thought list.
    pub kind: BubbleKind,
    /// Index within the list.
    pub index: usize,
}

impl BubbleRef {
    /// Creates a reference.
    pub fn new(panel: usize, kind: BubbleKind, index: usize) -> Self {
        Self { panel, kind, index }
    }
}

/// Keys the editor reacts to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Key {
    /// Forward delete.
    Delete,
    /// Backspace.
    Backspace,
    /// Escape.
    Escape,
    /// Anything else, by name.
    Other(String),
}

/// Modifier keys held during a key press.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[allow(missing_docs)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// True when any modifier is held.
    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }
}

/// Input delivered to [`Editor::handle`].
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// Pointer pressed on a bubble body.
    PointerDown {
        /// Bubble under the pointer.
        target: BubbleRef,
        /// Pointer in client pixels.
        pointer: Point,
        /// Panel container bounds.
        container: Rect,
        /// 1 for a single click, 2 for the second press of a double click.
        click_count: u32,
    },
    /// Pointer pressed on a bubble's tail handle.
    HandleDown {
        /// Bubble owning the handle.
        target: BubbleRef,
        /// Pointer in client pixels.
        pointer: Point,
        /// Panel container bounds.
        container: Rect,
    },
    /// Pointer moved anywhere.
    PointerMove {
        /// Pointer in client pixels.
        pointer: Point,
        /// Panel container bounds.
        container: Rect,
    },
    /// Pointer released anywhere.
    PointerUp,
    /// Double click on a bubble.
    DoubleClick {
        /// Bubble under the pointer.
        target: BubbleRef,
    },
    /// New contents of the inline text field.
    TextInput {
        /// Full text.
        text: String,
    },
    /// The inline text field lost focus.
    Blur,
    /// Key pressed.
    KeyDown {
        /// Which key.
        key: Key,
        /// Modifiers held.
        modifiers: Modifiers,
        /// True when some text field in the page has focus.
        text_field_focused: bool,
    },
    /// Click that landed on no bubble.
    ClickOutside,
}

/// Effect of an event on the panels or the selection.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// Selection changed.
    Selected(Option<BubbleRef>),
    /// A drag ended and the position was written back.
    Moved(BubbleRef, Position),
    /// Bubble text was written back.
    TextChanged(BubbleRef, String),
    /// A rotation ended and the angle was written back.
    Rotated(BubbleRef, f64),
    /// A bubble was removed.
    Removed(BubbleRef),
}

/// Panels plus selection and the single active interaction.
#[derive(Clone, Debug)]
pub struct Editor {
    panels: Vec<Panel>,
    selected: Option<BubbleRef>,
    active: Option<(BubbleRef, Interaction)>,
    controls_visible: bool,
}

impl Editor {
    /// Editor over `panels`, nothing selected.
    pub fn new(panels: Vec<Panel>) -> Self {
        Self {
            panels,
            selected: None,
            active: None,
            controls_visible: true,
        }
    }

    /// Current panels with committed values.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Replaces every panel, dropping selection and any interaction.
    pub fn replace_panels(&mut self, panels: Vec<Panel>) {
        self.panels = panels;
        self.selected = None;
        self.active = None;
    }

    /// Selected bubble, if any.
    pub fn selected(&self) -> Option<BubbleRef> {
        self.selected
    }

    /// Active interaction and the bubble it applies to.
    pub fn active(&self) -> Option<&(BubbleRef, Interaction)> {
        self.active.as_ref()
    }

    /// Whether per-bubble delete controls are drawn.
    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub(crate) fn set_controls_visible(&mut self, visible: bool) {
        self.controls_visible = visible;
    }

    fn bubble(&self, target: BubbleRef) -> Option<&Bubble> {
        self.panels
            .get(target.panel)
            .and_then(|panel| panel.bubbles(target.kind).get(target.index))
    }

    fn bubble_mut(&mut self, target: BubbleRef) -> Option<&mut Bubble> {
        self.panels
            .get_mut(target.panel)
            .and_then(|panel| panel.bubbles_mut(target.kind).get_mut(target.index))
    }

    /// The bubble as it should be drawn right now, live values included.
    pub fn bubble_view(&self, target: BubbleRef) -> Option<Bubble> {
        let mut bubble = self.bubble(target)?.clone();
        if let Some((active, interaction)) = &self.active
            && *active == target
        {
            match interaction {
                Interaction::Dragging { current, .. } => bubble.position = *current,
                Interaction::Editing { draft, .. } => bubble.text.clone_from(draft),
                Interaction::Rotating { angle, .. } => bubble.tail_angle = *angle,
            }
        }
        Some(bubble)
    }

    /// Appends a placeholder bubble of `kind` to `panel`.
    pub fn add_bubble(&mut self, panel: usize, kind: BubbleKind) -> Option<BubbleRef> {
        let list = self.panels.get_mut(panel)?.bubbles_mut(kind);
        list.push(Bubble::placeholder(kind));
        Some(BubbleRef::new(panel, kind, list.len() - 1))
    }

    /// Removes `target`. Selection and the active interaction are cleared when
    /// they point at it and shifted when they point past it in the same list.
    pub fn delete_bubble(&mut self, target: BubbleRef) -> Option<Bubble> {
        let list = self.panels.get_mut(target.panel)?.bubbles_mut(target.kind);
        if target.index >= list.len() {
            return None;
        }
        let removed = list.remove(target.index);

        let shift = |r: BubbleRef| -> Option<BubbleRef> {
            if r.panel != target.panel || r.kind != target.kind || r.index < target.index {
                Some(r)
            } else if r.index == target.index {
                None
            } else {
                Some(BubbleRef { index: r.index - 1, ..r })
            }
        };
        self.selected = self.selected.and_then(shift);
        self.active = self
            .active
            .take()
            .and_then(|(r, interaction)| shift(r).map(|r| (r, interaction)));
        debug!("Removed {:?} bubble {} from panel {}", target.kind, target.index, target.panel);
        Some(removed)
    }

    /// Body for `POST /api/capture` of `panel`.
    pub fn capture_request(&self, panel: usize) -> Option<CaptureRequest> {
        self.panels.get(panel).map(CaptureRequest::from)
    }

    /// Applies one input event.
    pub fn handle(&mut self, event: EditorEvent) -> Vec<Change> {
        let mut changes = Vec::new();
        match event {
            EditorEvent::PointerDown {
                target,
                pointer,
                container,
                click_count,
            } => {
                if self.is_editing(target) {
                    return changes;
                }
                let Some(origin) = self.bubble(target).map(|b| b.position) else {
                    return changes;
                };
                self.finish_active(&mut changes);
                if click_count <= 1 {
                    self.select(Some(target), &mut changes);
                }
                self.active = Some((
                    target,
                    Interaction::Dragging {
                        pointer_start: container.relative(pointer),
                        origin,
                        current: origin,
                    },
                ));
            }
            EditorEvent::HandleDown {
                target,
                pointer,
                container,
            } => {
                let Some(position) = self.bubble(target).map(|b| b.position) else {
                    return changes;
                };
                self.finish_active(&mut changes);
                self.select(Some(target), &mut changes);
                let center = container.point_at(position);
                self.active = Some((
                    target,
                    Interaction::Rotating {
                        center,
                        angle: tail_angle(center, pointer),
                    },
                ));
            }
            EditorEvent::PointerMove { pointer, container } => match &mut self.active {
                Some((
                    _,
                    Interaction::Dragging {
                        pointer_start,
                        origin,
                        current,
                    },
                )) => *current = drag_position(*origin, *pointer_start, pointer, &container),
                Some((_, Interaction::Rotating { center, angle })) => {
                    *angle = tail_angle(*center, pointer);
                }
                _ => {}
            },
            EditorEvent::PointerUp => {
                if matches!(
                    self.active,
                    Some((_, Interaction::Dragging { .. } | Interaction::Rotating { .. }))
                ) {
                    self.finish_active(&mut changes);
                }
            }
            EditorEvent::DoubleClick { target } => {
                let Some(text) = self.bubble(target).map(|b| b.text.clone()) else {
                    return changes;
                };
                if self.is_editing(target) {
                    return changes;
                }
                self.finish_active(&mut changes);
                self.select(Some(target), &mut changes);
                self.active = Some((
                    target,
                    Interaction::Editing {
                        original: text.clone(),
                        draft: text,
                    },
                ));
            }
            EditorEvent::TextInput { text } => {
                if let Some((target, Interaction::Editing { draft, .. })) = &mut self.active {
                    draft.clone_from(&text);
                    let target = *target;
                    if let Some(bubble) = self.bubble_mut(target) {
                        bubble.text.clone_from(&text);
                    }
                }
            }
            EditorEvent::Blur => {
                if matches!(self.active, Some((_, Interaction::Editing { .. }))) {
                    self.finish_active(&mut changes);
                }
            }
            EditorEvent::KeyDown {
                key,
                modifiers,
                text_field_focused,
            } => match key {
                Key::Escape => {
                    if matches!(self.active, Some((_, Interaction::Editing { .. }))) {
                        self.finish_active(&mut changes);
                    }
                }
                Key::Delete | Key::Backspace => {
                    let editing = matches!(self.active, Some((_, Interaction::Editing { .. })));
                    if let Some(target) = self.selected
                        && !modifiers.any()
                        && !text_field_focused
                        && !editing
                        && self.delete_bubble(target).is_some()
                    {
                        // delete_bubble already dropped the selection
                        self.selected = None;
                        changes.push(Change::Removed(target));
                        changes.push(Change::Selected(None));
                    }
                }
                Key::Other(_) => {}
            },
            EditorEvent::ClickOutside => {
                self.finish_active(&mut changes);
                self.select(None, &mut changes);
            }
        }
        changes
    }

    fn is_editing(&self, target: BubbleRef) -> bool {
        matches!(&self.active, Some((r, Interaction::Editing { .. })) if *r == target)
    }

    fn select(&mut self, target: Option<BubbleRef>, changes: &mut Vec<Change>) {
        if self.selected != target {
            self.selected = target;
            changes.push(Change::Selected(target));
        }
    }

    /// Ends the active interaction, writing its live value back.
    fn finish_active(&mut self, changes: &mut Vec<Change>) {
        let Some((target, interaction)) = self.active.take() else {
            return;
        };
        let Some(bubble) = self.bubble_mut(target) else {
            return;
        };
        match interaction {
            Interaction::Dragging { origin, current, .. } => {
                bubble.position = current;
                if current != origin {
                    changes.push(Change::Moved(target, current));
                }
            }
            Interaction::Editing { original, draft } => {
                if draft != original {
                    bubble.text.clone_from(&draft);
                    changes.push(Change::TextChanged(target, draft));
                }
            }
            Interaction::Rotating { angle, .. } => {
                bubble.tail_angle = angle;
                changes.push(Change::Rotated(target, angle));
            }
        }
    }
}
