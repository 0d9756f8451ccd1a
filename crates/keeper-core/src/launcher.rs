//! State of the floating inspector launcher.
//!
//! The launcher is a draggable button that opens the inspector. Its open
//! flag and position survive reloads through the durable store.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{read_flag, read_json, write_flag, write_json, KeyValueStore};
use crate::storage::{EDITOR_OPEN_KEY, EDITOR_POS_KEY};

/// Launcher button edge length in pixels.
pub const BUTTON_SIZE: f64 = 70.0;
/// Gap between the default position and the viewport edge.
pub const EDGE_MARGIN: f64 = 24.0;

/// Top-left corner of the launcher, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Visible area the launcher must stay within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Bottom-left resting place of the launcher.
    pub fn default_position(&self) -> Position {
        Position::new(EDGE_MARGIN, (self.height - BUTTON_SIZE - EDGE_MARGIN).max(0.0))
    }

    /// Keep a launcher at `pos` fully inside the viewport.
    pub fn clamp(&self, pos: Position) -> Position {
        let max_x = (self.width - BUTTON_SIZE).max(0.0);
        let max_y = (self.height - BUTTON_SIZE).max(0.0);
        Position::new(pos.x.clamp(0.0, max_x), pos.y.clamp(0.0, max_y))
    }
}

#[derive(Debug, Clone, Copy)]
struct Grab {
    offset: Position,
    moved: bool,
}

/// Open flag, position and drag state of the launcher.
pub struct LauncherState {
    open: bool,
    position: Position,
    grab: Option<Grab>,
    store: Arc<dyn KeyValueStore>,
}

impl LauncherState {
    /// Load the launcher state, falling back to closed at the default corner.
    pub fn load(store: Arc<dyn KeyValueStore>, viewport: Viewport) -> Self {
        let open = read_flag(store.as_ref(), EDITOR_OPEN_KEY);
        let position = read_json::<Position>(store.as_ref(), EDITOR_POS_KEY)
            .unwrap_or_else(|| viewport.default_position());

        Self {
            open,
            position,
            grab: None,
            store,
        }
    }

    /// Whether the inspector is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    /// Open or close the inspector. Ignored while dragging.
    pub fn toggle_open(&mut self) -> bool {
        if self.is_dragging() {
            return self.open;
        }
        self.open = !self.open;
        if let Err(err) = write_flag(self.store.as_ref(), EDITOR_OPEN_KEY, self.open) {
            tracing::warn!(error = %err, "failed to persist launcher open state");
        }
        self.open
    }

    /// Start dragging; `pointer` is where the button was grabbed.
    pub fn begin_drag(&mut self, pointer: Position) {
        self.grab = Some(Grab {
            offset: Position::new(pointer.x - self.position.x, pointer.y - self.position.y),
            moved: false,
        });
    }

    /// Follow the pointer, clamped to `viewport`. No-op when not dragging.
    pub fn drag_to(&mut self, pointer: Position, viewport: Viewport) -> Position {
        if let Some(grab) = self.grab.as_mut() {
            let next = viewport.clamp(Position::new(
                pointer.x - grab.offset.x,
                pointer.y - grab.offset.y,
            ));
            grab.moved |= next != self.position;
            self.position = next;
        }
        self.position
    }

    /// Finish dragging, persisting the position if the launcher moved.
    ///
    /// Returns `false` when the press never moved the launcher, which the
    /// host treats as a click.
    pub fn end_drag(&mut self) -> bool {
        let Some(grab) = self.grab.take() else {
            return false;
        };
        if grab.moved {
            if let Err(err) = write_json(self.store.as_ref(), EDITOR_POS_KEY, &self.position) {
                tracing::warn!(error = %err, "failed to persist launcher position");
            }
        }
        grab.moved
    }
}

impl fmt::Debug for LauncherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LauncherState")
            .field("open", &self.open)
            .field("position", &self.position)
            .field("dragging", &self.is_dragging())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn viewport() -> Viewport {
        Viewport::new(1024.0, 768.0)
    }

    #[test]
    fn test_defaults_without_storage() {
        let state = LauncherState::load(Arc::new(MemoryStore::new()), viewport());
        assert!(!state.is_open());
        assert_eq!(state.position(), Position::new(24.0, 674.0));
        assert!(!state.is_dragging());
    }

    #[test]
    fn test_malformed_position_falls_back() {
        let store = Arc::new(MemoryStore::new());
        store.set(EDITOR_POS_KEY, "[1,2").unwrap();
        store.set(EDITOR_OPEN_KEY, "maybe").unwrap();

        let state = LauncherState::load(store, viewport());
        assert!(!state.is_open());
        assert_eq!(state.position(), viewport().default_position());
    }

    #[test]
    fn test_toggle_persists() {
        let store = Arc::new(MemoryStore::new());
        let mut state = LauncherState::load(store.clone(), viewport());

        assert!(state.toggle_open());
        assert_eq!(store.get(EDITOR_OPEN_KEY).as_deref(), Some("true"));
        assert!(LauncherState::load(store, viewport()).is_open());
    }

    #[test]
    fn test_drag_moves_and_persists_on_release() {
        let store = Arc::new(MemoryStore::new());
        let mut state = LauncherState::load(store.clone(), viewport());
        let start = state.position();

        state.begin_drag(Position::new(start.x + 10.0, start.y + 10.0));
        assert!(state.is_dragging());
        state.drag_to(Position::new(210.0, 310.0), viewport());
        assert!(store.get(EDITOR_POS_KEY).is_none());

        assert!(state.end_drag());
        assert_eq!(state.position(), Position::new(200.0, 300.0));
        assert_eq!(
            read_json::<Position>(store.as_ref(), EDITOR_POS_KEY),
            Some(Position::new(200.0, 300.0))
        );
        assert_eq!(
            LauncherState::load(store, viewport()).position(),
            Position::new(200.0, 300.0)
        );
    }

    #[test]
    fn test_drag_clamped_to_viewport() {
        let mut state = LauncherState::load(Arc::new(MemoryStore::new()), viewport());
        state.begin_drag(state.position());

        assert_eq!(
            state.drag_to(Position::new(-50.0, 5_000.0), viewport()),
            Position::new(0.0, 698.0)
        );
    }

    #[test]
    fn test_toggle_ignored_while_dragging() {
        let mut state = LauncherState::load(Arc::new(MemoryStore::new()), viewport());
        state.begin_drag(state.position());
        assert!(!state.toggle_open());
        assert!(!state.end_drag());
        assert!(state.toggle_open());
    }

    #[test]
    fn test_drag_without_begin_is_noop() {
        let mut state = LauncherState::load(Arc::new(MemoryStore::new()), viewport());
        let before = state.position();
        assert_eq!(state.drag_to(Position::new(1.0, 1.0), viewport()), before);
        assert!(!state.end_drag());
    }

    #[test]
    fn test_press_without_move_is_click() {
        let store = Arc::new(MemoryStore::new());
        let mut state = LauncherState::load(store.clone(), viewport());
        let at = state.position();
        state.begin_drag(at);
        state.drag_to(at, viewport());

        assert!(!state.end_drag());
        assert!(store.get(EDITOR_POS_KEY).is_none());
    }
}
