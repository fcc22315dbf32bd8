use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{PopupWindow, WindowFactory, WindowId};
use crate::geometry::Point;

/// Observable state of a headless window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub title: String,
    pub position: Point,
    pub size: (i32, i32),
    pub visible: bool,
    /// How many times the window went from hidden to shown
    pub show_count: usize,
}

#[derive(Debug, Default)]
struct DisplayState {
    next_id: u64,
    windows: BTreeMap<WindowId, WindowSnapshot>,
    /// Bottom to top
    stacking: Vec<WindowId>,
    focused: Option<WindowId>,
    focus_requests: usize,
}

/// In-memory display server
///
/// Hands out [`HeadlessWindow`]s that record every request, so the popup
/// engine can run without a compositor (the CLI and the tests use it).
#[derive(Debug, Clone, Default)]
pub struct HeadlessDisplay {
    state: Rc<RefCell<DisplayState>>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_window(&self, title: &str) -> HeadlessWindow {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = WindowId(state.next_id);
        state.windows.insert(
            id,
            WindowSnapshot {
                title: title.to_string(),
                ..Default::default()
            },
        );
        HeadlessWindow {
            id,
            display: self.state.clone(),
        }
    }

    pub fn snapshot(&self, id: WindowId) -> Option<WindowSnapshot> {
        self.state.borrow().windows.get(&id).cloned()
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.state.borrow().focused
    }

    /// Move focus to a window the engine does not own (another application)
    pub fn set_focused(&self, id: Option<WindowId>) {
        self.state.borrow_mut().focused = id;
    }

    pub fn focus_requests(&self) -> usize {
        self.state.borrow().focus_requests
    }

    pub fn topmost(&self) -> Option<WindowId> {
        self.state.borrow().stacking.last().copied()
    }

    pub fn window_count(&self) -> usize {
        self.state.borrow().windows.len()
    }
}

impl WindowFactory for HeadlessDisplay {
    fn create_window(&mut self, title: &str) -> Box<dyn PopupWindow> {
        Box::new(HeadlessDisplay::create_window(self, title))
    }
}

/// Window handle backed by a [`HeadlessDisplay`]
#[derive(Debug)]
pub struct HeadlessWindow {
    id: WindowId,
    display: Rc<RefCell<DisplayState>>,
}

impl HeadlessWindow {
    fn with_record<R>(&self, f: impl FnOnce(&mut WindowSnapshot) -> R) -> Option<R> {
        self.display.borrow_mut().windows.get_mut(&self.id).map(f)
    }
}

impl PopupWindow for HeadlessWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn move_to(&mut self, x: i32, y: i32) {
        self.with_record(|w| w.position = Point::new(x, y));
    }

    fn resize(&mut self, width: i32, height: i32) {
        self.with_record(|w| w.size = (width, height));
    }

    fn show(&mut self) {
        self.with_record(|w| {
            if !w.visible {
                w.visible = true;
                w.show_count += 1;
            }
        });
    }

    fn hide(&mut self) {
        self.with_record(|w| w.visible = false);
        let mut state = self.display.borrow_mut();
        if state.focused == Some(self.id) {
            state.focused = None;
        }
    }

    fn is_visible(&self) -> bool {
        self.display
            .borrow()
            .windows
            .get(&self.id)
            .map(|w| w.visible)
            .unwrap_or(false)
    }

    fn raise(&mut self) {
        let mut state = self.display.borrow_mut();
        state.stacking.retain(|id| *id != self.id);
        state.stacking.push(self.id);
    }

    fn focus(&mut self) {
        let mut state = self.display.borrow_mut();
        state.focused = Some(self.id);
        state.focus_requests += 1;
    }

    fn set_text(&mut self, title: &str) {
        self.with_record(|w| w.title = title.to_string());
    }

    fn position(&self) -> Point {
        self.display
            .borrow()
            .windows
            .get(&self.id)
            .map(|w| w.position)
            .unwrap_or_default()
    }

    fn size(&self) -> (i32, i32) {
        self.display
            .borrow()
            .windows
            .get(&self.id)
            .map(|w| w.size)
            .unwrap_or_default()
    }
}

impl Drop for HeadlessWindow {
    fn drop(&mut self) {
        let mut state = self.display.borrow_mut();
        state.windows.remove(&self.id);
        state.stacking.retain(|id| *id != self.id);
        if state.focused == Some(self.id) {
            state.focused = None;
        }
    }
}
