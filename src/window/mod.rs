use crate::geometry::{Point, Rect};

mod headless;

pub use headless::{HeadlessDisplay, HeadlessWindow, WindowSnapshot};

/// Stable identity of a backing window, compared against activation events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

/// The top-level window primitive backing each popup
///
/// Implementations wrap whatever the platform offers (a layer-shell surface,
/// an X11 override-redirect window, an in-memory record). The engine only
/// moves, sizes, shows and focuses it.
pub trait PopupWindow {
    fn id(&self) -> WindowId;
    fn move_to(&mut self, x: i32, y: i32);
    fn resize(&mut self, width: i32, height: i32);
    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;
    /// Put the window on top of the stacking order
    fn raise(&mut self);
    /// Give the window input focus and make it the active window
    fn focus(&mut self);
    fn set_text(&mut self, title: &str);
    fn position(&self) -> Point;
    fn size(&self) -> (i32, i32);

    fn frame(&self) -> Rect {
        let origin = self.position();
        let (width, height) = self.size();
        Rect::from_xywh(origin.x, origin.y, width, height)
    }
}

/// Creates backing windows for popups built from menu definitions
pub trait WindowFactory {
    fn create_window(&mut self, title: &str) -> Box<dyn PopupWindow>;
}
