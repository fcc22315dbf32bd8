mod focus;
mod item;
pub mod layout;
pub mod placement;
mod tree;

pub use focus::Direction;
pub use item::{HoverState, ItemAction, ItemEvent, ItemKind, ItemMetrics, PopupItem};
pub use layout::Layout;
pub use tree::PopupTree;

use crate::config::PopupSettings;
use crate::error::PopupError;
use crate::window::{PopupWindow, WindowId};

use layout::LayoutParams;

/// Handle to a popup stored in a [`PopupTree`]
///
/// Handles of released popups never alias popups created later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopupId {
    index: u32,
    generation: u32,
}

impl PopupId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

/// Open/closed state of a popup within its cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    Closed,
    Open,
    OpenWithChild,
}

/// A floating list of items backed by a window
///
/// Cross references (`owner`, `open_child`) are handles into the owning
/// [`PopupTree`], which performs every cascade transition.
pub struct Popup {
    title: String,
    bang: Option<String>,
    prefix: String,
    items: Vec<PopupItem>,
    settings: PopupSettings,
    /// Current direction; reset to `settings.expand_left` on close
    expand_left: bool,
    sized: bool,
    /// Confinement height the current layout was computed for
    layout_height: Option<i32>,
    layout: Option<Layout>,
    mouse_over: bool,
    owner: Option<PopupId>,
    open_child: Option<PopupId>,
    /// Index of the folder item that invited `open_child`
    child_item: Option<usize>,
    window: Box<dyn PopupWindow>,
}

impl std::fmt::Debug for Popup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Popup")
            .field("title", &self.title)
            .field("bang", &self.bang)
            .field("prefix", &self.prefix)
            .field("items", &self.items.len())
            .field("window", &self.window.id())
            .field("owner", &self.owner)
            .field("open_child", &self.open_child)
            .finish()
    }
}

impl Popup {
    pub fn new(
        title: impl Into<String>,
        bang: Option<String>,
        prefix: impl Into<String>,
        settings: PopupSettings,
        mut window: Box<dyn PopupWindow>,
    ) -> Self {
        let title = title.into();
        window.set_text(&title);
        Self {
            title,
            bang,
            prefix: prefix.into(),
            items: Vec::new(),
            expand_left: settings.expand_left,
            settings,
            sized: false,
            layout_height: None,
            layout: None,
            mouse_over: false,
            owner: None,
            open_child: None,
            child_item: None,
            window,
        }
    }

    // === Getters ===

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn bang(&self) -> Option<&str> {
        self.bang.as_deref()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn items(&self) -> &[PopupItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&PopupItem> {
        self.items.get(index)
    }

    pub fn settings(&self) -> &PopupSettings {
        &self.settings
    }

    pub fn expand_left(&self) -> bool {
        self.expand_left
    }

    pub fn is_sized(&self) -> bool {
        self.sized
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn is_mouse_over(&self) -> bool {
        self.mouse_over
    }

    pub fn owner(&self) -> Option<PopupId> {
        self.owner
    }

    pub fn open_child(&self) -> Option<PopupId> {
        self.open_child
    }

    pub fn child_item(&self) -> Option<usize> {
        self.child_item
    }

    pub fn window(&self) -> &dyn PopupWindow {
        self.window.as_ref()
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn is_visible(&self) -> bool {
        self.window.is_visible()
    }

    pub fn state(&self) -> CascadeState {
        if !self.window.is_visible() {
            CascadeState::Closed
        } else if self.open_child.is_some() {
            CascadeState::OpenWithChild
        } else {
            CascadeState::Open
        }
    }

    // === Layout ===

    /// Pack the items for a confinement `available_height` pixels tall and
    /// resize the window to match
    pub fn size(&mut self, available_height: i32) -> Result<(), PopupError> {
        let params = LayoutParams {
            padding: self.settings.padding,
            spacing: self.settings.item_spacing,
            width: self.settings.width,
            max_width: self.settings.max_width,
        };
        let layout = layout::compute(&self.items, &params, available_height)?;

        for (item, position) in self.items.iter_mut().zip(&layout.positions) {
            item.set_position(position.x, position.y);
            item.set_width(layout.item_width);
        }

        self.window.resize(layout.width, layout.height);
        self.sized = true;
        self.layout_height = Some(available_height);
        self.layout = Some(layout);
        Ok(())
    }

    fn needs_layout(&self, available_height: i32) -> bool {
        !self.sized || self.layout_height != Some(available_height)
    }

    fn extent(&self) -> (i32, i32) {
        self.layout
            .as_ref()
            .map(|l| (l.width, l.height))
            .unwrap_or_else(|| self.window.size())
    }

    fn apply_settings(&mut self, settings: PopupSettings) {
        let icons = !settings.no_icons;
        for item in &mut self.items {
            item.set_icon_visible(icons);
        }
        if !self.window.is_visible() {
            self.expand_left = settings.expand_left;
        }
        self.settings = settings;
        self.sized = false;
    }
}
