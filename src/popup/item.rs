use crate::config::FolderTrigger;
use crate::geometry::Point;

use super::PopupId;

/// What an item does when interacted with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Runs `command` through the command sink
    Command { command: String },
    /// Opens `popup` as a nested child; `open` mirrors the cascade state
    Folder { popup: PopupId, open: bool },
    /// Label only
    Info,
    Separator,
}

/// Pointer interaction state of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum HoverState {
    #[default]
    Normal,
    Hover,
    Pressed,
}

/// Pointer input routed to a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEvent {
    PointerEnter,
    PointerLeave,
    ButtonDown,
    ButtonUp,
}

/// Side effect requested by an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemAction {
    Execute(String),
    OpenFolder(PopupId),
    CloseFolder(PopupId),
}

/// Fixed metrics used to size items without a text shaper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemMetrics {
    pub line_height: i32,
    pub separator_height: i32,
    /// Average advance of one character of the item font
    pub glyph_width: i32,
    pub icon_size: i32,
    /// Space on each side of the label, and between icon and label
    pub text_padding: i32,
    /// Room reserved for the submenu arrow of folder items
    pub arrow_width: i32,
}

impl Default for ItemMetrics {
    fn default() -> Self {
        Self {
            line_height: 22,
            separator_height: 9,
            glyph_width: 7,
            icon_size: 16,
            text_padding: 8,
            arrow_width: 12,
        }
    }
}

/// A row inside a popup
#[derive(Debug, Clone)]
pub struct PopupItem {
    kind: ItemKind,
    title: String,
    icon: Option<String>,
    icon_visible: bool,
    hover: HoverState,
    position: Point,
    width: i32,
    height: i32,
    desired_width: Option<i32>,
    metrics: ItemMetrics,
}

impl PopupItem {
    pub fn new(kind: ItemKind, title: impl Into<String>) -> Self {
        let metrics = ItemMetrics::default();
        let height = match kind {
            ItemKind::Separator => metrics.separator_height,
            _ => metrics.line_height,
        };

        Self {
            kind,
            title: title.into(),
            icon: None,
            icon_visible: true,
            hover: HoverState::Normal,
            position: Point::default(),
            width: 0,
            height,
            desired_width: None,
            metrics,
        }
    }

    pub fn command(title: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(
            ItemKind::Command {
                command: command.into(),
            },
            title,
        )
    }

    pub fn folder(title: impl Into<String>, popup: PopupId) -> Self {
        Self::new(ItemKind::Folder { popup, open: false }, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(ItemKind::Info, title)
    }

    pub fn separator() -> Self {
        Self::new(ItemKind::Separator, "")
    }

    // === Builder API ===

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Replace the computed height (e.g. a taller info banner)
    pub fn with_height(mut self, height: i32) -> Self {
        self.height = height;
        self
    }

    /// Replace the estimated width with a measured one
    pub fn with_desired_width(mut self, width: i32) -> Self {
        self.desired_width = Some(width);
        self
    }

    pub fn with_metrics(mut self, metrics: ItemMetrics) -> Self {
        self.height = match self.kind {
            ItemKind::Separator => metrics.separator_height,
            _ => metrics.line_height,
        };
        self.metrics = metrics;
        self
    }

    // === Getters ===

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn hover_state(&self) -> HoverState {
        self.hover
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self.kind, ItemKind::Command { .. } | ItemKind::Folder { .. })
    }

    /// Child popup of a folder item
    pub fn folder_popup(&self) -> Option<PopupId> {
        match self.kind {
            ItemKind::Folder { popup, .. } => Some(popup),
            _ => None,
        }
    }

    pub fn is_folder_open(&self) -> bool {
        matches!(self.kind, ItemKind::Folder { open: true, .. })
    }

    /// Width this item would like, never more than `max_width`
    pub fn desired_width(&self, max_width: i32) -> i32 {
        let wanted = match self.desired_width {
            Some(width) => width,
            None => self.estimate_width(),
        };
        wanted.min(max_width).max(0)
    }

    fn estimate_width(&self) -> i32 {
        let m = &self.metrics;
        let label = self.title.chars().count() as i32 * m.glyph_width + m.text_padding * 2;
        match self.kind {
            ItemKind::Separator => 0,
            _ => {
                let icon = if self.icon.is_some() && self.icon_visible {
                    m.icon_size + m.text_padding
                } else {
                    0
                };
                let arrow = if matches!(self.kind, ItemKind::Folder { .. }) {
                    m.arrow_width
                } else {
                    0
                };
                label + icon + arrow
            }
        }
    }

    // === State Mutations ===

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = Point::new(x, y);
    }

    pub fn set_width(&mut self, width: i32) {
        self.width = width;
    }

    pub(crate) fn set_icon_visible(&mut self, visible: bool) {
        self.icon_visible = visible;
    }

    pub(crate) fn set_folder_open(&mut self, is_open: bool) {
        if let ItemKind::Folder { open, .. } = &mut self.kind {
            *open = is_open;
        }
    }

    /// The child popup this folder invited has closed
    pub(crate) fn closing_popup(&mut self) {
        self.set_folder_open(false);
        if self.hover == HoverState::Pressed {
            self.hover = HoverState::Normal;
        }
    }

    pub(crate) fn reset_hover(&mut self) {
        self.hover = HoverState::Normal;
    }

    /// Advance the hover state machine and report the action to perform
    pub fn handle_event(&mut self, event: ItemEvent, trigger: FolderTrigger) -> Option<ItemAction> {
        if !self.is_interactive() {
            return None;
        }

        match event {
            ItemEvent::PointerEnter => {
                if self.hover == HoverState::Normal {
                    self.hover = HoverState::Hover;
                }
                match self.kind {
                    ItemKind::Folder { popup, open: false } if trigger == FolderTrigger::Hover => {
                        Some(ItemAction::OpenFolder(popup))
                    }
                    _ => None,
                }
            }
            ItemEvent::PointerLeave => {
                self.hover = HoverState::Normal;
                None
            }
            ItemEvent::ButtonDown => {
                self.hover = HoverState::Pressed;
                None
            }
            ItemEvent::ButtonUp => {
                if self.hover != HoverState::Pressed {
                    return None;
                }
                self.hover = HoverState::Hover;
                match &self.kind {
                    ItemKind::Command { command } => Some(ItemAction::Execute(command.clone())),
                    ItemKind::Folder { popup, open: true } => Some(ItemAction::CloseFolder(*popup)),
                    ItemKind::Folder { popup, open: false } => {
                        Some(ItemAction::OpenFolder(*popup))
                    }
                    ItemKind::Info | ItemKind::Separator => None,
                }
            }
        }
    }
}
