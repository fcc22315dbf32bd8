use thiserror::Error;

use crate::geometry::Rect;
use crate::popup::PopupId;

/// Errors raised by the popup engine
///
/// None of these are recoverable at runtime: they mean the caller handed the
/// tree a stale handle or the environment reported impossible geometry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PopupError {
    #[error("no popup with id {0:?}")]
    UnknownPopup(PopupId),
    #[error("popup {popup:?} has no item at index {index}")]
    UnknownItem { popup: PopupId, index: usize },
    #[error("no monitor contains {0:?}")]
    NoMonitor(Rect),
    #[error("confinement height {available} leaves no room for items inside padding {padding}")]
    NoRoomForItems { available: i32, padding: i32 },
    #[error("popup {child:?} is already an ancestor of {parent:?}")]
    CascadeCycle { parent: PopupId, child: PopupId },
}

/// Errors raised while loading configuration or menu files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
