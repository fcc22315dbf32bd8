//! Hierarchical popup menus
//!
//! Popups hold ordered items, open nested folder popups next to the item that
//! invited them, split into columns when taller than the screen and collapse
//! as a chain when focus leaves it. Windows, monitors, settings and command
//! execution are reached through traits; [`window::HeadlessDisplay`] and
//! [`monitor::MonitorLayout`] run the engine without a display server.

pub mod command;
pub mod config;
pub mod error;
pub mod geometry;
pub mod menu;
pub mod monitor;
pub mod popup;
pub mod window;

pub use error::{ConfigError, PopupError};
pub use popup::{Popup, PopupId, PopupItem, PopupTree};
