//! Popup hierarchies described in TOML
//!
//! ```toml
//! [[menu]]
//! title = "Apps"
//! bang = "!AppsPopup"
//!
//! [[menu.items]]
//! type = "command"
//! title = "Terminal"
//! command = "alacritty"
//!
//! [[menu.items]]
//! type = "folder"
//! title = "Games"
//! items = [{ type = "command", title = "Chess", command = "gnome-chess" }]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::CommandSink;
use crate::config::SettingsProvider;
use crate::error::{ConfigError, PopupError};
use crate::monitor::MonitorProvider;
use crate::popup::{PopupId, PopupItem, PopupTree};
use crate::window::WindowFactory;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuFile {
    #[serde(default)]
    pub menu: Vec<MenuDefinition>,
}

/// A root popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuDefinition {
    pub title: String,
    /// Command string that shows this popup, e.g. `!AppsPopup`
    #[serde(default)]
    pub bang: Option<String>,
    /// Settings section for this popup; defaults to the lowercased title
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemDefinition {
    Command {
        title: String,
        command: String,
        #[serde(default)]
        icon: Option<String>,
    },
    Folder {
        title: String,
        #[serde(default)]
        icon: Option<String>,
        /// Settings section of the nested popup; inherited when unset
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        items: Vec<ItemDefinition>,
    },
    Info {
        title: String,
        #[serde(default)]
        icon: Option<String>,
    },
    Separator,
}

impl MenuFile {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse menu definitions; `origin` names the source in errors
    pub fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Create every popup described here, returning the root popups in order
    pub fn build<M, C>(
        &self,
        tree: &mut PopupTree<M, C>,
        windows: &mut dyn WindowFactory,
        settings: &dyn SettingsProvider,
    ) -> Result<Vec<PopupId>, PopupError>
    where
        M: MonitorProvider,
        C: CommandSink,
    {
        self.menu
            .iter()
            .map(|menu| menu.build(tree, windows, settings))
            .collect()
    }
}

impl MenuDefinition {
    pub fn prefix(&self) -> String {
        self.prefix
            .clone()
            .unwrap_or_else(|| self.title.to_lowercase())
    }

    pub fn build<M, C>(
        &self,
        tree: &mut PopupTree<M, C>,
        windows: &mut dyn WindowFactory,
        settings: &dyn SettingsProvider,
    ) -> Result<PopupId, PopupError>
    where
        M: MonitorProvider,
        C: CommandSink,
    {
        let prefix = self.prefix();
        build_popup(
            tree,
            windows,
            settings,
            &self.title,
            self.bang.as_deref(),
            &prefix,
            &self.items,
        )
    }
}

fn build_popup<M, C>(
    tree: &mut PopupTree<M, C>,
    windows: &mut dyn WindowFactory,
    settings: &dyn SettingsProvider,
    title: &str,
    bang: Option<&str>,
    prefix: &str,
    items: &[ItemDefinition],
) -> Result<PopupId, PopupError>
where
    M: MonitorProvider,
    C: CommandSink,
{
    let window = windows.create_window(title);
    let id = tree.create(title, bang, prefix, settings, window);

    for definition in items {
        let item = match definition {
            ItemDefinition::Command {
                title,
                command,
                icon,
            } => with_icon(PopupItem::command(title, command), icon),
            ItemDefinition::Folder {
                title,
                icon,
                prefix: child_prefix,
                items,
            } => {
                let child_prefix = child_prefix.as_deref().unwrap_or(prefix);
                let child = build_popup(tree, windows, settings, title, None, child_prefix, items)?;
                with_icon(PopupItem::folder(title, child), icon)
            }
            ItemDefinition::Info { title, icon } => with_icon(PopupItem::info(title), icon),
            ItemDefinition::Separator => PopupItem::separator(),
        };
        tree.add_item(id, item)?;
    }

    debug!("built popup '{}' with {} items", title, items.len());
    Ok(id)
}

fn with_icon(item: PopupItem, icon: &Option<String>) -> PopupItem {
    match icon {
        Some(icon) => item.with_icon(icon),
        None => item,
    }
}
