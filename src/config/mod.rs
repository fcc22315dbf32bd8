use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toml::map::Entry;
use tracing::warn;

use crate::error::ConfigError;
use crate::geometry::Padding;

/// Interaction that opens a folder item's child popup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FolderTrigger {
    /// Open as soon as the pointer enters the folder item
    #[default]
    Hover,
    /// Open only when the folder item is clicked
    Click,
}

/// Settings read by every popup at construction and on reload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupSettings {
    /// Vertical gap between items, and horizontal gap between columns
    #[serde(default = "default_item_spacing")]
    pub item_spacing: i32,
    /// Upper bound for the popup width when items ask for more room
    #[serde(default = "default_max_width")]
    pub max_width: i32,
    /// Minimum popup width
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default)]
    pub no_icons: bool,
    /// Grow leftwards from the anchor instead of rightwards
    #[serde(default)]
    pub expand_left: bool,
    #[serde(default)]
    pub confine_to_monitor: bool,
    /// Takes precedence over `confine_to_monitor`
    #[serde(default)]
    pub confine_to_work_area: bool,
    #[serde(default)]
    pub child_offset_x: i32,
    #[serde(default)]
    pub child_offset_y: i32,
    #[serde(default)]
    pub padding: Padding,
    #[serde(default)]
    pub folder_trigger: FolderTrigger,
    /// Close the whole cascade after a command item fires
    #[serde(default = "default_close_on_command")]
    pub close_on_command: bool,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            item_spacing: default_item_spacing(),
            max_width: default_max_width(),
            width: default_width(),
            no_icons: false,
            expand_left: false,
            confine_to_monitor: false,
            confine_to_work_area: false,
            child_offset_x: 0,
            child_offset_y: 0,
            padding: Padding::default(),
            folder_trigger: FolderTrigger::default(),
            close_on_command: default_close_on_command(),
        }
    }
}

fn default_item_spacing() -> i32 {
    2
}

fn default_max_width() -> i32 {
    300
}

fn default_width() -> i32 {
    200
}

fn default_close_on_command() -> bool {
    true
}

/// Keyed source of popup settings
///
/// `prefix` names the popup (its settings section); unknown prefixes get the
/// shared defaults.
pub trait SettingsProvider {
    fn popup_settings(&self, prefix: &str) -> PopupSettings;
}

impl SettingsProvider for PopupSettings {
    fn popup_settings(&self, _prefix: &str) -> PopupSettings {
        self.clone()
    }
}

/// Popup configuration file
///
/// ```toml
/// [popup]
/// item_spacing = 2
/// padding = { left = 5, top = 5, right = 5, bottom = 5 }
///
/// [popups.quicklaunch]
/// max_width = 400
/// expand_left = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults shared by every popup
    pub popup: PopupSettings,
    /// Per-popup overrides, merged over `popup`
    pub popups: BTreeMap<String, toml::Table>,
}

impl Config {
    /// Load and merge every config file found, lowest priority first
    pub fn load() -> Self {
        let mut candidates = Vec::new();
        candidates.extend(get_system_config_path());
        candidates.extend(get_user_config_path());
        candidates.push(PathBuf::from("otto_popup.toml"));
        if let Ok(path) = std::env::var("OTTO_POPUP_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        Self::load_layered(&candidates)
    }

    /// Merge the given files in order; missing or broken files are skipped
    pub fn load_layered(paths: &[PathBuf]) -> Self {
        let mut merged = match toml::Value::try_from(Self::default()) {
            Ok(value) => value,
            Err(err) => {
                warn!("default config is not representable as toml: {err}");
                return Self::default();
            }
        };

        let mut found_any_config = false;
        for path in paths {
            let Ok(content) = std::fs::read_to_string(path) else {
                continue;
            };
            match content.parse::<toml::Value>() {
                Ok(value) => {
                    merge_value(&mut merged, value);
                    found_any_config = true;
                    tracing::info!("Loaded popup config from {}", path.display());
                }
                Err(err) => warn!("Failed to parse {}: {err}", path.display()),
            }
        }

        if !found_any_config {
            tracing::debug!("No popup configuration file found, using defaults");
        }

        merged.try_into().unwrap_or_else(|err| {
            warn!("Falling back to default popup config due to invalid overrides: {err}");
            Self::default()
        })
    }

    /// Read a single file, failing on IO or parse errors
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Settings for the popup named `prefix`
    pub fn settings_for(&self, prefix: &str) -> PopupSettings {
        let Some(overrides) = self.popups.get(prefix) else {
            return self.popup.clone();
        };

        let mut merged = match toml::Value::try_from(&self.popup) {
            Ok(value) => value,
            Err(err) => {
                warn!("popup defaults are not representable as toml: {err}");
                return self.popup.clone();
            }
        };
        merge_value(&mut merged, toml::Value::Table(overrides.clone()));

        merged.try_into().unwrap_or_else(|err| {
            warn!("Ignoring invalid settings for popup {prefix}: {err}");
            self.popup.clone()
        })
    }
}

impl SettingsProvider for Config {
    fn popup_settings(&self, prefix: &str) -> PopupSettings {
        self.settings_for(prefix)
    }
}

fn merge_value(base: &mut toml::Value, overrides: toml::Value) {
    match (base, overrides) {
        (toml::Value::Table(base_map), toml::Value::Table(override_map)) => {
            for (key, override_value) in override_map {
                match base_map.entry(key) {
                    Entry::Occupied(mut entry) => merge_value(entry.get_mut(), override_value),
                    Entry::Vacant(entry) => {
                        entry.insert(override_value);
                    }
                }
            }
        }
        (base_value, override_value) => {
            *base_value = override_value;
        }
    }
}

fn get_system_config_path() -> Option<PathBuf> {
    let path = PathBuf::from("/etc/otto/popup.toml");
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

fn get_user_config_path() -> Option<PathBuf> {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".config"))
        })?;

    let path = config_dir.join("otto").join("popup.toml");
    if path.exists() {
        Some(path)
    } else {
        None
    }
}
