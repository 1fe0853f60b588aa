use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::DEFAULT_HISTORY_DEPTH;

/// Errors that can occur while reading or writing the settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn visuals(self) -> egui::Visuals {
        match self {
            Self::Light => egui::Visuals::light(),
            Self::Dark => egui::Visuals::dark(),
        }
    }
}

/// User preferences saved with each project
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
}

/// Startup configuration for the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")] // fields missing from older files keep their defaults
pub struct EditorSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Most snapshots kept in the undo history
    pub history_depth: usize,
    /// Hex colors the palette starts with
    pub palette: Vec<String>,
    pub theme: Theme,
    /// Screen pixels per canvas pixel
    pub zoom: f32,
    /// Where rotating autosaves are written. Autosave is off when unset.
    pub autosave_dir: Option<PathBuf>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            canvas_width: 32,
            canvas_height: 32,
            history_depth: DEFAULT_HISTORY_DEPTH,
            palette: [
                "#000000ff", "#ffffffff", "#9d9d9dff", "#be2633ff", "#e06f8bff", "#493c2bff", "#a46422ff", "#eb8931ff",
                "#f7e26bff", "#2f484eff", "#44891aff", "#a3ce27ff", "#1b2632ff", "#005784ff", "#31a2f2ff", "#b2dcefff",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            theme: Theme::default(),
            zoom: 12.0,
            autosave_dir: None,
        }
    }
}

impl EditorSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path.as_ref())?;
        let settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Loads the settings file, falling back to defaults when it is missing or broken.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        if let Some(dir) = path.as_ref().parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
