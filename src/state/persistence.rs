use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::RgbaColor;
use crate::geometry::{ColorRect, raster_from_rectangles, rectangles_from_raster};
use crate::layer::BlendMode;
use crate::settings::Preferences;
use crate::tools::{ToolId, ToolState};
use crate::util::time;

/// Errors that can occur during project persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize project: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to access project file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid project data: {0}")]
    InvalidState(String),

    #[error("Failed to decode or encode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// A saved project: preferences, tool settings, palette and every layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// Version of the application that wrote the document
    pub version: String,
    #[serde(default)]
    pub preferences: Preferences,
    pub tools: ToolsDocument,
    pub palette: PaletteDocument,
    pub canvas: CanvasDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolsDocument {
    pub selected_tool: ToolId,
    /// Property values per tool name
    #[serde(default)]
    pub state: BTreeMap<String, ToolState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PaletteDocument {
    pub selected_color: Option<RgbaColor>,
    pub colors: Vec<RgbaColor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasDocument {
    pub settings: CanvasSettingsDocument,
    pub layers: LayersDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CanvasSettingsDocument {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub mirror_x: bool,
    #[serde(default)]
    pub mirror_y: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayersDocument {
    pub selected_layer: usize,
    pub layers: Vec<LayerDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDocument {
    pub label: String,
    pub visible: bool,
    pub alpha: f32,
    #[serde(rename = "blendMode", default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub filters: Vec<String>,
    pub data: LayerData,
}

/// Pixels of one layer, either verbatim or as solid rectangles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "kebab-case")]
pub enum LayerData {
    Raw { pixels: Vec<RgbaColor> },
    Rectangles { rects: Vec<ColorRect> },
}

/// How layer pixels are written into a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerEncoding {
    Raw,
    #[default]
    Rectangles,
}

impl LayerData {
    pub fn encode(pixels: Vec<RgbaColor>, width: u32, height: u32, encoding: LayerEncoding) -> Self {
        match encoding {
            LayerEncoding::Raw => Self::Raw { pixels },
            LayerEncoding::Rectangles => Self::Rectangles {
                rects: rectangles_from_raster(&pixels, width, height),
            },
        }
    }

    /// Row-major pixels for a `width × height` canvas.
    pub fn decode(&self, width: u32, height: u32) -> PersistenceResult<Vec<RgbaColor>> {
        match self {
            Self::Raw { pixels } => {
                if pixels.len() != width as usize * height as usize {
                    return Err(PersistenceError::InvalidState(format!(
                        "raw layer has {} pixels, canvas is {}x{}",
                        pixels.len(),
                        width,
                        height
                    )));
                }
                Ok(pixels.clone())
            }
            Self::Rectangles { rects } => {
                let outside = |r: &&ColorRect| {
                    r.x.checked_add(r.width).is_none_or(|right| right > width)
                        || r.y.checked_add(r.height).is_none_or(|bottom| bottom > height)
                };
                if let Some(rect) = rects.iter().find(outside) {
                    return Err(PersistenceError::InvalidState(format!(
                        "rectangle {:?} lies outside the {}x{} canvas",
                        rect, width, height
                    )));
                }
                Ok(raster_from_rectangles(rects, width, height))
            }
        }
    }
}

impl ProjectDocument {
    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PersistenceResult<Self> {
        let document: Self = serde_json::from_str(json)?;
        document.validate()?;
        if document.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Project version {} differs from current version {}",
                document.version,
                env!("CARGO_PKG_VERSION")
            );
        }
        Ok(document)
    }

    /// Checks what serde cannot: sizes and indices.
    pub fn validate(&self) -> PersistenceResult<()> {
        let settings = &self.canvas.settings;
        if settings.width == 0 || settings.height == 0 {
            return Err(PersistenceError::InvalidState(format!(
                "canvas size {}x{}",
                settings.width, settings.height
            )));
        }
        let layers = &self.canvas.layers;
        if layers.layers.is_empty() {
            return Err(PersistenceError::InvalidState("project has no layers".to_string()));
        }
        if layers.selected_layer >= layers.layers.len() {
            return Err(PersistenceError::InvalidState(format!(
                "selected layer {} of {}",
                layers.selected_layer,
                layers.layers.len()
            )));
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_json()?)?;
        log::info!("Saved project to {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref();
        let document = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded project from {}", path.display());
        Ok(document)
    }
}

/// Manages timed autosaves of the project in one directory
#[derive(Debug, Clone)]
pub struct StatePersistence {
    /// Directory where autosave files are stored
    state_dir: PathBuf,
    /// Maximum number of auto-save files to keep
    max_autosaves: usize,
    /// Interval between auto-saves in seconds
    autosave_interval: u64,
    /// Last auto-save timestamp
    last_autosave: u64,
}

impl StatePersistence {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            max_autosaves: 5,
            autosave_interval: 300,
            last_autosave: 0,
        }
    }

    pub fn with_limits(mut self, max_autosaves: usize, autosave_interval: u64) -> Self {
        self.max_autosaves = max_autosaves.max(1);
        self.autosave_interval = autosave_interval;
        self
    }

    pub fn should_autosave(&self) -> bool {
        time::timestamp_secs().saturating_sub(self.last_autosave) >= self.autosave_interval
    }

    /// Writes an autosave when the interval has passed. Returns the file written, if any.
    pub fn try_autosave(&mut self, document: &ProjectDocument) -> PersistenceResult<Option<PathBuf>> {
        if !self.should_autosave() {
            return Ok(None);
        }
        let now = time::timestamp_secs();
        let path = self.state_dir.join(format!("autosave_{}.json", now));
        document.save(&path)?;
        self.last_autosave = now;
        self.cleanup_old_autosaves()?;
        Ok(Some(path))
    }

    fn autosaves(&self) -> PersistenceResult<Vec<PathBuf>> {
        let mut autosaves: Vec<_> = fs::read_dir(&self.state_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("autosave_"))
            .map(|entry| entry.path())
            .collect();
        // Timestamps in the names sort oldest first
        autosaves.sort();
        Ok(autosaves)
    }

    fn cleanup_old_autosaves(&self) -> PersistenceResult<()> {
        let autosaves = self.autosaves()?;
        let excess = autosaves.len().saturating_sub(self.max_autosaves);
        for path in &autosaves[..excess] {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Find the most recent auto-save file
    pub fn find_latest_autosave(&self) -> PersistenceResult<Option<PathBuf>> {
        if !self.state_dir.exists() {
            return Ok(None);
        }
        Ok(self.autosaves()?.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> ProjectDocument {
        let red = RgbaColor::opaque(255, 0, 0);
        ProjectDocument {
            version: env!("CARGO_PKG_VERSION").to_string(),
            preferences: Preferences::default(),
            tools: ToolsDocument {
                selected_tool: ToolId::Pencil,
                state: BTreeMap::new(),
            },
            palette: PaletteDocument {
                selected_color: Some(red),
                colors: vec![red, RgbaColor::BLACK],
            },
            canvas: CanvasDocument {
                settings: CanvasSettingsDocument {
                    width: 2,
                    height: 2,
                    mirror_x: true,
                    mirror_y: false,
                },
                layers: LayersDocument {
                    selected_layer: 0,
                    layers: vec![LayerDocument {
                        label: "Layer 1".to_string(),
                        visible: true,
                        alpha: 1.0,
                        blend_mode: BlendMode::Normal,
                        filters: Vec::new(),
                        data: LayerData::encode(vec![red, red, RgbaColor::TRANSPARENT, red], 2, 2, LayerEncoding::Rectangles),
                    }],
                },
            },
        }
    }

    #[test]
    fn test_json_keys() {
        let json = document().to_json().unwrap();
        for key in ["\"selected-tool\"", "\"selected-color\"", "\"mirror-x\"", "\"selected-layer\"", "\"blendMode\"", "\"format\": \"rectangles\""] {
            assert!(json.contains(key), "missing {} in {}", key, json);
        }
    }

    #[test]
    fn test_document_round_trip() {
        let doc = document();
        assert_eq!(ProjectDocument::from_json(&doc.to_json().unwrap()).unwrap(), doc);
    }

    #[test]
    fn test_layer_data_decodes_either_format() {
        let pixels = vec![RgbaColor::BLACK, RgbaColor::TRANSPARENT, RgbaColor::WHITE, RgbaColor::WHITE];
        for encoding in [LayerEncoding::Raw, LayerEncoding::Rectangles] {
            let data = LayerData::encode(pixels.clone(), 2, 2, encoding);
            assert_eq!(data.decode(2, 2).unwrap(), pixels);
        }
    }

    #[test]
    fn test_invalid_documents_are_rejected() {
        let mut doc = document();
        doc.canvas.layers.selected_layer = 3;
        assert!(matches!(ProjectDocument::from_json(&doc.to_json().unwrap()), Err(PersistenceError::InvalidState(_))));

        let raw = LayerData::Raw { pixels: vec![RgbaColor::BLACK] };
        assert!(raw.decode(2, 2).is_err());

        assert!(matches!(ProjectDocument::from_json("{\"version\": 1}"), Err(PersistenceError::Serialization(_))));
    }

    #[test]
    fn test_rectangle_past_u32_range_is_rejected() {
        let wide = LayerData::Rectangles {
            rects: vec![ColorRect { x: u32::MAX, y: 0, width: 2, height: 1, color: RgbaColor::BLACK }],
        };
        assert!(matches!(wide.decode(4, 4), Err(PersistenceError::InvalidState(_))));

        let tall = LayerData::Rectangles {
            rects: vec![ColorRect { x: 0, y: 1, width: 1, height: u32::MAX, color: RgbaColor::BLACK }],
        };
        assert!(matches!(tall.decode(4, 4), Err(PersistenceError::InvalidState(_))));
    }

    #[test]
    fn test_autosave_rotation() {
        let dir = std::env::temp_dir().join(format!("pixel_paint_autosave_{}", uuid::Uuid::new_v4()));
        let mut persistence = StatePersistence::new(&dir).with_limits(2, 0);
        assert!(persistence.find_latest_autosave().unwrap().is_none());

        let path = persistence.try_autosave(&document()).unwrap().unwrap();
        assert_eq!(persistence.find_latest_autosave().unwrap(), Some(path.clone()));
        assert_eq!(ProjectDocument::load(&path).unwrap(), document());
        std::fs::remove_dir_all(dir).unwrap();
    }
}
