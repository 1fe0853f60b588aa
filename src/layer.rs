use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A unique identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub Uuid);

impl LayerId {
    /// Creates a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a layer combines with the layers below it when the canvas is composited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Add,
}

impl BlendMode {
    pub const ALL: [BlendMode; 4] = [BlendMode::Normal, BlendMode::Multiply, BlendMode::Screen, BlendMode::Add];

    pub fn label(self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Add => "Add",
        }
    }

    /// Blends one straight-alpha channel pair, both in `[0, 1]`
    pub fn blend_channel(self, below: f32, above: f32) -> f32 {
        match self {
            BlendMode::Normal => above,
            BlendMode::Multiply => below * above,
            BlendMode::Screen => 1.0 - (1.0 - below) * (1.0 - above),
            BlendMode::Add => (below + above).min(1.0),
        }
    }
}

/// Layer metadata. The pixels themselves live in the render backend under the layer's id.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Unique identifier for the layer
    pub id: LayerId,
    /// Display name of the layer
    pub label: String,
    /// Whether the layer is currently visible
    pub visible: bool,
    /// Layer opacity in `[0, 1]`
    pub alpha: f32,
    pub blend_mode: BlendMode,
    /// Filter names carried through save/load untouched
    pub filters: Vec<String>,
}

impl Layer {
    pub fn new(label: &str) -> Self {
        Self {
            id: LayerId::new(),
            label: label.to_string(),
            visible: true,
            alpha: 1.0,
            blend_mode: BlendMode::Normal,
            filters: Vec::new(),
        }
    }

    pub fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }
}
