use crate::geometry::PixelRect;
use crate::layer::LayerId;
use crate::tools::ToolId;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ToolChanged {
        old: ToolId,
        new: ToolId,
    },
    ToolPropertyChanged {
        tool: ToolId,
        name: String,
    },
    ColorSelected {
        hex: String,
    },
    /// Any change to what the canvas shows, previews included
    GridChanged,
    /// A tool finished a gesture and its result was recorded in history
    Committed {
        tool: ToolId,
    },
    HistoryChanged {
        undo_depth: usize,
        redo_depth: usize,
    },
    LayerChanged(LayerEvent),
    SelectionChanged(SelectionEvent),
    DocumentChanged(DocumentEvent),
}

impl EditorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToolChanged { .. } => "tool-changed",
            Self::ToolPropertyChanged { .. } => "tool-property-changed",
            Self::ColorSelected { .. } => "color-selected",
            Self::GridChanged => "grid-changed",
            Self::Committed { .. } => "committed",
            Self::HistoryChanged { .. } => "history-changed",
            Self::LayerChanged(_) => "layer-changed",
            Self::SelectionChanged(_) => "selection-changed",
            Self::DocumentChanged(_) => "document-changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    Added { id: LayerId },
    Removed { id: LayerId },
    Selected { index: usize },
    PropertiesChanged { id: LayerId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    Created { bounds: PixelRect },
    Moved { bounds: PixelRect },
    Committed,
    Reverted,
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    Loaded,
    Saved,
    Resized { width: u32, height: u32 },
    ImageImported { width: u32, height: u32 },
}
