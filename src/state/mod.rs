pub mod context;
mod persistence;

pub use context::{EditorContext, PropertyValue};
pub use persistence::{
    CanvasDocument, CanvasSettingsDocument, LayerData, LayerDocument, LayerEncoding, LayersDocument, PaletteDocument,
    PersistenceError, PersistenceResult, ProjectDocument, StatePersistence, ToolsDocument,
};
