mod history;

pub use history::{DEFAULT_HISTORY_DEPTH, History};

use crate::color::RgbaColor;
use crate::tools::ToolId;

/// Something the editor does on behalf of a tool or the UI
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// A tool finished a gesture; record the grid in history
    Commit { tool: ToolId },
    /// Add a color to the palette and select it
    PickColor(RgbaColor),
    SelectColor(usize),
    SelectTool(ToolId),
    Undo,
    Redo,
}
