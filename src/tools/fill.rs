use crate::command::Command;
use crate::error::PropertyError;
use crate::geometry::PixelCoordinates;
use crate::graphic::{Graphic, Paint};
use crate::input::{DragPhase, PointerEvent};
use crate::tools::{Tool, ToolContext, ToolId, ToolProperties, ToolProperty};

const TOLERANCE: &str = "tolerance";

/// Flood fills pixels similar to the one clicked
#[derive(Debug, Clone)]
pub struct FillTool {
    properties: ToolProperties,
}

impl FillTool {
    pub fn new() -> Result<Self, PropertyError> {
        Ok(Self {
            properties: ToolProperties::new(vec![ToolProperty::slider(
                TOLERANCE, "Tolerance", 0.0, 100.0, 1.0, "%", 0.0,
            )])?,
        })
    }

    /// Tolerance as a similarity threshold in [0, 1]
    fn tolerance(&self) -> f32 {
        self.properties.slider(TOLERANCE).unwrap_or(0.0) / 100.0
    }
}

impl Tool for FillTool {
    fn id(&self) -> ToolId {
        ToolId::Fill
    }

    fn properties(&self) -> &ToolProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut ToolProperties {
        &mut self.properties
    }

    fn invoke_action(&mut self, phase: DragPhase, event: PointerEvent, ctx: &mut ToolContext<'_>) -> Option<Command> {
        if phase != DragPhase::Start {
            return None;
        }
        let color = ctx.color?;
        if ctx.grid.get_pixel(event.coords) == color {
            return None;
        }

        let mut graphic = Graphic::new(Paint::over(color));
        let filled = ctx.grid.flood_fill(&mut graphic, event.coords, self.tolerance());
        if filled == 0 {
            return None;
        }
        ctx.grid.draw(&graphic);
        Some(Command::Commit { tool: ToolId::Fill })
    }

    fn preview_cursor(&mut self, coords: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        if let Some(color) = ctx.color {
            let mut graphic = Graphic::new(Paint::over(color));
            graphic.pixel(coords);
            ctx.grid.draw_cursor(&graphic);
        }
    }
}
