use crate::color::RgbaColor;
use crate::command::Command;
use crate::error::PropertyError;
use crate::geometry::PixelCoordinates;
use crate::graphic::Paint;
use crate::input::{DragPhase, PointerEvent};
use crate::tools::brush::{self, BRUSH_WIDTH, MAX_BRUSH_WIDTH};
use crate::tools::{Tool, ToolContext, ToolId, ToolProperties, ToolProperty};

const PREVIEW_COLOR: RgbaColor = RgbaColor::new(255, 255, 255, 160);

/// Clears pixels under a square brush
#[derive(Debug, Clone)]
pub struct EraserTool {
    properties: ToolProperties,
    erasing: bool,
}

impl EraserTool {
    pub fn new() -> Result<Self, PropertyError> {
        Ok(Self {
            properties: ToolProperties::new(vec![ToolProperty::slider(
                BRUSH_WIDTH,
                "Brush width",
                1.0,
                MAX_BRUSH_WIDTH,
                1.0,
                "px",
                1.0,
            )])?,
            erasing: false,
        })
    }

    fn width(&self) -> u32 {
        brush::width_property(self.properties.slider(BRUSH_WIDTH))
    }
}

impl Tool for EraserTool {
    fn id(&self) -> ToolId {
        ToolId::Eraser
    }

    fn properties(&self) -> &ToolProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut ToolProperties {
        &mut self.properties
    }

    fn invoke_action(&mut self, phase: DragPhase, event: PointerEvent, ctx: &mut ToolContext<'_>) -> Option<Command> {
        match phase {
            DragPhase::Start | DragPhase::Move => {
                let graphic = brush::stamp(ctx, event.coords, self.width(), Paint::erase());
                ctx.grid.draw(&graphic);
                self.erasing = true;
                None
            }
            DragPhase::Stop | DragPhase::Abort => {
                std::mem::take(&mut self.erasing).then_some(Command::Commit { tool: ToolId::Eraser })
            }
        }
    }

    fn preview_cursor(&mut self, coords: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        let graphic = brush::stamp(ctx, coords, self.width(), Paint::over(PREVIEW_COLOR));
        ctx.grid.draw_cursor(&graphic);
    }

    fn current_state_name(&self) -> &'static str {
        if self.erasing { "Erasing" } else { "Idle" }
    }
}
