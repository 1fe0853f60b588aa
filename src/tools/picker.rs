use crate::command::Command;
use crate::input::{DragPhase, PointerEvent};
use crate::tools::{Tool, ToolContext, ToolId, ToolProperties};

/// Picks the color under the pointer into the palette
#[derive(Debug, Clone, Default)]
pub struct PickerTool {
    properties: ToolProperties,
}

impl PickerTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for PickerTool {
    fn id(&self) -> ToolId {
        ToolId::Picker
    }

    fn properties(&self) -> &ToolProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut ToolProperties {
        &mut self.properties
    }

    fn invoke_action(&mut self, phase: DragPhase, event: PointerEvent, ctx: &mut ToolContext<'_>) -> Option<Command> {
        if phase.is_end() {
            return None;
        }
        let color = ctx.grid.get_pixel(event.coords);
        // Empty pixels leave the palette alone
        (!color.is_empty()).then_some(Command::PickColor(color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RgbaColor;
    use crate::geometry::PixelCoordinates;
    use crate::graphic::{Graphic, Paint};
    use crate::grid::Grid;

    #[test]
    fn test_pick_non_empty_pixel() {
        let mut grid = Grid::new(4, 4).unwrap();
        let color = RgbaColor::new(10, 20, 30, 255);
        let mut graphic = Graphic::new(Paint::over(color));
        graphic.pixel(PixelCoordinates::new(2, 2));
        grid.draw(&graphic);

        let mut tool = PickerTool::new();
        let mut ctx = ToolContext::new(&mut grid, None);
        let command = tool.invoke_action(DragPhase::Start, PointerEvent::new(PixelCoordinates::new(2, 2)), &mut ctx);
        assert_eq!(command, Some(Command::PickColor(color)));

        let empty = tool.invoke_action(DragPhase::Move, PointerEvent::new(PixelCoordinates::new(0, 0)), &mut ctx);
        assert!(empty.is_none());
    }
}
