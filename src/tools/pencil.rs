use crate::command::Command;
use crate::error::PropertyError;
use crate::geometry::PixelCoordinates;
use crate::graphic::Paint;
use crate::input::{DragPhase, PointerEvent};
use crate::tools::brush::{self, BRUSH_WIDTH, MAX_BRUSH_WIDTH};
use crate::tools::{Tool, ToolContext, ToolId, ToolProperties, ToolProperty};

const OPACITY: &str = "opacity";

/// Paints a square brush of the selected color
#[derive(Debug, Clone)]
pub struct PencilTool {
    properties: ToolProperties,
    /// Set once the current drag has drawn something
    drawing: bool,
}

impl PencilTool {
    pub fn new() -> Result<Self, PropertyError> {
        Ok(Self {
            properties: ToolProperties::new(vec![
                ToolProperty::slider(BRUSH_WIDTH, "Brush width", 1.0, MAX_BRUSH_WIDTH, 1.0, "px", 1.0),
                ToolProperty::slider(OPACITY, "Opacity", 0.0, 100.0, 1.0, "%", 100.0),
            ])?,
            drawing: false,
        })
    }

    fn width(&self) -> u32 {
        brush::width_property(self.properties.slider(BRUSH_WIDTH))
    }

    fn paint(&self, ctx: &ToolContext<'_>) -> Option<Paint> {
        let opacity = self.properties.slider(OPACITY).unwrap_or(100.0) / 100.0;
        ctx.color.map(|color| Paint::over(color.with_opacity(opacity)))
    }
}

impl Tool for PencilTool {
    fn id(&self) -> ToolId {
        ToolId::Pencil
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
                let Some(paint) = self.paint(ctx) else {
                    log::debug!("Pencil has no color selected");
                    return None;
                };
                let graphic = brush::stamp(ctx, event.coords, self.width(), paint);
                ctx.grid.draw(&graphic);
                self.drawing = true;
                None
            }
            DragPhase::Stop | DragPhase::Abort => {
                std::mem::take(&mut self.drawing).then_some(Command::Commit { tool: ToolId::Pencil })
            }
        }
    }

    fn preview_cursor(&mut self, coords: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        if let Some(paint) = self.paint(ctx) {
            let graphic = brush::stamp(ctx, coords, self.width(), paint);
            ctx.grid.draw_cursor(&graphic);
        }
    }

    fn current_state_name(&self) -> &'static str {
        if self.drawing { "Drawing" } else { "Idle" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RgbaColor;
    use crate::grid::{Grid, MirrorSettings};

    #[test]
    fn test_click_paints_footprint_and_commits() {
        let mut grid = Grid::new(8, 8).unwrap();
        let mut tool = PencilTool::new().unwrap();
        tool.properties_mut().set_slider(BRUSH_WIDTH, 3.0).unwrap();
        let mut ctx = ToolContext::new(&mut grid, Some(RgbaColor::BLACK));

        let pointer = PointerEvent::new(PixelCoordinates::new(4, 4));
        assert!(tool.invoke_action(DragPhase::Start, pointer, &mut ctx).is_none());
        assert_eq!(
            tool.invoke_action(DragPhase::Stop, pointer, &mut ctx),
            Some(Command::Commit { tool: ToolId::Pencil })
        );

        let painted = ctx.grid.pixels(crate::backend::Target::Layer(ctx.grid.selected_layer_id().unwrap()));
        assert_eq!(painted.iter().filter(|c| !c.is_empty()).count(), 9);
        assert_eq!(ctx.grid.get_pixel(PixelCoordinates::new(3, 3)), RgbaColor::BLACK);
        assert_eq!(ctx.grid.get_pixel(PixelCoordinates::new(6, 6)), RgbaColor::TRANSPARENT);
    }

    #[test]
    fn test_without_color_does_nothing() {
        let mut grid = Grid::new(4, 4).unwrap();
        let mut tool = PencilTool::new().unwrap();
        let mut ctx = ToolContext::new(&mut grid, None);
        let pointer = PointerEvent::new(PixelCoordinates::new(1, 1));
        tool.invoke_action(DragPhase::Start, pointer, &mut ctx);
        assert!(tool.invoke_action(DragPhase::Stop, pointer, &mut ctx).is_none());
        assert_eq!(ctx.grid.get_pixel(PixelCoordinates::new(1, 1)), RgbaColor::TRANSPARENT);
    }

    #[test]
    fn test_mirrored_stroke() {
        let mut grid = Grid::new(6, 6).unwrap();
        grid.set_mirror(MirrorSettings { x: true, y: true });
        let mut tool = PencilTool::new().unwrap();
        let mut ctx = ToolContext::new(&mut grid, Some(RgbaColor::WHITE));
        ctx.mirror = true;

        tool.invoke_action(DragPhase::Start, PointerEvent::new(PixelCoordinates::new(0, 1)), &mut ctx);
        for (x, y) in [(0, 1), (5, 1), (0, 4), (5, 4)] {
            assert_eq!(ctx.grid.get_pixel(PixelCoordinates::new(x, y)), RgbaColor::WHITE);
        }
    }
}
