use crate::color::RgbaColor;
use crate::command::Command;
use crate::error::PropertyError;
use crate::geometry::PixelCoordinates;
use crate::graphic::{Graphic, Paint, Shape};
use crate::input::{DragPhase, PointerEvent};
use crate::tools::brush::{self, MAX_BRUSH_WIDTH};
use crate::tools::{Tool, ToolContext, ToolId, ToolProperties, ToolProperty};

const LINE_WIDTH: &str = "line-width";

/// Snaps `current` onto the dominant axis through `start`. Exact diagonals are kept.
pub fn snap_line_end(start: PixelCoordinates, current: PixelCoordinates) -> PixelCoordinates {
    let dx = (current.x - start.x).abs();
    let dy = (current.y - start.y).abs();
    if dy < dx {
        PixelCoordinates::new(current.x, start.y)
    } else if dx < dy {
        PixelCoordinates::new(start.x, current.y)
    } else {
        current
    }
}

#[derive(Debug, Clone)]
pub struct LineTool {
    properties: ToolProperties,
    start: Option<PixelCoordinates>,
}

impl LineTool {
    pub fn new() -> Result<Self, PropertyError> {
        Ok(Self {
            properties: ToolProperties::new(vec![ToolProperty::slider(
                LINE_WIDTH,
                "Line width",
                1.0,
                MAX_BRUSH_WIDTH,
                1.0,
                "px",
                1.0,
            )])?,
            start: None,
        })
    }

    fn graphic(&self, start: PixelCoordinates, event: &PointerEvent, color: RgbaColor, ctx: &ToolContext<'_>) -> Graphic {
        let end = if event.alt() { snap_line_end(start, event.coords) } else { event.coords };
        let width = brush::width_property(self.properties.slider(LINE_WIDTH));

        let mut lines = vec![(start, end)];
        if ctx.mirror {
            // Both ends reflect in the same order, so zipping pairs them up.
            lines = ctx
                .grid
                .reflect_coordinates(start, 1, 1)
                .into_iter()
                .zip(ctx.grid.reflect_coordinates(end, 1, 1))
                .collect();
            lines.dedup();
        }

        let mut graphic = Graphic::new(Paint::over(color));
        for (from, to) in lines {
            graphic.push(Shape::Line { from, to, width });
        }
        graphic
    }
}

impl Tool for LineTool {
    fn id(&self) -> ToolId {
        ToolId::Line
    }

    fn properties(&self) -> &ToolProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut ToolProperties {
        &mut self.properties
    }

    fn dispose(&mut self, ctx: &mut ToolContext<'_>) -> Option<Command> {
        if self.start.take().is_some() {
            ctx.grid.clear_cursor();
        }
        None
    }

    fn invoke_action(&mut self, phase: DragPhase, event: PointerEvent, ctx: &mut ToolContext<'_>) -> Option<Command> {
        let Some(color) = ctx.color else {
            self.start = None;
            return None;
        };
        if phase == DragPhase::Start {
            self.start = Some(event.coords);
        }
        let start = self.start?;
        let graphic = self.graphic(start, &event, color, ctx);
        ctx.grid.clear_cursor();

        if phase.is_end() {
            self.start = None;
            ctx.grid.draw(&graphic);
            Some(Command::Commit { tool: ToolId::Line })
        } else {
            ctx.grid.draw_cursor(&graphic);
            None
        }
    }

    fn preview_cursor(&mut self, coords: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        let Some(color) = ctx.color else { return };
        let width = brush::width_property(self.properties.slider(LINE_WIDTH));
        let mut graphic = Graphic::new(Paint::over(color));
        graphic.push(Shape::Line { from: coords, to: coords, width });
        ctx.grid.draw_cursor(&graphic);
    }

    fn current_state_name(&self) -> &'static str {
        if self.start.is_some() { "Dragging" } else { "Idle" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, MirrorSettings};
    use egui::Modifiers;

    fn p(x: i32, y: i32) -> PixelCoordinates {
        PixelCoordinates::new(x, y)
    }

    #[test]
    fn test_snap_line_end() {
        assert_eq!(snap_line_end(p(0, 0), p(5, 2)), p(5, 0));
        assert_eq!(snap_line_end(p(0, 0), p(1, 4)), p(0, 4));
        assert_eq!(snap_line_end(p(0, 0), p(3, 3)), p(3, 3));
    }

    #[test]
    fn test_alt_drag_draws_horizontal_line() {
        let mut grid = Grid::new(8, 8).unwrap();
        let mut tool = LineTool::new().unwrap();
        let mut ctx = ToolContext::new(&mut grid, Some(RgbaColor::BLACK));

        tool.invoke_action(DragPhase::Start, PointerEvent::new(p(1, 1)), &mut ctx);
        let end = PointerEvent::with_modifiers(p(6, 3), Modifiers::ALT);
        assert!(tool.invoke_action(DragPhase::Stop, end, &mut ctx).is_some());

        for x in 1..=6 {
            assert_eq!(ctx.grid.get_pixel(p(x, 1)), RgbaColor::BLACK);
        }
        assert!(ctx.grid.get_pixel(p(6, 3)).is_empty());
    }

    #[test]
    fn test_mirrored_line() {
        let mut grid = Grid::new(8, 8).unwrap();
        grid.set_mirror(MirrorSettings { x: true, y: false });
        let mut tool = LineTool::new().unwrap();
        let mut ctx = ToolContext::new(&mut grid, Some(RgbaColor::BLACK));
        ctx.mirror = true;

        tool.invoke_action(DragPhase::Start, PointerEvent::new(p(0, 0)), &mut ctx);
        tool.invoke_action(DragPhase::Stop, PointerEvent::new(p(2, 0)), &mut ctx);
        for x in [0, 1, 2, 5, 6, 7] {
            assert_eq!(ctx.grid.get_pixel(p(x, 0)), RgbaColor::BLACK);
        }
        assert!(ctx.grid.get_pixel(p(4, 0)).is_empty());
    }
}
