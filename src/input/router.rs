use std::collections::HashSet;

use crate::command::Command;
use crate::geometry::PixelCoordinates;
use crate::tools::{Tool, ToolContext, ToolType};

use super::{CanvasEvent, DragPhase, PointerEvent};

/// Routes canvas events to the active tool according to its capabilities.
///
/// Owns the drag state: whether a drag is running, the last pointer position
/// and, for pixel-tracking tools, the pixels already visited in this drag.
#[derive(Debug, Default)]
pub struct ToolDispatcher {
    dragging: bool,
    last: Option<PointerEvent>,
    visited: HashSet<PixelCoordinates>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Forgets any running drag without invoking the tool.
    pub fn reset(&mut self) {
        self.dragging = false;
        self.visited.clear();
    }

    pub fn handle(&mut self, event: CanvasEvent, tool: &mut ToolType, ctx: &mut ToolContext<'_>) -> Vec<Command> {
        let caps = tool.capabilities();
        ctx.mirror = caps.can_mirror;
        let mut commands = Vec::new();

        match event {
            CanvasEvent::DragStart(pointer) => {
                if self.dragging {
                    // A start without a stop: close the previous drag where it was last seen.
                    if let Some(last) = self.last {
                        commands.extend(self.invoke(tool, DragPhase::Stop, last, ctx));
                    }
                }
                self.dragging = true;
                self.visited.clear();
                self.visited.insert(pointer.coords);
                self.last = Some(pointer);
                ctx.grid.clear_cursor();
                commands.extend(self.invoke(tool, DragPhase::Start, pointer, ctx));
            }
            CanvasEvent::Move(pointer) => {
                self.last = Some(pointer);
                if !self.dragging {
                    if caps.show_preview_on_invoke {
                        ctx.grid.clear_cursor();
                        tool.preview_cursor(pointer.coords, ctx);
                    }
                } else if caps.invoke_on_move {
                    let first_visit = self.visited.insert(pointer.coords);
                    if first_visit || !caps.track_pixels {
                        commands.extend(self.invoke(tool, DragPhase::Move, pointer, ctx));
                    }
                }
            }
            CanvasEvent::DragStop(pointer) => {
                self.last = Some(pointer);
                if self.dragging {
                    commands.extend(self.invoke(tool, DragPhase::Stop, pointer, ctx));
                }
            }
            CanvasEvent::MouseLeave => {
                ctx.grid.clear_cursor();
                if self.dragging {
                    if let Some(last) = self.last {
                        commands.extend(self.invoke(tool, DragPhase::Abort, last, ctx));
                    }
                }
                self.reset();
                self.last = None;
            }
        }
        commands
    }

    fn invoke(&mut self, tool: &mut ToolType, phase: DragPhase, pointer: PointerEvent, ctx: &mut ToolContext<'_>) -> Option<Command> {
        log::trace!("{} {:?} at {:?}", tool.name(), phase, pointer.coords);
        if phase.is_end() {
            self.reset();
        }
        tool.invoke_action(phase, pointer, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RgbaColor;
    use crate::grid::Grid;
    use crate::tools::ToolId;

    fn at(x: i32, y: i32) -> PointerEvent {
        PointerEvent::new(PixelCoordinates::new(x, y))
    }

    #[test]
    fn test_tracked_tool_blends_each_pixel_once_per_drag() {
        let mut grid = Grid::new(4, 4).unwrap();
        let mut tool = ToolType::new(ToolId::Pencil).unwrap();
        tool.properties_mut().set_slider("opacity", 50.0).unwrap();
        let mut dispatcher = ToolDispatcher::new();
        let mut ctx = ToolContext::new(&mut grid, Some(RgbaColor::opaque(255, 0, 0)));

        dispatcher.handle(CanvasEvent::DragStart(at(1, 1)), &mut tool, &mut ctx);
        dispatcher.handle(CanvasEvent::Move(at(2, 1)), &mut tool, &mut ctx);
        dispatcher.handle(CanvasEvent::Move(at(1, 1)), &mut tool, &mut ctx);
        let commands = dispatcher.handle(CanvasEvent::DragStop(at(1, 1)), &mut tool, &mut ctx);

        assert_eq!(commands, vec![Command::Commit { tool: ToolId::Pencil }]);
        let first = ctx.grid.get_pixel(PixelCoordinates::new(1, 1));
        let second = ctx.grid.get_pixel(PixelCoordinates::new(2, 1));
        assert_eq!(first, second);
        assert!(first.a < 255);
    }

    #[test]
    fn test_mouse_leave_aborts_drag() {
        let mut grid = Grid::new(4, 4).unwrap();
        let mut tool = ToolType::new(ToolId::Pencil).unwrap();
        let mut dispatcher = ToolDispatcher::new();
        let mut ctx = ToolContext::new(&mut grid, Some(RgbaColor::BLACK));

        dispatcher.handle(CanvasEvent::DragStart(at(0, 0)), &mut tool, &mut ctx);
        let commands = dispatcher.handle(CanvasEvent::MouseLeave, &mut tool, &mut ctx);
        assert_eq!(commands.len(), 1);
        assert!(!dispatcher.is_dragging());

        // Nothing left to abort
        assert!(dispatcher.handle(CanvasEvent::MouseLeave, &mut tool, &mut ctx).is_empty());
    }

    #[test]
    fn test_hover_preview_only_for_previewing_tools() {
        let mut grid = Grid::new(4, 4).unwrap();
        let mut dispatcher = ToolDispatcher::new();
        let color = RgbaColor::opaque(0, 0, 255);

        let mut pencil = ToolType::new(ToolId::Pencil).unwrap();
        let mut ctx = ToolContext::new(&mut grid, Some(color));
        dispatcher.handle(CanvasEvent::Move(at(3, 3)), &mut pencil, &mut ctx);
        assert_eq!(ctx.grid.get_pixel_on(crate::backend::Target::Cursor, PixelCoordinates::new(3, 3)), color);
        assert_eq!(ctx.grid.get_pixel(PixelCoordinates::new(3, 3)), RgbaColor::TRANSPARENT);

        ctx.grid.clear_cursor();
        let mut picker = ToolType::new(ToolId::Picker).unwrap();
        dispatcher.handle(CanvasEvent::Move(at(2, 2)), &mut picker, &mut ctx);
        assert!(ctx.grid.pixels(crate::backend::Target::Cursor).iter().all(|c| c.is_empty()));
    }

    #[test]
    fn test_fill_ignores_moves() {
        let mut grid = Grid::new(4, 4).unwrap();
        let mut tool = ToolType::new(ToolId::Fill).unwrap();
        let mut dispatcher = ToolDispatcher::new();
        let mut ctx = ToolContext::new(&mut grid, Some(RgbaColor::BLACK));

        let start = dispatcher.handle(CanvasEvent::DragStart(at(0, 0)), &mut tool, &mut ctx);
        assert_eq!(start, vec![Command::Commit { tool: ToolId::Fill }]);
        assert!(dispatcher.handle(CanvasEvent::Move(at(1, 0)), &mut tool, &mut ctx).is_empty());
        assert!(dispatcher.handle(CanvasEvent::DragStop(at(1, 0)), &mut tool, &mut ctx).is_empty());
    }
}
