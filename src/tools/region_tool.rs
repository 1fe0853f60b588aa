use crate::backend::Target;
use crate::color::RgbaColor;
use crate::command::Command;
use crate::error::PropertyError;
use crate::event::{EditorEvent, SelectionEvent};
use crate::geometry::{PixelCoordinates, PixelRect};
use crate::graphic::{Graphic, Paint, Shape};
use crate::input::{DragPhase, PointerEvent};
use crate::layer::LayerId;
use crate::selection::SelectedRegion;
use crate::tools::{Tool, ToolContext, ToolId, ToolProperties, ToolProperty};

const RESET: &str = "reset";
const MARQUEE_COLOR: RgbaColor = RgbaColor::new(0, 120, 215, 200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionMode {
    /// Cut pixels out of the layer and move them
    Select,
    /// Copy pixels and stamp them wherever the user clicks
    Clone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Idle,
    /// Drawing the marquee from `start`
    Selecting { start: PixelCoordinates },
    /// Moving the selected region; deltas are measured from `start`
    Dragging { start: PixelCoordinates },
    /// Following the pointer with a clone stamp
    Stamping,
}

/// Select and clone tools.
///
/// Both work in two stages: a marquee drag captures the painted pixels
/// strictly inside it, then later drags move (select) or stamp (clone) that
/// region.
#[derive(Debug, Clone)]
pub struct RegionTool {
    mode: RegionMode,
    properties: ToolProperties,
    state: RegionState,
    region: Option<SelectedRegion>,
    /// Layer the region was captured from
    source: Option<LayerId>,
}

impl RegionTool {
    pub fn new(mode: RegionMode) -> Result<Self, PropertyError> {
        Ok(Self {
            mode,
            properties: ToolProperties::new(vec![ToolProperty::button(RESET, "Reset", RESET)])?,
            state: RegionState::Idle,
            region: None,
            source: None,
        })
    }

    pub fn mode(&self) -> RegionMode {
        self.mode
    }

    pub fn state(&self) -> RegionState {
        self.state
    }

    pub fn region(&self) -> Option<&SelectedRegion> {
        self.region.as_ref()
    }

    fn draw_marquee(start: PixelCoordinates, current: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        let rect = PixelRect::from_corners(start, current);
        let mut graphic = Graphic::new(Paint::over(MARQUEE_COLOR));
        graphic.push(Shape::Box {
            origin: PixelCoordinates::new(rect.x, rect.y),
            width: rect.width - 1,
            height: rect.height - 1,
            filled: false,
        });
        ctx.grid.clear_cursor();
        ctx.grid.draw_cursor(&graphic);
    }

    /// Captures the pixels strictly inside the marquee.
    fn capture(&mut self, start: PixelCoordinates, end: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        ctx.grid.clear_cursor();
        let Some(source) = ctx.grid.selected_layer_id() else {
            log::trace!("No layer to capture from");
            return;
        };
        let outer = PixelRect::from_corners(start, end);
        let inner = PixelRect::new(outer.x + 1, outer.y + 1, outer.width - 2, outer.height - 2).intersect(&ctx.grid.bounds());
        if inner.is_empty() {
            log::debug!("Marquee {:?} has no interior", outer);
            return;
        }

        let origin = PixelCoordinates::new(inner.x, inner.y);
        let frame = ctx.grid.get_pixel_frame(origin, inner.width as u32, inner.height as u32);
        let Some(region) = SelectedRegion::capture(origin, inner.width as u32, inner.height as u32, &frame) else {
            log::debug!("Marquee {:?} captured no pixels", inner);
            return;
        };
        log::debug!("{:?} captured {} pixels in {:?}", self.mode, region.pixels().len(), inner);

        if self.mode == RegionMode::Select {
            ctx.grid.draw_on(Target::Layer(source), &region.original_footprint());
        }
        ctx.notify(EditorEvent::SelectionChanged(SelectionEvent::Created { bounds: region.bounds() }));
        self.region = Some(region);
        self.source = Some(source);
        self.redraw_floating(ctx);
    }

    fn redraw_floating(&self, ctx: &mut ToolContext<'_>) {
        ctx.grid.clear(Target::Floating);
        if self.mode != RegionMode::Select {
            return;
        }
        if let Some(region) = &self.region {
            let bounds = ctx.grid.bounds();
            for graphic in region.graphics_at_current(bounds) {
                ctx.grid.draw_on(Target::Floating, &graphic);
            }
        }
    }

    /// Writes the region's current pixels into `layer`, or the selected layer
    /// when that one no longer exists.
    fn place(region: &SelectedRegion, layer: Option<LayerId>, ctx: &mut ToolContext<'_>) {
        let target = layer
            .filter(|id| ctx.grid.layer(*id).is_some())
            .or_else(|| ctx.grid.selected_layer_id())
            .map(Target::Layer);
        let Some(target) = target else {
            return;
        };
        let bounds = ctx.grid.bounds();
        for graphic in region.graphics_at_current(bounds) {
            ctx.grid.draw_on(target, &graphic);
        }
    }

    /// Places a select region and forgets it. Returns whether there was one.
    fn commit_region(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let Some(region) = self.region.take() else {
            return false;
        };
        Self::place(&region, self.source.take(), ctx);
        ctx.grid.clear(Target::Floating);
        ctx.notify(EditorEvent::SelectionChanged(SelectionEvent::Committed));
        true
    }

    fn discard_region(&mut self, ctx: &mut ToolContext<'_>) {
        self.source = None;
        if self.region.take().is_some() {
            ctx.grid.clear(Target::Floating);
            ctx.grid.clear_cursor();
            ctx.notify(EditorEvent::SelectionChanged(SelectionEvent::Discarded));
        }
    }

    fn preview_stamp(&self, center: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        if let Some(region) = &self.region {
            let mut stamp = region.clone();
            stamp.center_on(center);
            let bounds = ctx.grid.bounds();
            ctx.grid.clear_cursor();
            for graphic in stamp.graphics_at_current(bounds) {
                ctx.grid.draw_cursor(&graphic);
            }
        }
    }

    fn invoke_select(&mut self, phase: DragPhase, coords: PixelCoordinates, ctx: &mut ToolContext<'_>) -> Option<Command> {
        match (phase, self.state) {
            (DragPhase::Start, _) => {
                let inside = self.region.as_ref().is_some_and(|r| r.contains(coords));
                if inside {
                    self.state = RegionState::Dragging { start: coords };
                    return None;
                }
                self.state = RegionState::Selecting { start: coords };
                Self::draw_marquee(coords, coords, ctx);
                self.commit_region(ctx).then_some(Command::Commit { tool: ToolId::Select })
            }
            (DragPhase::Move, RegionState::Selecting { start }) => {
                Self::draw_marquee(start, coords, ctx);
                None
            }
            (DragPhase::Move, RegionState::Dragging { start }) => {
                let (dx, dy) = coords.delta(start);
                if let Some(region) = &mut self.region {
                    region.transform(dx, dy);
                    let bounds = region.bounds();
                    ctx.notify(EditorEvent::SelectionChanged(SelectionEvent::Moved { bounds }));
                }
                self.redraw_floating(ctx);
                None
            }
            (DragPhase::Stop, RegionState::Selecting { start }) => {
                self.state = RegionState::Idle;
                self.capture(start, coords, ctx);
                None
            }
            // Leaving the canvas throws the marquee away
            (DragPhase::Abort, RegionState::Selecting { .. }) => {
                self.state = RegionState::Idle;
                ctx.grid.clear_cursor();
                None
            }
            (DragPhase::Stop | DragPhase::Abort, RegionState::Dragging { start }) => {
                self.state = RegionState::Idle;
                if let Some(region) = &mut self.region {
                    let (dx, dy) = coords.delta(start);
                    region.transform(dx, dy);
                    region.stop_transform();
                }
                self.redraw_floating(ctx);
                None
            }
            _ => None,
        }
    }

    fn invoke_clone(&mut self, phase: DragPhase, coords: PixelCoordinates, ctx: &mut ToolContext<'_>) -> Option<Command> {
        match (phase, self.state) {
            (DragPhase::Start, _) => {
                if self.region.is_some() {
                    self.state = RegionState::Stamping;
                    self.preview_stamp(coords, ctx);
                } else {
                    self.state = RegionState::Selecting { start: coords };
                    Self::draw_marquee(coords, coords, ctx);
                }
                None
            }
            (DragPhase::Move, RegionState::Selecting { start }) => {
                Self::draw_marquee(start, coords, ctx);
                None
            }
            (DragPhase::Move, RegionState::Stamping) => {
                self.preview_stamp(coords, ctx);
                None
            }
            (DragPhase::Stop, RegionState::Selecting { start }) => {
                self.state = RegionState::Idle;
                self.capture(start, coords, ctx);
                None
            }
            (DragPhase::Abort, RegionState::Selecting { .. }) => {
                self.state = RegionState::Idle;
                ctx.grid.clear_cursor();
                None
            }
            (DragPhase::Stop | DragPhase::Abort, RegionState::Stamping) => {
                self.state = RegionState::Idle;
                ctx.grid.clear_cursor();
                let region = self.region.as_mut()?;
                region.center_on(coords);
                Self::place(region, None, ctx);
                Some(Command::Commit { tool: ToolId::Clone })
            }
            _ => None,
        }
    }
}

impl Tool for RegionTool {
    fn id(&self) -> ToolId {
        match self.mode {
            RegionMode::Select => ToolId::Select,
            RegionMode::Clone => ToolId::Clone,
        }
    }

    fn properties(&self) -> &ToolProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut ToolProperties {
        &mut self.properties
    }

    fn initialize(&mut self, _ctx: &mut ToolContext<'_>) {
        self.state = RegionState::Idle;
    }

    fn dispose(&mut self, ctx: &mut ToolContext<'_>) -> Option<Command> {
        self.state = RegionState::Idle;
        ctx.grid.clear_cursor();
        match self.mode {
            RegionMode::Select => self.commit_region(ctx).then_some(Command::Commit { tool: ToolId::Select }),
            RegionMode::Clone => {
                self.discard_region(ctx);
                None
            }
        }
    }

    fn invoke_action(&mut self, phase: DragPhase, event: PointerEvent, ctx: &mut ToolContext<'_>) -> Option<Command> {
        match self.mode {
            RegionMode::Select => self.invoke_select(phase, event.coords, ctx),
            RegionMode::Clone => self.invoke_clone(phase, event.coords, ctx),
        }
    }

    fn preview_cursor(&mut self, coords: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        if self.mode == RegionMode::Clone {
            self.preview_stamp(coords, ctx);
        }
    }

    fn trigger(&mut self, event: &str, ctx: &mut ToolContext<'_>) -> Option<Command> {
        if event != RESET {
            log::warn!("{} has no button event {:?}", self.name(), event);
            return None;
        }
        self.state = RegionState::Idle;
        match self.mode {
            RegionMode::Select => {
                if let Some(mut region) = self.region.take() {
                    region.revert();
                    Self::place(&region, self.source.take(), ctx);
                    ctx.grid.clear(Target::Floating);
                    ctx.notify(EditorEvent::SelectionChanged(SelectionEvent::Reverted));
                }
            }
            RegionMode::Clone => self.discard_region(ctx),
        }
        None
    }

    fn has_pending(&self) -> bool {
        self.mode == RegionMode::Select && self.region.is_some()
    }

    fn current_state_name(&self) -> &'static str {
        match self.state {
            RegionState::Idle => "Idle",
            RegionState::Selecting { .. } => "Selecting",
            RegionState::Dragging { .. } => "Dragging",
            RegionState::Stamping => "Stamping",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    const RED: RgbaColor = RgbaColor::opaque(255, 0, 0);

    fn p(x: i32, y: i32) -> PixelCoordinates {
        PixelCoordinates::new(x, y)
    }

    fn grid_with_block() -> Grid {
        let mut grid = Grid::new(10, 10).unwrap();
        let mut block = Graphic::new(Paint::over(RED));
        block.rect(PixelRect::new(2, 2, 2, 2));
        grid.draw(&block);
        grid
    }

    fn drag(tool: &mut RegionTool, from: PixelCoordinates, to: PixelCoordinates, ctx: &mut ToolContext<'_>) -> Vec<Command> {
        let mut out = Vec::new();
        out.extend(tool.invoke_action(DragPhase::Start, PointerEvent::new(from), ctx));
        out.extend(tool.invoke_action(DragPhase::Move, PointerEvent::new(to), ctx));
        out.extend(tool.invoke_action(DragPhase::Stop, PointerEvent::new(to), ctx));
        out
    }

    #[test]
    fn test_select_cuts_and_floats() {
        let mut grid = grid_with_block();
        let mut tool = RegionTool::new(RegionMode::Select).unwrap();
        let mut ctx = ToolContext::new(&mut grid, None);

        drag(&mut tool, p(1, 1), p(4, 4), &mut ctx);
        let region = tool.region().unwrap();
        assert_eq!(region.pixels().len(), 4);
        assert!(ctx.grid.get_pixel(p(2, 2)).is_empty());
        assert_eq!(ctx.grid.get_pixel_on(Target::Floating, p(2, 2)), RED);
        assert!(tool.has_pending());
        assert!(matches!(
            ctx.take_events()[..],
            [EditorEvent::SelectionChanged(SelectionEvent::Created { .. })]
        ));
    }

    #[test]
    fn test_marquee_edge_pixels_are_not_captured() {
        let mut grid = grid_with_block();
        let mut tool = RegionTool::new(RegionMode::Select).unwrap();
        let mut ctx = ToolContext::new(&mut grid, None);

        // The marquee edge runs through the block's top-left pixel
        drag(&mut tool, p(2, 2), p(5, 5), &mut ctx);
        assert_eq!(tool.region().unwrap().pixels().len(), 1);
        assert_eq!(ctx.grid.get_pixel(p(2, 2)), RED);
    }

    #[test]
    fn test_move_then_commit_outside() {
        let mut grid = grid_with_block();
        let mut tool = RegionTool::new(RegionMode::Select).unwrap();
        let mut ctx = ToolContext::new(&mut grid, None);

        drag(&mut tool, p(1, 1), p(4, 4), &mut ctx);
        drag(&mut tool, p(2, 2), p(6, 5), &mut ctx);
        assert_eq!(ctx.grid.get_pixel_on(Target::Floating, p(6, 5)), RED);

        // A drag starting outside places the region and starts a new marquee
        let commands = drag(&mut tool, p(0, 9), p(1, 9), &mut ctx);
        assert_eq!(commands, vec![Command::Commit { tool: ToolId::Select }]);
        assert_eq!(ctx.grid.get_pixel(p(6, 5)), RED);
        assert_eq!(ctx.grid.get_pixel(p(7, 6)), RED);
        assert!(ctx.grid.get_pixel(p(2, 2)).is_empty());
        assert!(tool.region().is_none());
    }

    #[test]
    fn test_reset_restores_cut_pixels() {
        let mut grid = grid_with_block();
        let mut tool = RegionTool::new(RegionMode::Select).unwrap();
        let mut ctx = ToolContext::new(&mut grid, None);

        drag(&mut tool, p(1, 1), p(4, 4), &mut ctx);
        drag(&mut tool, p(3, 3), p(8, 8), &mut ctx);
        assert!(tool.trigger(RESET, &mut ctx).is_none());

        assert_eq!(ctx.grid.get_pixel(p(2, 2)), RED);
        assert_eq!(ctx.grid.get_pixel(p(3, 3)), RED);
        assert!(ctx.grid.get_pixel(p(8, 8)).is_empty());
        assert!(ctx.grid.pixels(Target::Floating).iter().all(|c| c.is_empty()));
    }

    #[test]
    fn test_cut_pixels_return_to_their_own_layer() {
        let mut grid = grid_with_block();
        let bottom = grid.selected_layer_id().unwrap();
        let mut tool = RegionTool::new(RegionMode::Select).unwrap();
        let mut ctx = ToolContext::new(&mut grid, None);

        drag(&mut tool, p(1, 1), p(4, 4), &mut ctx);
        assert_eq!(tool.source, Some(bottom));
        let top = ctx.grid.add_layer("Top");
        tool.trigger(RESET, &mut ctx);

        assert_eq!(ctx.grid.get_pixel_on(Target::Layer(bottom), p(2, 2)), RED);
        assert!(ctx.grid.get_pixel_on(Target::Layer(top), p(2, 2)).is_empty());

        // Placing after a move also lands on the source layer
        ctx.grid.select_layer(0);
        drag(&mut tool, p(1, 1), p(4, 4), &mut ctx);
        ctx.grid.select_layer(1);
        drag(&mut tool, p(2, 2), p(5, 2), &mut ctx);
        assert!(tool.dispose(&mut ctx).is_some());
        assert_eq!(ctx.grid.get_pixel_on(Target::Layer(bottom), p(5, 2)), RED);
        assert!(ctx.grid.get_pixel_on(Target::Layer(top), p(5, 2)).is_empty());
        assert!(tool.source.is_none());
    }

    #[test]
    fn test_dispose_commits_select_and_discards_clone() {
        let mut grid = grid_with_block();
        let mut select = RegionTool::new(RegionMode::Select).unwrap();
        let mut ctx = ToolContext::new(&mut grid, None);
        drag(&mut select, p(1, 1), p(4, 4), &mut ctx);
        assert_eq!(select.dispose(&mut ctx), Some(Command::Commit { tool: ToolId::Select }));
        assert_eq!(ctx.grid.get_pixel(p(2, 2)), RED);

        let mut clone = RegionTool::new(RegionMode::Clone).unwrap();
        drag(&mut clone, p(1, 1), p(4, 4), &mut ctx);
        assert!(clone.region().is_some());
        assert!(clone.dispose(&mut ctx).is_none());
        assert!(clone.region().is_none());
    }

    #[test]
    fn test_clone_stamps_repeatedly() {
        let mut grid = grid_with_block();
        let mut tool = RegionTool::new(RegionMode::Clone).unwrap();
        let mut ctx = ToolContext::new(&mut grid, None);

        drag(&mut tool, p(1, 1), p(4, 4), &mut ctx);
        // Clone leaves the source alone
        assert_eq!(ctx.grid.get_pixel(p(2, 2)), RED);

        let commands = drag(&mut tool, p(7, 7), p(7, 7), &mut ctx);
        assert_eq!(commands, vec![Command::Commit { tool: ToolId::Clone }]);
        // A 2×2 region centered on (7,7) starts at (6,6)
        assert_eq!(ctx.grid.get_pixel(p(6, 6)), RED);
        assert_eq!(ctx.grid.get_pixel(p(7, 7)), RED);

        drag(&mut tool, p(1, 8), p(1, 8), &mut ctx);
        assert_eq!(ctx.grid.get_pixel(p(0, 7)), RED);
        assert!(tool.region().is_some());
    }

    #[test]
    fn test_abort_discards_marquee() {
        let mut grid = grid_with_block();
        let mut tool = RegionTool::new(RegionMode::Select).unwrap();
        let mut ctx = ToolContext::new(&mut grid, None);

        tool.invoke_action(DragPhase::Start, PointerEvent::new(p(1, 1)), &mut ctx);
        tool.invoke_action(DragPhase::Move, PointerEvent::new(p(4, 4)), &mut ctx);
        tool.invoke_action(DragPhase::Abort, PointerEvent::new(p(4, 4)), &mut ctx);
        assert!(tool.region().is_none());
        assert_eq!(ctx.grid.get_pixel(p(2, 2)), RED);
        assert!(ctx.grid.pixels(Target::Cursor).iter().all(|c| c.is_empty()));
    }
}
