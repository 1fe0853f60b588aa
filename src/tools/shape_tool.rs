use crate::color::RgbaColor;
use crate::command::Command;
use crate::error::PropertyError;
use crate::geometry::PixelCoordinates;
use crate::graphic::{Graphic, Paint, Shape};
use crate::input::{DragPhase, PointerEvent};
use crate::tools::{Tool, ToolContext, ToolId, ToolProperties, ToolProperty};

const FILL: &str = "fill";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Circle,
}

/// Box spanned by a drag. `width` and `height` count pixel steps, so the
/// drawn shape covers `width + 1` by `height + 1` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeGeometry {
    pub origin: PixelCoordinates,
    pub width: i32,
    pub height: i32,
}

/// Box between the drag start and the current pixel.
///
/// With `square` set the shorter axis grows to match the longer one. When
/// the drag runs toward negative coordinates the origin moves with it so the
/// start corner stays put.
pub fn shape_geometry(start: PixelCoordinates, current: PixelCoordinates, square: bool) -> ShapeGeometry {
    let mut width = (current.x - start.x).abs();
    let mut height = (current.y - start.y).abs();
    if square {
        let side = width.max(height);
        width = side;
        height = side;
    }
    let x = if current.x < start.x { start.x - width } else { start.x };
    let y = if current.y < start.y { start.y - height } else { start.y };
    ShapeGeometry {
        origin: PixelCoordinates::new(x, y),
        width,
        height,
    }
}

/// Drag-to-draw rectangle, ellipse and circle
#[derive(Debug, Clone)]
pub struct ShapeTool {
    kind: ShapeKind,
    properties: ToolProperties,
    start: Option<PixelCoordinates>,
}

impl ShapeTool {
    pub fn new(kind: ShapeKind) -> Result<Self, PropertyError> {
        Ok(Self {
            kind,
            properties: ToolProperties::new(vec![ToolProperty::checkbox(FILL, "Fill", false)])?,
            start: None,
        })
    }

    fn graphic(&self, geometry: ShapeGeometry, color: RgbaColor, ctx: &ToolContext<'_>) -> Graphic {
        let filled = self.properties.checkbox(FILL).unwrap_or(false);
        let span_w = (geometry.width + 1) as u32;
        let span_h = (geometry.height + 1) as u32;

        let mut graphic = Graphic::new(Paint::over(color));
        for origin in ctx.reflect(geometry.origin, span_w, span_h) {
            let (width, height) = (geometry.width, geometry.height);
            graphic.push(match self.kind {
                ShapeKind::Rectangle => Shape::Box { origin, width, height, filled },
                ShapeKind::Ellipse | ShapeKind::Circle => Shape::Ellipse { origin, width, height, filled },
            });
        }
        graphic
    }

    fn geometry(&self, start: PixelCoordinates, event: &PointerEvent) -> ShapeGeometry {
        let square = self.kind == ShapeKind::Circle || event.alt();
        shape_geometry(start, event.coords, square)
    }
}

impl Tool for ShapeTool {
    fn id(&self) -> ToolId {
        match self.kind {
            ShapeKind::Rectangle => ToolId::Rectangle,
            ShapeKind::Ellipse => ToolId::Ellipse,
            ShapeKind::Circle => ToolId::Circle,
        }
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
        let graphic = self.graphic(self.geometry(start, &event), color, ctx);
        ctx.grid.clear_cursor();

        match phase {
            DragPhase::Start | DragPhase::Move => {
                ctx.grid.draw_cursor(&graphic);
                None
            }
            DragPhase::Stop | DragPhase::Abort => {
                self.start = None;
                ctx.grid.draw(&graphic);
                Some(Command::Commit { tool: self.id() })
            }
        }
    }

    fn preview_cursor(&mut self, coords: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        if let Some(color) = ctx.color {
            let mut graphic = Graphic::new(Paint::over(color));
            graphic.pixel(coords);
            ctx.grid.draw_cursor(&graphic);
        }
    }

    fn current_state_name(&self) -> &'static str {
        if self.start.is_some() { "Dragging" } else { "Idle" }
    }
}
