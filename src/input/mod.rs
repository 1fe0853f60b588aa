use egui::{Context, Modifiers, PointerButton, Pos2, Rect};

use crate::geometry::PixelCoordinates;

mod router;
pub use router::ToolDispatcher;

/// Pointer state attached to every canvas event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub coords: PixelCoordinates,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(coords: PixelCoordinates) -> Self {
        Self {
            coords,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(coords: PixelCoordinates, modifiers: Modifiers) -> Self {
        Self { coords, modifiers }
    }

    /// Alt toggles the square, circle and straight-line constraints
    pub fn alt(&self) -> bool {
        self.modifiers.alt
    }
}

/// Pointer events in pixel space, as the canvas widget reports them
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    DragStart(PointerEvent),
    /// Pointer moved to a new pixel, with or without a drag running
    Move(PointerEvent),
    DragStop(PointerEvent),
    /// Pointer left the canvas
    MouseLeave,
}

/// Which part of a drag a tool invocation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Start,
    Move,
    Stop,
    /// The drag ended because the pointer left the canvas
    Abort,
}

impl DragPhase {
    /// Stop and Abort both end a drag
    pub fn is_end(self) -> bool {
        matches!(self, Self::Stop | Self::Abort)
    }
}

/// One frame of raw pointer state over the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Pixel under the pointer, `None` when it is outside the canvas
    pub coords: Option<PixelCoordinates>,
    pub pressed: bool,
    pub down: bool,
    pub modifiers: Modifiers,
}

/// Handles converting raw egui input into [`CanvasEvent`]s
#[derive(Debug, Default)]
pub struct CanvasInput {
    last_pixel: Option<PixelCoordinates>,
    dragging: bool,
}

impl CanvasInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Reads pointer state for a canvas drawn in `canvas_rect` at `grid_size` pixels.
    pub fn process_input(&mut self, ctx: &Context, canvas_rect: Rect, grid_size: (u32, u32)) -> Vec<CanvasEvent> {
        let sample = ctx.input(|input| PointerSample {
            coords: input
                .pointer
                .hover_pos()
                .filter(|pos| canvas_rect.contains(*pos))
                .map(|pos| screen_to_pixel(pos, canvas_rect, grid_size)),
            pressed: input.pointer.button_pressed(PointerButton::Primary),
            down: input.pointer.button_down(PointerButton::Primary),
            modifiers: input.modifiers,
        });
        self.update(sample)
    }

    /// Turns one pointer sample into canvas events. Moves within the same pixel are dropped.
    pub fn update(&mut self, sample: PointerSample) -> Vec<CanvasEvent> {
        let mut events = Vec::new();

        let Some(coords) = sample.coords else {
            if self.last_pixel.take().is_some() {
                events.push(CanvasEvent::MouseLeave);
            }
            self.dragging = false;
            return events;
        };
        let pointer = PointerEvent::with_modifiers(coords, sample.modifiers);

        if sample.pressed && !self.dragging {
            self.dragging = true;
            events.push(CanvasEvent::DragStart(pointer));
        } else if self.dragging && !sample.down {
            if self.last_pixel != Some(coords) {
                events.push(CanvasEvent::Move(pointer));
            }
            self.dragging = false;
            events.push(CanvasEvent::DragStop(pointer));
        } else if self.last_pixel != Some(coords) {
            events.push(CanvasEvent::Move(pointer));
        }

        self.last_pixel = Some(coords);
        events
    }
}

/// Maps a screen position inside `canvas_rect` to the pixel under it.
pub fn screen_to_pixel(pos: Pos2, canvas_rect: Rect, (width, height): (u32, u32)) -> PixelCoordinates {
    let scale_x = canvas_rect.width() / width.max(1) as f32;
    let scale_y = canvas_rect.height() / height.max(1) as f32;
    let x = ((pos.x - canvas_rect.min.x) / scale_x).floor() as i32;
    let y = ((pos.y - canvas_rect.min.y) / scale_y).floor() as i32;
    PixelCoordinates::new(x.clamp(0, width as i32 - 1), y.clamp(0, height as i32 - 1))
}
