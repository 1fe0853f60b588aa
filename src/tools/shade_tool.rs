use crate::color::RgbaColor;
use crate::command::Command;
use crate::error::PropertyError;
use crate::geometry::PixelCoordinates;
use crate::graphic::{Graphic, Paint};
use crate::input::{DragPhase, PointerEvent};
use crate::tools::brush::{self, BRUSH_WIDTH, MAX_BRUSH_WIDTH};
use crate::tools::{Tool, ToolContext, ToolId, ToolProperties, ToolProperty};

const STRENGTH: &str = "strength";
const MODE: &str = "mode";
const MODES: [&str; 2] = ["lighten", "darken"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadeMode {
    Lighten,
    Darken,
}

impl ShadeMode {
    fn light(self) -> f32 {
        match self {
            Self::Lighten => 255.0,
            Self::Darken => 0.0,
        }
    }
}

/// Moves each color channel toward white or black by `strength` in [0, 1]. Alpha is kept.
pub fn shade_color(color: RgbaColor, mode: ShadeMode, strength: f32) -> RgbaColor {
    let s = strength.clamp(0.0, 1.0);
    let light = mode.light();
    let channel = |c: u8| (f32::from(c) * (1.0 - s) + light * s).round().clamp(0.0, 255.0) as u8;
    RgbaColor::new(channel(color.r), channel(color.g), channel(color.b), color.a)
}

/// Lightens or darkens painted pixels under the brush
#[derive(Debug, Clone)]
pub struct ShadeTool {
    properties: ToolProperties,
    shading: bool,
}

impl ShadeTool {
    pub fn new() -> Result<Self, PropertyError> {
        Ok(Self {
            properties: ToolProperties::new(vec![
                ToolProperty::slider(BRUSH_WIDTH, "Brush width", 1.0, MAX_BRUSH_WIDTH, 1.0, "px", 1.0),
                ToolProperty::slider(STRENGTH, "Strength", 0.0, 100.0, 1.0, "%", 10.0),
                ToolProperty::radio(MODE, "Mode", &MODES, 0),
            ])?,
            shading: false,
        })
    }

    fn mode(&self) -> ShadeMode {
        match self.properties.radio(MODE) {
            Some("darken") => ShadeMode::Darken,
            _ => ShadeMode::Lighten,
        }
    }

    fn width(&self) -> u32 {
        brush::width_property(self.properties.slider(BRUSH_WIDTH))
    }
}

impl Tool for ShadeTool {
    fn id(&self) -> ToolId {
        ToolId::Shade
    }

    fn properties(&self) -> &ToolProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut ToolProperties {
        &mut self.properties
    }

    fn invoke_action(&mut self, phase: DragPhase, event: PointerEvent, ctx: &mut ToolContext<'_>) -> Option<Command> {
        if phase.is_end() {
            return std::mem::take(&mut self.shading).then_some(Command::Commit { tool: ToolId::Shade });
        }

        let mode = self.mode();
        let strength = self.properties.slider(STRENGTH).unwrap_or(0.0) / 100.0;
        for p in brush::stamp_pixels(ctx, event.coords, self.width()) {
            let color = ctx.grid.get_pixel(p);
            if color.is_empty() {
                continue;
            }
            let mut graphic = Graphic::new(Paint::replace(shade_color(color, mode, strength)));
            graphic.pixel(p);
            ctx.grid.draw(&graphic);
            self.shading = true;
        }
        None
    }

    fn preview_cursor(&mut self, coords: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        let outline = match self.mode() {
            ShadeMode::Lighten => RgbaColor::new(255, 255, 255, 96),
            ShadeMode::Darken => RgbaColor::new(0, 0, 0, 96),
        };
        let graphic = brush::stamp(ctx, coords, self.width(), Paint::over(outline));
        ctx.grid.draw_cursor(&graphic);
    }
}
