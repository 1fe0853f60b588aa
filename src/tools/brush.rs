use crate::geometry::{PixelCoordinates, brush_footprint};
use crate::graphic::{Graphic, Paint};
use crate::tools::ToolContext;

/// Name of the slider shared by every brush-driven tool
pub(crate) const BRUSH_WIDTH: &str = "brush-width";
pub(crate) const MAX_BRUSH_WIDTH: f32 = 16.0;

/// In-bounds pixels covered by a square brush centered on `center`, mirror
/// images included. Each pixel appears once so blending tools never hit it twice.
pub(crate) fn stamp_pixels(ctx: &ToolContext<'_>, center: PixelCoordinates, width: u32) -> Vec<PixelCoordinates> {
    let footprint = brush_footprint(center, width);
    let origin = PixelCoordinates::new(footprint.x, footprint.y);

    let mut pixels = Vec::new();
    for corner in ctx.reflect(origin, width, width) {
        let rect = footprint_at(corner, width);
        for p in rect.pixels() {
            if ctx.grid.coords_in_bounds(p) && !pixels.contains(&p) {
                pixels.push(p);
            }
        }
    }
    pixels
}

/// One graphic covering the brush stamp with the given paint
pub(crate) fn stamp(ctx: &ToolContext<'_>, center: PixelCoordinates, width: u32, paint: Paint) -> Graphic {
    let mut graphic = Graphic::new(paint);
    for p in stamp_pixels(ctx, center, width) {
        graphic.pixel(p);
    }
    graphic
}

fn footprint_at(origin: PixelCoordinates, width: u32) -> crate::geometry::PixelRect {
    crate::geometry::PixelRect::new(origin.x, origin.y, width as i32, width as i32)
}

/// Reads a width slider as a whole pixel count of at least one.
pub(crate) fn width_property(value: Option<f32>) -> u32 {
    value.unwrap_or(1.0).round().max(1.0) as u32
}
