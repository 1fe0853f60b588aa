use crate::color::RgbaColor;
use crate::geometry::{PixelCoordinates, PixelRect};

/// How a drawable's color combines with the pixels already in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Regular alpha blending.
    SourceOver,
    /// Overwrite the destination with the paint color.
    Replace,
    /// Clear the destination to transparent.
    Erase,
}

/// Color and compositing mode of a drawable. Always passed explicitly with each write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paint {
    pub color: RgbaColor,
    pub composite: Composite,
}

impl Paint {
    pub fn over(color: RgbaColor) -> Self {
        Self { color, composite: Composite::SourceOver }
    }

    pub fn replace(color: RgbaColor) -> Self {
        Self { color, composite: Composite::Replace }
    }

    pub fn erase() -> Self {
        Self { color: RgbaColor::TRANSPARENT, composite: Composite::Erase }
    }
}

/// Primitive shapes understood by a render backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Half-open filled rectangle.
    Rect(PixelRect),
    /// Box with corners on pixel centers, spanning `width + 1` by `height + 1` pixels.
    Box { origin: PixelCoordinates, width: i32, height: i32, filled: bool },
    /// Ellipse inscribed in the same inclusive box as [`Shape::Box`].
    Ellipse { origin: PixelCoordinates, width: i32, height: i32, filled: bool },
    /// Line between two pixel centers, stamped with a square of `width`.
    Line { from: PixelCoordinates, to: PixelCoordinates, width: u32 },
}

/// A batch of shapes drawn with one paint.
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    paint: Paint,
    shapes: Vec<Shape>,
}

impl Graphic {
    pub fn new(paint: Paint) -> Self {
        Self { paint, shapes: Vec::new() }
    }

    pub fn paint(&self) -> Paint {
        self.paint
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn push(&mut self, shape: Shape) -> &mut Self {
        self.shapes.push(shape);
        self
    }

    pub fn rect(&mut self, rect: PixelRect) -> &mut Self {
        self.push(Shape::Rect(rect))
    }

    pub fn pixel(&mut self, p: PixelCoordinates) -> &mut Self {
        self.rect(PixelRect::new(p.x, p.y, 1, 1))
    }
}
