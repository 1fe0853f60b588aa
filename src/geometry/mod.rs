pub mod raster;
pub mod rectangles;

use serde::{Deserialize, Serialize};

pub use rectangles::{ColorRect, raster_from_rectangles, rectangles_from_raster};

/// Integer pixel position on the grid. Transient values may fall outside the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelCoordinates {
    pub x: i32,
    pub y: i32,
}

impl PixelCoordinates {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Component-wise `self - other`.
    pub fn delta(self, other: Self) -> (i32, i32) {
        (self.x - other.x, self.y - other.y)
    }
}

impl From<(i32, i32)> for PixelCoordinates {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Half-open pixel rectangle `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Smallest rectangle covering both corners, inclusive.
    pub fn from_corners(a: PixelCoordinates, b: PixelCoordinates) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs() + 1, (a.y - b.y).abs() + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, p: PixelCoordinates) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.right() && p.y < self.bottom()
    }

    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        PixelRect::new(x, y, (right - x).max(0), (bottom - y).max(0))
    }

    /// Row-major iteration over every pixel in the rectangle.
    pub fn pixels(&self) -> impl Iterator<Item = PixelCoordinates> + '_ {
        let (x, width) = (self.x, self.width.max(0));
        (self.y..self.bottom()).flat_map(move |py| (x..x + width).map(move |px| PixelCoordinates::new(px, py)))
    }
}

/// Square brush footprint anchored so odd widths are centered on `center`
/// and even widths put the extra pixel to the top/left.
pub fn brush_footprint(center: PixelCoordinates, width: u32) -> PixelRect {
    let width = width.max(1) as i32;
    let half = width / 2;
    PixelRect::new(center.x - half, center.y - half, width, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_is_inclusive() {
        let rect = PixelRect::from_corners(PixelCoordinates::new(5, 1), PixelCoordinates::new(2, 4));
        assert_eq!(rect, PixelRect::new(2, 1, 4, 4));
    }

    #[test]
    fn test_intersect_clips_to_bounds() {
        let canvas = PixelRect::from_size(8, 8);
        let clipped = PixelRect::new(-2, 6, 4, 4).intersect(&canvas);
        assert_eq!(clipped, PixelRect::new(0, 6, 2, 2));
        assert!(PixelRect::new(10, 10, 2, 2).intersect(&canvas).is_empty());
    }

    #[test]
    fn test_pixels_row_major() {
        let pixels: Vec<_> = PixelRect::new(1, 1, 2, 2).pixels().collect();
        assert_eq!(
            pixels,
            vec![
                PixelCoordinates::new(1, 1),
                PixelCoordinates::new(2, 1),
                PixelCoordinates::new(1, 2),
                PixelCoordinates::new(2, 2),
            ]
        );
    }

    #[test]
    fn test_brush_footprint_bias() {
        let c = PixelCoordinates::new(5, 5);
        assert_eq!(brush_footprint(c, 1), PixelRect::new(5, 5, 1, 1));
        assert_eq!(brush_footprint(c, 3), PixelRect::new(4, 4, 3, 3));
        assert_eq!(brush_footprint(c, 2), PixelRect::new(4, 4, 2, 2));
    }
}
