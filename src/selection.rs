use crate::color::RgbaColor;
use crate::geometry::{PixelCoordinates, PixelRect};
use crate::graphic::{Graphic, Paint};

/// One captured pixel of a selected region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedRegionData {
    /// Where the pixel was captured; never changes
    pub original: PixelCoordinates,
    /// Where the pixel is now
    pub current: PixelCoordinates,
    /// Position at the start of the running drag
    pub last: PixelCoordinates,
    pub color: RgbaColor,
}

/// A detached island of pixels lifted off the grid by the select or clone tool.
///
/// The set of pixels is fixed at creation; moving the region only rewrites
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedRegion {
    origin: PixelCoordinates,
    original_origin: PixelCoordinates,
    last_origin: PixelCoordinates,
    width: u32,
    height: u32,
    pixels: Vec<SelectedRegionData>,
}

impl SelectedRegion {
    /// Captures the non-empty pixels of a frame. Returns `None` when nothing was captured.
    pub fn capture(origin: PixelCoordinates, width: u32, height: u32, frame: &[(PixelCoordinates, RgbaColor)]) -> Option<Self> {
        let pixels: Vec<_> = frame
            .iter()
            .filter(|(_, color)| !color.is_empty())
            .map(|&(coords, color)| SelectedRegionData { original: coords, current: coords, last: coords, color })
            .collect();

        if pixels.is_empty() {
            return None;
        }
        Some(Self {
            origin,
            original_origin: origin,
            last_origin: origin,
            width,
            height,
            pixels,
        })
    }

    pub fn origin(&self) -> PixelCoordinates {
        self.origin
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[SelectedRegionData] {
        &self.pixels
    }

    /// Bounding box at the region's current position
    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(self.origin.x, self.origin.y, self.width as i32, self.height as i32)
    }

    /// Bounding box where the region was captured
    pub fn original_bounds(&self) -> PixelRect {
        PixelRect::new(self.original_origin.x, self.original_origin.y, self.width as i32, self.height as i32)
    }

    pub fn contains(&self, coords: PixelCoordinates) -> bool {
        self.bounds().contains(coords)
    }

    /// Moves every pixel by the cumulative drag delta, measured from where the drag started.
    pub fn transform(&mut self, dx: i32, dy: i32) {
        self.origin = self.last_origin.offset(dx, dy);
        for pixel in &mut self.pixels {
            pixel.current = pixel.last.offset(dx, dy);
        }
    }

    /// Ends a drag; the current position becomes the base for the next one.
    pub fn stop_transform(&mut self) {
        self.last_origin = self.origin;
        for pixel in &mut self.pixels {
            pixel.last = pixel.current;
        }
    }

    /// Moves the region so its center sits on `center`.
    pub fn center_on(&mut self, center: PixelCoordinates) {
        let target = center.offset(-(self.width as i32 / 2), -(self.height as i32 / 2));
        let (dx, dy) = target.delta(self.last_origin);
        self.transform(dx, dy);
        self.stop_transform();
    }

    /// Puts every pixel back where it was captured.
    pub fn revert(&mut self) {
        self.origin = self.original_origin;
        self.last_origin = self.original_origin;
        for pixel in &mut self.pixels {
            pixel.current = pixel.original;
            pixel.last = pixel.original;
        }
    }

    /// One 1×1 graphic per pixel at its current position, skipping positions outside `bounds`.
    pub fn graphics_at_current(&self, bounds: PixelRect) -> Vec<Graphic> {
        self.pixels
            .iter()
            .filter(|p| bounds.contains(p.current))
            .map(|p| {
                let mut graphic = Graphic::new(Paint::replace(p.color));
                graphic.pixel(p.current);
                graphic
            })
            .collect()
    }

    /// Erase graphic covering every original pixel position
    pub fn original_footprint(&self) -> Graphic {
        let mut graphic = Graphic::new(Paint::erase());
        for pixel in &self.pixels {
            graphic.pixel(pixel.original);
        }
        graphic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> SelectedRegion {
        let red = RgbaColor::opaque(255, 0, 0);
        let frame = vec![
            (PixelCoordinates::new(1, 1), red),
            (PixelCoordinates::new(2, 1), RgbaColor::TRANSPARENT),
            (PixelCoordinates::new(1, 2), red),
            (PixelCoordinates::new(2, 2), red),
        ];
        SelectedRegion::capture(PixelCoordinates::new(1, 1), 2, 2, &frame).unwrap()
    }

    #[test]
    fn test_capture_skips_empty_pixels() {
        assert_eq!(region().pixels().len(), 3);
        let empty = [(PixelCoordinates::new(0, 0), RgbaColor::TRANSPARENT)];
        assert!(SelectedRegion::capture(PixelCoordinates::new(0, 0), 1, 1, &empty).is_none());
    }

    #[test]
    fn test_transform_uses_cumulative_delta() {
        let mut region = region();
        region.transform(1, 0);
        region.transform(3, 2);
        assert_eq!(region.origin(), PixelCoordinates::new(4, 3));
        assert_eq!(region.pixels()[0].current, PixelCoordinates::new(4, 3));

        region.stop_transform();
        region.transform(1, 1);
        assert_eq!(region.pixels()[0].current, PixelCoordinates::new(5, 4));
    }

    #[test]
    fn test_revert_restores_original_coordinates() {
        let mut region = region();
        region.transform(5, -3);
        region.stop_transform();
        region.transform(2, 2);
        region.revert();
        assert!(region.pixels().iter().all(|p| p.current == p.original && p.last == p.original));
        assert_eq!(region.bounds(), region.original_bounds());
    }

    #[test]
    fn test_center_on() {
        let mut region = region();
        region.center_on(PixelCoordinates::new(10, 10));
        assert_eq!(region.origin(), PixelCoordinates::new(9, 9));
        assert_eq!(region.pixels()[0].current, PixelCoordinates::new(9, 9));
    }

    #[test]
    fn test_placement_skips_out_of_bounds() {
        let mut region = region();
        region.transform(-2, 0);
        let graphics = region.graphics_at_current(PixelRect::from_size(8, 8));
        assert_eq!(graphics.len(), 1);
    }
}
