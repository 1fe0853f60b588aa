//! Run-length rectangle decomposition of a raster, used to store layers compactly.

use serde::{Deserialize, Serialize};

use crate::color::RgbaColor;

/// A solid block of one color. Empty pixels never appear in a decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub color: RgbaColor,
}

/// Splits a row-major raster into solid rectangles.
///
/// Each row is cut into horizontal runs of one color; a run that lines up
/// exactly (same `x`, `width` and color) with a rectangle ending on the
/// previous row extends that rectangle downwards instead of starting a new one.
/// The output is ordered by the row on which each rectangle starts.
pub fn rectangles_from_raster(pixels: &[RgbaColor], width: u32, height: u32) -> Vec<ColorRect> {
    let mut done: Vec<ColorRect> = Vec::new();
    let mut open: Vec<ColorRect> = Vec::new();

    for y in 0..height {
        let row = &pixels[(y * width) as usize..((y + 1) * width) as usize];
        let mut next_open = Vec::new();

        let mut x = 0;
        while x < width {
            let color = row[x as usize];
            let start = x;
            while x < width && row[x as usize] == color {
                x += 1;
            }
            if color.is_empty() {
                continue;
            }
            let run_width = x - start;

            match open.iter().position(|r| r.x == start && r.width == run_width && r.color == color) {
                Some(index) => {
                    let mut rect = open.swap_remove(index);
                    rect.height += 1;
                    next_open.push(rect);
                }
                None => next_open.push(ColorRect { x: start, y, width: run_width, height: 1, color }),
            }
        }

        done.append(&mut open);
        open = next_open;
    }
    done.append(&mut open);
    done.sort_by_key(|r| (r.y, r.x));
    done
}

/// Paints the rectangles onto a transparent raster. Rectangles are clipped to the raster.
pub fn raster_from_rectangles(rects: &[ColorRect], width: u32, height: u32) -> Vec<RgbaColor> {
    let mut pixels = vec![RgbaColor::TRANSPARENT; (width * height) as usize];
    for rect in rects {
        for y in rect.y..rect.y.saturating_add(rect.height).min(height) {
            for x in rect.x..rect.x.saturating_add(rect.width).min(width) {
                pixels[(y * width + x) as usize] = rect.color;
            }
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: RgbaColor = RgbaColor::opaque(255, 0, 0);
    const B: RgbaColor = RgbaColor::opaque(0, 0, 255);
    const E: RgbaColor = RgbaColor::TRANSPARENT;

    #[test]
    fn test_solid_block_is_one_rectangle() {
        let pixels = vec![R; 12];
        let rects = rectangles_from_raster(&pixels, 4, 3);
        assert_eq!(rects, vec![ColorRect { x: 0, y: 0, width: 4, height: 3, color: R }]);
    }

    #[test]
    fn test_empty_pixels_are_skipped() {
        let pixels = vec![E; 9];
        assert!(rectangles_from_raster(&pixels, 3, 3).is_empty());
    }

    #[test]
    fn test_mixed_raster_rebuilds_exactly() {
        #[rustfmt::skip]
        let pixels = vec![
            R, R, E, B,
            R, R, E, B,
            E, B, B, B,
        ];
        let rects = rectangles_from_raster(&pixels, 4, 3);
        assert_eq!(rects.len(), 3);
        assert_eq!(raster_from_rectangles(&rects, 4, 3), pixels);
    }
}
