//! Pixel rasterization of the primitive shapes the backend understands.

use super::{PixelCoordinates, PixelRect};

/// Bresenham line between two pixels, both ends included.
pub fn line_points(from: PixelCoordinates, to: PixelCoordinates) -> Vec<PixelCoordinates> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };

    let mut points = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    let (mut x, mut y) = (from.x, from.y);
    let mut err = dx + dy;
    loop {
        points.push(PixelCoordinates::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

/// Pixels of a box whose corners sit on pixel centers: `origin` to
/// `origin + (width, height)`, both inclusive.
pub fn box_points(origin: PixelCoordinates, width: i32, height: i32, filled: bool) -> Vec<PixelCoordinates> {
    let bounds = PixelRect::new(origin.x, origin.y, width + 1, height + 1);
    bounds
        .pixels()
        .filter(|p| filled || p.x == bounds.x || p.y == bounds.y || p.x == bounds.right() - 1 || p.y == bounds.bottom() - 1)
        .collect()
}

/// Pixels of the ellipse inscribed in the inclusive box `origin .. origin + (width, height)`.
///
/// Outlines keep the pixels of the filled ellipse that have at least one
/// 4-neighbor outside it.
pub fn ellipse_points(origin: PixelCoordinates, width: i32, height: i32, filled: bool) -> Vec<PixelCoordinates> {
    let cx = origin.x as f32 + width as f32 / 2.0;
    let cy = origin.y as f32 + height as f32 / 2.0;
    let rx = width as f32 / 2.0 + 0.5;
    let ry = height as f32 / 2.0 + 0.5;

    let inside = |p: PixelCoordinates| {
        let nx = (p.x as f32 - cx) / rx;
        let ny = (p.y as f32 - cy) / ry;
        nx * nx + ny * ny <= 1.0
    };

    let bounds = PixelRect::new(origin.x, origin.y, width + 1, height + 1);
    bounds
        .pixels()
        .filter(|&p| inside(p))
        .filter(|&p| {
            filled
                || !inside(p.offset(1, 0))
                || !inside(p.offset(-1, 0))
                || !inside(p.offset(0, 1))
                || !inside(p.offset(0, -1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let points = line_points(PixelCoordinates::new(0, 2), PixelCoordinates::new(3, 2));
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| p.y == 2));
    }

    #[test]
    fn test_diagonal_line_is_symmetric_in_length() {
        let forward = line_points(PixelCoordinates::new(0, 0), PixelCoordinates::new(4, 4));
        let backward = line_points(PixelCoordinates::new(4, 4), PixelCoordinates::new(0, 0));
        assert_eq!(forward.len(), 5);
        assert_eq!(backward.len(), 5);
        assert_eq!(forward.last(), backward.first());
    }

    #[test]
    fn test_single_point_line() {
        let p = PixelCoordinates::new(3, 3);
        assert_eq!(line_points(p, p), vec![p]);
    }

    #[test]
    fn test_box_outline_counts() {
        let outline = box_points(PixelCoordinates::new(2, 2), 3, 3, false);
        assert_eq!(outline.len(), 12);
        let filled = box_points(PixelCoordinates::new(2, 2), 3, 3, true);
        assert_eq!(filled.len(), 16);
    }

    #[test]
    fn test_degenerate_ellipse_is_a_point() {
        let p = PixelCoordinates::new(4, 4);
        assert_eq!(ellipse_points(p, 0, 0, true), vec![p]);
    }

    #[test]
    fn test_ellipse_outline_is_subset_of_fill() {
        let origin = PixelCoordinates::new(0, 0);
        let filled = ellipse_points(origin, 8, 6, true);
        let outline = ellipse_points(origin, 8, 6, false);
        assert!(outline.len() < filled.len());
        assert!(outline.iter().all(|p| filled.contains(p)));
    }
}
