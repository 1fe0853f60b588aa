//! The rendering backend seam: where drawables are composited into pixel surfaces.

use std::collections::HashMap;

use crate::color::{RgbaColor, premultiply};
use crate::geometry::raster::{box_points, ellipse_points, line_points};
use crate::geometry::{PixelCoordinates, PixelRect, brush_footprint};
use crate::graphic::{Composite, Graphic, Paint, Shape};
use crate::layer::LayerId;

/// A drawable surface owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// A committed layer.
    Layer(LayerId),
    /// Tool previews; cleared on every pointer move.
    Cursor,
    /// A selected region floating above the layers.
    Floating,
}

/// What the grid needs from a rendering backend.
///
/// Surfaces hold premultiplied RGBA, four bytes per pixel, row-major.
pub trait RenderBackend {
    /// Reallocates every surface at the new size. Pixel data is dropped.
    fn resize(&mut self, width: u32, height: u32);

    fn create_surface(&mut self, target: Target);

    fn remove_surface(&mut self, target: Target);

    fn clear(&mut self, target: Target);

    /// Composites a graphic into the target. Pixels outside the surface are
    /// clipped, and a pixel covered by several of the graphic's shapes is
    /// composited once.
    fn draw(&mut self, target: Target, graphic: &Graphic);

    /// Premultiplied RGBA of `frame`, which must lie inside the surface.
    fn extract(&self, target: Target, frame: PixelRect) -> Vec<u8>;

    /// The full premultiplied surface.
    fn surface(&self, target: Target) -> Option<&[u8]>;

    /// Overwrites a surface. Buffers of the wrong length are ignored.
    fn load_surface(&mut self, target: Target, data: &[u8]);
}

/// CPU implementation of [`RenderBackend`].
#[derive(Debug, Clone)]
pub struct SoftwareBackend {
    width: u32,
    height: u32,
    surfaces: HashMap<Target, Vec<u8>>,
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        let mut surfaces = HashMap::new();
        surfaces.insert(Target::Cursor, vec![0; buffer_len(width, height)]);
        surfaces.insert(Target::Floating, vec![0; buffer_len(width, height)]);
        Self { width, height, surfaces }
    }

    fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.width, self.height)
    }

    fn shape_pixels(shape: &Shape) -> Vec<PixelCoordinates> {
        match shape {
            Shape::Rect(rect) => rect.pixels().collect(),
            Shape::Box { origin, width, height, filled } => box_points(*origin, *width, *height, *filled),
            Shape::Ellipse { origin, width, height, filled } => ellipse_points(*origin, *width, *height, *filled),
            Shape::Line { from, to, width } => {
                let mut pixels: Vec<_> = line_points(*from, *to)
                    .into_iter()
                    .flat_map(|p| brush_footprint(p, *width).pixels().collect::<Vec<_>>())
                    .collect();
                // A wide line stamps overlapping squares; each pixel is composited once.
                pixels.sort_by_key(|p| (p.y, p.x));
                pixels.dedup();
                pixels
            }
        }
    }
}

fn buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

fn composite_pixel(dst: &mut [u8], paint: Paint) {
    match paint.composite {
        Composite::Erase => dst.fill(0),
        Composite::Replace => dst.copy_from_slice(&premultiply(paint.color)),
        Composite::SourceOver => {
            let src = premultiply(paint.color);
            let inv = 255 - u16::from(src[3]);
            for (d, s) in dst.iter_mut().zip(src) {
                let blended = u16::from(s) + (u16::from(*d) * inv + 127) / 255;
                *d = blended.min(255) as u8;
            }
        }
    }
}

impl RenderBackend for SoftwareBackend {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        for surface in self.surfaces.values_mut() {
            *surface = vec![0; buffer_len(width, height)];
        }
    }

    fn create_surface(&mut self, target: Target) {
        let len = buffer_len(self.width, self.height);
        self.surfaces.entry(target).or_insert_with(|| vec![0; len]);
    }

    fn remove_surface(&mut self, target: Target) {
        self.surfaces.remove(&target);
    }

    fn clear(&mut self, target: Target) {
        if let Some(surface) = self.surfaces.get_mut(&target) {
            surface.fill(0);
        }
    }

    fn draw(&mut self, target: Target, graphic: &Graphic) {
        let bounds = self.bounds();
        let width = self.width as usize;
        let Some(surface) = self.surfaces.get_mut(&target) else {
            log::trace!("draw on missing surface {:?}", target);
            return;
        };

        let paint = graphic.paint();
        let mut touched = vec![false; width * self.height as usize];
        for shape in graphic.shapes() {
            for p in Self::shape_pixels(shape) {
                if !bounds.contains(p) {
                    continue;
                }
                let index = p.y as usize * width + p.x as usize;
                if std::mem::replace(&mut touched[index], true) {
                    continue;
                }
                composite_pixel(&mut surface[index * 4..index * 4 + 4], paint);
            }
        }
    }

    fn extract(&self, target: Target, frame: PixelRect) -> Vec<u8> {
        let frame = frame.intersect(&self.bounds());
        let len = frame.width.max(0) as usize * frame.height.max(0) as usize * 4;
        let Some(surface) = self.surfaces.get(&target) else {
            return vec![0; len];
        };
        let mut out = Vec::with_capacity(len);
        let width = self.width as usize;
        for y in frame.y..frame.bottom() {
            let start = (y as usize * width + frame.x as usize) * 4;
            out.extend_from_slice(&surface[start..start + frame.width as usize * 4]);
        }
        out
    }

    fn surface(&self, target: Target) -> Option<&[u8]> {
        self.surfaces.get(&target).map(Vec::as_slice)
    }

    fn load_surface(&mut self, target: Target, data: &[u8]) {
        if data.len() != buffer_len(self.width, self.height) {
            log::warn!("Ignoring surface of {} bytes for a {}x{} canvas", data.len(), self.width, self.height);
            return;
        }
        self.surfaces.insert(target, data.to_vec());
    }
}

/// Straight-alpha colors of a premultiplied buffer.
pub fn unpremultiplied_pixels(bytes: &[u8]) -> Vec<RgbaColor> {
    bytes
        .chunks_exact(4)
        .map(|px| crate::color::unpremultiply([px[0], px[1], px[2], px[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> RgbaColor {
        RgbaColor::opaque(255, 0, 0)
    }

    #[test]
    fn test_draw_is_clipped() {
        let mut backend = SoftwareBackend::new(4, 4);
        backend.create_surface(Target::Cursor);
        let mut graphic = Graphic::new(Paint::replace(red()));
        graphic.rect(PixelRect::new(-2, -2, 4, 4));
        backend.draw(Target::Cursor, &graphic);

        let pixels = unpremultiplied_pixels(backend.surface(Target::Cursor).unwrap());
        assert_eq!(pixels.iter().filter(|c| **c == red()).count(), 4);
    }

    #[test]
    fn test_source_over_half_alpha() {
        let mut backend = SoftwareBackend::new(1, 1);
        let mut base = Graphic::new(Paint::replace(RgbaColor::WHITE));
        base.rect(PixelRect::new(0, 0, 1, 1));
        backend.draw(Target::Cursor, &base);

        let mut over = Graphic::new(Paint::over(RgbaColor::new(0, 0, 0, 128)));
        over.rect(PixelRect::new(0, 0, 1, 1));
        backend.draw(Target::Cursor, &over);

        let px = backend.extract(Target::Cursor, PixelRect::new(0, 0, 1, 1));
        assert_eq!(px[3], 255);
        assert!((126..=128).contains(&px[0]));
    }

    #[test]
    fn test_overlapping_shapes_blend_once() {
        let translucent = RgbaColor::new(255, 0, 0, 128);
        let mut backend = SoftwareBackend::new(4, 1);
        let mut graphic = Graphic::new(Paint::over(translucent));
        graphic.rect(PixelRect::new(0, 0, 3, 1));
        graphic.rect(PixelRect::new(1, 0, 3, 1));
        backend.draw(Target::Cursor, &graphic);

        let alphas: Vec<u8> = backend.extract(Target::Cursor, PixelRect::new(0, 0, 4, 1)).chunks(4).map(|px| px[3]).collect();
        assert_eq!(alphas, vec![128; 4]);
    }

    #[test]
    fn test_erase_clears() {
        let mut backend = SoftwareBackend::new(2, 1);
        let mut fill = Graphic::new(Paint::replace(red()));
        fill.rect(PixelRect::new(0, 0, 2, 1));
        backend.draw(Target::Floating, &fill);
        let mut erase = Graphic::new(Paint::erase());
        erase.rect(PixelRect::new(1, 0, 1, 1));
        backend.draw(Target::Floating, &erase);

        assert_eq!(backend.extract(Target::Floating, PixelRect::new(1, 0, 1, 1)), vec![0, 0, 0, 0]);
        assert_eq!(backend.extract(Target::Floating, PixelRect::new(0, 0, 1, 1)), vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_load_surface_rejects_wrong_length() {
        let mut backend = SoftwareBackend::new(2, 2);
        backend.load_surface(Target::Cursor, &[1, 2, 3]);
        assert!(backend.surface(Target::Cursor).unwrap().iter().all(|b| *b == 0));
    }
}
