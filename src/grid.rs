//! The pixel grid: layer bookkeeping, pixel reads and flood fill over a render backend.

use std::collections::HashSet;

use crate::backend::{RenderBackend, SoftwareBackend, Target, unpremultiplied_pixels};
use crate::color::{RgbaColor, color_similarity, premultiply, unpremultiply};
use crate::error::EditorError;
use crate::geometry::{PixelCoordinates, PixelRect};
use crate::graphic::Graphic;
use crate::layer::{Layer, LayerId};

/// Canvas-level symmetric drawing switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MirrorSettings {
    /// Reflect across the vertical center line
    pub x: bool,
    /// Reflect across the horizontal center line
    pub y: bool,
}

/// Full copy of every layer raster at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct GridSnapshot {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<(LayerId, Vec<u8>)>,
}

/// Coordinates the layers of one canvas.
///
/// Pixel storage belongs to the render backend. The grid decides where things
/// are drawn (selected layer, cursor or floating overlay) and reads pixels back
/// in straight alpha.
pub struct Grid {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
    selected_layer: usize,
    mirror: MirrorSettings,
    backend: Box<dyn RenderBackend>,
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layers", &self.layers)
            .field("selected_layer", &self.selected_layer)
            .field("mirror", &self.mirror)
            .finish_non_exhaustive()
    }
}

impl Grid {
    /// Creates a grid with one empty layer on the software backend.
    pub fn new(width: u32, height: u32) -> Result<Self, EditorError> {
        Self::with_backend(width, height, Box::new(SoftwareBackend::new(width, height)))
    }

    pub fn with_backend(width: u32, height: u32, backend: Box<dyn RenderBackend>) -> Result<Self, EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidCanvasSize { width, height });
        }
        let mut grid = Self {
            width,
            height,
            layers: Vec::new(),
            selected_layer: 0,
            mirror: MirrorSettings::default(),
            backend,
        };
        grid.backend.resize(width, height);
        grid.add_layer("Layer 1");
        Ok(grid)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.width, self.height)
    }

    pub fn coords_in_bounds(&self, coords: PixelCoordinates) -> bool {
        self.bounds().contains(coords)
    }

    /// Reallocates every surface. Pixel data is discarded; migrating it is up to the caller.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidCanvasSize { width, height });
        }
        log::info!("Resizing canvas {}x{} -> {}x{}", self.width, self.height, width, height);
        self.width = width;
        self.height = height;
        self.backend.resize(width, height);
        Ok(())
    }

    pub fn mirror(&self) -> MirrorSettings {
        self.mirror
    }

    pub fn set_mirror(&mut self, mirror: MirrorSettings) {
        self.mirror = mirror;
    }

    // Layers

    /// Layers from bottom to top
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn selected_layer_index(&self) -> usize {
        self.selected_layer
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.layers.get(self.selected_layer)
    }

    pub fn selected_layer_id(&self) -> Option<LayerId> {
        self.selected_layer().map(|l| l.id)
    }

    /// Adds an empty layer on top and selects it.
    pub fn add_layer(&mut self, label: &str) -> LayerId {
        self.insert_layer(Layer::new(label))
    }

    /// Adds a prepared layer on top and selects it.
    pub fn insert_layer(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        self.backend.create_surface(Target::Layer(id));
        self.layers.push(layer);
        self.selected_layer = self.layers.len() - 1;
        id
    }

    /// Removes a layer. The last remaining layer can't be removed.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        if self.layers.len() <= 1 {
            return false;
        }
        let Some(index) = self.layers.iter().position(|l| l.id == id) else {
            return false;
        };
        self.layers.remove(index);
        self.backend.remove_surface(Target::Layer(id));
        if self.selected_layer >= self.layers.len() {
            self.selected_layer = self.layers.len() - 1;
        }
        true
    }

    /// Drops every layer and its surface. Used when replacing the whole document.
    pub fn clear_layers(&mut self) {
        for layer in self.layers.drain(..) {
            self.backend.remove_surface(Target::Layer(layer.id));
        }
        self.selected_layer = 0;
    }

    pub fn select_layer(&mut self, index: usize) -> bool {
        if index < self.layers.len() {
            self.selected_layer = index;
            true
        } else {
            false
        }
    }

    fn selected_target(&self) -> Option<Target> {
        self.selected_layer_id().map(Target::Layer)
    }

    // Pixel reads

    /// Straight-alpha color of one pixel of the selected layer.
    pub fn get_pixel(&self, coords: PixelCoordinates) -> RgbaColor {
        match self.selected_target() {
            Some(target) => self.get_pixel_on(target, coords),
            None => RgbaColor::TRANSPARENT,
        }
    }

    pub fn get_pixel_on(&self, target: Target, coords: PixelCoordinates) -> RgbaColor {
        if !self.coords_in_bounds(coords) {
            return RgbaColor::TRANSPARENT;
        }
        let px = self.backend.extract(target, PixelRect::new(coords.x, coords.y, 1, 1));
        match px.as_slice() {
            [r, g, b, a] => unpremultiply([*r, *g, *b, *a]),
            _ => RgbaColor::TRANSPARENT,
        }
    }

    /// Row-major pixels of a frame of the selected layer, clipped to the canvas.
    pub fn get_pixel_frame(&self, origin: PixelCoordinates, width: u32, height: u32) -> Vec<(PixelCoordinates, RgbaColor)> {
        let Some(target) = self.selected_target() else {
            return Vec::new();
        };
        let frame = PixelRect::new(origin.x, origin.y, width as i32, height as i32).intersect(&self.bounds());
        let colors = unpremultiplied_pixels(&self.backend.extract(target, frame));
        frame.pixels().zip(colors).collect()
    }

    /// Straight-alpha colors of a whole surface, row-major.
    pub fn pixels(&self, target: Target) -> Vec<RgbaColor> {
        self.backend.surface(target).map(unpremultiplied_pixels).unwrap_or_default()
    }

    /// Raw premultiplied surface bytes.
    pub fn surface(&self, target: Target) -> Option<&[u8]> {
        self.backend.surface(target)
    }

    /// Replaces a layer's pixels. Ignored when the pixel count does not match the canvas.
    pub fn load_layer_pixels(&mut self, id: LayerId, pixels: &[RgbaColor]) {
        if pixels.len() != (self.width * self.height) as usize {
            log::warn!("Layer {} data has {} pixels, expected {}", id, pixels.len(), self.width * self.height);
            return;
        }
        let bytes: Vec<u8> = pixels.iter().flat_map(|c| premultiply(*c)).collect();
        self.backend.load_surface(Target::Layer(id), &bytes);
    }

    // Drawing

    /// Composites a graphic onto the selected layer.
    pub fn draw(&mut self, graphic: &Graphic) {
        if let Some(target) = self.selected_target() {
            self.backend.draw(target, graphic);
        }
    }

    pub fn draw_on(&mut self, target: Target, graphic: &Graphic) {
        self.backend.draw(target, graphic);
    }

    pub fn clear(&mut self, target: Target) {
        self.backend.clear(target);
    }

    pub fn draw_cursor(&mut self, graphic: &Graphic) {
        self.backend.draw(Target::Cursor, graphic);
    }

    pub fn clear_cursor(&mut self) {
        self.backend.clear(Target::Cursor);
    }

    /// Fills pixels similar to the seed color on the selected layer.
    ///
    /// This is a pull-based fill: a pixel joins the fill when its
    /// [`color_similarity`] to the seed color is within `tolerance`, not when
    /// it is enclosed by an edge. Every filled pixel is appended to `graphic`
    /// as a 1×1 rectangle; the return value is the number of pixels filled.
    pub fn flood_fill(&self, graphic: &mut Graphic, seed: PixelCoordinates, tolerance: f32) -> usize {
        if !self.coords_in_bounds(seed) {
            return 0;
        }
        let Some(target) = self.selected_target() else {
            return 0;
        };

        let width = self.width as i32;
        let pixels = self.pixels(target);
        let color_at = |p: PixelCoordinates| pixels[(p.y * width + p.x) as usize];
        let target_color = color_at(seed);

        let mut visited = HashSet::new();
        let mut stack = vec![seed];
        let mut filled = 0;

        while let Some(p) = stack.pop() {
            if !visited.insert(p) {
                continue;
            }
            if color_similarity(color_at(p), target_color) > tolerance {
                continue;
            }

            graphic.pixel(p);
            filled += 1;

            for neighbor in [p.offset(1, 0), p.offset(-1, 0), p.offset(0, 1), p.offset(0, -1)] {
                if self.coords_in_bounds(neighbor) && !visited.contains(&neighbor) {
                    stack.push(neighbor);
                }
            }
        }

        log::debug!("Flood fill from {:?} covered {} pixels", seed, filled);
        filled
    }

    /// Positions of a `width × height` footprint at `coords` and its mirror images.
    ///
    /// Returns the original first, then the X reflection, the Y reflection and
    /// the reflection across both axes, depending on the canvas mirror settings.
    pub fn reflect_coordinates(&self, coords: PixelCoordinates, width: u32, height: u32) -> Vec<PixelCoordinates> {
        let mirrored_x = self.width as i32 - coords.x - width as i32;
        let mirrored_y = self.height as i32 - coords.y - height as i32;

        let mut out = vec![coords];
        if self.mirror.x {
            out.push(PixelCoordinates::new(mirrored_x, coords.y));
        }
        if self.mirror.y {
            out.push(PixelCoordinates::new(coords.x, mirrored_y));
        }
        if self.mirror.x && self.mirror.y {
            out.push(PixelCoordinates::new(mirrored_x, mirrored_y));
        }
        out
    }

    // History

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width,
            height: self.height,
            layers: self
                .layers
                .iter()
                .map(|l| (l.id, self.backend.surface(Target::Layer(l.id)).map(<[u8]>::to_vec).unwrap_or_default()))
                .collect(),
        }
    }

    /// Writes snapshot rasters back into the layers they were taken from.
    ///
    /// Snapshots of a different canvas size, and layers that no longer exist, are skipped.
    pub fn restore(&mut self, snapshot: &GridSnapshot) {
        if snapshot.width != self.width || snapshot.height != self.height {
            log::warn!(
                "Skipping {}x{} snapshot on a {}x{} canvas",
                snapshot.width,
                snapshot.height,
                self.width,
                self.height
            );
            return;
        }
        for (id, data) in &snapshot.layers {
            if self.layer(*id).is_some() {
                self.backend.load_surface(Target::Layer(*id), data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphic::{Paint, Shape};

    fn filled_grid(width: u32, height: u32, color: RgbaColor) -> Grid {
        let mut grid = Grid::new(width, height).unwrap();
        let mut g = Graphic::new(Paint::replace(color));
        g.rect(grid.bounds());
        grid.draw(&g);
        grid
    }

    #[test]
    fn test_get_pixel_reads_selected_layer() {
        let grid = filled_grid(3, 3, RgbaColor::opaque(10, 20, 30));
        assert_eq!(grid.get_pixel(PixelCoordinates::new(1, 1)), RgbaColor::opaque(10, 20, 30));
        assert_eq!(grid.get_pixel(PixelCoordinates::new(5, 1)), RgbaColor::TRANSPARENT);
    }

    #[test]
    fn test_pixel_frame_is_row_major_and_clipped() {
        let grid = filled_grid(4, 4, RgbaColor::BLACK);
        let frame = grid.get_pixel_frame(PixelCoordinates::new(2, 2), 4, 4);
        assert_eq!(frame.len(), 4);
        assert_eq!(frame[0].0, PixelCoordinates::new(2, 2));
        assert_eq!(frame[1].0, PixelCoordinates::new(3, 2));
        assert_eq!(frame[2].0, PixelCoordinates::new(2, 3));
    }

    #[test]
    fn test_flood_fill_uniform_region_visits_each_pixel_once() {
        let grid = filled_grid(5, 4, RgbaColor::opaque(0, 128, 0));
        let mut graphic = Graphic::new(Paint::over(RgbaColor::BLACK));
        let count = grid.flood_fill(&mut graphic, PixelCoordinates::new(2, 2), 0.0);
        assert_eq!(count, 20);

        let unique: HashSet<_> = graphic
            .shapes()
            .iter()
            .map(|shape| match shape {
                Shape::Rect(r) => (r.x, r.y),
                other => panic!("unexpected shape {:?}", other),
            })
            .collect();
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn test_flood_fill_respects_tolerance() {
        let mut grid = filled_grid(4, 1, RgbaColor::opaque(100, 100, 100));
        let mut wall = Graphic::new(Paint::replace(RgbaColor::opaque(110, 100, 100)));
        wall.pixel(PixelCoordinates::new(2, 0));
        grid.draw(&wall);

        let mut strict = Graphic::new(Paint::over(RgbaColor::BLACK));
        assert_eq!(grid.flood_fill(&mut strict, PixelCoordinates::new(0, 0), 0.0), 2);

        let mut loose = Graphic::new(Paint::over(RgbaColor::BLACK));
        assert_eq!(grid.flood_fill(&mut loose, PixelCoordinates::new(0, 0), 1.0), 4);
    }

    #[test]
    fn test_reflect_coordinates() {
        let mut grid = Grid::new(10, 8).unwrap();
        let p = PixelCoordinates::new(2, 1);
        assert_eq!(grid.reflect_coordinates(p, 1, 1), vec![p]);

        grid.set_mirror(MirrorSettings { x: true, y: true });
        assert_eq!(
            grid.reflect_coordinates(p, 1, 1),
            vec![p, PixelCoordinates::new(7, 1), PixelCoordinates::new(2, 6), PixelCoordinates::new(7, 6)]
        );
        assert_eq!(grid.reflect_coordinates(p, 3, 2)[1], PixelCoordinates::new(5, 1));
    }

    #[test]
    fn test_last_layer_cannot_be_removed() {
        let mut grid = Grid::new(2, 2).unwrap();
        let only = grid.selected_layer_id().unwrap();
        assert!(!grid.remove_layer(only));

        let second = grid.add_layer("Layer 2");
        assert_eq!(grid.selected_layer_index(), 1);
        assert!(grid.remove_layer(second));
        assert_eq!(grid.selected_layer_index(), 0);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut grid = filled_grid(2, 2, RgbaColor::WHITE);
        let snapshot = grid.snapshot();
        let layer = grid.selected_layer_id().unwrap();
        grid.clear(Target::Layer(layer));
        assert!(grid.get_pixel(PixelCoordinates::new(0, 0)).is_empty());

        grid.restore(&snapshot);
        assert_eq!(grid.get_pixel(PixelCoordinates::new(0, 0)), RgbaColor::WHITE);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        assert!(Grid::new(0, 4).is_err());
    }
}
