use eframe::egui::{self, Color32, ColorImage, TextureHandle, TextureOptions};

use crate::backend::Target;
use crate::color::RgbaColor;
use crate::grid::Grid;
use crate::layer::BlendMode;

const CHECKER_LIGHT: Color32 = Color32::from_gray(200);
const CHECKER_DARK: Color32 = Color32::from_gray(160);

/// Straight-alpha pixels of everything the canvas shows, row-major.
///
/// Visible layers are stacked from index 0 upwards using their alpha and
/// blend mode, then the floating selection and the cursor overlay on top.
pub fn composite(grid: &Grid) -> Vec<RgbaColor> {
    let mut out = stack_layers(grid);
    blend_surface(&mut out, &grid.pixels(Target::Floating), 1.0, BlendMode::Normal);
    blend_surface(&mut out, &grid.pixels(Target::Cursor), 1.0, BlendMode::Normal);
    to_colors(out)
}

/// Like [`composite`] but without the floating selection and cursor overlays.
pub fn composite_layers(grid: &Grid) -> Vec<RgbaColor> {
    to_colors(stack_layers(grid))
}

fn stack_layers(grid: &Grid) -> Vec<[f32; 4]> {
    let mut out = vec![[0.0f32; 4]; (grid.width() * grid.height()) as usize];
    for layer in grid.layers().iter().filter(|l| l.visible && l.alpha > 0.0) {
        blend_surface(&mut out, &grid.pixels(Target::Layer(layer.id)), layer.alpha, layer.blend_mode);
    }
    out
}

fn to_colors(channels: Vec<[f32; 4]>) -> Vec<RgbaColor> {
    let byte = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    channels
        .into_iter()
        .map(|[r, g, b, a]| RgbaColor::new(byte(r), byte(g), byte(b), byte(a)))
        .collect()
}

fn blend_surface(dst: &mut [[f32; 4]], src: &[RgbaColor], alpha: f32, mode: BlendMode) {
    for (d, s) in dst.iter_mut().zip(src) {
        let sa = f32::from(s.a) / 255.0 * alpha;
        if sa <= 0.0 {
            continue;
        }
        let da = d[3];
        let out_a = sa + da * (1.0 - sa);
        let src_rgb = [s.r, s.g, s.b].map(|c| f32::from(c) / 255.0);
        for i in 0..3 {
            // Blend modes only apply where there is something underneath
            let mixed = (1.0 - da) * src_rgb[i] + da * mode.blend_channel(d[i], src_rgb[i]);
            d[i] = (sa * mixed + da * (1.0 - sa) * d[i]) / out_a;
        }
        d[3] = out_a;
    }
}

pub fn to_color_image(width: u32, height: u32, pixels: &[RgbaColor]) -> ColorImage {
    let bytes: Vec<u8> = pixels.iter().flat_map(|c| c.to_array()).collect();
    ColorImage::from_rgba_unmultiplied([width as usize, height as usize], &bytes)
}

/// Draws the composited canvas through a cached egui texture.
///
/// The texture is rebuilt only after [`Renderer::invalidate`] was called.
pub struct Renderer {
    ctx: egui::Context,
    texture: Option<TextureHandle>,
    /// Bumped on every invalidation
    version: u64,
    /// Version the texture was last built from
    rendered_version: Option<u64>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("version", &self.version)
            .field("rendered_version", &self.rendered_version)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        Self::with_context(cc.egui_ctx.clone())
    }

    pub fn with_context(ctx: egui::Context) -> Self {
        Self {
            ctx,
            texture: None,
            version: 0,
            rendered_version: None,
        }
    }

    /// Marks the texture stale; it is rebuilt on the next paint.
    pub fn invalidate(&mut self) {
        self.version += 1;
    }

    pub fn is_stale(&self) -> bool {
        self.rendered_version != Some(self.version)
    }

    pub fn create_texture(&self, image: ColorImage, name: &str) -> TextureHandle {
        self.ctx.load_texture(name, image, TextureOptions::NEAREST)
    }

    /// The canvas texture, rebuilt from the grid when stale.
    pub fn texture(&mut self, grid: &Grid) -> &TextureHandle {
        let image = self
            .is_stale()
            .then(|| to_color_image(grid.width(), grid.height(), &composite(grid)));

        if let Some(image) = image {
            log::trace!("Rebuilding canvas texture v{}", self.version);
            match &mut self.texture {
                Some(handle) if handle.size() == image.size => handle.set(image, TextureOptions::NEAREST),
                _ => self.texture = Some(self.create_texture(image, "canvas")),
            }
            self.rendered_version = Some(self.version);
        }

        self.texture.get_or_insert_with(|| {
            self.ctx
                .load_texture("canvas", ColorImage::new([1, 1], Color32::TRANSPARENT), TextureOptions::NEAREST)
        })
    }

    /// Paints a transparency checkerboard and the canvas into `rect`.
    pub fn render(&mut self, painter: &egui::Painter, rect: egui::Rect, grid: &Grid) {
        let cell = rect.width() / grid.width().max(1) as f32;
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let color = if (x + y) % 2 == 0 { CHECKER_LIGHT } else { CHECKER_DARK };
                let min = rect.min + egui::vec2(x as f32 * cell, y as f32 * cell);
                painter.rect_filled(egui::Rect::from_min_size(min, egui::vec2(cell, cell)), 0.0, color);
            }
        }

        let texture = self.texture(grid);
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.image(texture.id(), rect, uv, Color32::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PixelCoordinates, PixelRect};
    use crate::graphic::{Graphic, Paint};

    fn paint_layer(grid: &mut Grid, color: RgbaColor) {
        let mut graphic = Graphic::new(Paint::over(color));
        graphic.rect(PixelRect::new(0, 0, 1, 1));
        grid.draw(&graphic);
    }

    #[test]
    fn test_top_layer_covers_bottom() {
        let mut grid = Grid::new(1, 1).unwrap();
        paint_layer(&mut grid, RgbaColor::opaque(0, 0, 255));
        grid.add_layer("Top");
        grid.select_layer(1);
        paint_layer(&mut grid, RgbaColor::opaque(255, 0, 0));
        assert_eq!(composite(&grid), vec![RgbaColor::opaque(255, 0, 0)]);
    }

    #[test]
    fn test_hidden_and_translucent_layers() {
        let mut grid = Grid::new(1, 1).unwrap();
        paint_layer(&mut grid, RgbaColor::opaque(255, 0, 0));
        let id = grid.selected_layer_id().unwrap();

        grid.layer_mut(id).unwrap().set_alpha(0.5);
        assert_eq!(composite(&grid), vec![RgbaColor::new(255, 0, 0, 128)]);

        grid.layer_mut(id).unwrap().visible = false;
        assert_eq!(composite(&grid), vec![RgbaColor::TRANSPARENT]);
    }

    #[test]
    fn test_multiply_blend() {
        let mut grid = Grid::new(1, 1).unwrap();
        paint_layer(&mut grid, RgbaColor::opaque(255, 128, 0));
        grid.add_layer("Shadow");
        grid.select_layer(1);
        paint_layer(&mut grid, RgbaColor::opaque(128, 255, 255));
        let id = grid.selected_layer_id().unwrap();
        grid.layer_mut(id).unwrap().blend_mode = BlendMode::Multiply;

        assert_eq!(composite(&grid), vec![RgbaColor::opaque(128, 128, 0)]);
    }

    #[test]
    fn test_overlays_draw_on_top() {
        let mut grid = Grid::new(2, 1).unwrap();
        paint_layer(&mut grid, RgbaColor::BLACK);
        let mut cursor = Graphic::new(Paint::over(RgbaColor::WHITE));
        cursor.pixel(PixelCoordinates::new(0, 0));
        grid.draw_cursor(&cursor);
        assert_eq!(composite(&grid), vec![RgbaColor::WHITE, RgbaColor::TRANSPARENT]);
        assert_eq!(composite_layers(&grid), vec![RgbaColor::BLACK, RgbaColor::TRANSPARENT]);
    }

    #[test]
    fn test_texture_rebuilds_only_when_invalidated() {
        let grid = Grid::new(2, 2).unwrap();
        let mut renderer = Renderer::with_context(egui::Context::default());
        assert!(renderer.is_stale());
        let first = renderer.texture(&grid).id();
        assert!(!renderer.is_stale());
        renderer.invalidate();
        assert!(renderer.is_stale());
        assert_eq!(renderer.texture(&grid).id(), first);
    }
}
