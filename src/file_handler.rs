use std::io::Cursor;

use eframe::egui;
use image::{ImageFormat, RgbaImage};

use crate::color::RgbaColor;
use crate::state::{PersistenceError, PersistenceResult};

/// An image file dropped onto the window, read into memory
#[derive(Debug, Clone)]
pub struct DroppedImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Straight-alpha pixels of a decoded image
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<RgbaColor>,
}

impl DecodedImage {
    /// Copies the image onto a `width × height` canvas at the top-left corner,
    /// cropping what does not fit and leaving the rest transparent.
    pub fn fit_to_canvas(&self, width: u32, height: u32) -> Vec<RgbaColor> {
        let mut out = vec![RgbaColor::TRANSPARENT; width as usize * height as usize];
        for y in 0..self.height.min(height) {
            for x in 0..self.width.min(width) {
                out[(y * width + x) as usize] = self.pixels[(y * self.width + x) as usize];
            }
        }
        out
    }
}

/// Decodes PNG, JPEG, GIF, WebP or BMP bytes.
pub fn decode_image(bytes: &[u8]) -> PersistenceResult<DecodedImage> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::debug!("Successfully decoded image: {}x{}", width, height);
    let pixels = rgba.pixels().map(|p| RgbaColor::from_array(p.0)).collect();
    Ok(DecodedImage { width, height, pixels })
}

/// Encodes row-major pixels as PNG.
pub fn encode_png(width: u32, height: u32, pixels: &[RgbaColor]) -> PersistenceResult<Vec<u8>> {
    let raw: Vec<u8> = pixels.iter().flat_map(|c| c.to_array()).collect();
    let image = RgbaImage::from_raw(width, height, raw).ok_or_else(|| {
        PersistenceError::InvalidState(format!("{} pixels do not fill a {}x{} image", pixels.len(), width, height))
    })?;
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Collects image files dropped onto the window.
#[derive(Debug, Default)]
pub struct FileHandler {
    dropped_files: Vec<egui::DroppedFile>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process any newly dropped files from the UI context
    /// Returns true if any new files were queued
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        ctx.input(|i| {
            if i.raw.dropped_files.is_empty() {
                false
            } else {
                self.dropped_files.extend(i.raw.dropped_files.iter().cloned());
                true
            }
        })
    }

    /// Drains the queue, returning the bytes of every readable image.
    pub fn take_dropped_images(&mut self) -> Vec<DroppedImage> {
        let mut images = Vec::new();
        for file in std::mem::take(&mut self.dropped_files) {
            let name = if let Some(path) = &file.path {
                path.display().to_string()
            } else if !file.name.is_empty() {
                file.name.clone()
            } else {
                "unknown".to_owned()
            };

            if !is_image_file(&file) {
                log::warn!("Dropped file is not a supported type: {}", name);
                continue;
            }

            if let Some(bytes) = &file.bytes {
                log::info!("Processing image from memory: {} ({} bytes)", name, bytes.len());
                images.push(DroppedImage { name, bytes: bytes.to_vec() });
            } else if let Some(path) = &file.path {
                match std::fs::read(path) {
                    Ok(bytes) => {
                        log::info!("Processing image from path: {}", path.display());
                        images.push(DroppedImage { name, bytes });
                    }
                    Err(err) => log::error!("Failed to read image file: {}: {}", path.display(), err),
                }
            } else {
                log::warn!("Dropped file has no accessible data: {}", name);
            }
        }
        images
    }

    /// Preview files being dragged over the application
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, FontId, Id, LayerId, Order};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }
        let text = ctx.input(|i| {
            let mut text = "Dropping image:\n".to_owned();
            for file in &i.raw.hovered_files {
                match &file.path {
                    Some(path) => text += &format!("\n{}", path.display()),
                    None => text += "\n(Path not available)",
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(20.0),
            Color32::WHITE,
        );
    }
}

/// Check if a file is an image based on MIME type or extension
fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    let name = match &file.path {
        Some(path) => path.to_string_lossy().to_lowercase(),
        None => file.name.to_lowercase(),
    };
    ["png", "jpg", "jpeg", "gif", "webp", "bmp"]
        .iter()
        .any(|ext| name.ends_with(&format!(".{}", ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_round_trip() {
        let pixels = vec![
            RgbaColor::opaque(255, 0, 0),
            RgbaColor::TRANSPARENT,
            RgbaColor::new(0, 0, 255, 128),
            RgbaColor::WHITE,
        ];
        let png = encode_png(2, 2, &pixels).unwrap();
        let decoded = decode_image(&png).unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 2));
        assert_eq!(decoded.pixels, pixels);
    }

    #[test]
    fn test_encode_rejects_short_buffers() {
        assert!(matches!(encode_png(2, 2, &[RgbaColor::BLACK]), Err(PersistenceError::InvalidState(_))));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_image(b"not an image"), Err(PersistenceError::Image(_))));
    }

    #[test]
    fn test_fit_to_canvas_crops_and_pads() {
        let image = DecodedImage {
            width: 3,
            height: 1,
            pixels: vec![RgbaColor::BLACK, RgbaColor::WHITE, RgbaColor::BLACK],
        };
        let fitted = image.fit_to_canvas(2, 2);
        assert_eq!(fitted, vec![RgbaColor::BLACK, RgbaColor::WHITE, RgbaColor::TRANSPARENT, RgbaColor::TRANSPARENT]);
    }

    #[test]
    fn test_image_file_detection() {
        let file = egui::DroppedFile {
            name: "sprite.PNG".to_string(),
            ..Default::default()
        };
        assert!(is_image_file(&file));
        let file = egui::DroppedFile {
            name: "notes.txt".to_string(),
            ..Default::default()
        };
        assert!(!is_image_file(&file));
    }
}
