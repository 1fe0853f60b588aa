use std::cell::Cell;

use eframe::egui;

use crate::input::CanvasInput;
use crate::renderer::Renderer;
use crate::state::EditorContext;

/// The canvas: feeds pointer input to the editor, then paints the grid.
pub fn central_panel(
    editor: &mut EditorContext,
    renderer: &mut Renderer,
    input: &mut CanvasInput,
    dirty: &Cell<bool>,
    zoom: f32,
    ctx: &egui::Context,
) {
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::both().show(ui, |ui| {
            let grid_size = (editor.grid().width(), editor.grid().height());
            let size = egui::vec2(grid_size.0 as f32 * zoom, grid_size.1 as f32 * zoom);
            let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
            let canvas_rect = response.rect;

            for event in input.process_input(ctx, canvas_rect, grid_size) {
                editor.handle_canvas_event(event);
            }
            if dirty.replace(false) {
                renderer.invalidate();
            }
            renderer.render(&painter, canvas_rect, editor.grid());

            if response.hovered() {
                ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
            }
        });
    });
}
