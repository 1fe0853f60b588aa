use eframe::egui;

use crate::tools::ToolId;

/// Square toolbar button for one tool, tinted when it is the active tool
pub struct ToolButton {
    pub tool: ToolId,
    pub selected: bool,
}

impl ToolButton {
    pub fn new(tool: ToolId, selected: bool) -> Self {
        Self { tool, selected }
    }

    fn glyph(&self) -> &'static str {
        match self.tool {
            ToolId::Pencil => "Pn",
            ToolId::Eraser => "Er",
            ToolId::Picker => "Pk",
            ToolId::Fill => "Fl",
            ToolId::Rectangle => "Rc",
            ToolId::Ellipse => "El",
            ToolId::Circle => "Ci",
            ToolId::Line => "Ln",
            ToolId::Shade => "Sh",
            ToolId::Select => "Se",
            ToolId::Clone => "Cl",
        }
    }

    pub fn show(&self, ui: &mut egui::Ui) -> egui::Response {
        let button_size = egui::vec2(32.0, 32.0);
        let (rect, response) = ui.allocate_exact_size(button_size, egui::Sense::click());

        if ui.is_rect_visible(rect) {
            let bg_color = if self.selected {
                egui::Color32::from_rgb(100, 181, 246)
            } else if response.hovered() {
                egui::Color32::from_gray(70)
            } else {
                egui::Color32::from_gray(45)
            };
            ui.painter().rect_filled(rect, 4.0, bg_color);

            let text_color = if self.selected {
                egui::Color32::BLACK
            } else {
                egui::Color32::WHITE
            };
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                self.glyph(),
                egui::FontId::proportional(14.0),
                text_color,
            );

            if self.selected {
                ui.painter()
                    .rect_stroke(rect, 4.0, egui::Stroke::new(2.0, egui::Color32::from_rgb(33, 150, 243)));
            }
        }

        response.on_hover_text(self.tool.label())
    }
}
