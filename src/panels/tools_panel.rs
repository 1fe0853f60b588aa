use eframe::egui;

use crate::color::RgbaColor;
use crate::components::ToolButton;
use crate::state::{EditorContext, PropertyValue};
use crate::tools::{PropertyKind, Tool, ToolId, ToolProperty};

const SWATCH_SIZE: f32 = 20.0;

pub fn tools_panel(editor: &mut EditorContext, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Tools");
            let active = editor.active_tool_id();
            ui.horizontal_wrapped(|ui| {
                for id in ToolId::ALL {
                    if ToolButton::new(id, id == active).show(ui).clicked() {
                        log::info!("Tool selected from UI: {}", id);
                        editor.select_tool(id);
                    }
                }
            });
            ui.separator();

            properties_section(editor, ui);
            ui.separator();

            palette_section(editor, ui);
            ui.separator();

            ui.strong("Mirror");
            let mut mirror = editor.grid().mirror();
            ui.horizontal(|ui| {
                let x = ui.checkbox(&mut mirror.x, "Horizontal").changed();
                let y = ui.checkbox(&mut mirror.y, "Vertical").changed();
                if x || y {
                    editor.set_mirror(mirror);
                }
            });
            ui.separator();

            ui.horizontal(|ui| {
                let history = editor.history();
                let (can_undo, can_redo) = (history.can_undo(), history.can_redo());
                if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                    editor.undo();
                }
                if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                    editor.redo();
                }
            });
            let history = editor.history();
            ui.label(format!(
                "Undo: {}  Redo: {}  (max {})",
                history.undo_depth(),
                history.redo_depth(),
                history.capacity()
            ));
        });
}

/// Widgets for the active tool's properties. Changes are applied after the
/// widgets are drawn so the tool is not borrowed while the editor mutates.
fn properties_section(editor: &mut EditorContext, ui: &mut egui::Ui) {
    let Some(tool) = editor.active_tool() else {
        return;
    };
    let id = tool.id();
    ui.label(format!("{} ({})", id.label(), tool.current_state_name()));
    let properties: Vec<ToolProperty> = tool.properties().iter().cloned().collect();

    let mut changes = Vec::new();
    let mut pressed = None;
    for property in properties {
        match property.kind {
            PropertyKind::Slider {
                min,
                max,
                step,
                unit,
                mut value,
            } => {
                let slider = egui::Slider::new(&mut value, min..=max)
                    .step_by(f64::from(step))
                    .suffix(unit)
                    .text(property.label);
                if ui.add(slider).changed() {
                    changes.push((property.name, PropertyValue::Slider(value)));
                }
            }
            PropertyKind::Checkbox { mut value } => {
                if ui.checkbox(&mut value, property.label).changed() {
                    changes.push((property.name, PropertyValue::Checkbox(value)));
                }
            }
            PropertyKind::Radio { options, selected } => {
                ui.label(property.label);
                ui.horizontal(|ui| {
                    for (index, option) in options.iter().enumerate() {
                        if ui.radio(index == selected, *option).clicked() && index != selected {
                            changes.push((property.name, PropertyValue::Radio(option.to_string())));
                        }
                    }
                });
            }
            PropertyKind::Button { .. } => {
                if ui.button(property.label).clicked() {
                    pressed = Some(property.name);
                }
            }
        }
    }

    for (name, value) in changes {
        if let Err(e) = editor.set_tool_property(id, name, value) {
            log::warn!("Failed to update {} {}: {}", id, name, e);
        }
    }
    if let Some(name) = pressed {
        if let Err(e) = editor.trigger_tool_button(name) {
            log::warn!("Failed to press {} {}: {}", id, name, e);
        }
    }
}

fn palette_section(editor: &mut EditorContext, ui: &mut egui::Ui) {
    ui.strong("Palette");
    let colors = editor.palette().colors().to_vec();
    let selected = editor.palette().selected_index();

    let mut clicked = None;
    let mut removed = None;
    ui.horizontal_wrapped(|ui| {
        for (index, color) in colors.iter().enumerate() {
            let (rect, response) = ui.allocate_exact_size(egui::vec2(SWATCH_SIZE, SWATCH_SIZE), egui::Sense::click());
            let [r, g, b, a] = color.to_array();
            ui.painter()
                .rect_filled(rect, 2.0, egui::Color32::from_rgba_unmultiplied(r, g, b, a));
            if selected == Some(index) {
                ui.painter().rect_stroke(rect, 2.0, egui::Stroke::new(2.0, egui::Color32::WHITE));
            }
            let response = response.on_hover_text(color.to_hex());
            if response.clicked() {
                clicked = Some(index);
            }
            if response.secondary_clicked() {
                removed = Some(index);
            }
        }
    });

    if let Some(index) = clicked {
        editor.select_color(index);
    }
    if let Some(index) = removed {
        if let Some(color) = editor.remove_color(index) {
            log::info!("Removed {} from the palette", color.to_hex());
        }
    }

    ui.horizontal(|ui| {
        let id = ui.make_persistent_id("new_palette_color");
        let mut rgba = ui.data_mut(|d| *d.get_temp_mut_or(id, RgbaColor::BLACK.to_array()));
        ui.color_edit_button_srgba_unmultiplied(&mut rgba);
        ui.data_mut(|d| d.insert_temp(id, rgba));
        if ui.button("Add color").clicked() {
            editor.pick_color(RgbaColor::from_array(rgba));
        }
    });
}
