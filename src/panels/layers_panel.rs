use eframe::egui;

use crate::layer::{BlendMode, Layer, LayerId};
use crate::state::EditorContext;

enum LayerAction {
    Select(usize),
    Rename(LayerId, String),
    Visibility(LayerId, bool),
    Alpha(LayerId, f32),
    Blend(LayerId, BlendMode),
    Remove(LayerId),
    Add,
}

/// Layer list, topmost layer first.
pub fn layers_panel(editor: &mut EditorContext, ctx: &egui::Context) {
    egui::SidePanel::right("layers_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Layers");
            let layers: Vec<Layer> = editor.grid().layers().to_vec();
            let selected = editor.grid().selected_layer_index();
            let mut actions = Vec::new();

            for (index, layer) in layers.iter().enumerate().rev() {
                ui.push_id(layer.id.0, |ui| layer_row(ui, index, layer, index == selected, &mut actions));
            }

            ui.horizontal(|ui| {
                if ui.button("Add layer").clicked() {
                    actions.push(LayerAction::Add);
                }
                let can_remove = layers.len() > 1;
                if ui.add_enabled(can_remove, egui::Button::new("Remove")).clicked() {
                    if let Some(layer) = layers.get(selected) {
                        actions.push(LayerAction::Remove(layer.id));
                    }
                }
            });

            for action in actions {
                apply(editor, action, layers.len());
            }
        });
}

fn layer_row(ui: &mut egui::Ui, index: usize, layer: &Layer, selected: bool, actions: &mut Vec<LayerAction>) {
    ui.horizontal(|ui| {
        let mut visible = layer.visible;
        if ui.checkbox(&mut visible, "").changed() {
            actions.push(LayerAction::Visibility(layer.id, visible));
        }
        if ui.selectable_label(selected, layer.label.as_str()).clicked() {
            actions.push(LayerAction::Select(index));
        }
    });
    if !selected {
        return;
    }

    let mut label = layer.label.clone();
    if ui.text_edit_singleline(&mut label).lost_focus() && label != layer.label {
        actions.push(LayerAction::Rename(layer.id, label));
    }
    let mut alpha = layer.alpha;
    if ui.add(egui::Slider::new(&mut alpha, 0.0..=1.0).text("Opacity")).changed() {
        actions.push(LayerAction::Alpha(layer.id, alpha));
    }
    let mut blend_mode = layer.blend_mode;
    egui::ComboBox::from_label("Blend")
        .selected_text(blend_mode.label())
        .show_ui(ui, |ui| {
            for mode in BlendMode::ALL {
                ui.selectable_value(&mut blend_mode, mode, mode.label());
            }
        });
    if blend_mode != layer.blend_mode {
        actions.push(LayerAction::Blend(layer.id, blend_mode));
    }
    ui.separator();
}

fn apply(editor: &mut EditorContext, action: LayerAction, count: usize) {
    match action {
        LayerAction::Select(index) => {
            editor.select_layer(index);
        }
        LayerAction::Rename(id, label) => {
            editor.rename_layer(id, &label);
        }
        LayerAction::Visibility(id, visible) => {
            editor.set_layer_visibility(id, visible);
        }
        LayerAction::Alpha(id, alpha) => {
            editor.set_layer_alpha(id, alpha);
        }
        LayerAction::Blend(id, mode) => {
            editor.set_layer_blend_mode(id, mode);
        }
        LayerAction::Remove(id) => {
            editor.remove_layer(id);
        }
        LayerAction::Add => {
            editor.add_layer(&format!("Layer {}", count + 1));
        }
    }
}
