use std::cell::Cell;
use std::rc::Rc;

use eframe::egui;

use crate::event::EditorEvent;
use crate::file_handler::FileHandler;
use crate::input::CanvasInput;
use crate::panels;
use crate::renderer::Renderer;
use crate::settings::{EditorSettings, Theme};
use crate::state::{EditorContext, LayerEncoding, ProjectDocument, StatePersistence};

/// Settings file read on startup, relative to the working directory
pub const SETTINGS_FILE: &str = "pixel_paint.json";

const MIN_ZOOM: f32 = 1.0;
const MAX_ZOOM: f32 = 64.0;

/// We derive Deserialize/Serialize so we can persist app state on shutdown.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct PaintApp {
    /// The open project as of the last shutdown
    project: Option<ProjectDocument>,
    project_path: String,
    export_path: String,
    zoom: Option<f32>,

    #[serde(skip)]
    settings: EditorSettings,
    #[serde(skip)]
    editor: Option<EditorContext>,
    // Skip serializing the renderer since it contains GPU resources
    #[serde(skip)]
    renderer: Option<Renderer>,
    #[serde(skip)]
    canvas_input: CanvasInput,
    #[serde(skip)]
    file_handler: FileHandler,
    #[serde(skip)]
    autosave: Option<StatePersistence>,
    /// Set by the event bus whenever the canvas texture is out of date
    #[serde(skip)]
    dirty: Rc<Cell<bool>>,
    #[serde(skip)]
    canvas_size: (u32, u32),
    #[serde(skip)]
    status: Option<String>,
}

impl PaintApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut app: Self = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        app.settings = EditorSettings::load_or_default(SETTINGS_FILE);
        app.renderer = Some(Renderer::new(cc));
        app.autosave = app.settings.autosave_dir.clone().map(StatePersistence::new);
        if app.project_path.is_empty() {
            app.project_path = "project.json".to_owned();
        }
        if app.export_path.is_empty() {
            app.export_path = "canvas.png".to_owned();
        }

        match EditorContext::new(&app.settings) {
            Ok(mut editor) => {
                if let Some(document) = app.project.take() {
                    if let Err(e) = editor.from_document(&document) {
                        log::warn!("Discarding stored project: {}", e);
                    }
                }
                let dirty = app.dirty.clone();
                let subscribed = editor.event_bus.subscribe("canvas-texture", move |event: &EditorEvent| {
                    if matches!(
                        event,
                        EditorEvent::GridChanged | EditorEvent::LayerChanged(_) | EditorEvent::DocumentChanged(_)
                    ) {
                        dirty.set(true);
                    }
                });
                if let Err(e) = subscribed {
                    log::error!("Canvas will not refresh: {}", e);
                }
                cc.egui_ctx.set_visuals(editor.preferences.theme.visuals());
                app.canvas_size = (editor.grid().width(), editor.grid().height());
                app.editor = Some(editor);
            }
            Err(e) => {
                log::error!("Failed to create editor: {}", e);
                app.status = Some(format!("Failed to create editor: {}", e));
            }
        }
        app.dirty.set(true);
        app
    }

    fn zoom(&self) -> f32 {
        self.zoom.unwrap_or(self.settings.zoom).clamp(MIN_ZOOM, MAX_ZOOM)
    }

    fn handle_shortcuts(editor: &mut EditorContext, ctx: &egui::Context) {
        let redo = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z);
        let undo = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Z);
        // Redo first; the undo shortcut would also match with shift held
        if ctx.input_mut(|i| i.consume_shortcut(&redo)) {
            editor.redo();
        } else if ctx.input_mut(|i| i.consume_shortcut(&undo)) {
            editor.undo();
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        self.file_handler.preview_files_being_dropped(ctx);
        if !self.file_handler.check_for_dropped_files(ctx) {
            return;
        }
        let Some(editor) = &mut self.editor else {
            return;
        };
        for image in self.file_handler.take_dropped_images() {
            if let Err(e) = editor.import_image(&image.bytes) {
                log::warn!("Failed to import {}: {}", image.name, e);
                self.status = Some(format!("Failed to import {}: {}", image.name, e));
            }
        }
    }

    fn top_panel(&mut self, ctx: &egui::Context) {
        let zoom = self.zoom();
        let Some(editor) = &mut self.editor else {
            return;
        };
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Project");
                ui.text_edit_singleline(&mut self.project_path);
                if ui.button("Save").clicked() {
                    self.status = Some(match editor.save_project(&self.project_path) {
                        Ok(()) => format!("Saved {}", self.project_path),
                        Err(e) => format!("Save failed: {}", e),
                    });
                }
                if ui.button("Open").clicked() {
                    self.status = Some(match editor.load_project(&self.project_path) {
                        Ok(()) => {
                            ctx.set_visuals(editor.preferences.theme.visuals());
                            self.canvas_size = (editor.grid().width(), editor.grid().height());
                            format!("Opened {}", self.project_path)
                        }
                        Err(e) => format!("Open failed: {}", e),
                    });
                }
                ui.separator();
                ui.text_edit_singleline(&mut self.export_path);
                if ui.button("Export PNG").clicked() {
                    let written = editor
                        .export_png()
                        .and_then(|png| std::fs::write(&self.export_path, png).map_err(Into::into));
                    self.status = Some(match written {
                        Ok(()) => format!("Exported {}", self.export_path),
                        Err(e) => format!("Export failed: {}", e),
                    });
                }
            });

            ui.horizontal(|ui| {
                let (mut width, mut height) = self.canvas_size;
                ui.add(egui::DragValue::new(&mut width).range(1..=512).prefix("w "));
                ui.add(egui::DragValue::new(&mut height).range(1..=512).prefix("h "));
                self.canvas_size = (width, height);
                if ui.button("Resize").clicked() {
                    if let Err(e) = editor.resize_canvas(width, height) {
                        self.status = Some(e.to_string());
                    }
                }
                ui.separator();

                let mut zoom = zoom;
                if ui.add(egui::Slider::new(&mut zoom, MIN_ZOOM..=MAX_ZOOM).text("Zoom")).changed() {
                    self.zoom = Some(zoom);
                }
                ui.separator();

                let mut theme = editor.preferences.theme;
                ui.selectable_value(&mut theme, Theme::Light, "Light");
                ui.selectable_value(&mut theme, Theme::Dark, "Dark");
                if theme != editor.preferences.theme {
                    editor.preferences.theme = theme;
                    ctx.set_visuals(theme.visuals());
                }

                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status.as_str());
                }
            });
        });
    }

    fn autosave(&mut self) {
        let (Some(autosave), Some(editor)) = (&mut self.autosave, &self.editor) else {
            return;
        };
        if !autosave.should_autosave() {
            return;
        }
        match autosave.try_autosave(&editor.to_document(LayerEncoding::default())) {
            Ok(Some(path)) => log::info!("Autosaved to {}", path.display()),
            Ok(None) => {}
            Err(e) => log::warn!("Autosave failed: {}", e),
        }
    }
}

impl eframe::App for PaintApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Some(editor) = &self.editor {
            self.project = Some(editor.to_document(LayerEncoding::default()));
        }
        eframe::set_value(storage, eframe::APP_KEY, self);
        self.project = None;
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        self.top_panel(ctx);

        let zoom = self.zoom();
        let Some(editor) = &mut self.editor else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.label(self.status.as_deref().unwrap_or("Editor unavailable"));
            });
            return;
        };
        Self::handle_shortcuts(editor, ctx);
        panels::tools_panel(editor, ctx);
        panels::layers_panel(editor, ctx);
        if let Some(renderer) = &mut self.renderer {
            panels::central_panel(editor, renderer, &mut self.canvas_input, &self.dirty, zoom, ctx);
        }
        self.autosave();
    }
}
