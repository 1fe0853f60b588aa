//! The editor context owns everything one open canvas needs and is the only
//! way the UI mutates it.
//!
//! Canvas input flows through [`EditorContext::handle_canvas_event`] to the
//! dispatcher and the active tool. Whatever the tool asks for comes back as
//! [`Command`]s that the context executes, and every visible change is
//! broadcast on the [`EventBus`].

use std::collections::BTreeMap;
use std::path::Path;

use crate::backend::Target;
use crate::color::RgbaColor;
use crate::command::{Command, History};
use crate::error::{EditorError, PropertyError};
use crate::event::{DocumentEvent, EditorEvent, EventBus, LayerEvent};
use crate::file_handler;
use crate::grid::{Grid, MirrorSettings};
use crate::input::{CanvasEvent, ToolDispatcher};
use crate::layer::{BlendMode, Layer, LayerId};
use crate::palette::Palette;
use crate::renderer;
use crate::settings::{EditorSettings, Preferences};
use crate::tools::{Tool, ToolContext, ToolId, ToolTable, ToolType};

use super::persistence::{
    CanvasDocument, CanvasSettingsDocument, LayerData, LayerDocument, LayerEncoding, LayersDocument, PaletteDocument,
    PersistenceError, PersistenceResult, ProjectDocument, ToolsDocument,
};

/// A new value for a tool property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Slider(f32),
    Checkbox(bool),
    Radio(String),
}

/// The main context for the pixel editor.
#[derive(Debug)]
pub struct EditorContext {
    grid: Grid,
    palette: Palette,
    tools: ToolTable,
    active_tool: ToolId,
    dispatcher: ToolDispatcher,
    history: History,
    /// The event bus for broadcasting editor events
    pub event_bus: EventBus,
    pub preferences: Preferences,
}

impl EditorContext {
    /// Builds an editor with an empty canvas and the settings' palette.
    ///
    /// The initial grid state is the first history entry, so there is
    /// nothing to undo until a tool commits.
    pub fn new(settings: &EditorSettings) -> Result<Self, EditorError> {
        let grid = Grid::new(settings.canvas_width, settings.canvas_height)?;
        let palette = Palette::from_hex(settings.palette.as_slice())?;
        let history = History::new(grid.snapshot(), settings.history_depth);
        let mut ctx = Self {
            grid,
            palette,
            tools: ToolTable::new()?,
            active_tool: ToolId::Pencil,
            dispatcher: ToolDispatcher::new(),
            history,
            event_bus: EventBus::new(),
            preferences: Preferences { theme: settings.theme },
        };
        ctx.with_tool(|tool, tctx| tool.initialize(tctx));
        log::info!(
            "Editor ready: {}x{} canvas, {} colors, history depth {}",
            settings.canvas_width,
            settings.canvas_height,
            ctx.palette.colors().len(),
            ctx.history.capacity()
        );
        Ok(ctx)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn active_tool_id(&self) -> ToolId {
        self.active_tool
    }

    pub fn active_tool(&self) -> Option<&ToolType> {
        self.tools.get(self.active_tool)
    }

    pub fn tool(&self, id: ToolId) -> Option<&ToolType> {
        self.tools.get(id)
    }

    pub fn tools(&self) -> &ToolTable {
        &self.tools
    }

    /// Runs `f` on the active tool with a fresh tool context, then emits the
    /// events the tool queued.
    fn with_tool<R>(&mut self, f: impl FnOnce(&mut ToolType, &mut ToolContext<'_>) -> R) -> Option<R> {
        let tool = self.tools.get_mut(self.active_tool)?;
        let mut tctx = ToolContext::new(&mut self.grid, self.palette.selected_color());
        let result = f(tool, &mut tctx);
        let events = tctx.take_events();
        for event in events {
            self.event_bus.emit(event);
        }
        Some(result)
    }

    // Input

    pub fn handle_canvas_event(&mut self, event: CanvasEvent) {
        let Some(tool) = self.tools.get_mut(self.active_tool) else {
            log::trace!("No tool registered for {}", self.active_tool);
            return;
        };
        let mut tctx = ToolContext::new(&mut self.grid, self.palette.selected_color());
        let commands = self.dispatcher.handle(event, tool, &mut tctx);
        let events = tctx.take_events();

        for event in events {
            self.event_bus.emit(event);
        }
        self.event_bus.emit(EditorEvent::GridChanged);
        for command in commands {
            self.execute(command);
        }
    }

    // Commands

    pub fn execute(&mut self, command: Command) {
        log::debug!("Executing {:?}", command);
        match command {
            Command::Commit { tool } => {
                self.history.push(self.grid.snapshot());
                self.event_bus.emit(EditorEvent::Committed { tool });
                self.emit_history_changed();
            }
            Command::PickColor(color) => self.pick_color(color),
            Command::SelectColor(index) => self.select_color(index),
            Command::SelectTool(id) => self.select_tool(id),
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
        }
    }

    fn emit_history_changed(&self) {
        self.event_bus.emit(EditorEvent::HistoryChanged {
            undo_depth: self.history.undo_depth(),
            redo_depth: self.history.redo_depth(),
        });
    }

    /// Switches tools, letting the old one finish or drop pending work first.
    pub fn select_tool(&mut self, id: ToolId) {
        if id == self.active_tool {
            return;
        }
        let old = self.active_tool;
        self.dispatcher.reset();
        let disposed = self.with_tool(|tool, tctx| {
            let command = tool.dispose(tctx);
            tctx.grid.clear_cursor();
            command
        });

        self.active_tool = id;
        self.with_tool(|tool, tctx| tool.initialize(tctx));
        log::info!("Tool changed: {} -> {}", old, id);
        self.event_bus.emit(EditorEvent::ToolChanged { old, new: id });
        self.event_bus.emit(EditorEvent::GridChanged);

        if let Some(Some(command)) = disposed {
            self.execute(command);
        }
    }

    /// Lets the active tool place any pending work before the layer set or
    /// canvas changes under it.
    fn settle_active_tool(&mut self) {
        if !self.active_tool().is_some_and(|tool| tool.has_pending()) {
            return;
        }
        self.dispatcher.reset();
        if let Some(Some(command)) = self.with_tool(|tool, tctx| tool.dispose(tctx)) {
            self.execute(command);
        }
    }

    /// Presses a button property of the active tool.
    pub fn trigger_tool_button(&mut self, name: &str) -> Result<(), PropertyError> {
        let Some(tool) = self.tools.get(self.active_tool) else {
            return Ok(());
        };
        let event = tool.properties().button_event(name)?;
        if let Some(Some(command)) = self.with_tool(|tool, tctx| tool.trigger(event, tctx)) {
            self.execute(command);
        }
        self.event_bus.emit(EditorEvent::GridChanged);
        Ok(())
    }

    pub fn set_tool_property(&mut self, tool: ToolId, name: &str, value: PropertyValue) -> Result<(), PropertyError> {
        let Some(target) = self.tools.get_mut(tool) else {
            return Err(PropertyError::Unknown(name.to_string()));
        };
        let properties = target.properties_mut();
        match &value {
            PropertyValue::Slider(v) => {
                properties.set_slider(name, *v)?;
            }
            PropertyValue::Checkbox(v) => properties.set_checkbox(name, *v)?,
            PropertyValue::Radio(option) => properties.set_radio(name, option)?,
        }
        log::debug!("{} {} = {:?}", tool, name, value);
        self.event_bus.emit(EditorEvent::ToolPropertyChanged {
            tool,
            name: name.to_string(),
        });
        Ok(())
    }

    // Palette

    pub fn select_color(&mut self, index: usize) {
        if self.palette.select(index) {
            self.emit_color_selected();
        }
    }

    /// Adds a color to the palette if needed and selects it.
    pub fn pick_color(&mut self, color: RgbaColor) {
        self.palette.add_and_select(color);
        self.emit_color_selected();
    }

    pub fn remove_color(&mut self, index: usize) -> Option<RgbaColor> {
        self.palette.remove(index)
    }

    fn emit_color_selected(&self) {
        if let Some(color) = self.palette.selected_color() {
            self.event_bus.emit(EditorEvent::ColorSelected { hex: color.to_hex() });
        }
    }

    // History

    /// Steps back one commit. A floating selection is put back first instead.
    pub fn undo(&mut self) {
        if self.active_tool().is_some_and(|t| t.has_pending()) {
            self.with_tool(|tool, tctx| tool.trigger("reset", tctx));
            self.event_bus.emit(EditorEvent::GridChanged);
            return;
        }
        let Some(snapshot) = self.history.undo() else {
            log::trace!("Nothing to undo");
            return;
        };
        self.grid.restore(snapshot);
        log::info!("Undo ({} left)", self.history.undo_depth());
        self.event_bus.emit(EditorEvent::GridChanged);
        self.emit_history_changed();
    }

    pub fn redo(&mut self) {
        let Some(snapshot) = self.history.redo() else {
            log::trace!("Nothing to redo");
            return;
        };
        self.grid.restore(snapshot);
        log::info!("Redo ({} left)", self.history.redo_depth());
        self.event_bus.emit(EditorEvent::GridChanged);
        self.emit_history_changed();
    }

    fn reset_history(&mut self) {
        self.history.reset(self.grid.snapshot());
        self.emit_history_changed();
    }

    // Layers

    pub fn add_layer(&mut self, label: &str) -> LayerId {
        self.settle_active_tool();
        let id = self.grid.add_layer(label);
        // Earlier snapshots know nothing about the new layer
        self.reset_history();
        self.event_bus.emit(EditorEvent::LayerChanged(LayerEvent::Added { id }));
        id
    }

    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        if self.grid.layer(id).is_none() || self.grid.layers().len() <= 1 {
            return false;
        }
        self.settle_active_tool();
        if !self.grid.remove_layer(id) {
            return false;
        }
        self.reset_history();
        self.event_bus.emit(EditorEvent::LayerChanged(LayerEvent::Removed { id }));
        self.event_bus.emit(EditorEvent::GridChanged);
        true
    }

    pub fn select_layer(&mut self, index: usize) -> bool {
        if index >= self.grid.layers().len() {
            return false;
        }
        if index != self.grid.selected_layer_index() {
            self.settle_active_tool();
        }
        let selected = self.grid.select_layer(index);
        if selected {
            self.event_bus.emit(EditorEvent::LayerChanged(LayerEvent::Selected { index }));
        }
        selected
    }

    fn update_layer(&mut self, id: LayerId, f: impl FnOnce(&mut Layer)) -> bool {
        let Some(layer) = self.grid.layer_mut(id) else {
            return false;
        };
        f(layer);
        self.event_bus.emit(EditorEvent::LayerChanged(LayerEvent::PropertiesChanged { id }));
        self.event_bus.emit(EditorEvent::GridChanged);
        true
    }

    pub fn rename_layer(&mut self, id: LayerId, label: &str) -> bool {
        self.update_layer(id, |layer| layer.set_label(label.to_string()))
    }

    pub fn set_layer_visibility(&mut self, id: LayerId, visible: bool) -> bool {
        self.update_layer(id, |layer| layer.visible = visible)
    }

    pub fn set_layer_alpha(&mut self, id: LayerId, alpha: f32) -> bool {
        self.update_layer(id, |layer| layer.set_alpha(alpha))
    }

    pub fn set_layer_blend_mode(&mut self, id: LayerId, blend_mode: BlendMode) -> bool {
        self.update_layer(id, |layer| layer.blend_mode = blend_mode)
    }

    // Canvas

    /// Resizes the canvas. Every layer is cleared and history starts over.
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidCanvasSize { width, height });
        }
        self.dispatcher.reset();
        if let Some(Some(command)) = self.with_tool(|tool, tctx| tool.dispose(tctx)) {
            self.execute(command);
        }
        self.grid.resize(width, height)?;
        self.reset_history();
        self.event_bus.emit(EditorEvent::DocumentChanged(DocumentEvent::Resized { width, height }));
        self.event_bus.emit(EditorEvent::GridChanged);
        Ok(())
    }

    pub fn set_mirror(&mut self, mirror: MirrorSettings) {
        self.grid.set_mirror(mirror);
    }

    /// Decodes an image into the selected layer, cropped to the canvas, and commits it.
    pub fn import_image(&mut self, bytes: &[u8]) -> PersistenceResult<()> {
        let image = file_handler::decode_image(bytes)?;
        let Some(id) = self.grid.selected_layer_id() else {
            return Ok(());
        };
        let pixels = image.fit_to_canvas(self.grid.width(), self.grid.height());
        self.grid.load_layer_pixels(id, &pixels);
        log::info!("Imported {}x{} image into layer {}", image.width, image.height, id);
        self.event_bus.emit(EditorEvent::DocumentChanged(DocumentEvent::ImageImported {
            width: image.width,
            height: image.height,
        }));
        self.execute(Command::Commit { tool: self.active_tool });
        self.event_bus.emit(EditorEvent::GridChanged);
        Ok(())
    }

    /// PNG of the composited canvas as it is shown, overlays excluded.
    pub fn export_png(&self) -> PersistenceResult<Vec<u8>> {
        let pixels = renderer::composite_layers(&self.grid);
        file_handler::encode_png(self.grid.width(), self.grid.height(), &pixels)
    }

    /// PNG of one layer's own pixels, ignoring its visibility and alpha.
    pub fn export_layer_png(&self, id: LayerId) -> PersistenceResult<Vec<u8>> {
        if self.grid.layer(id).is_none() {
            return Err(PersistenceError::InvalidState(format!("No layer {}", id)));
        }
        let pixels = self.grid.pixels(Target::Layer(id));
        file_handler::encode_png(self.grid.width(), self.grid.height(), &pixels)
    }

    // Persistence

    pub fn to_document(&self, encoding: LayerEncoding) -> ProjectDocument {
        let (width, height) = (self.grid.width(), self.grid.height());
        let mirror = self.grid.mirror();
        let layers = self
            .grid
            .layers()
            .iter()
            .map(|layer| LayerDocument {
                label: layer.label.clone(),
                visible: layer.visible,
                alpha: layer.alpha,
                blend_mode: layer.blend_mode,
                filters: layer.filters.clone(),
                data: LayerData::encode(
                    self.grid.pixels(Target::Layer(layer.id)),
                    width,
                    height,
                    encoding,
                ),
            })
            .collect();

        ProjectDocument {
            version: env!("CARGO_PKG_VERSION").to_string(),
            preferences: self.preferences,
            tools: ToolsDocument {
                selected_tool: self.active_tool,
                state: self
                    .tools
                    .iter()
                    .map(|(id, tool)| (id.as_str().to_string(), tool.tool_state()))
                    .filter(|(_, state)| !state.is_empty())
                    .collect::<BTreeMap<_, _>>(),
            },
            palette: PaletteDocument {
                selected_color: self.palette.selected_color(),
                colors: self.palette.colors().to_vec(),
            },
            canvas: CanvasDocument {
                settings: CanvasSettingsDocument {
                    width,
                    height,
                    mirror_x: mirror.x,
                    mirror_y: mirror.y,
                },
                layers: LayersDocument {
                    selected_layer: self.grid.selected_layer_index(),
                    layers,
                },
            },
        }
    }

    /// Replaces the whole editor state with a document's. History starts over.
    pub fn from_document(&mut self, document: &ProjectDocument) -> PersistenceResult<()> {
        document.validate()?;
        let settings = &document.canvas.settings;
        let (width, height) = (settings.width, settings.height);

        // Decode everything before touching the editor so a bad layer leaves it intact
        let decoded = document
            .canvas
            .layers
            .layers
            .iter()
            .map(|layer| layer.data.decode(width, height))
            .collect::<PersistenceResult<Vec<_>>>()?;

        self.dispatcher.reset();
        self.with_tool(|tool, tctx| tool.dispose(tctx));
        let mut grid = Grid::new(width, height).map_err(|e| PersistenceError::InvalidState(e.to_string()))?;
        grid.set_mirror(MirrorSettings {
            x: settings.mirror_x,
            y: settings.mirror_y,
        });
        grid.clear_layers();
        for (layer_doc, pixels) in document.canvas.layers.layers.iter().zip(&decoded) {
            let mut layer = Layer::new(&layer_doc.label);
            layer.visible = layer_doc.visible;
            layer.set_alpha(layer_doc.alpha);
            layer.blend_mode = layer_doc.blend_mode;
            layer.filters = layer_doc.filters.clone();
            let id = grid.insert_layer(layer);
            grid.load_layer_pixels(id, pixels);
        }
        grid.select_layer(document.canvas.layers.selected_layer);
        self.grid = grid;

        let mut palette = Palette::new();
        for color in &document.palette.colors {
            palette.add(*color);
        }
        if let Some(selected) = document.palette.selected_color {
            palette.add_and_select(selected);
        }
        self.palette = palette;

        for (name, state) in &document.tools.state {
            let Ok(id) = name.parse::<ToolId>() else {
                log::warn!("Ignoring state for unknown tool {:?}", name);
                continue;
            };
            if let Some(tool) = self.tools.get_mut(id) {
                if let Err(e) = tool.apply_tool_state(state) {
                    log::warn!("Ignoring saved {} settings: {}", name, e);
                }
            }
        }
        self.active_tool = document.tools.selected_tool;
        self.with_tool(|tool, tctx| tool.initialize(tctx));
        self.preferences = document.preferences;

        self.reset_history();
        self.event_bus.emit(EditorEvent::DocumentChanged(DocumentEvent::Loaded));
        self.event_bus.emit(EditorEvent::GridChanged);
        Ok(())
    }

    pub fn save_project(&self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        self.to_document(LayerEncoding::default()).save(path)?;
        self.event_bus.emit(EditorEvent::DocumentChanged(DocumentEvent::Saved));
        Ok(())
    }

    pub fn load_project(&mut self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        let document = ProjectDocument::load(path)?;
        self.from_document(&document)
    }
}
