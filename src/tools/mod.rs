use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::RgbaColor;
use crate::command::Command;
use crate::error::{EditorError, PropertyError};
use crate::event::EditorEvent;
use crate::geometry::PixelCoordinates;
use crate::grid::Grid;
use crate::input::{DragPhase, PointerEvent};

pub mod property;
pub use property::{PropertyKind, ToolProperties, ToolProperty, ToolState};

mod brush;

mod pencil;
pub use pencil::PencilTool;

mod eraser;
pub use eraser::EraserTool;

mod picker;
pub use picker::PickerTool;

mod fill;
pub use fill::FillTool;

mod shape_tool;
pub use shape_tool::{ShapeGeometry, ShapeKind, ShapeTool, shape_geometry};

mod line_tool;
pub use line_tool::{LineTool, snap_line_end};

mod shade_tool;
pub use shade_tool::{ShadeMode, ShadeTool, shade_color};

mod region_tool;
pub use region_tool::{RegionMode, RegionState, RegionTool};

/// Identifies every tool the editor ships with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    Pencil,
    Eraser,
    Picker,
    Fill,
    Rectangle,
    Ellipse,
    Circle,
    Line,
    Shade,
    Select,
    Clone,
}

impl ToolId {
    pub const ALL: [ToolId; 11] = [
        ToolId::Pencil,
        ToolId::Eraser,
        ToolId::Picker,
        ToolId::Fill,
        ToolId::Rectangle,
        ToolId::Ellipse,
        ToolId::Circle,
        ToolId::Line,
        ToolId::Shade,
        ToolId::Select,
        ToolId::Clone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pencil => "pencil",
            Self::Eraser => "eraser",
            Self::Picker => "picker",
            Self::Fill => "fill",
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Circle => "circle",
            Self::Line => "line",
            Self::Shade => "shade",
            Self::Select => "select",
            Self::Clone => "clone",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pencil => "Pencil",
            Self::Eraser => "Eraser",
            Self::Picker => "Color picker",
            Self::Fill => "Fill",
            Self::Rectangle => "Rectangle",
            Self::Ellipse => "Ellipse",
            Self::Circle => "Circle",
            Self::Line => "Line",
            Self::Shade => "Shade",
            Self::Select => "Select",
            Self::Clone => "Clone",
        }
    }

    /// How the dispatcher drives this tool.
    pub fn capabilities(self) -> ToolCapabilities {
        match self {
            Self::Pencil | Self::Eraser | Self::Shade => ToolCapabilities::new(true, true, true, true),
            Self::Picker => ToolCapabilities::new(false, true, true, false),
            Self::Fill => ToolCapabilities::new(true, false, false, false),
            Self::Rectangle | Self::Ellipse | Self::Circle | Self::Line => ToolCapabilities::new(true, true, false, true),
            Self::Select => ToolCapabilities::new(false, true, false, false),
            Self::Clone => ToolCapabilities::new(true, true, false, false),
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| EditorError::UnknownTool(s.to_string()))
    }
}

/// Behavior flags read by the dispatcher, never by the tool itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolCapabilities {
    /// Draw a cursor preview while hovering without a drag
    pub show_preview_on_invoke: bool,
    /// Invoke the tool on pointer moves during a drag
    pub invoke_on_move: bool,
    /// Invoke at most once per pixel within one drag
    pub track_pixels: bool,
    /// Replicate writes through the canvas mirror settings
    pub can_mirror: bool,
}

impl ToolCapabilities {
    const fn new(show_preview_on_invoke: bool, invoke_on_move: bool, track_pixels: bool, can_mirror: bool) -> Self {
        Self {
            show_preview_on_invoke,
            invoke_on_move,
            track_pixels,
            can_mirror,
        }
    }
}

/// What a tool gets to work with during one invocation
pub struct ToolContext<'a> {
    pub grid: &'a mut Grid,
    /// Selected palette color; tools that paint do nothing without one
    pub color: Option<RgbaColor>,
    /// Set by the dispatcher from the tool's capabilities
    pub mirror: bool,
    events: Vec<EditorEvent>,
}

impl<'a> ToolContext<'a> {
    pub fn new(grid: &'a mut Grid, color: Option<RgbaColor>) -> Self {
        Self {
            grid,
            color,
            mirror: false,
            events: Vec::new(),
        }
    }

    /// Positions a `width × height` footprint at `coords` is written to,
    /// with mirror images when mirroring applies. Duplicates are removed.
    pub fn reflect(&self, coords: PixelCoordinates, width: u32, height: u32) -> Vec<PixelCoordinates> {
        if !self.mirror {
            return vec![coords];
        }
        let mut out = Vec::with_capacity(4);
        for p in self.grid.reflect_coordinates(coords, width, height) {
            if !out.contains(&p) {
                out.push(p);
            }
        }
        out
    }

    /// Queues an event for the editor to emit once the tool returns.
    pub fn notify(&mut self, event: EditorEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Tool trait defines the interface for every pixel tool.
///
/// Tools mutate the grid through the [`ToolContext`] and return a [`Command`]
/// when the editor has to do something on their behalf, such as recording a
/// finished gesture in history.
pub trait Tool {
    fn id(&self) -> ToolId;

    fn name(&self) -> &'static str {
        self.id().as_str()
    }

    fn properties(&self) -> &ToolProperties;

    fn properties_mut(&mut self) -> &mut ToolProperties;

    /// Called when the tool becomes the active tool.
    fn initialize(&mut self, _ctx: &mut ToolContext<'_>) {}

    /// Called when another tool is selected. Pending work is finished or dropped here.
    fn dispose(&mut self, _ctx: &mut ToolContext<'_>) -> Option<Command> {
        None
    }

    /// Handles one phase of a drag at the event's pixel.
    fn invoke_action(&mut self, phase: DragPhase, event: PointerEvent, ctx: &mut ToolContext<'_>) -> Option<Command>;

    /// Draws the hover preview on the cursor layer. The dispatcher clears it first.
    fn preview_cursor(&mut self, _coords: PixelCoordinates, _ctx: &mut ToolContext<'_>) {}

    /// Handles a button property.
    fn trigger(&mut self, _event: &str, _ctx: &mut ToolContext<'_>) -> Option<Command> {
        None
    }

    /// True while the tool holds uncommitted work outside the layers.
    fn has_pending(&self) -> bool {
        false
    }

    fn current_state_name(&self) -> &'static str {
        "Idle"
    }

    fn tool_state(&self) -> ToolState {
        self.properties().to_state()
    }

    fn apply_tool_state(&mut self, state: &ToolState) -> Result<(), PropertyError> {
        self.properties_mut().apply_state(state)
    }
}

/// Enum representing all available tool types
#[derive(Debug, Clone)]
pub enum ToolType {
    Pencil(PencilTool),
    Eraser(EraserTool),
    Picker(PickerTool),
    Fill(FillTool),
    Shape(ShapeTool),
    Line(LineTool),
    Shade(ShadeTool),
    Region(RegionTool),
}

macro_rules! dispatch {
    ($self:expr, $tool:ident => $body:expr) => {
        match $self {
            ToolType::Pencil($tool) => $body,
            ToolType::Eraser($tool) => $body,
            ToolType::Picker($tool) => $body,
            ToolType::Fill($tool) => $body,
            ToolType::Shape($tool) => $body,
            ToolType::Line($tool) => $body,
            ToolType::Shade($tool) => $body,
            ToolType::Region($tool) => $body,
        }
    };
}

impl Tool for ToolType {
    fn id(&self) -> ToolId {
        dispatch!(self, tool => tool.id())
    }

    fn properties(&self) -> &ToolProperties {
        dispatch!(self, tool => tool.properties())
    }

    fn properties_mut(&mut self) -> &mut ToolProperties {
        dispatch!(self, tool => tool.properties_mut())
    }

    fn initialize(&mut self, ctx: &mut ToolContext<'_>) {
        dispatch!(self, tool => tool.initialize(ctx))
    }

    fn dispose(&mut self, ctx: &mut ToolContext<'_>) -> Option<Command> {
        dispatch!(self, tool => tool.dispose(ctx))
    }

    fn invoke_action(&mut self, phase: DragPhase, event: PointerEvent, ctx: &mut ToolContext<'_>) -> Option<Command> {
        dispatch!(self, tool => tool.invoke_action(phase, event, ctx))
    }

    fn preview_cursor(&mut self, coords: PixelCoordinates, ctx: &mut ToolContext<'_>) {
        dispatch!(self, tool => tool.preview_cursor(coords, ctx))
    }

    fn trigger(&mut self, event: &str, ctx: &mut ToolContext<'_>) -> Option<Command> {
        dispatch!(self, tool => tool.trigger(event, ctx))
    }

    fn has_pending(&self) -> bool {
        dispatch!(self, tool => tool.has_pending())
    }

    fn current_state_name(&self) -> &'static str {
        dispatch!(self, tool => tool.current_state_name())
    }
}

impl ToolType {
    /// Builds a tool with its default properties.
    pub fn new(id: ToolId) -> Result<Self, PropertyError> {
        Ok(match id {
            ToolId::Pencil => Self::Pencil(PencilTool::new()?),
            ToolId::Eraser => Self::Eraser(EraserTool::new()?),
            ToolId::Picker => Self::Picker(PickerTool::new()),
            ToolId::Fill => Self::Fill(FillTool::new()?),
            ToolId::Rectangle => Self::Shape(ShapeTool::new(ShapeKind::Rectangle)?),
            ToolId::Ellipse => Self::Shape(ShapeTool::new(ShapeKind::Ellipse)?),
            ToolId::Circle => Self::Shape(ShapeTool::new(ShapeKind::Circle)?),
            ToolId::Line => Self::Line(LineTool::new()?),
            ToolId::Shade => Self::Shade(ShadeTool::new()?),
            ToolId::Select => Self::Region(RegionTool::new(RegionMode::Select)?),
            ToolId::Clone => Self::Region(RegionTool::new(RegionMode::Clone)?),
        })
    }

    pub fn capabilities(&self) -> ToolCapabilities {
        self.id().capabilities()
    }
}

/// Factory function to create a new tool from its identifier
pub fn new_tool(name: &str) -> Result<ToolType, EditorError> {
    let id: ToolId = name.parse()?;
    Ok(ToolType::new(id)?)
}

/// One instance of every tool, keyed by identifier
#[derive(Debug, Clone)]
pub struct ToolTable {
    tools: BTreeMap<ToolId, ToolType>,
}

impl ToolTable {
    pub fn new() -> Result<Self, PropertyError> {
        let mut tools = BTreeMap::new();
        for id in ToolId::ALL {
            tools.insert(id, ToolType::new(id)?);
        }
        Ok(Self { tools })
    }

    pub fn get(&self, id: ToolId) -> Option<&ToolType> {
        self.tools.get(&id)
    }

    pub fn get_mut(&mut self, id: ToolId) -> Option<&mut ToolType> {
        self.tools.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ToolId, &ToolType)> {
        self.tools.iter().map(|(id, tool)| (*id, tool))
    }
}
