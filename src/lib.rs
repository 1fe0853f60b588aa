#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod backend;
pub mod color;
pub mod command;
mod components;
pub mod error;
pub mod event;
pub mod file_handler;
pub mod geometry;
pub mod graphic;
pub mod grid;
pub mod input;
pub mod layer;
pub mod palette;
mod panels;
pub mod renderer;
pub mod selection;
pub mod settings;
pub mod state;
pub mod tools;
pub mod util;

pub use app::PaintApp;
pub use color::RgbaColor;
pub use command::{Command, History};
pub use error::EditorError;
pub use event::{EditorEvent, EventBus};
pub use geometry::PixelCoordinates;
pub use grid::Grid;
pub use input::{CanvasEvent, PointerEvent};
pub use renderer::Renderer;
pub use settings::EditorSettings;
pub use state::EditorContext;
pub use tools::{Tool, ToolId};
