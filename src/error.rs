use thiserror::Error;

/// Errors produced when parsing a hex color string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("Hex color must have 6 or 8 digits: {0:?}")]
    InvalidLength(String),

    #[error("Hex color contains a non-hex digit: {0:?}")]
    InvalidDigit(String),
}

/// Errors raised by the event bus when handlers are registered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventBusError {
    #[error("A subscription named {0:?} already exists")]
    DuplicateSubscription(String),
    #[error("Can't change subscriptions while an event is being handled")]
    Busy,
}

/// Errors raised while registering or editing tool properties
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("Tool property {0:?} is registered twice")]
    DuplicateName(String),

    #[error("Unknown tool property {0:?}")]
    Unknown(String),

    #[error("Tool property {name:?} is a {expected}, not a {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors that can occur while building or driving the editor
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    EventBus(#[from] EventBusError),

    #[error(transparent)]
    Color(#[from] ColorParseError),

    #[error("Canvas size must be non-zero, got {width}x{height}")]
    InvalidCanvasSize { width: u32, height: u32 },
}
