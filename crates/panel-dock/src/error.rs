//! Dock-engine contract violations (spec §7: "Invalid reference widget
//! (not contained) throws").

/// A contract violation raised by mis-use of the dock engine's public API.
#[derive(Debug, thiserror::Error)]
pub enum DockError {
    #[error("reference widget is not contained in this dock panel")]
    UnknownReference,
    #[error("a drag is already in progress")]
    DragAlreadyActive,
    #[error("no drag is in progress")]
    EmptyDrag,
}

pub type Result<T> = std::result::Result<T, DockError>;
