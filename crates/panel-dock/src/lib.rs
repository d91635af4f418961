//! The dock-panel geometry engine (spec §4.6): a tree of split/tab panels,
//! drop-zone hit-testing, and the tab-drag lifecycle that rearranges the
//! tree in response to a pointer drag. Built entirely on `panel-widgets`'
//! `TabPanel`/`SplitLayout`/`Widget` primitives — this crate owns no DOM
//! node type of its own beyond what `panel_vdom::DomDriver` already
//! provides.

pub mod dock_panel;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod tree;

pub use dock_panel::{DockPanel, DropTarget, InsertOptions};
pub use drag::{DragController, DragSession, DragState};
pub use error::{DockError, Result};
pub use geometry::{Side, Zone};
pub use overlay::{DomOverlay, Overlay};
pub use tree::{AddMode, DockTree};
