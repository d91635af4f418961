//! Virtual-DOM element descriptors and the keyed-diff reconciler that
//! binds them to a host element.
//!
//! This crate knows nothing about widgets, layouts, or the message
//! loop — it is the rendering substrate `panel-widgets` calls into from
//! a widget's `on_update_request` handler (see spec §4.4).

pub mod attrs;
pub mod geometry;
pub mod host;
pub mod reconciler;
pub mod vnode;

pub use attrs::{handler, mode_of, AttrMode, AttrValue, DomEvent, EventHandler};
pub use geometry::Rect;
pub use host::DomDriver;
pub use reconciler::{Mount, Reconciler};
pub use vnode::{ComponentNode, ElementNode, Style, VNode};

#[cfg(target_arch = "wasm32")]
pub use host::WebSysDriver;

#[cfg(test)]
mod tests;
