//! Cooperative message loop and signal/slot bus.
//!
//! This crate has no notion of a DOM, a widget, or a dock panel — it is the
//! small, reusable substrate that `panel-widgets` and `panel-dock` build
//! their protocols on top of. Everything here assumes a single-threaded,
//! cooperative host (see the crate-level docs in `message` and `signal`).

pub mod ids;
pub mod message;
pub mod scheduler;
pub mod signal;

pub mod diagnostics;

pub use ids::ObjectId;
pub use message::{Handler, HandlerRef, Hook, HookRef, Message, MessageLoop};
pub use scheduler::{FrameCallback, ImmediateScheduler, Scheduler};
pub use signal::{slot, Signal, Slot};
