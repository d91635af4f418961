//! Frame scheduling: "a single frame callback is outstanding at any time."
//!
//! The message loop doesn't know or care whether a frame is a browser
//! repaint or an immediate synchronous callback — it asks a `Scheduler` to
//! run a closure "on the next frame" and trusts the scheduler to call it
//! exactly once.

/// A one-shot callback the scheduler runs at the next frame boundary.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Requests a single future invocation of a callback.
///
/// Implementations must not call `cb` synchronously from within
/// `request_frame` unless they document that they do (see
/// [`ImmediateScheduler`]) — the message loop relies on at least a
/// microtask's worth of delay to get round-based fairness between posts
/// made during drain and posts made before it.
pub trait Scheduler {
    fn request_frame(&self, cb: FrameCallback);
}

/// Runs the callback synchronously, inline with the call to
/// `request_frame`.
///
/// This is the "no native frame API" fallback from the message-loop spec:
/// a host with no `requestAnimationFrame` equivalent (our tests, and any
/// embedder that wants deterministic single-step draining) can use this
/// scheduler to turn every `post` into an immediate drain.
#[derive(Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn request_frame(&self, cb: FrameCallback) {
        cb();
    }
}

#[cfg(target_arch = "wasm32")]
mod raf {
    use super::{FrameCallback, Scheduler};
    use std::cell::RefCell;
    use wasm_bindgen::prelude::*;

    /// Schedules frame callbacks through `window.requestAnimationFrame`.
    ///
    /// This is the scheduler a browser-hosted application installs; the
    /// `Closure` must be kept alive for the duration of the pending call,
    /// so we stash it in a `RefCell` and drop it once it has run.
    #[derive(Default)]
    pub struct RafScheduler {
        pending: RefCell<Option<Closure<dyn FnMut()>>>,
    }

    impl Scheduler for RafScheduler {
        fn request_frame(&self, cb: FrameCallback) {
            let cb = RefCell::new(Some(cb));
            let closure = Closure::once(move || {
                if let Some(cb) = cb.borrow_mut().take() {
                    cb();
                }
            });
            let window = web_sys::window().expect("panel-core requires a browser `window`");
            window
                .request_animation_frame(closure.as_ref().unchecked_ref())
                .expect("requestAnimationFrame failed");
            *self.pending.borrow_mut() = Some(closure);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use raf::RafScheduler;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn immediate_scheduler_runs_synchronously() {
        let ran = Rc::new(Cell::new(false));
        let scheduler = ImmediateScheduler;
        let flag = ran.clone();
        scheduler.request_frame(Box::new(move || flag.set(true)));
        assert!(ran.get());
    }
}
