//! The signal/slot bus: weak-lifetime connections between a sender and a
//! receiving slot, plus a global inverse index so a disposed object's
//! bindings can be torn down without walking every signal it ever touched.
//!
//! See spec §4.2. A signal does not own its receivers, and a receiver does
//! not own the signals it listens to — both sides are free to be dropped
//! at any time, and `emit` silently skips bindings whose receiver is gone.

use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use crate::ids::ObjectId;

/// One connection: a slot closure plus the identity of the receiver it is
/// logically bound to (for `disconnect_receiver`/`disconnect_sender`) and
/// a `Weak` handle the bus uses to tell a disposed receiver apart from a
/// merely-quiet one.
///
/// The closure and the liveness flag live behind the same `Rc` so that a
/// disconnect racing an in-progress `emit` is observed by that emit: both
/// hold the same cell, not a copy of it.
struct Binding<T> {
    sender_id: ObjectId,
    receiver_id: ObjectId,
    receiver_alive: Weak<()>,
    slot: Slot<T>,
}

/// A signal a sender exposes. `T` is the argument payload delivered to
/// every connected slot.
pub struct Signal<T> {
    sender_id: ObjectId,
    bindings: RefCell<Vec<Rc<Binding<T>>>>,
}

/// Type-erased view of a `Signal<T>`'s bindings, so the global inverse
/// index can hold signals of differing `T` in one map.
trait ErasedSignal {
    fn remove_receiver(&self, receiver_id: ObjectId);
    fn clear_all(&self);
}

impl<T> ErasedSignal for Signal<T> {
    fn remove_receiver(&self, receiver_id: ObjectId) {
        self.bindings
            .borrow_mut()
            .retain(|b| b.receiver_id != receiver_id);
    }

    /// Drop every binding on this signal, regardless of receiver. Used by
    /// `disconnect_sender`: once the sender is gone the signal itself is
    /// dead to every receiver, not just to bindings where sender and
    /// receiver happen to be the same object.
    fn clear_all(&self) {
        self.bindings.borrow_mut().clear();
    }
}

thread_local! {
    /// Every live signal, keyed by its sender's identity, so
    /// `disconnect_sender` can tear down all of a disposed sender's
    /// signals without the caller needing to enumerate them.
    static BY_SENDER: RefCell<HashMap<ObjectId, Vec<Weak<dyn ErasedSignal>>>> =
        RefCell::new(HashMap::new());
    /// Every live signal a given receiver has connected to, keyed by the
    /// receiver's identity, so `disconnect_receiver` can do the same from
    /// the other side.
    static BY_RECEIVER: RefCell<HashMap<ObjectId, Vec<Weak<dyn ErasedSignal>>>> =
        RefCell::new(HashMap::new());
}

impl<T: 'static> Signal<T> {
    /// `sender_id` identifies the object that owns this signal (typically
    /// `ObjectId::of(&self_rc)` from inside the owner's constructor).
    pub fn new(sender_id: ObjectId) -> Rc<Self> {
        let signal = Rc::new(Self {
            sender_id,
            bindings: RefCell::new(Vec::new()),
        });
        let erased: Rc<dyn ErasedSignal> = signal.clone();
        BY_SENDER.with(|map| {
            map.borrow_mut()
                .entry(sender_id)
                .or_default()
                .push(Rc::downgrade(&erased));
        });
        signal
    }

    /// Connect `slot` to fire on every future `emit`. `receiver_id` and
    /// `receiver_alive` identify the logical owner of `slot` for the
    /// inverse index and for liveness checks; `receiver_alive` should be a
    /// `Weak<()>` (or any `Weak<X>` coerced via a marker field) that
    /// expires exactly when the receiver is dropped.
    ///
    /// Idempotent on the `(receiver_id, slot)` pair: reconnecting the same
    /// `Rc` a second time is a no-op and returns `false`; a genuinely new
    /// binding returns `true`. Identity is by `Rc::ptr_eq` on `slot`, so
    /// callers that want idempotence must hold onto and reuse the same
    /// `Rc` rather than constructing a fresh one per call.
    pub fn connect(self: &Rc<Self>, receiver_id: ObjectId, receiver_alive: Weak<()>, slot: Slot<T>) -> bool {
        let already_connected = self.bindings.borrow().iter().any(|b| {
            b.receiver_id == receiver_id && Rc::ptr_eq(&b.slot, &slot)
        });
        if already_connected {
            return false;
        }

        let binding = Rc::new(Binding {
            sender_id: self.sender_id,
            receiver_id,
            receiver_alive,
            slot,
        });
        self.bindings.borrow_mut().push(binding);

        let erased: Rc<dyn ErasedSignal> = self.clone();
        BY_RECEIVER.with(|map| {
            map.borrow_mut()
                .entry(receiver_id)
                .or_default()
                .push(Rc::downgrade(&erased));
        });
        true
    }

    /// Whether any live binding is registered for `receiver_id`.
    pub fn is_connected(&self, receiver_id: ObjectId) -> bool {
        self.bindings
            .borrow()
            .iter()
            .any(|b| b.receiver_id == receiver_id && b.receiver_alive.upgrade().is_some())
    }

    /// Disconnect every binding registered for `receiver_id` on this
    /// signal specifically (as opposed to [`disconnect_receiver`], which
    /// disconnects across every signal the receiver ever connected to).
    pub fn disconnect(&self, receiver_id: ObjectId) {
        self.bindings
            .borrow_mut()
            .retain(|b| b.receiver_id != receiver_id);
    }

    /// Invoke every live slot with `arg`, in connection order.
    ///
    /// Bindings are snapshotted into a `Vec<Rc<Binding<T>>>` up front, so a
    /// slot that disconnects itself or another receiver mid-emit does not
    /// perturb this emit's iteration — but because the snapshot clones the
    /// `Rc<Binding>` rather than its contents, a disconnect that happens
    /// strictly *before* a not-yet-invoked binding's turn still takes
    /// effect: we re-check `receiver_alive` and membership just before
    /// calling each slot.
    pub fn emit(&self, arg: &T) {
        let snapshot: Vec<Rc<Binding<T>>> = self.bindings.borrow().clone();
        for binding in snapshot {
            if binding.receiver_alive.upgrade().is_none() {
                continue;
            }
            // A slot disconnected between the snapshot and now: skip it
            // without invoking, matching "disconnect during emit never
            // sees a delivery after the call returns".
            let still_bound = self
                .bindings
                .borrow()
                .iter()
                .any(|b| Rc::ptr_eq(b, &binding));
            if !still_bound {
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                (*binding.slot.borrow_mut())(arg);
            }));
            if result.is_err() {
                log::error!("panel-core: signal slot panicked during emit");
            }
        }
    }
}

/// A connectable slot: reference-counted so `connect` can compare two
/// handles for identity (`Rc::ptr_eq`) to implement idempotent connect,
/// and so the same closure can be held by caller code to later pass to
/// `connect` again as a no-op, or never re-passed at all.
pub type Slot<T> = Rc<RefCell<dyn FnMut(&T)>>;

/// Wrap a plain `FnMut` closure into a connectable [`Slot`].
pub fn slot<T: 'static>(f: impl FnMut(&T) + 'static) -> Slot<T> {
    Rc::new(RefCell::new(f))
}

/// Disconnect every binding whose sender is `sender_id`, across every
/// signal that sender ever created. Called when an object with signals is
/// disposed.
pub fn disconnect_sender(sender_id: ObjectId) {
    BY_SENDER.with(|map| {
        if let Some(signals) = map.borrow_mut().remove(&sender_id) {
            for weak in signals {
                if let Some(signal) = weak.upgrade() {
                    // The sender itself is gone; drop every binding on
                    // its signals unconditionally, regardless of who the
                    // receiver is.
                    signal.clear_all();
                }
            }
        }
    });
}

/// Disconnect every binding whose receiver is `receiver_id`, across every
/// signal that receiver ever connected to. Called when a receiving object
/// is disposed, from the receiver's side of the index.
pub fn disconnect_receiver(receiver_id: ObjectId) {
    BY_RECEIVER.with(|map| {
        if let Some(signals) = map.borrow_mut().remove(&receiver_id) {
            for weak in signals {
                if let Some(signal) = weak.upgrade() {
                    signal.remove_receiver(receiver_id);
                }
            }
        }
    });
}

/// Drop every signal this sender owns from the index, and every binding
/// this receiver holds, in one call. Equivalent to `disconnect_sender` and
/// `disconnect_receiver` called with the same id, for objects that act as
/// both (most widgets do).
pub fn clear_data(object_id: ObjectId) {
    disconnect_sender(object_id);
    disconnect_receiver(object_id);
}
