//! Pointer-identity keys shared by the message loop and the signal bus.
//!
//! Handlers, signal senders, and signal receivers are all ordinary
//! `Rc<RefCell<_>>`-owned objects (see the crate docs for why `Rc`/`RefCell`
//! rather than `Arc`/`Mutex`). The loop and the bus never need to look
//! inside those objects — they only need a stable identity to key hook
//! chains, queued entries, and signal bindings on. `ObjectId` is that
//! identity: the address of the allocation, with the vtable half of any
//! fat pointer stripped off so two `Rc` clones of the same trait object
//! compare equal.

use std::cell::RefCell;
use std::rc::Rc;

/// A stable, copyable identity for an `Rc<RefCell<_>>`-owned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Derive the identity of an `Rc<RefCell<T>>`, including unsized `T`
    /// (trait objects such as `Rc<RefCell<dyn Handler>>`).
    pub fn of<T: ?Sized>(rc: &Rc<RefCell<T>>) -> Self {
        ObjectId(Rc::as_ptr(rc) as *const () as usize)
    }

    /// Derive an identity from an already-unique counter value, for
    /// objects (like `Title`) that are never themselves behind an
    /// `Rc<RefCell<_>>` and so have no address of their own to key on.
    pub fn from_raw(id: usize) -> Self {
        ObjectId(id)
    }

    /// The underlying address/counter value, for callers that need a
    /// stable string key derived from identity (a vdom `key`, for
    /// instance) rather than just equality.
    pub fn raw(&self) -> usize {
        self.0
    }
}
