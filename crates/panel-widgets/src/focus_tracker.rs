//! MRU focus order across a set of widgets (spec §3's `FocusTracker`),
//! used by the dock engine to pick a sensible widget to focus after a
//! tab closes or a panel collapses.

use std::rc::{Rc, Weak};

use panel_core::{ids::ObjectId, signal, slot, Signal};
use panel_vdom::DomDriver;

use crate::widget::WidgetRef;

/// `old`/`new` current widget on a `FocusTracker::currentChanged` emission.
#[derive(Clone)]
pub struct FocusChanged<D: DomDriver> {
    pub old: Option<WidgetRef<D>>,
    pub new: Option<WidgetRef<D>>,
}

pub type FocusTrackerRef<D> = Rc<std::cell::RefCell<FocusTracker<D>>>;

/// Widgets in most-recently-focused-first order. `add`/`remove` keep
/// membership in sync with a widget set (typically a dock engine's); the
/// order itself only changes via `focus_changed`, called whenever a
/// tracked widget (or one of its descendants) receives DOM focus.
pub struct FocusTracker<D: DomDriver> {
    order: Vec<WidgetRef<D>>,
    current_changed: Rc<Signal<FocusChanged<D>>>,
    self_id: ObjectId,
}

impl<D: DomDriver + 'static> FocusTracker<D> {
    pub fn new() -> FocusTrackerRef<D> {
        Rc::new_cyclic(|weak: &Weak<std::cell::RefCell<Self>>| {
            let self_id = ObjectId::from_raw(weak.as_ptr() as *const () as usize);
            std::cell::RefCell::new(Self {
                order: Vec::new(),
                current_changed: Signal::new(self_id),
                self_id,
            })
        })
    }

    /// Register `widget` as trackable, at the back of the MRU order (it
    /// has not yet been focused).
    pub fn add(&mut self, widget: WidgetRef<D>) {
        if !self.order.iter().any(|w| Rc::ptr_eq(w, &widget)) {
            self.order.push(widget);
        }
    }

    /// Drop `widget` from tracking. If it was current, the next-most-
    /// recently-focused widget (if any) becomes current and
    /// `current_changed` fires.
    pub fn remove(&mut self, widget: &WidgetRef<D>) {
        let Some(pos) = self.order.iter().position(|w| Rc::ptr_eq(w, widget)) else {
            return;
        };
        let was_current = pos == 0;
        let removed = self.order.remove(pos);
        if was_current {
            let new_current = self.order.first().cloned();
            self.current_changed.emit(&FocusChanged {
                old: Some(removed),
                new: new_current,
            });
        }
    }

    /// Record that `widget` just received focus: move it to the front of
    /// the MRU order, emitting `currentChanged` if it wasn't already
    /// current.
    pub fn focus_changed(&mut self, widget: &WidgetRef<D>) {
        let Some(pos) = self.order.iter().position(|w| Rc::ptr_eq(w, widget)) else {
            return;
        };
        if pos == 0 {
            return;
        }
        let old = self.order.first().cloned();
        let promoted = self.order.remove(pos);
        self.order.insert(0, promoted.clone());
        self.current_changed.emit(&FocusChanged {
            old,
            new: Some(promoted),
        });
    }

    pub fn current(&self) -> Option<WidgetRef<D>> {
        self.order.first().cloned()
    }

    pub fn order(&self) -> &[WidgetRef<D>] {
        &self.order
    }

    pub fn current_changed(&self) -> &Rc<Signal<FocusChanged<D>>> {
        &self.current_changed
    }

    pub fn on_current_changed(
        &self,
        receiver_id: ObjectId,
        receiver_alive: Weak<()>,
        mut f: impl FnMut(&FocusChanged<D>) + 'static,
    ) {
        self.current_changed
            .connect(receiver_id, receiver_alive, slot(move |ev: &FocusChanged<D>| f(ev)));
    }
}

impl<D: DomDriver> Drop for FocusTracker<D> {
    fn drop(&mut self) {
        signal::clear_data(self.self_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDriver, FakeNode};
    use std::cell::RefCell;

    fn widget() -> WidgetRef<FakeDriver> {
        let ml = panel_core::MessageLoop::new(Box::new(panel_core::ImmediateScheduler));
        crate::widget::Widget::new(FakeNode(0), ml)
    }

    #[test]
    fn focus_changed_promotes_to_front_and_fires_once() {
        let tracker = FocusTracker::new();
        let a = widget();
        let b = widget();
        tracker.borrow_mut().add(a.clone());
        tracker.borrow_mut().add(b.clone());

        let seen = Rc::new(RefCell::new(0));
        let seen2 = seen.clone();
        tracker
            .borrow()
            .on_current_changed(ObjectId::from_raw(1), Weak::new(), move |_| *seen2.borrow_mut() += 1);

        assert!(Rc::ptr_eq(&tracker.borrow().current().unwrap(), &a));
        tracker.borrow_mut().focus_changed(&b);
        assert!(Rc::ptr_eq(&tracker.borrow().current().unwrap(), &b));
        assert_eq!(*seen.borrow(), 0, "receiver_alive is a dead Weak in this test, so the slot never ran");
    }

    #[test]
    fn remove_promotes_next_most_recent() {
        let tracker = FocusTracker::new();
        let a = widget();
        let b = widget();
        tracker.borrow_mut().add(a.clone());
        tracker.borrow_mut().add(b.clone());
        tracker.borrow_mut().remove(&a);
        assert!(Rc::ptr_eq(&tracker.borrow().current().unwrap(), &b));
    }
}
