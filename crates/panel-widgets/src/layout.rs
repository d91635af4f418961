//! Layout base (spec §4.5): the trait every concrete layout implements,
//! shared per-item geometry bookkeeping, and the box-sizing algorithm
//! `SplitLayout` (and the plain `BoxLayout`) both drive.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use panel_core::{Message, MessageLoop};
use panel_vdom::DomDriver;

use crate::messages::ChildMessage;
use crate::widget::{Widget, WidgetRef};

/// Per-child geometry a layout tracks alongside the widget it wraps
/// (spec §3: "a `LayoutItem`...wrapping one child widget plus cached
/// geometry").
#[derive(Debug, Clone, Copy)]
pub struct SizeLimits {
    pub min: i32,
    pub max: i32,
    pub size_hint: i32,
    pub stretch: i32,
    pub expansive: bool,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            min: 0,
            max: i32::MAX,
            size_hint: 0,
            stretch: 0,
            expansive: false,
        }
    }
}

pub struct LayoutItem<D: DomDriver> {
    pub widget: WidgetRef<D>,
    pub limits: RefCell<SizeLimits>,
}

impl<D: DomDriver> LayoutItem<D> {
    pub fn new(widget: WidgetRef<D>) -> Self {
        Self {
            widget,
            limits: RefCell::new(SizeLimits::default()),
        }
    }
}

/// A layout injected into a parent widget's message pipeline (spec §4.5,
/// §9 "layout-as-hook"). `Widget<D>::process_message` forwards every
/// message it receives to its assigned layout's `handle_parent_message`
/// before (in this implementation, instead of) acting on it itself —
/// the parent widget stays entirely unaware of which concrete layout, if
/// any, it carries.
pub trait Layout<D: DomDriver> {
    /// Called exactly once, from `Widget::set_layout`, before the layout
    /// is stored on the parent. Reparents every widget the layout was
    /// constructed with under `parent` and remembers `parent`'s message
    /// loop so later `post`/`send` calls don't need it threaded through
    /// every method.
    fn init(&self, parent: &WidgetRef<D>);

    /// Dispatch one message the parent widget received. Matches on
    /// `msg.message_type()` the same way a hook would dispatch on
    /// message identity, since this implementation folds the hook into
    /// `Widget::process_message` directly rather than the message loop's
    /// generic hook chain (see module docs).
    fn handle_parent_message(&self, msg: &dyn Message);

    /// Every widget this layout currently manages, in display order.
    fn widgets(&self) -> Vec<WidgetRef<D>>;
}

/// Shared plumbing every concrete layout embeds: the owning parent (set
/// once via `init`), that parent's message loop and DOM driver, and the
/// ordered item list.
pub struct LayoutBase<D: DomDriver> {
    parent: RefCell<Weak<RefCell<Widget<D>>>>,
    message_loop: RefCell<Option<Rc<MessageLoop>>>,
    driver: Rc<D>,
    pub(crate) items: RefCell<Vec<LayoutItem<D>>>,
}

impl<D: DomDriver + 'static> LayoutBase<D> {
    pub fn new(driver: Rc<D>) -> Self {
        Self {
            parent: RefCell::new(Weak::new()),
            message_loop: RefCell::new(None),
            driver,
            items: RefCell::new(Vec::new()),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn parent(&self) -> Option<WidgetRef<D>> {
        self.parent.borrow().upgrade()
    }

    pub fn message_loop(&self) -> Rc<MessageLoop> {
        self.message_loop
            .borrow()
            .clone()
            .expect("LayoutBase::init must run before the loop is used")
    }

    /// Reparent every widget currently in `items` under `parent`, and
    /// remember `parent`'s message loop. Concrete layouts call this from
    /// their own `init` before doing layout-specific setup (inserting
    /// handle nodes, building a tab bar, etc).
    pub fn init(&self, parent: &WidgetRef<D>) {
        *self.parent.borrow_mut() = Rc::downgrade(parent);
        *self.message_loop.borrow_mut() = Some(Widget::message_loop_handle(parent));
        for item in self.items.borrow().iter() {
            Widget::add_child(parent, item.widget.clone());
            self.insert_node(parent, &item.widget);
        }
    }

    /// Place `widget`'s own node under `parent`'s, the DOM half of
    /// adopting a child (`Widget::add_child` only updates the widget
    /// tree's own bookkeeping). Position/size follow in the next
    /// `resize`/layout pass; this just makes the node present.
    ///
    /// If `parent` is already attached (a widget joining a live dock tree
    /// at runtime, say), this goes through `Widget::attach_into` instead
    /// of a bare DOM insert, so `widget`'s own `Attached` flag and
    /// before/after-attach messages stay correct rather than silently
    /// drifting out of sync with the DOM.
    fn insert_node(&self, parent: &WidgetRef<D>, widget: &WidgetRef<D>) {
        let host = parent.borrow().node().clone();
        if parent.borrow().is_attached() {
            Widget::attach_into(widget, self.driver.as_ref(), &host);
        } else {
            let node = widget.borrow().node().clone();
            self.driver.insert_before(&host, &node, None);
        }
    }

    /// Append `widget` to `items`, reparenting it under the layout's own
    /// parent immediately if one is already known (the layout was
    /// `init`'d before this call) — the same reparenting `init` performs
    /// for items present at construction time, generalized to items
    /// added afterward. This is what lets `Widget::dispose`'s
    /// `child-removed` notification reach the layout for any item added
    /// at any point in the layout's life, not only its initial set.
    pub fn push(&self, widget: WidgetRef<D>) {
        if let Some(parent) = self.parent() {
            Widget::add_child(&parent, widget.clone());
            self.insert_node(&parent, &widget);
        }
        self.items.borrow_mut().push(LayoutItem::new(widget));
    }

    pub fn insert(&self, index: usize, widget: WidgetRef<D>) {
        if let Some(parent) = self.parent() {
            Widget::add_child(&parent, widget.clone());
            self.insert_node(&parent, &widget);
        }
        let index = index.min(self.items.borrow().len());
        self.items.borrow_mut().insert(index, LayoutItem::new(widget));
    }

    /// Remove the item wrapping `widget`, if present. Out-of-range /
    /// absent removals are ignored, per spec §7 ("Bounds/range ... never
    /// raised").
    pub fn remove(&self, widget: &WidgetRef<D>) -> Option<LayoutItem<D>> {
        let mut items = self.items.borrow_mut();
        let pos = items.iter().position(|it| Rc::ptr_eq(&it.widget, widget))?;
        Some(items.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn widgets(&self) -> Vec<WidgetRef<D>> {
        self.items.borrow().iter().map(|it| it.widget.clone()).collect()
    }

    /// Post `layout-request` to the parent, the standard reaction to a
    /// structural change a layout can't resolve by itself (spec §4.4's
    /// `fit()` contract, generalized to any layout-internal mutation).
    pub fn request_parent_layout(&self) {
        if let Some(parent) = self.parent() {
            Widget::post_layout_request(&parent);
        }
    }
}

/// Forward `msg` to a layout-specific closure, first performing the one
/// piece of behavior every concrete layout shares: a `fit-request` always
/// bubbles to a `layout-request` on the parent once the layout-specific
/// handler has had a chance to re-measure (spec §4.4's `fit()` contract,
/// generalized from widgets to layouts per §4.5).
pub fn dispatch_common<D: DomDriver + 'static>(
    base: &LayoutBase<D>,
    msg: &dyn Message,
    mut on_other: impl FnMut(&dyn Message),
) {
    on_other(msg);
    if msg.message_type() == "fit-request" {
        base.request_parent_layout();
    }
}

/// Convenience for concrete layouts that need to downcast a forwarded
/// `child-*` message to read which widget it names.
pub fn as_child_message<D: 'static>(msg: &dyn Message) -> Option<&ChildMessage<D>> {
    (msg as &dyn std::any::Any).downcast_ref::<ChildMessage<D>>()
}

/// Downcast any other concrete message type a layout needs to read the
/// payload of (`Resize`, in practice).
pub fn downcast_msg<T: Message>(msg: &dyn Message) -> Option<&T> {
    (msg as &dyn std::any::Any).downcast_ref::<T>()
}
