//! The widget lifecycle state machine.
//!
//! `Widget<D>` is generic over a `panel_vdom::DomDriver` — `D` is the DOM
//! backend (real `WebSysDriver` in the browser, the in-memory fake under
//! test) — one generic parameter threaded through every type in the
//! crate so the whole tree stays backend-agnostic.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use panel_core::{ids::ObjectId, signal, slot, Handler, HandlerRef, Message, MessageLoop, Signal};
use panel_vdom::DomDriver;

use crate::flags::WidgetFlags;
use crate::layout::Layout;
use crate::messages::{
    AfterAttach, AfterDetach, AfterHide, AfterShow, BeforeAttach, BeforeDetach, BeforeHide,
    BeforeShow, ChildMessage, FitRequest, LayoutRequest, Resize, UpdateRequest,
};
use crate::title::Title;

pub type WidgetRef<D> = Rc<RefCell<Widget<D>>>;

/// A contract violation raised by mis-use of the lifecycle API (spec §7:
/// "Contract violation ... raised as failures, halting the operation").
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("widget is already parented; detach it before attaching elsewhere")]
    AlreadyParented,
    #[error("widget is disposed and can no longer be used")]
    Disposed,
    #[error("layout has already been assigned to this widget")]
    LayoutAlreadySet,
}

pub type Result<T> = std::result::Result<T, WidgetError>;

pub struct Widget<D: DomDriver> {
    node: D::Node,
    flags: WidgetFlags,
    parent: Weak<RefCell<Widget<D>>>,
    children: Vec<WidgetRef<D>>,
    layout: Option<Rc<dyn Layout<D>>>,
    title: Title,
    message_loop: Rc<MessageLoop>,
    /// Fires once, during `dispose()`. `T = ()`: the event itself is the
    /// payload, matching the JS original's argument-less `disposed`.
    disposed: Rc<Signal<()>>,
    self_ref: Weak<RefCell<Widget<D>>>,
    /// Liveness marker other widgets can hold a [`Weak`] handle to when
    /// connecting to this widget's signals, so a binding whose receiver
    /// has been dropped is skipped by `emit` even before an explicit
    /// `disconnect` runs (see [`Signal::connect`]'s `receiver_alive`).
    alive: Rc<()>,
}

impl<D: DomDriver + 'static> Widget<D> {
    pub fn new(node: D::Node, message_loop: Rc<MessageLoop>) -> WidgetRef<D> {
        Rc::new_cyclic(|weak| {
            RefCell::new(Widget {
                node,
                flags: WidgetFlags::empty(),
                parent: Weak::new(),
                children: Vec::new(),
                layout: None,
                title: Title::default(),
                disposed: Signal::new(ObjectId::from_raw(Weak::as_ptr(weak) as *const () as usize)),
                message_loop,
                self_ref: weak.clone(),
                alive: Rc::new(()),
            })
        })
    }

    /// A [`Weak`] handle tied to this widget's own lifetime, for callers
    /// connecting to one of this widget's signals as a receiver (see
    /// [`Signal::connect`]).
    pub fn alive_token(this: &WidgetRef<D>) -> Weak<()> {
        Rc::downgrade(&this.borrow().alive)
    }

    pub fn node(&self) -> &D::Node {
        &self.node
    }

    pub fn parent(&self) -> Option<WidgetRef<D>> {
        self.parent.upgrade()
    }

    pub fn children(&self) -> &[WidgetRef<D>] {
        &self.children
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn title_mut(&mut self) -> &mut Title {
        &mut self.title
    }

    pub fn is_attached(&self) -> bool {
        self.flags.contains(WidgetFlags::ATTACHED)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(WidgetFlags::HIDDEN)
    }

    pub fn is_disposed(&self) -> bool {
        self.flags.contains(WidgetFlags::DISPOSED)
    }

    /// Visible iff attached and no hidden ancestor (including self).
    /// Always computed, never cached, so it can never drift from the
    /// flags it's derived from.
    pub fn is_visible(this: &WidgetRef<D>) -> bool {
        if !this.borrow().is_attached() || this.borrow().is_hidden() {
            return false;
        }
        let mut cursor = this.borrow().parent();
        while let Some(ancestor) = cursor {
            if ancestor.borrow().is_hidden() {
                return false;
            }
            cursor = ancestor.borrow().parent();
        }
        true
    }

    pub fn set_layout(this: &WidgetRef<D>, layout: Rc<dyn Layout<D>>) -> Result<()> {
        if this.borrow().layout.is_some() {
            return Err(WidgetError::LayoutAlreadySet);
        }
        layout.init(this);
        this.borrow_mut().layout = Some(layout);
        Ok(())
    }

    pub fn layout(&self) -> Option<&Rc<dyn Layout<D>>> {
        self.layout.as_ref()
    }

    fn handler(this: &WidgetRef<D>) -> HandlerRef {
        this.clone() as HandlerRef
    }

    fn message_loop(this: &WidgetRef<D>) -> Rc<MessageLoop> {
        this.borrow().message_loop.clone()
    }

    /// The message loop this widget dispatches through. Layouts need
    /// this once, at `init`, to post/send without the parent threading
    /// it through every call (see [`crate::layout::LayoutBase::init`]).
    pub fn message_loop_handle(this: &WidgetRef<D>) -> Rc<MessageLoop> {
        Self::message_loop(this)
    }

    /// Insert `this` under `host`, sending `before-attach`/`after-attach`
    /// depth-first to `this` and every descendant (spec §4.4).
    pub fn attach(this: &WidgetRef<D>, driver: &D, host: &D::Node) -> Result<()> {
        if this.borrow().is_disposed() {
            return Err(WidgetError::Disposed);
        }
        if this.borrow().parent().is_some() {
            return Err(WidgetError::AlreadyParented);
        }

        Self::send_depth_first(this, &BeforeAttach);
        driver.insert_before(host, &this.borrow().node.clone(), None);
        Self::set_attached_flag_recursive(this);
        Self::send_depth_first(this, &AfterAttach);
        Ok(())
    }

    /// The layout-driven counterpart to `attach()`: a widget joining an
    /// already-attached parent after construction (a dock-tree split
    /// merge, a tab panel's `insert_widget` at runtime) rather than a root
    /// subtree's one-time mount. Same ordering as `attach()` (before-attach,
    /// DOM insertion, the `Attached` flag, after-attach) but without
    /// `attach()`'s parent-check (the caller has already run `add_child`).
    /// A no-op if `this` is disposed or already attached.
    pub fn attach_into(this: &WidgetRef<D>, driver: &D, host: &D::Node) {
        if this.borrow().is_disposed() || this.borrow().is_attached() {
            return;
        }
        Self::send_depth_first(this, &BeforeAttach);
        driver.insert_before(host, &this.borrow().node.clone(), None);
        Self::set_attached_flag_recursive(this);
        Self::send_depth_first(this, &AfterAttach);
    }

    fn set_attached_flag_recursive(this: &WidgetRef<D>) {
        this.borrow_mut().flags.insert(WidgetFlags::ATTACHED);
        for child in this.borrow().children.clone() {
            Self::set_attached_flag_recursive(&child);
        }
    }

    /// Remove `this` from the DOM, sending `before-detach`/`after-detach`
    /// to every descendant in reverse depth-first order, and fully
    /// unparent it (cleared from the former parent's `children` and its
    /// own `parent` pointer, the same bookkeeping `dispose` performs) so
    /// `this` is immediately eligible to be attached somewhere else.
    pub fn detach(this: &WidgetRef<D>, driver: &D, host: &D::Node) {
        Self::send_reverse_depth_first(this, &BeforeDetach);
        driver.remove_child(host, &this.borrow().node.clone());
        Self::clear_attached_flag_recursive(this);
        Self::send_reverse_depth_first(this, &AfterDetach);

        if let Some(parent) = this.borrow().parent() {
            parent.borrow_mut().children.retain(|c| !Rc::ptr_eq(c, this));
            Self::post_to(&parent, ChildMessage::Removed(this.clone()));
        }
        this.borrow_mut().parent = Weak::new();
    }

    /// Remove `this` from its current parent without disposing it:
    /// detaches from the DOM if attached, clears the widget-tree
    /// bookkeeping on both sides, and notifies the former parent's layout
    /// via `child-removed` — exactly what a layout reacts to when a
    /// widget is disposed, reused here so a still-alive widget becomes
    /// parentless and can be handed to `add_child`/a layout's
    /// `add_widget` elsewhere. A no-op if `this` has no parent.
    ///
    /// This is step 1 of the dock engine's `addWidget` (spec §4.6:
    /// "unparents w").
    pub fn unparent(this: &WidgetRef<D>, driver: &D) {
        let Some(parent) = this.borrow().parent() else {
            return;
        };
        if this.borrow().is_attached() {
            let host = parent.borrow().node().clone();
            Self::detach(this, driver, &host);
        } else {
            parent.borrow_mut().children.retain(|c| !Rc::ptr_eq(c, this));
            this.borrow_mut().parent = Weak::new();
            Self::post_to(&parent, ChildMessage::Removed(this.clone()));
        }
    }

    fn clear_attached_flag_recursive(this: &WidgetRef<D>) {
        this.borrow_mut().flags.remove(WidgetFlags::ATTACHED);
        for child in this.borrow().children.clone() {
            Self::clear_attached_flag_recursive(&child);
        }
    }

    fn send_depth_first(this: &WidgetRef<D>, msg: &dyn Message) {
        let ml = Self::message_loop(this);
        ml.send(&Self::handler(this), msg);
        for child in this.borrow().children.clone() {
            Self::send_depth_first(&child, msg);
        }
    }

    fn send_reverse_depth_first(this: &WidgetRef<D>, msg: &dyn Message) {
        for child in this.borrow().children.clone().into_iter().rev() {
            Self::send_reverse_depth_first(&child, msg);
        }
        let ml = Self::message_loop(this);
        ml.send(&Self::handler(this), msg);
    }

    /// Toggle `IsHidden` on `this` specifically; descendants whose
    /// *effective* visibility flips as a result receive
    /// before/after-show/hide in document order (spec §4.4).
    pub fn show(this: &WidgetRef<D>) {
        Self::set_hidden(this, false);
    }

    pub fn hide(this: &WidgetRef<D>) {
        Self::set_hidden(this, true);
    }

    fn set_hidden(this: &WidgetRef<D>, hidden: bool) {
        if this.borrow().is_hidden() == hidden {
            return;
        }

        let was_parent_visible = this
            .borrow()
            .parent()
            .map(|p| Widget::is_visible(&p))
            .unwrap_or(true);

        if hidden {
            this.borrow_mut().flags.insert(WidgetFlags::HIDDEN);
        } else {
            this.borrow_mut().flags.remove(WidgetFlags::HIDDEN);
        }

        if was_parent_visible {
            Self::propagate_visibility_change(this, !hidden);
        }

        if let Some(parent) = this.borrow().parent() {
            let msg = if hidden {
                ChildMessage::Hidden(this.clone())
            } else {
                ChildMessage::Shown(this.clone())
            };
            Self::post_to(&parent, msg);
        }
    }

    fn propagate_visibility_change(this: &WidgetRef<D>, becoming_visible: bool) {
        if becoming_visible {
            Self::send_depth_first_unless_hidden(this, &BeforeShow, &AfterShow);
        } else {
            Self::send_depth_first_unless_self_already_hidden(this, &BeforeHide, &AfterHide);
        }
    }

    fn send_depth_first_unless_hidden(this: &WidgetRef<D>, before: &dyn Message, after: &dyn Message) {
        if this.borrow().is_hidden() {
            return;
        }
        let ml = Self::message_loop(this);
        ml.send(&Self::handler(this), before);
        for child in this.borrow().children.clone() {
            Self::send_depth_first_unless_hidden(&child, before, after);
        }
        ml.send(&Self::handler(this), after);
    }

    fn send_depth_first_unless_self_already_hidden(
        this: &WidgetRef<D>,
        before: &dyn Message,
        after: &dyn Message,
    ) {
        // The widget being explicitly hidden is always included even
        // though it just became hidden; its descendants that were
        // already individually hidden are skipped (they never had an
        // effective-visibility transition).
        let ml = Self::message_loop(this);
        ml.send(&Self::handler(this), before);
        for child in this.borrow().children.clone() {
            if child.borrow().is_hidden() {
                continue;
            }
            Self::send_depth_first_unless_self_already_hidden(&child, before, after);
        }
        ml.send(&Self::handler(this), after);
    }

    /// Resize the root of an attached subtree; delegates to the layout
    /// if one is assigned.
    pub fn resize(this: &WidgetRef<D>, width: i32, height: i32) {
        let ml = Self::message_loop(this);
        ml.send(&Self::handler(this), &Resize { width, height });
    }

    /// Posts `update-request` (conflatable).
    pub fn update(this: &WidgetRef<D>) {
        Self::post_to(this, UpdateRequest);
    }

    /// Posts `fit-request`; if the parent is layout-managed, the
    /// layout's `on_fit_request` handler posts `layout-request` onward.
    pub fn fit(this: &WidgetRef<D>) {
        Self::post_to(this, FitRequest);
    }

    pub(crate) fn post_layout_request(this: &WidgetRef<D>) {
        Self::post_to(this, LayoutRequest);
    }

    fn post_to(this: &WidgetRef<D>, msg: impl Message + 'static) {
        let ml = Self::message_loop(this);
        ml.post(&Self::handler(this), Box::new(msg));
    }

    /// Adopt `child`, appending it to `children` and emitting
    /// `child-added` to `this`.
    pub fn add_child(this: &WidgetRef<D>, child: WidgetRef<D>) {
        child.borrow_mut().parent = Rc::downgrade(this);
        this.borrow_mut().children.push(child.clone());
        Self::post_to(this, ChildMessage::Added(child));
    }

    /// `dispose()` is idempotent; re-entry through signals is guarded by
    /// checking `IsDisposed` first (spec §4.4).
    pub fn dispose(this: &WidgetRef<D>, driver: &D) {
        if this.borrow().is_disposed() {
            return;
        }
        this.borrow_mut().flags.insert(WidgetFlags::DISPOSED);

        if let Some(parent) = this.borrow().parent() {
            parent.borrow_mut().children.retain(|c| !Rc::ptr_eq(c, this));
            Self::post_to(&parent, ChildMessage::Removed(this.clone()));
        }

        if this.borrow().is_attached() {
            if let Some(parent) = this.borrow().parent() {
                driver.remove_child(&parent.borrow().node, &this.borrow().node.clone());
            }
            this.borrow_mut().flags.remove(WidgetFlags::ATTACHED);
        }

        this.borrow().disposed.emit(&());

        let object_id = ObjectId::of(this);
        signal::clear_data(object_id);
        Self::message_loop(this).clear_message_data(&Self::handler(this));
    }

    /// Connect to the `disposed` signal, keyed on `receiver`'s own
    /// identity and lifetime: the binding auto-skips once `receiver` is
    /// dropped, on top of the explicit `signal::clear_data` every
    /// widget's own `dispose()` already performs. See [`Signal::connect`]
    /// for the idempotence contract.
    pub fn on_disposed(this: &WidgetRef<D>, receiver: &WidgetRef<D>, mut f: impl FnMut() + 'static) {
        let receiver_id = ObjectId::of(receiver);
        let receiver_alive = Self::alive_token(receiver);
        this.borrow()
            .disposed
            .connect(receiver_id, receiver_alive, slot(move |_: &()| f()));
    }
}

impl<D: DomDriver + 'static> Handler for Widget<D> {
    fn process_message(&mut self, msg: &dyn Message) {
        if let Some(layout) = self.layout.clone() {
            layout.handle_parent_message(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;
    use panel_core::{Hook, ImmediateScheduler, MessageLoop};

    fn new_loop() -> Rc<MessageLoop> {
        MessageLoop::new(Box::new(ImmediateScheduler))
    }

    fn new_widget(driver: &FakeDriver) -> WidgetRef<FakeDriver> {
        Widget::new(driver.create_element("div"), new_loop())
    }

    /// Records `(message type, was the widget attached when the hook
    /// ran)` for a single widget, independent of whatever `handler` the
    /// loop hands the hook (the widget handle is captured directly).
    struct RecordingHook {
        log: Rc<RefCell<Vec<(&'static str, bool)>>>,
        widget: WidgetRef<FakeDriver>,
    }

    impl Hook for RecordingHook {
        fn run(&self, _handler: &HandlerRef, msg: &dyn Message) -> bool {
            self.log
                .borrow_mut()
                .push((msg.message_type(), self.widget.borrow().is_attached()));
            true
        }
    }

    fn record(widget: &WidgetRef<FakeDriver>) -> Rc<RefCell<Vec<(&'static str, bool)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let hook = Rc::new(RecordingHook {
            log: log.clone(),
            widget: widget.clone(),
        });
        Widget::message_loop_handle(widget).install_hook(&Widget::handler(widget), hook);
        log
    }

    /// Tags every message a widget receives with a fixed label, all
    /// writing into one shared order log — for tests that only care
    /// about the relative order messages reach several widgets in.
    struct OrderHook {
        order: Rc<RefCell<Vec<String>>>,
        tag: &'static str,
    }

    impl Hook for OrderHook {
        fn run(&self, _handler: &HandlerRef, msg: &dyn Message) -> bool {
            self.order.borrow_mut().push(format!("{}:{}", self.tag, msg.message_type()));
            true
        }
    }

    fn tag(widget: &WidgetRef<FakeDriver>, order: &Rc<RefCell<Vec<String>>>, tag: &'static str) {
        Widget::message_loop_handle(widget)
            .install_hook(&Widget::handler(widget), Rc::new(OrderHook { order: order.clone(), tag }));
    }

    #[test]
    fn wid_p2_before_attach_precedes_insertion_after_attach_follows_it() {
        let driver = FakeDriver::default();
        let host = driver.create_element("div");
        let widget = new_widget(&driver);
        let log = record(&widget);

        Widget::attach(&widget, &driver, &host).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![("before-attach", false), ("after-attach", true)],
            "before-attach must observe the widget not yet attached, after-attach must observe it attached"
        );
    }

    #[test]
    fn attach_rejects_an_already_parented_or_disposed_widget() {
        let driver = FakeDriver::default();
        let host = driver.create_element("div");
        let parent = new_widget(&driver);
        let child = new_widget(&driver);
        Widget::add_child(&parent, child.clone());

        assert!(matches!(
            Widget::attach(&child, &driver, &host),
            Err(WidgetError::AlreadyParented)
        ));

        let orphan = new_widget(&driver);
        Widget::dispose(&orphan, &driver);
        assert!(matches!(Widget::attach(&orphan, &driver, &host), Err(WidgetError::Disposed)));
    }

    #[test]
    fn attach_and_detach_visit_descendants_depth_first_and_reverse() {
        let driver = FakeDriver::default();
        let host = driver.create_element("div");
        let parent = new_widget(&driver);
        let child = new_widget(&driver);
        Widget::add_child(&parent, child.clone());

        let order: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        tag(&parent, &order, "parent");
        tag(&child, &order, "child");

        Widget::attach(&parent, &driver, &host).unwrap();
        assert_eq!(
            *order.borrow(),
            vec!["parent:before-attach", "child:before-attach", "parent:after-attach", "child:after-attach"],
            "attach visits self-then-children, depth-first, for both the before and after pass"
        );

        order.borrow_mut().clear();
        Widget::detach(&parent, &driver, &host);
        assert_eq!(
            *order.borrow(),
            vec!["child:before-detach", "parent:before-detach", "child:after-detach", "parent:after-detach"],
            "detach visits children-then-self, the structural reverse of attach, for both passes"
        );
    }

    #[test]
    fn wid_p1_hidden_ancestor_makes_descendant_invisible() {
        let driver = FakeDriver::default();
        let host = driver.create_element("div");
        let parent = new_widget(&driver);
        let child = new_widget(&driver);
        Widget::add_child(&parent, child.clone());
        Widget::attach(&parent, &driver, &host).unwrap();

        assert!(Widget::is_visible(&child), "attached, no hidden ancestor");

        Widget::hide(&parent);
        assert!(!Widget::is_visible(&child), "a hidden ancestor must make the descendant invisible");
        assert!(!child.borrow().is_hidden(), "hiding the parent must not flip the child's own flag");

        Widget::show(&parent);
        assert!(Widget::is_visible(&child), "showing the ancestor restores derived visibility");
    }

    #[test]
    fn show_hide_deliver_nested_before_after_pairs_to_every_descendant() {
        let driver = FakeDriver::default();
        let host = driver.create_element("div");
        let parent = new_widget(&driver);
        let child = new_widget(&driver);
        Widget::add_child(&parent, child.clone());
        Widget::attach(&parent, &driver, &host).unwrap();

        let order: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        tag(&parent, &order, "parent");
        tag(&child, &order, "child");

        Widget::hide(&parent);
        assert_eq!(
            *order.borrow(),
            vec!["parent:before-hide", "child:before-hide", "child:after-hide", "parent:after-hide"],
            "hide nests: self's before-hide wraps every descendant's full before/after pair, then self's after-hide"
        );
        assert!(!child.borrow().is_hidden(), "only the widget hide() was called on gets its own flag flipped");

        order.borrow_mut().clear();
        Widget::show(&parent);
        assert_eq!(
            *order.borrow(),
            vec!["parent:before-show", "child:before-show", "child:after-show", "parent:after-show"]
        );
    }

    #[test]
    fn scenario_2_signal_emit_during_dispose_completes_for_both_widgets() {
        let driver = Rc::new(FakeDriver::default());
        let a = new_widget(&driver);
        let b = new_widget(&driver);

        let a_for_closure = a.clone();
        let driver_for_closure = driver.clone();
        Widget::on_disposed(&b, &a, move || {
            Widget::dispose(&a_for_closure, driver_for_closure.as_ref());
        });

        Widget::dispose(&b, driver.as_ref());

        assert!(a.borrow().is_disposed());
        assert!(b.borrow().is_disposed());
    }

    #[test]
    fn dispose_is_idempotent() {
        let driver = FakeDriver::default();
        let widget = new_widget(&driver);
        Widget::dispose(&widget, &driver);
        Widget::dispose(&widget, &driver);
        assert!(widget.borrow().is_disposed());
    }
}
