//! `DockPanel` (spec §4.6, §6): the public embedding surface over
//! `DockTree` — the one type an embedder actually constructs. Owns the
//! tree, a `FocusTracker` over every docked widget, the tab-drag state
//! machine, and an `Overlay` collaborator, and keeps its own widget's
//! single DOM child in sync with whichever widget the tree currently
//! considers its root.
//!
//! The tree itself has no DOM presence (spec §4.6's operations are pure
//! tree surgery); `DockPanel` is what actually renders that structure,
//! the same seam `panel_widgets::layout::Layout` draws between a layout's
//! bookkeeping and the widget whose children it arranges.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use panel_core::{ids::ObjectId, slot, MessageLoop, Signal};
use panel_vdom::{AttrValue, DomDriver};
use panel_widgets::focus_tracker::{FocusChanged, FocusTracker, FocusTrackerRef};
use panel_widgets::tab_bar::TabBar;
use panel_widgets::tab_panel::TabPanel;
use panel_widgets::widget::{Widget, WidgetRef};

use crate::drag::DragController;
use crate::error::{DockError, Result};
use crate::geometry::{panel_zone, root_zone, overlay_rect, Side, Zone};
use crate::overlay::Overlay;
use crate::tree::{AddMode, DockTree};

pub const CLASS_DOCK_PANEL: &str = "p-DockPanel";

/// `addWidget`'s options (spec §6: `{mode, ref, activate}`).
pub struct InsertOptions<D: DomDriver> {
    pub mode: AddMode,
    pub reference: Option<WidgetRef<D>>,
    pub activate: bool,
}

impl<D: DomDriver> Default for InsertOptions<D> {
    fn default() -> Self {
        Self {
            mode: AddMode::TabAfter,
            reference: None,
            activate: true,
        }
    }
}

/// `findDropTarget`'s result: the resolved zone plus, for a panel-level
/// zone (or a root-level one over a non-empty dock), the leaf tab panel
/// it was resolved against.
pub struct DropTarget<D: DomDriver> {
    pub zone: Zone,
    pub panel: Option<Rc<TabPanel<D>>>,
}

pub struct DockPanel<D: DomDriver> {
    widget: WidgetRef<D>,
    driver: Rc<D>,
    tree: Rc<DockTree<D>>,
    focus: FocusTrackerRef<D>,
    drag: RefCell<DragController<D>>,
    overlay: Box<dyn Overlay>,
}

impl<D: DomDriver + 'static> DockPanel<D> {
    /// `overlay` should already be attached wherever the embedder wants
    /// the drop-preview node to live (mirroring `DomOverlay::new`'s own
    /// contract); `DockPanel` only ever calls `show`/`hide` on it.
    pub fn new(driver: Rc<D>, message_loop: Rc<MessageLoop>, overlay: impl Overlay + 'static) -> Rc<Self> {
        let node = driver.create_element("div");
        driver.set_attribute(&node, "class", &AttrValue::Text(CLASS_DOCK_PANEL.to_string()));
        let widget = Widget::new(node, message_loop.clone());
        let tree = DockTree::new(driver.clone(), message_loop);
        let focus = FocusTracker::new();

        Rc::new_cyclic(|weak: &Weak<Self>| {
            let receiver_id = ObjectId::of(&widget);
            let receiver_alive = Widget::alive_token(&widget);
            let weak_self = weak.clone();
            tree.root_changed().connect(
                receiver_id,
                receiver_alive,
                slot(move |root: &Option<WidgetRef<D>>| {
                    if let Some(this) = weak_self.upgrade() {
                        this.sync_root(root.clone());
                    }
                }),
            );

            Self {
                widget,
                driver,
                tree,
                focus,
                drag: RefCell::new(DragController::new()),
                overlay: Box::new(overlay),
            }
        })
    }

    pub fn widget(&self) -> &WidgetRef<D> {
        &self.widget
    }

    pub fn tree(&self) -> &Rc<DockTree<D>> {
        &self.tree
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Fires whenever the most-recently-focused docked widget changes
    /// (spec §6's `currentChanged`). Activation (`activate_widget`, or
    /// `addWidget` with `activate: true`) counts as a focus the same way
    /// a real DOM focus event would.
    pub fn current_changed(&self) -> Rc<Signal<FocusChanged<D>>> {
        self.focus.borrow().current_changed().clone()
    }

    /// spec §4.6's `addWidget`: delegates the tree surgery to
    /// `DockTree::add_widget`, then registers `w` with the focus tracker
    /// and wires its eventual disposal to forget it from both.
    pub fn add_widget(&self, w: WidgetRef<D>, opts: InsertOptions<D>) -> Result<()> {
        self.tree.add_widget(w.clone(), opts.mode, opts.reference)?;
        self.focus.borrow_mut().add(w.clone());

        let tree = self.tree.clone();
        let focus = self.focus.clone();
        let w_hook = w.clone();
        Widget::on_disposed(&w, &w, move || {
            tree.on_widget_left(&w_hook);
            focus.borrow_mut().remove(&w_hook);
        });

        if opts.activate {
            self.activate_widget(&w)?;
        }
        Ok(())
    }

    /// spec §6's `activateWidget`: makes `w` its tab panel's current
    /// widget and promotes it to the front of the focus order.
    pub fn activate_widget(&self, w: &WidgetRef<D>) -> Result<()> {
        let panel = self.tree.owner_of(w).ok_or(DockError::UnknownReference)?;
        panel.activate_widget(w);
        self.focus.borrow_mut().focus_changed(w);
        Ok(())
    }

    /// spec §4.6's `findDropTarget`. Tests the dock panel's own edge
    /// bands first; a point that doesn't land in one (an empty dock's
    /// whole rect always resolves here, since there's no leaf panel to
    /// test instead) falls through to the specific leaf panel under the
    /// cursor and its own 3x3 third grid.
    pub fn find_drop_target(&self, x: f64, y: f64) -> DropTarget<D> {
        let own_rect = self.driver.bounding_rect(self.widget.borrow().node());

        if self.tree.is_empty() {
            return DropTarget {
                zone: root_zone(own_rect, x, y),
                panel: None,
            };
        }

        match root_zone(own_rect, x, y) {
            Zone::Root(Side::Center) => {}
            zone @ Zone::Root(_) => return DropTarget { zone, panel: None },
            Zone::Invalid => return DropTarget { zone: Zone::Invalid, panel: None },
            Zone::Panel(_) => unreachable!("root_zone never returns Zone::Panel"),
        }

        let Some(panel) = self.tree.leaf_at(self.driver.as_ref(), x, y) else {
            return DropTarget {
                zone: Zone::Invalid,
                panel: None,
            };
        };
        let panel_rect = self.driver.bounding_rect(panel.widget().borrow().node());
        DropTarget {
            zone: panel_zone(panel_rect, x, y),
            panel: Some(panel),
        }
    }

    /// spec §4.6's `showOverlay`: resolves the drop target at `(x, y)`
    /// and drives the overlay collaborator from it, returning the zone so
    /// the caller can decide whether the eventual drop is valid.
    pub fn show_overlay(&self, x: f64, y: f64) -> Zone {
        let target = self.find_drop_target(x, y);
        if !target.zone.is_valid() {
            self.overlay.hide();
            return target.zone;
        }

        let rect = match &target.panel {
            Some(panel) => self.driver.bounding_rect(panel.widget().borrow().node()),
            None => self.driver.bounding_rect(self.widget.borrow().node()),
        };
        self.overlay.show(overlay_rect(rect, target.zone), target.zone);
        target.zone
    }

    /// Start tracking a tab drag (spec §4.6's drag lifecycle, entered
    /// once a `TabBar` emits `tabDetachRequested`). Rejects a second
    /// concurrent drag (`DockError::DragAlreadyActive`).
    pub fn begin_tab_drag(&self, bar: Rc<TabBar<D>>, widget: WidgetRef<D>, origin_index: usize, x: f64, y: f64) -> Result<()> {
        self.drag.borrow_mut().pointer_down(bar, widget, origin_index, x, y)
    }

    /// Advance the in-progress drag to `(x, y)`, driving the overlay from
    /// whatever zone it now resolves to. A no-op if no drag is active.
    pub fn drag_to(&self, x: f64, y: f64) -> Zone {
        let zone = self
            .drag
            .borrow_mut()
            .pointer_move(x, y, |x, y| self.find_drop_target(x, y).zone);
        if zone.is_valid() {
            self.show_overlay(x, y);
        } else {
            self.overlay.hide();
        }
        zone
    }

    /// End the drag at `(x, y)`: hides the overlay and, if the final zone
    /// is valid, calls `addWidget` with the mode it implies. Tolerates a
    /// no-op drop — a tab dropped back into its own single-widget panel
    /// (spec §4.6) — by leaving the tree untouched. Errors if no drag was
    /// in progress.
    pub fn end_tab_drag(&self, x: f64, y: f64) -> Result<()> {
        let session = self.drag.borrow_mut().pointer_up()?;
        self.overlay.hide();

        if !session.zone().is_valid() {
            return Ok(());
        }
        let target = self.find_drop_target(x, y);
        let Some(mode) = mode_for_zone(target.zone) else {
            return Ok(());
        };

        let widget = session.widget().clone();
        if let Some(panel) = &target.panel {
            let own_panel = self
                .tree
                .owner_of(&widget)
                .is_some_and(|owner| Rc::ptr_eq(&owner, panel));
            let tab_mode = matches!(mode, AddMode::TabBefore | AddMode::TabAfter);
            if own_panel && tab_mode && panel.len() == 1 {
                return Ok(());
            }
        }

        let reference = target
            .panel
            .and_then(|panel| panel.widgets().into_iter().find(|w| !Rc::ptr_eq(w, &widget)));
        self.tree.add_widget(widget, mode, reference)?;
        Ok(())
    }

    /// Abort the in-progress drag, restoring tab positions (spec §5:
    /// "Escape-cancel"). A no-op if no drag is in progress.
    pub fn cancel_tab_drag(&self) {
        self.drag.borrow_mut().cancel();
        self.overlay.hide();
    }

    /// Keep this panel's own single DOM child in sync with whichever
    /// widget the tree now considers its root. The old root, if any, has
    /// already been unparented by whatever tree operation just ran (a
    /// split wrap, a collapse) in every case but one: a single-child
    /// split collapsing into the tree's new root leaves its own former
    /// parent split still attached here, so this unconditionally clears
    /// every existing child rather than trusting that it's already empty.
    fn sync_root(&self, root: Option<WidgetRef<D>>) {
        for child in self.widget.borrow().children().to_vec() {
            Widget::unparent(&child, self.driver.as_ref());
        }
        let Some(root) = root else { return };
        Widget::add_child(&self.widget, root.clone());
        if self.widget.borrow().is_attached() {
            let host = self.widget.borrow().node().clone();
            Widget::attach_into(&root, self.driver.as_ref(), &host);
        }
    }
}

/// Map a resolved zone to the `addWidget` mode it implies: a center zone
/// (root or panel) is a plain tab insertion, an edge zone is a split in
/// the matching direction.
fn mode_for_zone(zone: Zone) -> Option<AddMode> {
    match zone {
        Zone::Invalid => None,
        Zone::Root(Side::Center) | Zone::Panel(Side::Center) => Some(AddMode::TabAfter),
        Zone::Root(Side::Top) | Zone::Panel(Side::Top) => Some(AddMode::SplitTop),
        Zone::Root(Side::Left) | Zone::Panel(Side::Left) => Some(AddMode::SplitLeft),
        Zone::Root(Side::Right) | Zone::Panel(Side::Right) => Some(AddMode::SplitRight),
        Zone::Root(Side::Bottom) | Zone::Panel(Side::Bottom) => Some(AddMode::SplitBottom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_core::ImmediateScheduler;
    use panel_vdom::Rect;
    use panel_widgets::testing::FakeDriver;

    struct RecordingOverlay {
        shown: RefCell<Option<(Rect, Zone)>>,
    }

    impl RecordingOverlay {
        fn new() -> Self {
            Self { shown: RefCell::new(None) }
        }
    }

    impl Overlay for RecordingOverlay {
        fn show(&self, rect: Rect, zone: Zone) {
            *self.shown.borrow_mut() = Some((rect, zone));
        }

        fn hide(&self) {
            *self.shown.borrow_mut() = None;
        }
    }

    fn setup() -> (Rc<FakeDriver>, Rc<MessageLoop>) {
        let drv = Rc::new(FakeDriver::default());
        let ml = MessageLoop::new(Box::new(ImmediateScheduler));
        (drv, ml)
    }

    fn leaf(drv: &Rc<FakeDriver>, ml: &Rc<MessageLoop>, label: &str) -> WidgetRef<FakeDriver> {
        let w = Widget::new(drv.create_element("div"), ml.clone());
        w.borrow_mut().title_mut().set_label(label);
        w
    }

    #[test]
    fn adding_the_first_widget_attaches_it_as_the_dock_panels_only_child() {
        let (drv, ml) = setup();
        let dock = DockPanel::new(drv.clone(), ml.clone(), RecordingOverlay::new());
        let a = leaf(&drv, &ml, "A");

        dock.add_widget(a.clone(), InsertOptions::default()).unwrap();

        assert_eq!(dock.widget().borrow().children().len(), 1);
        assert!(!dock.is_empty());
    }

    #[test]
    fn splitting_beside_the_first_widget_wraps_it_in_a_split_under_the_dock_panel() {
        let (drv, ml) = setup();
        let dock = DockPanel::new(drv.clone(), ml.clone(), RecordingOverlay::new());
        let a = leaf(&drv, &ml, "A");
        let b = leaf(&drv, &ml, "B");
        dock.add_widget(a.clone(), InsertOptions::default()).unwrap();

        dock.add_widget(
            b.clone(),
            InsertOptions { mode: AddMode::SplitRight, reference: Some(a.clone()), activate: true },
        )
        .unwrap();

        // The dock panel's one child is now the split wrapper, not `a`
        // directly; `a` and `b` both still live in the tree.
        assert_eq!(dock.widget().borrow().children().len(), 1);
        assert!(!Rc::ptr_eq(&dock.widget().borrow().children()[0], &a));
        assert!(dock.tree().contains(&a));
        assert!(dock.tree().contains(&b));
    }

    #[test]
    fn removing_the_only_other_widget_collapses_the_split_back_to_a_single_root_child() {
        let (drv, ml) = setup();
        let dock = DockPanel::new(drv.clone(), ml.clone(), RecordingOverlay::new());
        let a = leaf(&drv, &ml, "A");
        let b = leaf(&drv, &ml, "B");
        dock.add_widget(a.clone(), InsertOptions::default()).unwrap();
        dock.add_widget(
            b.clone(),
            InsertOptions { mode: AddMode::SplitRight, reference: Some(a.clone()), activate: false },
        )
        .unwrap();

        Widget::dispose(&b, &*drv);

        assert_eq!(dock.widget().borrow().children().len(), 1);
        assert!(Rc::ptr_eq(&dock.widget().borrow().children()[0], &a));
        assert!(!dock.tree().contains(&b));
    }

    #[test]
    fn find_drop_target_on_an_empty_dock_is_always_root() {
        let (drv, ml) = setup();
        let dock = DockPanel::new(drv.clone(), ml.clone(), RecordingOverlay::new());
        drv.set_rect(dock.widget().borrow().node(), Rect::new(0.0, 0.0, 400.0, 300.0));

        let target = dock.find_drop_target(200.0, 150.0);
        assert_eq!(target.zone, Zone::Root(Side::Center));
        assert!(target.panel.is_none());
    }

    #[test]
    fn find_drop_target_over_a_leaf_panel_resolves_a_panel_zone() {
        let (drv, ml) = setup();
        let dock = DockPanel::new(drv.clone(), ml.clone(), RecordingOverlay::new());
        let a = leaf(&drv, &ml, "A");
        dock.add_widget(a.clone(), InsertOptions::default()).unwrap();

        let panel = dock.tree().owner_of(&a).unwrap();
        drv.set_rect(dock.widget().borrow().node(), Rect::new(0.0, 0.0, 400.0, 300.0));
        drv.set_rect(panel.widget().borrow().node(), Rect::new(0.0, 0.0, 400.0, 300.0));

        let target = dock.find_drop_target(380.0, 150.0);
        assert_eq!(target.zone, Zone::Panel(Side::Right));
        assert!(target.panel.is_some());
    }

    #[test]
    fn dragging_a_tab_past_threshold_drives_the_overlay() {
        let (drv, ml) = setup();
        let dock = DockPanel::new(drv.clone(), ml.clone(), RecordingOverlay::new());
        let a = leaf(&drv, &ml, "A");
        dock.add_widget(a.clone(), InsertOptions::default()).unwrap();
        drv.set_rect(dock.widget().borrow().node(), Rect::new(0.0, 0.0, 400.0, 300.0));

        let bar = dock.tree().owner_of(&a).unwrap().bar().clone();
        dock.begin_tab_drag(bar, a.clone(), 0, 10.0, 10.0).unwrap();
        let zone = dock.drag_to(200.0, 150.0);

        assert!(zone.is_valid());
    }

    #[test]
    fn second_concurrent_drag_is_rejected() {
        let (drv, ml) = setup();
        let dock = DockPanel::new(drv.clone(), ml.clone(), RecordingOverlay::new());
        let a = leaf(&drv, &ml, "A");
        dock.add_widget(a.clone(), InsertOptions::default()).unwrap();
        let bar = dock.tree().owner_of(&a).unwrap().bar().clone();

        dock.begin_tab_drag(bar.clone(), a.clone(), 0, 0.0, 0.0).unwrap();
        let err = dock.begin_tab_drag(bar, a, 0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, DockError::DragAlreadyActive));
    }

    #[test]
    fn ending_a_drag_with_no_active_session_is_an_error() {
        let (drv, ml) = setup();
        let dock = DockPanel::new(drv.clone(), ml.clone(), RecordingOverlay::new());
        assert!(matches!(dock.end_tab_drag(0.0, 0.0).unwrap_err(), DockError::EmptyDrag));
    }

    #[test]
    fn activating_a_widget_promotes_it_in_the_focus_order() {
        let (drv, ml) = setup();
        let dock = DockPanel::new(drv.clone(), ml.clone(), RecordingOverlay::new());
        let a = leaf(&drv, &ml, "A");
        let b = leaf(&drv, &ml, "B");
        dock.add_widget(a.clone(), InsertOptions { activate: true, ..InsertOptions::default() }).unwrap();
        dock.add_widget(
            b.clone(),
            InsertOptions { mode: AddMode::TabAfter, reference: Some(a.clone()), activate: true },
        )
        .unwrap();

        dock.activate_widget(&a).unwrap();

        assert!(Rc::ptr_eq(&dock.focus.borrow().current().unwrap(), &a));
    }
}
