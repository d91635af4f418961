//! `TabBar` (spec §4.6, §6): a titles-only row rendered through
//! `panel_vdom::Reconciler`, keyed per tab by its widget's `ObjectId` so a
//! reorder diffs in place instead of tearing every tab node down.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use panel_core::{ids::ObjectId, signal, slot, Signal};
use panel_vdom::{handler, AttrValue, DomEvent, Mount, Reconciler, VNode};

use crate::widget::WidgetRef;
use panel_vdom::DomDriver;

pub const CLASS_BAR: &str = "p-TabBar";
pub const CLASS_CONTENT: &str = "p-TabBar-content";
pub const CLASS_TAB: &str = "p-TabBar-tab";
pub const CLASS_LABEL: &str = "p-TabBar-tabLabel";
pub const CLASS_ICON: &str = "p-TabBar-tabIcon";
pub const CLASS_CLOSE_ICON: &str = "p-TabBar-tabCloseIcon";
pub const CLASS_CURRENT: &str = "p-mod-current";
pub const CLASS_CLOSABLE: &str = "p-mod-closable";
pub const CLASS_DRAGGING: &str = "p-mod-dragging";

/// `tabMoved` payload: the tab named by `widget` moved from `from` to `to`
/// within the bar (spec §4.6's drag lifecycle, the in-bar reorder half of
/// it — cross-panel drops are `tabDetachRequested`'s job).
#[derive(Clone)]
pub struct TabMoved<D: DomDriver> {
    pub widget: WidgetRef<D>,
    pub from: usize,
    pub to: usize,
}

pub struct TabBar<D: DomDriver> {
    driver: Rc<D>,
    mount: RefCell<Mount<D::Node>>,
    reconciler: Reconciler<Rc<D>>,
    tabs: RefCell<Vec<WidgetRef<D>>>,
    current: RefCell<Option<usize>>,
    dragging: RefCell<Option<usize>>,
    current_changed: Rc<Signal<Option<WidgetRef<D>>>>,
    tab_moved: Rc<Signal<TabMoved<D>>>,
    tab_close_requested: Rc<Signal<WidgetRef<D>>>,
    tab_detach_requested: Rc<Signal<WidgetRef<D>>>,
    self_id: ObjectId,
}

impl<D: DomDriver + 'static> TabBar<D> {
    pub fn new(driver: Rc<D>) -> Rc<Self> {
        let host = driver.create_element("div");
        driver.set_attribute(&host, "class", &AttrValue::Text(CLASS_CONTENT.to_string()));
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let self_id = ObjectId::from_raw(weak.as_ptr() as *const () as usize);
            Self {
                reconciler: Reconciler::new(driver.clone()),
                driver,
                mount: RefCell::new(Mount::new(host)),
                tabs: RefCell::new(Vec::new()),
                current: RefCell::new(None),
                dragging: RefCell::new(None),
                current_changed: Signal::new(self_id),
                tab_moved: Signal::new(self_id),
                tab_close_requested: Signal::new(self_id),
                tab_detach_requested: Signal::new(self_id),
                self_id,
            }
        })
    }

    /// The bar's own content node (the `p-TabBar-content` row); callers
    /// attach it under a `p-TabBar` wrapper node of their own, so the
    /// wrapper owns the outer chrome while the bar itself only owns its
    /// content slot.
    pub fn node(&self) -> &D::Node {
        self.mount.borrow().host()
    }

    pub fn insert_tab(self: &Rc<Self>, index: usize, widget: WidgetRef<D>) {
        let index = index.min(self.tabs.borrow().len());
        self.tabs.borrow_mut().insert(index, widget);
        if self.current.borrow().is_none() {
            *self.current.borrow_mut() = Some(index);
        } else {
            let mut current = self.current.borrow_mut();
            if let Some(c) = *current {
                if c >= index {
                    *current = Some(c + 1);
                }
            }
        }
        self.render();
    }

    pub fn add_tab(self: &Rc<Self>, widget: WidgetRef<D>) {
        let index = self.tabs.borrow().len();
        self.insert_tab(index, widget);
    }

    pub fn remove_tab(self: &Rc<Self>, widget: &WidgetRef<D>) -> bool {
        let pos = self.tabs.borrow().iter().position(|w| Rc::ptr_eq(w, widget));
        let Some(pos) = pos else {
            return false;
        };
        self.tabs.borrow_mut().remove(pos);
        let len = self.tabs.borrow().len();
        let mut current = self.current.borrow_mut();
        *current = match *current {
            _ if len == 0 => None,
            Some(c) if c > pos => Some(c - 1),
            Some(c) if c == pos => Some(pos.min(len.saturating_sub(1))),
            other => other,
        };
        let emitted = current.and_then(|i| self.tabs.borrow().get(i).cloned());
        drop(current);
        self.current_changed.emit(&emitted);
        self.render();
        true
    }

    pub fn current_index(&self) -> Option<usize> {
        *self.current.borrow()
    }

    pub fn set_current_index(self: &Rc<Self>, index: Option<usize>) {
        let index = index.filter(|&i| i < self.tabs.borrow().len());
        if *self.current.borrow() == index {
            return;
        }
        *self.current.borrow_mut() = index;
        let widget = index.and_then(|i| self.tabs.borrow().get(i).cloned());
        self.current_changed.emit(&widget);
        self.render();
    }

    pub fn current_changed(&self) -> &Rc<Signal<Option<WidgetRef<D>>>> {
        &self.current_changed
    }

    pub fn tab_moved(&self) -> &Rc<Signal<TabMoved<D>>> {
        &self.tab_moved
    }

    pub fn tab_close_requested(&self) -> &Rc<Signal<WidgetRef<D>>> {
        &self.tab_close_requested
    }

    pub fn tab_detach_requested(&self) -> &Rc<Signal<WidgetRef<D>>> {
        &self.tab_detach_requested
    }

    /// Reorder the tab at `from` to sit at `to` (already-resolved indices,
    /// as a pointer drag within the bar produces), emitting `tabMoved`.
    /// Used by the dock engine's in-bar drag handling; cross-panel moves
    /// go through `tabDetachRequested` instead.
    pub fn move_tab(self: &Rc<Self>, from: usize, to: usize) {
        let len = self.tabs.borrow().len();
        if from >= len || to >= len || from == to {
            return;
        }
        let widget = self.tabs.borrow_mut().remove(from);
        self.tabs.borrow_mut().insert(to, widget.clone());

        let mut current = self.current.borrow_mut();
        if let Some(c) = *current {
            *current = Some(reindex(c, from, to));
        }
        drop(current);

        self.tab_moved.emit(&TabMoved { widget, from, to });
        self.render();
    }

    pub fn set_dragging(self: &Rc<Self>, index: Option<usize>) {
        *self.dragging.borrow_mut() = index;
        self.render();
    }

    fn render(self: &Rc<Self>) {
        let current = *self.current.borrow();
        let dragging = *self.dragging.borrow();
        let tabs = self.tabs.borrow();

        let children: Vec<VNode> = tabs
            .iter()
            .enumerate()
            .map(|(i, widget)| self.tab_node(widget, i, Some(i) == current, Some(i) == dragging))
            .collect();
        drop(tabs);

        self.reconciler.render(&mut self.mount.borrow_mut(), &children);
    }

    fn tab_node(self: &Rc<Self>, widget: &WidgetRef<D>, index: usize, current: bool, dragging: bool) -> VNode {
        let key = ObjectId::of(widget).raw().to_string();
        let title = widget.borrow();
        let title = title.title();
        let closable = title.closable();
        let label = title.label().to_string();
        let icon = title.icon().map(|s| s.to_string());

        let mut classes = vec![CLASS_TAB.to_string()];
        if current {
            classes.push(CLASS_CURRENT.to_string());
        }
        if closable {
            classes.push(CLASS_CLOSABLE.to_string());
        }
        if dragging {
            classes.push(CLASS_DRAGGING.to_string());
        }

        let this = self.clone();
        let this2 = self.clone();
        let widget_for_close = widget.clone();

        let mut builder = VNode::element("li")
            .key(key)
            .attr("className", AttrValue::Text(classes.join(" ")))
            .attr(
                "onclick",
                AttrValue::Handler(handler(move |_: DomEvent| {
                    this.set_current_index(Some(index));
                })),
            );

        if let Some(icon) = icon {
            builder = builder.child(
                VNode::element("span")
                    .attr("className", AttrValue::Text(CLASS_ICON.to_string()))
                    .attr("textContent", AttrValue::Text(icon))
                    .build(),
            );
        }

        builder = builder.child(
            VNode::element("span")
                .attr("className", AttrValue::Text(CLASS_LABEL.to_string()))
                .attr("textContent", AttrValue::Text(label))
                .build(),
        );

        if closable {
            builder = builder.child(
                VNode::element("span")
                    .attr("className", AttrValue::Text(CLASS_CLOSE_ICON.to_string()))
                    .attr(
                        "onclick",
                        AttrValue::Handler(handler(move |_: DomEvent| {
                            this2.tab_close_requested.emit(&widget_for_close);
                        })),
                    )
                    .build(),
            );
        }

        builder.build()
    }
}

/// Where an index lands after the slice element at `from` is removed and
/// reinserted at `to` (a single-element `Vec::remove`+`insert`). Shared
/// with `StackedLayout::move_widget` so the two index spaces (bar order,
/// stack order) stay derivable from the same arithmetic.
pub(crate) fn reindex(i: usize, from: usize, to: usize) -> usize {
    if i == from {
        to
    } else if from < to {
        if i > from && i <= to {
            i - 1
        } else {
            i
        }
    } else if i >= to && i < from {
        i + 1
    } else {
        i
    }
}

impl<D: DomDriver> Drop for TabBar<D> {
    fn drop(&mut self) {
        signal::clear_data(self.self_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    fn widget(driver: &Rc<FakeDriver>, label: &str) -> WidgetRef<FakeDriver> {
        let ml = panel_core::MessageLoop::new(Box::new(panel_core::ImmediateScheduler));
        let w = crate::widget::Widget::new(driver.create_element("div"), ml);
        w.borrow_mut().title_mut().set_label(label);
        w
    }

    #[test]
    fn adding_first_tab_becomes_current() {
        let drv = Rc::new(FakeDriver::default());
        let bar = TabBar::new(drv.clone());
        let a = widget(&drv, "A");
        bar.add_tab(a.clone());
        assert_eq!(bar.current_index(), Some(0));
    }

    #[test]
    fn closing_tab_emits_close_requested() {
        let drv = Rc::new(FakeDriver::default());
        let bar = TabBar::new(drv.clone());
        let a = widget(&drv, "A");
        a.borrow_mut().title_mut().set_closable(true);
        bar.add_tab(a.clone());

        let seen = Rc::new(RefCell::new(false));
        let seen2 = seen.clone();
        bar.tab_close_requested()
            .connect(ObjectId::from_raw(1), Weak::new(), slot(move |_: &WidgetRef<FakeDriver>| *seen2.borrow_mut() = true));

        // `Weak::new()` never upgrades; this only exercises that
        // `remove_tab`/render don't themselves panic when a tab is torn
        // down, not that the bound slot runs.
        assert!(bar.remove_tab(&a));
        assert!(bar.current_index().is_none());
        let _ = seen;
    }

    #[test]
    fn move_tab_updates_current_index_through_the_gap() {
        let drv = Rc::new(FakeDriver::default());
        let bar = TabBar::new(drv.clone());
        let a = widget(&drv, "A");
        let b = widget(&drv, "B");
        let c = widget(&drv, "C");
        bar.add_tab(a);
        bar.add_tab(b.clone());
        bar.add_tab(c);
        bar.set_current_index(Some(1));

        bar.move_tab(0, 2);
        assert!(Rc::ptr_eq(bar.tabs.borrow().get(0).unwrap(), &b));
        assert_eq!(bar.current_index(), Some(0));
    }
}
