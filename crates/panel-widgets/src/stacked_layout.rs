//! The stacked layout (spec §4.5): "only the current child occupies the
//! full area; others are hidden." Backs both a standalone stack widget
//! and, combined with a `TabBar`, the `TabPanel` composite.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use panel_core::{ids::ObjectId, signal, slot, Message, Signal};
use panel_vdom::DomDriver;

use crate::layout::{as_child_message, dispatch_common, downcast_msg, Layout, LayoutBase};
use crate::messages::{ChildMessage, Resize};
use crate::tab_bar::reindex;
use crate::widget::{Widget, WidgetRef};

pub struct StackedLayout<D: DomDriver> {
    base: LayoutBase<D>,
    current_index: RefCell<Option<usize>>,
    current_changed: Rc<Signal<Option<WidgetRef<D>>>>,
    /// Fires once the last widget has been removed (spec §3: "removeWidget
    /// (indirect, via StackedPanel `widgetRemoved`)").
    widget_removed: Rc<Signal<()>>,
    self_id: ObjectId,
}

impl<D: DomDriver + 'static> StackedLayout<D> {
    pub fn new(driver: Rc<D>) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let self_id = ObjectId::from_raw(weak.as_ptr() as *const () as usize);
            Self {
                base: LayoutBase::new(driver),
                current_index: RefCell::new(None),
                current_changed: Signal::new(self_id),
                widget_removed: Signal::new(self_id),
                self_id,
            }
        })
    }

    pub fn add_widget(&self, widget: WidgetRef<D>) {
        self.base.push(widget);
        if self.current_index.borrow().is_none() {
            self.set_current_index(Some(self.base.len() - 1));
        } else {
            self.apply_visibility();
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        *self.current_index.borrow()
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Insert `widget` at `index` rather than appending (spec §4.6's
    /// `addWidget` needs a specific position, not just "last").
    pub fn insert_widget(&self, index: usize, widget: WidgetRef<D>) {
        let index = index.min(self.base.len());
        let had_current = self.current_index.borrow().is_some();
        self.base.insert(index, widget);

        if !had_current {
            self.set_current_index(Some(index));
            return;
        }

        let mut current = self.current_index.borrow_mut();
        if let Some(c) = *current {
            if c >= index {
                *current = Some(c + 1);
            }
        }
        drop(current);
        self.apply_visibility();
        self.base.request_parent_layout();
    }

    /// Reorder the item at `from` to sit at `to`, without changing which
    /// widget is current — only its index, the same widget. Mirrors
    /// `TabBar::move_tab` so a bar reorder and the underlying stack stay
    /// in the same order (spec §3: "the bar's current index selects the
    /// visible widget").
    pub fn move_widget(&self, from: usize, to: usize) {
        let len = self.base.len();
        if from >= len || to >= len || from == to {
            return;
        }
        let widget = self.base.items.borrow()[from].widget.clone();
        self.base.remove(&widget);
        self.base.insert(to, widget);

        let mut current = self.current_index.borrow_mut();
        if let Some(c) = *current {
            *current = Some(reindex(c, from, to));
        }
    }

    pub fn current_widget(&self) -> Option<WidgetRef<D>> {
        let index = self.current_index()?;
        self.base.items.borrow().get(index).map(|it| it.widget.clone())
    }

    pub fn set_current_index(&self, index: Option<usize>) {
        let len = self.base.len();
        let index = index.filter(|&i| i < len);
        if *self.current_index.borrow() == index {
            return;
        }
        *self.current_index.borrow_mut() = index;
        self.apply_visibility();
        let widget = index.and_then(|i| self.base.items.borrow().get(i).map(|it| it.widget.clone()));
        self.current_changed.emit(&widget);
        self.base.request_parent_layout();
    }

    pub fn set_current_widget(&self, widget: &WidgetRef<D>) {
        let index = self
            .base
            .items
            .borrow()
            .iter()
            .position(|it| Rc::ptr_eq(&it.widget, widget));
        self.set_current_index(index);
    }

    /// Stop tracking `widget`. Returns whether it was tracked at all.
    /// Called both directly and from `child-removed`, so both explicit
    /// API use and ordinary `Widget::dispose`/`detach` keep this layout's
    /// bookkeeping in sync.
    pub fn remove_widget(&self, widget: &WidgetRef<D>) -> bool {
        let removed_pos = self
            .base
            .items
            .borrow()
            .iter()
            .position(|it| Rc::ptr_eq(&it.widget, widget));
        let Some(removed_pos) = removed_pos else {
            return false;
        };
        let was_current = *self.current_index.borrow();
        self.base.remove(widget);
        let len = self.base.len();

        let new_index = if len == 0 {
            None
        } else {
            match was_current {
                Some(i) if i > removed_pos => Some(i - 1),
                Some(i) if i == removed_pos => Some(removed_pos.min(len - 1)),
                other => other,
            }
        };
        *self.current_index.borrow_mut() = new_index;
        self.apply_visibility();

        let widget = new_index.and_then(|i| self.base.items.borrow().get(i).map(|it| it.widget.clone()));
        self.current_changed.emit(&widget);

        if len == 0 {
            self.widget_removed.emit(&());
        }
        self.base.request_parent_layout();
        true
    }

    pub fn current_changed(&self) -> &Rc<Signal<Option<WidgetRef<D>>>> {
        &self.current_changed
    }

    pub fn widget_removed(&self) -> &Rc<Signal<()>> {
        &self.widget_removed
    }

    fn apply_visibility(&self) {
        let items = self.base.items.borrow();
        let current = *self.current_index.borrow();
        let driver = self.base.driver();
        for (i, item) in items.iter().enumerate() {
            let node = item.widget.borrow().node().clone();
            if Some(i) == current {
                driver.set_style_property(&node, "display", None);
                Widget::show(&item.widget);
            } else {
                driver.set_style_property(&node, "display", Some("none"));
                Widget::hide(&item.widget);
            }
        }
    }

    fn apply_resize(&self, width: i32, height: i32) {
        let Some(current) = self.current_widget() else {
            return;
        };
        let node = current.borrow().node().clone();
        let driver = self.base.driver();
        driver.set_style_property(&node, "position", Some("absolute"));
        driver.set_style_property(&node, "left", Some("0"));
        driver.set_style_property(&node, "top", Some("0"));
        driver.set_style_property(&node, "width", Some(&format!("{width}px")));
        driver.set_style_property(&node, "height", Some(&format!("{height}px")));
        Widget::resize(&current, width, height);
    }
}

impl<D: DomDriver + 'static> Layout<D> for StackedLayout<D> {
    fn init(&self, parent: &WidgetRef<D>) {
        self.base.init(parent);
    }

    fn handle_parent_message(&self, msg: &dyn Message) {
        dispatch_common(&self.base, msg, |msg| match msg.message_type() {
            "resize" => {
                if let Some(resize) = downcast_msg::<Resize>(msg) {
                    if resize.width >= 0 && resize.height >= 0 {
                        self.apply_resize(resize.width, resize.height);
                    }
                }
            }
            "child-removed" => {
                if let Some(ChildMessage::Removed(child)) = as_child_message::<D>(msg) {
                    self.remove_widget(child);
                }
            }
            _ => {}
        });
    }

    fn widgets(&self) -> Vec<WidgetRef<D>> {
        self.base.widgets()
    }
}

impl<D: DomDriver> Drop for StackedLayout<D> {
    fn drop(&mut self) {
        signal::clear_data(self.self_id);
    }
}
