//! `SplitLayout` (spec §4.5): "owns a sequence of `(widget, SplitHandle,
//! stretch, sizeHint)` tuples and a box-sizing algorithm." Each item is
//! interleaved with a real DOM handle node so a pointer drag can resize
//! the two items it sits between.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use panel_core::{ids::ObjectId, signal, Message, Signal};
use panel_vdom::DomDriver;

use crate::box_layout::Orientation;
use crate::box_sizing::{compute_sizes, drag_handle};
use crate::layout::{as_child_message, dispatch_common, downcast_msg, Layout, LayoutBase, SizeLimits};
use crate::messages::{ChildMessage, Resize};
use crate::widget::{Widget, WidgetRef};

pub const HANDLE_CLASS: &str = "p-SplitPanel-handle";

/// Width (for a horizontal split) or height (for a vertical one) each
/// handle occupies, in pixels.
pub const DEFAULT_HANDLE_SIZE: i32 = 3;

struct Handle<N> {
    node: N,
}

pub struct SplitLayout<D: DomDriver> {
    base: LayoutBase<D>,
    orientation: Orientation,
    handle_size: i32,
    handles: RefCell<Vec<Handle<D::Node>>>,
    cached_sizes: RefCell<Vec<i32>>,
    last_extent: RefCell<(i32, i32)>,
    /// Fires whenever a drag or a resize settles on new proportions, so a
    /// dock engine persisting layout state has something to listen to.
    sizes_changed: Rc<Signal<Vec<i32>>>,
    self_id: ObjectId,
}

impl<D: DomDriver + 'static> SplitLayout<D> {
    pub fn new(driver: Rc<D>, orientation: Orientation) -> Rc<Self> {
        Self::with_handle_size(driver, orientation, DEFAULT_HANDLE_SIZE)
    }

    pub fn with_handle_size(driver: Rc<D>, orientation: Orientation, handle_size: i32) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let self_id = ObjectId::from_raw(weak.as_ptr() as *const () as usize);
            Self {
                base: LayoutBase::new(driver),
                orientation,
                handle_size,
                handles: RefCell::new(Vec::new()),
                cached_sizes: RefCell::new(Vec::new()),
                last_extent: RefCell::new((0, 0)),
                sizes_changed: Signal::new(self_id),
                self_id,
            }
        })
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn add_widget(&self, widget: WidgetRef<D>) {
        self.base.push(widget);
        self.sync_handles();
        self.base.request_parent_layout();
    }

    /// Insert `widget` at `index` rather than appending (the dock engine's
    /// split-merge needs a specific position — beside the reference panel,
    /// not last).
    pub fn insert_widget(&self, index: usize, widget: WidgetRef<D>) {
        self.base.insert(index, widget);
        self.sync_handles();
        self.base.request_parent_layout();
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn index_of(&self, widget: &WidgetRef<D>) -> Option<usize> {
        self.base
            .items
            .borrow()
            .iter()
            .position(|it| Rc::ptr_eq(&it.widget, widget))
    }

    /// Stop tracking `widget` and resync handles, synchronously — called
    /// both directly (the dock engine's tree surgery needs the item list
    /// updated immediately, not after the next posted `child-removed` is
    /// drained) and from the `child-removed` reaction below, the same
    /// dual-use pattern as `StackedLayout::remove_widget`.
    pub fn remove_widget(&self, widget: &WidgetRef<D>) -> bool {
        let removed = self.base.remove(widget).is_some();
        if removed {
            self.sync_handles();
            self.base.request_parent_layout();
        }
        removed
    }

    pub fn set_stretch(&self, widget: &WidgetRef<D>, stretch: i32) {
        self.with_limits(widget, |l| l.stretch = stretch);
    }

    pub fn set_size_limits(&self, widget: &WidgetRef<D>, min: i32, max: i32) {
        self.with_limits(widget, |l| {
            l.min = min;
            l.max = max;
        });
    }

    fn with_limits(&self, widget: &WidgetRef<D>, f: impl FnOnce(&mut SizeLimits)) {
        let items = self.base.items.borrow();
        if let Some(item) = items.iter().find(|it| Rc::ptr_eq(&it.widget, widget)) {
            f(&mut item.limits.borrow_mut());
            drop(items);
            self.base.request_parent_layout();
        }
    }

    pub fn sizes(&self) -> Vec<i32> {
        self.cached_sizes.borrow().clone()
    }

    pub fn sizes_changed(&self) -> &Rc<Signal<Vec<i32>>> {
        &self.sizes_changed
    }

    /// One handle for every adjacent pair of items; a layout with `n`
    /// items has `n.saturating_sub(1)` handles. Called after any
    /// structural mutation.
    fn sync_handles(&self) {
        let item_count = self.base.len();
        let wanted = item_count.saturating_sub(1);
        let mut handles = self.handles.borrow_mut();
        while handles.len() < wanted {
            let node = self.base.driver().create_element("div");
            self.base.driver().set_attribute(&node, "class", &panel_vdom::AttrValue::Text(HANDLE_CLASS.to_string()));
            self.base.driver().set_style_property(&node, "position", Some("absolute"));
            if let Some(parent) = self.base.parent() {
                let host = parent.borrow().node().clone();
                self.base.driver().insert_before(&host, &node, None);
            }
            handles.push(Handle { node });
        }
        while handles.len() > wanted {
            if let (Some(handle), Some(parent)) = (handles.pop(), self.base.parent()) {
                self.base.driver().remove_child(&parent.borrow().node().clone(), &handle.node);
            }
        }
    }

    /// Move the handle at `index` (between items `index` and `index+1`)
    /// by `delta` pixels, clamping to bounds and renormalizing stretch
    /// (spec §4.5 step 5). `index` out of range is a no-op.
    pub fn drag(&self, index: usize, delta: i32) {
        let items = self.base.items.borrow();
        if index + 1 >= items.len() {
            return;
        }
        let mut limits: Vec<SizeLimits> = items.iter().map(|it| *it.limits.borrow()).collect();
        let mut sizes = self.cached_sizes.borrow().clone();
        if sizes.len() != items.len() {
            return;
        }
        drag_handle(&mut sizes, &mut limits, index, delta);
        for (item, limit) in items.iter().zip(&limits) {
            *item.limits.borrow_mut() = *limit;
        }
        drop(items);
        *self.cached_sizes.borrow_mut() = sizes.clone();
        self.position_items(&sizes);
        self.sizes_changed.emit(&sizes);
    }

    fn apply_resize(&self, width: i32, height: i32) {
        *self.last_extent.borrow_mut() = (width, height);
        let items = self.base.items.borrow();
        if items.is_empty() {
            return;
        }
        let limits: Vec<SizeLimits> = items.iter().map(|it| *it.limits.borrow()).collect();
        let available = match self.orientation {
            Orientation::Horizontal => width,
            Orientation::Vertical => height,
        };
        let sizes = compute_sizes(available, &limits, self.handle_size);
        drop(items);
        *self.cached_sizes.borrow_mut() = sizes.clone();
        self.position_items(&sizes);
        self.sizes_changed.emit(&sizes);
    }

    fn position_items(&self, sizes: &[i32]) {
        let items = self.base.items.borrow();
        let handles = self.handles.borrow();
        let (width, height) = *self.last_extent.borrow();
        let driver = self.base.driver();

        let mut offset = 0;
        for (i, (item, &size)) in items.iter().zip(sizes).enumerate() {
            let node = item.widget.borrow().node().clone();
            driver.set_style_property(&node, "position", Some("absolute"));
            match self.orientation {
                Orientation::Horizontal => {
                    driver.set_style_property(&node, "left", Some(&format!("{offset}px")));
                    driver.set_style_property(&node, "top", Some("0"));
                    driver.set_style_property(&node, "width", Some(&format!("{size}px")));
                    driver.set_style_property(&node, "height", Some(&format!("{height}px")));
                    Widget::resize(&item.widget, size, height);
                }
                Orientation::Vertical => {
                    driver.set_style_property(&node, "top", Some(&format!("{offset}px")));
                    driver.set_style_property(&node, "left", Some("0"));
                    driver.set_style_property(&node, "height", Some(&format!("{size}px")));
                    driver.set_style_property(&node, "width", Some(&format!("{width}px")));
                    Widget::resize(&item.widget, width, size);
                }
            }
            offset += size;

            if let Some(handle) = handles.get(i) {
                match self.orientation {
                    Orientation::Horizontal => {
                        driver.set_style_property(&handle.node, "left", Some(&format!("{offset}px")));
                        driver.set_style_property(&handle.node, "top", Some("0"));
                        driver.set_style_property(&handle.node, "width", Some(&format!("{}px", self.handle_size)));
                        driver.set_style_property(&handle.node, "height", Some(&format!("{height}px")));
                    }
                    Orientation::Vertical => {
                        driver.set_style_property(&handle.node, "top", Some(&format!("{offset}px")));
                        driver.set_style_property(&handle.node, "left", Some("0"));
                        driver.set_style_property(&handle.node, "height", Some(&format!("{}px", self.handle_size)));
                        driver.set_style_property(&handle.node, "width", Some(&format!("{width}px")));
                    }
                }
                offset += self.handle_size;
            }
        }
    }
}

impl<D: DomDriver + 'static> Layout<D> for SplitLayout<D> {
    fn init(&self, parent: &WidgetRef<D>) {
        self.base.init(parent);
        self.sync_handles();
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

impl<D: DomDriver> Drop for SplitLayout<D> {
    fn drop(&mut self) {
        signal::clear_data(self.self_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    fn driver() -> Rc<FakeDriver> {
        Rc::new(FakeDriver::default())
    }

    fn child(driver: &Rc<FakeDriver>) -> WidgetRef<FakeDriver> {
        let ml = panel_core::MessageLoop::new(Box::new(panel_core::ImmediateScheduler));
        Widget::new(driver.create_element("div"), ml)
    }

    /// Spec §8 scenario 4, end to end through the layout (not just
    /// `box_sizing` directly): resize, drag, resize again.
    #[test]
    fn drag_then_resize_reproduces_spec_scenario_4() {
        let drv = driver();
        let layout = SplitLayout::with_handle_size(drv.clone(), Orientation::Horizontal, 3);
        let parent = child(&drv);
        Widget::set_layout(&parent, layout.clone()).unwrap();

        let a = child(&drv);
        let b = child(&drv);
        let c = child(&drv);
        layout.add_widget(a.clone());
        layout.add_widget(b.clone());
        layout.add_widget(c.clone());
        layout.set_size_limits(&a, 50, i32::MAX);
        layout.set_size_limits(&b, 50, i32::MAX);
        layout.set_size_limits(&c, 50, i32::MAX);
        layout.set_stretch(&a, 1);
        layout.set_stretch(&b, 1);
        layout.set_stretch(&c, 2);

        Widget::resize(&parent, 406, 100);
        assert_eq!(layout.sizes(), vec![100, 100, 200]);

        layout.drag(0, 25);
        assert_eq!(layout.sizes(), vec![125, 75, 200]);

        Widget::resize(&parent, 806, 100);
        assert_eq!(layout.sizes(), vec![250, 150, 400]);
    }

    #[test]
    fn handle_count_tracks_item_count() {
        let drv = driver();
        let layout = SplitLayout::new(drv.clone(), Orientation::Vertical);
        let parent = child(&drv);
        Widget::set_layout(&parent, layout.clone()).unwrap();

        assert_eq!(layout.handles.borrow().len(), 0);
        layout.add_widget(child(&drv));
        assert_eq!(layout.handles.borrow().len(), 0);
        layout.add_widget(child(&drv));
        assert_eq!(layout.handles.borrow().len(), 1);
        layout.add_widget(child(&drv));
        assert_eq!(layout.handles.borrow().len(), 2);
    }
}
