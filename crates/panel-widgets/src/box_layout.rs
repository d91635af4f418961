//! The plain linear layout (spec §4.5's "Panel"): items stacked along one
//! axis, each sized from its own `[min, max]`/`stretch`/`sizeHint` via
//! `box_sizing::compute_sizes`, with no draggable handles between them
//! (`handle_size` is always `0`) — the degenerate case `SplitLayout`
//! generalizes.

use std::cell::RefCell;
use std::rc::Rc;

use panel_core::Message;
use panel_vdom::DomDriver;

use crate::box_sizing::compute_sizes;
use crate::layout::{as_child_message, dispatch_common, downcast_msg, Layout, LayoutBase, SizeLimits};
use crate::messages::{ChildMessage, Resize};
use crate::widget::{Widget, WidgetRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

pub struct BoxLayout<D: DomDriver> {
    base: LayoutBase<D>,
    orientation: Orientation,
}

impl<D: DomDriver + 'static> BoxLayout<D> {
    pub fn new(driver: Rc<D>, orientation: Orientation) -> Rc<Self> {
        Rc::new(Self {
            base: LayoutBase::new(driver),
            orientation,
        })
    }

    pub fn add_widget(&self, widget: WidgetRef<D>) {
        self.base.push(widget);
        self.base.request_parent_layout();
    }

    pub fn insert_widget(&self, index: usize, widget: WidgetRef<D>) {
        self.base.insert(index, widget);
        self.base.request_parent_layout();
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

    pub fn set_expansive(&self, widget: &WidgetRef<D>, expansive: bool) {
        self.with_limits(widget, |l| l.expansive = expansive);
    }

    fn with_limits(&self, widget: &WidgetRef<D>, f: impl FnOnce(&mut SizeLimits)) {
        let items = self.base.items.borrow();
        if let Some(item) = items.iter().find(|it| Rc::ptr_eq(&it.widget, widget)) {
            f(&mut item.limits.borrow_mut());
            drop(items);
            self.base.request_parent_layout();
        }
    }

    fn apply_resize(&self, width: i32, height: i32) {
        let items = self.base.items.borrow();
        if items.is_empty() {
            return;
        }
        let limits: Vec<SizeLimits> = items.iter().map(|it| *it.limits.borrow()).collect();
        let available = match self.orientation {
            Orientation::Horizontal => width,
            Orientation::Vertical => height,
        };
        let sizes = compute_sizes(available, &limits, 0);

        let mut offset = 0;
        let driver = self.base.driver();
        for (item, size) in items.iter().zip(sizes) {
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
        }
    }
}

impl<D: DomDriver + 'static> Layout<D> for BoxLayout<D> {
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
                    if self.base.remove(child).is_some() {
                        self.base.request_parent_layout();
                    }
                }
            }
            _ => {}
        });
    }

    fn widgets(&self) -> Vec<WidgetRef<D>> {
        self.base.widgets()
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

    #[test]
    fn resize_distributes_by_stretch_along_orientation() {
        let drv = driver();
        let layout = BoxLayout::new(drv.clone(), Orientation::Horizontal);
        let parent = child(&drv);
        Widget::set_layout(&parent, layout.clone()).unwrap();

        let a = child(&drv);
        let b = child(&drv);
        layout.add_widget(a.clone());
        layout.add_widget(b.clone());
        layout.set_stretch(&a, 1);
        layout.set_stretch(&b, 1);

        Widget::resize(&parent, 200, 50);

        assert_eq!(drv.style_of(a.borrow().node(), "width"), Some("100px".to_string()));
        assert_eq!(drv.style_of(b.borrow().node(), "width"), Some("100px".to_string()));
    }
}
