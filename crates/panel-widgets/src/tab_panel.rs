//! `TabPanel` (spec §3/§4.6: "Tab panel — composed of a `TabBar` (titles
//! only) and a `StackedPanel` (widgets); the bar's current index selects
//! the visible widget"). Combines [`TabBar`] and [`StackedLayout`] under
//! one outer widget, keeping them in sync with a message-loop hook rather
//! than a bespoke callback so the same observation mechanism that already
//! backs `child-added`/`child-removed` (spec §4.1's hook chains) covers
//! this too.

use std::rc::Rc;

use panel_core::{ids::ObjectId, slot, HandlerRef, Hook, HookRef, Message, MessageLoop, Signal};
use panel_vdom::{AttrValue, DomDriver};

use crate::layout::Layout;
use crate::messages::{ChildMessage, Resize};
use crate::stacked_layout::StackedLayout;
use crate::tab_bar::{TabBar, TabMoved};
use crate::widget::{Widget, WidgetRef};

pub const CLASS_TAB_PANEL: &str = "p-TabPanel";

/// Height reserved for the tab bar row: a fixed, never-reflowed constant
/// rather than something measured from the bar's rendered content.
pub const TAB_BAR_HEIGHT: i32 = 28;

/// A `(TabBar, StackedPanel)` composite: one outer widget whose layout
/// positions the bar as a fixed-height row above the current widget's
/// full-bleed content area.
pub struct TabPanel<D: DomDriver> {
    widget: WidgetRef<D>,
    bar: Rc<TabBar<D>>,
    content: WidgetRef<D>,
    stacked: Rc<StackedLayout<D>>,
}

impl<D: DomDriver + 'static> TabPanel<D> {
    pub fn new(driver: Rc<D>, message_loop: Rc<MessageLoop>) -> Rc<Self> {
        let node = driver.create_element("div");
        driver.set_attribute(&node, "class", &AttrValue::Text(CLASS_TAB_PANEL.to_string()));
        let widget = Widget::new(node, message_loop.clone());

        let bar = TabBar::new(driver.clone());

        let content_node = driver.create_element("div");
        let content = Widget::new(content_node, message_loop.clone());
        let stacked = StackedLayout::new(driver.clone());
        Widget::set_layout(&content, stacked.clone()).expect("freshly built content widget carries no layout yet");

        let receiver_id = ObjectId::of(&content);
        let receiver_alive = Widget::alive_token(&content);

        {
            let stacked = stacked.clone();
            bar.current_changed().connect(
                receiver_id,
                receiver_alive.clone(),
                slot(move |widget: &Option<WidgetRef<D>>| {
                    if let Some(widget) = widget {
                        stacked.set_current_widget(widget);
                    }
                }),
            );
        }
        {
            let stacked = stacked.clone();
            bar.tab_moved().connect(
                receiver_id,
                receiver_alive.clone(),
                slot(move |moved: &TabMoved<D>| {
                    stacked.move_widget(moved.from, moved.to);
                }),
            );
        }
        {
            let driver = driver.clone();
            bar.tab_close_requested().connect(
                receiver_id,
                receiver_alive,
                slot(move |widget: &WidgetRef<D>| {
                    Widget::dispose(widget, &driver);
                }),
            );
        }

        // `child-removed` on `content` already drives `stacked`'s own
        // bookkeeping (it's `content`'s assigned layout); this hook keeps
        // the tab row in sync with the same notification, whether the
        // widget left through `dispose`, `detach`, or `unparent` (the
        // dock engine's cross-panel move).
        message_loop.install_hook(
            &(content.clone() as HandlerRef),
            Rc::new(SyncBarOnRemoval { bar: bar.clone() }) as HookRef,
        );

        let layout = Rc::new(TabPanelLayout {
            driver,
            bar: bar.clone(),
            content: content.clone(),
        });
        Widget::set_layout(&widget, layout).expect("freshly built tab panel widget carries no layout yet");

        Rc::new(Self { widget, bar, content, stacked })
    }

    pub fn widget(&self) -> &WidgetRef<D> {
        &self.widget
    }

    pub fn bar(&self) -> &Rc<TabBar<D>> {
        &self.bar
    }

    pub fn len(&self) -> usize {
        self.stacked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn widgets(&self) -> Vec<WidgetRef<D>> {
        Layout::widgets(&*self.stacked)
    }

    /// Fires once this panel's last widget is removed (spec §3:
    /// "removeWidget (indirect, via StackedPanel `widgetRemoved`)"); the
    /// dock engine collapses an emptied tab panel on this.
    pub fn widget_removed(&self) -> &Rc<Signal<()>> {
        self.stacked.widget_removed()
    }

    pub fn add_widget(&self, widget: WidgetRef<D>) {
        let index = self.len();
        self.insert_widget(index, widget);
    }

    pub fn insert_widget(&self, index: usize, widget: WidgetRef<D>) {
        let index = index.min(self.len());
        self.bar.insert_tab(index, widget.clone());
        self.stacked.insert_widget(index, widget);
    }

    pub fn activate_widget(&self, widget: &WidgetRef<D>) {
        self.stacked.set_current_widget(widget);
        let index = Layout::widgets(&*self.stacked)
            .iter()
            .position(|w| Rc::ptr_eq(w, widget));
        self.bar.set_current_index(index);
    }
}

struct SyncBarOnRemoval<D: DomDriver> {
    bar: Rc<TabBar<D>>,
}

impl<D: DomDriver + 'static> Hook for SyncBarOnRemoval<D> {
    fn run(&self, _handler: &HandlerRef, msg: &dyn Message) -> bool {
        if msg.message_type() == "child-removed" {
            if let Some(ChildMessage::Removed(widget)) =
                (msg as &dyn std::any::Any).downcast_ref::<ChildMessage<D>>()
            {
                self.bar.remove_tab(widget);
            }
        }
        true
    }
}

/// The outer widget's layout: a fixed-height bar row above a full-bleed
/// content area, with no draggable items of its own (the bar and the
/// stacked content are fixed, not a reorderable item list, so this does
/// not build on `LayoutBase`).
struct TabPanelLayout<D: DomDriver> {
    driver: Rc<D>,
    bar: Rc<TabBar<D>>,
    content: WidgetRef<D>,
}

impl<D: DomDriver + 'static> Layout<D> for TabPanelLayout<D> {
    fn init(&self, parent: &WidgetRef<D>) {
        Widget::add_child(parent, self.content.clone());
        let host = parent.borrow().node().clone();
        self.driver.insert_before(&host, self.bar.node(), None);
        self.driver.insert_before(&host, self.content.borrow().node(), None);
    }

    fn handle_parent_message(&self, msg: &dyn Message) {
        if msg.message_type() == "resize" {
            if let Some(resize) = (msg as &dyn std::any::Any).downcast_ref::<Resize>() {
                if resize.width >= 0 && resize.height >= 0 {
                    self.apply_resize(resize.width, resize.height);
                }
            }
        }
    }

    fn widgets(&self) -> Vec<WidgetRef<D>> {
        vec![self.content.clone()]
    }
}

impl<D: DomDriver + 'static> TabPanelLayout<D> {
    fn apply_resize(&self, width: i32, height: i32) {
        let bar_height = TAB_BAR_HEIGHT.min(height.max(0));
        let content_height = (height - bar_height).max(0);

        let bar_node = self.bar.node();
        self.driver.set_style_property(bar_node, "position", Some("absolute"));
        self.driver.set_style_property(bar_node, "left", Some("0"));
        self.driver.set_style_property(bar_node, "top", Some("0"));
        self.driver.set_style_property(bar_node, "width", Some(&format!("{width}px")));
        self.driver.set_style_property(bar_node, "height", Some(&format!("{bar_height}px")));

        let content_node = self.content.borrow().node().clone();
        self.driver.set_style_property(&content_node, "position", Some("absolute"));
        self.driver.set_style_property(&content_node, "left", Some("0"));
        self.driver.set_style_property(&content_node, "top", Some(&format!("{bar_height}px")));
        self.driver.set_style_property(&content_node, "width", Some(&format!("{width}px")));
        self.driver.set_style_property(&content_node, "height", Some(&format!("{content_height}px")));

        Widget::resize(&self.content, width, content_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;
    use panel_core::ImmediateScheduler;

    fn setup() -> (Rc<FakeDriver>, Rc<MessageLoop>) {
        let drv = Rc::new(FakeDriver::default());
        let ml = MessageLoop::new(Box::new(ImmediateScheduler));
        (drv, ml)
    }

    fn child(driver: &Rc<FakeDriver>, ml: &Rc<MessageLoop>, label: &str) -> WidgetRef<FakeDriver> {
        let w = Widget::new(driver.create_element("div"), ml.clone());
        w.borrow_mut().title_mut().set_label(label);
        w
    }

    #[test]
    fn add_widget_becomes_current_and_visible_in_stack() {
        let (drv, ml) = setup();
        let panel = TabPanel::new(drv.clone(), ml.clone());
        let a = child(&drv, &ml, "A");
        panel.add_widget(a.clone());

        assert_eq!(panel.len(), 1);
        assert!(Rc::ptr_eq(&panel.stacked.current_widget().unwrap(), &a));
        assert_eq!(panel.bar.current_index(), Some(0));
    }

    #[test]
    fn closing_a_tab_disposes_the_widget_and_drops_it_from_the_bar() {
        let (drv, ml) = setup();
        let panel = TabPanel::new(drv.clone(), ml.clone());
        let a = child(&drv, &ml, "A");
        a.borrow_mut().title_mut().set_closable(true);
        panel.add_widget(a.clone());

        panel.bar.tab_close_requested().emit(&a);

        assert!(a.borrow().is_disposed());
        assert_eq!(panel.len(), 0);
        assert_eq!(panel.bar.current_index(), None);
    }

    #[test]
    fn unparenting_a_widget_drops_its_tab_without_disposing_it() {
        let (drv, ml) = setup();
        let panel = TabPanel::new(drv.clone(), ml.clone());
        let a = child(&drv, &ml, "A");
        let b = child(&drv, &ml, "B");
        panel.add_widget(a.clone());
        panel.add_widget(b.clone());

        Widget::unparent(&a, &*drv);

        assert!(!a.borrow().is_disposed());
        assert_eq!(panel.len(), 1);
        assert!(Rc::ptr_eq(&panel.stacked.current_widget().unwrap(), &b));
    }

    #[test]
    fn resize_reserves_the_bar_row_above_the_content_area() {
        let (drv, ml) = setup();
        let panel = TabPanel::new(drv.clone(), ml.clone());
        let a = child(&drv, &ml, "A");
        panel.add_widget(a.clone());

        Widget::resize(panel.widget(), 300, 200);

        let content_node = panel.content.borrow().node().clone();
        assert_eq!(drv.style_of(&content_node, "top"), Some(format!("{TAB_BAR_HEIGHT}px")));
        assert_eq!(drv.style_of(&content_node, "height"), Some(format!("{}px", 200 - TAB_BAR_HEIGHT)));
    }
}
