//! A minimal in-memory [`DomDriver`] fake, shared by this crate's unit
//! tests so they don't need a real browser to exercise layout geometry.

use std::cell::RefCell;
use std::collections::HashMap;

use panel_vdom::{AttrValue, DomDriver, EventHandler, Rect};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FakeNode(pub u32);

#[derive(Default)]
pub struct FakeDriver {
    next_id: RefCell<u32>,
    styles: RefCell<HashMap<(u32, String), String>>,
    focused: RefCell<Option<u32>>,
    /// Rects tests pin with [`FakeDriver::set_rect`], consulted by
    /// `bounding_rect`; a node with no pinned rect reads as all-zero.
    rects: RefCell<HashMap<u32, Rect>>,
}

impl FakeDriver {
    fn fresh(&self) -> FakeNode {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        FakeNode(*next)
    }

    pub fn style_of(&self, node: &FakeNode, name: &str) -> Option<String> {
        self.styles.borrow().get(&(node.0, name.to_string())).cloned()
    }

    /// Pin the rect `bounding_rect` reports for `node`. Tests exercising
    /// `panel-dock`'s zone hit-testing use this to stand in for a real
    /// `getBoundingClientRect`.
    pub fn set_rect(&self, node: &FakeNode, rect: Rect) {
        self.rects.borrow_mut().insert(node.0, rect);
    }
}

impl DomDriver for FakeDriver {
    type Node = FakeNode;

    fn create_element(&self, _tag: &str) -> Self::Node {
        self.fresh()
    }

    fn create_text(&self, _content: &str) -> Self::Node {
        self.fresh()
    }

    fn set_text(&self, _node: &Self::Node, _content: &str) {}

    fn insert_before(&self, _host: &Self::Node, _node: &Self::Node, _anchor: Option<&Self::Node>) {}

    fn remove_child(&self, _host: &Self::Node, _node: &Self::Node) {}

    fn set_property(&self, _node: &Self::Node, _name: &str, _value: &AttrValue) {}

    fn set_attribute(&self, _node: &Self::Node, _name: &str, _value: &AttrValue) {}

    fn remove_attribute(&self, _node: &Self::Node, _name: &str) {}

    fn set_data_attribute(&self, _node: &Self::Node, _name: &str, _value: &AttrValue) {}

    fn remove_data_attribute(&self, _node: &Self::Node, _name: &str) {}

    fn set_style_property(&self, node: &Self::Node, name: &str, value: Option<&str>) {
        match value {
            Some(v) => {
                self.styles.borrow_mut().insert((node.0, name.to_string()), v.to_string());
            }
            None => {
                self.styles.borrow_mut().remove(&(node.0, name.to_string()));
            }
        }
    }

    fn set_event_handler(&self, _node: &Self::Node, _event_name: &str, _handler: Option<EventHandler>) {}

    fn is_focused(&self, node: &Self::Node) -> bool {
        *self.focused.borrow() == Some(node.0)
    }

    fn focus(&self, node: &Self::Node) {
        *self.focused.borrow_mut() = Some(node.0);
    }

    fn bounding_rect(&self, node: &Self::Node) -> Rect {
        self.rects.borrow().get(&node.0).copied().unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
    }
}
