//! The driver seam between the reconciler's algorithm and an actual DOM.
//!
//! The reconciler (`reconciler.rs`) is generic over [`DomDriver`] so its
//! keyed-diff logic — the part actually worth testing — can run against
//! an in-memory fake in a plain `#[test]`, while `panel-widgets` wires it
//! to [`WebSysDriver`] for the real thing, decoupling the diff algorithm
//! from any particular rendering backend behind a narrow trait.

use crate::attrs::AttrValue;

/// Everything the reconciler needs from a DOM implementation.
///
/// `Node` must be cheaply cloneable (a handle, not the node's data) and
/// comparable by identity — two clones of a handle to the same
/// underlying node must be `==`.
pub trait DomDriver {
    type Node: Clone + PartialEq;

    fn create_element(&self, tag: &str) -> Self::Node;
    fn create_text(&self, content: &str) -> Self::Node;
    fn set_text(&self, node: &Self::Node, content: &str);

    /// Insert `node` into `host` immediately before `anchor`, or at the
    /// end of `host`'s children if `anchor` is `None`. A `node` already a
    /// child of `host` is moved.
    fn insert_before(&self, host: &Self::Node, node: &Self::Node, anchor: Option<&Self::Node>);
    fn remove_child(&self, host: &Self::Node, node: &Self::Node);

    fn set_property(&self, node: &Self::Node, name: &str, value: &AttrValue);
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &AttrValue);
    fn remove_attribute(&self, node: &Self::Node, name: &str);
    fn set_data_attribute(&self, node: &Self::Node, name: &str, value: &AttrValue);
    fn remove_data_attribute(&self, node: &Self::Node, name: &str);
    fn set_style_property(&self, node: &Self::Node, name: &str, value: Option<&str>);

    /// Replace (not add to) the listener for `event_name`. Passing `None`
    /// detaches any existing listener.
    fn set_event_handler(
        &self,
        node: &Self::Node,
        event_name: &str,
        handler: Option<crate::attrs::EventHandler>,
    );

    fn is_focused(&self, node: &Self::Node) -> bool;
    fn focus(&self, node: &Self::Node);

    /// The node's client-space bounding box (`getBoundingClientRect`).
    /// Used only by `panel-dock`'s drop-zone hit-testing (spec §4.6) —
    /// the reconciler and widget tree never call this.
    fn bounding_rect(&self, node: &Self::Node) -> crate::geometry::Rect;
}

/// An `Rc<D>` drives exactly as `D` does, so callers that hold their
/// driver behind an `Rc` (every layout in `panel-widgets` does, to share
/// one driver across a whole widget tree) can build a `Reconciler`
/// directly from it instead of re-borrowing the inner `D`.
impl<D: DomDriver> DomDriver for std::rc::Rc<D> {
    type Node = D::Node;

    fn create_element(&self, tag: &str) -> Self::Node {
        (**self).create_element(tag)
    }

    fn create_text(&self, content: &str) -> Self::Node {
        (**self).create_text(content)
    }

    fn set_text(&self, node: &Self::Node, content: &str) {
        (**self).set_text(node, content)
    }

    fn insert_before(&self, host: &Self::Node, node: &Self::Node, anchor: Option<&Self::Node>) {
        (**self).insert_before(host, node, anchor)
    }

    fn remove_child(&self, host: &Self::Node, node: &Self::Node) {
        (**self).remove_child(host, node)
    }

    fn set_property(&self, node: &Self::Node, name: &str, value: &AttrValue) {
        (**self).set_property(node, name, value)
    }

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &AttrValue) {
        (**self).set_attribute(node, name, value)
    }

    fn remove_attribute(&self, node: &Self::Node, name: &str) {
        (**self).remove_attribute(node, name)
    }

    fn set_data_attribute(&self, node: &Self::Node, name: &str, value: &AttrValue) {
        (**self).set_data_attribute(node, name, value)
    }

    fn remove_data_attribute(&self, node: &Self::Node, name: &str) {
        (**self).remove_data_attribute(node, name)
    }

    fn set_style_property(&self, node: &Self::Node, name: &str, value: Option<&str>) {
        (**self).set_style_property(node, name, value)
    }

    fn set_event_handler(&self, node: &Self::Node, event_name: &str, handler: Option<crate::attrs::EventHandler>) {
        (**self).set_event_handler(node, event_name, handler)
    }

    fn is_focused(&self, node: &Self::Node) -> bool {
        (**self).is_focused(node)
    }

    fn focus(&self, node: &Self::Node) {
        (**self).focus(node)
    }

    fn bounding_rect(&self, node: &Self::Node) -> crate::geometry::Rect {
        (**self).bounding_rect(node)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web_sys_driver::WebSysDriver;

#[cfg(target_arch = "wasm32")]
mod web_sys_driver {
    use super::DomDriver;
    use crate::attrs::{AttrValue, EventHandler};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{Document, Element, Event, Node};

    /// Drives a real browser DOM through `web_sys`.
    ///
    /// Listener closures must outlive the element they're attached to
    /// without the reconciler itself tracking that lifetime, so this
    /// driver keeps a side table of `Closure`s keyed by
    /// `(node pointer, event name)`, dropping the old one whenever a
    /// listener is replaced or removed.
    pub struct WebSysDriver {
        document: Document,
        listeners: RefCell<HashMap<(u32, String), Closure<dyn FnMut(Event)>>>,
    }

    impl WebSysDriver {
        pub fn new(document: Document) -> Self {
            Self {
                document,
                listeners: RefCell::new(HashMap::new()),
            }
        }

        fn node_key(node: &Node) -> u32 {
            // `web_sys`/`js-sys` objects don't expose a stable Rust
            // pointer; `Object::is` identity only works for equality
            // checks, not hashing. We instead mint and cache a
            // monotonic id per node the first time a listener touches
            // it, stashed as a DOM dataset entry so it survives moves.
            let element: &web_sys::Element = node.unchecked_ref();
            if let Some(existing) = element.get_attribute("data-panel-node-id") {
                if let Ok(id) = existing.parse() {
                    return id;
                }
            }
            thread_local! {
                static NEXT_ID: std::cell::Cell<u32> = std::cell::Cell::new(1);
            }
            let id = NEXT_ID.with(|c| {
                let id = c.get();
                c.set(id + 1);
                id
            });
            let _ = element.set_attribute("data-panel-node-id", &id.to_string());
            id
        }
    }

    impl DomDriver for WebSysDriver {
        type Node = Node;

        fn create_element(&self, tag: &str) -> Self::Node {
            self.document
                .create_element(tag)
                .expect("invalid tag name")
                .into()
        }

        fn create_text(&self, content: &str) -> Self::Node {
            self.document.create_text_node(content).into()
        }

        fn set_text(&self, node: &Self::Node, content: &str) {
            node.set_text_content(Some(content));
        }

        fn insert_before(&self, host: &Self::Node, node: &Self::Node, anchor: Option<&Self::Node>) {
            host.insert_before(node, anchor)
                .expect("insertBefore failed");
        }

        fn remove_child(&self, host: &Self::Node, node: &Self::Node) {
            let _ = host.remove_child(node);
        }

        fn set_property(&self, node: &Self::Node, name: &str, value: &AttrValue) {
            let value = js_value_of(value);
            let _ = js_sys::Reflect::set(node, &JsValue::from_str(name), &value);
        }

        fn set_attribute(&self, node: &Self::Node, name: &str, value: &AttrValue) {
            let element: &Element = node.unchecked_ref();
            let _ = element.set_attribute(name, &text_value_of(value));
        }

        fn remove_attribute(&self, node: &Self::Node, name: &str) {
            let element: &Element = node.unchecked_ref();
            let _ = element.remove_attribute(name);
        }

        fn set_data_attribute(&self, node: &Self::Node, name: &str, value: &AttrValue) {
            let data_name = name.strip_prefix("data-").unwrap_or(name);
            let element: &web_sys::HtmlElement = node.unchecked_ref();
            let _ = element.dataset().set(data_name, &text_value_of(value));
        }

        fn remove_data_attribute(&self, node: &Self::Node, name: &str) {
            let data_name = name.strip_prefix("data-").unwrap_or(name);
            let element: &web_sys::HtmlElement = node.unchecked_ref();
            element.dataset().delete(data_name);
        }

        fn set_style_property(&self, node: &Self::Node, name: &str, value: Option<&str>) {
            let element: &web_sys::HtmlElement = node.unchecked_ref();
            let style = element.style();
            match value {
                Some(v) => {
                    let _ = style.set_property(name, v);
                }
                None => {
                    let _ = style.remove_property(name);
                }
            }
        }

        fn set_event_handler(&self, node: &Self::Node, event_name: &str, handler: Option<EventHandler>) {
            let key = (Self::node_key(node), event_name.to_string());
            let element: &web_sys::EventTarget = node.unchecked_ref();

            if let Some(old) = self.listeners.borrow_mut().remove(&key) {
                let _ = element.remove_event_listener_with_callback(
                    event_name,
                    old.as_ref().unchecked_ref(),
                );
            }

            if let Some(handler) = handler {
                let closure = Closure::wrap(Box::new(move |event: Event| {
                    (handler.borrow_mut())(crate::attrs::DomEvent { inner: event });
                }) as Box<dyn FnMut(Event)>);
                let _ = element
                    .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
                self.listeners.borrow_mut().insert(key, closure);
            }
        }

        fn is_focused(&self, node: &Self::Node) -> bool {
            let Some(window) = web_sys::window() else {
                return false;
            };
            let Some(document) = window.document() else {
                return false;
            };
            document
                .active_element()
                .map(|active| active.unchecked_ref::<Node>() == node)
                .unwrap_or(false)
        }

        fn focus(&self, node: &Self::Node) {
            if let Some(element) = node.dyn_ref::<web_sys::HtmlElement>() {
                let _ = element.focus();
            }
        }

        fn bounding_rect(&self, node: &Self::Node) -> crate::geometry::Rect {
            let element: &Element = node.unchecked_ref();
            let rect = element.get_bounding_client_rect();
            crate::geometry::Rect::new(rect.left(), rect.top(), rect.right(), rect.bottom())
        }
    }

    fn text_value_of(value: &AttrValue) -> String {
        match value {
            AttrValue::Text(s) => s.clone(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Number(n) => n.to_string(),
            AttrValue::Handler(_) => String::new(),
        }
    }

    fn js_value_of(value: &AttrValue) -> JsValue {
        match value {
            AttrValue::Text(s) => JsValue::from_str(s),
            AttrValue::Bool(b) => JsValue::from_bool(*b),
            AttrValue::Number(n) => JsValue::from_f64(*n),
            AttrValue::Handler(_) => JsValue::UNDEFINED,
        }
    }
}
