//! Reconciler tests against an in-memory fake DOM.
//!
//! These exercise the keyed-diff algorithm and its edge cases without a
//! real browser — `tests/web.rs` in this crate runs the same scenarios
//! (VDOM-P1, scenario 3's focus preservation) against the real
//! `WebSysDriver` under `wasm-bindgen-test-runner`, and `panel-widgets`'
//! own `tests/web.rs` covers the attach/detach ordering (WID-P2) that
//! only makes sense with a live widget tree on top.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::attrs::AttrValue;
use crate::host::DomDriver;
use crate::reconciler::{Mount, Reconciler};
use crate::vnode::VNode;

#[derive(Debug)]
enum FakeKind {
    Element { tag: String },
    Text { content: String },
}

#[derive(Debug)]
struct FakeNodeData {
    kind: FakeKind,
    children: Vec<FakeNode>,
    attrs: HashMap<String, String>,
    style: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct FakeNode(Rc<RefCell<FakeNodeData>>);

impl PartialEq for FakeNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Default)]
struct FakeDriver {
    focused: RefCell<Option<FakeNode>>,
}

impl DomDriver for FakeDriver {
    type Node = FakeNode;

    fn create_element(&self, tag: &str) -> Self::Node {
        FakeNode(Rc::new(RefCell::new(FakeNodeData {
            kind: FakeKind::Element { tag: tag.to_string() },
            children: Vec::new(),
            attrs: HashMap::new(),
            style: HashMap::new(),
        })))
    }

    fn create_text(&self, content: &str) -> Self::Node {
        FakeNode(Rc::new(RefCell::new(FakeNodeData {
            kind: FakeKind::Text {
                content: content.to_string(),
            },
            children: Vec::new(),
            attrs: HashMap::new(),
            style: HashMap::new(),
        })))
    }

    fn set_text(&self, node: &Self::Node, content: &str) {
        if let FakeKind::Text { content: c } = &mut node.0.borrow_mut().kind {
            *c = content.to_string();
        }
    }

    fn insert_before(&self, host: &Self::Node, node: &Self::Node, anchor: Option<&Self::Node>) {
        let mut host_data = host.0.borrow_mut();
        host_data.children.retain(|c| c != node);
        let pos = match anchor {
            Some(a) => host_data.children.iter().position(|c| c == a).unwrap_or(host_data.children.len()),
            None => host_data.children.len(),
        };
        host_data.children.insert(pos, node.clone());
    }

    fn remove_child(&self, host: &Self::Node, node: &Self::Node) {
        host.0.borrow_mut().children.retain(|c| c != node);
    }

    fn set_property(&self, node: &Self::Node, name: &str, value: &AttrValue) {
        node.0
            .borrow_mut()
            .attrs
            .insert(name.to_string(), debug_value(value));
    }

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &AttrValue) {
        node.0
            .borrow_mut()
            .attrs
            .insert(name.to_string(), debug_value(value));
    }

    fn remove_attribute(&self, node: &Self::Node, name: &str) {
        node.0.borrow_mut().attrs.remove(name);
    }

    fn set_data_attribute(&self, node: &Self::Node, name: &str, value: &AttrValue) {
        node.0
            .borrow_mut()
            .attrs
            .insert(name.to_string(), debug_value(value));
    }

    fn remove_data_attribute(&self, node: &Self::Node, name: &str) {
        node.0.borrow_mut().attrs.remove(name);
    }

    fn set_style_property(&self, node: &Self::Node, name: &str, value: Option<&str>) {
        let mut data = node.0.borrow_mut();
        match value {
            Some(v) => {
                data.style.insert(name.to_string(), v.to_string());
            }
            None => {
                data.style.remove(name);
            }
        }
    }

    fn set_event_handler(
        &self,
        node: &Self::Node,
        event_name: &str,
        handler: Option<crate::attrs::EventHandler>,
    ) {
        let mut data = node.0.borrow_mut();
        let key = format!("on{event_name}");
        if handler.is_some() {
            data.attrs.insert(key, "<handler>".to_string());
        } else {
            data.attrs.remove(&key);
        }
    }

    fn is_focused(&self, node: &Self::Node) -> bool {
        self.focused.borrow().as_ref() == Some(node)
    }

    fn focus(&self, node: &Self::Node) {
        *self.focused.borrow_mut() = Some(node.clone());
    }

    fn bounding_rect(&self, _node: &Self::Node) -> crate::geometry::Rect {
        crate::geometry::Rect::new(0.0, 0.0, 0.0, 0.0)
    }
}

fn debug_value(value: &AttrValue) -> String {
    match value {
        AttrValue::Text(s) => s.clone(),
        AttrValue::Bool(b) => b.to_string(),
        AttrValue::Number(n) => n.to_string(),
        AttrValue::Handler(_) => "<handler>".to_string(),
    }
}

fn tags(host: &FakeNode) -> Vec<String> {
    host.0
        .borrow()
        .children
        .iter()
        .map(|c| match &c.0.borrow().kind {
            FakeKind::Element { tag } => tag.clone(),
            FakeKind::Text { content } => format!("#text({content})"),
        })
        .collect()
}

fn keyed_element(tag: &str, key: &str) -> VNode {
    VNode::element(tag).key(key).build()
}

fn setup() -> (Reconciler<FakeDriver>, Mount<FakeNode>) {
    let driver = FakeDriver::default();
    let host = driver.create_element("div");
    let mount = Mount::new(host);
    (Reconciler::new(driver), mount)
}

#[test]
fn vdom_p1_identical_reference_is_a_no_op() {
    let (r, mut mount) = setup();
    let tree = vec![keyed_element("a", "1"), keyed_element("b", "2")];

    r.render(&mut mount, &tree);
    let children_before = mount.host().0.borrow().children.clone();

    r.render(&mut mount, &tree);
    let children_after = mount.host().0.borrow().children.clone();

    assert_eq!(children_before.len(), children_after.len());
    for (a, b) in children_before.iter().zip(children_after.iter()) {
        assert_eq!(a, b, "identical re-render must not touch the DOM nodes");
    }
}

#[test]
fn vdom_p2_keyed_reorder_preserves_identity_and_swaps_positions() {
    let (r, mut mount) = setup();
    let first = vec![
        keyed_element("a", "1"),
        keyed_element("b", "2"),
        keyed_element("c", "3"),
    ];
    r.render(&mut mount, &first);

    let node_1_before = mount.host().0.borrow().children[0].clone();
    let node_2_before = mount.host().0.borrow().children[1].clone();

    let second = vec![
        keyed_element("a", "1"),
        keyed_element("c", "3"),
        keyed_element("b", "2"),
    ];
    r.render(&mut mount, &second);

    let after = mount.host().0.borrow().children.clone();
    assert_eq!(after[0], node_1_before, "key 1's node identity must be preserved");
    assert_eq!(after[2], node_2_before, "key 2's node identity must be preserved");
    assert_eq!(tags(mount.host()), vec!["a", "c", "b"]);
}

#[test]
fn edge_case_a_rendering_empty_after_non_empty_clears_host() {
    let (r, mut mount) = setup();
    r.render(&mut mount, &[keyed_element("a", "1"), keyed_element("b", "2")]);
    assert_eq!(tags(mount.host()), vec!["a", "b"]);

    r.render(&mut mount, &[]);
    assert!(tags(mount.host()).is_empty());
}

#[test]
fn edge_case_c_keyed_element_with_changed_tag_is_treated_as_fresh() {
    let (r, mut mount) = setup();
    r.render(&mut mount, &[keyed_element("a", "shared")]);
    let original_node = mount.host().0.borrow().children[0].clone();

    r.render(&mut mount, &[keyed_element("span", "shared")]);
    let new_node = mount.host().0.borrow().children[0].clone();

    assert_ne!(
        original_node, new_node,
        "a tag change under the same key must not reuse the old node"
    );
    assert_eq!(tags(mount.host()), vec!["span"]);
}

#[test]
fn trailing_old_children_with_no_new_slot_are_removed() {
    let (r, mut mount) = setup();
    r.render(
        &mut mount,
        &[keyed_element("a", "1"), keyed_element("b", "2"), keyed_element("c", "3")],
    );
    r.render(&mut mount, &[keyed_element("a", "1")]);
    assert_eq!(tags(mount.host()), vec!["a"]);
}

#[test]
fn text_content_is_replaced_only_when_changed() {
    let (r, mut mount) = setup();
    r.render(&mut mount, &[VNode::text("hello")]);
    let node = mount.host().0.borrow().children[0].clone();

    r.render(&mut mount, &[VNode::text("hello")]);
    assert_eq!(node, mount.host().0.borrow().children[0], "same node reused");
    if let FakeKind::Text { content } = &node.0.borrow().kind {
        assert_eq!(content, "hello");
    }

    r.render(&mut mount, &[VNode::text("world")]);
    if let FakeKind::Text { content } = &node.0.borrow().kind {
        assert_eq!(content, "world");
    }
}

#[test]
fn attribute_diff_applies_adds_changes_and_removes() {
    let (r, mut mount) = setup();
    r.render(
        &mut mount,
        &[VNode::element("input")
            .key("only")
            .attr("value", AttrValue::Text("a".into()))
            .attr("placeholder", AttrValue::Text("hint".into()))
            .build()],
    );
    let node = mount.host().0.borrow().children[0].clone();
    assert_eq!(node.0.borrow().attrs.get("value"), Some(&"a".to_string()));

    r.render(
        &mut mount,
        &[VNode::element("input")
            .key("only")
            .attr("value", AttrValue::Text("b".into()))
            .build()],
    );
    assert_eq!(node.0.borrow().attrs.get("value"), Some(&"b".to_string()));
    assert_eq!(
        node.0.borrow().attrs.get("placeholder"),
        None,
        "an attribute dropped from the new tree must be removed"
    );
}

#[test]
fn style_diff_clears_dropped_keys_and_applies_changed_ones() {
    let (r, mut mount) = setup();
    r.render(
        &mut mount,
        &[VNode::element("div")
            .key("only")
            .style("color", "red")
            .style("display", "block")
            .build()],
    );
    let node = mount.host().0.borrow().children[0].clone();

    r.render(
        &mut mount,
        &[VNode::element("div").key("only").style("color", "blue").build()],
    );

    let style = node.0.borrow().style.clone();
    assert_eq!(style.get("color"), Some(&"blue".to_string()));
    assert_eq!(style.get("display"), None);
}

#[test]
fn moving_a_keyed_node_preserves_focus() {
    let driver = FakeDriver::default();
    let host = driver.create_element("div");
    let r = Reconciler::new(driver);
    let mut mount = Mount::new(host);

    r.render(
        &mut mount,
        &[keyed_element("input", "q"), keyed_element("input", "r")],
    );
    let node_q = mount.host().0.borrow().children[0].clone();
    r.driver().focus(&node_q);
    assert!(r.driver().is_focused(&node_q));

    r.render(
        &mut mount,
        &[keyed_element("input", "r"), keyed_element("input", "q")],
    );

    assert!(
        r.driver().is_focused(&node_q),
        "the node previously holding key `q` must still be focused after the move"
    );
    assert_eq!(tags(mount.host()), vec!["input", "input"]);
    assert_eq!(mount.host().0.borrow().children[1], node_q);
}
