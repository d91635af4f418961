//! The keyed-diff reconciler (spec §4.3).

use std::collections::VecDeque;

use crate::attrs::{mode_of, AttrMode, AttrValue};
use crate::host::DomDriver;
use crate::vnode::{Style, VNode};

/// A previously-rendered child, retained so the next `render` call can
/// diff against it and locate its live DOM node.
struct MountedNode<N> {
    node: N,
    key: Option<String>,
    content: MountedContent<N>,
}

enum MountedContent<N> {
    Text(String),
    Element {
        tag: String,
        attrs: Vec<(String, AttrValue)>,
        style: Style,
        children: Vec<MountedNode<N>>,
    },
    /// A realized `Component`: we keep the vnode it last rendered so a
    /// future render can diff against it exactly like any other node.
    Component { rendered: Box<MountedNode<N>> },
}

impl<N: Clone> MountedNode<N> {
    fn tag_matches(&self, new_child: &VNode) -> bool {
        match (&self.content, new_child) {
            (MountedContent::Text(_), VNode::Text(_)) => true,
            (MountedContent::Element { tag, .. }, VNode::Element(el)) => *tag == el.tag,
            (MountedContent::Component { .. }, VNode::Component(_)) => true,
            _ => false,
        }
    }
}

/// Per-host retained state: the virtual node list most recently applied,
/// plus the live nodes needed to update, move, or remove them.
///
/// `Mount` is an explicit value the caller (a `panel-widgets` container)
/// holds next to the host node it owns, rather than a side table keyed
/// by the host — plain Rust ownership standing in for what a DOM-hosted
/// reconciler would keep in a `WeakMap`.
pub struct Mount<N> {
    host: N,
    children: Vec<MountedNode<N>>,
    /// The exact `VNode` slice reference last rendered, by identity, so
    /// edge case (b) — "rendering an identical object reference skips
    /// children recursion entirely" — can be honored without a deep
    /// equality check.
    last_render_ptr: Option<usize>,
}

impl<N: Clone> Mount<N> {
    pub fn new(host: N) -> Self {
        Self {
            host,
            children: Vec::new(),
            last_render_ptr: None,
        }
    }

    pub fn host(&self) -> &N {
        &self.host
    }
}

pub struct Reconciler<D: DomDriver> {
    driver: D,
}

impl<D: DomDriver> Reconciler<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Reconcile `mount`'s host to contain exactly `new_children`.
    ///
    /// `new_children` may be empty (clears the host, edge case (a)).
    /// Passing the same `&[VNode]` backing storage as the previous call
    /// (same pointer) is a no-op (edge case (b)).
    pub fn render(&self, mount: &mut Mount<D::Node>, new_children: &[VNode]) {
        let ptr = new_children.as_ptr() as usize;
        if !new_children.is_empty() && mount.last_render_ptr == Some(ptr) {
            return;
        }
        mount.last_render_ptr = if new_children.is_empty() { None } else { Some(ptr) };

        let mut work: VecDeque<MountedNode<D::Node>> = mount.children.drain(..).collect();
        let mut result = Vec::with_capacity(new_children.len());

        for new_child in new_children {
            let mounted = self.reconcile_one(&mount.host, &mut work, new_child);
            result.push(mounted);
        }

        // Trailing old children with no corresponding new slot (step 4).
        for leftover in work {
            self.driver.remove_child(&mount.host, &leftover.node);
        }

        mount.children = result;
    }

    /// Create a detached fragment from `node`, with no host diffing.
    pub fn realize(&self, node: &VNode) -> D::Node {
        self.create(node).node
    }

    fn reconcile_one(
        &self,
        host: &D::Node,
        work: &mut VecDeque<MountedNode<D::Node>>,
        new_child: &VNode,
    ) -> MountedNode<D::Node> {
        let new_key = new_child.key();

        // Step 3b/3c: keyed match, at the front or found later in the
        // remaining old suffix. Edge case (c): a tag mismatch at a
        // matched key is treated as no match at all (fresh element).
        let key_match_index = new_key.and_then(|k| {
            work.iter()
                .position(|m| m.key.as_deref() == Some(k) && m.tag_matches(new_child))
        });

        if let Some(idx) = key_match_index {
            let old = work.remove(idx).expect("index came from this deque");
            if idx > 0 {
                let anchor = work.front().map(|m| m.node.clone());
                self.move_preserving_focus(host, &old.node, anchor.as_ref());
            }
            return self.update(host, old, new_child);
        }

        // Step 3d/3e: positional reuse at the front of the remaining
        // suffix, gated on matching tag/kind (unkeyed reuse never steals
        // a node out of order).
        let front_reusable = work
            .front()
            .map(|m| m.tag_matches(new_child))
            .unwrap_or(false);

        if front_reusable {
            let old = work.pop_front().expect("front_reusable implies non-empty");
            return self.update(host, old, new_child);
        }

        // Step 3a/3d: nothing to reuse at this position — create fresh
        // and insert before whatever currently occupies the front of the
        // remaining suffix (or append, if the suffix is empty).
        let anchor = work.front().map(|m| m.node.clone());
        let mounted = self.create(new_child);
        self.driver.insert_before(host, &mounted.node, anchor.as_ref());
        mounted
    }

    fn move_preserving_focus(&self, host: &D::Node, node: &D::Node, anchor: Option<&D::Node>) {
        let had_focus = self.driver.is_focused(node);
        self.driver.insert_before(host, node, anchor);
        if had_focus {
            self.driver.focus(node);
        }
    }

    fn create(&self, vnode: &VNode) -> MountedNode<D::Node> {
        match vnode {
            VNode::Text(content) => MountedNode {
                node: self.driver.create_text(content),
                key: None,
                content: MountedContent::Text(content.clone()),
            },
            VNode::Element(el) => {
                let node = self.driver.create_element(&el.tag);
                for (name, value) in &el.attrs {
                    self.apply_attr(&node, name, None, value);
                }
                for (name, value) in &el.style {
                    self.driver.set_style_property(&node, name, Some(value));
                }
                let mut work = VecDeque::new();
                let children = el
                    .children
                    .iter()
                    .map(|child| self.reconcile_one(&node, &mut work, child))
                    .collect();
                MountedNode {
                    node,
                    key: el.key.clone(),
                    content: MountedContent::Element {
                        tag: el.tag.clone(),
                        attrs: el.attrs.clone(),
                        style: el.style.clone(),
                        children,
                    },
                }
            }
            VNode::Component(component) => {
                let rendered_vnode = (component.render)();
                let rendered = self.create(&rendered_vnode);
                MountedNode {
                    node: rendered.node.clone(),
                    key: component.key.clone(),
                    content: MountedContent::Component {
                        rendered: Box::new(rendered),
                    },
                }
            }
        }
    }

    fn update(
        &self,
        host: &D::Node,
        old: MountedNode<D::Node>,
        new_child: &VNode,
    ) -> MountedNode<D::Node> {
        match (old.content, new_child) {
            (MountedContent::Text(old_text), VNode::Text(new_text)) => {
                if old_text != *new_text {
                    self.driver.set_text(&old.node, new_text);
                }
                MountedNode {
                    node: old.node,
                    key: None,
                    content: MountedContent::Text(new_text.clone()),
                }
            }
            (
                MountedContent::Element {
                    attrs: old_attrs,
                    style: old_style,
                    children: old_children,
                    ..
                },
                VNode::Element(new_el),
            ) => {
                self.diff_attrs(&old.node, &old_attrs, &new_el.attrs);
                self.diff_style(&old.node, &old_style, &new_el.style);

                let mut work: VecDeque<MountedNode<D::Node>> = old_children.into();
                let children = new_el
                    .children
                    .iter()
                    .map(|child| self.reconcile_one(&old.node, &mut work, child))
                    .collect::<Vec<_>>();
                for leftover in work {
                    self.driver.remove_child(&old.node, &leftover.node);
                }

                MountedNode {
                    node: old.node,
                    key: new_el.key.clone(),
                    content: MountedContent::Element {
                        tag: new_el.tag.clone(),
                        attrs: new_el.attrs.clone(),
                        style: new_el.style.clone(),
                        children,
                    },
                }
            }
            (MountedContent::Component { rendered }, VNode::Component(new_component)) => {
                let new_vnode = (new_component.render)();
                let updated = self.update(host, *rendered, &new_vnode);
                MountedNode {
                    node: updated.node.clone(),
                    key: new_component.key.clone(),
                    content: MountedContent::Component {
                        rendered: Box::new(updated),
                    },
                }
            }
            _ => unreachable!("tag_matches/front_reusable guarantee matching kinds here"),
        }
    }

    fn diff_attrs(&self, node: &D::Node, old: &[(String, AttrValue)], new: &[(String, AttrValue)]) {
        for (name, _) in old {
            if !new.iter().any(|(n, _)| n == name) {
                self.remove_attr(node, name);
            }
        }
        for (name, value) in new {
            let changed = old
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, old_value)| old_value != value)
                .unwrap_or(true);
            if changed || matches!(value, AttrValue::Handler(_)) {
                self.apply_attr(node, name, old.iter().find(|(n, _)| n == name), value);
            }
        }
    }

    fn apply_attr(
        &self,
        node: &D::Node,
        name: &str,
        _old: Option<&(String, AttrValue)>,
        value: &AttrValue,
    ) {
        match mode_of(name) {
            AttrMode::Property => self.driver.set_property(node, name, value),
            AttrMode::Attribute => self.driver.set_attribute(node, name, value),
            AttrMode::Data => self.driver.set_data_attribute(node, name, value),
            AttrMode::Event => {
                let handler = match value {
                    AttrValue::Handler(h) => Some(h.clone()),
                    _ => None,
                };
                self.driver
                    .set_event_handler(node, crate::attrs::event_name(name), handler);
            }
        }
    }

    fn remove_attr(&self, node: &D::Node, name: &str) {
        match mode_of(name) {
            AttrMode::Property => self.driver.set_property(node, name, &AttrValue::Bool(false)),
            AttrMode::Attribute => self.driver.remove_attribute(node, name),
            AttrMode::Data => self.driver.remove_data_attribute(node, name),
            AttrMode::Event => {
                self.driver
                    .set_event_handler(node, crate::attrs::event_name(name), None);
            }
        }
    }

    fn diff_style(&self, node: &D::Node, old: &Style, new: &Style) {
        for key in old.keys() {
            if !new.contains_key(key) {
                self.driver.set_style_property(node, key, None);
            }
        }
        for (key, value) in new {
            if old.get(key) != Some(value) {
                self.driver.set_style_property(node, key, Some(value));
            }
        }
    }
}

