//! Virtual node descriptors (spec §3's "Virtual node").

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::attrs::{AttrValue, KEY_ATTR, REF_ATTR, STYLE_ATTR};

/// A style declaration as a nested key/value diff target (spec: "`style`
/// is a nested diff (old vs new key union -> setter; missing keys
/// clear)").
pub type Style = BTreeMap<String, String>;

/// A single virtual node: `Text`, `Element`, or `Component`.
///
/// `Component` preserves one instance per tree position the way a keyed
/// `Element` does, but its payload is opaque to the reconciler — it is
/// realized once by calling `render` (the factory) and thereafter
/// diffed as whatever virtual tree that render produced, exactly as if
/// the caller had written that tree directly. `panel-widgets` is the
/// only consumer of this variant; `panel-vdom` itself never constructs
/// one.
#[derive(Clone)]
pub enum VNode {
    Text(String),
    Element(Box<ElementNode>),
    Component(Box<ComponentNode>),
}

#[derive(Clone, Default)]
pub struct ElementNode {
    pub tag: String,
    pub key: Option<String>,
    pub reference: Option<String>,
    pub attrs: Vec<(String, AttrValue)>,
    pub style: Style,
    pub children: Vec<VNode>,
}

#[derive(Clone)]
pub struct ComponentNode {
    pub key: Option<String>,
    pub render: Rc<dyn Fn() -> VNode>,
}

impl VNode {
    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text(content.into())
    }

    pub fn element(tag: impl Into<String>) -> ElementBuilder {
        ElementBuilder {
            node: ElementNode {
                tag: tag.into(),
                ..Default::default()
            },
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Text(_) => None,
            VNode::Element(el) => el.key.as_deref(),
            VNode::Component(c) => c.key.as_deref(),
        }
    }

    /// Whether `self` and `other` are eligible for an in-place update
    /// rather than being treated as unrelated nodes (spec step 3:
    /// "old-at-i has a different tag or type" gate, and edge case (c): a
    /// keyed element whose tag changes is a fresh element).
    pub fn same_kind(&self, other: &VNode) -> bool {
        match (self, other) {
            (VNode::Text(_), VNode::Text(_)) => true,
            (VNode::Element(a), VNode::Element(b)) => a.tag == b.tag,
            (VNode::Component(_), VNode::Component(_)) => true,
            _ => false,
        }
    }
}

/// Fluent constructor mirroring the `ui!`-adjacent call sites this
/// crate's callers (panel-widgets) build trees with by hand.
pub struct ElementBuilder {
    node: ElementNode,
}

impl ElementBuilder {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.node.key = Some(key.into());
        self
    }

    pub fn reference(mut self, name: impl Into<String>) -> Self {
        self.node.reference = Some(name.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        let name = name.into();
        match name.as_str() {
            KEY_ATTR => self.node.key = Some(text_of(&value)),
            REF_ATTR => self.node.reference = Some(text_of(&value)),
            _ => self.node.attrs.push((name, value)),
        }
        self
    }

    pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.node.style.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: VNode) -> Self {
        self.node.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.node.children.extend(children);
        self
    }

    pub fn build(self) -> VNode {
        VNode::Element(Box::new(self.node))
    }
}

fn text_of(value: &AttrValue) -> String {
    match value {
        AttrValue::Text(s) => s.clone(),
        AttrValue::Bool(b) => b.to_string(),
        AttrValue::Number(n) => n.to_string(),
        AttrValue::Handler(_) => String::new(),
    }
}

/// `attrs.key`/`attrs.ref` are reconciler-private and must never reach
/// [`AttrMode`] resolution even if a caller bypasses [`ElementBuilder`]
/// and constructs an [`ElementNode`] directly.
pub const _RESERVED_NAMES: [&str; 3] = [KEY_ATTR, REF_ATTR, STYLE_ATTR];
