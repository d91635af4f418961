//! Attribute values and the mode table that decides how each attribute
//! name is applied to a live DOM node.
//!
//! Each name maps to property-set, attribute-set, event-handler-set, or
//! data-set. The table below is a `phf` static map, so the mode for any
//! of the handful of attributes special-cased here is a zero-allocation
//! compile-time lookup; anything not in the table, and anything starting
//! with `data-`, falls back to attribute-set/data-set respectively.

use std::cell::RefCell;
use std::rc::Rc;

/// A DOM event delivered to a [`AttrValue::Handler`] closure.
///
/// On `wasm32` this wraps the real `web_sys::Event`; off it, a minimal
/// stand-in so reconciler logic (which never needs to *read* the event,
/// only to attach/detach the closure) can be exercised with a plain
/// `#[test]`.
#[derive(Debug, Clone)]
pub struct DomEvent {
    #[cfg(target_arch = "wasm32")]
    pub inner: web_sys::Event,
    #[cfg(not(target_arch = "wasm32"))]
    pub kind: &'static str,
}

pub type EventHandler = Rc<RefCell<dyn FnMut(DomEvent)>>;

/// Wrap a plain closure into an [`EventHandler`].
pub fn handler(f: impl FnMut(DomEvent) + 'static) -> EventHandler {
    Rc::new(RefCell::new(f))
}

/// One attribute's value, tagged by the shape of thing it holds rather
/// than by the mode it will be applied with — the mode comes from
/// [`mode_of`], keyed on the attribute *name*.
#[derive(Clone)]
pub enum AttrValue {
    Text(String),
    Bool(bool),
    Number(f64),
    Handler(EventHandler),
}

impl std::fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "Text({s:?})"),
            AttrValue::Bool(b) => write!(f, "Bool({b})"),
            AttrValue::Number(n) => write!(f, "Number({n})"),
            AttrValue::Handler(_) => write!(f, "Handler(..)"),
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Text(a), AttrValue::Text(b)) => a == b,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Number(a), AttrValue::Number(b)) => a == b,
            // Handlers are never equal-by-value: "event-handler modes
            // replace rather than add/remove listeners", so the
            // reconciler always reattaches rather than asking whether
            // two closures are "the same".
            (AttrValue::Handler(_), AttrValue::Handler(_)) => false,
            _ => false,
        }
    }
}

/// How an attribute name is applied to a live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrMode {
    /// Set as a JS property on the element (`el.value = ...`).
    Property,
    /// Set/removed via `setAttribute`/`removeAttribute`.
    Attribute,
    /// Attached/replaced as an event listener; name has any leading `on`
    /// stripped before this mode is chosen (`onclick` -> mode for `click`).
    Event,
    /// Set via `dataset` (`data-*`).
    Data,
}

/// Attributes with special meaning to the reconciler itself, never
/// forwarded to the driver.
pub const KEY_ATTR: &str = "key";
pub const REF_ATTR: &str = "ref";
pub const STYLE_ATTR: &str = "style";

static PROPERTY_NAMES: phf::Set<&'static str> = phf::phf_set! {
    "value", "checked", "selected", "disabled", "readOnly", "className",
    "innerHTML", "textContent", "id", "tabIndex",
};

/// Resolve the application mode for attribute `name`. `style` and the
/// reconciler-private `key`/`ref` are handled by the caller before this
/// is ever consulted.
pub fn mode_of(name: &str) -> AttrMode {
    if let Some(event) = name.strip_prefix("on") {
        debug_assert!(!event.is_empty(), "bare \"on\" is not a valid event attribute");
        return AttrMode::Event;
    }
    if name.starts_with("data-") {
        return AttrMode::Data;
    }
    if PROPERTY_NAMES.contains(name) {
        return AttrMode::Property;
    }
    AttrMode::Attribute
}

/// Strip the `on` prefix used to recognize event attributes, yielding the
/// bare event name (`onclick` -> `click`) the driver registers the
/// listener under.
pub fn event_name(attr_name: &str) -> &str {
    attr_name.strip_prefix("on").unwrap_or(attr_name)
}
