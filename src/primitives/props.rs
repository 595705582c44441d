//! Primitive types - Props, prop values and callbacks.
//!
//! Props are an ordered map from attribute/event name to [`PropValue`].
//! A few names are control metadata rather than attributes:
//! - `key` - identity inside a child list
//! - `ref` - callback receiving the live handle
//! - `on*` (with more than one character after `on`) - event bindings
//! - `xmlns` - element namespace

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::Node;
use crate::engine::InstanceId;
use crate::error::HookResult;
use crate::types::{is_foreign_namespace, Event, Handle, Scalar};

// =============================================================================
// Callback Types
// =============================================================================

/// Event handler callback (Rc so the same handler can be shared across renders).
pub type EventHandler = Rc<dyn Fn(&Event) -> HookResult>;

/// Ref callback: receives the freshly created live handle and the owning
/// component instance, if any.
pub type RefCallback = Rc<dyn Fn(Handle, Option<InstanceId>)>;

/// Object-valued prop (inline style maps and the like).
pub type ObjectMap = IndexMap<String, Scalar>;

// =============================================================================
// Event Binding
// =============================================================================

/// What an `on*` prop binds to.
#[derive(Clone)]
pub enum EventBinding {
    /// Plain handler.
    Handler(EventHandler),
    /// Bind-to-state sugar: on dispatch, the event value (or the target's
    /// `attribute` when the event carries none) is written into
    /// `state[property]` and the owning component re-renders.
    Bind { property: String, attribute: String },
}

impl EventBinding {
    /// Same binding: identical handler, or an identical bind description.
    pub fn same(&self, other: &EventBinding) -> bool {
        match (self, other) {
            (EventBinding::Handler(a), EventBinding::Handler(b)) => Rc::ptr_eq(a, b),
            (
                EventBinding::Bind { property: pa, attribute: aa },
                EventBinding::Bind { property: pb, attribute: ab },
            ) => pa == pb && aa == ab,
            _ => false,
        }
    }
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventBinding::Handler(_) => f.write_str("Handler(..)"),
            EventBinding::Bind { property, attribute } => f
                .debug_struct("Bind")
                .field("property", property)
                .field("attribute", attribute)
                .finish(),
        }
    }
}

// =============================================================================
// Prop Value
// =============================================================================

/// A single prop value.
#[derive(Clone)]
pub enum PropValue {
    Null,
    Scalar(Scalar),
    Object(ObjectMap),
    Event(EventBinding),
    Ref(RefCallback),
}

impl PropValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    /// Value equality for data, identity for callbacks.
    pub fn same(&self, other: &PropValue) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Scalar(a), PropValue::Scalar(b)) => a == b,
            (PropValue::Object(a), PropValue::Object(b)) => a == b,
            (PropValue::Event(a), PropValue::Event(b)) => a.same(b),
            (PropValue::Ref(a), PropValue::Ref(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            PropValue::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => f.write_str("Null"),
            PropValue::Scalar(s) => write!(f, "{s:?}"),
            PropValue::Object(o) => write!(f, "{o:?}"),
            PropValue::Event(e) => write!(f, "{e:?}"),
            PropValue::Ref(_) => f.write_str("Ref(..)"),
        }
    }
}

impl<T: Into<Scalar>> From<T> for PropValue {
    fn from(value: T) -> Self {
        PropValue::Scalar(value.into())
    }
}

impl From<ObjectMap> for PropValue {
    fn from(value: ObjectMap) -> Self {
        PropValue::Object(value)
    }
}

impl From<EventBinding> for PropValue {
    fn from(value: EventBinding) -> Self {
        PropValue::Event(value)
    }
}

// =============================================================================
// Name classification
// =============================================================================

/// `on` followed by more than one character.
#[inline]
pub fn is_event_name(name: &str) -> bool {
    name.len() > 3 && name.starts_with("on")
}

/// `onClick` -> `click`.
pub fn event_name(name: &str) -> String {
    name[2..].to_lowercase()
}

/// Names and values that are control metadata, never surface attributes.
pub fn is_reserved(name: &str, value: &PropValue) -> bool {
    if name == "key" || name == "ref" || is_event_name(name) {
        return true;
    }
    match value {
        PropValue::Scalar(Scalar::Str(s)) => is_foreign_namespace(s),
        PropValue::Ref(_) | PropValue::Event(_) => true,
        _ => false,
    }
}

// =============================================================================
// Props
// =============================================================================

/// Ordered props map plus the children passed through to a component.
#[derive(Clone, Default)]
pub struct Props {
    entries: IndexMap<String, PropValue>,
    children: Vec<Node>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a prop.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Builder: set the `key`.
    pub fn with_key(self, key: impl Into<Scalar>) -> Self {
        self.with("key", PropValue::Scalar(key.into()))
    }

    /// Builder: set the `ref` callback.
    pub fn with_ref(mut self, f: impl Fn(Handle, Option<InstanceId>) + 'static) -> Self {
        self.entries.insert("ref".to_string(), PropValue::Ref(Rc::new(f)));
        self
    }

    /// Builder: bind an event handler. `event` is the bare name (`"click"`).
    pub fn on(
        mut self,
        event: &str,
        handler: impl Fn(&Event) -> HookResult + 'static,
    ) -> Self {
        self.entries.insert(
            on_name(event),
            PropValue::Event(EventBinding::Handler(Rc::new(handler))),
        );
        self
    }

    /// Builder: bind an existing shared handler.
    pub fn on_shared(mut self, event: &str, handler: EventHandler) -> Self {
        self.entries
            .insert(on_name(event), PropValue::Event(EventBinding::Handler(handler)));
        self
    }

    /// Builder: bind-to-state sugar, see [`EventBinding::Bind`].
    pub fn bind(mut self, event: &str, property: &str, attribute: &str) -> Self {
        self.entries.insert(
            on_name(event),
            PropValue::Event(EventBinding::Bind {
                property: property.to_string(),
                attribute: attribute.to_string(),
            }),
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        self.entries.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries (children are not counted).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `key` prop as a string.
    pub fn key(&self) -> Option<String> {
        match self.entries.get("key") {
            Some(PropValue::Scalar(s)) => Some(s.to_string()),
            _ => None,
        }
    }

    /// The `xmlns` prop.
    pub fn namespace(&self) -> Option<&str> {
        match self.entries.get("xmlns") {
            Some(PropValue::Scalar(Scalar::Str(ns))) => Some(ns.as_str()),
            _ => None,
        }
    }

    /// Scalar prop as text.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).and_then(PropValue::as_scalar).map(Scalar::to_string)
    }

    pub fn ref_callback(&self) -> Option<&RefCallback> {
        match self.entries.get("ref") {
            Some(PropValue::Ref(f)) => Some(f),
            _ => None,
        }
    }

    /// Children passed through to a component.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn set_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

fn on_name(event: &str) -> String {
    let mut chars = event.chars();
    match chars.next() {
        Some(first) => format!("on{}{}", first.to_uppercase(), chars.as_str()),
        None => "on".to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
