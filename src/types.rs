//! Core types for spark-dom.
//!
//! These types define the foundation that everything builds on.
//! They flow through the reconciler and define what a live surface understands.

use std::fmt;

// =============================================================================
// Namespaces
// =============================================================================

/// SVG namespace URI.
pub const NS_SVG: &str = "http://www.w3.org/2000/svg";

/// MathML namespace URI.
pub const NS_MATH: &str = "http://www.w3.org/1998/Math/MathML";

/// XLink namespace URI (always used for `xlink:href`).
pub const NS_XLINK: &str = "http://www.w3.org/1999/xlink";

/// Returns true for the namespace URIs that switch attribute writes to the
/// namespaced attribute API.
#[inline]
pub fn is_foreign_namespace(namespace: &str) -> bool {
    namespace == NS_SVG || namespace == NS_MATH
}

// =============================================================================
// Handle - Live surface node reference
// =============================================================================

/// Opaque reference to a node living on a [`Surface`](crate::surface::Surface).
///
/// Handles are minted by the surface. The reconciler never inspects them beyond
/// equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u32);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Scalar - Text content and attribute values
// =============================================================================

/// A scalar value: what a Text node holds and what attributes are written from.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Number(f64),
    Bool(bool),
}

impl Scalar {
    /// Text content as rendered into character data.
    ///
    /// Booleans render as empty text.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Bool(_) => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Bool(b) => write!(f, "{b}"),
            // Integral numbers print without a trailing ".0"
            Scalar::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Scalar::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Scalar::Str(value.clone())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(f64::from(value))
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Number(f64::from(value))
    }
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

// =============================================================================
// PatchAction - Child pair classification
// =============================================================================

/// What the reconciler decided for one (new, old) child pair.
///
/// The numeric codes are stable; a list-patching caller never treats
/// [`PatchAction::NoOp`] as cause for action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchAction {
    /// Nothing to do at this level (equal, recursed, or short-circuited).
    NoOp,
    /// New side absent: detach the old node.
    Remove,
    /// Old side absent: materialize and attach the new node.
    Add,
    /// Both Text with differing values: rewrite character data in place.
    TextUpdate,
    /// Differing element/component type: swap the live node.
    Replace,
    /// Keyed pair inside a child list: defer to keyed reconciliation.
    Key,
}

impl PatchAction {
    /// Stable numeric code (0..=5).
    pub const fn code(self) -> u8 {
        match self {
            PatchAction::NoOp => 0,
            PatchAction::Remove => 1,
            PatchAction::Add => 2,
            PatchAction::TextUpdate => 3,
            PatchAction::Replace => 4,
            PatchAction::Key => 5,
        }
    }
}

// =============================================================================
// Lifecycle Hooks (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// The optional lifecycle hooks a component implements.
    ///
    /// The runtime only calls a hook when its flag is declared by
    /// [`Component::hooks`](crate::primitives::Component::hooks).
    /// Combine with bitwise OR: `LifecycleHooks::DID_MOUNT | LifecycleHooks::WILL_UNMOUNT`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LifecycleHooks: u8 {
        const WILL_MOUNT = 1 << 0;
        const DID_MOUNT = 1 << 1;
        const WILL_UNMOUNT = 1 << 2;
        const SHOULD_UPDATE = 1 << 3;
        const WILL_UPDATE = 1 << 4;
        const DID_UPDATE = 1 << 5;
    }
}

// =============================================================================
// Event
// =============================================================================

/// An event dispatched to a live node.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Lowercase event name without the `on` prefix (e.g. `"click"`).
    pub name: String,
    /// Live node the event was dispatched on.
    pub target: Handle,
    /// Value carried by the event (e.g. an input's current value).
    pub value: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, target: Handle) -> Self {
        Self {
            name: name.into(),
            target,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
