//! Node - The declarative tree applications describe.
//!
//! A [`Node`] is a plain value: cheap to clone (props sit behind an `Rc`),
//! built with the constructors below and handed to the
//! [`Runtime`](crate::pipeline::Runtime), which interns it into its arena.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::primitives::{Node, Props};
//!
//! let list = Node::element(
//!     "ul",
//!     Props::new().with("class", "todos"),
//!     ["a", "b"].map(|k| Node::element("li", Props::new().with_key(k), [Node::text(k)])),
//! );
//! ```

use std::rc::Rc;

use super::component::{Component, ComponentType, Rendered, State};
use super::props::{PropValue, Props};
use crate::types::{Scalar, NS_MATH, NS_SVG};

/// Tag of the placeholder element rendered for "nothing".
pub const EMPTY_TAG: &str = "noscript";

/// A declarative node.
#[derive(Clone, Debug)]
pub enum Node {
    /// Tagged surface element.
    Element {
        tag: String,
        props: Rc<Props>,
        children: Vec<Node>,
    },
    /// Component placeholder, resolved to its rendered tree on materialization.
    Component {
        ty: ComponentType,
        props: Rc<Props>,
        children: Vec<Node>,
    },
    /// Ordered group of children without a wrapper element.
    Fragment(Vec<Node>),
    /// Character data.
    Text(Scalar),
}

impl Node {
    /// Element node. `svg` and `math` get their namespace unless `xmlns` is given.
    pub fn element(
        tag: impl Into<String>,
        props: impl Into<Rc<Props>>,
        children: impl IntoIterator<Item = Node>,
    ) -> Node {
        let tag = tag.into();
        let mut props = props.into();
        if props.namespace().is_none() {
            let namespace = match tag.as_str() {
                "svg" => Some(NS_SVG),
                "math" => Some(NS_MATH),
                _ => None,
            };
            if let Some(ns) = namespace {
                Rc::make_mut(&mut props).insert("xmlns", ns);
            }
        }
        Node::Element {
            tag,
            props,
            children: children.into_iter().collect(),
        }
    }

    pub fn text(value: impl Into<Scalar>) -> Node {
        Node::Text(value.into())
    }

    pub fn fragment(children: impl IntoIterator<Item = Node>) -> Node {
        Node::Fragment(children.into_iter().collect())
    }

    /// The canonical empty node.
    pub fn empty() -> Node {
        Node::element(EMPTY_TAG, Props::new(), [])
    }

    /// Component node for a `Default`-constructible component.
    pub fn component<C: Component + Default>(props: impl Into<Rc<Props>>) -> Node {
        Node::with_type(ComponentType::of::<C>(), props, [])
    }

    /// Component node built by `factory`. Every node created from the same
    /// closure expression shares one component type.
    pub fn factory<F, C>(factory: F, props: impl Into<Rc<Props>>) -> Node
    where
        F: Fn(&Props) -> C + 'static,
        C: Component,
    {
        Node::with_type(ComponentType::factory(factory), props, [])
    }

    /// Function component: a render function without state or hooks.
    pub fn function<F>(render: F, props: impl Into<Rc<Props>>) -> Node
    where
        F: Fn(&Props, &State) -> Rendered + 'static,
    {
        Node::with_type(ComponentType::function(render), props, [])
    }

    /// Component node with passed-through children.
    pub fn with_type(
        ty: ComponentType,
        props: impl Into<Rc<Props>>,
        children: impl IntoIterator<Item = Node>,
    ) -> Node {
        Node::Component {
            ty,
            props: props.into(),
            children: children.into_iter().collect(),
        }
    }

    /// Replace the children (ignored for Text).
    pub fn with_children(mut self, new_children: impl IntoIterator<Item = Node>) -> Node {
        match &mut self {
            Node::Element { children, .. }
            | Node::Component { children, .. }
            | Node::Fragment(children) => *children = new_children.into_iter().collect(),
            Node::Text(_) => {}
        }
        self
    }

    /// Set the `key` prop (ignored for Fragment and Text).
    pub fn with_key(mut self, key: impl Into<Scalar>) -> Node {
        if let Node::Element { props, .. } | Node::Component { props, .. } = &mut self {
            Rc::make_mut(props).insert("key", PropValue::Scalar(key.into()));
        }
        self
    }

    pub fn props(&self) -> Option<&Rc<Props>> {
        match self {
            Node::Element { props, .. } | Node::Component { props, .. } => Some(props),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<String> {
        self.props().and_then(|p| p.key())
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. }
            | Node::Component { children, .. }
            | Node::Fragment(children) => children,
            Node::Text(_) => &[],
        }
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Node::Text(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::text(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::text(value)
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::text(value)
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::text(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(children: Vec<Node>) -> Self {
        Node::Fragment(children)
    }
}
