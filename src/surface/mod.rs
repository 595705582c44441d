//! Surface - The live render target.
//!
//! The reconciler only ever talks to a [`Surface`]: it creates nodes, moves
//! them around and writes attributes and listeners, all through opaque
//! [`Handle`]s. [`Document`] is the in-memory implementation, with a mutation
//! log and a markup serializer.
//!
//! # Fragments
//!
//! A fragment is a detached grouping container. Attaching it (append, insert
//! or replace) moves its children into the target parent and leaves the
//! fragment empty.

mod document;
mod markup;

pub use document::{Document, Mutation};
pub use markup::escape;

use std::fmt;

use crate::engine::InstanceId;
use crate::error::Result;
use crate::primitives::{EventHandler, ObjectMap};
use crate::types::Handle;

/// What a live node does when an event is dispatched to it.
#[derive(Clone)]
pub enum Listener {
    Handler(EventHandler),
    /// Write the event value (or `attribute` of the target) into the
    /// instance's `state[property]`, then re-render the instance.
    BindState {
        instance: InstanceId,
        property: String,
        attribute: String,
    },
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Handler(_) => f.write_str("Handler(..)"),
            Listener::BindState {
                instance,
                property,
                attribute,
            } => f
                .debug_struct("BindState")
                .field("instance", instance)
                .field("property", property)
                .field("attribute", attribute)
                .finish(),
        }
    }
}

/// A live render target.
pub trait Surface {
    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Handle;

    fn create_text(&mut self, text: &str) -> Handle;

    fn create_fragment(&mut self) -> Handle;

    /// Detached copy of `node`; `deep` copies the whole subtree.
    fn clone_node(&mut self, node: Handle, deep: bool) -> Result<Handle>;

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    fn contains(&self, node: Handle) -> bool;

    fn parent(&self, node: Handle) -> Option<Handle>;

    fn children(&self, node: Handle) -> Result<&[Handle]>;

    fn child_at(&self, parent: Handle, index: usize) -> Option<Handle> {
        self.children(parent).ok()?.get(index).copied()
    }

    fn append_child(&mut self, parent: Handle, child: Handle) -> Result<()>;

    /// Insert before `before`, or append when `before` is `None`.
    fn insert_before(
        &mut self,
        parent: Handle,
        child: Handle,
        before: Option<Handle>,
    ) -> Result<()>;

    fn remove_child(&mut self, parent: Handle, child: Handle) -> Result<()>;

    fn replace_child(&mut self, parent: Handle, new: Handle, old: Handle) -> Result<()>;

    /// Detach every child of `parent`.
    fn clear_children(&mut self, parent: Handle) -> Result<()>;

    // -------------------------------------------------------------------------
    // Content
    // -------------------------------------------------------------------------

    /// Tag of an element, `None` for text and fragments.
    fn tag(&self, node: Handle) -> Option<&str>;

    /// Character data of a text node, `None` otherwise.
    fn text(&self, node: Handle) -> Option<&str>;

    fn set_text(&mut self, node: Handle, text: &str) -> Result<()>;

    fn attribute(&self, node: Handle, name: &str) -> Option<&str>;

    fn set_attribute(
        &mut self,
        node: Handle,
        name: &str,
        value: &str,
        namespace: Option<&str>,
    ) -> Result<()>;

    /// Remove an attribute or object property.
    fn remove_attribute(&mut self, node: Handle, name: &str, namespace: Option<&str>)
        -> Result<()>;

    fn has_object_property(&self, node: Handle, name: &str) -> bool;

    fn set_object_property(&mut self, node: Handle, name: &str, value: &ObjectMap) -> Result<()>;

    fn merge_object_property(
        &mut self,
        node: Handle,
        name: &str,
        value: &ObjectMap,
    ) -> Result<()>;

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    fn set_listener(&mut self, node: Handle, event: &str, listener: Listener) -> Result<()>;

    fn remove_listener(&mut self, node: Handle, event: &str) -> Result<()>;

    fn listener(&self, node: Handle, event: &str) -> Option<Listener>;
}
