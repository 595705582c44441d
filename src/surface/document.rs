//! Document - In-memory surface.
//!
//! Nodes live in a flat vector indexed by [`Handle`]; handles are never
//! reused. Every mutation is recorded in a log so callers can count exactly
//! what a reconciliation pass did to the surface.

use indexmap::IndexMap;

use super::{Listener, Surface};
use crate::error::{Error, Result};
use crate::primitives::ObjectMap;
use crate::types::Handle;

// =============================================================================
// Mutation Log
// =============================================================================

/// One recorded surface operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateElement { node: Handle, tag: String },
    CreateText { node: Handle, text: String },
    CreateFragment { node: Handle },
    Clone { source: Handle, node: Handle },
    Append { parent: Handle, child: Handle },
    Insert { parent: Handle, child: Handle, before: Handle },
    /// Append or insert of a node that was already a child of `parent`.
    Move { parent: Handle, child: Handle, before: Option<Handle> },
    Remove { parent: Handle, child: Handle },
    Replace { parent: Handle, new: Handle, old: Handle },
    Clear { parent: Handle },
    SetText { node: Handle, text: String },
    SetAttribute { node: Handle, name: String, value: String },
    RemoveAttribute { node: Handle, name: String },
    SetObject { node: Handle, name: String },
    MergeObject { node: Handle, name: String },
    SetListener { node: Handle, event: String },
    RemoveListener { node: Handle, event: String },
}

impl Mutation {
    /// Creates a node.
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Mutation::CreateElement { .. }
                | Mutation::CreateText { .. }
                | Mutation::CreateFragment { .. }
                | Mutation::Clone { .. }
        )
    }

    /// Changes the shape of the tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::Append { .. }
                | Mutation::Insert { .. }
                | Mutation::Move { .. }
                | Mutation::Remove { .. }
                | Mutation::Replace { .. }
                | Mutation::Clear { .. }
        )
    }
}

// =============================================================================
// Nodes
// =============================================================================

#[derive(Debug, Clone)]
pub(super) enum Content {
    Element {
        tag: String,
        namespace: Option<String>,
    },
    Text(String),
    Fragment,
}

#[derive(Debug, Clone)]
pub(super) struct Attribute {
    pub(super) value: String,
    pub(super) namespace: Option<String>,
}

#[derive(Debug, Clone)]
pub(super) struct DocNode {
    pub(super) content: Content,
    pub(super) parent: Option<Handle>,
    pub(super) children: Vec<Handle>,
    pub(super) attributes: IndexMap<String, Attribute>,
    pub(super) objects: IndexMap<String, ObjectMap>,
    pub(super) listeners: IndexMap<String, Listener>,
}

impl DocNode {
    fn new(content: Content) -> Self {
        Self {
            content,
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            objects: IndexMap::new(),
            listeners: IndexMap::new(),
        }
    }

    fn is_fragment(&self) -> bool {
        matches!(self.content, Content::Fragment)
    }
}

// =============================================================================
// Document
// =============================================================================

/// In-memory DOM-like surface.
#[derive(Debug, Default)]
pub struct Document {
    pub(super) nodes: Vec<DocNode>,
    log: Vec<Mutation>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every mutation since the log was last taken.
    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    /// Object-valued property of an element.
    pub fn object_property(&self, node: Handle, name: &str) -> Option<&ObjectMap> {
        self.nodes.get(node.0 as usize)?.objects.get(name)
    }

    /// Namespace an element was created in.
    pub fn namespace(&self, node: Handle) -> Option<&str> {
        match &self.nodes.get(node.0 as usize)?.content {
            Content::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// Namespace an attribute was written with.
    pub fn attribute_namespace(&self, node: Handle, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0 as usize)?
            .attributes
            .get(name)?
            .namespace
            .as_deref()
    }

    /// Concatenated character data of a subtree.
    pub fn text_content(&self, node: Handle) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: Handle, out: &mut String) {
        let Some(entry) = self.nodes.get(node.0 as usize) else {
            return;
        };
        match &entry.content {
            Content::Text(text) => out.push_str(text),
            _ => {
                for &child in &entry.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn push(&mut self, content: Content) -> Handle {
        let handle = Handle(self.nodes.len() as u32);
        self.nodes.push(DocNode::new(content));
        handle
    }

    fn node(&self, handle: Handle) -> Result<&DocNode> {
        self.nodes
            .get(handle.0 as usize)
            .ok_or(Error::UnknownHandle(handle))
    }

    fn node_mut(&mut self, handle: Handle) -> Result<&mut DocNode> {
        self.nodes
            .get_mut(handle.0 as usize)
            .ok_or(Error::UnknownHandle(handle))
    }

    fn position(&self, parent: Handle, child: Handle) -> Result<usize> {
        self.node(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(Error::NotAChild { parent, child })
    }

    fn detach(&mut self, child: Handle) -> Result<()> {
        if let Some(parent) = self.node(child)?.parent {
            let index = self.position(parent, child)?;
            self.node_mut(parent)?.children.remove(index);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    /// Attach at `index`; a fragment hands over its children.
    fn attach(&mut self, parent: Handle, child: Handle, index: usize) -> Result<()> {
        let moved = if self.node(child)?.is_fragment() {
            std::mem::take(&mut self.node_mut(child)?.children)
        } else {
            self.detach(child)?;
            vec![child]
        };
        for (offset, &node) in moved.iter().enumerate() {
            self.node_mut(node)?.parent = Some(parent);
            self.node_mut(parent)?.children.insert(index + offset, node);
        }
        Ok(())
    }

    fn is_child_of(&self, parent: Handle, child: Handle) -> bool {
        self.nodes
            .get(child.0 as usize)
            .is_some_and(|node| node.parent == Some(parent))
    }

    fn copy(&mut self, node: Handle, deep: bool) -> Result<Handle> {
        let source = self.node(node)?;
        let mut copy = DocNode::new(source.content.clone());
        copy.attributes = source.attributes.clone();
        copy.objects = source.objects.clone();
        let children = if deep { source.children.clone() } else { Vec::new() };

        let handle = Handle(self.nodes.len() as u32);
        self.nodes.push(copy);
        for child in children {
            let child_copy = self.copy(child, true)?;
            self.node_mut(child_copy)?.parent = Some(handle);
            self.node_mut(handle)?.children.push(child_copy);
        }
        Ok(handle)
    }
}

impl Surface for Document {
    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Handle {
        let node = self.push(Content::Element {
            tag: tag.to_string(),
            namespace: namespace.map(str::to_string),
        });
        self.log.push(Mutation::CreateElement {
            node,
            tag: tag.to_string(),
        });
        node
    }

    fn create_text(&mut self, text: &str) -> Handle {
        let node = self.push(Content::Text(text.to_string()));
        self.log.push(Mutation::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    fn create_fragment(&mut self) -> Handle {
        let node = self.push(Content::Fragment);
        self.log.push(Mutation::CreateFragment { node });
        node
    }

    fn clone_node(&mut self, source: Handle, deep: bool) -> Result<Handle> {
        let node = self.copy(source, deep)?;
        self.log.push(Mutation::Clone { source, node });
        Ok(node)
    }

    fn contains(&self, node: Handle) -> bool {
        (node.0 as usize) < self.nodes.len()
    }

    fn parent(&self, node: Handle) -> Option<Handle> {
        self.nodes.get(node.0 as usize)?.parent
    }

    fn children(&self, node: Handle) -> Result<&[Handle]> {
        Ok(&self.node(node)?.children)
    }

    fn append_child(&mut self, parent: Handle, child: Handle) -> Result<()> {
        let mutation = if self.is_child_of(parent, child) {
            Mutation::Move {
                parent,
                child,
                before: None,
            }
        } else {
            Mutation::Append { parent, child }
        };
        self.detach(child)?;
        let end = self.node(parent)?.children.len();
        self.attach(parent, child, end)?;
        self.log.push(mutation);
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: Handle,
        child: Handle,
        before: Option<Handle>,
    ) -> Result<()> {
        let Some(before) = before else {
            return self.append_child(parent, child);
        };
        if before == child {
            return Ok(());
        }
        self.position(parent, before)?;

        let mutation = if self.is_child_of(parent, child) {
            Mutation::Move {
                parent,
                child,
                before: Some(before),
            }
        } else {
            Mutation::Insert {
                parent,
                child,
                before,
            }
        };
        self.detach(child)?;
        let index = self.position(parent, before)?;
        self.attach(parent, child, index)?;
        self.log.push(mutation);
        Ok(())
    }

    fn remove_child(&mut self, parent: Handle, child: Handle) -> Result<()> {
        let index = self.position(parent, child)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(child)?.parent = None;
        self.log.push(Mutation::Remove { parent, child });
        Ok(())
    }

    fn replace_child(&mut self, parent: Handle, new: Handle, old: Handle) -> Result<()> {
        let index = self.position(parent, old)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(old)?.parent = None;
        if self.is_child_of(parent, new) {
            let from = self.position(parent, new)?;
            self.node_mut(parent)?.children.remove(from);
            self.node_mut(new)?.parent = None;
            let index = if from < index { index - 1 } else { index };
            self.attach(parent, new, index)?;
        } else {
            self.attach(parent, new, index)?;
        }
        self.log.push(Mutation::Replace { parent, new, old });
        Ok(())
    }

    fn clear_children(&mut self, parent: Handle) -> Result<()> {
        let children = std::mem::take(&mut self.node_mut(parent)?.children);
        for child in children {
            self.node_mut(child)?.parent = None;
        }
        self.log.push(Mutation::Clear { parent });
        Ok(())
    }

    fn tag(&self, node: Handle) -> Option<&str> {
        match &self.nodes.get(node.0 as usize)?.content {
            Content::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    fn text(&self, node: Handle) -> Option<&str> {
        match &self.nodes.get(node.0 as usize)?.content {
            Content::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    fn set_text(&mut self, node: Handle, text: &str) -> Result<()> {
        match &mut self.node_mut(node)?.content {
            Content::Text(current) => *current = text.to_string(),
            _ => return Err(Error::UnknownHandle(node)),
        }
        self.log.push(Mutation::SetText {
            node,
            text: text.to_string(),
        });
        Ok(())
    }

    fn attribute(&self, node: Handle, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0 as usize)?
            .attributes
            .get(name)
            .map(|a| a.value.as_str())
    }

    fn set_attribute(
        &mut self,
        node: Handle,
        name: &str,
        value: &str,
        namespace: Option<&str>,
    ) -> Result<()> {
        self.node_mut(node)?.attributes.insert(
            name.to_string(),
            Attribute {
                value: value.to_string(),
                namespace: namespace.map(str::to_string),
            },
        );
        self.log.push(Mutation::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(
        &mut self,
        node: Handle,
        name: &str,
        _namespace: Option<&str>,
    ) -> Result<()> {
        let entry = self.node_mut(node)?;
        let removed =
            entry.attributes.shift_remove(name).is_some() | entry.objects.shift_remove(name).is_some();
        if removed {
            self.log.push(Mutation::RemoveAttribute {
                node,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn has_object_property(&self, node: Handle, name: &str) -> bool {
        self.nodes
            .get(node.0 as usize)
            .is_some_and(|n| n.objects.contains_key(name))
    }

    fn set_object_property(&mut self, node: Handle, name: &str, value: &ObjectMap) -> Result<()> {
        self.node_mut(node)?
            .objects
            .insert(name.to_string(), value.clone());
        self.log.push(Mutation::SetObject {
            node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn merge_object_property(
        &mut self,
        node: Handle,
        name: &str,
        value: &ObjectMap,
    ) -> Result<()> {
        let target = self.node_mut(node)?.objects.entry(name.to_string()).or_default();
        for (key, v) in value {
            target.insert(key.clone(), v.clone());
        }
        self.log.push(Mutation::MergeObject {
            node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_listener(&mut self, node: Handle, event: &str, listener: Listener) -> Result<()> {
        self.node_mut(node)?
            .listeners
            .insert(event.to_string(), listener);
        self.log.push(Mutation::SetListener {
            node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn remove_listener(&mut self, node: Handle, event: &str) -> Result<()> {
        if self.node_mut(node)?.listeners.shift_remove(event).is_some() {
            self.log.push(Mutation::RemoveListener {
                node,
                event: event.to_string(),
            });
        }
        Ok(())
    }

    fn listener(&self, node: Handle, event: &str) -> Option<Listener> {
        self.nodes.get(node.0 as usize)?.listeners.get(event).cloned()
    }
}

// =============================================================================
// Tests
// =============================================================================
