//! Tree - The interned node arena.
//!
//! Declarative [`Node`]s are interned into [`VNode`] records addressed by a
//! generational [`NodeId`]. Records carry the mutable back-references the
//! reconciler maintains:
//! - `handle` - live counterpart, `Some` iff mounted (never set on Component
//!   nodes; their handle is their rendered root's)
//! - `owner` - the component instance a Component node stands for
//! - `slot` - scratch index used during keyed reconciliation
//!
//! Ids are never reused with the same generation, so a stale id held by a
//! scheduled task or a user simply stops resolving once its record is freed.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use super::arena::{Arena, Index};
use super::InstanceId;
use crate::error::{Error, Result};
use crate::primitives::{ComponentType, Node, Props};
use crate::types::{Handle, Scalar};

// =============================================================================
// Ids & Records
// =============================================================================

/// Stable id of an interned node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}v{}", self.0.slot(), self.0.generation())
    }
}

/// Variant-specific data of an interned node.
#[derive(Debug, Clone)]
pub enum VKind {
    Element {
        tag: String,
        props: Rc<Props>,
        children: Vec<NodeId>,
    },
    Component {
        ty: ComponentType,
        props: Rc<Props>,
        children: Vec<Node>,
        /// Rendered root, `None` until resolved.
        rendered: Option<NodeId>,
    },
    Fragment {
        children: Vec<NodeId>,
    },
    Text(Scalar),
}

/// What two nodes must share to be patched rather than replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Element(String),
    Component(TypeId),
    Fragment,
    Text,
}

/// An interned node.
#[derive(Debug, Clone)]
pub struct VNode {
    pub kind: VKind,
    pub handle: Option<Handle>,
    pub owner: Option<InstanceId>,
    pub slot: Option<usize>,
}

impl VNode {
    fn new(kind: VKind) -> Self {
        Self {
            kind,
            handle: None,
            owner: None,
            slot: None,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            VKind::Element { tag, .. } => NodeType::Element(tag.clone()),
            VKind::Component { ty, .. } => NodeType::Component(ty.id()),
            VKind::Fragment { .. } => NodeType::Fragment,
            VKind::Text(_) => NodeType::Text,
        }
    }

    pub fn props(&self) -> Option<&Rc<Props>> {
        match &self.kind {
            VKind::Element { props, .. } | VKind::Component { props, .. } => Some(props),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<String> {
        self.props().and_then(|p| p.key())
    }

    /// Interned children (empty for Component and Text).
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            VKind::Element { children, .. } | VKind::Fragment { children } => children,
            _ => &[],
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, VKind::Text(_))
    }

    pub fn is_component(&self) -> bool {
        matches!(self.kind, VKind::Component { .. })
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.kind, VKind::Fragment { .. })
    }
}

// =============================================================================
// Tree
// =============================================================================

/// Arena of interned nodes.
#[derive(Default)]
pub struct Tree {
    nodes: Arena<VNode>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    pub fn get(&self, id: NodeId) -> Result<&VNode> {
        self.nodes.get(id.0).ok_or(Error::StaleNode(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut VNode> {
        self.nodes.get_mut(id.0).ok_or(Error::StaleNode(id))
    }

    // -------------------------------------------------------------------------
    // Interning
    // -------------------------------------------------------------------------

    /// Intern a declarative node. Fragments nested directly inside a child
    /// list are flattened into it.
    pub fn intern(&mut self, node: Node) -> NodeId {
        let kind = match node {
            Node::Text(value) => VKind::Text(value),
            Node::Element {
                tag,
                props,
                children,
            } => VKind::Element {
                tag,
                props,
                children: self.intern_children(children),
            },
            Node::Fragment(children) => VKind::Fragment {
                children: self.intern_children(children),
            },
            Node::Component {
                ty,
                mut props,
                children,
            } => {
                if !children.is_empty() {
                    Rc::make_mut(&mut props).set_children(children.clone());
                }
                VKind::Component {
                    ty,
                    props,
                    children,
                    rendered: None,
                }
            }
        };
        NodeId(self.nodes.insert(VNode::new(kind)))
    }

    fn intern_children(&mut self, children: Vec<Node>) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(children.len());
        self.flatten_into(children, &mut ids);
        ids
    }

    fn flatten_into(&mut self, children: Vec<Node>, ids: &mut Vec<NodeId>) {
        for child in children {
            match child {
                Node::Fragment(nested) => self.flatten_into(nested, ids),
                other => ids.push(self.intern(other)),
            }
        }
    }

    /// Build an element record from already interned children. Children that
    /// are mounted elsewhere are cloned when this element is materialized.
    pub fn element(
        &mut self,
        tag: impl Into<String>,
        props: impl Into<Rc<Props>>,
        children: Vec<NodeId>,
    ) -> NodeId {
        NodeId(self.nodes.insert(VNode::new(VKind::Element {
            tag: tag.into(),
            props: props.into(),
            children,
        })))
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> Result<&VKind> {
        Ok(&self.get(id)?.kind)
    }

    pub fn node_type(&self, id: NodeId) -> Result<NodeType> {
        Ok(self.get(id)?.node_type())
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.get(id)?.children())
    }

    pub fn set_children(&mut self, id: NodeId, new_children: Vec<NodeId>) -> Result<()> {
        match &mut self.get_mut(id)?.kind {
            VKind::Element { children, .. } | VKind::Fragment { children } => {
                *children = new_children;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn props(&self, id: NodeId) -> Result<Option<Rc<Props>>> {
        Ok(self.get(id)?.props().cloned())
    }

    pub fn set_props(&mut self, id: NodeId, new_props: Rc<Props>) -> Result<()> {
        match &mut self.get_mut(id)?.kind {
            VKind::Element { props, .. } | VKind::Component { props, .. } => *props = new_props,
            _ => {}
        }
        Ok(())
    }

    pub fn key(&self, id: NodeId) -> Result<Option<String>> {
        Ok(self.get(id)?.key())
    }

    /// Follow Component nodes to the node that owns a live handle.
    /// Unresolved components resolve to themselves.
    pub fn effective(&self, mut id: NodeId) -> Result<NodeId> {
        loop {
            match &self.get(id)?.kind {
                VKind::Component {
                    rendered: Some(root),
                    ..
                } => id = *root,
                _ => return Ok(id),
            }
        }
    }

    /// Live handle of a node, following Component nodes.
    pub fn live(&self, id: NodeId) -> Result<Option<Handle>> {
        let effective = self.effective(id)?;
        Ok(self.get(effective)?.handle)
    }

    /// Mounted: holds (or resolves to) a live handle.
    pub fn is_mounted(&self, id: NodeId) -> bool {
        matches!(self.live(id), Ok(Some(_)))
    }

    /// Instances along a Component chain, outermost first.
    pub fn owner_chain(&self, mut id: NodeId) -> Result<Vec<InstanceId>> {
        let mut chain = Vec::new();
        loop {
            let node = self.get(id)?;
            if let Some(owner) = node.owner {
                chain.push(owner);
            }
            match &node.kind {
                VKind::Component {
                    rendered: Some(root),
                    ..
                } => id = *root,
                _ => return Ok(chain),
            }
        }
    }

    pub fn set_handle(&mut self, id: NodeId, handle: Option<Handle>) -> Result<()> {
        self.get_mut(id)?.handle = handle;
        Ok(())
    }

    pub fn set_slot(&mut self, id: NodeId, slot: Option<usize>) -> Result<()> {
        self.get_mut(id)?.slot = slot;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Release
    // -------------------------------------------------------------------------

    /// Free a node and everything below it (children and rendered roots).
    /// Returns the instances that were owned by freed Component nodes, outer
    /// first, so the caller can destroy them.
    pub fn release(&mut self, id: NodeId) -> Vec<InstanceId> {
        let mut owners = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.remove(id.0) else {
                continue;
            };
            owners.extend(node.owner);
            push_descendants(&node.kind, &mut stack);
        }
        owners
    }

    /// Free the parts of a freshly interned tree that the reconciler did not
    /// adopt. Mounted nodes (and everything below them) are kept.
    pub fn release_unadopted(&mut self, id: NodeId) -> Vec<InstanceId> {
        let mut owners = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let adopted = match self.nodes.get(id.0) {
                None => continue,
                Some(node) => {
                    node.handle.is_some()
                        || matches!(node.kind, VKind::Component { rendered: Some(_), .. })
                }
            };
            if adopted {
                continue;
            }
            if let Some(node) = self.nodes.remove(id.0) {
                owners.extend(node.owner);
                push_descendants(&node.kind, &mut stack);
            }
        }
        owners
    }

    /// Move `source`'s record into `target`'s slot so that ids pointing at
    /// `target` now see the new record. The old record's descendants are freed
    /// and their owners returned (the old record's own owner included).
    pub fn splice(&mut self, target: NodeId, source: NodeId) -> Result<Vec<InstanceId>> {
        if target == source {
            return Ok(Vec::new());
        }
        if !self.contains(target) {
            return Err(Error::StaleNode(target));
        }
        let record = self.nodes.remove(source.0).ok_or(Error::StaleNode(source))?;
        let slot = self.get_mut(target)?;
        let old = std::mem::replace(slot, record);

        let mut owners: Vec<InstanceId> = old.owner.into_iter().collect();
        let mut stack = Vec::new();
        push_descendants(&old.kind, &mut stack);
        for child in stack {
            owners.extend(self.release(child));
        }
        Ok(owners)
    }

    /// Deep-copy a subtree without handles. Component nodes are copied as
    /// their rendered root.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId> {
        let effective = self.effective(id)?;
        let kind = self.get(effective)?.kind.clone();
        let kind = match kind {
            VKind::Element {
                tag,
                props,
                children,
            } => VKind::Element {
                tag,
                props,
                children: self.clone_children(&children)?,
            },
            VKind::Fragment { children } => VKind::Fragment {
                children: self.clone_children(&children)?,
            },
            other => other,
        };
        Ok(NodeId(self.nodes.insert(VNode::new(kind))))
    }

    fn clone_children(&mut self, children: &[NodeId]) -> Result<Vec<NodeId>> {
        children.iter().map(|&child| self.clone_subtree(child)).collect()
    }
}

fn push_descendants(kind: &VKind, stack: &mut Vec<NodeId>) {
    match kind {
        VKind::Element { children, .. } | VKind::Fragment { children } => {
            stack.extend(children.iter().rev().copied());
        }
        VKind::Component {
            rendered: Some(root),
            ..
        } => stack.push(*root),
        _ => {}
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn li(key: &str) -> Node {
        Node::element("li", Props::new().with_key(key), [Node::text(key)])
    }

    #[test]
    fn test_intern_flattens_nested_fragments() {
        let mut tree = Tree::new();
        let root = tree.intern(Node::element(
            "ul",
            Props::new(),
            [li("a"), Node::fragment([li("b"), Node::fragment([li("c")])]), li("d")],
        ));

        let keys: Vec<_> = tree
            .children(root)
            .unwrap()
            .iter()
            .map(|&c| tree.key(c).unwrap().unwrap())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_top_level_fragment_is_kept() {
        let mut tree = Tree::new();
        let root = tree.intern(Node::fragment([Node::text("x")]));
        assert!(tree.get(root).unwrap().is_fragment());
    }

    #[test]
    fn test_release_frees_subtree() {
        let mut tree = Tree::new();
        let root = tree.intern(Node::element("ul", Props::new(), [li("a"), li("b")]));
        let child = tree.children(root).unwrap()[0];
        assert_eq!(tree.len(), 5);

        tree.release(root);
        assert!(tree.is_empty());
        assert!(matches!(tree.get(child), Err(Error::StaleNode(_))));
    }

    #[test]
    fn test_release_unadopted_keeps_mounted_nodes() {
        let mut tree = Tree::new();
        let root = tree.intern(Node::element("ul", Props::new(), [li("a"), li("b")]));
        let adopted = tree.children(root).unwrap()[1];
        tree.set_handle(adopted, Some(Handle(9))).unwrap();

        tree.release_unadopted(root);
        assert!(!tree.contains(root));
        assert!(tree.contains(adopted), "mounted child must survive");
        let text = tree.children(adopted).unwrap()[0];
        assert!(tree.contains(text), "subtree of a mounted child must survive");
    }

    #[test]
    fn test_splice_keeps_target_id() {
        let mut tree = Tree::new();
        let old = tree.intern(Node::element("span", Props::new(), [Node::text("x")]));
        let old_text = tree.children(old).unwrap()[0];
        let new = tree.intern(Node::element("div", Props::new(), []));

        tree.splice(old, new).unwrap();

        assert_eq!(tree.node_type(old).unwrap(), NodeType::Element("div".into()));
        assert!(!tree.contains(new));
        assert!(!tree.contains(old_text), "old descendants are freed");
    }

    #[test]
    fn test_clone_subtree_has_no_handles() {
        let mut tree = Tree::new();
        let root = tree.intern(li("a"));
        tree.set_handle(root, Some(Handle(1))).unwrap();

        let copy = tree.clone_subtree(root).unwrap();
        assert_ne!(copy, root);
        assert_eq!(tree.get(copy).unwrap().handle, None);
        assert_eq!(tree.key(copy).unwrap(), Some("a".into()));
        assert_eq!(tree.children(copy).unwrap().len(), 1);
    }

    #[test]
    fn test_node_types() {
        let mut tree = Tree::new();
        let span = tree.intern(Node::element("span", Props::new(), []));
        let text = tree.intern(Node::text("x"));
        assert_eq!(tree.node_type(span).unwrap(), NodeType::Element("span".into()));
        assert_eq!(tree.node_type(text).unwrap(), NodeType::Text);
    }
}
