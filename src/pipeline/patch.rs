//! Patcher - Reconciling a new tree against a mounted one.
//!
//! [`Runtime::patch`] classifies a (new, old) pair and, when both sides are
//! the same kind of node, recurses into it. The caller acts on the returned
//! [`PatchAction`]; inside a child list that caller is
//! [`Runtime::patch_children`], which walks the lists by index until it meets
//! a pair of differing keys and then hands the whole list to keyed
//! reconciliation.
//!
//! The old side is always the mounted one. Patched pairs keep the old node id
//! and live handle; only props and text are rewritten in place.

use std::collections::HashSet;
use std::rc::Rc;

use crate::engine::{InstanceId, NodeId, VKind};
use crate::error::{Error, Result};
use crate::surface::Surface;
use crate::types::{Handle, PatchAction};

use super::Runtime;

impl<S: Surface> Runtime<S> {
    /// Reconcile `new` against the mounted `old`.
    ///
    /// Either side may be absent (`None`), which yields
    /// [`PatchAction::Remove`] or [`PatchAction::Add`]. `nested` is set for
    /// pairs inside a child list, where keyed pairs defer with
    /// [`PatchAction::Key`].
    pub fn patch(
        &mut self,
        new: Option<NodeId>,
        old: Option<NodeId>,
        nested: bool,
    ) -> Result<PatchAction> {
        self.patch_node(new, old, nested, None)
    }

    pub(crate) fn patch_with(
        &mut self,
        new: NodeId,
        old: NodeId,
        nested: bool,
        owner: Option<InstanceId>,
    ) -> Result<PatchAction> {
        self.patch_node(Some(new), Some(old), nested, owner)
    }

    fn patch_node(
        &mut self,
        new: Option<NodeId>,
        old: Option<NodeId>,
        nested: bool,
        owner: Option<InstanceId>,
    ) -> Result<PatchAction> {
        let (new, old) = match (new, old) {
            (None, _) => return Ok(PatchAction::Remove),
            (Some(_), None) => return Ok(PatchAction::Add),
            (Some(new), Some(old)) => (new, old),
        };
        if new == old {
            return Ok(PatchAction::NoOp);
        }

        let (new_record, old_record) = (self.tree.get(new)?, self.tree.get(old)?);
        if let (VKind::Text(a), VKind::Text(b)) = (&new_record.kind, &old_record.kind) {
            return Ok(if a == b {
                PatchAction::NoOp
            } else {
                PatchAction::TextUpdate
            });
        }
        if nested && (new_record.key().is_some() || old_record.key().is_some()) {
            return Ok(PatchAction::Key);
        }
        if new_record.node_type() != old_record.node_type() {
            return Ok(PatchAction::Replace);
        }

        if old_record.is_component() {
            let instance = old_record.owner.ok_or(Error::NotMounted(old))?;
            let props = new_record.props().cloned().unwrap_or_default();
            tracing::trace!(%new, %old, %instance, "patch component");
            self.update_instance(instance, Some(props), true)?;
            return Ok(PatchAction::NoOp);
        }

        let same_props = match (new_record.props(), old_record.props()) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => true,
        };
        tracing::trace!(%new, %old, "patch");
        self.patch_children(new, old, owner)?;
        if !same_props {
            self.patch_props(new, old, owner)?;
        }
        Ok(PatchAction::NoOp)
    }

    /// Patch one pair outside a child-list walk, applying the text update or
    /// replacement itself. Returns the id now standing in the old position.
    pub(crate) fn patch_in_place(
        &mut self,
        new: NodeId,
        old: NodeId,
        parent: Handle,
        owner: Option<InstanceId>,
        namespace: Option<&str>,
    ) -> Result<NodeId> {
        match self.patch_node(Some(new), Some(old), false, owner)? {
            PatchAction::TextUpdate => {
                self.update_text(new, old)?;
                Ok(old)
            }
            PatchAction::Replace => {
                let live = self.materialize(new, owner, namespace)?;
                self.replace(new, old, parent, live)?;
                Ok(new)
            }
            _ => Ok(old),
        }
    }

    /// Reconcile the child lists of two same-typed Element or Fragment nodes.
    /// The old node ends up holding the reconciled list.
    pub(crate) fn patch_children(
        &mut self,
        new: NodeId,
        old: NodeId,
        owner: Option<InstanceId>,
    ) -> Result<()> {
        let parent = self.tree.live(old)?.ok_or(Error::NotMounted(old))?;
        let new_children = self.tree.children(new)?.to_vec();
        let old_children = self.tree.children(old)?.to_vec();
        let namespace = self.namespace_of(old)?;

        if new_children.is_empty() {
            if !old_children.is_empty() {
                self.clear_all(old, parent, &old_children)?;
            }
            return Ok(());
        }

        let mut current: Vec<Option<NodeId>> = old_children.iter().copied().map(Some).collect();
        let mut patched: HashSet<NodeId> = HashSet::new();
        let mut keyed = false;

        for index in 0..new_children.len().max(old_children.len()) {
            let new_child = new_children.get(index).copied();
            let old_child = old_children.get(index).copied();

            match (self.patch_node(new_child, old_child, true, owner)?, new_child, old_child) {
                (PatchAction::NoOp, _, Some(old_child)) => {
                    patched.insert(old_child);
                }
                (PatchAction::Remove, _, Some(old_child)) => {
                    self.remove(old_child, parent)?;
                    current[index] = None;
                }
                (PatchAction::Add, Some(new_child), _) => {
                    let live = self.materialize(new_child, owner, namespace.as_deref())?;
                    self.append(new_child, parent, live)?;
                    current.push(Some(new_child));
                }
                (PatchAction::TextUpdate, Some(new_child), Some(old_child)) => {
                    self.update_text(new_child, old_child)?;
                    patched.insert(old_child);
                }
                (PatchAction::Replace, Some(new_child), Some(old_child)) => {
                    let live = self.materialize(new_child, owner, namespace.as_deref())?;
                    self.replace(new_child, old_child, parent, live)?;
                    current[index] = Some(new_child);
                    patched.insert(new_child);
                }
                (PatchAction::Key, Some(new_child), Some(old_child)) => {
                    if self.tree.key(new_child)? != self.tree.key(old_child)? {
                        keyed = true;
                        break;
                    }
                    let settled = self.patch_in_place(
                        new_child,
                        old_child,
                        parent,
                        owner,
                        namespace.as_deref(),
                    )?;
                    current[index] = Some(settled);
                    patched.insert(settled);
                }
                _ => {}
            }
        }

        if keyed {
            let old_list: Vec<NodeId> = current.into_iter().flatten().collect();
            return self.reconcile_keyed(
                old,
                parent,
                &old_list,
                &new_children,
                &patched,
                owner,
                namespace.as_deref(),
            );
        }

        self.tree.set_children(old, current.into_iter().flatten().collect())
    }

    /// Empty a mounted parent wholesale.
    fn clear_all(&mut self, old: NodeId, parent: Handle, children: &[NodeId]) -> Result<()> {
        for &child in children {
            if let Some(live) = self.tree.live(child)? {
                let chain = self.tree.owner_chain(child)?;
                self.will_unmount(&chain, live)?;
            }
        }
        self.surface.clear_children(parent)?;
        for &child in children {
            self.discard(child);
        }
        tracing::trace!(%old, removed = children.len(), "children cleared");
        self.tree.set_children(old, Vec::new())
    }

    /// Reconcile a mounted root against a new declarative tree.
    ///
    /// The root id stays valid: a root of a different type is replaced and
    /// spliced into it. Returns the action taken at the root.
    pub fn update(&mut self, root: NodeId, node: crate::primitives::Node) -> Result<PatchAction> {
        let new = self.tree.intern(node);
        let result = self.update_node(root, new);
        self.discard_unadopted(new);
        result
    }

    fn update_node(&mut self, root: NodeId, new: NodeId) -> Result<PatchAction> {
        let action = self.patch_node(Some(new), Some(root), false, None)?;
        match action {
            PatchAction::TextUpdate => self.update_text(new, root)?,
            PatchAction::Replace => {
                let old_live = self.tree.live(root)?.ok_or(Error::NotMounted(root))?;
                let parent = self.live_parent(root, old_live)?;
                let namespace = self.namespace_of(root)?;
                let live = self.materialize(new, None, namespace.as_deref())?;
                self.swap_live(new, root, parent, live)?;
                let owners = self.tree.splice(root, new)?;
                self.destroy_instances(owners);
                if let Some(owner) = self.tree.get(root)?.owner {
                    self.instance_mut(owner)?.node = root;
                }
            }
            _ => {}
        }
        tracing::debug!(%root, action = ?action, "root updated");
        Ok(action)
    }
}
