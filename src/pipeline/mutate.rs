//! Mutation primitives with lifecycle ordering.
//!
//! Every structural change the reconciler makes goes through here so that the
//! component hooks of the node being attached or detached fire around the
//! surface call:
//!
//! ```text
//! append / insert:  will_mount(chain) -> attach -> did_mount(chain, inner first)
//! remove:           will_unmount(chain) -> detach -> release records
//! replace:          will_unmount(old) -> will_mount(new) -> swap -> did_mount(new)
//! ```
//!
//! `chain` is the owner chain of the node: the instances of the Component
//! nodes that resolve to it, outermost first.

use crate::engine::{NodeId, VKind};
use crate::error::{Error, Result};
use crate::surface::Surface;
use crate::types::Handle;

use super::Runtime;

impl<S: Surface> Runtime<S> {
    /// Attach `live` (the handle of `node`) as the last child of `parent`.
    pub fn append(&mut self, node: NodeId, parent: Handle, live: Handle) -> Result<()> {
        let chain = self.tree.owner_chain(node)?;
        self.will_mount(&chain, live)?;
        tracing::trace!(%node, %parent, %live, "append");
        self.surface.append_child(parent, live)?;
        self.rebind_fragment(node, parent)?;
        self.did_mount(&chain, live)
    }

    /// Attach `live` before the existing child `before`.
    pub fn insert(
        &mut self,
        node: NodeId,
        before: Handle,
        parent: Handle,
        live: Handle,
    ) -> Result<()> {
        let chain = self.tree.owner_chain(node)?;
        self.will_mount(&chain, live)?;
        tracing::trace!(%node, %parent, %live, %before, "insert");
        self.surface.insert_before(parent, live, Some(before))?;
        self.rebind_fragment(node, parent)?;
        self.did_mount(&chain, live)
    }

    /// Detach `node` from `parent` and release its records.
    pub fn remove(&mut self, node: NodeId, parent: Handle) -> Result<()> {
        let live = self.tree.live(node)?.ok_or(Error::NotMounted(node))?;
        let chain = self.tree.owner_chain(node)?;
        self.will_unmount(&chain, live)?;
        tracing::trace!(%node, %parent, %live, "remove");
        for root in self.live_roots(node)? {
            self.surface.remove_child(parent, root)?;
        }
        self.discard(node);
        Ok(())
    }

    /// Put `new` (already materialized as `new_live`) where `old` is, then
    /// release `old`.
    pub fn replace(
        &mut self,
        new: NodeId,
        old: NodeId,
        parent: Handle,
        new_live: Handle,
    ) -> Result<()> {
        self.swap_live(new, old, parent, new_live)?;
        self.discard(old);
        Ok(())
    }

    /// The surface half of [`replace`](Self::replace). `old` keeps its record
    /// but loses its handle.
    pub(crate) fn swap_live(
        &mut self,
        new: NodeId,
        old: NodeId,
        parent: Handle,
        new_live: Handle,
    ) -> Result<()> {
        let old_live = self.tree.live(old)?.ok_or(Error::NotMounted(old))?;
        let old_chain = self.tree.owner_chain(old)?;
        let new_chain = self.tree.owner_chain(new)?;

        self.will_unmount(&old_chain, old_live)?;
        self.will_mount(&new_chain, new_live)?;
        tracing::trace!(%new, %old, %parent, "replace");

        let roots = self.live_roots(old)?;
        match roots.split_first() {
            None => self.surface.append_child(parent, new_live)?,
            Some((&first, rest)) => {
                self.surface.replace_child(parent, new_live, first)?;
                for &root in rest {
                    self.surface.remove_child(parent, root)?;
                }
            }
        }
        self.rebind_fragment(new, parent)?;

        let effective = self.tree.effective(old)?;
        self.tree.set_handle(effective, None)?;
        self.did_mount(&new_chain, new_live)
    }

    /// Rewrite the text of the mounted `old` Text node to `new`'s value.
    pub(crate) fn update_text(&mut self, new: NodeId, old: NodeId) -> Result<()> {
        let new = self.tree.effective(new)?;
        let old = self.tree.effective(old)?;
        let value = match self.tree.kind(new)? {
            VKind::Text(value) => value.clone(),
            _ => return Ok(()),
        };
        let live = self.tree.live(old)?.ok_or(Error::NotMounted(old))?;
        self.surface.set_text(live, &value.to_text())?;
        self.tree.get_mut(old)?.kind = VKind::Text(value);
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Live container `node` is attached to. A fragment's handle already is
    /// its container.
    pub(crate) fn live_parent(&self, node: NodeId, live: Handle) -> Result<Handle> {
        let effective = self.tree.effective(node)?;
        if self.tree.get(effective)?.is_fragment() {
            return Ok(live);
        }
        self.surface.parent(live).ok_or(Error::Detached(live))
    }

    /// Top-level live nodes `node` occupies in its container.
    fn live_roots(&self, node: NodeId) -> Result<Vec<Handle>> {
        let effective = self.tree.effective(node)?;
        let record = self.tree.get(effective)?;
        if !record.is_fragment() {
            return Ok(record.handle.into_iter().collect());
        }
        let mut roots = Vec::new();
        for &child in record.children() {
            roots.extend(self.live_roots(child)?);
        }
        Ok(roots)
    }

    /// Attaching a fragment empties it into `parent`; from then on the
    /// fragment stands for that container.
    fn rebind_fragment(&mut self, node: NodeId, parent: Handle) -> Result<()> {
        let effective = self.tree.effective(node)?;
        if self.tree.get(effective)?.is_fragment() {
            self.tree.set_handle(effective, Some(parent))?;
        }
        Ok(())
    }
}
