//! Keyed reconciliation.
//!
//! Entered once a child-list walk meets a pair of differing keys. Both lists
//! are mapped by [`ChildKey`] (explicit key, or position for unkeyed
//! children) and reconciled in two passes:
//!
//! 1. Old children whose key is gone are removed; survivors record their
//!    compacted index in `slot`.
//! 2. New children are walked in order. A matched old child is moved only
//!    when it is not already at the target position, then patched against
//!    its new counterpart. An unmatched new child is materialized and
//!    inserted at the target position.
//!
//! Duplicate keys resolve last-wins on both sides.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use crate::engine::{InstanceId, NodeId};
use crate::error::{Error, Result};
use crate::surface::Surface;
use crate::types::Handle;

use super::Runtime;

/// Identity of a child within its list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildKey {
    Keyed(String),
    /// Unkeyed children match by index.
    Positional(usize),
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildKey::Keyed(key) => write!(f, "{key:?}"),
            ChildKey::Positional(index) => write!(f, "#{index}"),
        }
    }
}

impl<S: Surface> Runtime<S> {
    fn child_key(&self, node: NodeId, index: usize) -> Result<ChildKey> {
        Ok(match self.tree.key(node)? {
            Some(key) => ChildKey::Keyed(key),
            None => ChildKey::Positional(index),
        })
    }

    /// Map children by key; a repeated key maps to its last occurrence.
    fn key_map(&self, children: &[NodeId], side: &'static str) -> Result<IndexMap<ChildKey, NodeId>> {
        let mut map = IndexMap::with_capacity(children.len());
        for (index, &child) in children.iter().enumerate() {
            let key = self.child_key(child, index)?;
            if let Some(previous) = map.insert(key.clone(), child) {
                tracing::warn!(%key, side, %previous, winner = %child, "duplicate key");
            }
        }
        Ok(map)
    }

    /// Reconcile `old_children` (mounted under `parent`) into `new_children`.
    /// `patched` holds old children the index walk already reconciled.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn reconcile_keyed(
        &mut self,
        old_parent: NodeId,
        parent: Handle,
        old_children: &[NodeId],
        new_children: &[NodeId],
        patched: &HashSet<NodeId>,
        owner: Option<InstanceId>,
        namespace: Option<&str>,
    ) -> Result<()> {
        let old_keys = self.key_map(old_children, "old")?;
        let new_keys = self.key_map(new_children, "new")?;

        // Pass 1: drop what has no counterpart
        let mut removed = 0;
        for (index, &child) in old_children.iter().enumerate() {
            let key = self.child_key(child, index)?;
            let survives =
                new_keys.contains_key(&key) && old_keys.get(&key).copied() == Some(child);
            if survives {
                self.tree.set_slot(child, Some(index - removed))?;
            } else {
                self.remove(child, parent)?;
                removed += 1;
            }
        }

        // Pass 2: place every new child
        let mut live: Vec<Handle> = self.surface.children(parent)?.to_vec();
        let mut reconciled = Vec::with_capacity(new_children.len());
        let (mut moved, mut inserted) = (0, 0);

        for (index, &child) in new_children.iter().enumerate() {
            let key = self.child_key(child, index)?;
            let matched = old_keys
                .get(&key)
                .copied()
                .filter(|_| new_keys.get(&key).copied() == Some(child));

            let Some(old) = matched else {
                let handle = self.materialize(child, owner, namespace)?;
                match live.get(index).copied() {
                    Some(before) => {
                        self.insert(child, before, parent, handle)?;
                        live.insert(index, handle);
                    }
                    None => {
                        self.append(child, parent, handle)?;
                        live.push(handle);
                    }
                }
                inserted += 1;
                reconciled.push(child);
                continue;
            };

            let handle = self.tree.live(old)?.ok_or(Error::NotMounted(old))?;
            if live.get(index) != Some(&handle) {
                let slot = self.tree.get(old)?.slot;
                tracing::trace!(%key, from = ?slot, to = index, "move");
                self.surface
                    .insert_before(parent, handle, live.get(index).copied())?;
                live.retain(|&h| h != handle);
                live.insert(index.min(live.len()), handle);
                moved += 1;
            }

            let settled = if patched.contains(&old) {
                old
            } else {
                self.patch_in_place(child, old, parent, owner, namespace)?
            };
            if settled != old {
                if let (Some(handle), Some(entry)) = (self.tree.live(settled)?, live.get_mut(index)) {
                    *entry = handle;
                }
            }
            reconciled.push(settled);
        }

        for &child in &reconciled {
            self.tree.set_slot(child, None)?;
        }
        tracing::debug!(%old_parent, removed, moved, inserted, "keyed reconciliation");
        self.tree.set_children(old_parent, reconciled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Node, Props};
    use crate::surface::{Document, Mutation};

    fn keyed_list(keys: &[&str]) -> Node {
        Node::element(
            "ul",
            Props::new(),
            keys.iter()
                .map(|key| Node::element("li", Props::new().with_key(*key), [Node::text(*key)])),
        )
    }

    fn mounted(keys: &[&str]) -> (Runtime<Document>, Handle, NodeId) {
        let mut runtime = Runtime::new(Document::new());
        let container = runtime.surface_mut().create_element("div", None);
        let root = runtime.mount(keyed_list(keys), container).unwrap();
        runtime.surface_mut().take_mutations();
        (runtime, container, root)
    }

    fn order(runtime: &Runtime<Document>, root: NodeId) -> String {
        let ul = runtime.live(root).unwrap().unwrap();
        runtime.surface().text_content(ul)
    }

    fn count(runtime: &Runtime<Document>, pick: impl Fn(&Mutation) -> bool) -> usize {
        runtime.surface().mutations().iter().filter(|m| pick(m)).count()
    }

    fn li_created(runtime: &Runtime<Document>) -> usize {
        count(runtime, |m| matches!(m, Mutation::CreateElement { tag, .. } if tag == "li"))
    }

    #[test]
    fn test_swap_is_one_move() {
        let (mut runtime, _, root) = mounted(&["a", "b"]);
        let before: Vec<Handle> = runtime.tree().children(root).unwrap().iter()
            .map(|&c| runtime.live(c).unwrap().unwrap())
            .collect();

        runtime.update(root, keyed_list(&["b", "a"])).unwrap();

        assert_eq!(order(&runtime, root), "ba");
        assert_eq!(count(&runtime, |m| matches!(m, Mutation::Move { .. })), 1);
        assert_eq!(count(&runtime, Mutation::is_create), 0);
        assert_eq!(count(&runtime, |m| matches!(m, Mutation::Remove { .. })), 0);
        assert_eq!(runtime.surface().mutations().len(), 1);

        let after: Vec<Handle> = runtime.tree().children(root).unwrap().iter()
            .map(|&c| runtime.live(c).unwrap().unwrap())
            .collect();
        assert_eq!(after, vec![before[1], before[0]], "live nodes were reused");
    }

    #[test]
    fn test_order_follows_new_keys() {
        let (mut runtime, _, root) = mounted(&["a", "b", "c", "d"]);
        runtime.update(root, keyed_list(&["d", "x", "b", "a", "y"])).unwrap();

        assert_eq!(order(&runtime, root), "dxbay");
        assert_eq!(li_created(&runtime), 2, "only x and y are new");
        assert_eq!(count(&runtime, |m| matches!(m, Mutation::Remove { .. })), 1);

        let keys: Vec<_> = runtime.tree().children(root).unwrap().iter()
            .map(|&c| runtime.tree().key(c).unwrap().unwrap())
            .collect();
        assert_eq!(keys, vec!["d", "x", "b", "a", "y"]);
    }

    #[test]
    fn test_append_at_end_does_not_move() {
        let (mut runtime, _, root) = mounted(&["a", "b"]);
        runtime.update(root, keyed_list(&["a", "b", "c"])).unwrap();

        assert_eq!(order(&runtime, root), "abc");
        assert_eq!(count(&runtime, |m| matches!(m, Mutation::Move { .. })), 0);
        assert_eq!(li_created(&runtime), 1);
    }

    #[test]
    fn test_prepend_inserts_without_moving() {
        let (mut runtime, _, root) = mounted(&["a", "b"]);
        runtime.update(root, keyed_list(&["z", "a", "b"])).unwrap();

        assert_eq!(order(&runtime, root), "zab");
        assert_eq!(count(&runtime, |m| matches!(m, Mutation::Move { .. })), 0);
        assert_eq!(count(&runtime, |m| matches!(m, Mutation::Insert { .. })), 1);
    }

    #[test]
    fn test_matched_pairs_are_patched() {
        let (mut runtime, _, root) = mounted(&["a", "b"]);
        let list = Node::element(
            "ul",
            Props::new(),
            [
                Node::element("li", Props::new().with_key("b").with("class", "on"), [Node::text("B")]),
                Node::element("li", Props::new().with_key("a"), [Node::text("a")]),
            ],
        );
        runtime.update(root, list).unwrap();

        let ul = runtime.live(root).unwrap().unwrap();
        assert_eq!(
            runtime.surface().inner_markup(ul),
            r#"<li class="on">B</li><li>a</li>"#
        );
    }

    #[test]
    fn test_duplicate_new_keys_last_wins() {
        let (mut runtime, _, root) = mounted(&["a", "b"]);
        runtime.update(root, keyed_list(&["b", "a", "a"])).unwrap();

        assert_eq!(order(&runtime, root), "baa");
        assert_eq!(li_created(&runtime), 1, "earlier duplicate is created fresh");
        let children = runtime.tree().children(root).unwrap();
        assert_eq!(children.len(), 3);
    }

    #[test]
    fn test_duplicate_old_keys_drop_the_loser() {
        let (mut runtime, _, root) = mounted(&["a", "a", "b"]);
        runtime.update(root, keyed_list(&["b", "a"])).unwrap();

        assert_eq!(order(&runtime, root), "ba");
        assert_eq!(li_created(&runtime), 0);
        assert_eq!(count(&runtime, |m| matches!(m, Mutation::Remove { .. })), 1);
    }

    #[test]
    fn test_keyed_to_removal() {
        let (mut runtime, _, root) = mounted(&["a", "b", "c"]);
        runtime.update(root, keyed_list(&["c"])).unwrap();

        assert_eq!(order(&runtime, root), "c");
        assert_eq!(count(&runtime, |m| matches!(m, Mutation::Remove { .. })), 2);
        assert_eq!(count(&runtime, |m| matches!(m, Mutation::Move { .. })), 0);
    }
}
