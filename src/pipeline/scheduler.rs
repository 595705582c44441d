//! Hydration scheduler.
//!
//! Hydration claims one node per task so a host can interleave it with other
//! work. Tasks are plain data; [`Runtime::tick`] runs the next live one and
//! drops tasks whose node was released (or whose parent went away) in the
//! meantime.

use std::collections::VecDeque;

use crate::engine::{InstanceId, NodeId};
use crate::error::Result;
use crate::surface::Surface;
use crate::types::Handle;

use super::Runtime;

/// Claim `node` from the live child at `index` of `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydrateTask {
    pub parent: Handle,
    pub node: NodeId,
    pub index: usize,
    pub parent_node: Option<NodeId>,
    pub owner: Option<InstanceId>,
}

/// FIFO of pending hydration tasks.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: VecDeque<HydrateTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: HydrateTask) {
        self.queue.push_back(task);
    }

    pub fn next(&mut self) -> Option<HydrateTask> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl<S: Surface> Runtime<S> {
    /// Number of hydration tasks waiting.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Run the next live hydration task. Returns `false` once the queue is
    /// drained.
    pub fn tick(&mut self) -> Result<bool> {
        while let Some(task) = self.scheduler.next() {
            let parent_gone = task
                .parent_node
                .is_some_and(|parent| !self.tree.contains(parent));
            if !self.tree.contains(task.node) || parent_gone || !self.surface.contains(task.parent) {
                tracing::debug!(node = %task.node, "hydration task cancelled");
                continue;
            }
            self.hydrate(task.parent, task.node, task.index, task.parent_node, task.owner)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Run tasks until the queue is empty. Returns how many ran.
    pub fn run_until_idle(&mut self) -> Result<usize> {
        let mut ran = 0;
        while self.tick()? {
            ran += 1;
        }
        Ok(ran)
    }

    pub(crate) fn schedule_children(
        &mut self,
        parent: Handle,
        node: NodeId,
        owner: Option<InstanceId>,
    ) -> Result<()> {
        let children = self.tree.children(node)?.to_vec();
        for (index, child) in children.into_iter().enumerate() {
            self.scheduler.schedule(HydrateTask {
                parent,
                node: child,
                index,
                parent_node: Some(node),
                owner,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Tree;
    use crate::primitives::Node;

    fn task(tree: &mut Tree, index: usize) -> HydrateTask {
        HydrateTask {
            parent: Handle(0),
            node: tree.intern(Node::text(index)),
            index,
            parent_node: None,
            owner: None,
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut tree = Tree::new();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(task(&mut tree, 1));
        scheduler.schedule(task(&mut tree, 2));

        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.next().map(|t| t.index), Some(1));
        assert_eq!(scheduler.next().map(|t| t.index), Some(2));
        assert!(scheduler.next().is_none());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut tree = Tree::new();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(task(&mut tree, 1));
        scheduler.clear();
        assert!(scheduler.is_empty());
    }
}
