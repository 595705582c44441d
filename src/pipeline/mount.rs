//! Mount API - Top-level entry points.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::{Document, Node, Props, Runtime};
//!
//! let mut runtime = Runtime::new(Document::new());
//! let container = runtime.surface_mut().create_element("main", None);
//!
//! // Mount fresh (or hydrate, when the container carries the hydrate attribute)
//! let root = runtime.render(Node::element("h1", Props::new(), [Node::text("hello")]), container)?;
//! runtime.run_until_idle()?;
//!
//! // Reconcile a new tree against what is mounted
//! runtime.update(root, Node::element("h1", Props::new(), [Node::text("bye")]))?;
//! ```

use crate::engine::NodeId;
use crate::error::Result;
use crate::primitives::Node;
use crate::surface::Surface;
use crate::types::Handle;

use super::Runtime;

impl<S: Surface> Runtime<S> {
    /// Mount `node` into `container`, or hydrate the container's existing
    /// children when it carries the configured hydrate attribute.
    ///
    /// Hydration claims the root immediately and queues the rest; drive it
    /// with [`tick`](Self::tick) or [`run_until_idle`](Self::run_until_idle).
    pub fn render(&mut self, node: Node, container: Handle) -> Result<NodeId> {
        let attribute = self.config.hydrate_attribute.clone();
        if self.surface.attribute(container, &attribute).is_none() {
            return self.mount(node, container);
        }

        let root = self.tree.intern(node);
        tracing::debug!(%container, %root, "hydrating");
        self.hydrate(container, root, 0, None, None)?;
        self.surface.remove_attribute(container, &attribute, None)?;
        Ok(root)
    }

    /// Replace the container's contents with a freshly materialized `node`.
    pub fn mount(&mut self, node: Node, container: Handle) -> Result<NodeId> {
        let root = self.tree.intern(node);
        if !self.surface.children(container)?.is_empty() {
            self.surface.clear_children(container)?;
        }
        let live = self.materialize(root, None, None)?;
        self.append(root, container, live)?;
        tracing::debug!(%container, %root, "mounted");
        Ok(root)
    }
}
