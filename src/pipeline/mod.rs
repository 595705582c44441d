//! Pipeline - From declarative tree to surface mutations.
//!
//! Everything hangs off [`Runtime`], which owns the surface, the node arena,
//! the component instances, the per-type registry, the hydration scheduler and
//! the configuration.
//!
//! # Flow
//!
//! ```text
//! render/mount --> materialize --> append ------------------+
//!                                                          |
//! set_state/force_update --> render --> patch --> keyed    v
//!                                         |            mutation primitives --> Surface
//!                                         +--> props --^
//! hydrate --> scheduler (one child per tick) --> claim existing live nodes
//! ```
//!
//! Submodules each add an `impl<S: Surface> Runtime<S>` block:
//! - `props` - attribute diffing and application
//! - `materialize` - creating live nodes
//! - `mutate` - append/insert/remove/replace with lifecycle ordering
//! - `patch` / `keyed` - reconciliation
//! - `lifecycle` - component extraction and updates
//! - `hydrate` / `scheduler` - attaching to server-rendered surfaces
//! - `events` - listener binding and dispatch
//! - `mount` - top-level entry points

mod events;
mod hydrate;
mod keyed;
mod lifecycle;
mod materialize;
mod mount;
mod mutate;
mod patch;
mod props;
mod scheduler;

pub use keyed::ChildKey;
pub use props::{diff_props, PropAction, PropOp};
pub use scheduler::{HydrateTask, Scheduler};

use crate::config::RuntimeConfig;
use crate::engine::{Arena, ComponentInstance, ComponentRegistry, InstanceId, NodeId, Stylesheet, Tree};
use crate::error::{Error, Result};
use crate::primitives::{Node, State};
use crate::surface::Surface;
use crate::types::Handle;

// =============================================================================
// Runtime
// =============================================================================

/// Reconciler state bound to one surface.
pub struct Runtime<S: Surface> {
    pub(crate) surface: S,
    pub(crate) tree: Tree,
    pub(crate) instances: Arena<ComponentInstance>,
    pub(crate) registry: ComponentRegistry,
    pub(crate) scheduler: Scheduler,
    pub(crate) config: RuntimeConfig,
}

impl<S: Surface> Runtime<S> {
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, RuntimeConfig::default())
    }

    pub fn with_config(surface: S, config: RuntimeConfig) -> Self {
        Self {
            surface,
            tree: Tree::new(),
            instances: Arena::new(),
            registry: ComponentRegistry::new(),
            scheduler: Scheduler::new(),
            config,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Compiled component stylesheets for the host to inject.
    pub fn stylesheets(&self) -> &[Stylesheet] {
        self.registry.stylesheets()
    }

    /// Intern a declarative node without mounting it.
    pub fn intern(&mut self, node: Node) -> NodeId {
        self.tree.intern(node)
    }

    /// Live handle of a node (following Component nodes).
    pub fn live(&self, node: NodeId) -> Result<Option<Handle>> {
        self.tree.live(node)
    }

    pub fn instance(&self, id: InstanceId) -> Result<&ComponentInstance> {
        self.instances.get(id.0).ok_or(Error::StaleInstance(id))
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> Result<&mut ComponentInstance> {
        self.instances.get_mut(id.0).ok_or(Error::StaleInstance(id))
    }

    /// Instance a Component node stands for.
    pub fn instance_of(&self, node: NodeId) -> Result<InstanceId> {
        let record = self.tree.get(node)?;
        if !record.is_component() {
            return Err(Error::NotAComponent(node));
        }
        record.owner.ok_or(Error::NotMounted(node))
    }

    pub fn state(&self, id: InstanceId) -> Result<&State> {
        Ok(&self.instance(id)?.state)
    }

    /// Number of live component instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    pub(crate) fn destroy_instances(&mut self, owners: Vec<InstanceId>) {
        for owner in owners {
            if let Some(instance) = self.instances.remove(owner.0) {
                tracing::trace!(component = instance.name, %owner, "destroyed");
            }
        }
    }

    /// Free a node's subtree and destroy the instances it owned.
    pub(crate) fn discard(&mut self, node: NodeId) {
        let owners = self.tree.release(node);
        self.destroy_instances(owners);
    }

    /// Free what a patch did not adopt from a freshly interned tree.
    pub(crate) fn discard_unadopted(&mut self, node: NodeId) {
        let owners = self.tree.release_unadopted(node);
        self.destroy_instances(owners);
    }
}
