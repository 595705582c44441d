//! Component Lifecycle Driver.
//!
//! - [`Runtime::extract_component`] builds an instance for a Component node and
//!   resolves its rendered root (through nested components)
//! - [`Runtime::force_update`] / [`Runtime::set_state`] re-render an instance
//!   and reconcile the result against what is mounted
//!
//! Hooks are only called when the component declares them in
//! [`Component::hooks`](crate::primitives::Component::hooks). A hook error
//! aborts the operation in progress and propagates; the surface keeps
//! whatever mutations were already applied.

use std::rc::Rc;

use crate::engine::{ComponentInstance, InstanceId, NodeId, VKind};
use crate::error::{Error, HookResult, Result};
use crate::primitives::{Component, Node, Props, State};
use crate::surface::Surface;
use crate::types::{Handle, LifecycleHooks, PatchAction};

use super::Runtime;

impl<S: Surface> Runtime<S> {
    // =========================================================================
    // Hook invocation
    // =========================================================================

    /// Call a declared hook on `instance`. Undeclared hooks are skipped.
    pub(crate) fn call_hook(
        &mut self,
        instance: InstanceId,
        hook: LifecycleHooks,
        name: &'static str,
        call: impl FnOnce(&mut dyn Component, &Props, &State) -> HookResult,
    ) -> Result<()> {
        let record = self.instance_mut(instance)?;
        if !record.has(hook) {
            return Ok(());
        }
        let component = record.name;
        let ComponentInstance {
            behavior,
            props,
            state,
            ..
        } = record;
        tracing::trace!(component, hook = name, "hook");
        call(behavior.as_mut(), props, state).map_err(|source| Error::Hook {
            hook: name,
            component,
            source,
        })
    }

    /// `should_component_update`, `true` when undeclared.
    pub(crate) fn should_update(
        &self,
        instance: InstanceId,
        next_props: &Props,
        next_state: &State,
    ) -> Result<bool> {
        let record = self.instance(instance)?;
        if !record.has(LifecycleHooks::SHOULD_UPDATE) {
            return Ok(true);
        }
        Ok(record.behavior().should_component_update(next_props, next_state))
    }

    pub(crate) fn will_mount(&mut self, chain: &[InstanceId], live: Handle) -> Result<()> {
        for &owner in chain {
            self.call_hook(owner, LifecycleHooks::WILL_MOUNT, "component_will_mount", |c, _, _| {
                c.component_will_mount(live)
            })?;
        }
        Ok(())
    }

    /// Innermost first.
    pub(crate) fn did_mount(&mut self, chain: &[InstanceId], live: Handle) -> Result<()> {
        for &owner in chain.iter().rev() {
            self.call_hook(owner, LifecycleHooks::DID_MOUNT, "component_did_mount", |c, _, _| {
                c.component_did_mount(live)
            })?;
        }
        Ok(())
    }

    pub(crate) fn will_unmount(&mut self, chain: &[InstanceId], live: Handle) -> Result<()> {
        for &owner in chain {
            self.call_hook(
                owner,
                LifecycleHooks::WILL_UNMOUNT,
                "component_will_unmount",
                |c, _, _| c.component_will_unmount(live),
            )?;
        }
        Ok(())
    }

    fn did_update(&mut self, instance: InstanceId) -> Result<()> {
        self.call_hook(
            instance,
            LifecycleHooks::DID_UPDATE,
            "component_did_update",
            |c, props, state| c.component_did_update(props, state),
        )
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Render an instance with its current props and state.
    pub fn extract_rendered_tree(&self, instance: InstanceId) -> Result<Node> {
        let record = self.instance(instance)?;
        Ok(record.behavior().render(&record.props, &record.state).into_node())
    }

    /// Resolve a Component node to its rendered (non-component) root,
    /// creating instances along the way. Idempotent once resolved.
    pub fn extract_component(&mut self, node: NodeId) -> Result<NodeId> {
        let (ty, props) = match self.tree.kind(node)? {
            VKind::Component {
                rendered: Some(root),
                ..
            } => return self.tree.effective(*root),
            VKind::Component { ty, props, .. } => (ty.clone(), props.clone()),
            _ => return Ok(node),
        };

        let constructor = self.registry.resolve(&ty);
        let behavior = constructor(&props);
        let record = ComponentInstance::new(behavior, props.clone(), ty.id(), node);
        tracing::debug!(component = record.name, %node, "component created");
        let instance = InstanceId(self.instances.insert(record));
        self.tree.get_mut(node)?.owner = Some(instance);

        let root = self.render_root(instance, props.key())?;
        if let VKind::Component { rendered, .. } = &mut self.tree.get_mut(node)?.kind {
            *rendered = Some(root);
        }
        self.instance_mut(instance)?.root = Some(root);

        self.extract_component(root)
    }

    /// Render and intern an instance's tree, carrying the component's key onto
    /// a root that has none.
    fn render_root(&mut self, instance: InstanceId, key: Option<String>) -> Result<NodeId> {
        let mut rendered = self.extract_rendered_tree(instance)?;
        if let Some(key) = key {
            if rendered.props().is_some() && rendered.key().is_none() {
                rendered = rendered.with_key(key);
            }
        }
        Ok(self.tree.intern(rendered))
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Re-render `instance` and reconcile its mounted root.
    pub fn force_update(&mut self, instance: InstanceId) -> Result<()> {
        self.force_update_with(instance, |_| {})
    }

    /// [`force_update`](Self::force_update), then `callback`.
    pub fn force_update_with(
        &mut self,
        instance: InstanceId,
        callback: impl FnOnce(&mut Self),
    ) -> Result<()> {
        self.update_instance(instance, None, false)?;
        callback(self);
        Ok(())
    }

    /// Shallow-merge `partial` into the state and re-render, unless
    /// `should_component_update(props, partial)` refuses.
    pub fn set_state(&mut self, instance: InstanceId, partial: State) -> Result<()> {
        self.set_state_with(instance, partial, |_| {})
    }

    pub fn set_state_with(
        &mut self,
        instance: InstanceId,
        partial: State,
        callback: impl FnOnce(&mut Self),
    ) -> Result<()> {
        let props = self.instance(instance)?.props.clone();
        if !self.should_update(instance, &props, &partial)? {
            tracing::trace!(%instance, "set_state skipped");
            return Ok(());
        }
        self.instance_mut(instance)?.merge_state(partial);
        self.force_update_with(instance, callback)
    }

    /// Shared update path. With `next_props`, the instance adopts them; with
    /// `check`, `should_component_update` may veto. Returns whether the
    /// instance re-rendered.
    pub(crate) fn update_instance(
        &mut self,
        instance: InstanceId,
        next_props: Option<Rc<Props>>,
        check: bool,
    ) -> Result<bool> {
        let props = match &next_props {
            Some(props) => props.clone(),
            None => self.instance(instance)?.props.clone(),
        };
        let state = self.instance(instance)?.state.clone();
        if check && !self.should_update(instance, &props, &state)? {
            return Ok(false);
        }

        self.call_hook(
            instance,
            LifecycleHooks::WILL_UPDATE,
            "component_will_update",
            |c, _, state| c.component_will_update(&props, state),
        )?;

        let node = self.instance(instance)?.node;
        if next_props.is_some() {
            self.instance_mut(instance)?.props = props.clone();
            self.tree.set_props(node, props.clone())?;
        }

        let new_root = self.render_root(instance, props.key())?;
        let result = self.update_rendered(instance, new_root);
        self.discard_unadopted(new_root);
        result?;

        self.did_update(instance)?;
        Ok(true)
    }

    /// Reconcile a freshly rendered root against the instance's mounted root.
    /// A root of a different type is replaced and spliced into the old id.
    fn update_rendered(&mut self, instance: InstanceId, new_root: NodeId) -> Result<()> {
        let old_root = self
            .instance(instance)?
            .root
            .ok_or(Error::NotMounted(self.instance(instance)?.node))?;

        if self.tree.node_type(new_root)? == self.tree.node_type(old_root)? {
            let action = self.patch_with(new_root, old_root, false, Some(instance))?;
            if action == PatchAction::TextUpdate {
                self.update_text(new_root, old_root)?;
            }
            return Ok(());
        }

        let old_live = self
            .tree
            .live(old_root)?
            .ok_or(Error::NotMounted(old_root))?;
        let parent = self.live_parent(old_root, old_live)?;
        let namespace = self.namespace_of(old_root)?;

        let new_live = self.materialize(new_root, Some(instance), namespace.as_deref())?;
        self.swap_live(new_root, old_root, parent, new_live)?;

        let owners = self.tree.splice(old_root, new_root)?;
        self.destroy_instances(owners);
        if let Some(owner) = self.tree.get(old_root)?.owner {
            self.instance_mut(owner)?.node = old_root;
        }
        self.apply_scope(instance, new_live)?;
        tracing::debug!(%instance, "root replaced");
        Ok(())
    }

    /// Re-render a mounted root component, optionally with new props (which
    /// `should_component_update` may veto). Returns whether it re-rendered.
    pub fn update_root(&mut self, root: NodeId, props: Option<Props>) -> Result<bool> {
        let instance = self.instance_of(root)?;
        let check = props.is_some();
        self.update_instance(instance, props.map(Rc::new), check)
    }
}
