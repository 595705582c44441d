//! Component instances.
//!
//! One instance per mounted Component node. The instance owns props, state
//! and the boxed behaviour; the tree refers to it by [`InstanceId`].

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::arena::Index;
use super::NodeId;
use crate::primitives::{Component, Props, State};
use crate::surface::Listener;
use crate::types::LifecycleHooks;

/// Stable id of a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) Index);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}v{}", self.0.slot(), self.0.generation())
    }
}

pub struct ComponentInstance {
    pub(crate) behavior: Box<dyn Component>,
    pub props: Rc<Props>,
    pub state: State,
    /// Declared hooks, read once at construction.
    pub hooks: LifecycleHooks,
    pub name: &'static str,
    pub type_id: TypeId,
    /// The Component node this instance stands for.
    pub node: NodeId,
    /// Rendered root (may itself be a Component node).
    pub root: Option<NodeId>,
    /// Bind-to-state listeners, one per event name.
    pub(crate) listeners: HashMap<String, Listener>,
}

impl ComponentInstance {
    pub(crate) fn new(
        behavior: Box<dyn Component>,
        props: Rc<Props>,
        type_id: TypeId,
        node: NodeId,
    ) -> Self {
        let state = behavior.initial_state(&props);
        let hooks = behavior.hooks();
        let name = behavior.name();
        Self {
            behavior,
            props,
            state,
            hooks,
            name,
            type_id,
            node,
            root: None,
            listeners: HashMap::new(),
        }
    }

    #[inline]
    pub fn has(&self, hook: LifecycleHooks) -> bool {
        self.hooks.contains(hook)
    }

    pub fn behavior(&self) -> &dyn Component {
        self.behavior.as_ref()
    }

    /// Shallow merge: later keys overwrite.
    pub fn merge_state(&mut self, partial: State) {
        for (key, value) in partial {
            self.state.insert(key, value);
        }
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("state", &self.state)
            .field("hooks", &self.hooks)
            .field("node", &self.node)
            .field("root", &self.root)
            .finish()
    }
}
