//! Component - User-defined renderable units.
//!
//! A component renders props and state into a [`Node`] tree. Lifecycle hooks
//! are optional: the runtime only calls the ones listed in
//! [`Component::hooks`].
//!
//! Component types are identified by a `TypeId`:
//! - [`ComponentType::of`] - the component struct's own type
//! - [`ComponentType::factory`] - the factory closure's type
//! - [`ComponentType::function`] - the render function's type

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use super::node::Node;
use super::props::Props;
use crate::error::HookResult;
use crate::types::{Handle, LifecycleHooks};

/// Component state: a JSON object, shallow-merged by `set_state`.
pub type State = serde_json::Map<String, serde_json::Value>;

/// Render function of a function component.
pub type RenderFn = Rc<dyn Fn(&Props, &State) -> Rendered>;

/// Builds the behaviour of a new component instance.
pub type Constructor = Rc<dyn Fn(&Props) -> Box<dyn Component>>;

// =============================================================================
// Rendered
// =============================================================================

/// What `render` returns.
#[derive(Clone, Debug)]
pub enum Rendered {
    Node(Node),
    /// Several roots, wrapped in a Fragment.
    List(Vec<Node>),
    /// Renders the canonical empty node.
    Nothing,
}

impl Rendered {
    pub fn into_node(self) -> Node {
        match self {
            Rendered::Node(node) => node,
            Rendered::List(children) => Node::Fragment(children),
            Rendered::Nothing => Node::empty(),
        }
    }
}

impl From<Node> for Rendered {
    fn from(node: Node) -> Self {
        Rendered::Node(node)
    }
}

impl From<Vec<Node>> for Rendered {
    fn from(children: Vec<Node>) -> Self {
        Rendered::List(children)
    }
}

impl From<Option<Node>> for Rendered {
    fn from(node: Option<Node>) -> Self {
        node.map_or(Rendered::Nothing, Rendered::Node)
    }
}

// =============================================================================
// Component trait
// =============================================================================

/// A stateful component.
///
/// Props and state are owned by the runtime's instance record and passed in;
/// `self` holds whatever private data the component keeps.
pub trait Component: 'static {
    fn render(&self, props: &Props, state: &State) -> Rendered;

    /// Display name used in logs and errors.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Hooks the runtime should call.
    fn hooks(&self) -> LifecycleHooks {
        LifecycleHooks::empty()
    }

    fn initial_state(&self, _props: &Props) -> State {
        State::new()
    }

    fn should_component_update(&self, _next_props: &Props, _next_state: &State) -> bool {
        true
    }

    fn component_will_update(&mut self, _next_props: &Props, _next_state: &State) -> HookResult {
        Ok(())
    }

    fn component_did_update(&mut self, _props: &Props, _state: &State) -> HookResult {
        Ok(())
    }

    /// Called with the freshly created, still detached live node.
    fn component_will_mount(&mut self, _live: Handle) -> HookResult {
        Ok(())
    }

    fn component_did_mount(&mut self, _live: Handle) -> HookResult {
        Ok(())
    }

    /// Called while the live node is still attached.
    fn component_will_unmount(&mut self, _live: Handle) -> HookResult {
        Ok(())
    }

    /// Stylesheet shared by every instance of this type.
    fn stylesheet(&self) -> Option<String> {
        None
    }
}

/// Adapter wrapping a render function into a component.
pub(crate) struct FunctionComponent {
    render: RenderFn,
    name: &'static str,
}

impl FunctionComponent {
    pub(crate) fn new(render: RenderFn, name: &'static str) -> Self {
        Self { render, name }
    }
}

impl Component for FunctionComponent {
    fn render(&self, props: &Props, state: &State) -> Rendered {
        (self.render)(props, state)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

// =============================================================================
// Component Type
// =============================================================================

/// How instances of a component type are built.
#[derive(Clone)]
pub enum ComponentKind {
    Class(Constructor),
    Function(RenderFn),
}

/// Identity of a component type plus the means to build instances.
#[derive(Clone)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    kind: ComponentKind,
}

impl ComponentType {
    pub fn of<C: Component + Default>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
            kind: ComponentKind::Class(Rc::new(|_: &Props| -> Box<dyn Component> {
                Box::new(C::default())
            })),
        }
    }

    pub fn factory<F, C>(factory: F) -> Self
    where
        F: Fn(&Props) -> C + 'static,
        C: Component,
    {
        Self {
            id: TypeId::of::<F>(),
            name: std::any::type_name::<C>(),
            kind: ComponentKind::Class(Rc::new(move |props: &Props| -> Box<dyn Component> {
                Box::new(factory(props))
            })),
        }
    }

    pub fn function<F>(render: F) -> Self
    where
        F: Fn(&Props, &State) -> Rendered + 'static,
    {
        Self {
            id: TypeId::of::<F>(),
            name: std::any::type_name::<F>(),
            kind: ComponentKind::Function(Rc::new(render)),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Hello;

    impl Component for Hello {
        fn render(&self, props: &Props, _state: &State) -> Rendered {
            Node::text(props.text("name").unwrap_or_default()).into()
        }
    }

    fn greeting(_props: &Props, _state: &State) -> Rendered {
        Rendered::Nothing
    }

    fn farewell(_props: &Props, _state: &State) -> Rendered {
        Rendered::Nothing
    }

    #[test]
    fn test_type_identity() {
        assert_eq!(ComponentType::of::<Hello>(), ComponentType::of::<Hello>());
        assert_eq!(ComponentType::function(greeting), ComponentType::function(greeting));
        assert_ne!(ComponentType::function(greeting), ComponentType::function(farewell));
        assert_ne!(ComponentType::of::<Hello>(), ComponentType::function(greeting));
    }

    #[test]
    fn test_factory_identity_is_per_closure() {
        fn make() -> ComponentType {
            ComponentType::factory(|_: &Props| Hello)
        }
        assert_eq!(make(), make());
        assert_ne!(make(), ComponentType::factory(|_: &Props| Hello));
    }

    #[test]
    fn test_rendered_into_node() {
        assert!(matches!(Rendered::Nothing.into_node(), Node::Element { .. }));
        assert!(matches!(Rendered::from(vec![]).into_node(), Node::Fragment(_)));
        assert!(matches!(Rendered::from(None).into_node(), Node::Element { .. }));
    }

    #[test]
    fn test_default_hooks_are_empty() {
        assert!(Hello.hooks().is_empty());
        assert!(Hello.name().ends_with("Hello"));
    }
}
