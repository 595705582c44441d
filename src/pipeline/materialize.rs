//! Node Materializer - Creating live nodes.
//!
//! Text becomes character data, Element and Fragment become tagged nodes or
//! grouping containers, and Component nodes are resolved to their rendered
//! root first. Children are attached through [`Runtime::append`] so mount
//! hooks fire per child in document order. Refs fire after the children are
//! in place, then attributes and listeners are written.

use std::rc::Rc;

use crate::engine::{InstanceId, NodeId, VKind};
use crate::error::{Error, Result};
use crate::primitives::Props;
use crate::surface::Surface;
use crate::types::{Handle, Scalar};

use super::Runtime;

/// The parts of a node materialization needs, detached from the tree borrow.
enum Shape {
    Text(Scalar),
    Element { tag: String, props: Rc<Props> },
    Fragment,
    Component,
}

impl<S: Surface> Runtime<S> {
    /// Create the live counterpart of `node`. Returns the existing handle when
    /// the node is already mounted.
    pub fn materialize(
        &mut self,
        node: NodeId,
        owner: Option<InstanceId>,
        namespace: Option<&str>,
    ) -> Result<Handle> {
        if let Some(live) = self.tree.live(node)? {
            return Ok(live);
        }

        let shape = match self.tree.kind(node)? {
            VKind::Text(value) => Shape::Text(value.clone()),
            VKind::Element { tag, props, .. } => Shape::Element {
                tag: tag.clone(),
                props: props.clone(),
            },
            VKind::Fragment { .. } => Shape::Fragment,
            VKind::Component { .. } => Shape::Component,
        };

        match shape {
            Shape::Text(value) => {
                let live = self.surface.create_text(&value.to_text());
                self.tree.set_handle(node, Some(live))?;
                Ok(live)
            }
            Shape::Component => self.materialize_component(node, namespace),
            Shape::Fragment => {
                let live = self.surface.create_fragment();
                self.tree.set_handle(node, Some(live))?;
                self.materialize_children(node, live, owner, namespace)?;
                Ok(live)
            }
            Shape::Element { tag, props } => {
                let namespace = props.namespace().or(namespace).map(str::to_string);
                let live = self.surface.create_element(&tag, namespace.as_deref());
                self.tree.set_handle(node, Some(live))?;

                let mut props = props;
                if let (Some(ns), None) = (namespace.as_deref(), props.namespace()) {
                    Rc::make_mut(&mut props).insert("xmlns", ns);
                    self.tree.set_props(node, props.clone())?;
                }

                self.materialize_children(node, live, owner, namespace.as_deref())?;

                if let Some(callback) = props.ref_callback() {
                    callback(live, owner);
                }
                self.assign_props(live, &props, owner)?;
                tracing::trace!(%node, %live, %tag, "materialized");
                Ok(live)
            }
        }
    }

    fn materialize_children(
        &mut self,
        node: NodeId,
        live: Handle,
        owner: Option<InstanceId>,
        namespace: Option<&str>,
    ) -> Result<()> {
        let mut children = self.tree.children(node)?.to_vec();
        let mut cloned = false;

        for index in 0..children.len() {
            let mut child = children[index];
            if self.config.clone_hoisted && self.tree.is_mounted(child) {
                child = self.clone_hoisted(child, owner)?;
                children[index] = child;
                cloned = true;
            }
            let child_live = self.materialize(child, owner, namespace)?;
            self.append(child, live, child_live)?;
        }

        if cloned {
            self.tree.set_children(node, children)?;
        }
        Ok(())
    }

    fn materialize_component(&mut self, node: NodeId, namespace: Option<&str>) -> Result<Handle> {
        let root = self.extract_component(node)?;
        let chain = self.tree.owner_chain(node)?;
        let innermost = chain.last().copied();

        let live = self.materialize(root, innermost, namespace)?;
        if let Some(&outermost) = chain.first() {
            self.apply_scope(outermost, live)?;
        }
        Ok(live)
    }

    /// Tag an element rendered by `instance` with its type's stylesheet scope.
    pub(crate) fn apply_scope(&mut self, instance: InstanceId, live: Handle) -> Result<()> {
        if self.surface.tag(live).is_none() {
            return Ok(());
        }
        let record = self
            .instances
            .get(instance.0)
            .ok_or(Error::StaleInstance(instance))?;
        let scope = self
            .registry
            .scope(record.type_id, record.behavior(), &self.config);
        if let Some(scope) = scope {
            let attribute = self.config.scope_attribute.clone();
            self.surface.set_attribute(live, &attribute, &scope, None)?;
        }
        Ok(())
    }

    // =========================================================================
    // Hoisted nodes
    // =========================================================================

    /// Copy a mounted subtree (records and live nodes) so it can be attached a
    /// second time.
    fn clone_hoisted(&mut self, node: NodeId, owner: Option<InstanceId>) -> Result<NodeId> {
        let source = self.tree.live(node)?.ok_or(Error::NotMounted(node))?;
        let copy = self.tree.clone_subtree(node)?;
        let live = self.surface.clone_node(source, true)?;
        self.pair_clone(copy, live, owner)?;
        tracing::trace!(%node, %copy, "cloned hoisted node");
        Ok(copy)
    }

    /// Bind a cloned record tree to a cloned live tree, rebinding listeners
    /// (live clones do not carry them).
    fn pair_clone(&mut self, node: NodeId, live: Handle, owner: Option<InstanceId>) -> Result<()> {
        self.tree.set_handle(node, Some(live))?;
        if let Some(props) = self.tree.props(node)? {
            self.assign_events(live, &props, owner)?;
        }

        let children = self.tree.children(node)?.to_vec();
        let live_children = self.surface.children(live)?.to_vec();
        let mut cursor = 0;
        self.pair_children(&children, &live_children, &mut cursor, live, owner)
    }

    fn pair_children(
        &mut self,
        children: &[NodeId],
        live_children: &[Handle],
        cursor: &mut usize,
        container: Handle,
        owner: Option<InstanceId>,
    ) -> Result<()> {
        for &child in children {
            if self.tree.get(child)?.is_fragment() {
                self.tree.set_handle(child, Some(container))?;
                let nested = self.tree.children(child)?.to_vec();
                self.pair_children(&nested, live_children, cursor, container, owner)?;
                continue;
            }
            let live = *live_children.get(*cursor).ok_or(Error::NotMounted(child))?;
            *cursor += 1;
            self.pair_clone(child, live, owner)?;
        }
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Namespace a node's replacement should be created in.
    pub(crate) fn namespace_of(&self, node: NodeId) -> Result<Option<String>> {
        let effective = self.tree.effective(node)?;
        Ok(self
            .tree
            .props(effective)?
            .and_then(|props| props.namespace().map(str::to_string)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::config::RuntimeConfig;
    use crate::primitives::{Component, Node, Rendered, State};
    use crate::surface::{Document, Mutation};
    use crate::types::NS_SVG;

    #[test]
    fn test_materialize_element_tree() {
        let mut runtime = Runtime::new(Document::new());
        let node = runtime.intern(Node::element(
            "p",
            Props::new().with("class", "x"),
            [Node::text("a"), Node::element("b", Props::new(), [Node::text(1)])],
        ));

        let live = runtime.materialize(node, None, None).unwrap();
        assert_eq!(runtime.surface().to_markup(live), r#"<p class="x">a<b>1</b></p>"#);
        assert_eq!(runtime.live(node).unwrap(), Some(live));
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let mut runtime = Runtime::new(Document::new());
        let node = runtime.intern(Node::element("div", Props::new(), []));
        let first = runtime.materialize(node, None, None).unwrap();
        runtime.surface_mut().take_mutations();

        let second = runtime.materialize(node, None, None).unwrap();
        assert_eq!(first, second);
        assert!(runtime.surface().mutations().is_empty());
    }

    #[test]
    fn test_namespace_is_inherited_and_annotated() {
        let mut runtime = Runtime::new(Document::new());
        let node = runtime.intern(Node::element(
            "svg",
            Props::new(),
            [Node::element("rect", Props::new().with("width", 2), [])],
        ));
        let live = runtime.materialize(node, None, None).unwrap();
        let rect = runtime.tree().children(node).unwrap()[0];
        let rect_live = runtime.surface().children(live).unwrap()[0];

        assert_eq!(runtime.surface().namespace(rect_live), Some(NS_SVG));
        assert_eq!(runtime.surface().attribute_namespace(rect_live, "width"), Some(NS_SVG));
        let props = runtime.tree().props(rect).unwrap().unwrap();
        assert_eq!(props.namespace(), Some(NS_SVG), "child records the inherited namespace");
        assert_eq!(runtime.surface().attribute(rect_live, "xmlns"), None);
    }

    #[test]
    fn test_ref_fires_after_children() {
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let mut runtime = Runtime::new(Document::new());
        let node = runtime.intern(Node::element(
            "div",
            Props::new().with_ref(move |live, _| *sink.borrow_mut() = Some(live)),
            [Node::text("x")],
        ));

        let live = runtime.materialize(node, None, None).unwrap();
        assert_eq!(*seen.borrow(), Some(live));
    }

    #[test]
    fn test_fragment_root_attaches_children() {
        let mut runtime = Runtime::new(Document::new());
        let container = runtime.surface_mut().create_element("div", None);
        runtime
            .mount(Node::fragment([Node::text("a"), Node::text("b")]), container)
            .unwrap();
        assert_eq!(runtime.surface().inner_markup(container), "ab");
    }

    #[test]
    fn test_hoisted_child_is_cloned() {
        let mut runtime = Runtime::new(Document::new());
        let shared = runtime.intern(Node::element("i", Props::new(), [Node::text("x")]));
        let first_live = runtime.materialize(shared, None, None).unwrap();

        let parent = runtime.tree_mut().element("div", Props::new(), vec![shared]);
        let parent_live = runtime.materialize(parent, None, None).unwrap();

        let child = runtime.tree().children(parent).unwrap()[0];
        assert_ne!(child, shared, "record was copied");
        let child_live = runtime.live(child).unwrap().unwrap();
        assert_ne!(child_live, first_live, "live node was copied");
        assert_eq!(runtime.surface().parent(child_live), Some(parent_live));
        assert_eq!(runtime.surface().parent(first_live), None, "original stays where it was");
        assert!(runtime
            .surface()
            .mutations()
            .iter()
            .any(|m| matches!(m, Mutation::Clone { .. })));
    }

    #[test]
    fn test_hoisted_child_moves_without_cloning() {
        let config = RuntimeConfig::default().with_clone_hoisted(false);
        let mut runtime = Runtime::with_config(Document::new(), config);
        let shared = runtime.intern(Node::element("i", Props::new(), []));
        let first_live = runtime.materialize(shared, None, None).unwrap();

        let parent = runtime.tree_mut().element("div", Props::new(), vec![shared]);
        let parent_live = runtime.materialize(parent, None, None).unwrap();

        assert_eq!(runtime.surface().parent(first_live), Some(parent_live));
    }

    #[test]
    fn test_component_root_gets_scope() {
        #[derive(Default)]
        struct Card;
        impl Component for Card {
            fn render(&self, _props: &Props, _state: &State) -> Rendered {
                Node::element("section", Props::new(), []).into()
            }
            fn stylesheet(&self) -> Option<String> {
                Some("padding: 1px".into())
            }
        }

        let mut runtime = Runtime::new(Document::new());
        let container = runtime.surface_mut().create_element("div", None);
        let root = runtime.mount(Node::component::<Card>(Props::new()), container).unwrap();
        let live = runtime.live(root).unwrap().unwrap();

        let sheets = runtime.stylesheets();
        assert_eq!(sheets.len(), 1);
        assert_eq!(runtime.surface().attribute(live, "data-scope"), Some(sheets[0].scope.as_str()));
    }
}
