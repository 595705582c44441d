//! Hydration - Claiming server-rendered live nodes.
//!
//! Instead of creating nodes, hydration walks the declarative tree alongside
//! an existing surface and binds each node to the live child at the same
//! index. Children are queued on the [`Scheduler`](super::Scheduler) and
//! claimed one per tick.
//!
//! Markup merges adjacent text nodes and drops empty ones, so a run of Text
//! siblings faces at most one live text node. A run of two or more is split:
//! one fresh text node per sibling replaces the merged one, or is inserted
//! at the run's index when every text in it is empty.
//!
//! Hydration binds listeners but writes no attributes and fires no mount
//! hooks.

use crate::engine::{InstanceId, NodeId, VKind};
use crate::error::Result;
use crate::surface::Surface;
use crate::types::Handle;

use super::Runtime;

impl<S: Surface> Runtime<S> {
    /// Claim the live child at `index` of `parent` for `node`, then queue its
    /// children.
    pub fn hydrate(
        &mut self,
        parent: Handle,
        node: NodeId,
        index: usize,
        parent_node: Option<NodeId>,
        owner: Option<InstanceId>,
    ) -> Result<()> {
        if self.tree.live(node)?.is_some() {
            return Ok(());
        }

        let resolved = self.extract_component(node)?;
        let owner = self.tree.owner_chain(node)?.last().copied().or(owner);

        match self.tree.kind(resolved)? {
            VKind::Element { tag, props, .. } => {
                let (tag, props) = (tag.clone(), props.clone());
                let Some(live) = self.surface.child_at(parent, index) else {
                    tracing::warn!(%parent, index, %tag, "hydration target missing");
                    return Ok(());
                };
                let matches = self
                    .surface
                    .tag(live)
                    .is_some_and(|found| found.eq_ignore_ascii_case(&tag));
                if !matches {
                    tracing::warn!(%live, expected = %tag, found = ?self.surface.tag(live), "hydration tag mismatch");
                    return Ok(());
                }

                self.tree.set_handle(resolved, Some(live))?;
                self.schedule_children(live, resolved, owner)?;
                if let Some(callback) = props.ref_callback() {
                    callback(live, owner);
                }
                self.assign_events(live, &props, owner)?;
                tracing::trace!(node = %resolved, %live, "hydrated");
            }
            VKind::Fragment { .. } => {
                self.tree.set_handle(resolved, Some(parent))?;
                self.schedule_children(parent, resolved, owner)?;
            }
            VKind::Text(_) => self.hydrate_text(parent, resolved, index, parent_node)?,
            VKind::Component { .. } => {}
        }
        Ok(())
    }

    fn hydrate_text(
        &mut self,
        parent: Handle,
        node: NodeId,
        index: usize,
        parent_node: Option<NodeId>,
    ) -> Result<()> {
        let run = match parent_node {
            Some(parent_node) => self.text_run(parent_node, node)?,
            None => vec![node],
        };
        let target = self.surface.child_at(parent, index);
        let merged = target.filter(|&live| self.surface.text(live).is_some());

        let mut texts = Vec::with_capacity(run.len());
        for &sibling in &run {
            texts.push(text_of(self.tree.kind(sibling)?).unwrap_or_default());
        }

        if let (Some(live), 1) = (merged, run.len()) {
            self.tree.set_handle(node, Some(live))?;
            return Ok(());
        }
        // Empty text leaves nothing behind in markup
        if merged.is_none() && texts.iter().any(|text| !text.is_empty()) {
            tracing::warn!(%parent, index, "hydration expected text");
            return Ok(());
        }

        let fragment = self.surface.create_fragment();
        for (&sibling, text) in run.iter().zip(&texts) {
            let handle = self.surface.create_text(text);
            self.surface.append_child(fragment, handle)?;
            self.tree.set_handle(sibling, Some(handle))?;
        }
        match merged {
            Some(live) => self.surface.replace_child(parent, fragment, live)?,
            None => self.surface.insert_before(parent, fragment, target)?,
        }
        tracing::debug!(%parent, index, split = run.len(), "text run split");
        Ok(())
    }

    /// `node` and the Text siblings directly following it.
    fn text_run(&self, parent_node: NodeId, node: NodeId) -> Result<Vec<NodeId>> {
        let siblings = self.tree.children(parent_node)?;
        let Some(start) = siblings.iter().position(|&s| s == node) else {
            return Ok(vec![node]);
        };
        let mut run = Vec::new();
        for &sibling in &siblings[start..] {
            if !self.tree.get(sibling)?.is_text() {
                break;
            }
            run.push(sibling);
        }
        Ok(run)
    }
}

fn text_of(kind: &VKind) -> Option<String> {
    match kind {
        VKind::Text(value) => Some(value.to_text()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::primitives::{Node, Props};
    use crate::surface::{Document, Mutation};

    /// `<div hydrate><p>foobar</p><button>go</button></div>`
    fn server_markup(doc: &mut Document) -> Handle {
        let container = doc.create_element("div", None);
        doc.set_attribute(container, "hydrate", "", None).unwrap();
        let p = doc.create_element("p", None);
        let text = doc.create_text("foobar");
        doc.append_child(p, text).unwrap();
        doc.append_child(container, p).unwrap();
        let button = doc.create_element("button", None);
        let label = doc.create_text("go");
        doc.append_child(button, label).unwrap();
        doc.append_child(container, button).unwrap();
        doc.take_mutations();
        container
    }

    #[test]
    fn test_render_hydrates_marked_container() {
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let mut doc = Document::new();
        let container = server_markup(&mut doc);
        let mut runtime = Runtime::new(doc);

        let app = Node::fragment([
            Node::element("p", Props::new(), [Node::text("foo"), Node::text("bar")]),
            Node::element(
                "button",
                Props::new().on("click", move |_| {
                    counter.set(counter.get() + 1);
                    Ok(())
                }),
                [Node::text("go")],
            ),
        ]);
        let root = runtime.render(app, container).unwrap();

        assert_eq!(runtime.surface().attribute(container, "hydrate"), None);
        assert!(runtime.pending_tasks() > 0, "children are claimed on later ticks");
        runtime.run_until_idle().unwrap();

        let creates = runtime
            .surface()
            .mutations()
            .iter()
            .filter(|m| m.is_create())
            .count();
        assert_eq!(creates, 3, "only the split text run is created (fragment + 2 texts)");

        let p = runtime.surface().children(container).unwrap()[0];
        let texts: Vec<_> = runtime
            .surface()
            .children(p)
            .unwrap()
            .iter()
            .map(|&t| runtime.surface().text(t).unwrap().to_string())
            .collect();
        assert_eq!(texts, vec!["foo", "bar"]);

        let button = runtime.surface().children(container).unwrap()[1];
        assert!(runtime.dispatch_event(button, "click", None));
        assert_eq!(clicks.get(), 1);

        let fragment = runtime.tree().children(root).unwrap().to_vec();
        assert_eq!(runtime.live(fragment[0]).unwrap(), Some(p));
    }

    #[test]
    fn test_matching_text_is_claimed_without_split() {
        let mut doc = Document::new();
        let container = doc.create_element("div", None);
        doc.set_attribute(container, "hydrate", "", None).unwrap();
        let p = doc.create_element("p", None);
        let text = doc.create_text("foo");
        doc.append_child(p, text).unwrap();
        doc.append_child(container, p).unwrap();
        doc.take_mutations();

        let mut runtime = Runtime::new(doc);
        let root = runtime
            .render(Node::element("p", Props::new(), [Node::text("foo")]), container)
            .unwrap();
        runtime.run_until_idle().unwrap();

        let child = runtime.tree().children(root).unwrap()[0];
        assert_eq!(runtime.live(child).unwrap(), Some(text));
        assert!(!runtime.surface().mutations().iter().any(Mutation::is_create));
    }

    #[test]
    fn test_empty_text_in_run_keeps_siblings_aligned() {
        let mut doc = Document::new();
        let container = doc.create_element("div", None);
        doc.set_attribute(container, "hydrate", "", None).unwrap();
        let p = doc.create_element("p", None);
        let a = doc.create_text("a");
        doc.append_child(p, a).unwrap();
        let b = doc.create_element("b", None);
        let x = doc.create_text("x");
        doc.append_child(b, x).unwrap();
        doc.append_child(p, b).unwrap();
        doc.append_child(container, p).unwrap();
        doc.take_mutations();

        let mut runtime = Runtime::new(doc);
        let root = runtime
            .render(
                Node::element(
                    "p",
                    Props::new(),
                    [
                        Node::text("a"),
                        Node::text(""),
                        Node::element("b", Props::new(), [Node::text("x")]),
                    ],
                ),
                container,
            )
            .unwrap();
        runtime.run_until_idle().unwrap();

        let children = runtime.tree().children(root).unwrap().to_vec();
        assert!(runtime.live(children[0]).unwrap().is_some());
        assert!(runtime.live(children[1]).unwrap().is_some());
        assert_eq!(runtime.live(children[2]).unwrap(), Some(b));
        let label = runtime.tree().children(children[2]).unwrap()[0];
        assert_eq!(runtime.live(label).unwrap(), Some(x));
        assert_eq!(runtime.surface().children(p).unwrap().len(), 3);
    }

    #[test]
    fn test_leading_empty_text_is_inserted() {
        let mut doc = Document::new();
        let container = doc.create_element("div", None);
        doc.set_attribute(container, "hydrate", "", None).unwrap();
        let p = doc.create_element("p", None);
        let b = doc.create_element("b", None);
        doc.append_child(p, b).unwrap();
        doc.append_child(container, p).unwrap();
        doc.take_mutations();

        let mut runtime = Runtime::new(doc);
        let root = runtime
            .render(
                Node::element("p", Props::new(), [Node::text(""), Node::element("b", Props::new(), [])]),
                container,
            )
            .unwrap();
        runtime.run_until_idle().unwrap();

        let children = runtime.tree().children(root).unwrap().to_vec();
        let empty = runtime.live(children[0]).unwrap().unwrap();
        assert_eq!(runtime.surface().children(p).unwrap(), &[empty, b]);
        assert_eq!(runtime.live(children[1]).unwrap(), Some(b));
    }

    #[test]
    fn test_tag_mismatch_is_skipped() {
        let mut doc = Document::new();
        let container = doc.create_element("div", None);
        doc.set_attribute(container, "hydrate", "", None).unwrap();
        let span = doc.create_element("span", None);
        doc.append_child(container, span).unwrap();

        let mut runtime = Runtime::new(doc);
        let root = runtime
            .render(Node::element("p", Props::new(), []), container)
            .unwrap();
        assert_eq!(runtime.live(root).unwrap(), None);
    }

    #[test]
    fn test_released_nodes_cancel_their_tasks() {
        let mut doc = Document::new();
        let container = server_markup(&mut doc);
        let mut runtime = Runtime::new(doc);
        let p = runtime.intern(Node::element(
            "p",
            Props::new(),
            [Node::text("foo"), Node::text("bar")],
        ));
        runtime.hydrate(container, p, 0, None, None).unwrap();
        assert_eq!(runtime.pending_tasks(), 2);

        runtime.discard(p);
        assert!(!runtime.tick().unwrap());
        assert_eq!(runtime.pending_tasks(), 0);
    }

    #[test]
    fn test_unmarked_container_mounts() {
        let mut runtime = Runtime::new(Document::new());
        let container = runtime.surface_mut().create_element("div", None);
        runtime
            .render(Node::element("p", Props::new(), [Node::text("x")]), container)
            .unwrap();
        assert_eq!(runtime.pending_tasks(), 0);
        assert_eq!(runtime.surface().inner_markup(container), "<p>x</p>");
    }
}
