//! Props Differ - Attribute diffing and application.
//!
//! [`diff_props`] compares two props maps and emits an ordered list of
//! [`PropOp`]s; applying them in order leaves every key at its new value.
//! Reserved entries (`key`, `ref`, event bindings, namespace markers) never
//! produce ops: refs fire once on creation and events go through the
//! listener table instead.

use std::rc::Rc;

use crate::engine::{InstanceId, NodeId};
use crate::error::Result;
use crate::primitives::{is_reserved, PropValue, Props};
use crate::surface::Surface;
use crate::types::{is_foreign_namespace, Handle, Scalar, NS_XLINK};

use super::Runtime;

/// Whether an op writes or clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropAction {
    Set,
    Remove,
}

/// One attribute operation, carrying everything needed to apply it.
#[derive(Debug, Clone)]
pub struct PropOp {
    pub action: PropAction,
    pub name: String,
    pub value: PropValue,
    pub namespace: Option<String>,
}

/// Ops turning `old` into `new`.
pub fn diff_props(new: &Props, old: &Props) -> Vec<PropOp> {
    let namespace = new.namespace().map(str::to_string);
    let mut ops = Vec::new();

    for (name, value) in new.iter() {
        if value.is_null() || is_reserved(name, value) {
            continue;
        }
        let unchanged = old.get(name).is_some_and(|prev| prev.same(value));
        if !unchanged {
            ops.push(PropOp {
                action: PropAction::Set,
                name: name.clone(),
                value: value.clone(),
                namespace: namespace.clone(),
            });
        }
    }

    for (name, value) in old.iter() {
        if value.is_null() || is_reserved(name, value) {
            continue;
        }
        let gone = new.get(name).is_none_or(PropValue::is_null);
        if gone {
            ops.push(PropOp {
                action: PropAction::Remove,
                name: name.clone(),
                value: PropValue::Null,
                namespace: namespace.clone(),
            });
        }
    }

    ops
}

/// Surface name and namespace for a prop.
fn target_name<'a>(name: &'a str, namespace: Option<&'a str>) -> (&'a str, Option<&'a str>) {
    match name {
        "xlink:href" => ("href", Some(NS_XLINK)),
        "className" => ("class", namespace.filter(|ns| is_foreign_namespace(ns))),
        _ => (name, namespace.filter(|ns| is_foreign_namespace(ns))),
    }
}

impl<S: Surface> Runtime<S> {
    /// Apply one op to a live node.
    pub fn apply_prop_op(&mut self, live: Handle, op: &PropOp) -> Result<()> {
        let (name, namespace) = target_name(&op.name, op.namespace.as_deref());
        tracing::trace!(%live, name, action = ?op.action, "prop");

        let value = match op.action {
            PropAction::Remove => return self.surface.remove_attribute(live, name, namespace),
            PropAction::Set => &op.value,
        };
        match value {
            PropValue::Scalar(Scalar::Bool(true)) => {
                self.surface.set_attribute(live, name, "", namespace)
            }
            PropValue::Scalar(Scalar::Bool(false)) | PropValue::Null => {
                self.surface.remove_attribute(live, name, namespace)
            }
            PropValue::Scalar(scalar) => {
                self.surface
                    .set_attribute(live, name, &scalar.to_string(), namespace)
            }
            PropValue::Object(map) => {
                if self.surface.has_object_property(live, name) {
                    self.surface.merge_object_property(live, name, map)
                } else {
                    self.surface.set_object_property(live, name, map)
                }
            }
            PropValue::Event(_) | PropValue::Ref(_) => Ok(()),
        }
    }

    /// Write every attribute and event of freshly created `live`.
    pub(crate) fn assign_props(
        &mut self,
        live: Handle,
        props: &Props,
        owner: Option<InstanceId>,
    ) -> Result<()> {
        for op in diff_props(props, &Props::new()) {
            self.apply_prop_op(live, &op)?;
        }
        self.assign_events(live, props, owner)
    }

    /// Diff and apply props of a patched pair, then adopt the new props.
    pub(crate) fn patch_props(
        &mut self,
        new: NodeId,
        old: NodeId,
        owner: Option<InstanceId>,
    ) -> Result<()> {
        let (Some(mut new_props), Some(old_props)) =
            (self.tree.props(new)?, self.tree.props(old)?)
        else {
            return Ok(());
        };
        let Some(live) = self.tree.live(old)? else {
            return Ok(());
        };

        // Keep the namespace resolved at creation
        if let (Some(ns), None) = (old_props.namespace(), new_props.namespace()) {
            let ns = ns.to_string();
            Rc::make_mut(&mut new_props).insert("xmlns", ns);
        }

        for op in diff_props(&new_props, &old_props) {
            self.apply_prop_op(live, &op)?;
        }
        self.rebind_events(live, &new_props, &old_props, owner)?;
        self.tree.set_props(old, new_props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ObjectMap;
    use crate::surface::Document;
    use crate::types::NS_SVG;

    fn names(ops: &[PropOp], action: PropAction) -> Vec<&str> {
        ops.iter()
            .filter(|op| op.action == action)
            .map(|op| op.name.as_str())
            .collect()
    }

    #[test]
    fn test_diff_sets_changed_and_removes_missing() {
        let old = Props::new().with("id", "a").with("title", "t").with("hidden", true);
        let new = Props::new().with("id", "b").with("title", "t").with("lang", "en");

        let ops = diff_props(&new, &old);
        assert_eq!(names(&ops, PropAction::Set), vec!["id", "lang"]);
        assert_eq!(names(&ops, PropAction::Remove), vec!["hidden"]);
    }

    #[test]
    fn test_diff_null_counts_as_absent() {
        let old = Props::new().with("id", "a");
        let new = Props::new().with("id", PropValue::Null);

        let ops = diff_props(&new, &old);
        assert_eq!(names(&ops, PropAction::Set), Vec::<&str>::new());
        assert_eq!(names(&ops, PropAction::Remove), vec!["id"]);
    }

    #[test]
    fn test_diff_skips_reserved() {
        let old = Props::new();
        let new = Props::new()
            .with_key("k")
            .with_ref(|_, _| {})
            .on("click", |_| Ok(()))
            .with("xmlns", NS_SVG);

        assert!(diff_props(&new, &old).is_empty());
    }

    #[test]
    fn test_diff_carries_namespace() {
        let new = Props::new().with("xmlns", NS_SVG).with("width", 10);
        let ops = diff_props(&new, &Props::new());
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].namespace.as_deref(), Some(NS_SVG));
    }

    #[test]
    fn test_apply_normalizes_names_and_booleans() {
        let mut runtime = Runtime::new(Document::new());
        let live = runtime.surface.create_element("input", None);

        let props = Props::new()
            .with("className", "field")
            .with("disabled", true)
            .with("checked", false)
            .with("xlink:href", "#icon");
        runtime.assign_props(live, &props, None).unwrap();

        let doc = runtime.surface();
        assert_eq!(doc.attribute(live, "class"), Some("field"));
        assert_eq!(doc.attribute(live, "disabled"), Some(""));
        assert_eq!(doc.attribute(live, "checked"), None);
        assert_eq!(doc.attribute(live, "href"), Some("#icon"));
        assert_eq!(doc.attribute_namespace(live, "href"), Some(NS_XLINK));
    }

    #[test]
    fn test_svg_attributes_use_namespace() {
        let mut runtime = Runtime::new(Document::new());
        let live = runtime.surface.create_element("rect", Some(NS_SVG));
        let props = Props::new().with("xmlns", NS_SVG).with("width", 4);
        runtime.assign_props(live, &props, None).unwrap();

        assert_eq!(runtime.surface().attribute_namespace(live, "width"), Some(NS_SVG));
    }

    #[test]
    fn test_objects_merge_once_set() {
        let mut runtime = Runtime::new(Document::new());
        let live = runtime.surface.create_element("div", None);

        let mut first = ObjectMap::new();
        first.insert("color".into(), "red".into());
        let mut second = ObjectMap::new();
        second.insert("width".into(), 10.into());

        let op = |map: ObjectMap| PropOp {
            action: PropAction::Set,
            name: "style".into(),
            value: PropValue::Object(map),
            namespace: None,
        };
        runtime.apply_prop_op(live, &op(first)).unwrap();
        runtime.apply_prop_op(live, &op(second)).unwrap();

        let style = runtime.surface().object_property(live, "style").unwrap();
        assert_eq!(style.len(), 2, "second write merges into the first");
    }
}
