//! Event binding and dispatch.
//!
//! `on*` props are installed as surface listeners keyed by the lowercase event
//! name. Bind-to-state listeners are cached per owning instance and event so
//! re-renders hand the surface the same listener. Dispatch isolates failures
//! through [`guarded`]: a failing handler is logged and reported to the
//! configured error handler, never propagated.

use serde_json::Value;

use crate::engine::InstanceId;
use crate::error::{guarded, Error, Result};
use crate::primitives::{event_name, is_event_name, EventBinding, PropValue, Props};
use crate::surface::{Listener, Surface};
use crate::types::{Event, Handle};

use super::Runtime;

fn bindings(props: &Props) -> impl Iterator<Item = (String, &EventBinding)> {
    props.iter().filter_map(|(name, value)| match value {
        PropValue::Event(binding) if is_event_name(name) => Some((event_name(name), binding)),
        _ => None,
    })
}

impl<S: Surface> Runtime<S> {
    /// Install every event binding of `props` on `live`.
    pub(crate) fn assign_events(
        &mut self,
        live: Handle,
        props: &Props,
        owner: Option<InstanceId>,
    ) -> Result<()> {
        for (event, binding) in bindings(props) {
            if let Some(listener) = self.listener_for(&event, binding, owner)? {
                self.surface.set_listener(live, &event, listener)?;
            }
        }
        Ok(())
    }

    /// Bring the listeners of a patched node in line with its new props.
    pub(crate) fn rebind_events(
        &mut self,
        live: Handle,
        new: &Props,
        old: &Props,
        owner: Option<InstanceId>,
    ) -> Result<()> {
        let previous: Vec<(String, EventBinding)> = bindings(old)
            .map(|(event, binding)| (event, binding.clone()))
            .collect();

        for (event, binding) in bindings(new) {
            let unchanged = previous
                .iter()
                .any(|(name, prev)| *name == event && prev.same(binding));
            if unchanged {
                continue;
            }
            if let Some(listener) = self.listener_for(&event, binding, owner)? {
                tracing::trace!(%live, event, "listener rebound");
                self.surface.set_listener(live, &event, listener)?;
            }
        }

        for (event, _) in previous {
            if !bindings(new).any(|(name, _)| name == event) {
                self.surface.remove_listener(live, &event)?;
            }
        }
        Ok(())
    }

    fn listener_for(
        &mut self,
        event: &str,
        binding: &EventBinding,
        owner: Option<InstanceId>,
    ) -> Result<Option<Listener>> {
        let (property, attribute) = match binding {
            EventBinding::Handler(handler) => return Ok(Some(Listener::Handler(handler.clone()))),
            EventBinding::Bind {
                property,
                attribute,
            } => (property, attribute),
        };
        let Some(instance) = owner else {
            tracing::warn!(event, property, "state binding outside a component, skipped");
            return Ok(None);
        };

        let record = self.instance_mut(instance)?;
        let cached = record.listeners.get(event).filter(|listener| {
            matches!(listener, Listener::BindState { property: p, attribute: a, .. }
                if p == property && a == attribute)
        });
        if let Some(listener) = cached {
            return Ok(Some(listener.clone()));
        }

        let listener = Listener::BindState {
            instance,
            property: property.clone(),
            attribute: attribute.clone(),
        };
        record.listeners.insert(event.to_string(), listener.clone());
        Ok(Some(listener))
    }

    /// Dispatch `event` to the listener on `target`. Returns whether a
    /// listener was found; its failure is isolated.
    pub fn dispatch_event(&mut self, target: Handle, event: &str, value: Option<&str>) -> bool {
        let Some(listener) = self.surface.listener(target, event) else {
            tracing::trace!(%target, event, "no listener");
            return false;
        };
        let on_error = self.config.on_error.clone();

        match listener {
            Listener::Handler(handler) => {
                let mut dispatched = Event::new(event, target);
                dispatched.value = value.map(str::to_string);
                guarded(
                    || {
                        handler(&dispatched).map_err(|source| Error::Handler {
                            event: event.to_string(),
                            source,
                        })
                    },
                    on_error.as_deref(),
                );
            }
            Listener::BindState {
                instance,
                property,
                attribute,
            } => {
                let value = value
                    .or_else(|| self.surface.attribute(target, &attribute))
                    .unwrap_or_default()
                    .to_string();
                guarded(
                    || {
                        let record = self.instance_mut(instance)?;
                        record.state.insert(property, Value::String(value));
                        self.force_update(instance)
                    },
                    on_error.as_deref(),
                );
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::config::RuntimeConfig;
    use crate::primitives::{Component, Node, Rendered, State};
    use crate::surface::Document;

    #[test]
    fn test_handler_receives_event() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut runtime = Runtime::new(Document::new());
        let container = runtime.surface_mut().create_element("div", None);
        let root = runtime
            .mount(
                Node::element(
                    "button",
                    Props::new().on("click", move |e| {
                        sink.borrow_mut().push(e.name.clone());
                        Ok(())
                    }),
                    [],
                ),
                container,
            )
            .unwrap();
        let button = runtime.live(root).unwrap().unwrap();

        assert!(runtime.dispatch_event(button, "click", None));
        assert!(!runtime.dispatch_event(button, "keydown", None));
        assert_eq!(*seen.borrow(), vec!["click"]);
    }

    #[test]
    fn test_failing_handler_is_isolated() {
        let reported = Rc::new(Cell::new(0));
        let counter = reported.clone();
        let config = RuntimeConfig::default().with_error_handler(move |_| counter.set(counter.get() + 1));
        let mut runtime = Runtime::with_config(Document::new(), config);
        let container = runtime.surface_mut().create_element("div", None);
        let root = runtime
            .mount(
                Node::element("button", Props::new().on("click", |_| Err("broken".into())), []),
                container,
            )
            .unwrap();
        let button = runtime.live(root).unwrap().unwrap();

        assert!(runtime.dispatch_event(button, "click", None));
        assert_eq!(reported.get(), 1);
    }

    #[test]
    fn test_rebind_replaces_and_removes() {
        let mut runtime = Runtime::new(Document::new());
        let container = runtime.surface_mut().create_element("div", None);
        let hits = Rc::new(Cell::new(0));
        let first = hits.clone();
        let root = runtime
            .mount(
                Node::element(
                    "input",
                    Props::new()
                        .on("click", move |_| {
                            first.set(first.get() + 1);
                            Ok(())
                        })
                        .on("focus", |_| Ok(())),
                    [],
                ),
                container,
            )
            .unwrap();
        let input = runtime.live(root).unwrap().unwrap();

        let second = hits.clone();
        runtime
            .update(
                root,
                Node::element(
                    "input",
                    Props::new().on("click", move |_| {
                        second.set(second.get() + 10);
                        Ok(())
                    }),
                    [],
                ),
            )
            .unwrap();

        runtime.dispatch_event(input, "click", None);
        assert_eq!(hits.get(), 10, "new handler is installed");
        assert!(runtime.surface().listener(input, "focus").is_none());
    }

    struct Field;

    impl Component for Field {
        fn render(&self, _props: &Props, state: &State) -> Rendered {
            let value = state.get("value").and_then(|v| v.as_str()).unwrap_or("");
            Node::element(
                "label",
                Props::new(),
                [
                    Node::element("input", Props::new().bind("input", "value", "value"), []),
                    Node::text(value),
                ],
            )
            .into()
        }
    }

    #[test]
    fn test_bind_to_state() {
        let mut runtime = Runtime::new(Document::new());
        let container = runtime.surface_mut().create_element("div", None);
        let root = runtime
            .mount(Node::factory(|_| Field, Props::new()), container)
            .unwrap();
        let label = runtime.live(root).unwrap().unwrap();
        let input = runtime.surface().children(label).unwrap()[0];

        assert!(runtime.dispatch_event(input, "input", Some("hello")));

        let instance = runtime.instance_of(root).unwrap();
        assert_eq!(
            runtime.state(instance).unwrap().get("value"),
            Some(&Value::String("hello".into()))
        );
        assert_eq!(runtime.surface().text_content(label), "hello");
        assert_eq!(
            runtime.instance(instance).unwrap().listeners.len(),
            1,
            "listener cached per event"
        );
    }

    #[test]
    fn test_bind_falls_back_to_attribute() {
        let mut runtime = Runtime::new(Document::new());
        let container = runtime.surface_mut().create_element("div", None);
        let root = runtime
            .mount(Node::factory(|_| Field, Props::new()), container)
            .unwrap();
        let label = runtime.live(root).unwrap().unwrap();
        let input = runtime.surface().children(label).unwrap()[0];
        runtime.surface_mut().set_attribute(input, "value", "typed", None).unwrap();

        runtime.dispatch_event(input, "input", None);
        assert_eq!(runtime.surface().text_content(label), "typed");
    }

    #[test]
    fn test_bind_without_owner_is_skipped() {
        let mut runtime = Runtime::new(Document::new());
        let container = runtime.surface_mut().create_element("div", None);
        let root = runtime
            .mount(Node::element("input", Props::new().bind("input", "v", "value"), []), container)
            .unwrap();
        let input = runtime.live(root).unwrap().unwrap();
        assert!(runtime.surface().listener(input, "input").is_none());
    }
}
