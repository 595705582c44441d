//! Todo list demo.
//!
//! Mounts a keyed list into an in-memory document, drives a few state
//! changes and prints the markup plus the surface mutations each step caused.
//!
//! Run with `RUST_LOG=spark_dom=debug cargo run --example todo` to see the
//! reconciler's own logging.

use serde_json::{json, Value};
use spark_dom::{
    Component, Document, Handle, LifecycleHooks, Node, Props, Rendered, Result, Runtime, State, Surface,
};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct TodoList;

impl Component for TodoList {
    fn render(&self, props: &Props, state: &State) -> Rendered {
        let items = state
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let draft = state.get("draft").and_then(Value::as_str).unwrap_or("");

        let rows = items.iter().filter_map(Value::as_str).map(|item| {
            Node::element("li", Props::new().with_key(item), [Node::text(item)])
        });

        Node::element(
            "section",
            Props::new().with("className", "todo"),
            [
                Node::element("h1", Props::new(), [Node::text(props.text("title").unwrap_or_default())]),
                Node::element("input", Props::new().with("value", draft).bind("input", "draft", "value"), []),
                Node::element("ul", Props::new(), rows),
            ],
        )
        .into()
    }

    fn hooks(&self) -> LifecycleHooks {
        LifecycleHooks::DID_MOUNT
    }

    fn initial_state(&self, _props: &Props) -> State {
        let mut state = State::new();
        state.insert("items".into(), json!([]));
        state
    }

    fn component_did_mount(&mut self, live: Handle) -> spark_dom::HookResult {
        tracing::info!(%live, "todo list mounted");
        Ok(())
    }

    fn stylesheet(&self) -> Option<String> {
        Some("li { list-style: square; }".into())
    }
}

fn items(list: &[&str]) -> State {
    let mut state = State::new();
    state.insert("items".into(), json!(list));
    state
}

fn report(runtime: &mut Runtime<Document>, container: Handle, step: &str) {
    let mutations = runtime.surface_mut().take_mutations();
    println!("== {step} ({} mutations)", mutations.len());
    for mutation in &mutations {
        println!("   {mutation:?}");
    }
    println!("   {}", runtime.surface().inner_markup(container));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut runtime = Runtime::new(Document::new());
    let container = runtime.surface_mut().create_element("main", None);

    let root = runtime.render(
        Node::component::<TodoList>(Props::new().with("title", "Errands")),
        container,
    )?;
    let list = runtime.instance_of(root)?;
    report(&mut runtime, container, "mount");

    for sheet in runtime.stylesheets() {
        println!("   stylesheet {}: {}", sheet.scope, sheet.css);
    }

    runtime.set_state(list, items(&["milk", "bread", "eggs"]))?;
    report(&mut runtime, container, "three items");

    runtime.set_state(list, items(&["eggs", "milk", "bread"]))?;
    report(&mut runtime, container, "rotate");

    let input = runtime
        .surface()
        .children(runtime.live(root)?.unwrap_or(container))?
        .get(1)
        .copied()
        .unwrap_or(container);
    runtime.dispatch_event(input, "input", Some("butter"));
    report(&mut runtime, container, "type into the input");

    runtime.set_state(list, items(&["eggs", "butter"]))?;
    report(&mut runtime, container, "replace items");

    Ok(())
}
