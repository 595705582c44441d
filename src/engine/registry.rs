//! Component Registry - Per-type side table.
//!
//! Caches what belongs to a component *type* rather than an instance:
//! - the constructor adapter built for function components
//! - the scoped stylesheet (scope id + compiled css), computed once
//!
//! Owned by the runtime, keyed by the type's `TypeId`.

use std::any::TypeId;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::RuntimeConfig;
use crate::primitives::{
    Component, ComponentKind, ComponentType, Constructor, FunctionComponent, Props,
};

/// Alphabet scope ids are drawn from.
const SCOPE_CHARS: &[u8; 52] = b"JrIFgLKeEuQUPbhBnWZCTXDtRcxwSzaqijOvfpklYdAoMHmsVNGy";

/// Length of a scope id.
const SCOPE_LEN: u32 = 5;

/// Odd multiplier coprime with 52^5, so sequential counters map to distinct ids.
const SCOPE_MIX: u64 = 2_654_435_761;

/// A compiled, scoped stylesheet for one component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub component: &'static str,
    pub scope: String,
    pub css: String,
}

#[derive(Default)]
pub struct ComponentRegistry {
    constructors: HashMap<TypeId, Constructor>,
    styles: HashMap<TypeId, Option<usize>>,
    sheets: Vec<Stylesheet>,
    next_scope: u64,
    adapters_built: usize,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    /// Constructor for a component type. Function components are wrapped in
    /// an adapter built once per type.
    pub fn resolve(&mut self, ty: &ComponentType) -> Constructor {
        let render = match ty.kind() {
            ComponentKind::Class(constructor) => return constructor.clone(),
            ComponentKind::Function(render) => render,
        };
        if let Some(constructor) = self.constructors.get(&ty.id()) {
            return constructor.clone();
        }

        let render = render.clone();
        let name = ty.name();
        let constructor: Constructor = Rc::new(move |_: &Props| -> Box<dyn Component> {
            Box::new(FunctionComponent::new(render.clone(), name))
        });
        self.adapters_built += 1;
        self.constructors.insert(ty.id(), constructor.clone());
        constructor
    }

    /// Number of function-component adapters built so far.
    pub fn adapters_built(&self) -> usize {
        self.adapters_built
    }

    // =========================================================================
    // Stylesheets
    // =========================================================================

    /// Scope id for a component type, compiling its stylesheet on first use.
    /// `None` when the type has no stylesheet.
    pub fn scope(
        &mut self,
        type_id: TypeId,
        component: &dyn Component,
        config: &RuntimeConfig,
    ) -> Option<String> {
        if let Some(entry) = self.styles.get(&type_id) {
            return entry.map(|index| self.sheets[index].scope.clone());
        }

        let Some(css) = component.stylesheet() else {
            self.styles.insert(type_id, None);
            return None;
        };

        let scope = self.next_scope_id();
        let selector = format!("[{}={}]", config.scope_attribute, scope);
        let css = config.compile_style(&selector, &css);
        tracing::debug!(component = component.name(), %scope, "compiled stylesheet");

        self.sheets.push(Stylesheet {
            component: component.name(),
            scope: scope.clone(),
            css,
        });
        self.styles.insert(type_id, Some(self.sheets.len() - 1));
        Some(scope)
    }

    /// Every compiled stylesheet, in first-use order.
    pub fn stylesheets(&self) -> &[Stylesheet] {
        &self.sheets
    }

    fn next_scope_id(&mut self) -> String {
        let space = 52u64.pow(SCOPE_LEN);
        let mut value = (self.next_scope.wrapping_mul(SCOPE_MIX)) % space;
        self.next_scope += 1;

        let mut id = String::with_capacity(SCOPE_LEN as usize);
        for _ in 0..SCOPE_LEN {
            id.push(SCOPE_CHARS[(value % 52) as usize] as char);
            value /= 52;
        }
        id
    }
}
