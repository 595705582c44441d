//! # spark-dom
//!
//! Virtual-tree reconciliation for Rust.
//!
//! A declarative [`Node`] tree is interned into an arena, materialized onto a
//! live [`Surface`] and, on every re-render, patched against what is mounted so
//! that only the differences reach the surface.
//!
//! ## Architecture
//!
//! Nodes are arena records addressed by generational [`NodeId`]s rather than
//! objects pointing at each other. Each record carries its live [`Handle`] and
//! the component instance that rendered it. Components are trait objects
//! driven by the [`Runtime`]; their optional lifecycle hooks are declared with
//! [`LifecycleHooks`] bitflags.
//!
//! ```text
//! Node --> intern --> materialize --> Surface
//!                \--> patch (index walk, keyed) --> mutation primitives --> Surface
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (Handle, Scalar, PatchAction, LifecycleHooks, Event)
//! - [`primitives`] - Declarative nodes, props and the Component trait
//! - [`engine`] - Node arena, component instances, per-type registry
//! - [`surface`] - The Surface trait and the in-memory Document
//! - [`pipeline`] - The Runtime: materialize, patch, lifecycle, hydration
//! - [`config`] / [`error`] - Runtime configuration and error types

pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod surface;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{ErrorHandler, RuntimeConfig, StyleCompiler};

pub use error::{guarded, BoxError, Error, HookResult, Result};

pub use engine::{ComponentInstance, InstanceId, NodeId, NodeType, Stylesheet, Tree, VKind, VNode};

pub use pipeline::{diff_props, ChildKey, HydrateTask, PropAction, PropOp, Runtime, Scheduler};

pub use primitives::{
    Component, ComponentKind, ComponentType, EventBinding, EventHandler, Node, ObjectMap,
    PropValue, Props, RefCallback, Rendered, State,
};

pub use surface::{Document, Listener, Mutation, Surface};
