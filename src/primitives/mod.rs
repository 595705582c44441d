//! Primitives - The declarative vocabulary.
//!
//! - [`Node`] - element, component, fragment and text nodes
//! - [`Props`] - ordered props map with reserved `key`/`ref`/`on*` entries
//! - [`Component`] - stateful components with optional lifecycle hooks
//!
//! Nothing here touches a surface. Nodes are plain values until a
//! [`Runtime`](crate::pipeline::Runtime) interns and materializes them.

mod component;
mod node;
mod props;

pub use component::*;
pub use node::*;
pub use props::*;
