//! Engine - Arena storage behind the reconciler.
//!
//! - Arena: generational slot storage with a free list
//! - Tree: interned nodes ([`VNode`]) addressed by [`NodeId`]
//! - Instance: component instances addressed by [`InstanceId`]
//! - Registry: per-component-type side table (constructors, stylesheets)
//!
//! # Architecture
//!
//! Nodes and instances never point at each other directly:
//!
//! ```text
//! NodeId(Component) --owner--> InstanceId --node--> NodeId(Component)
//!        |                         |
//!     rendered                   root
//!        v                         v
//! NodeId(Element)  <---------------+
//! ```
//!
//! Freed ids go stale instead of dangling.

mod arena;
mod instance;
mod registry;
mod tree;

pub use arena::{Arena, Index};
pub use instance::*;
pub use registry::*;
pub use tree::*;
