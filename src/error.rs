//! Error types.
//!
//! Reconciliation never fails for data-shape reasons (type mismatches replace,
//! duplicate keys resolve last-wins). What can fail is the live surface
//! (stale or foreign handles) and user code: lifecycle hooks propagate their
//! errors and abort the patch in progress, event handlers are isolated through
//! [`guarded`].

use crate::engine::{InstanceId, NodeId};
use crate::types::Handle;

/// Error produced by user code (hooks, event handlers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Return type of lifecycle hooks and event handlers.
pub type HookResult = std::result::Result<(), BoxError>;

/// Crate result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown live handle {0}")]
    UnknownHandle(Handle),

    #[error("live node {child} is not a child of {parent}")]
    NotAChild { parent: Handle, child: Handle },

    #[error("live node {0} has no parent")]
    Detached(Handle),

    #[error("node {0:?} is no longer in the tree")]
    StaleNode(NodeId),

    #[error("component instance {0:?} has been destroyed")]
    StaleInstance(InstanceId),

    #[error("node {0:?} is not mounted")]
    NotMounted(NodeId),

    #[error("node {0:?} is not a component")]
    NotAComponent(NodeId),

    /// A lifecycle hook returned an error. The surface is left as it was when
    /// the hook ran.
    #[error("{component}::{hook} failed")]
    Hook {
        hook: &'static str,
        component: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("handler for `{event}` failed")]
    Handler {
        event: String,
        #[source]
        source: BoxError,
    },
}

/// Run `f`, isolating its failure.
///
/// The error is logged, forwarded to `on_error` when present, and swallowed.
pub fn guarded<T>(
    f: impl FnOnce() -> Result<T>,
    on_error: Option<&dyn Fn(&Error)>,
) -> Option<T> {
    match f() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, "isolated handler failure");
            if let Some(report) = on_error {
                report(&err);
            }
            None
        }
    }
}
