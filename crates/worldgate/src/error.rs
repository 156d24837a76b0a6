//! Unified error type for the Worldgate layers.

use worldgate_chat::RelayError;
use worldgate_dispatch::HandlerError;
use worldgate_session::SessionError;
use worldgate_wire::WireError;

/// Top-level error that wraps all layer-specific errors.
///
/// Callers of the meta crate deal with this single type; the `#[from]`
/// attributes let `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WorldgateError {
    /// A wire-level error (malformed frame).
    #[error(transparent)]
    Wire(#[from] WireError),

    /// A session-level error (registry, lifecycle).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A handler error surfaced past the dispatch boundary.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// A relay error.
    #[error(transparent)]
    Relay(#[from] RelayError),
}
