//! Handler error type, caught at the dispatch boundary.

use worldgate_session::SessionError;
use worldgate_wire::WireError;

/// What a handler can report back to the dispatcher.
///
/// Every variant except [`HandlerError::FatalDisconnect`] is per-message:
/// the message is dropped and logged, the session stays connected, and
/// subsequent messages are processed normally.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The payload failed structural decoding.
    #[error(transparent)]
    Malformed(#[from] WireError),

    /// A registry operation failed mid-handler.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An unexpected internal error. Processing of this one message
    /// aborts; the session survives.
    #[error("handler fault: {0}")]
    Fault(String),

    /// The handler decided the session must be torn down. The only
    /// error that ends a connection.
    #[error("fatal disconnect: {0}")]
    FatalDisconnect(String),
}

impl HandlerError {
    /// Returns `true` if this error ends the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalDisconnect(_))
    }
}
