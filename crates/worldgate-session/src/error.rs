//! Error types for the session layer.

use worldgate_wire::SessionId;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session id is already registered.
    #[error("session {0} is already registered")]
    AlreadyRegistered(SessionId),

    /// No registered session with this id. Expected after a disconnect
    /// races a late frame.
    #[error("unknown session {0}")]
    Unknown(SessionId),

    /// The session is not world-connected, so it cannot be registered
    /// for chat/movement routing.
    #[error("session {0} is not world-connected")]
    NotWorldConnected(SessionId),
}
