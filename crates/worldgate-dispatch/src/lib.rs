//! Message dispatch for Worldgate.
//!
//! A [`DispatchTable`] maps `(opcode, required connection state)` to a
//! handler. The table is assembled once at startup through
//! [`DispatchTableBuilder`]; registration is explicit and static, there
//! is no runtime discovery.
//!
//! Dispatch decisions:
//!
//! - unknown opcode → logged "unhandled opcode", dropped, not fatal;
//! - known opcode, wrong connection state → dropped silently (clients
//!   race the server around connect/disconnect; this is protocol skew,
//!   not an error);
//! - handler error → caught here, logged with session identity and
//!   opcode; the session survives unless the handler explicitly signals
//!   [`HandlerError::FatalDisconnect`].
//!
//! Handlers run synchronously to completion, so one session's messages
//! are processed strictly in order by its worker; workers for different
//! sessions run concurrently.

mod error;
mod table;

pub use error::HandlerError;
pub use table::{
    DispatchOutcome, DispatchTable, DispatchTableBuilder, Handler, StateRequirement,
};
