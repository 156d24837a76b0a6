//! The dispatch table itself.

use std::collections::HashMap;
use std::sync::Arc;

use worldgate_session::{ConnectionState, Session};
use worldgate_wire::{FrameReader, Opcode};

use crate::HandlerError;

/// A message handler: runs synchronously against the decoded payload
/// (the frame bytes after the opcode) in the context of one session.
pub type Handler = Arc<dyn Fn(&Arc<Session>, &[u8]) -> Result<(), HandlerError> + Send + Sync>;

/// The connection state a handler requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRequirement {
    /// Any state, including mid-teardown.
    Any,
    /// Exactly this state.
    Exactly(ConnectionState),
}

impl StateRequirement {
    fn satisfied_by(self, state: ConnectionState) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(required) => required == state,
        }
    }
}

struct HandlerEntry {
    required: StateRequirement,
    handler: Handler,
}

/// What the dispatcher decided about one frame. Observed by the session
/// worker (to act on `Disconnect`) and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran to completion.
    Handled,
    /// No entry matched the opcode; the frame was dropped.
    Unhandled(u32),
    /// The opcode matched but the session's state did not; dropped
    /// silently as expected protocol skew.
    OutOfSequence,
    /// The frame could not provide an opcode (shorter than four bytes).
    Malformed,
    /// The handler faulted; the message was aborted, the session lives.
    Faulted,
    /// The handler explicitly signalled a fatal disconnect.
    Disconnect,
}

/// Builder for a [`DispatchTable`]. All registration happens up front,
/// before the first frame is dispatched.
#[derive(Default)]
pub struct DispatchTableBuilder {
    entries: HashMap<Opcode, HandlerEntry>,
}

impl DispatchTableBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for an opcode. A later registration for the
    /// same opcode replaces the earlier one.
    pub fn register<F>(mut self, opcode: Opcode, required: StateRequirement, handler: F) -> Self
    where
        F: Fn(&Arc<Session>, &[u8]) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.entries.insert(
            opcode,
            HandlerEntry {
                required,
                handler: Arc::new(handler),
            },
        );
        self
    }

    /// Finalizes the table.
    pub fn build(self) -> DispatchTable {
        DispatchTable {
            entries: self.entries,
        }
    }
}

/// Immutable opcode/state → handler registry, shared across all session
/// workers.
pub struct DispatchTable {
    entries: HashMap<Opcode, HandlerEntry>,
}

impl DispatchTable {
    /// Starts building a table.
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::new()
    }

    /// Number of registered opcodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatches one complete frame (opcode + payload) for a session.
    pub fn dispatch(&self, session: &Arc<Session>, frame: &[u8]) -> DispatchOutcome {
        let mut reader = FrameReader::new(frame);
        let raw_opcode = match reader.read_u32() {
            Ok(v) => v,
            Err(_) => {
                tracing::debug!(session = %session.id, len = frame.len(), "frame too short for opcode");
                return DispatchOutcome::Malformed;
            }
        };
        let payload = &frame[reader.consumed()..];

        let Some(opcode) = Opcode::from_u32(raw_opcode) else {
            tracing::debug!(session = %session.id, opcode = raw_opcode, "unhandled opcode");
            return DispatchOutcome::Unhandled(raw_opcode);
        };
        let Some(entry) = self.entries.get(&opcode) else {
            tracing::debug!(session = %session.id, %opcode, "unhandled opcode");
            return DispatchOutcome::Unhandled(raw_opcode);
        };

        let state = session.state();
        if !entry.required.satisfied_by(state) {
            tracing::trace!(session = %session.id, %opcode, %state, "out of sequence, dropping");
            return DispatchOutcome::OutOfSequence;
        }

        match (entry.handler)(session, payload) {
            Ok(()) => DispatchOutcome::Handled,
            Err(err) if err.is_fatal() => {
                tracing::warn!(session = %session.id, %opcode, error = %err, "handler requested disconnect");
                DispatchOutcome::Disconnect
            }
            Err(err) => {
                tracing::warn!(session = %session.id, %opcode, error = %err, "handler fault, message aborted");
                DispatchOutcome::Faulted
            }
        }
    }
}
