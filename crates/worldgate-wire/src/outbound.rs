//! Outbound message type consumed by per-session send queues.

use bytes::Bytes;

use crate::{FrameWriter, Opcode};

/// A fully serialized server-to-client message.
///
/// The payload is a [`Bytes`] handle, so a broadcast body encoded once is
/// shared read-only across every recipient's queue: cloning the message
/// clones a reference, not the buffer.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// The opcode heading the frame.
    pub opcode: Opcode,
    /// The serialized payload following the opcode.
    pub payload: Bytes,
}

impl OutboundMessage {
    /// Wraps an already-encoded payload.
    pub fn new(opcode: Opcode, payload: Bytes) -> Self {
        Self { opcode, payload }
    }

    /// Serializes the complete frame: opcode, then payload.
    pub fn to_frame(&self) -> Bytes {
        let mut w = FrameWriter::new();
        w.write_u32(self.opcode.as_u32());
        let mut buf = w.into_vec();
        buf.extend_from_slice(&self.payload);
        Bytes::from(buf)
    }

    /// Builds a plain text notice ([`Opcode::ServerText`]).
    pub fn server_text(text: &str, chat_type: u32) -> Self {
        let mut w = FrameWriter::new();
        w.write_utf16_string(text);
        w.write_u32(chat_type);
        Self::new(Opcode::ServerText, w.into_bytes())
    }

    /// Builds a keep-alive reply echoing the client stamp.
    pub fn pong(client_stamp: u32) -> Self {
        let mut w = FrameWriter::new();
        w.write_u32(client_stamp);
        Self::new(Opcode::Pong, w.into_bytes())
    }
}
