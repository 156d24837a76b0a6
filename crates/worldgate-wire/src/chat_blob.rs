//! Channel chat blob layouts.
//!
//! Chat traffic in both directions shares [`Opcode::ChatChannel`]; the
//! blob type inside the payload distinguishes the three shapes:
//!
//! - **request** (client → server): the sender's submission to a channel.
//! - **event** (server → client): a message delivered to a recipient.
//! - **ack** (server → client): receipt confirmation back to the sender.
//!
//! Every blob starts with the same outer header: a total-length prefix, the
//! blob type, four reserved words (expected 2, 1, 0, 0; skipped, not
//! validated), and an inner length prefix. Both length prefixes count the
//! bytes that follow them and must agree with the bytes actually present;
//! a disagreement marks the whole frame malformed.

use bytes::Bytes;

use crate::{FrameReader, FrameWriter, Opcode, OutboundMessage, WireError};

/// Blob type: a delivered channel message.
pub const BLOB_TYPE_EVENT: u32 = 0x01;
/// Blob type: a client submission to a channel.
pub const BLOB_TYPE_REQUEST: u32 = 0x03;
/// Blob type: receipt confirmation to the sender.
pub const BLOB_TYPE_ACK: u32 = 0x05;

/// A client's submission to a chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Client-chosen correlation id, echoed in the ack.
    pub context_id: u32,
    /// Target channel id.
    pub channel_id: u32,
    /// The message text.
    pub text: String,
    /// The sender's player id as claimed on the wire.
    pub sender_id: u32,
    /// Chat-type tag.
    pub chat_type: u32,
}

/// A channel message as delivered to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    /// Channel the message was routed on.
    pub channel_id: u32,
    /// Sender display name.
    pub sender_name: String,
    /// The (possibly truncated) message text.
    pub text: String,
    /// Chat-type tag.
    pub chat_type: u32,
}

/// Receipt confirmation sent back to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatAck {
    /// The correlation id from the request.
    pub context_id: u32,
    /// The channel the request targeted.
    pub channel_id: u32,
}

/// A decoded chat blob of any shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatBlob {
    Request(ChatRequest),
    Event(ChatEvent),
    Ack(ChatAck),
}

/// Decodes a chat blob payload (the bytes after the opcode).
pub fn decode(payload: &[u8]) -> Result<ChatBlob, WireError> {
    let mut r = FrameReader::new(payload);

    let total = r.read_u32()?;
    if total as usize != r.remaining() {
        return Err(WireError::LengthMismatch {
            declared: total,
            actual: r.remaining(),
        });
    }
    let blob_type = r.read_u32()?;
    // Four reserved words (2, 1, 0, 0): skipped, not validated.
    for _ in 0..4 {
        r.read_u32()?;
    }
    let inner = r.read_u32()?;
    if inner as usize != r.remaining() {
        return Err(WireError::LengthMismatch {
            declared: inner,
            actual: r.remaining(),
        });
    }

    let blob = match blob_type {
        BLOB_TYPE_REQUEST => {
            let context_id = r.read_u32()?;
            // Two reserved words (2, 2).
            r.read_u32()?;
            r.read_u32()?;
            let channel_id = r.read_u32()?;
            let text = r.read_utf16_string()?;
            // Reserved word (1).
            r.read_u32()?;
            let sender_id = r.read_u32()?;
            // Reserved word (0).
            r.read_u32()?;
            let chat_type = r.read_u32()?;
            ChatBlob::Request(ChatRequest {
                context_id,
                channel_id,
                text,
                sender_id,
                chat_type,
            })
        }
        BLOB_TYPE_EVENT => {
            let channel_id = r.read_u32()?;
            let sender_name = r.read_utf16_string()?;
            let text = r.read_utf16_string()?;
            let chat_type = r.read_u32()?;
            ChatBlob::Event(ChatEvent {
                channel_id,
                sender_name,
                text,
                chat_type,
            })
        }
        BLOB_TYPE_ACK => {
            let context_id = r.read_u32()?;
            let channel_id = r.read_u32()?;
            ChatBlob::Ack(ChatAck {
                context_id,
                channel_id,
            })
        }
        other => return Err(WireError::UnknownBlobType(other)),
    };

    r.finish()?;
    Ok(blob)
}

/// Wraps an inner blob body in the outer header.
fn seal(blob_type: u32, body: Vec<u8>) -> Bytes {
    let mut w = FrameWriter::new();
    // blob type + four reserved words + inner length field + body.
    let total = 4 + 16 + 4 + body.len();
    w.write_u32(total as u32);
    w.write_u32(blob_type);
    w.write_u32(2);
    w.write_u32(1);
    w.write_u32(0);
    w.write_u32(0);
    w.write_u32(body.len() as u32);
    let mut buf = w.into_vec();
    buf.extend_from_slice(&body);
    Bytes::from(buf)
}

/// Encodes a request blob payload. Used by tests and client tooling.
pub fn encode_request(req: &ChatRequest) -> Bytes {
    let mut w = FrameWriter::new();
    w.write_u32(req.context_id);
    w.write_u32(2);
    w.write_u32(2);
    w.write_u32(req.channel_id);
    w.write_utf16_string(&req.text);
    w.write_u32(1);
    w.write_u32(req.sender_id);
    w.write_u32(0);
    w.write_u32(req.chat_type);
    seal(BLOB_TYPE_REQUEST, w.into_vec())
}

/// Encodes an event blob as an outbound message.
pub fn encode_event(event: &ChatEvent) -> OutboundMessage {
    let mut w = FrameWriter::new();
    w.write_u32(event.channel_id);
    w.write_utf16_string(&event.sender_name);
    w.write_utf16_string(&event.text);
    w.write_u32(event.chat_type);
    OutboundMessage::new(Opcode::ChatChannel, seal(BLOB_TYPE_EVENT, w.into_vec()))
}

/// Encodes an ack blob as an outbound message.
pub fn encode_ack(ack: ChatAck) -> OutboundMessage {
    let mut w = FrameWriter::new();
    w.write_u32(ack.context_id);
    w.write_u32(ack.channel_id);
    OutboundMessage::new(Opcode::ChatChannel, seal(BLOB_TYPE_ACK, w.into_vec()))
}
