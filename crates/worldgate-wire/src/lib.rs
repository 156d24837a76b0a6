//! Wire format for Worldgate.
//!
//! This crate defines everything that travels on the wire between a game
//! client and the session message layer:
//!
//! - **Identity types** ([`SessionId`], [`PlayerId`], [`AllegianceId`]):
//!   newtype ids shared by every layer above.
//! - **Frame codec** ([`FrameReader`], [`FrameWriter`]): cursor-based
//!   primitive reads/writes: fixed-width little-endian integers, a packed
//!   15-bit length, and length-prefixed UTF-16 text.
//! - **Chat blobs** ([`chat_blob`]): the request/event/ack layouts used by
//!   the channel chat path.
//! - **Opcodes** ([`Opcode`]) and the [`OutboundMessage`] handed to each
//!   session's send queue.
//!
//! # Architecture
//!
//! The wire layer is structural only: it accounts for every byte consumed
//! and rejects truncated or over-long frames, but it never judges field
//! semantics. That is the job of the handlers above it.
//!
//! ```text
//! Transport (bytes) → Wire (typed reads) → Dispatch (opcode + state)
//! ```

mod error;
mod opcode;
mod outbound;
mod reader;
mod types;
mod writer;

pub mod chat_blob;

pub use error::WireError;
pub use opcode::Opcode;
pub use outbound::OutboundMessage;
pub use reader::FrameReader;
pub use types::{AllegianceId, PlayerId, SessionId};
pub use writer::FrameWriter;
