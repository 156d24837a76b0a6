//! Error types for the wire layer.

/// Errors that can occur while decoding or encoding a frame.
///
/// Any of these means the frame is malformed: the caller drops the frame,
/// logs it with session identity and opcode, and moves on. A malformed
/// frame is never partially applied.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A read ran past the end of the buffer.
    #[error("unexpected end of frame: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// A fully decoded frame left mandatory trailer bytes unexamined.
    #[error("{remaining} trailing bytes left after decoding frame")]
    TrailingBytes { remaining: usize },

    /// A length prefix disagrees with the bytes actually present.
    #[error("inconsistent length prefix: declared {declared}, found {actual}")]
    LengthMismatch { declared: u32, actual: usize },

    /// Text bytes did not decode as UTF-16 (unpaired surrogate).
    #[error("invalid UTF-16 text field")]
    InvalidText,

    /// A chat blob carried a type discriminator this layer does not know.
    #[error("unknown chat blob type {0:#x}")]
    UnknownBlobType(u32),
}
