//! Identity newtypes shared by every layer.

use std::fmt;

/// A unique identifier for a live client connection.
///
/// Assigned by the network layer on accept and never reused for the
/// lifetime of the process. After a session is destroyed, frames that
/// still carry its id resolve to "unknown session" and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// A unique identifier for a player character.
///
/// This is the 32-bit identity that travels on the wire as the chat
/// sender id, so it is `u32` rather than `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for an allegiance (a player-formed group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllegianceId(pub u32);

impl fmt::Display for AllegianceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_formats() {
        assert_eq!(SessionId(7).to_string(), "S-7");
        assert_eq!(PlayerId(42).to_string(), "P-42");
        assert_eq!(AllegianceId(3).to_string(), "A-3");
    }
}
