//! Session and player state for Worldgate.
//!
//! This crate owns the server's record of who is connected:
//!
//! 1. **Session**: a live connection and its transient protocol state
//!    (connection state, gag/AFK flags, the outbound queue handle).
//! 2. **Player / Allegiance**: the filter-relevant slice of the entity
//!    layer: listen options, squelches, society, allegiance membership.
//! 3. **SessionRegistry**: the authoritative, concurrently-readable set
//!    of world-connected sessions that broadcast paths iterate.
//!
//! # How it fits in the stack
//!
//! ```text
//! Chat / Movement (above)  ← iterate the registry, read player filters
//!     ↕
//! Session layer (this crate)  ← connection state and identity
//!     ↕
//! Wire layer (below)  ← SessionId/PlayerId, OutboundMessage
//! ```

mod allegiance;
mod error;
mod player;
mod registry;
mod session;

pub use allegiance::Allegiance;
pub use error::SessionError;
pub use player::{CharacterOptions, Player, Society, SquelchCategory, SquelchList};
pub use registry::SessionRegistry;
pub use session::{ConnectionState, Session};
