//! # Worldgate
//!
//! The session message layer of a persistent multiplayer world server:
//! binary frame decoding, state-gated opcode dispatch, per-session
//! transient state (movement, AFK), and chat/movement fan-out across many
//! concurrently connected sessions.
//!
//! The sub-crates each own one layer; this crate wires them together:
//! [`Core`] assembles the dispatch table, runs one worker task per
//! session (strict per-session ordering, cross-session concurrency), and
//! owns the external relay task's lifecycle.
//!
//! ```rust,no_run
//! use worldgate::Core;
//!
//! # async fn demo() {
//! let core = Core::builder().build();
//! let (session, _outbound) = core.connect();
//! // feed inbound frames: core.inbound(session.id, frame);
//! # core.shutdown().await;
//! # }
//! ```

mod core;
mod error;
mod handlers;
pub mod telemetry;

pub use crate::core::{Core, CoreBuilder};
pub use error::WorldgateError;
pub use handlers::{build_dispatch_table, PlayerDirectory};
