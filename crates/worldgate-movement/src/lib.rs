//! Movement state tracking for Worldgate.
//!
//! Each session has at most one current [`MoveToState`] and up to two
//! in-flight movement chains (primary and secondary). Applying a new
//! state cancels both chains and installs the new state under a single
//! per-session lock acquisition, so no computation ever races a state
//! being superseded.
//!
//! Outbound movement broadcasts are throttled to one per second per
//! session; the triggering update itself is always applied locally.

mod motion;
mod tracker;

pub use motion::{
    decode_broadcast, encode_broadcast, HoldKey, MotionCommand, MoveToState, Position,
};
pub use tracker::{
    ApplyOutcome, ChainSlot, MovementConfig, MovementTracker, NoopPositionSink, PositionSink,
};
