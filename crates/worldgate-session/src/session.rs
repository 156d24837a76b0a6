//! Session types: one live connection and its transient protocol state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use worldgate_wire::{OutboundMessage, SessionId};

use crate::Player;

/// The connection-state machine for a session.
///
/// ```text
/// Connecting → CharSelected → WorldConnected → Disconnected
/// ```
///
/// Only a `WorldConnected` session is routed chat/movement traffic; the
/// dispatch table drops out-of-state frames silently, since clients race
/// the server around connect and disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport is up, nothing chosen yet.
    Connecting,
    /// A character was selected but has not entered the world.
    CharSelected,
    /// Fully in-world; eligible for chat and movement routing.
    WorldConnected,
    /// Teardown has completed; the session is about to be dropped.
    Disconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Connecting => "Connecting",
            Self::CharSelected => "CharSelected",
            Self::WorldConnected => "WorldConnected",
            Self::Disconnected => "Disconnected",
        };
        f.write_str(s)
    }
}

/// A single live connection.
///
/// Owned by the network layer: created on connect, destroyed on
/// disconnect. Everything else holds `Arc<Session>` and reads. The
/// outbound sender is the session's FIFO queue to the external transport;
/// enqueues never block and never fail the caller.
pub struct Session {
    /// Connection identity, never reused.
    pub id: SessionId,
    state: RwLock<ConnectionState>,
    player: RwLock<Option<Arc<Player>>>,
    gagged: AtomicBool,
    afk: AtomicBool,
    logging_out: AtomicBool,
    teleporting: AtomicBool,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
}

impl Session {
    /// Creates a session in the `Connecting` state, paired with the
    /// receiver half of its outbound queue (handed to the transport).
    pub fn new(id: SessionId) -> (Arc<Self>, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            id,
            state: RwLock::new(ConnectionState::Connecting),
            player: RwLock::new(None),
            gagged: AtomicBool::new(false),
            afk: AtomicBool::new(false),
            logging_out: AtomicBool::new(false),
            teleporting: AtomicBool::new(false),
            outbound: tx,
        });
        (session, rx)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Transitions the connection state.
    pub fn set_state(&self, state: ConnectionState) {
        let mut guard = self.state.write();
        let from = *guard;
        tracing::debug!(session = %self.id, %from, to = %state, "state transition");
        *guard = state;
    }

    /// Returns `true` if the session is fully in-world.
    pub fn is_world_connected(&self) -> bool {
        self.state() == ConnectionState::WorldConnected
    }

    /// The attached player, if the session has entered the world.
    pub fn player(&self) -> Option<Arc<Player>> {
        self.player.read().clone()
    }

    /// Attaches the player record at enter-world.
    pub fn attach_player(&self, player: Arc<Player>) {
        *self.player.write() = Some(player);
    }

    /// Returns `true` if the session's outgoing chat is blocked.
    pub fn is_gagged(&self) -> bool {
        self.gagged.load(Ordering::Acquire)
    }

    /// Sets the moderation gag flag. Called by the moderation layer.
    pub fn set_gagged(&self, gagged: bool) {
        self.gagged.store(gagged, Ordering::Release);
    }

    /// Returns `true` if the session is flagged away-from-keyboard.
    pub fn is_afk(&self) -> bool {
        self.afk.load(Ordering::Acquire)
    }

    /// Sets the AFK flag.
    pub fn set_afk(&self, afk: bool) {
        self.afk.store(afk, Ordering::Release);
    }

    /// Clears the AFK flag, returning `true` only on the clearing
    /// transition. Idempotent: a second call returns `false`.
    pub fn clear_afk(&self) -> bool {
        self.afk.swap(false, Ordering::AcqRel)
    }

    /// Returns `true` once logout has begun. Movement updates for a
    /// logging-out session are ignored entirely.
    pub fn is_logging_out(&self) -> bool {
        self.logging_out.load(Ordering::Acquire)
    }

    /// Marks the session as logging out.
    pub fn begin_logout(&self) {
        self.logging_out.store(true, Ordering::Release);
    }

    /// Returns `true` while the session is mid-teleport. Teleporting
    /// sessions suppress position updates from movement packets.
    pub fn is_teleporting(&self) -> bool {
        self.teleporting.load(Ordering::Acquire)
    }

    /// Sets the teleport flag. Called by the world layer.
    pub fn set_teleporting(&self, teleporting: bool) {
        self.teleporting.store(teleporting, Ordering::Release);
    }

    /// Enqueues a message on the session's outbound FIFO queue.
    ///
    /// Never blocks. If the transport side is gone (connection already
    /// torn down), the message is dropped; a dead peer must not stall
    /// the caller.
    pub fn enqueue(&self, msg: OutboundMessage) {
        if self.outbound.send(msg).is_err() {
            tracing::trace!(session = %self.id, "outbound queue closed, dropping message");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
