//! The movement state tracker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use worldgate_session::{Session, SessionRegistry};
use worldgate_wire::{SessionId, WireError};

use crate::motion::{encode_broadcast, HoldKey, MotionCommand, MoveToState, Position};

/// Receives position updates derived from movement packets. The world
/// layer implements this; teleporting sessions suppress the call.
pub trait PositionSink: Send + Sync + 'static {
    fn update(&self, session: SessionId, position: &Position);
}

/// A sink that discards position updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPositionSink;

impl PositionSink for NoopPositionSink {
    fn update(&self, _session: SessionId, _position: &Position) {}
}

/// One of the two independently-owned cancellable chain slots.
///
/// The two slots mirror the two parallel movement subsystems upstream;
/// they are cancelled independently and never collapsed into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainSlot {
    Primary,
    Secondary,
}

/// Tracker settings.
#[derive(Debug, Clone)]
pub struct MovementConfig {
    /// Minimum spacing between outbound movement broadcasts per session.
    /// The update itself is always applied locally.
    pub broadcast_interval: Duration,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            broadcast_interval: Duration::from_secs(1),
        }
    }
}

/// What [`MovementTracker::apply`] did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The state was installed; `broadcast` says whether observers were
    /// notified or the throttle held the update back.
    Applied { broadcast: bool },
    /// The session is logging out; the update was ignored entirely.
    IgnoredLoggingOut,
}

/// Per-session movement state: the atomically-swapped cell.
#[derive(Default)]
struct MovementCell {
    current: Option<MoveToState>,
    /// Kept for delta comparison by interest management.
    last_applied: Option<MoveToState>,
    heading: f32,
    primary_chain: Option<CancellationToken>,
    secondary_chain: Option<CancellationToken>,
    last_broadcast: Option<Instant>,
}

impl MovementCell {
    fn cancel_chains(&mut self) {
        if let Some(token) = self.primary_chain.take() {
            token.cancel();
        }
        if let Some(token) = self.secondary_chain.take() {
            token.cancel();
        }
    }

    fn slot(&mut self, slot: ChainSlot) -> &mut Option<CancellationToken> {
        match slot {
            ChainSlot::Primary => &mut self.primary_chain,
            ChainSlot::Secondary => &mut self.secondary_chain,
        }
    }
}

/// Owns every session's movement cell and the broadcast throttle.
pub struct MovementTracker {
    registry: Arc<SessionRegistry>,
    sink: Arc<dyn PositionSink>,
    config: MovementConfig,
    cells: RwLock<HashMap<SessionId, Arc<Mutex<MovementCell>>>>,
}

impl MovementTracker {
    /// Creates a tracker over the given registry and position sink.
    pub fn new(
        registry: Arc<SessionRegistry>,
        sink: Arc<dyn PositionSink>,
        config: MovementConfig,
    ) -> Self {
        Self {
            registry,
            sink,
            config,
            cells: RwLock::new(HashMap::new()),
        }
    }

    fn cell(&self, session: SessionId) -> Arc<Mutex<MovementCell>> {
        if let Some(cell) = self.cells.read().get(&session) {
            return Arc::clone(cell);
        }
        Arc::clone(
            self.cells
                .write()
                .entry(session)
                .or_insert_with(|| Arc::new(Mutex::new(MovementCell::default()))),
        )
    }

    /// Applies a raw movement payload for a session.
    ///
    /// Decoding happens before any state is touched, so a malformed
    /// payload never partially mutates the tracker.
    pub fn apply(
        &self,
        session: &Arc<Session>,
        payload: &[u8],
    ) -> Result<ApplyOutcome, WireError> {
        let state = MoveToState::decode(payload)?;

        if session.is_logging_out() {
            tracing::trace!(session = %session.id, "movement during logout, ignoring");
            return Ok(ApplyOutcome::IgnoredLoggingOut);
        }

        let cell = self.cell(session.id);
        let broadcast_due = {
            let mut cell = cell.lock();
            // Cancel-then-install is one indivisible operation: nothing
            // can observe the old chains against the new state.
            cell.cancel_chains();
            cell.current = Some(state.clone());
            if let Some(heading) = derive_heading(&state) {
                cell.heading = heading;
            }
            let now = Instant::now();
            let due = cell
                .last_broadcast
                .is_none_or(|at| now.duration_since(at) >= self.config.broadcast_interval);
            if due {
                cell.last_broadcast = Some(now);
            }
            cell.last_applied = Some(state.clone());
            due
        };

        if !session.is_teleporting() {
            self.sink.update(session.id, &state.position);
        }

        if broadcast_due {
            self.broadcast(session, &state);
        }

        self.maybe_clear_afk(session, &state);

        Ok(ApplyOutcome::Applied {
            broadcast: broadcast_due,
        })
    }

    /// Starts a movement chain in a slot, cancelling any chain already
    /// occupying it. The returned token is cancelled when the chain is
    /// superseded.
    pub fn start_chain(&self, session: SessionId, slot: ChainSlot) -> CancellationToken {
        let cell = self.cell(session);
        let mut cell = cell.lock();
        if let Some(previous) = cell.slot(slot).take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        *cell.slot(slot) = Some(token.clone());
        token
    }

    /// Drops a session's movement cell at disconnect, cancelling any
    /// outstanding chains.
    pub fn remove(&self, session: SessionId) {
        if let Some(cell) = self.cells.write().remove(&session) {
            cell.lock().cancel_chains();
        }
    }

    /// The session's current movement state, if any.
    pub fn current(&self, session: SessionId) -> Option<MoveToState> {
        self.cells
            .read()
            .get(&session)
            .and_then(|cell| cell.lock().current.clone())
    }

    /// The state recorded for delta comparison.
    pub fn last_applied(&self, session: SessionId) -> Option<MoveToState> {
        self.cells
            .read()
            .get(&session)
            .and_then(|cell| cell.lock().last_applied.clone())
    }

    /// The session's derived coarse heading, in degrees.
    pub fn heading(&self, session: SessionId) -> Option<f32> {
        self.cells
            .read()
            .get(&session)
            .map(|cell| cell.lock().heading)
    }

    fn broadcast(&self, mover: &Arc<Session>, state: &MoveToState) {
        let Some(player) = mover.player() else {
            return;
        };
        // Encoded once; observers share the buffer.
        let msg = encode_broadcast(player.id, state);
        for observer in self.registry.all() {
            if observer.id == mover.id {
                continue;
            }
            observer.enqueue(msg.clone());
        }
    }

    fn maybe_clear_afk(&self, session: &Arc<Session>, state: &MoveToState) {
        if !session.is_afk() || state.held_key != HoldKey::Run {
            return;
        }
        for command in [state.forward, state.turn, state.sidestep] {
            if !matches!(command, MotionCommand::Invalid | MotionCommand::AfkState)
                && session.clear_afk()
            {
                tracing::debug!(session = %session.id, "movement cleared AFK");
            }
        }
    }
}

/// Derives a coarse heading from the motion command, in degrees.
/// Combinations outside the table leave the heading unchanged.
fn derive_heading(state: &MoveToState) -> Option<f32> {
    match state.forward {
        MotionCommand::WalkForward | MotionCommand::RunForward => return Some(0.0),
        MotionCommand::WalkBackwards => return Some(180.0),
        _ => {}
    }
    match state.sidestep {
        MotionCommand::SideStepRight => Some(-90.0),
        MotionCommand::SideStepLeft => Some(90.0),
        _ => None,
    }
}
