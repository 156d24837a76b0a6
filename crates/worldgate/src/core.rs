//! The assembled message core: one worker task per session.
//!
//! Each connected session gets its own Tokio task consuming that
//! session's inbound frame queue strictly in order; workers for
//! different sessions run concurrently. There is no lock across the
//! dispatch path; the only shared writes are registry membership and
//! each session's movement cell.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use worldgate_chat::{
    ChatRelay, ChatRouter, PropertySource, RelayError, RelayTask, StaticProperties,
};
use worldgate_dispatch::{DispatchOutcome, DispatchTable};
use worldgate_movement::{MovementConfig, MovementTracker, NoopPositionSink, PositionSink};
use worldgate_session::{ConnectionState, Player, Session, SessionRegistry};
use worldgate_wire::{OutboundMessage, PlayerId, SessionId};

use crate::handlers::{build_dispatch_table, PlayerDirectory};

/// A relay that accepts and discards everything; the default until a
/// real integration is wired in.
struct DiscardRelay;

impl ChatRelay for DiscardRelay {
    fn deliver(&self, _sender: &str, _text: &str, _channel_label: &str) -> Result<(), RelayError> {
        Ok(())
    }
}

/// A directory with no players; every character select faults.
struct EmptyDirectory;

impl PlayerDirectory for EmptyDirectory {
    fn player(&self, _id: PlayerId) -> Option<Arc<Player>> {
        None
    }
}

/// Builder for a [`Core`].
pub struct CoreBuilder {
    properties: Arc<dyn PropertySource>,
    relay: Arc<dyn ChatRelay>,
    directory: Arc<dyn PlayerDirectory>,
    position_sink: Arc<dyn PositionSink>,
    movement: MovementConfig,
}

impl Default for CoreBuilder {
    fn default() -> Self {
        Self {
            properties: Arc::new(StaticProperties::new()),
            relay: Arc::new(DiscardRelay),
            directory: Arc::new(EmptyDirectory),
            position_sink: Arc::new(NoopPositionSink),
            movement: MovementConfig::default(),
        }
    }
}

impl CoreBuilder {
    /// Sets the property source consulted for feature flags.
    pub fn properties(mut self, properties: Arc<dyn PropertySource>) -> Self {
        self.properties = properties;
        self
    }

    /// Sets the external chat relay integration.
    pub fn relay(mut self, relay: Arc<dyn ChatRelay>) -> Self {
        self.relay = relay;
        self
    }

    /// Sets the player directory backing character select.
    pub fn player_directory(mut self, directory: Arc<dyn PlayerDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// Sets the position-update hook.
    pub fn position_sink(mut self, sink: Arc<dyn PositionSink>) -> Self {
        self.position_sink = sink;
        self
    }

    /// Overrides the movement tracker settings.
    pub fn movement_config(mut self, config: MovementConfig) -> Self {
        self.movement = config;
        self
    }

    /// Assembles the core and spawns the relay task. Must run inside a
    /// Tokio runtime.
    pub fn build(self) -> Core {
        let registry = Arc::new(SessionRegistry::new());
        let relay_task = RelayTask::spawn(self.relay, self.properties);
        let router = Arc::new(ChatRouter::new(Arc::clone(&registry), relay_task.handle()));
        let movement = Arc::new(MovementTracker::new(
            Arc::clone(&registry),
            self.position_sink,
            self.movement,
        ));
        let dispatch = Arc::new(build_dispatch_table(
            Arc::clone(&registry),
            router,
            Arc::clone(&movement),
            self.directory,
        ));

        Core {
            shared: Arc::new(Shared {
                registry,
                movement,
                dispatch,
                workers: RwLock::new(HashMap::new()),
            }),
            relay_task,
            next_session: AtomicU64::new(0),
        }
    }
}

struct WorkerHandle {
    frames: mpsc::UnboundedSender<Bytes>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

struct Shared {
    registry: Arc<SessionRegistry>,
    movement: Arc<MovementTracker>,
    dispatch: Arc<DispatchTable>,
    workers: RwLock<HashMap<SessionId, WorkerHandle>>,
}

/// The assembled session message core.
pub struct Core {
    shared: Arc<Shared>,
    relay_task: RelayTask,
    next_session: AtomicU64,
}

impl Core {
    /// Starts building a core.
    pub fn builder() -> CoreBuilder {
        CoreBuilder::default()
    }

    /// The live session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.shared.registry
    }

    /// The movement tracker.
    pub fn movement(&self) -> &Arc<MovementTracker> {
        &self.shared.movement
    }

    /// Accepts a new connection: creates the session, spawns its worker,
    /// and returns the session with the receiver half of its outbound
    /// queue (handed to the transport).
    pub fn connect(&self) -> (Arc<Session>, mpsc::UnboundedReceiver<OutboundMessage>) {
        let id = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed) + 1);
        let (session, outbound) = Session::new(id);
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let join = tokio::spawn(run_worker(
            Arc::clone(&self.shared),
            Arc::clone(&session),
            frame_rx,
            cancel.clone(),
        ));

        self.shared.workers.write().insert(
            id,
            WorkerHandle {
                frames: frame_tx,
                cancel,
                join,
            },
        );
        tracing::info!(session = %id, "session connected");
        (session, outbound)
    }

    /// Feeds one inbound frame to a session's worker.
    ///
    /// Frames for an id with no live worker (including any id whose
    /// session already disconnected) are dropped; a dead session is
    /// never revived.
    pub fn inbound(&self, id: SessionId, frame: Bytes) {
        let workers = self.shared.workers.read();
        match workers.get(&id) {
            Some(worker) => {
                if worker.frames.send(frame).is_err() {
                    tracing::debug!(session = %id, "worker gone, dropping frame");
                }
            }
            None => {
                tracing::debug!(session = %id, "unknown session, dropping frame");
            }
        }
    }

    /// Begins teardown of a session from the server side (transport
    /// closed, kick). The worker finishes its current message first.
    pub fn disconnect(&self, id: SessionId) {
        if let Some(worker) = self.shared.workers.read().get(&id) {
            worker.cancel.cancel();
        }
    }

    /// Tears down every worker and the relay task, joining all of them.
    pub async fn shutdown(self) {
        let workers: Vec<WorkerHandle> = {
            let mut map = self.shared.workers.write();
            map.drain().map(|(_, worker)| worker).collect()
        };
        for worker in &workers {
            worker.cancel.cancel();
        }
        for worker in workers {
            if worker.join.await.is_err() {
                tracing::warn!("session worker panicked during shutdown");
            }
        }
        self.relay_task.shutdown().await;
    }
}

/// One session's inbound loop: frames are dispatched strictly in the
/// order they arrived, one at a time.
async fn run_worker(
    shared: Arc<Shared>,
    session: Arc<Session>,
    mut frames: mpsc::UnboundedReceiver<Bytes>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = frames.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        if let DispatchOutcome::Disconnect = shared.dispatch.dispatch(&session, &frame) {
            break;
        }
    }

    // Teardown: after this, frames for this id resolve to unknown.
    let _ = shared.registry.remove(session.id);
    shared.movement.remove(session.id);
    session.set_state(ConnectionState::Disconnected);
    shared.workers.write().remove(&session.id);
    tracing::info!(session = %session.id, "session torn down");
}
