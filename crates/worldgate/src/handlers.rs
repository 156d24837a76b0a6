//! Handler registration: one statically-built dispatch table for the
//! whole message layer.
//!
//! Every dependency a handler touches is an explicit `Arc` captured by
//! its closure at registration time; there are no ambient singletons to
//! reach for.

use std::sync::Arc;

use worldgate_chat::ChatRouter;
use worldgate_dispatch::{DispatchTable, HandlerError, StateRequirement};
use worldgate_movement::MovementTracker;
use worldgate_session::{ConnectionState, Player, SessionRegistry};
use worldgate_wire::chat_blob::{self, ChatBlob};
use worldgate_wire::{FrameReader, Opcode, OutboundMessage, PlayerId};

/// Supplies player records from the persistent entity layer.
pub trait PlayerDirectory: Send + Sync + 'static {
    /// Resolves a player by id, or `None` if no such character exists.
    fn player(&self, id: PlayerId) -> Option<Arc<Player>>;
}

/// Builds the dispatch table for the session message layer.
pub fn build_dispatch_table(
    registry: Arc<SessionRegistry>,
    router: Arc<ChatRouter>,
    movement: Arc<MovementTracker>,
    directory: Arc<dyn PlayerDirectory>,
) -> DispatchTable {
    DispatchTable::builder()
        .register(Opcode::Ping, StateRequirement::Any, |session, payload| {
            let mut r = FrameReader::new(payload);
            let stamp = r.read_u32()?;
            r.finish()?;
            session.enqueue(OutboundMessage::pong(stamp));
            Ok(())
        })
        .register(
            Opcode::CharacterSelect,
            StateRequirement::Exactly(ConnectionState::Connecting),
            move |session, payload| {
                let mut r = FrameReader::new(payload);
                let character = PlayerId(r.read_u32()?);
                r.finish()?;
                let Some(player) = directory.player(character) else {
                    return Err(HandlerError::Fault(format!(
                        "no such character {character}"
                    )));
                };
                tracing::info!(session = %session.id, player = %character, "character selected");
                session.attach_player(player);
                session.set_state(ConnectionState::CharSelected);
                Ok(())
            },
        )
        .register(
            Opcode::CharacterEnterWorld,
            StateRequirement::Exactly(ConnectionState::CharSelected),
            move |session, payload| {
                FrameReader::new(payload).finish()?;
                session.set_state(ConnectionState::WorldConnected);
                registry.register(Arc::clone(session))?;
                Ok(())
            },
        )
        .register(
            Opcode::Logout,
            StateRequirement::Exactly(ConnectionState::WorldConnected),
            |session, payload| {
                FrameReader::new(payload).finish()?;
                session.begin_logout();
                Err(HandlerError::FatalDisconnect("client logout".into()))
            },
        )
        .register(
            Opcode::ChatChannel,
            StateRequirement::Exactly(ConnectionState::WorldConnected),
            move |session, payload| {
                match chat_blob::decode(payload)? {
                    ChatBlob::Request(request) => {
                        let outcome = router.route(session, &request);
                        tracing::trace!(
                            session = %session.id,
                            channel = request.channel_id,
                            ?outcome,
                            "chat routed"
                        );
                    }
                    other => {
                        // Only clients send requests; anything else is skew.
                        tracing::debug!(session = %session.id, ?other, "non-request chat blob, dropping");
                    }
                }
                Ok(())
            },
        )
        .register(
            Opcode::MoveToState,
            StateRequirement::Exactly(ConnectionState::WorldConnected),
            move |session, payload| {
                movement.apply(session, payload)?;
                Ok(())
            },
        )
        .build()
}
