//! The session registry: the authoritative set of world-connected
//! sessions.
//!
//! # Concurrency note
//!
//! Registration and removal are the only write paths, and both are narrow
//! `RwLock` write sections. Broadcast paths call [`SessionRegistry::all`],
//! which snapshots the current membership under a read guard and releases
//! it before the caller touches a single session: an iterator never
//! observes a half-removed entry, and a slow consumer never holds the
//! lock. Sessions that connect after the snapshot may or may not be seen
//! by an in-flight broadcast; that is the intended snapshot-or-later
//! semantics.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use worldgate_wire::{PlayerId, SessionId};

use crate::{Allegiance, Session, SessionError};

/// Tracks every world-connected session plus the allegiance directory
/// used to resolve allegiance-restricted chat channels.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
    allegiances: RwLock<HashMap<u32, Arc<Allegiance>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session at world-connect completion.
    ///
    /// # Errors
    /// - [`SessionError::NotWorldConnected`] if the session has not
    ///   finished entering the world.
    /// - [`SessionError::AlreadyRegistered`] if the id is already present.
    pub fn register(&self, session: Arc<Session>) -> Result<(), SessionError> {
        if !session.is_world_connected() {
            return Err(SessionError::NotWorldConnected(session.id));
        }
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.id) {
            return Err(SessionError::AlreadyRegistered(session.id));
        }
        tracing::info!(session = %session.id, "session registered");
        sessions.insert(session.id, session);
        Ok(())
    }

    /// Removes a session at disconnect completion.
    ///
    /// # Errors
    /// Returns [`SessionError::Unknown`] if the id is not registered,
    /// expected when a session disconnects before ever entering the world.
    pub fn remove(&self, id: SessionId) -> Result<Arc<Session>, SessionError> {
        let removed = self.sessions.write().remove(&id);
        match removed {
            Some(session) => {
                tracing::info!(session = %id, "session removed");
                Ok(session)
            }
            None => Err(SessionError::Unknown(id)),
        }
    }

    /// Looks up a session by id.
    pub fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.read().get(&id).cloned()
    }

    /// Finds the session of an online player.
    pub fn find_by_player(&self, player: PlayerId) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .values()
            .find(|s| s.player().is_some_and(|p| p.id == player))
            .cloned()
    }

    /// Snapshot of every currently world-connected session.
    ///
    /// Safe to iterate while sessions connect and disconnect concurrently;
    /// restartable by calling again.
    pub fn all(&self) -> Vec<Arc<Session>> {
        self.sessions
            .read()
            .values()
            .filter(|s| s.is_world_connected())
            .cloned()
            .collect()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns `true` if no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Publishes an allegiance under its chat channel id. Called by the
    /// entity layer when an allegiance is loaded or created.
    pub fn register_allegiance(&self, channel_id: u32, allegiance: Arc<Allegiance>) {
        self.allegiances.write().insert(channel_id, allegiance);
    }

    /// Drops an allegiance's channel mapping. Called by the entity layer
    /// when an allegiance dissolves.
    pub fn remove_allegiance(&self, channel_id: u32) {
        self.allegiances.write().remove(&channel_id);
    }

    /// Resolves an allegiance-restricted chat channel id.
    pub fn find_by_allegiance_channel(&self, channel_id: u32) -> Option<Arc<Allegiance>> {
        self.allegiances.read().get(&channel_id).cloned()
    }
}
