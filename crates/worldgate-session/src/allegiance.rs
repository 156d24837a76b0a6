//! Allegiance membership and filter state.

use std::collections::HashSet;

use parking_lot::RwLock;
use worldgate_wire::{AllegianceId, PlayerId};

/// A player-formed group with membership and per-member filter (boot)
/// state.
///
/// The entity layer owns allegiances and mutates them; the router only
/// queries membership and filter predicates.
#[derive(Debug)]
pub struct Allegiance {
    /// Stable allegiance identity.
    pub id: AllegianceId,
    members: RwLock<HashSet<PlayerId>>,
    filtered: RwLock<HashSet<PlayerId>>,
}

impl Allegiance {
    /// Creates an empty allegiance.
    pub fn new(id: AllegianceId) -> Self {
        Self {
            id,
            members: RwLock::new(HashSet::new()),
            filtered: RwLock::new(HashSet::new()),
        }
    }

    /// Adds a member. Called by the entity layer.
    pub fn add_member(&self, player: PlayerId) {
        self.members.write().insert(player);
    }

    /// Removes a member. Called by the entity layer.
    pub fn remove_member(&self, player: PlayerId) {
        self.members.write().remove(&player);
        self.filtered.write().remove(&player);
    }

    /// Marks a member as filtered (booted from allegiance chat without
    /// being removed from the allegiance). Called by the entity layer.
    pub fn set_filtered(&self, player: PlayerId, filtered: bool) {
        if filtered {
            self.filtered.write().insert(player);
        } else {
            self.filtered.write().remove(&player);
        }
    }

    /// Returns `true` if `player` is a current member.
    pub fn is_member(&self, player: PlayerId) -> bool {
        self.members.read().contains(&player)
    }

    /// Returns `true` if `player` is filtered out of allegiance chat.
    pub fn is_filtered(&self, player: PlayerId) -> bool {
        self.filtered.read().contains(&player)
    }
}
