//! The filter-relevant slice of a player record.
//!
//! The persistent entity layer owns player data; this layer only reads the
//! fields that chat and movement routing consult. Options and squelches
//! can change mid-session (the entity layer writes them), so they sit
//! behind `RwLock`; everything here only takes read guards.

use std::collections::HashSet;

use parking_lot::RwLock;
use worldgate_wire::PlayerId;

/// Coarse three-way faction affiliation, independent of allegiance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Society {
    /// No society affiliation. Society-restricted channels reject senders
    /// in this state with an explicit error reply.
    #[default]
    None,
    CelestialHand,
    EldrytchWeb,
    RadiantBlood,
}

/// Message category a squelch entry is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SquelchCategory {
    /// Blocks the sender on all global and society channels.
    AllChannels,
    /// Blocks the sender on allegiance chat only.
    Allegiance,
}

/// A per-player block list, scoped by message category.
#[derive(Debug, Clone, Default)]
pub struct SquelchList {
    entries: HashSet<(PlayerId, SquelchCategory)>,
}

impl SquelchList {
    /// Adds a block entry.
    pub fn add(&mut self, sender: PlayerId, category: SquelchCategory) {
        self.entries.insert((sender, category));
    }

    /// Removes a block entry.
    pub fn remove(&mut self, sender: PlayerId, category: SquelchCategory) {
        self.entries.remove(&(sender, category));
    }

    /// Returns `true` if messages from `sender` are blocked under
    /// `category`.
    pub fn contains(&self, sender: PlayerId, category: SquelchCategory) -> bool {
        self.entries.contains(&(sender, category))
    }
}

/// Per-channel listen toggles.
///
/// A disabled toggle removes the player from that channel's audience; it
/// never affects what the player can send.
#[derive(Debug, Clone, Copy)]
pub struct CharacterOptions {
    pub listen_general: bool,
    pub listen_trade: bool,
    pub listen_lfg: bool,
    pub listen_roleplay: bool,
    pub listen_allegiance: bool,
    pub listen_society: bool,
}

impl Default for CharacterOptions {
    fn default() -> Self {
        Self {
            listen_general: true,
            listen_trade: true,
            listen_lfg: true,
            listen_roleplay: true,
            listen_allegiance: true,
            listen_society: true,
        }
    }
}

/// The slice of a player record this layer reads.
#[derive(Debug)]
pub struct Player {
    /// Persistent character identity.
    pub id: PlayerId,
    /// Display name shown to chat recipients.
    pub name: String,
    /// Society affiliation.
    pub society: Society,
    /// Admins receive society chat regardless of their own society.
    pub is_admin: bool,
    /// Olthoi-faction characters are excluded from normal chat audiences.
    pub is_olthoi: bool,
    options: RwLock<CharacterOptions>,
    squelches: RwLock<SquelchList>,
}

impl Player {
    /// Creates a player with default options and an empty squelch list.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            society: Society::None,
            is_admin: false,
            is_olthoi: false,
            options: RwLock::new(CharacterOptions::default()),
            squelches: RwLock::new(SquelchList::default()),
        }
    }

    /// Sets the society affiliation. Builder-style, used at load time.
    pub fn with_society(mut self, society: Society) -> Self {
        self.society = society;
        self
    }

    /// Marks the player as an admin. Builder-style, used at load time.
    pub fn with_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Marks the player as Olthoi-faction. Builder-style, used at load time.
    pub fn with_olthoi(mut self) -> Self {
        self.is_olthoi = true;
        self
    }

    /// Snapshot of the current listen toggles.
    pub fn options(&self) -> CharacterOptions {
        *self.options.read()
    }

    /// Replaces the listen toggles. Called by the entity layer when the
    /// player changes a character option.
    pub fn set_options(&self, options: CharacterOptions) {
        *self.options.write() = options;
    }

    /// Returns `true` if this player squelches `sender` under `category`.
    pub fn squelches(&self, sender: PlayerId, category: SquelchCategory) -> bool {
        self.squelches.read().contains(sender, category)
    }

    /// Adds a squelch entry. Called by the entity layer.
    pub fn add_squelch(&self, sender: PlayerId, category: SquelchCategory) {
        self.squelches.write().add(sender, category);
    }

    /// Removes a squelch entry. Called by the entity layer.
    pub fn remove_squelch(&self, sender: PlayerId, category: SquelchCategory) {
        self.squelches.write().remove(sender, category);
    }
}
