//! Chat channel id classification.
//!
//! Channel ids partition into four disjoint numeric ranges. Exactly one
//! classification applies per id; ids outside every range are unclassified
//! and the router drops them as unhandled.

use worldgate_session::Society;

/// The General global channel.
pub const CHANNEL_GENERAL: u32 = 1;
/// The Trade global channel.
pub const CHANNEL_TRADE: u32 = 2;
/// The looking-for-group global channel.
pub const CHANNEL_LFG: u32 = 3;
/// The Roleplay global channel.
pub const CHANNEL_ROLEPLAY: u32 = 4;
/// The reserved Olthoi channel. Currently delivers to nobody.
pub const CHANNEL_OLTHOI: u32 = 5;

/// Bottom of the society channel range (exclusive).
pub const SOCIETY_BASE: u32 = 5;
/// Top of the society channel range (inclusive): the Radiant Blood
/// channel. Everything above is allegiance-restricted.
pub const SOCIETY_RADIANT_BLOOD_MAX: u32 = 8;

/// Chat-type tags stamped on outbound messages.
pub mod chat_type {
    pub const GENERAL: u32 = 1;
    pub const TRADE: u32 = 2;
    pub const LFG: u32 = 3;
    pub const ROLEPLAY: u32 = 4;
    pub const SOCIETY: u32 = 5;
    pub const ALLEGIANCE: u32 = 6;
    /// Server notices (errors, moderation messages).
    pub const SYSTEM: u32 = 7;
}

/// One of the four fixed global channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalChannel {
    General,
    Trade,
    Lfg,
    Roleplay,
}

impl GlobalChannel {
    /// The chat-type tag delivered with messages on this channel.
    pub fn chat_type(self) -> u32 {
        match self {
            Self::General => chat_type::GENERAL,
            Self::Trade => chat_type::TRADE,
            Self::Lfg => chat_type::LFG,
            Self::Roleplay => chat_type::ROLEPLAY,
        }
    }

    /// Human-readable label, used for the external relay.
    pub fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Trade => "Trade",
            Self::Lfg => "LFG",
            Self::Roleplay => "Roleplay",
        }
    }
}

/// The classification of a channel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelClass {
    /// One of the four global channels.
    Global(GlobalChannel),
    /// The reserved Olthoi channel: accepted, delivered to nobody.
    Olthoi,
    /// A society-restricted channel.
    Society(Society),
    /// An allegiance-restricted channel, resolved through the registry.
    Allegiance,
    /// No known range matched.
    Unclassified,
}

/// Classifies a channel id by the threshold rule.
pub fn classify(id: u32) -> ChannelClass {
    if id > SOCIETY_RADIANT_BLOOD_MAX {
        return ChannelClass::Allegiance;
    }
    if id > SOCIETY_BASE {
        let society = match id {
            6 => Society::CelestialHand,
            7 => Society::EldrytchWeb,
            _ => Society::RadiantBlood,
        };
        return ChannelClass::Society(society);
    }
    if id == CHANNEL_OLTHOI {
        return ChannelClass::Olthoi;
    }
    match id {
        CHANNEL_GENERAL => ChannelClass::Global(GlobalChannel::General),
        CHANNEL_TRADE => ChannelClass::Global(GlobalChannel::Trade),
        CHANNEL_LFG => ChannelClass::Global(GlobalChannel::Lfg),
        CHANNEL_ROLEPLAY => ChannelClass::Global(GlobalChannel::Roleplay),
        _ => ChannelClass::Unclassified,
    }
}
