//! Channel chat routing for Worldgate.
//!
//! Given a decoded chat request and its target channel, the
//! [`ChatRouter`] computes the recipient set, runs each candidate through
//! the channel's admission filters (listen options, squelches, society and
//! allegiance membership, Olthoi exclusion), and enqueues one shared
//! outbound event per accepted recipient. The sender always gets a single
//! ack for an accepted send, no matter how many recipients were reached.
//!
//! General-channel traffic is additionally offered to an external relay:
//! an explicit background task with a cancellation token and a
//! join-on-shutdown contract, so a dead webhook can never stall in-world
//! delivery.

mod channel;
mod properties;
mod relay;
mod router;

pub use channel::{
    chat_type, classify, ChannelClass, GlobalChannel, CHANNEL_GENERAL, CHANNEL_LFG,
    CHANNEL_OLTHOI, CHANNEL_ROLEPLAY, CHANNEL_TRADE, SOCIETY_BASE, SOCIETY_RADIANT_BLOOD_MAX,
};
pub use properties::{PropertySource, StaticProperties, RELAY_ENABLED, RELAY_ENDPOINT};
pub use relay::{ChatRelay, RelayError, RelayHandle, RelayOffer, RelayTask};
pub use router::{ChatRouter, RouteOutcome};
