//! The channel router: audience computation and per-recipient filters.

use std::sync::Arc;

use worldgate_session::{CharacterOptions, Player, Session, SessionRegistry, Society, SquelchCategory};
use worldgate_wire::chat_blob::{self, ChatAck, ChatEvent, ChatRequest};
use worldgate_wire::OutboundMessage;

use crate::channel::{chat_type, classify, ChannelClass, GlobalChannel};
use crate::{RelayHandle, RelayOffer};

/// Text longer than this is truncated before routing.
const MAX_TEXT_CHARS: usize = 256;
/// How many characters survive truncation, ahead of the marker.
const TRUNCATED_TEXT_CHARS: usize = 250;
/// Appended to truncated text.
const TRUNCATION_MARKER: &str = "[...]";

/// What the router decided about one request. Every variant except
/// `Delivered` means no recipient saw the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Accepted: the event went to this many recipients (possibly zero)
    /// and the sender was acked.
    Delivered { recipients: usize },
    /// Empty or whitespace-only text. Dropped without a reply.
    EmptyText,
    /// The sender is gagged; they were notified instead.
    SenderGagged,
    /// The session has no player attached. Dropped; only reachable if
    /// state gating is bypassed.
    SenderNotAttached,
    /// The reserved Olthoi channel: accepted and acked, delivered to
    /// nobody.
    ReservedChannel,
    /// Society channel from a sender with no society; they got exactly
    /// one error reply.
    SocietyRequired,
    /// No allegiance is registered under this channel id.
    AllegianceNotFound,
    /// The sender is not a member, or is filtered/booted. Dropped
    /// silently.
    SenderFiltered,
    /// The channel id matched no known range.
    UnknownChannel,
}

/// Routes decoded chat requests to their channel audiences.
///
/// Holds only shared read handles; all dependencies are injected. The
/// router never blocks: every per-recipient delivery is an independent
/// non-blocking enqueue on that session's outbound queue.
pub struct ChatRouter {
    registry: Arc<SessionRegistry>,
    relay: RelayHandle,
}

impl ChatRouter {
    /// Creates a router over the given registry and relay handle.
    pub fn new(registry: Arc<SessionRegistry>, relay: RelayHandle) -> Self {
        Self { registry, relay }
    }

    /// Routes one chat request from `session`.
    pub fn route(&self, session: &Arc<Session>, request: &ChatRequest) -> RouteOutcome {
        let Some(sender) = session.player() else {
            tracing::debug!(session = %session.id, "chat from session without player, dropping");
            return RouteOutcome::SenderNotAttached;
        };

        if request.text.trim().is_empty() {
            return RouteOutcome::EmptyText;
        }

        if session.is_gagged() {
            session.enqueue(OutboundMessage::server_text(
                "You cannot use chat channels while gagged.",
                chat_type::SYSTEM,
            ));
            return RouteOutcome::SenderGagged;
        }

        let text = truncate(&request.text);

        match classify(request.channel_id) {
            ChannelClass::Global(channel) => {
                self.route_global(session, &sender, request, channel, text)
            }
            ChannelClass::Olthoi => {
                // Reserved: accepted, acked, delivered to nobody.
                self.ack(session, request);
                RouteOutcome::ReservedChannel
            }
            ChannelClass::Society(_) => self.route_society(session, &sender, request, text),
            ChannelClass::Allegiance => self.route_allegiance(session, &sender, request, text),
            ChannelClass::Unclassified => {
                tracing::warn!(
                    session = %session.id,
                    channel = request.channel_id,
                    "unhandled chat channel id, dropping"
                );
                RouteOutcome::UnknownChannel
            }
        }
    }

    fn route_global(
        &self,
        session: &Arc<Session>,
        sender: &Arc<Player>,
        request: &ChatRequest,
        channel: GlobalChannel,
        text: String,
    ) -> RouteOutcome {
        // Encode the event once; each recipient shares the same buffer.
        let event = chat_blob::encode_event(&ChatEvent {
            channel_id: request.channel_id,
            sender_name: sender.name.clone(),
            text: text.clone(),
            chat_type: channel.chat_type(),
        });

        let mut recipients = 0;
        for recipient in self.registry.all() {
            let Some(player) = recipient.player() else {
                continue;
            };
            if player.is_olthoi {
                continue;
            }
            if !listens_to(&player.options(), channel) {
                continue;
            }
            if player.squelches(sender.id, SquelchCategory::AllChannels) {
                continue;
            }
            recipient.enqueue(event.clone());
            recipients += 1;
        }

        if channel == GlobalChannel::General {
            // Best-effort offer; relay failure never touches delivery.
            self.relay.offer(RelayOffer {
                sender: sender.name.clone(),
                text,
                channel_label: channel.label().to_string(),
            });
        }

        self.ack(session, request);
        RouteOutcome::Delivered { recipients }
    }

    fn route_society(
        &self,
        session: &Arc<Session>,
        sender: &Arc<Player>,
        request: &ChatRequest,
        text: String,
    ) -> RouteOutcome {
        if sender.society == Society::None {
            session.enqueue(OutboundMessage::server_text(
                "You do not belong to a society.",
                chat_type::SYSTEM,
            ));
            return RouteOutcome::SocietyRequired;
        }

        let event = chat_blob::encode_event(&ChatEvent {
            channel_id: request.channel_id,
            sender_name: sender.name.clone(),
            text,
            chat_type: chat_type::SOCIETY,
        });

        let mut recipients = 0;
        for recipient in self.registry.all() {
            let Some(player) = recipient.player() else {
                continue;
            };
            if player.is_olthoi {
                continue;
            }
            if player.society != sender.society && !player.is_admin {
                continue;
            }
            if !player.options().listen_society {
                continue;
            }
            if player.squelches(sender.id, SquelchCategory::AllChannels) {
                continue;
            }
            recipient.enqueue(event.clone());
            recipients += 1;
        }

        self.ack(session, request);
        RouteOutcome::Delivered { recipients }
    }

    fn route_allegiance(
        &self,
        session: &Arc<Session>,
        sender: &Arc<Player>,
        request: &ChatRequest,
        text: String,
    ) -> RouteOutcome {
        let Some(allegiance) = self.registry.find_by_allegiance_channel(request.channel_id)
        else {
            tracing::debug!(
                session = %session.id,
                channel = request.channel_id,
                "no allegiance for channel, dropping"
            );
            return RouteOutcome::AllegianceNotFound;
        };

        if !allegiance.is_member(sender.id) || allegiance.is_filtered(sender.id) {
            tracing::debug!(
                session = %session.id,
                sender = %sender.id,
                allegiance = %allegiance.id,
                "sender not an unfiltered member, dropping"
            );
            return RouteOutcome::SenderFiltered;
        }

        let event = chat_blob::encode_event(&ChatEvent {
            channel_id: request.channel_id,
            sender_name: sender.name.clone(),
            text,
            chat_type: chat_type::ALLEGIANCE,
        });

        let mut recipients = 0;
        for recipient in self.registry.all() {
            let Some(player) = recipient.player() else {
                continue;
            };
            if player.is_olthoi {
                continue;
            }
            if !allegiance.is_member(player.id) || allegiance.is_filtered(player.id) {
                continue;
            }
            if !player.options().listen_allegiance {
                continue;
            }
            if player.squelches(sender.id, SquelchCategory::Allegiance) {
                continue;
            }
            recipient.enqueue(event.clone());
            recipients += 1;
        }

        self.ack(session, request);
        RouteOutcome::Delivered { recipients }
    }

    /// One receipt confirmation per accepted send, regardless of how many
    /// recipients were reached.
    fn ack(&self, session: &Arc<Session>, request: &ChatRequest) {
        session.enqueue(chat_blob::encode_ack(ChatAck {
            context_id: request.context_id,
            channel_id: request.channel_id,
        }));
    }
}

fn listens_to(options: &CharacterOptions, channel: GlobalChannel) -> bool {
    match channel {
        GlobalChannel::General => options.listen_general,
        GlobalChannel::Trade => options.listen_trade,
        GlobalChannel::Lfg => options.listen_lfg,
        GlobalChannel::Roleplay => options.listen_roleplay,
    }
}

/// Applies the routing length rule: text over [`MAX_TEXT_CHARS`] is cut
/// to [`TRUNCATED_TEXT_CHARS`] characters plus the marker; anything else
/// passes through unchanged.
fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_TEXT_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(TRUNCATED_TEXT_CHARS).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}
