//! Integration tests for the channel router: audiences, filter chains,
//! sender replies, and the relay hand-off.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use worldgate_chat::{
    ChatRelay, ChatRouter, RelayError, RelayOffer, RelayTask, RouteOutcome, StaticProperties,
    CHANNEL_GENERAL, CHANNEL_OLTHOI, CHANNEL_TRADE, RELAY_ENABLED, RELAY_ENDPOINT,
    SOCIETY_RADIANT_BLOOD_MAX,
};
use worldgate_session::{
    Allegiance, CharacterOptions, ConnectionState, Player, Session, SessionRegistry, Society,
    SquelchCategory,
};
use worldgate_wire::chat_blob::{self, ChatBlob, ChatRequest};
use worldgate_wire::{AllegianceId, Opcode, OutboundMessage, PlayerId, SessionId};

// =========================================================================
// Fixtures
// =========================================================================

/// A relay that records every delivery.
#[derive(Default)]
struct RecordingRelay {
    delivered: Mutex<Vec<RelayOffer>>,
}

impl ChatRelay for RecordingRelay {
    fn deliver(&self, sender: &str, text: &str, channel_label: &str) -> Result<(), RelayError> {
        self.delivered.lock().push(RelayOffer {
            sender: sender.to_string(),
            text: text.to_string(),
            channel_label: channel_label.to_string(),
        });
        Ok(())
    }
}

struct Harness {
    registry: Arc<SessionRegistry>,
    router: ChatRouter,
    relay: Arc<RecordingRelay>,
    task: RelayTask,
}

impl Harness {
    /// A harness with the relay fully configured.
    fn new() -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let relay = Arc::new(RecordingRelay::default());
        let properties = Arc::new(
            StaticProperties::new()
                .with_bool(RELAY_ENABLED, true)
                .with_string(RELAY_ENDPOINT, "https://relay.example/hook"),
        );
        let task = RelayTask::spawn(Arc::clone(&relay) as Arc<dyn ChatRelay>, properties);
        let router = ChatRouter::new(Arc::clone(&registry), task.handle());
        Self {
            registry,
            router,
            relay,
            task,
        }
    }

    fn connect(
        &self,
        id: u64,
        player: Player,
    ) -> (Arc<Session>, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (session, rx) = Session::new(SessionId(id));
        session.attach_player(Arc::new(player));
        session.set_state(ConnectionState::WorldConnected);
        self.registry.register(Arc::clone(&session)).unwrap();
        (session, rx)
    }

    async fn shutdown(self) {
        self.task.shutdown().await;
    }
}

fn request(channel_id: u32, text: &str, sender: PlayerId) -> ChatRequest {
    ChatRequest {
        context_id: 0x11,
        channel_id,
        text: text.to_string(),
        sender_id: sender.0,
        chat_type: 0,
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<OutboundMessage>) -> Vec<OutboundMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

/// Splits a drained queue into (chat events, acks, server texts).
fn split(messages: &[OutboundMessage]) -> (Vec<chat_blob::ChatEvent>, usize, Vec<String>) {
    let mut events = Vec::new();
    let mut acks = 0;
    let mut texts = Vec::new();
    for msg in messages {
        match msg.opcode {
            Opcode::ChatChannel => match chat_blob::decode(&msg.payload).unwrap() {
                ChatBlob::Event(e) => events.push(e),
                ChatBlob::Ack(_) => acks += 1,
                ChatBlob::Request(_) => panic!("request blob on an outbound queue"),
            },
            Opcode::ServerText => {
                let mut r = worldgate_wire::FrameReader::new(&msg.payload);
                texts.push(r.read_utf16_string().unwrap());
            }
            other => panic!("unexpected outbound opcode {other}"),
        }
    }
    (events, acks, texts)
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not met in time");
}

// =========================================================================
// Global channels
// =========================================================================

#[tokio::test]
async fn global_message_reaches_listening_unsquelched_players() {
    let h = Harness::new();
    let (sender, mut sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let (_peer, mut peer_rx) = h.connect(2, Player::new(PlayerId(11), "Borel"));

    let outcome = h.router.route(&sender, &request(CHANNEL_TRADE, "selling shields", PlayerId(10)));

    // Sender passes the filters too, so both are recipients.
    assert_eq!(outcome, RouteOutcome::Delivered { recipients: 2 });

    let (events, _, _) = split(&drain(&mut peer_rx));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].sender_name, "Aldren");
    assert_eq!(events[0].text, "selling shields");
    assert_eq!(events[0].channel_id, CHANNEL_TRADE);

    let (events, acks, _) = split(&drain(&mut sender_rx));
    assert_eq!(events.len(), 1);
    assert_eq!(acks, 1, "sender gets exactly one ack");
    h.shutdown().await;
}

#[tokio::test]
async fn disabled_listen_option_blocks_delivery() {
    let h = Harness::new();
    let (sender, _sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));

    let deaf = Player::new(PlayerId(11), "Borel");
    deaf.set_options(CharacterOptions {
        listen_trade: false,
        ..CharacterOptions::default()
    });
    let (_peer, mut peer_rx) = h.connect(2, deaf);

    let outcome = h.router.route(&sender, &request(CHANNEL_TRADE, "hello", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::Delivered { recipients: 1 });
    assert!(drain(&mut peer_rx).is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn squelched_sender_blocked_for_that_recipient_only() {
    let h = Harness::new();
    let (sender, _sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));

    let blocker = Player::new(PlayerId(11), "Borel");
    blocker.add_squelch(PlayerId(10), SquelchCategory::AllChannels);
    let (_blocker, mut blocker_rx) = h.connect(2, blocker);
    let (_peer, mut peer_rx) = h.connect(3, Player::new(PlayerId(12), "Cyris"));

    h.router.route(&sender, &request(CHANNEL_GENERAL, "hello", PlayerId(10)));

    assert!(drain(&mut blocker_rx).is_empty(), "squelching recipient sees nothing");
    let (events, _, _) = split(&drain(&mut peer_rx));
    assert_eq!(events.len(), 1, "other recipients are unaffected");
    h.shutdown().await;
}

#[tokio::test]
async fn offline_player_receives_nothing() {
    let h = Harness::new();
    let (sender, _sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let (leaver, mut leaver_rx) = h.connect(2, Player::new(PlayerId(11), "Borel"));

    // Mid-teardown: still in the map but no longer world-connected.
    leaver.set_state(ConnectionState::Disconnected);

    let outcome = h.router.route(&sender, &request(CHANNEL_GENERAL, "hello", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::Delivered { recipients: 1 });
    assert!(drain(&mut leaver_rx).is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn olthoi_player_excluded_from_global_audience() {
    let h = Harness::new();
    let (sender, _sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let (_olthoi, mut olthoi_rx) =
        h.connect(2, Player::new(PlayerId(11), "Clicker").with_olthoi());

    let outcome = h.router.route(&sender, &request(CHANNEL_GENERAL, "hello", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::Delivered { recipients: 1 });
    assert!(drain(&mut olthoi_rx).is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn long_text_is_truncated_for_every_recipient() {
    let h = Harness::new();
    let (sender, _sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let (_peer, mut peer_rx) = h.connect(2, Player::new(PlayerId(11), "Borel"));

    let long = "x".repeat(300);
    h.router.route(&sender, &request(CHANNEL_GENERAL, &long, PlayerId(10)));

    let (events, _, _) = split(&drain(&mut peer_rx));
    let expected = format!("{}[...]", "x".repeat(250));
    assert_eq!(events[0].text, expected);
    h.shutdown().await;
}

#[tokio::test]
async fn ack_is_sent_even_with_zero_recipients() {
    let h = Harness::new();
    let deaf_sender = Player::new(PlayerId(10), "Aldren");
    deaf_sender.set_options(CharacterOptions {
        listen_general: false,
        ..CharacterOptions::default()
    });
    let (sender, mut sender_rx) = h.connect(1, deaf_sender);

    let outcome = h.router.route(&sender, &request(CHANNEL_GENERAL, "anyone?", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::Delivered { recipients: 0 });
    let (events, acks, _) = split(&drain(&mut sender_rx));
    assert!(events.is_empty());
    assert_eq!(acks, 1);
    h.shutdown().await;
}

// =========================================================================
// Policy gates
// =========================================================================

#[tokio::test]
async fn empty_text_is_a_no_op() {
    let h = Harness::new();
    let (sender, mut sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let (_peer, mut peer_rx) = h.connect(2, Player::new(PlayerId(11), "Borel"));

    let outcome = h.router.route(&sender, &request(CHANNEL_GENERAL, "   \t ", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::EmptyText);
    assert!(drain(&mut sender_rx).is_empty());
    assert!(drain(&mut peer_rx).is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn gagged_sender_is_notified_and_nothing_routes() {
    let h = Harness::new();
    let (sender, mut sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let (_peer, mut peer_rx) = h.connect(2, Player::new(PlayerId(11), "Borel"));
    sender.set_gagged(true);

    let outcome = h.router.route(&sender, &request(CHANNEL_GENERAL, "hello", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::SenderGagged);
    let (events, acks, texts) = split(&drain(&mut sender_rx));
    assert!(events.is_empty());
    assert_eq!(acks, 0);
    assert_eq!(texts.len(), 1, "one gag notice");
    assert!(drain(&mut peer_rx).is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn olthoi_channel_is_a_reserved_no_op() {
    let h = Harness::new();
    let (sender, mut sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let (_peer, mut peer_rx) = h.connect(2, Player::new(PlayerId(11), "Borel"));

    let outcome = h.router.route(&sender, &request(CHANNEL_OLTHOI, "hello", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::ReservedChannel);
    assert!(drain(&mut peer_rx).is_empty());
    let (events, acks, _) = split(&drain(&mut sender_rx));
    assert!(events.is_empty());
    assert_eq!(acks, 1, "reserved channel still acks the sender");
    h.shutdown().await;
}

#[tokio::test]
async fn unknown_channel_id_is_dropped() {
    let h = Harness::new();
    let (sender, mut sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));

    let outcome = h.router.route(&sender, &request(0, "hello", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::UnknownChannel);
    assert!(drain(&mut sender_rx).is_empty());
    h.shutdown().await;
}

// =========================================================================
// Society channels
// =========================================================================

#[tokio::test]
async fn society_sender_without_society_gets_one_error_and_no_broadcast() {
    let h = Harness::new();
    let (sender, mut sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let (_peer, mut peer_rx) = h.connect(
        2,
        Player::new(PlayerId(11), "Borel").with_society(Society::CelestialHand),
    );

    let outcome = h.router.route(
        &sender,
        &request(SOCIETY_RADIANT_BLOOD_MAX, "anyone here?", PlayerId(10)),
    );

    assert_eq!(outcome, RouteOutcome::SocietyRequired);
    let (events, acks, texts) = split(&drain(&mut sender_rx));
    assert!(events.is_empty());
    assert_eq!(acks, 0);
    assert_eq!(texts, vec!["You do not belong to a society.".to_string()]);
    assert!(drain(&mut peer_rx).is_empty(), "zero broadcast deliveries");
    h.shutdown().await;
}

#[tokio::test]
async fn society_message_reaches_same_society_and_admins_only() {
    let h = Harness::new();
    let (sender, _sender_rx) = h.connect(
        1,
        Player::new(PlayerId(10), "Aldren").with_society(Society::EldrytchWeb),
    );
    let (_same, mut same_rx) = h.connect(
        2,
        Player::new(PlayerId(11), "Borel").with_society(Society::EldrytchWeb),
    );
    let (_other, mut other_rx) = h.connect(
        3,
        Player::new(PlayerId(12), "Cyris").with_society(Society::RadiantBlood),
    );
    let (_admin, mut admin_rx) = h.connect(4, Player::new(PlayerId(13), "Envoy").with_admin());

    let outcome = h.router.route(&sender, &request(7, "web business", PlayerId(10)));

    // Sender, same-society peer, and the admin.
    assert_eq!(outcome, RouteOutcome::Delivered { recipients: 3 });
    assert_eq!(split(&drain(&mut same_rx)).0.len(), 1);
    assert!(drain(&mut other_rx).is_empty());
    assert_eq!(split(&drain(&mut admin_rx)).0.len(), 1);
    h.shutdown().await;
}

// =========================================================================
// Allegiance channels
// =========================================================================

const ALLEGIANCE_CHANNEL: u32 = SOCIETY_RADIANT_BLOOD_MAX + 4;

fn allegiance_with(members: &[PlayerId]) -> Arc<Allegiance> {
    let alg = Arc::new(Allegiance::new(AllegianceId(4)));
    for member in members {
        alg.add_member(*member);
    }
    alg
}

#[tokio::test]
async fn allegiance_channel_without_allegiance_is_dropped() {
    let h = Harness::new();
    let (sender, mut sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));

    let outcome = h
        .router
        .route(&sender, &request(ALLEGIANCE_CHANNEL, "hello", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::AllegianceNotFound);
    assert!(drain(&mut sender_rx).is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn allegiance_non_member_sender_is_dropped_silently() {
    let h = Harness::new();
    let (sender, mut sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let (_member, mut member_rx) = h.connect(2, Player::new(PlayerId(11), "Borel"));
    h.registry
        .register_allegiance(ALLEGIANCE_CHANNEL, allegiance_with(&[PlayerId(11)]));

    let outcome = h
        .router
        .route(&sender, &request(ALLEGIANCE_CHANNEL, "let me in", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::SenderFiltered);
    assert!(drain(&mut sender_rx).is_empty(), "silent drop, not even an ack");
    assert!(drain(&mut member_rx).is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn allegiance_filtered_sender_is_dropped_silently() {
    let h = Harness::new();
    let (sender, mut sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let alg = allegiance_with(&[PlayerId(10)]);
    alg.set_filtered(PlayerId(10), true);
    h.registry.register_allegiance(ALLEGIANCE_CHANNEL, alg);

    let outcome = h
        .router
        .route(&sender, &request(ALLEGIANCE_CHANNEL, "hello", PlayerId(10)));

    assert_eq!(outcome, RouteOutcome::SenderFiltered);
    assert!(drain(&mut sender_rx).is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn allegiance_message_respects_member_filters() {
    let h = Harness::new();
    let (sender, mut sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));
    let (_member, mut member_rx) = h.connect(2, Player::new(PlayerId(11), "Borel"));
    let (_booted, mut booted_rx) = h.connect(3, Player::new(PlayerId(12), "Cyris"));
    let (_outsider, mut outsider_rx) = h.connect(4, Player::new(PlayerId(13), "Deryn"));

    let muted = Player::new(PlayerId(14), "Elya");
    muted.set_options(CharacterOptions {
        listen_allegiance: false,
        ..CharacterOptions::default()
    });
    let (_muted, mut muted_rx) = h.connect(5, muted);

    let blocker = Player::new(PlayerId(15), "Ferin");
    blocker.add_squelch(PlayerId(10), SquelchCategory::Allegiance);
    let (_blocker, mut blocker_rx) = h.connect(6, blocker);

    let alg = allegiance_with(&[
        PlayerId(10),
        PlayerId(11),
        PlayerId(12),
        PlayerId(14),
        PlayerId(15),
    ]);
    alg.set_filtered(PlayerId(12), true);
    h.registry.register_allegiance(ALLEGIANCE_CHANNEL, alg);

    let outcome = h
        .router
        .route(&sender, &request(ALLEGIANCE_CHANNEL, "muster up", PlayerId(10)));

    // Sender and Borel only.
    assert_eq!(outcome, RouteOutcome::Delivered { recipients: 2 });
    assert_eq!(split(&drain(&mut member_rx)).0.len(), 1);
    assert!(drain(&mut booted_rx).is_empty(), "filtered member sees nothing");
    assert!(drain(&mut outsider_rx).is_empty(), "non-member sees nothing");
    assert!(drain(&mut muted_rx).is_empty(), "listen option off");
    assert!(drain(&mut blocker_rx).is_empty(), "allegiance-squelched sender");

    let (events, acks, _) = split(&drain(&mut sender_rx));
    assert_eq!(events.len(), 1);
    assert_eq!(acks, 1);
    h.shutdown().await;
}

// =========================================================================
// External relay
// =========================================================================

#[tokio::test]
async fn general_chat_is_offered_to_the_relay() {
    let h = Harness::new();
    let (sender, _sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));

    h.router.route(&sender, &request(CHANNEL_GENERAL, "hello world", PlayerId(10)));

    wait_until(|| !h.relay.delivered.lock().is_empty()).await;
    let delivered = h.relay.delivered.lock().clone();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].sender, "Aldren");
    assert_eq!(delivered[0].text, "hello world");
    assert_eq!(delivered[0].channel_label, "General");
    h.shutdown().await;
}

#[tokio::test]
async fn non_general_channels_do_not_reach_the_relay() {
    let h = Harness::new();
    let (sender, _sender_rx) = h.connect(1, Player::new(PlayerId(10), "Aldren"));

    h.router.route(&sender, &request(CHANNEL_TRADE, "selling", PlayerId(10)));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(h.relay.delivered.lock().is_empty());
    h.shutdown().await;
}
