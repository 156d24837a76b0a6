//! The external chat relay task.
//!
//! The relay bridges General chat to an external integration (a
//! webhook-style endpoint). Delivery is strictly best-effort: the router
//! offers a message and moves on; a slow, failing, or unconfigured relay
//! can never touch the in-world delivery path.
//!
//! The bridge runs as an explicit Tokio task owning an unbounded offer
//! queue and a [`CancellationToken`]. [`RelayTask::shutdown`] cancels and
//! joins, so lifecycle is observable and deterministic rather than
//! silently-abandoned work.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{PropertySource, RELAY_ENABLED, RELAY_ENDPOINT};

/// Errors an external relay implementation can report.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The relay could not deliver the message. Swallowed and logged;
    /// never propagated.
    #[error("relay delivery failed: {0}")]
    Delivery(String),
}

/// The external integration this core offers messages to.
pub trait ChatRelay: Send + Sync + 'static {
    /// Delivers one message. Fire-and-forget from the router's view.
    fn deliver(&self, sender: &str, text: &str, channel_label: &str) -> Result<(), RelayError>;
}

/// One message offered to the relay. Serializable because it crosses a
/// process boundary in production deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayOffer {
    pub sender: String,
    pub text: String,
    pub channel_label: String,
}

/// Cheap-to-clone sender half of the relay queue.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::UnboundedSender<RelayOffer>,
}

impl RelayHandle {
    /// Offers a message to the relay. Never blocks; if the task is gone
    /// the offer is dropped.
    pub fn offer(&self, offer: RelayOffer) {
        if self.tx.send(offer).is_err() {
            tracing::trace!("relay task gone, dropping offer");
        }
    }
}

/// The running relay task plus its shutdown contract.
pub struct RelayTask {
    handle: RelayHandle,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl RelayTask {
    /// Spawns the relay worker.
    pub fn spawn(relay: Arc<dyn ChatRelay>, properties: Arc<dyn PropertySource>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        let join = tokio::spawn(run(relay, properties, rx, worker_cancel));
        Self {
            handle: RelayHandle { tx },
            cancel,
            join,
        }
    }

    /// A cloneable handle for offering messages.
    pub fn handle(&self) -> RelayHandle {
        self.handle.clone()
    }

    /// Cancels the worker and waits for it to finish. Queued offers that
    /// have not been processed are dropped; they were best-effort.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if self.join.await.is_err() {
            tracing::warn!("relay task panicked during shutdown");
        }
    }
}

async fn run(
    relay: Arc<dyn ChatRelay>,
    properties: Arc<dyn PropertySource>,
    mut rx: mpsc::UnboundedReceiver<RelayOffer>,
    cancel: CancellationToken,
) {
    // Each distinct missing-configuration cause is logged once, not per
    // message, to keep an unconfigured relay from spamming the log.
    let mut logged_missing: HashSet<&'static str> = HashSet::new();

    loop {
        let offer = tokio::select! {
            _ = cancel.cancelled() => break,
            offer = rx.recv() => match offer {
                Some(offer) => offer,
                None => break,
            },
        };

        match properties.bool_value(RELAY_ENABLED) {
            Some(true) => {}
            Some(false) => continue,
            None => {
                if logged_missing.insert("relay-enabled-unset") {
                    tracing::info!(key = RELAY_ENABLED, "relay flag unset, relay disabled");
                }
                continue;
            }
        }

        match properties.string_value(RELAY_ENDPOINT) {
            Some(endpoint) if !endpoint.is_empty() => {}
            _ => {
                if logged_missing.insert("relay-endpoint-unset") {
                    tracing::warn!(key = RELAY_ENDPOINT, "relay enabled but endpoint unset, relay disabled");
                }
                continue;
            }
        }

        if let Err(err) = relay.deliver(&offer.sender, &offer.text, &offer.channel_label) {
            tracing::warn!(error = %err, channel = %offer.channel_label, "relay delivery failed");
        }
    }

    tracing::debug!("relay task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticProperties;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingRelay {
        delivered: Mutex<Vec<RelayOffer>>,
        fail: bool,
    }

    impl ChatRelay for RecordingRelay {
        fn deliver(
            &self,
            sender: &str,
            text: &str,
            channel_label: &str,
        ) -> Result<(), RelayError> {
            self.delivered.lock().push(RelayOffer {
                sender: sender.to_string(),
                text: text.to_string(),
                channel_label: channel_label.to_string(),
            });
            if self.fail {
                return Err(RelayError::Delivery("endpoint unreachable".into()));
            }
            Ok(())
        }
    }

    fn configured() -> Arc<StaticProperties> {
        Arc::new(
            StaticProperties::new()
                .with_bool(RELAY_ENABLED, true)
                .with_string(RELAY_ENDPOINT, "https://relay.example/hook"),
        )
    }

    fn offer(text: &str) -> RelayOffer {
        RelayOffer {
            sender: "Aldren".into(),
            text: text.into(),
            channel_label: "General".into(),
        }
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

    #[tokio::test]
    async fn test_configured_relay_receives_offers() {
        let relay = Arc::new(RecordingRelay::default());
        let task = RelayTask::spawn(Arc::clone(&relay) as Arc<dyn ChatRelay>, configured());

        task.handle().offer(offer("hello"));
        wait_until(|| !relay.delivered.lock().is_empty()).await;

        let delivered = relay.delivered.lock().clone();
        assert_eq!(delivered, vec![offer("hello")]);
        task.shutdown().await;
    }

    #[tokio::test]
    async fn test_unconfigured_relay_drops_offers() {
        let relay = Arc::new(RecordingRelay::default());
        let task = RelayTask::spawn(
            Arc::clone(&relay) as Arc<dyn ChatRelay>,
            Arc::new(StaticProperties::new()),
        );

        task.handle().offer(offer("nobody hears this"));
        // Give the worker a chance to mishandle the offer before asserting.
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(relay.delivered.lock().is_empty());
        task.shutdown().await;
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let relay = Arc::new(RecordingRelay {
            fail: true,
            ..RecordingRelay::default()
        });
        let task = RelayTask::spawn(Arc::clone(&relay) as Arc<dyn ChatRelay>, configured());

        task.handle().offer(offer("first"));
        task.handle().offer(offer("second"));
        wait_until(|| relay.delivered.lock().len() == 2).await;

        // Both were attempted; the failures never surfaced anywhere.
        task.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_joins_deterministically() {
        let relay = Arc::new(RecordingRelay::default());
        let task = RelayTask::spawn(Arc::clone(&relay) as Arc<dyn ChatRelay>, configured());
        let handle = task.handle();

        task.shutdown().await;

        // Offers after shutdown are silently dropped, never panicking.
        handle.offer(offer("too late"));
        assert!(relay.delivered.lock().is_empty());
    }
}
