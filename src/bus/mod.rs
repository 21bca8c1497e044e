//! NATS JetStream bootstrap and subscription helpers.
//!
//! Three durable streams back the system: `EVENTS` (transaction events),
//! `DECISIONS` (provisional/final/override decisions), and `POLICY`
//! (policy apply/broadcast). Stream and consumer creation is idempotent:
//! add, and fall back to update if another process raced us to create it.

use std::time::Duration;

use async_nats::jetstream::{self, consumer::pull, stream};
use futures::StreamExt;
use serde::Serialize;
use tracing::{info, warn};

pub const STREAM_EVENTS: &str = "EVENTS";
pub const STREAM_DECISIONS: &str = "DECISIONS";
pub const STREAM_POLICY: &str = "POLICY";

pub const SUBJ_TX_EVENT: &str = "events.tx";
pub const SUBJ_DECISION_PROVISIONAL: &str = "decisions.provisional";
pub const SUBJ_DECISION_FINAL: &str = "decisions.final";
pub const SUBJ_DECISION_OVERRIDE: &str = "decisions.override";
pub const SUBJ_POLICY_APPLY: &str = "policies.apply";
pub const SUBJ_POLICY_BROADCAST: &str = "policies.current";

/// A connected bus: core NATS client plus a JetStream context.
#[derive(Clone)]
pub struct Bus {
    client: async_nats::Client,
    js: jetstream::Context,
}

impl Bus {
    /// Connect to the given NATS servers with a short timeout.
    pub async fn connect(urls: &[String]) -> anyhow::Result<Self> {
        let servers = urls.join(",");
        let client = async_nats::ConnectOptions::new()
            .name("riskr")
            .connection_timeout(Duration::from_secs(5))
            .connect(servers)
            .await?;
        let js = jetstream::new(client.clone());

        Ok(Bus { client, js })
    }

    /// Idempotently create (or update) the three streams this system needs.
    pub async fn ensure_streams(&self) -> anyhow::Result<()> {
        self.ensure_stream(
            STREAM_EVENTS,
            vec![format!("{SUBJ_TX_EVENT}.*")],
        )
        .await?;
        self.ensure_stream(
            STREAM_DECISIONS,
            vec![
                SUBJ_DECISION_PROVISIONAL.to_string(),
                SUBJ_DECISION_FINAL.to_string(),
                SUBJ_DECISION_OVERRIDE.to_string(),
            ],
        )
        .await?;
        self.ensure_stream(
            STREAM_POLICY,
            vec![SUBJ_POLICY_APPLY.to_string(), SUBJ_POLICY_BROADCAST.to_string()],
        )
        .await?;

        Ok(())
    }

    async fn ensure_stream(&self, name: &str, subjects: Vec<String>) -> anyhow::Result<()> {
        let cfg = stream::Config {
            name: name.to_string(),
            subjects,
            retention: stream::RetentionPolicy::Limits,
            storage: stream::StorageType::File,
            num_replicas: 1,
            ..Default::default()
        };

        if self.js.get_stream(name).await.is_ok() {
            self.js.update_stream(&cfg).await?;
            return Ok(());
        }

        if self.js.create_stream(cfg.clone()).await.is_err() {
            // Another process may have created it between our check and now.
            self.js.update_stream(&cfg).await?;
        }

        Ok(())
    }

    /// Best-effort publish on core NATS (no delivery guarantee, no ack).
    pub async fn publish_best_effort<T: Serialize>(&self, subject: &str, payload: &T) {
        let Ok(bytes) = serde_json::to_vec(payload) else {
            warn!(subject, "failed to serialize best-effort publish");
            return;
        };

        if let Err(e) = self.client.publish(subject.to_string(), bytes.into()).await {
            warn!(subject, error = %e, "best-effort publish failed");
        }
    }

    /// Durable publish via JetStream; waits for the broker's ack.
    pub async fn publish_durable<T: Serialize>(
        &self,
        subject: &str,
        payload: &T,
    ) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec(payload)?;
        self.js.publish(subject.to_string(), bytes.into()).await?.await?;
        Ok(())
    }

    /// Subscribe durably (pull consumer) to `subject` on `stream`, under the
    /// consumer group `durable_name`. Returns a stream of raw message bytes;
    /// each message must be acked by the caller after processing.
    pub async fn subscribe_durable(
        &self,
        stream_name: &str,
        subject: &str,
        durable_name: &str,
    ) -> anyhow::Result<jetstream::consumer::PullConsumer> {
        let stream = self.js.get_stream(stream_name).await?;

        let consumer = stream
            .get_or_create_consumer(
                durable_name,
                pull::Config {
                    durable_name: Some(durable_name.to_string()),
                    filter_subject: subject.to_string(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(30),
                    ..Default::default()
                },
            )
            .await?;

        info!(stream_name, subject, durable_name, "durable subscription ready");
        Ok(consumer)
    }
}

/// Error returned by a `drain_batch` handler.
///
/// The two variants decide what happens to the message, not just whether
/// the handler logs something: a `Poison` message (malformed payload,
/// failed validation) can never succeed on redelivery, so it is logged and
/// acked — dropped. A `Retriable` failure (a downstream publish that may
/// succeed next time) is nak'd so the broker redelivers it.
#[derive(Debug)]
pub enum DrainError {
    Poison(anyhow::Error),
    Retriable(anyhow::Error),
}

impl DrainError {
    pub fn poison(e: impl Into<anyhow::Error>) -> Self {
        DrainError::Poison(e.into())
    }

    pub fn retriable(e: impl Into<anyhow::Error>) -> Self {
        DrainError::Retriable(e.into())
    }
}

impl std::fmt::Display for DrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrainError::Poison(e) => write!(f, "{e}"),
            DrainError::Retriable(e) => write!(f, "{e}"),
        }
    }
}

/// Pull a bounded batch of messages from a durable consumer and hand each
/// to `handler`. Acks on `Ok` and on `Err(DrainError::Poison)` (the message
/// is dropped either way); naks for redelivery only on
/// `Err(DrainError::Retriable)`.
pub async fn drain_batch<F, Fut>(
    consumer: &jetstream::consumer::PullConsumer,
    batch_size: usize,
    mut handler: F,
) -> anyhow::Result<usize>
where
    F: FnMut(Vec<u8>) -> Fut,
    Fut: std::future::Future<Output = Result<(), DrainError>>,
{
    let mut messages = consumer.fetch().max_messages(batch_size).messages().await?;
    let mut processed = 0;

    while let Some(msg) = messages.next().await {
        let msg = msg?;
        let payload = msg.payload.to_vec();

        match handler(payload).await {
            Ok(()) => {
                msg.ack().await.map_err(|e| anyhow::anyhow!("ack failed: {e}"))?;
            }
            Err(DrainError::Poison(e)) => {
                warn!(error = %e, "poison message, acking to drop");
                msg.ack().await.map_err(|e| anyhow::anyhow!("ack failed: {e}"))?;
            }
            Err(DrainError::Retriable(e)) => {
                warn!(error = %e, "handler failed, nak-ing for redelivery");
                msg.ack_with(jetstream::AckKind::Nak(None))
                    .await
                    .map_err(|e| anyhow::anyhow!("nak failed: {e}"))?;
            }
        }
        processed += 1;
    }

    Ok(processed)
}
