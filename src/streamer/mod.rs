//! The streaming orchestrator: consumes transaction events durably, folds
//! every compiled rule's `eval_streaming` over the rolling view, and
//! publishes an override decision whenever the outcome is no longer Allow.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::bus::{self, Bus};
use crate::domain::event::DecisionStage;
use crate::domain::{Decision, DecisionEvent, TxEvent};
use crate::rules::RuleSet;
use crate::state::RollingView;

/// Durable consumer group names. One per subscription so each has its own
/// cursor into the stream.
const DURABLE_EVENTS: &str = "streamer-events";
const DURABLE_DECISIONS_SINK: &str = "streamer-decisions-sink";

/// Fold every rule's streaming evaluation over `event`, returning the
/// severity-max decision and the evidence from every rule that fired.
pub fn evaluate_streaming(
    ruleset: &RuleSet,
    view: &RollingView,
    event: &TxEvent,
) -> (Decision, Vec<crate::domain::Evidence>) {
    let now = Utc::now();
    let mut decision = Decision::Allow;
    let mut evidence = Vec::new();

    for rule in &ruleset.rules {
        let result = rule.eval_streaming(now, event, view);
        if result.hit {
            decision = decision.max(result.decision);
            if let Some(ev) = result.evidence {
                evidence.push(ev);
            }
        }
    }

    (decision, evidence)
}

/// Runs forever (until the process is asked to shut down), pulling batches
/// of transaction events off the bus and evaluating them against the
/// current rule set.
pub async fn run(
    bus: Arc<Bus>,
    view: Arc<RollingView>,
    mut ruleset_rx: watch::Receiver<Arc<RuleSet>>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> anyhow::Result<()> {
    // A no-op durable sink on decisions.provisional keeps that consumer's
    // cursor advancing even though the streamer does nothing with them;
    // the gateway publishes them purely for audit/replay purposes.
    let prov_consumer = bus
        .subscribe_durable(
            bus::STREAM_DECISIONS,
            bus::SUBJ_DECISION_PROVISIONAL,
            DURABLE_DECISIONS_SINK,
        )
        .await?;

    let events_consumer = bus
        .subscribe_durable(bus::STREAM_EVENTS, &format!("{}.*", bus::SUBJ_TX_EVENT), DURABLE_EVENTS)
        .await?;

    info!("streamer ready");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("streamer shutting down");
                    return Ok(());
                }
            }
            result = bus::drain_batch(&prov_consumer, 64, |_payload| async { Ok::<(), bus::DrainError>(()) }) => {
                if let Err(e) = result {
                    warn!(error = %e, "provisional sink drain failed");
                }
            }
            result = drain_events(&events_consumer, &view, &ruleset_rx, &bus) => {
                if let Err(e) = result {
                    warn!(error = %e, "event batch processing failed");
                }
            }
        }

        // Pick up the latest rule set for the next iteration.
        let _ = ruleset_rx.has_changed();
    }
}

async fn drain_events(
    consumer: &async_nats::jetstream::consumer::PullConsumer,
    view: &Arc<RollingView>,
    ruleset_rx: &watch::Receiver<Arc<RuleSet>>,
    bus: &Bus,
) -> anyhow::Result<usize> {
    let ruleset = ruleset_rx.borrow().clone();

    bus::drain_batch(consumer, 64, |payload| {
        let view = Arc::clone(view);
        let ruleset = Arc::clone(&ruleset);
        let bus = bus.clone();
        async move {
            // Malformed events can never be decoded on redelivery either;
            // log and drop rather than nak-ing them into an infinite retry.
            let event: TxEvent = serde_json::from_slice(&payload)
                .map_err(|e| bus::DrainError::poison(anyhow::anyhow!("malformed tx event: {e}")))?;

            view.add_tx(
                event.subject.user_id.as_str(),
                event.occurred_at,
                event.usd_value,
            );

            let (decision, evidence) = evaluate_streaming(&ruleset, &view, &event);

            if decision != Decision::Allow {
                let decision_event = DecisionEvent::new(
                    event.event_id.clone(),
                    DecisionStage::Override,
                    decision,
                    ruleset.policy_version.clone(),
                    evidence,
                );
                bus.publish_durable(bus::SUBJ_DECISION_OVERRIDE, &decision_event)
                    .await
                    .map_err(bus::DrainError::retriable)?;
            }

            Ok(())
        }
    })
    .await
}
