use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::bus::{self, Bus};
use crate::domain::event::DecisionStage;
use crate::domain::{Decision, DecisionEvent};
use crate::observability::MetricsRegistry;
use crate::rules::RuleSet;

use super::request::DecisionRequest;
use super::response::{DecisionResponse, ErrorResponse, HealthResponse, ReadyResponse};

/// Shared application state for the inline (gateway) path.
///
/// The gateway evaluates only the three stateless rule types
/// (OFAC/jurisdiction/KYC cap); the streamer owns the rolling view and
/// emits an override decision asynchronously if a streaming rule fires.
pub struct AppState {
    /// Current rule set (updated via watch channel)
    pub ruleset_rx: watch::Receiver<Arc<RuleSet>>,

    /// Bus for publishing the observed event and provisional decision.
    /// `None` disables publishing (useful for tests).
    pub bus: Option<Arc<Bus>>,

    /// Metrics registry.
    pub metrics: Arc<MetricsRegistry>,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,

    /// Latency budget in milliseconds
    pub latency_budget_ms: u64,
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/decision/check", post(handle_decision))
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .with_state(state)
}

/// Handle decision check requests: evaluate inline rules synchronously,
/// best-effort publish the event and a provisional decision, and return
/// immediately. Streaming rules are evaluated asynchronously by the
/// streamer and may raise an override decision later.
async fn handle_decision(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DecisionRequest>,
) -> impl IntoResponse {
    let start = Instant::now();
    let event = req.to_tx_event();
    let user_id = event.subject.user_id.as_str().to_string();

    let ruleset = state.ruleset_rx.borrow().clone();

    let mut final_decision = Decision::Allow;
    let mut evidence = Vec::new();

    for rule in &ruleset.rules {
        let result = rule.eval_inline(&event);
        state.metrics.record_rule_evaluation(result.hit);
        if result.hit {
            final_decision = final_decision.max(result.decision);
            if let Some(ev) = result.evidence {
                evidence.push(ev);
            }
        }
    }

    if let Some(bus) = &state.bus {
        let subject = format!("{}.INLINE", bus::SUBJ_TX_EVENT);
        bus.publish_best_effort(&subject, &event).await;

        let provisional = DecisionEvent::new(
            event.event_id.clone(),
            DecisionStage::Provisional,
            final_decision,
            ruleset.policy_version.clone(),
            evidence.clone(),
        );
        bus.publish_best_effort(bus::SUBJ_DECISION_PROVISIONAL, &provisional)
            .await;
    }

    let elapsed = start.elapsed();
    state.metrics.record_latency(start);
    state.metrics.record_decision(&final_decision);

    if elapsed.as_millis() > state.latency_budget_ms as u128 {
        warn!(
            user_id = %user_id,
            latency_ms = elapsed.as_millis(),
            budget_ms = state.latency_budget_ms,
            "decision latency exceeded budget"
        );
    }

    info!(
        user_id = %user_id,
        decision = %final_decision,
        latency_ms = elapsed.as_millis(),
        "decision completed"
    );

    (
        StatusCode::OK,
        Json(DecisionResponse::new(
            final_decision,
            ruleset.policy_version.clone(),
            evidence,
        )),
    )
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ruleset = state.ruleset_rx.borrow();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        policy_version: ruleset.policy_version.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check endpoint.
async fn handle_ready(State(state): State<Arc<AppState>>) -> axum::response::Response {
    let ruleset = state.ruleset_rx.borrow();

    if ruleset.rules.is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("No rules loaded", "NOT_READY")),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(ReadyResponse {
            ready: true,
            policy_version: ruleset.policy_version.clone(),
            rules_loaded: ruleset.rules.len(),
        }),
    )
        .into_response()
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.metrics.to_prometheus(),
    )
}
