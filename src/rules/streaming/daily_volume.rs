use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::evidence::RuleResult;
use crate::domain::{Decision, Evidence, TxEvent};
use crate::rules::traits::Rule;
use crate::state::RollingView;

/// Daily USD volume limit rule.
///
/// Tracks rolling 24-hour transaction volume per user and triggers
/// when the cumulative volume exceeds the configured threshold.
///
/// Snapshotless at inline time: `eval_inline` always allows, since the
/// rolling view isn't available in the request path.
#[derive(Debug)]
pub struct DailyVolumeRule {
    id: String,
    action: Decision,
    /// Daily volume limit in USD
    limit: Decimal,
}

impl DailyVolumeRule {
    /// Create a new daily volume rule.
    pub fn new(id: String, action: Decision, limit: Decimal) -> Self {
        DailyVolumeRule { id, action, limit }
    }
}

impl Rule for DailyVolumeRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn eval_inline(&self, _event: &TxEvent) -> RuleResult {
        RuleResult::allow()
    }

    fn eval_streaming(
        &self,
        _now: DateTime<Utc>,
        event: &TxEvent,
        view: &RollingView,
    ) -> RuleResult {
        // The view already reflects this transaction (the streamer calls
        // add_tx before folding rules), so this is a plain sum compare,
        // not sum + event.usd_value.
        let sum = view.rolling_usd_24h(event.subject.user_id.as_str());

        if sum > self.limit {
            return RuleResult::trigger(
                self.action,
                Evidence::with_limit(&self.id, "daily_usd", sum.to_string(), self.limit.to_string()),
            );
        }

        RuleResult::allow()
    }
}
