use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::evidence::RuleResult;
use crate::domain::{Decision, Evidence, TxEvent};
use crate::rules::traits::Rule;
use crate::state::RollingView;

/// Structuring detection rule.
///
/// Detects potential structuring behavior by counting small transactions
/// within a 24-hour window. Triggers when the count exceeds a threshold.
///
/// Snapshotless at inline time: `eval_inline` always allows.
#[derive(Debug)]
pub struct StructuringRule {
    id: String,
    action: Decision,
    /// Threshold below which a transaction is considered "small"
    amount_threshold: Decimal,
    /// Number of small transactions to trigger the rule
    count_threshold: u32,
}

impl StructuringRule {
    /// Create a new structuring detection rule.
    pub fn new(
        id: String,
        action: Decision,
        amount_threshold: Decimal,
        count_threshold: u32,
    ) -> Self {
        StructuringRule {
            id,
            action,
            amount_threshold,
            count_threshold,
        }
    }
}

impl Rule for StructuringRule {
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
        // The view already reflects this transaction, so this is a plain
        // count compare, not count + 1.
        let count = view.rolling_small_count_24h(event.subject.user_id.as_str(), self.amount_threshold);

        if count > self.count_threshold as i64 {
            return RuleResult::trigger(
                self.action,
                Evidence::with_limit(
                    &self.id,
                    "small_cnt_24h",
                    count.to_string(),
                    self.count_threshold.to_string(),
                ),
            );
        }

        RuleResult::allow()
    }
}
