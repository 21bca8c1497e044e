use chrono::{DateTime, Utc};
use std::fmt::Debug;

use crate::domain::evidence::RuleResult;
use crate::domain::TxEvent;
use crate::state::RollingView;

/// A compiled rule, evaluated on both the inline and streaming paths.
///
/// `eval_inline` runs synchronously in the request path and must complete
/// within the latency budget; it sees only the current transaction. The
/// three stateless rule types (OFAC, jurisdiction, KYC cap) implement it
/// for real. The two stateful rule types (daily volume, structuring) have
/// no view of history at inline time and always allow there.
///
/// `eval_streaming` runs on the streamer path, after the rolling view has
/// already been updated with the current transaction, and may consult
/// that view.
pub trait Rule: Send + Sync + Debug {
    /// Unique identifier for this rule.
    fn id(&self) -> &str;

    /// Evaluate against the current transaction alone.
    fn eval_inline(&self, event: &TxEvent) -> RuleResult;

    /// Evaluate against the current transaction and the rolling view,
    /// which already reflects this transaction.
    fn eval_streaming(&self, now: DateTime<Utc>, event: &TxEvent, view: &RollingView)
        -> RuleResult;
}
