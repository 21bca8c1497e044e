//! The rolling state view: a process-local, thread-safe mapping from user id
//! to a time-ordered sequence of (timestamp, USD) entries, consulted and
//! mutated by the streaming rule evaluation path.
//!
//! All three operations serialize on a single mutex over the whole user map
//! (not sharded per user) — the orchestrator performs `add_tx` and the
//! subsequent rule fold on the same thread for a given event, and the
//! pruning invariant assumes no two operations for the same user interleave.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

const WINDOW_HOURS: i64 = 24;

/// A single transaction entry in a user's rolling window.
#[derive(Debug, Clone)]
pub struct TxEntry {
    pub timestamp: DateTime<Utc>,
    pub usd_value: Decimal,
}

/// Process-wide rolling view. In-memory only: state is lost on restart
/// (persistence is an explicit non-goal).
#[derive(Debug, Default)]
pub struct RollingView {
    entries: Mutex<HashMap<String, VecDeque<TxEntry>>>,
}

impl RollingView {
    pub fn new() -> Self {
        RollingView {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Append an entry for `user`. Does not prune; pruning happens at the
    /// start of every read, per the pruning policy.
    pub fn add_tx(&self, user: &str, at: DateTime<Utc>, usd: Decimal) {
        let mut entries = self.entries.lock();
        entries
            .entry(user.to_string())
            .or_default()
            .push_back(TxEntry {
                timestamp: at,
                usd_value: usd,
            });
    }

    /// Prune entries whose timestamp is not strictly after `now - 24h`,
    /// then sum the USD value of what remains.
    pub fn rolling_usd_24h(&self, user: &str) -> Decimal {
        let mut entries = self.entries.lock();
        let Some(deque) = entries.get_mut(user) else {
            return Decimal::ZERO;
        };
        prune_locked(deque);
        deque.iter().map(|e| e.usd_value).sum()
    }

    /// Prune, then count entries whose USD value is strictly less than
    /// `amt_thresh`.
    pub fn rolling_small_count_24h(&self, user: &str, amt_thresh: Decimal) -> i64 {
        let mut entries = self.entries.lock();
        let Some(deque) = entries.get_mut(user) else {
            return 0;
        };
        prune_locked(deque);
        deque.iter().filter(|e| e.usd_value < amt_thresh).count() as i64
    }

    /// Number of distinct users with at least one entry. Exposed for
    /// observability, not part of the core contract.
    pub fn user_count(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Walks from the front assuming entries were appended in non-decreasing
/// timestamp order; out-of-order appends may leave stale entries behind
/// (an acknowledged limitation, not handled here).
fn prune_locked(deque: &mut VecDeque<TxEntry>) {
    let cutoff = Utc::now() - Duration::hours(WINDOW_HOURS);
    while let Some(front) = deque.front() {
        if front.timestamp <= cutoff {
            deque.pop_front();
        } else {
            break;
        }
    }
}
