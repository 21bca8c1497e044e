use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::domain::evidence::RuleResult;
use crate::domain::{Decision, Evidence, TxEvent};
use crate::rules::traits::Rule;
use crate::state::RollingView;

/// Jurisdiction blocking rule.
///
/// Blocks transactions from specific countries based on ISO 3166-1 alpha-2 codes.
#[derive(Debug)]
pub struct JurisdictionRule {
    id: String,
    action: Decision,
    /// Set of blocked country codes (uppercase)
    blocked: HashSet<String>,
}

impl JurisdictionRule {
    /// Create a new jurisdiction rule with blocked countries.
    pub fn new(id: String, action: Decision, blocked_countries: HashSet<String>) -> Self {
        let blocked = blocked_countries
            .into_iter()
            .map(|c| c.to_uppercase())
            .collect();

        JurisdictionRule {
            id,
            action,
            blocked,
        }
    }

    /// Check if a country code is blocked.
    #[inline]
    fn is_blocked(&self, country_code: &str) -> bool {
        self.blocked.contains(&country_code.to_uppercase())
    }

    fn check(&self, event: &TxEvent) -> RuleResult {
        let country = event.subject.geo_iso.as_str();

        if self.is_blocked(country) {
            return RuleResult::trigger(self.action, Evidence::new(&self.id, "geo_iso", country));
        }

        RuleResult::allow()
    }
}

impl Rule for JurisdictionRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn eval_inline(&self, event: &TxEvent) -> RuleResult {
        self.check(event)
    }

    fn eval_streaming(
        &self,
        _now: DateTime<Utc>,
        event: &TxEvent,
        _view: &RollingView,
    ) -> RuleResult {
        self.check(event)
    }
}
