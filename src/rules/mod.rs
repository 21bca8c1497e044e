pub mod inline;
pub mod streaming;
pub mod traits;

pub use inline::{JurisdictionRule, KycCapRule, OfacRule};
pub use streaming::{DailyVolumeRule, StructuringRule};
pub use traits::Rule;

use crate::domain::{Policy, RuleType};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Collection of compiled rules ready for evaluation.
pub struct RuleSet {
    pub rules: Vec<Arc<dyn Rule>>,
    pub policy_version: String,
}

impl RuleSet {
    /// Build rules from a policy and sanctions list.
    pub fn from_policy(policy: &Policy, sanctions: HashSet<String>) -> Self {
        let mut rules: Vec<Arc<dyn Rule>> = Vec::new();

        for rule_def in &policy.rules {
            match rule_def.rule_type {
                RuleType::OfacAddr => {
                    rules.push(Arc::new(OfacRule::new(
                        rule_def.id.clone(),
                        rule_def.action,
                        sanctions.clone(),
                    )));
                }
                RuleType::JurisdictionBlock => {
                    let blocked: HashSet<String> = rule_def
                        .blocked_countries
                        .iter()
                        .map(|c| c.to_uppercase())
                        .collect();
                    rules.push(Arc::new(JurisdictionRule::new(
                        rule_def.id.clone(),
                        rule_def.action,
                        blocked,
                    )));
                }
                RuleType::KycTierTxCap => {
                    let caps: HashMap<String, rust_decimal::Decimal> = policy
                        .params
                        .kyc_tier_caps_usd
                        .iter()
                        .map(|(k, v)| (k.clone(), *v))
                        .collect();
                    rules.push(Arc::new(KycCapRule::new(
                        rule_def.id.clone(),
                        rule_def.action,
                        caps,
                    )));
                }
                RuleType::DailyUsdVolume => {
                    if let Some(limit) = policy.params.daily_volume_limit_usd {
                        rules.push(Arc::new(DailyVolumeRule::new(
                            rule_def.id.clone(),
                            rule_def.action,
                            limit,
                        )));
                    }
                }
                RuleType::StructuringSmallTx => {
                    if let Some(threshold) = policy.params.structuring_small_usd {
                        let count = policy.params.structuring_small_count.unwrap_or(5);
                        rules.push(Arc::new(StructuringRule::new(
                            rule_def.id.clone(),
                            rule_def.action,
                            threshold,
                            count,
                        )));
                    }
                }
                RuleType::Unknown => {
                    tracing::warn!(rule_id = %rule_def.id, "dropping rule with unrecognized type");
                }
            }
        }

        RuleSet {
            rules,
            policy_version: policy.version.clone(),
        }
    }

    /// Create an empty rule set.
    pub fn empty() -> Self {
        RuleSet {
            rules: Vec::new(),
            policy_version: "0.0.0".to_string(),
        }
    }
}
