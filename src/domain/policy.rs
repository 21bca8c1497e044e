use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::Decision;

/// Policy configuration defining rules and their parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Policy version identifier
    #[serde(rename = "policy_version")]
    pub version: String,

    /// Parameters used by rules
    #[serde(default)]
    pub params: RuleParams,

    /// Rule definitions
    #[serde(default)]
    pub rules: Vec<RuleDef>,

    /// Policy signature (opaque; verification is deferred)
    #[serde(default)]
    pub signature: String,

    /// SHA-256 hex digest over the canonical JSON of the fields above.
    /// Computed on load, not carried from the YAML source.
    #[serde(default)]
    pub hash: String,
}

/// The subset of `Policy` that is hashed: everything but the hash itself.
/// A `BTreeMap` (rather than the wire `RuleParams`'s original HashMap) would
/// be needed if key order mattered here, but `RuleParams` is already
/// canonical (see below) so this just mirrors the field set.
#[derive(Serialize)]
struct Canonical<'a> {
    policy_version: &'a str,
    params: &'a RuleParams,
    rules: &'a [RuleDef],
    signature: &'a str,
}

impl Policy {
    /// Create an empty policy.
    pub fn empty() -> Self {
        let mut p = Policy {
            version: "0.0.0".to_string(),
            params: RuleParams::default(),
            rules: Vec::new(),
            signature: String::new(),
            hash: String::new(),
        };
        p.hash = p.compute_hash();
        p
    }

    /// Compute the SHA-256 hex digest over the canonical JSON serialization
    /// of this policy's content (everything but the hash field itself).
    /// Two policies are equivalent iff this value matches.
    pub fn compute_hash(&self) -> String {
        let canonical = Canonical {
            policy_version: &self.version,
            params: &self.params,
            rules: &self.rules,
            signature: &self.signature,
        };
        let bytes =
            serde_json::to_vec(&canonical).expect("policy fields are always serializable");
        let digest = Sha256::digest(&bytes);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Indented JSON for human inspection, including the computed hash.
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Parameters used by rules. `kyc_tier_caps_usd` is a `BTreeMap` rather than
/// a `HashMap` so its JSON serialization is key-order-deterministic, which
/// the policy content hash depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleParams {
    /// KYC tier transaction caps in USD
    #[serde(default)]
    pub kyc_tier_caps_usd: BTreeMap<String, Decimal>,

    /// Daily volume limit in USD
    #[serde(default)]
    pub daily_volume_limit_usd: Option<Decimal>,

    /// Small transaction threshold for structuring detection
    #[serde(default)]
    pub structuring_small_usd: Option<Decimal>,

    /// Count threshold for structuring detection
    #[serde(default)]
    pub structuring_small_count: Option<u32>,
}

impl RuleParams {
    /// Get KYC cap for a tier, returning None if no limit.
    pub fn kyc_cap(&self, tier: &str) -> Option<Decimal> {
        self.kyc_tier_caps_usd.get(tier).copied()
    }
}

/// Rule type identifier. Unrecognized tags deserialize to `Unknown` rather
/// than failing policy load, so a newer policy document carrying
/// forward-looking rule types stays loadable by an older binary; the
/// compiler (`RuleSet::from_policy`) drops `Unknown` rules with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// OFAC address screening
    OfacAddr,
    /// Jurisdiction blocking
    JurisdictionBlock,
    /// KYC tier transaction cap
    KycTierTxCap,
    /// Daily USD volume limit
    DailyUsdVolume,
    /// Structuring detection (small tx pattern)
    StructuringSmallTx,
    /// Any tag not recognized above.
    #[serde(other)]
    Unknown,
}

/// Definition of a single rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    /// Unique rule identifier
    pub id: String,

    /// Rule type
    #[serde(rename = "type")]
    pub rule_type: RuleType,

    /// Action to take when rule triggers
    pub action: Decision,

    /// Blocked countries for jurisdiction rule
    #[serde(default)]
    pub blocked_countries: Vec<String>,
}

impl RuleDef {
    /// Check if this rule is an inline rule (stateless).
    pub fn is_inline(&self) -> bool {
        matches!(
            self.rule_type,
            RuleType::OfacAddr | RuleType::JurisdictionBlock | RuleType::KycTierTxCap
        )
    }

    /// Check if this rule is a streaming rule (stateful).
    pub fn is_streaming(&self) -> bool {
        matches!(
            self.rule_type,
            RuleType::DailyUsdVolume | RuleType::StructuringSmallTx
        )
    }
}
