use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::bus::{self, Bus};
use crate::domain::Policy;
use crate::rules::RuleSet;

use super::loader::{load_sanctions, PolicyLoader};

/// Policy plane: loads the initial policy and sanctions list from disk,
/// then listens durably on `policies.apply` for signed replacement
/// policies, recompiling and broadcasting a fresh `RuleSet` through a
/// watch channel on every accepted change.
pub struct PolicyPlane {
    loader: PolicyLoader,
}

impl PolicyPlane {
    pub fn new(loader: PolicyLoader) -> Self {
        PolicyPlane { loader }
    }

    /// Load the initial policy synchronously, returning the watch channel
    /// endpoints. The receiver is handed to the gateway/streamer; the
    /// returned `Bus`-driven task (via `spawn`) keeps it updated.
    pub fn bootstrap(&self) -> (Policy, watch::Sender<Arc<RuleSet>>, watch::Receiver<Arc<RuleSet>>) {
        let (policy, ruleset) = match self.loader.load() {
            Ok((policy, ruleset)) => {
                info!(policy_version = %policy.version, "loaded initial policy");
                (policy, ruleset)
            }
            Err(e) => {
                error!(error = %e, "failed to load initial policy, starting with an empty rule set");
                (Policy::empty(), RuleSet::empty())
            }
        };

        let (tx, rx) = watch::channel(Arc::new(ruleset));
        (policy, tx, rx)
    }

    /// Subscribe durably to `policies.apply` and recompile the rule set on
    /// every accepted message. Runs until cancelled.
    pub async fn spawn(
        self,
        bus: Arc<Bus>,
        tx: watch::Sender<Arc<RuleSet>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let consumer = bus
            .subscribe_durable(bus::STREAM_POLICY, bus::SUBJ_POLICY_APPLY, "policy-plane")
            .await?;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("policy plane shutting down");
                        return Ok(());
                    }
                }
                result = bus::drain_batch(&consumer, 8, |payload| {
                    let tx = tx.clone();
                    let sanctions_path = self.loader.sanctions_path().to_string();
                    async move {
                        // Rejected or malformed policies are never retried by
                        // redelivery — ack (drop) regardless of outcome.
                        apply_policy_payload(&payload, &sanctions_path, &tx).map_err(bus::DrainError::poison)
                    }
                }) => {
                    if let Err(e) = result {
                        warn!(error = %e, "policy apply batch failed");
                    }
                }
            }
        }
    }
}

fn apply_policy_payload(
    payload: &[u8],
    sanctions_path: &str,
    tx: &watch::Sender<Arc<RuleSet>>,
) -> anyhow::Result<()> {
    let policy: Policy = serde_json::from_slice(payload)
        .or_else(|_| serde_yaml::from_slice(payload))
        .map_err(|e| anyhow::anyhow!("malformed policy payload: {e}"))?;

    let expected_hash = policy.compute_hash();
    if policy.hash != expected_hash && !policy.hash.is_empty() {
        anyhow::bail!(
            "policy hash mismatch: document claims {}, recomputed {}",
            policy.hash,
            expected_hash
        );
    }

    let sanctions = load_sanctions(sanctions_path).unwrap_or_default();
    let ruleset = RuleSet::from_policy(&policy, sanctions);

    info!(policy_version = %policy.version, "applied new policy");
    let _ = tx.send(Arc::new(ruleset));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_files() -> (NamedTempFile, NamedTempFile) {
        let mut policy_file = NamedTempFile::new().unwrap();
        writeln!(
            policy_file,
            r#"
policy_version: "v1"
params:
  daily_volume_limit_usd: 50000
rules:
  - id: R1_OFAC
    type: ofac_addr
    action: REJECT_FATAL
"#
        )
        .unwrap();

        let mut sanctions_file = NamedTempFile::new().unwrap();
        writeln!(sanctions_file, "0xdead").unwrap();

        (policy_file, sanctions_file)
    }

    #[test]
    fn test_bootstrap_loads_initial_policy() {
        let (policy_file, sanctions_file) = create_test_files();
        let loader = PolicyLoader::new(
            policy_file.path().to_string_lossy(),
            sanctions_file.path().to_string_lossy(),
        );

        let plane = PolicyPlane::new(loader);
        let (policy, _tx, rx) = plane.bootstrap();

        assert_eq!(policy.version, "v1");
        assert_eq!(rx.borrow().rules.len(), 1);
    }

    #[test]
    fn test_apply_policy_payload_rejects_bad_hash() {
        let (_policy_file, sanctions_file) = create_test_files();
        let (tx, rx) = watch::channel(Arc::new(RuleSet::empty()));

        let mut bad_policy = Policy::empty();
        bad_policy.version = "v2".to_string();
        bad_policy.hash = "not-the-real-hash".to_string();
        let payload = serde_json::to_vec(&bad_policy).unwrap();

        let result = apply_policy_payload(&payload, &sanctions_file.path().to_string_lossy(), &tx);
        assert!(result.is_err());
        assert_eq!(rx.borrow().policy_version, "0.0.0");
    }

    #[test]
    fn test_apply_policy_payload_accepts_correct_hash() {
        let (_policy_file, sanctions_file) = create_test_files();
        let (tx, rx) = watch::channel(Arc::new(RuleSet::empty()));

        let mut policy = Policy::empty();
        policy.version = "v2".to_string();
        policy.hash = policy.compute_hash();
        let payload = serde_json::to_vec(&policy).unwrap();

        apply_policy_payload(&payload, &sanctions_file.path().to_string_lossy(), &tx).unwrap();
        assert_eq!(rx.borrow().policy_version, "v2");
    }
}
