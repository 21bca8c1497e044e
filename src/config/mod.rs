use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Source(#[from] config::ConfigError),
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_read_timeout_ms() -> u64 {
    2_000
}

fn default_write_timeout_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub listen_addr: String,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            listen_addr: default_listen_addr(),
            read_timeout_ms: default_read_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

fn default_nats_urls() -> Vec<String> {
    vec!["nats://127.0.0.1:4222".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub urls: Vec<String>,
    pub ensure_streams: bool,
}

impl Default for NatsConfig {
    fn default() -> Self {
        NatsConfig {
            urls: default_nats_urls(),
            ensure_streams: true,
        }
    }
}

fn default_policy_file() -> PathBuf {
    PathBuf::from("policy.yaml")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub file: PathBuf,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            file: default_policy_file(),
        }
    }
}

fn default_sanctions_file() -> PathBuf {
    PathBuf::from("sanctions.txt")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SanctionsConfig {
    pub file: PathBuf,
}

impl Default for SanctionsConfig {
    fn default() -> Self {
        SanctionsConfig {
            file: default_sanctions_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_latency_budget_ms() -> u64 {
    100
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

/// Risk engine configuration, loaded from an optional YAML/TOML/JSON file
/// layered under a handful of environment overrides.
///
/// Every field has a default, so a missing or partial config file still
/// produces a usable configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub http: HttpConfig,
    pub nats: NatsConfig,
    pub policy: PolicyConfig,
    pub sanctions: SanctionsConfig,

    /// Asset-to-USD conversion rates for assets not already USD-denominated.
    pub assets: HashMap<String, f64>,

    pub latency_budget_ms: u64,
    pub shutdown_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            http: HttpConfig::default(),
            nats: NatsConfig::default(),
            policy: PolicyConfig::default(),
            sanctions: SanctionsConfig::default(),
            assets: HashMap::new(),
            latency_budget_ms: default_latency_budget_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from `path` if given, else `RISKR_CONFIG`, else a
    /// `riskr.yaml` in the working directory (silently skipped if absent).
    /// `LOG_LEVEL` and `NATS_URLS` (comma-separated) override the file when set.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(p) => builder.add_source(config::File::from(p)),
            None => match std::env::var("RISKR_CONFIG") {
                Ok(p) => builder.add_source(config::File::with_name(&p)),
                Err(_) => builder.add_source(config::File::with_name("riskr").required(false)),
            },
        };

        let built = builder.build()?;
        let mut cfg: Config = built.try_deserialize()?;

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }
        if let Ok(urls) = std::env::var("NATS_URLS") {
            cfg.nats.urls = urls.split(',').map(|s| s.trim().to_string()).collect();
        }

        Ok(cfg)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.http.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.latency_budget_ms, 100);
        assert_eq!(config.nats.urls, vec!["nats://127.0.0.1:4222".to_string()]);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        std::env::remove_var("RISKR_CONFIG");
        std::env::remove_var("LOG_LEVEL");
        std::env::remove_var("NATS_URLS");

        let config = Config::load(Some(Path::new("/nonexistent/does-not-exist.yaml")));
        // A path given explicitly that doesn't exist is a hard error, unlike
        // the unset/default lookup which is `required(false)`.
        assert!(config.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riskr.yaml");
        std::fs::write(
            &path,
            r#"
log_level: "debug"
http:
  listen_addr: "127.0.0.1:9090"
latency_budget_ms: 250
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.http.listen_addr, "127.0.0.1:9090");
        assert_eq!(config.latency_budget_ms, 250);
        // Untouched nested struct still gets its defaults.
        assert_eq!(config.http.read_timeout_ms, 2_000);
    }

    #[test]
    fn test_env_overrides_log_level_and_nats_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riskr.yaml");
        std::fs::write(&path, "log_level: \"info\"\n").unwrap();

        std::env::set_var("LOG_LEVEL", "trace");
        std::env::set_var("NATS_URLS", "nats://a:4222,nats://b:4222");

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.log_level, "trace");
        assert_eq!(
            config.nats.urls,
            vec!["nats://a:4222".to_string(), "nats://b:4222".to_string()]
        );

        std::env::remove_var("LOG_LEVEL");
        std::env::remove_var("NATS_URLS");
    }
}
