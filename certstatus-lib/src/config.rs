//! Engine configuration.

use crate::CertStatusError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use time::OffsetDateTime;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Tunables for validation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A certificate expiring within this many days (inclusive) is `EXPIRING`.
    pub expiring_threshold_days: u32,
    pub ocsp_timeout_secs: u64,
    pub crl_timeout_secs: u64,
    /// How long a downloaded CRL is reused. Zero disables the cache.
    pub crl_cache_ttl_secs: u64,
    /// Upper bound on chain length, leaf included.
    pub max_chain_depth: usize,
    /// Batch worker threads; zero means one per CPU.
    pub worker_threads: usize,
    /// Evaluate validity windows at this Unix time instead of the wall clock.
    pub at_time: Option<i64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expiring_threshold_days: 30,
            ocsp_timeout_secs: 10,
            crl_timeout_secs: 30,
            crl_cache_ttl_secs: 3600,
            max_chain_depth: crate::verify::MAX_CHAIN_DEPTH,
            worker_threads: 0,
            at_time: None,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load a JSON configuration file; absent keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CertStatusError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, CertStatusError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CertStatusError> {
        if self.max_chain_depth == 0 {
            return Err(CertStatusError::Config(
                "max_chain_depth must be at least 1".into(),
            ));
        }
        if self.ocsp_timeout_secs == 0 || self.crl_timeout_secs == 0 {
            return Err(CertStatusError::Config(
                "revocation timeouts must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn ocsp_timeout(&self) -> Duration {
        Duration::from_secs(self.ocsp_timeout_secs)
    }

    pub fn crl_timeout(&self) -> Duration {
        Duration::from_secs(self.crl_timeout_secs)
    }

    pub fn crl_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.crl_cache_ttl_secs)
    }

    pub fn expiring_threshold_millis(&self) -> i64 {
        i64::from(self.expiring_threshold_days) * MILLIS_PER_DAY
    }

    /// The evaluation instant.
    pub fn now(&self) -> OffsetDateTime {
        self.at_time
            .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
            .unwrap_or_else(OffsetDateTime::now_utc)
    }

    /// The evaluation instant in milliseconds since the Unix epoch.
    pub fn now_millis(&self) -> i64 {
        let now = self.now();
        now.unix_timestamp()
            .saturating_mul(1000)
            .saturating_add(i64::from(now.millisecond()))
    }
}

/// Builder for [`EngineConfig`].
#[derive(Default)]
pub struct EngineConfigBuilder {
    expiring_threshold_days: Option<u32>,
    ocsp_timeout: Option<Duration>,
    crl_timeout: Option<Duration>,
    crl_cache_ttl: Option<Duration>,
    max_chain_depth: Option<usize>,
    worker_threads: Option<usize>,
    at_time: Option<i64>,
}

impl EngineConfigBuilder {
    pub fn expiring_threshold_days(mut self, days: u32) -> Self {
        self.expiring_threshold_days = Some(days);
        self
    }

    pub fn ocsp_timeout(mut self, timeout: Duration) -> Self {
        self.ocsp_timeout = Some(timeout);
        self
    }

    pub fn crl_timeout(mut self, timeout: Duration) -> Self {
        self.crl_timeout = Some(timeout);
        self
    }

    pub fn crl_cache_ttl(mut self, ttl: Duration) -> Self {
        self.crl_cache_ttl = Some(ttl);
        self
    }

    pub fn max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = Some(depth);
        self
    }

    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Evaluate at a fixed Unix time (OpenSSL's `-attime`).
    pub fn at_time(mut self, ts: i64) -> Self {
        self.at_time = Some(ts);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> EngineConfig {
        let default = EngineConfig::default();
        EngineConfig {
            expiring_threshold_days: self
                .expiring_threshold_days
                .unwrap_or(default.expiring_threshold_days),
            ocsp_timeout_secs: self
                .ocsp_timeout
                .map(|d| d.as_secs().max(1))
                .unwrap_or(default.ocsp_timeout_secs),
            crl_timeout_secs: self
                .crl_timeout
                .map(|d| d.as_secs().max(1))
                .unwrap_or(default.crl_timeout_secs),
            crl_cache_ttl_secs: self
                .crl_cache_ttl
                .map(|d| d.as_secs())
                .unwrap_or(default.crl_cache_ttl_secs),
            max_chain_depth: self.max_chain_depth.unwrap_or(default.max_chain_depth),
            worker_threads: self.worker_threads.unwrap_or(default.worker_threads),
            at_time: self.at_time.or(default.at_time),
        }
    }
}
