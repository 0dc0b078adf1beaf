//! HTTP transport for OCSP and CRL queries.

use super::{crl, ocsp, CrlRevocation, OcspVerdict, RevocationError, RevocationSource};
use crate::config::EngineConfig;
use crate::fields::ParsedCertificate;
use crate::CertStatusError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Largest OCSP or CRL response body accepted (16 MiB).
pub const MAX_RESPONSE_BYTES: u64 = 16 * 1024 * 1024;

/// Cached CRL download.
#[derive(Debug)]
struct CrlCacheEntry {
    der: Vec<u8>,
    fetched_at: Instant,
    /// nextUpdate as a Unix timestamp.
    next_update: Option<i64>,
}

impl CrlCacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        if self.fetched_at.elapsed() >= ttl {
            return false;
        }
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        self.next_update.map_or(true, |next| now < next)
    }
}

/// Revocation source backed by blocking HTTP requests.
///
/// CRL downloads are cached per URL and shared across threads.
pub struct HttpRevocationSource {
    client: reqwest::blocking::Client,
    ocsp_timeout: Duration,
    crl_timeout: Duration,
    crl_cache_ttl: Duration,
    max_response_bytes: u64,
    crl_cache: RwLock<HashMap<String, Arc<CrlCacheEntry>>>,
}

impl std::fmt::Debug for HttpRevocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRevocationSource")
            .field("ocsp_timeout", &self.ocsp_timeout)
            .field("crl_timeout", &self.crl_timeout)
            .field("crl_cache_ttl", &self.crl_cache_ttl)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish_non_exhaustive()
    }
}

impl HttpRevocationSource {
    pub fn new(config: &EngineConfig) -> Result<Self, CertStatusError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("certstatus/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CertStatusError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            ocsp_timeout: config.ocsp_timeout(),
            crl_timeout: config.crl_timeout(),
            crl_cache_ttl: config.crl_cache_ttl(),
            max_response_bytes: MAX_RESPONSE_BYTES,
            crl_cache: RwLock::new(HashMap::new()),
        })
    }

    /// Reject response bodies larger than `limit` bytes.
    pub fn with_max_response_bytes(mut self, limit: u64) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Number of CRLs currently cached.
    pub fn cached_crls(&self) -> usize {
        self.crl_cache.read().len()
    }

    fn check_scheme(url: &str) -> Result<(), RevocationError> {
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(())
        } else {
            Err(RevocationError::UnsupportedScheme(url.to_string()))
        }
    }

    fn transport_error(url: &str, err: reqwest::Error) -> RevocationError {
        if err.is_timeout() {
            RevocationError::Timeout {
                url: url.to_string(),
            }
        } else {
            RevocationError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    fn read_body(
        &self,
        url: &str,
        response: reqwest::blocking::Response,
    ) -> Result<Vec<u8>, RevocationError> {
        if !response.status().is_success() {
            return Err(RevocationError::Transport {
                url: url.to_string(),
                reason: format!("HTTP status {}", response.status()),
            });
        }
        let limit = self.max_response_bytes;
        let too_large = || RevocationError::Malformed {
            url: url.to_string(),
            reason: format!("response exceeds {} bytes", limit),
        };
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(too_large());
        }

        let mut body = Vec::new();
        response
            .take(limit.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    RevocationError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    RevocationError::Transport {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;
        if body.len() as u64 > limit {
            return Err(too_large());
        }
        Ok(body)
    }

    fn fetch_crl(&self, url: &str) -> Result<Arc<CrlCacheEntry>, RevocationError> {
        if !self.crl_cache_ttl.is_zero() {
            if let Some(entry) = self.crl_cache.read().get(url) {
                if entry.is_fresh(self.crl_cache_ttl) {
                    debug!("Using cached CRL for {}", url);
                    return Ok(Arc::clone(entry));
                }
                debug!("Cached CRL expired for {}", url);
            }
        }

        debug!("Fetching CRL from {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.crl_timeout)
            .send()
            .map_err(|e| Self::transport_error(url, e))?;
        let body = self.read_body(url, response)?;

        let malformed = |e: CertStatusError| RevocationError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let der = crl::crl_der_from_bytes(&body).map_err(malformed)?;
        let next_update = crl::next_update(&der).map_err(malformed)?;
        let entry = Arc::new(CrlCacheEntry {
            der,
            fetched_at: Instant::now(),
            next_update,
        });

        if !self.crl_cache_ttl.is_zero() {
            self.crl_cache
                .write()
                .insert(url.to_string(), Arc::clone(&entry));
            debug!("Cached CRL for {}", url);
        }
        Ok(entry)
    }
}

impl RevocationSource for HttpRevocationSource {
    fn ocsp_check(
        &self,
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
        url: &str,
    ) -> Result<OcspVerdict, RevocationError> {
        Self::check_scheme(url)?;
        let malformed = |e: CertStatusError| RevocationError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let request = ocsp::build_request(subject, issuer).map_err(malformed)?;
        debug!("Sending OCSP request for {} to {}", subject.serial, url);
        let response = self
            .client
            .post(url)
            .timeout(self.ocsp_timeout)
            .header("Content-Type", "application/ocsp-request")
            .header("Accept", "application/ocsp-response")
            .body(request)
            .send()
            .map_err(|e| Self::transport_error(url, e))?;
        let body = self.read_body(url, response)?;

        let verdict = ocsp::parse_response(&body, &subject.serial_bytes()).map_err(malformed)?;
        if verdict == OcspVerdict::Unknown {
            warn!("OCSP responder {} does not know {}", url, subject.serial);
        }
        Ok(verdict)
    }

    fn crl_check(
        &self,
        subject: &ParsedCertificate,
        url: &str,
    ) -> Result<Option<CrlRevocation>, RevocationError> {
        Self::check_scheme(url)?;
        let entry = self.fetch_crl(url)?;
        crl::find_revocation(&entry.der, subject).map_err(|e| RevocationError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}
