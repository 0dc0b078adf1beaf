//! Revocation sources: OCSP responders and CRL distribution points.
//!
//! The engine talks to revocation data through [`RevocationSource`]. The
//! production implementation, [`HttpRevocationSource`], fetches over HTTP;
//! tests substitute scripted sources.

pub mod crl;
mod http;
pub mod ocsp;

pub use http::HttpRevocationSource;

use crate::fields::{DateTime, ParsedCertificate};
use std::sync::Arc;

/// Answer of an OCSP responder for one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcspVerdict {
    Good,
    Revoked {
        revoked_at: Option<DateTime>,
        reason: Option<String>,
    },
    /// The responder does not know the certificate.
    Unknown,
}

/// A CRL entry matching the certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlRevocation {
    /// RFC 5280 reason name, `unspecified` when the entry carries none.
    pub reason: String,
    pub revoked_at: DateTime,
}

/// Recoverable failure of a single revocation query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevocationError {
    #[error("timed out contacting {url}")]
    Timeout { url: String },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

impl RevocationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Where revocation answers come from.
pub trait RevocationSource: Send + Sync {
    /// Ask the responder at `url` about `subject`, identified through `issuer`.
    fn ocsp_check(
        &self,
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
        url: &str,
    ) -> Result<OcspVerdict, RevocationError>;

    /// Look `subject` up in the CRL published at `url`.
    fn crl_check(
        &self,
        subject: &ParsedCertificate,
        url: &str,
    ) -> Result<Option<CrlRevocation>, RevocationError>;
}

impl<T: RevocationSource + ?Sized> RevocationSource for Arc<T> {
    fn ocsp_check(
        &self,
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
        url: &str,
    ) -> Result<OcspVerdict, RevocationError> {
        (**self).ocsp_check(subject, issuer, url)
    }

    fn crl_check(
        &self,
        subject: &ParsedCertificate,
        url: &str,
    ) -> Result<Option<CrlRevocation>, RevocationError> {
        (**self).crl_check(subject, url)
    }
}
