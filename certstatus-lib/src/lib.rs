//! certstatus-lib: trust-status engine for X.509 certificates.
//!
//! Given a certificate already present in an inventory, the engine rebuilds
//! its issuance chain from issuer-serial references, verifies each link's
//! signature, classifies the validity window, consults OCSP responders and
//! CRL distribution points, and derives one [`CertificateStatus`] together
//! with an ordered [`ValidationReport`]. Revocation is propagated to the
//! certificates a revoked issuer signed.

mod config;
mod convert;
mod display;
mod engine;
mod fields;
mod fingerprint;
pub mod inventory;
mod model;
mod oid;
mod parser;
mod pool;
mod propagate;
mod repository;
pub mod revocation;
mod util;
pub mod verify;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use convert::{der_to_pem, pem_to_der};
pub use display::{display_chain, display_report, display_summary, to_json};
pub use engine::{BatchFailure, BatchOutcome, ValidationEngine, ValidationSummary};
pub use fields::{DateTime, DigestAlgorithm, DistinguishedName, ParsedCertificate, PublicKeyInfo};
pub use fingerprint::compute_fingerprint;
pub use model::{
    Certificate, CertificateStatus, CheckName, CheckStatus, ValidationCheckResult,
    ValidationReport,
};
pub use parser::{decode_x509, parse_der, parse_pem};
pub use pool::{BatchHandle, ValidationPool};
pub use propagate::RevocationPropagator;
pub use repository::{CertificateRepository, InMemoryRepository};
pub use revocation::{
    CrlRevocation, HttpRevocationSource, OcspVerdict, RevocationError, RevocationSource,
};
pub use util::format_elapsed;
pub use verify::{Chain, PairOutcome, PairwiseValidator};

/// Errors returned by certstatus-lib.
#[derive(Debug, thiserror::Error)]
pub enum CertStatusError {
    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("Invalid CRL: {0}")]
    Crl(String),

    #[error("Invalid OCSP message: {0}")]
    Ocsp(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CertStatusError {
    /// Whether this error means the certificate bytes themselves are unusable.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::ParseError(_) | Self::PemError(_) | Self::DerError(_)
        )
    }
}
