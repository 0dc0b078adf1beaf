//! Signature checks between decoded certificates.

use crate::fields::ParsedCertificate;
use x509_parser::prelude::*;

/// Why a signature did not verify.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SignatureError(String);

fn reparse(cert: &ParsedCertificate) -> Result<X509Certificate<'_>, SignatureError> {
    X509Certificate::from_der(&cert.raw_der)
        .map(|(_, x509)| x509)
        .map_err(|e| SignatureError(format!("cannot re-read certificate: {}", e)))
}

/// Verify `subject`'s signature with `issuer`'s public key.
pub fn verify_signed_by(
    subject: &ParsedCertificate,
    issuer: &ParsedCertificate,
) -> Result<(), SignatureError> {
    let subject_x509 = reparse(subject)?;
    let issuer_x509 = reparse(issuer)?;
    subject_x509
        .verify_signature(Some(issuer_x509.public_key()))
        .map_err(|e| SignatureError(format!("not signed by {}: {}", issuer.subject, e)))
}

/// Verify a certificate's signature with its own public key.
pub fn verify_self_signed(cert: &ParsedCertificate) -> Result<(), SignatureError> {
    reparse(cert)?
        .verify_signature(None)
        .map_err(|e| SignatureError(format!("{}", e)))
}
