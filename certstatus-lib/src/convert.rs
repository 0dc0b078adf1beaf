//! PEM <-> DER format conversion.

use crate::util;
use crate::CertStatusError;

/// Convert DER-encoded certificate bytes to a PEM string.
pub fn der_to_pem(der: &[u8]) -> String {
    format!(
        "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
        util::base64_wrap(der)
    )
}

/// Convert a PEM-encoded certificate to DER bytes.
pub fn pem_to_der(pem: &[u8]) -> Result<Vec<u8>, CertStatusError> {
    let (_, parsed) = x509_parser::pem::parse_x509_pem(pem)
        .map_err(|e| CertStatusError::PemError(format!("{}", e)))?;
    if !crate::parser::is_certificate_label(&parsed.label) {
        return Err(CertStatusError::PemError(format!(
            "expected CERTIFICATE, got {}",
            parsed.label
        )));
    }
    Ok(parsed.contents)
}
