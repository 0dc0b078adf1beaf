//! CRL decoding and lookup.

use super::CrlRevocation;
use crate::fields::{DateTime, ParsedCertificate};
use crate::parser::build_dn;
use crate::util;
use crate::CertStatusError;
use x509_parser::prelude::*;
use x509_parser::revocation_list::CertificateRevocationList;

/// Normalize a downloaded CRL body (DER, or PEM `X509 CRL`) to DER.
pub fn crl_der_from_bytes(body: &[u8]) -> Result<Vec<u8>, CertStatusError> {
    if !util::is_pem(body) {
        return Ok(body.to_vec());
    }
    for pem_result in Pem::iter_from_buffer(body) {
        match pem_result {
            Ok(pem) if pem.label == "X509 CRL" => return Ok(pem.contents),
            Ok(_) => continue,
            Err(e) => {
                return Err(CertStatusError::PemError(format!(
                    "failed to parse CRL PEM: {}",
                    e
                )))
            }
        }
    }
    Err(CertStatusError::PemError("no CRL found in PEM input".into()))
}

/// RFC 5280 Section 5.3.1 reason name for a numeric reason code.
pub(crate) fn reason_name(code: u8) -> &'static str {
    match code {
        0 => "unspecified",
        1 => "keyCompromise",
        2 => "cACompromise",
        3 => "affiliationChanged",
        4 => "superseded",
        5 => "cessationOfOperation",
        6 => "certificateHold",
        // 7 is unused
        8 => "removeFromCRL",
        9 => "privilegeWithdrawn",
        10 => "aACompromise",
        _ => "unspecified",
    }
}

fn parse(crl_der: &[u8]) -> Result<CertificateRevocationList<'_>, CertStatusError> {
    CertificateRevocationList::from_der(crl_der)
        .map(|(_, crl)| crl)
        .map_err(|e| CertStatusError::Crl(format!("{}", e)))
}

/// Find `subject` among the revoked entries of a DER CRL.
///
/// The CRL must be issued by the certificate's issuer; a CRL for another
/// issuer says nothing about this certificate and is an error.
pub fn find_revocation(
    crl_der: &[u8],
    subject: &ParsedCertificate,
) -> Result<Option<CrlRevocation>, CertStatusError> {
    let crl = parse(crl_der)?;

    let crl_issuer = build_dn(crl.issuer());
    if crl_issuer != subject.issuer {
        return Err(CertStatusError::Crl(format!(
            "CRL issued by '{}', certificate issued by '{}'",
            crl_issuer, subject.issuer
        )));
    }

    let serial = subject.serial_bytes();
    for revoked in crl.iter_revoked_certificates() {
        if util::strip_leading_zeros(revoked.raw_serial()) == serial.as_slice() {
            let reason = revoked
                .reason_code()
                .map(|rc| reason_name(rc.1 .0))
                .unwrap_or("unspecified");
            return Ok(Some(CrlRevocation {
                reason: reason.to_string(),
                revoked_at: DateTime::from_timestamp(revoked.revocation_date.timestamp()),
            }));
        }
    }

    Ok(None)
}

/// The CRL's nextUpdate as a Unix timestamp, if it carries one.
pub fn next_update(crl_der: &[u8]) -> Result<Option<i64>, CertStatusError> {
    Ok(parse(crl_der)?.next_update().map(|t| t.timestamp()))
}
