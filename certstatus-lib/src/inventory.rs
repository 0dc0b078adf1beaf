//! Building inventory records from certificate files.
//!
//! Ingestion proper lives outside this crate; these helpers are enough to
//! stand up an inventory from a directory of PEM/DER files.

use crate::fields::ParsedCertificate;
use crate::model::Certificate;
use crate::parser::is_certificate_label;
use crate::util;
use crate::verify::verify_signed_by;
use crate::CertStatusError;
use tracing::debug;
use x509_parser::prelude::Pem;

/// Read every certificate from a PEM bundle, or a single DER certificate.
pub fn load_certificates(input: &[u8]) -> Result<Vec<Certificate>, CertStatusError> {
    if !util::is_pem(input) {
        return Ok(vec![Certificate::from_der(input)?]);
    }

    let mut certs = Vec::new();
    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if is_certificate_label(&pem.label) {
                    certs.push(Certificate::from_der(&pem.contents)?);
                }
            }
            Err(e) => {
                // Trailing garbage after at least one certificate is tolerated.
                if !certs.is_empty() {
                    break;
                }
                return Err(CertStatusError::PemError(format!(
                    "failed to parse PEM: {}",
                    e
                )));
            }
        }
    }

    if certs.is_empty() {
        return Err(CertStatusError::PemError(
            "no certificates found in PEM input".into(),
        ));
    }
    Ok(certs)
}

/// Fill in missing issuer-serial references by matching issuer DN to
/// subject DN within `certs`.
///
/// Self-signed certificates reference themselves. When several candidates
/// share the issuer DN, one whose key verifies the signature is preferred.
/// Existing references are left alone. Returns the number of records linked.
pub fn link_issuers(certs: &mut [Certificate]) -> usize {
    let parsed: Vec<Option<ParsedCertificate>> = certs.iter().map(|c| c.decode().ok()).collect();

    let mut links: Vec<(usize, String)> = Vec::new();
    for (i, cert) in certs.iter().enumerate() {
        if cert.issuer_serial_number.is_some() {
            continue;
        }
        if cert.is_self_signed() {
            links.push((i, cert.serial_number.clone()));
            continue;
        }

        let candidates: Vec<usize> = certs
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != i && other.subject_dn == cert.issuer_dn)
            .map(|(j, _)| j)
            .collect();
        let verified = candidates.iter().copied().find(|&j| {
            match (parsed.get(i).and_then(Option::as_ref), parsed.get(j).and_then(Option::as_ref)) {
                (Some(subject), Some(issuer)) => verify_signed_by(subject, issuer).is_ok(),
                _ => false,
            }
        });

        if let Some(j) = verified.or_else(|| candidates.first().copied()) {
            if let Some(issuer) = certs.get(j) {
                links.push((i, issuer.serial_number.clone()));
            }
        } else {
            debug!(
                "No issuer for {} ({}) in the loaded set",
                cert.serial_number, cert.issuer_dn
            );
        }
    }

    let linked = links.len();
    for (i, serial) in links {
        if let Some(cert) = certs.get_mut(i) {
            cert.issuer_serial_number = Some(serial);
        }
    }
    linked
}
