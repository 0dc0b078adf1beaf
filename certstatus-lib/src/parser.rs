//! Certificate decoding from PEM, bare base64, and DER.

use crate::fields::{DateTime, DistinguishedName, ParsedCertificate, PublicKeyInfo};
use crate::oid;
use crate::util;
use crate::CertStatusError;
use base64::Engine;
use x509_parser::prelude::*;

/// Decode the certificate content stored in an inventory record.
///
/// Accepts armored PEM, or the bare base64 body with the armor and line
/// breaks stripped (the form some ingestion paths store).
pub fn decode_x509(content: &str) -> Result<ParsedCertificate, CertStatusError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CertStatusError::ParseError("empty input".into()));
    }
    if util::is_pem(trimmed.as_bytes()) {
        return parse_pem(trimmed.as_bytes());
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    let der = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| {
            CertStatusError::PemError(format!("content is neither PEM nor base64 DER: {}", e))
        })?;
    parse_der(&der)
}

pub(crate) fn is_certificate_label(label: &str) -> bool {
    label == "CERTIFICATE" || label == "TRUSTED CERTIFICATE" || label == "X509 CERTIFICATE"
}

/// Parse a certificate from PEM format.
pub fn parse_pem(input: &[u8]) -> Result<ParsedCertificate, CertStatusError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(input)
        .map_err(|e| CertStatusError::PemError(format!("{}", e)))?;

    if !is_certificate_label(&pem.label) {
        return Err(CertStatusError::PemError(format!(
            "expected CERTIFICATE, got {}",
            pem.label
        )));
    }

    parse_der(&pem.contents)
}

/// Parse a certificate from DER format.
pub fn parse_der(input: &[u8]) -> Result<ParsedCertificate, CertStatusError> {
    let (remaining, x509) = X509Certificate::from_der(input)
        .map_err(|e| CertStatusError::DerError(format!("{}", e)))?;

    // Keep only the certificate bytes, not any trailing data.
    let cert_len = input.len() - remaining.len();
    let cert_der = input.get(..cert_len).unwrap_or(input);
    build_parsed_certificate(&x509, cert_der)
}

fn build_parsed_certificate(
    x509: &X509Certificate,
    raw_der: &[u8],
) -> Result<ParsedCertificate, CertStatusError> {
    let tbs = &x509.tbs_certificate;

    let raw_version = tbs.version.0;
    if raw_version > 2 {
        return Err(CertStatusError::ParseError(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            raw_version + 1
        )));
    }

    let mut ocsp_urls = Vec::new();
    let mut ca_issuer_urls = Vec::new();
    let mut crl_urls = Vec::new();
    for ext in tbs.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::AuthorityInfoAccess(aia) => {
                for desc in &aia.accessdescs {
                    let GeneralName::URI(uri) = &desc.access_location else {
                        continue;
                    };
                    match desc.access_method.to_id_string().as_str() {
                        oid::ACCESS_OCSP => ocsp_urls.push(uri.to_string()),
                        oid::ACCESS_CA_ISSUERS => ca_issuer_urls.push(uri.to_string()),
                        _ => {}
                    }
                }
            }
            ParsedExtension::CRLDistributionPoints(cdp) => {
                for point in &cdp.points {
                    if let Some(x509_parser::extensions::DistributionPointName::FullName(names)) =
                        &point.distribution_point
                    {
                        for gn in names {
                            if let GeneralName::URI(uri) = gn {
                                crl_urls.push(uri.to_string());
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(ParsedCertificate {
        version: raw_version + 1,
        serial: format_serial(tbs.raw_serial()),
        signature_algorithm: format_sig_algorithm(&x509.signature_algorithm),
        issuer: build_dn(&tbs.issuer),
        subject: build_dn(&tbs.subject),
        not_before: DateTime::from_timestamp(tbs.validity.not_before.timestamp()),
        not_after: DateTime::from_timestamp(tbs.validity.not_after.timestamp()),
        public_key: build_public_key_info(&tbs.subject_pki),
        ocsp_urls,
        ca_issuer_urls,
        crl_urls,
        raw_der: raw_der.to_vec(),
    })
}

/// Format a serial number as a colon-separated uppercase hex string,
/// stripping leading zero bytes but keeping at least one byte.
pub(crate) fn format_serial(raw: &[u8]) -> String {
    util::hex_colon_upper(util::strip_leading_zeros(raw))
}

fn format_sig_algorithm(algo: &AlgorithmIdentifier) -> String {
    match algo.algorithm.to_id_string().as_str() {
        oid::SHA1_WITH_RSA => "sha1WithRSAEncryption".into(),
        oid::SHA256_WITH_RSA => "sha256WithRSAEncryption".into(),
        oid::SHA384_WITH_RSA => "sha384WithRSAEncryption".into(),
        oid::SHA512_WITH_RSA => "sha512WithRSAEncryption".into(),
        oid::ECDSA_WITH_SHA256 => "ecdsa-with-SHA256".into(),
        oid::ECDSA_WITH_SHA384 => "ecdsa-with-SHA384".into(),
        oid::ECDSA_WITH_SHA512 => "ecdsa-with-SHA512".into(),
        oid::ED25519 => "Ed25519".into(),
        other => other.to_string(),
    }
}

pub(crate) fn build_dn(name: &X509Name) -> DistinguishedName {
    let mut components = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let key = util::oid_short_name(&attr.attr_type().to_id_string());
            let value = attr.as_str().unwrap_or("<binary>").to_string();
            components.push((key, value));
        }
    }
    DistinguishedName { components }
}

fn build_public_key_info(spki: &SubjectPublicKeyInfo) -> PublicKeyInfo {
    let oid_str = spki.algorithm.algorithm.to_id_string();

    let (algorithm, key_size, curve) = match oid_str.as_str() {
        oid::RSA_ENCRYPTION => (
            "RSA".into(),
            rsa_modulus_bits(&spki.subject_public_key.data),
            None,
        ),
        oid::EC_PUBLIC_KEY => {
            let curve_name = extract_ec_curve(&spki.algorithm);
            let key_size = match curve_name.as_str() {
                "P-256" => Some(256),
                "P-384" => Some(384),
                "P-521" => Some(521),
                _ => None,
            };
            ("EC".into(), key_size, Some(curve_name))
        }
        oid::ED25519 => ("Ed25519".into(), Some(256), None),
        oid::ED448 => ("Ed448".into(), Some(448), None),
        _ => (oid_str, None, None),
    };

    PublicKeyInfo {
        algorithm,
        key_size,
        curve,
    }
}

/// RSA modulus size in bits, or `None` if the key DER does not parse.
fn rsa_modulus_bits(data: &[u8]) -> Option<u32> {
    let (_, parsed) = x509_parser::der_parser::parse_der(data).ok()?;
    let seq = parsed.as_sequence().ok()?;
    let bigint = seq.first().and_then(|m| m.as_bigint().ok())?;
    let bytes = bigint.to_bytes_be().1;
    let significant = match bytes.split_first() {
        Some((&0, rest)) if !rest.is_empty() => rest,
        _ => &bytes,
    };
    Some((significant.len() as u32) * 8)
}

fn extract_ec_curve(algo: &AlgorithmIdentifier) -> String {
    if let Some(params) = &algo.parameters {
        if let Ok(oid) = params.as_oid() {
            return match oid.to_id_string().as_str() {
                oid::CURVE_P256 => "P-256".into(),
                oid::CURVE_P384 => "P-384".into(),
                oid::CURVE_P521 => "P-521".into(),
                other => other.to_string(),
            };
        }
    }
    "unknown".into()
}
