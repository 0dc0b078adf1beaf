//! Shared encoding utilities.

use crate::CertStatusError;
use base64::Engine;

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Encode bytes as base64 with PEM-style 64-character line wrapping.
pub fn base64_wrap(data: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    encoded
        .as_bytes()
        .chunks(64)
        .filter_map(|c| std::str::from_utf8(c).ok())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether the input looks like PEM armor (ignoring leading whitespace).
pub fn is_pem(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input
        .get(start..)
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}

/// Strip leading zero octets from a DER integer, keeping at least one byte.
pub fn strip_leading_zeros(raw: &[u8]) -> &[u8] {
    match raw.iter().position(|&b| b != 0) {
        Some(pos) => raw.get(pos..).unwrap_or(raw),
        None => raw.get(raw.len().saturating_sub(1)..).unwrap_or(raw),
    }
}

/// Normalize a serial number for lookups: no separators, lowercase.
pub fn normalize_serial(serial: &str) -> String {
    serial
        .chars()
        .filter(|c| *c != ':' && !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Map a DN attribute OID to its OpenSSL short name.
pub fn oid_short_name(oid_str: &str) -> String {
    use crate::oid;
    match oid_str {
        oid::COMMON_NAME => "CN".into(),
        oid::SURNAME => "SN".into(),
        oid::SERIAL_NUMBER => "serialNumber".into(),
        oid::COUNTRY => "C".into(),
        oid::LOCALITY => "L".into(),
        oid::STATE_OR_PROVINCE => "ST".into(),
        oid::STREET_ADDRESS => "street".into(),
        oid::ORGANIZATION => "O".into(),
        oid::ORGANIZATIONAL_UNIT => "OU".into(),
        oid::TITLE => "title".into(),
        oid::POSTAL_CODE => "postalCode".into(),
        oid::GIVEN_NAME => "GN".into(),
        oid::EMAIL_ADDRESS => "emailAddress".into(),
        oid::DOMAIN_COMPONENT => "DC".into(),
        other => other.to_string(),
    }
}

/// Render a duration in milliseconds as `D days H hours M minutes S seconds`.
///
/// Negative inputs are rendered by magnitude.
pub fn format_elapsed(millis: i64) -> String {
    let total_secs = millis.unsigned_abs() / 1000;
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    format!(
        "{} days {} hours {} minutes {} seconds",
        days, hours, minutes, seconds
    )
}

/// Maximum content length for DER TLV encoding with a 3-byte length field.
const MAX_DER_CONTENT_LEN: usize = 0xFF_FFFF; // 16 MiB

/// Wrap content bytes in a DER tag-length-value envelope.
///
/// Supports content lengths up to [`MAX_DER_CONTENT_LEN`] (16 MiB).
pub fn der_wrap(tag: u8, content: &[u8]) -> Result<Vec<u8>, CertStatusError> {
    let len = content.len();
    if len > MAX_DER_CONTENT_LEN {
        return Err(CertStatusError::DerError(format!(
            "DER content length {} exceeds maximum supported ({})",
            len, MAX_DER_CONTENT_LEN
        )));
    }
    let mut buf = Vec::with_capacity(1 + 4 + len);
    buf.push(tag);
    if len < 0x80 {
        buf.push(len as u8);
    } else if len < 0x100 {
        buf.push(0x81);
        buf.push(len as u8);
    } else if len < 0x1_0000 {
        buf.push(0x82);
        buf.push((len >> 8) as u8);
        buf.push(len as u8);
    } else {
        buf.push(0x83);
        buf.push((len >> 16) as u8);
        buf.push((len >> 8) as u8);
        buf.push(len as u8);
    }
    buf.extend_from_slice(content);
    Ok(buf)
}
