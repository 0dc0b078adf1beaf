//! OCSP (RFC 6960) request encoding and response decoding.
//!
//! Requests are unsigned, carry a single SHA-1 CertID and no nonce, which is
//! the form most responders and caching proxies accept. Response signatures
//! are not verified; the verdict for the matching CertID is taken as is.

use super::crl::reason_name;
use super::OcspVerdict;
use crate::fields::{DateTime, ParsedCertificate};
use crate::fingerprint::sha1_bytes;
use crate::oid;
use crate::util::{der_wrap, strip_leading_zeros};
use crate::CertStatusError;
use std::borrow::Cow;
use x509_parser::der_parser::asn1_rs::{Any, Class, FromDer, Oid, Tag};
use x509_parser::prelude::X509Certificate;

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_SEQUENCE: u8 = 0x30;

/// Encode an `OCSPRequest` asking about `subject`, issued by `issuer`.
pub fn build_request(
    subject: &ParsedCertificate,
    issuer: &ParsedCertificate,
) -> Result<Vec<u8>, CertStatusError> {
    let (_, subject_x509) = X509Certificate::from_der(&subject.raw_der)
        .map_err(|e| CertStatusError::DerError(format!("{}", e)))?;
    let (_, issuer_x509) = X509Certificate::from_der(&issuer.raw_der)
        .map_err(|e| CertStatusError::DerError(format!("{}", e)))?;

    let name_hash = sha1_bytes(issuer_x509.subject().as_raw());
    let key_hash = sha1_bytes(&issuer_x509.public_key().subject_public_key.data);

    let mut cert_id = Vec::with_capacity(64);
    cert_id.extend_from_slice(oid::SHA1_ALGORITHM_DER);
    cert_id.extend_from_slice(&der_wrap(TAG_OCTET_STRING, &name_hash)?);
    cert_id.extend_from_slice(&der_wrap(TAG_OCTET_STRING, &key_hash)?);
    cert_id.extend_from_slice(&der_wrap(TAG_INTEGER, subject_x509.raw_serial())?);

    // OCSPRequest { TBSRequest { requestList { Request { CertID } } } }
    let request = der_wrap(TAG_SEQUENCE, &der_wrap(TAG_SEQUENCE, &cert_id)?)?;
    let request_list = der_wrap(TAG_SEQUENCE, &request)?;
    let tbs_request = der_wrap(TAG_SEQUENCE, &request_list)?;
    der_wrap(TAG_SEQUENCE, &tbs_request)
}

fn malformed(what: impl std::fmt::Display) -> CertStatusError {
    CertStatusError::Ocsp(what.to_string())
}

fn read_one(data: &[u8]) -> Result<Any<'_>, CertStatusError> {
    Any::from_der(data)
        .map(|(_, any)| any)
        .map_err(|e| malformed(format!("bad DER: {}", e)))
}

/// Decode every TLV in a constructed value's contents.
fn read_all(data: &[u8]) -> Result<Vec<Any<'_>>, CertStatusError> {
    let mut items = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let (next, any) =
            Any::from_der(rest).map_err(|e| malformed(format!("bad DER: {}", e)))?;
        items.push(any);
        rest = next;
    }
    Ok(items)
}

fn expect_universal<'a>(any: &Any<'a>, tag: Tag, what: &str) -> Result<&'a [u8], CertStatusError> {
    if any.header.class() != Class::Universal || any.header.tag() != tag {
        return Err(malformed(format!("expected {}", what)));
    }
    Ok(any.data)
}

fn is_context(any: &Any, number: u32) -> bool {
    any.header.class() == Class::ContextSpecific && any.header.tag().0 == number
}

fn response_status_name(code: u8) -> &'static str {
    match code {
        1 => "malformedRequest",
        2 => "internalError",
        3 => "tryLater",
        5 => "sigRequired",
        6 => "unauthorized",
        _ => "unknown",
    }
}

/// Decode an `OCSPResponse` and report the status of the certificate whose
/// serial is `serial` (leading zeros ignored).
///
/// A response without an entry for the serial yields `Unknown`.
pub fn parse_response(der: &[u8], serial: &[u8]) -> Result<OcspVerdict, CertStatusError> {
    let outer = read_one(der)?;
    let fields = read_all(expect_universal(&outer, Tag::Sequence, "OCSPResponse")?)?;

    let status = fields
        .first()
        .ok_or_else(|| malformed("missing responseStatus"))
        .and_then(|f| expect_universal(f, Tag::Enumerated, "responseStatus"))?;
    let code = status.last().copied().unwrap_or(0xFF);
    if code != 0 {
        return Err(malformed(format!(
            "responder returned {}",
            response_status_name(code)
        )));
    }

    let response_bytes = fields
        .iter()
        .find(|f| is_context(f, 0))
        .ok_or_else(|| malformed("successful response without responseBytes"))?;
    let rb_seq = read_one(response_bytes.data)?;
    let rb = read_all(expect_universal(&rb_seq, Tag::Sequence, "ResponseBytes")?)?;
    let (Some(rtype), Some(body)) = (rb.first(), rb.get(1)) else {
        return Err(malformed("incomplete ResponseBytes"));
    };
    let rtype = Oid::new(Cow::Borrowed(expect_universal(rtype, Tag::Oid, "responseType")?));
    if rtype.to_id_string() != oid::OCSP_BASIC {
        return Err(malformed(format!("unsupported response type {}", rtype)));
    }
    let basic_der = expect_universal(body, Tag::OctetString, "response")?;

    let basic = read_one(basic_der)?;
    let basic_fields = read_all(expect_universal(&basic, Tag::Sequence, "BasicOCSPResponse")?)?;
    let tbs = basic_fields
        .first()
        .ok_or_else(|| malformed("missing tbsResponseData"))?;
    let tbs_fields = read_all(expect_universal(tbs, Tag::Sequence, "ResponseData")?)?;

    // version [0] and responderID [1]/[2] are context-tagged; the only
    // universal SEQUENCE in ResponseData is `responses`.
    let responses = tbs_fields
        .iter()
        .find(|f| f.header.class() == Class::Universal && f.header.tag() == Tag::Sequence)
        .ok_or_else(|| malformed("missing responses"))?;

    let wanted = strip_leading_zeros(serial);
    for single in read_all(responses.data)? {
        let single_fields = read_all(expect_universal(&single, Tag::Sequence, "SingleResponse")?)?;
        let (Some(cert_id), Some(cert_status)) = (single_fields.first(), single_fields.get(1))
        else {
            return Err(malformed("incomplete SingleResponse"));
        };
        let id_fields = read_all(expect_universal(cert_id, Tag::Sequence, "CertID")?)?;
        let entry_serial = id_fields
            .get(3)
            .ok_or_else(|| malformed("CertID without serialNumber"))
            .and_then(|s| expect_universal(s, Tag::Integer, "serialNumber"))?;
        if strip_leading_zeros(entry_serial) != wanted {
            continue;
        }
        return decode_cert_status(cert_status);
    }

    Ok(OcspVerdict::Unknown)
}

fn decode_cert_status(status: &Any) -> Result<OcspVerdict, CertStatusError> {
    if is_context(status, 0) {
        return Ok(OcspVerdict::Good);
    }
    if is_context(status, 2) {
        return Ok(OcspVerdict::Unknown);
    }
    if !is_context(status, 1) {
        return Err(malformed("unrecognized certStatus"));
    }

    // RevokedInfo { revocationTime, revocationReason [0] EXPLICIT OPTIONAL }
    let info = read_all(status.data)?;
    let revoked_at = info
        .first()
        .filter(|t| t.header.tag() == Tag::GeneralizedTime)
        .and_then(|t| parse_generalized_time(t.data))
        .map(DateTime::from_timestamp);
    let reason = match info.iter().find(|f| is_context(f, 0)) {
        Some(wrapper) => {
            let inner = read_one(wrapper.data)?;
            let code = expect_universal(&inner, Tag::Enumerated, "CRLReason")?;
            code.last().map(|c| reason_name(*c).to_string())
        }
        None => None,
    };
    Ok(OcspVerdict::Revoked { revoked_at, reason })
}

/// Parse `YYYYMMDDHHMMSS[.fff]Z` into a Unix timestamp.
fn parse_generalized_time(bytes: &[u8]) -> Option<i64> {
    let text = std::str::from_utf8(bytes).ok()?;
    let digits = text.get(..14)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) || !text.ends_with('Z') {
        return None;
    }
    let num = |range: std::ops::Range<usize>| digits.get(range)?.parse::<u32>().ok();
    let month = time::Month::try_from(u8::try_from(num(4..6)?).ok()?).ok()?;
    let year = i32::try_from(num(0..4)?).ok()?;
    let day = u8::try_from(num(6..8)?).ok()?;
    let date = time::Date::from_calendar_date(year, month, day).ok()?;
    let clock = time::Time::from_hms(
        u8::try_from(num(8..10)?).ok()?,
        u8::try_from(num(10..12)?).ok()?,
        u8::try_from(num(12..14)?).ok()?,
    )
    .ok()?;
    Some(date.with_time(clock).assume_utc().unix_timestamp())
}
