//! Shared helpers for integration tests: rcgen-issued inventories and a
//! scripted revocation source.
#![allow(dead_code)]

use certstatus_lib::revocation::{CrlRevocation, OcspVerdict, RevocationError, RevocationSource};
use certstatus_lib::{Certificate, EngineConfig, InMemoryRepository, ParsedCertificate};
use rcgen::{
    BasicConstraints, CertificateParams, CertificateRevocationListParams, CrlDistributionPoint,
    CustomExtension, DnType, IsCa, KeyIdMethod, KeyPair, KeyUsagePurpose, RevocationReason,
    RevokedCertParams, SerialNumber,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::{Duration, OffsetDateTime};

/// Compact lowercase serial of the `n`-th test certificate.
pub fn serial_hex(n: u32) -> String {
    format!("5e{:06x}", n)
}

fn serial_bytes(n: u32) -> Vec<u8> {
    let b = n.to_be_bytes();
    vec![0x5e, b[1], b[2], b[3]]
}

/// What to put into a generated certificate.
#[derive(Clone)]
pub struct Profile {
    pub cn: String,
    pub serial: u32,
    pub not_before_days: i64,
    pub not_after_days: i64,
    pub ca: bool,
    pub ocsp_urls: Vec<String>,
    pub crl_urls: Vec<String>,
}

impl Profile {
    /// Valid since yesterday, for 400 more days, no revocation pointers.
    pub fn new(cn: &str, serial: u32) -> Self {
        Self {
            cn: cn.to_string(),
            serial,
            not_before_days: -1,
            not_after_days: 400,
            ca: false,
            ocsp_urls: Vec::new(),
            crl_urls: Vec::new(),
        }
    }

    pub fn ca(mut self) -> Self {
        self.ca = true;
        self
    }

    pub fn window(mut self, not_before_days: i64, not_after_days: i64) -> Self {
        self.not_before_days = not_before_days;
        self.not_after_days = not_after_days;
        self
    }

    pub fn ocsp(mut self, url: &str) -> Self {
        self.ocsp_urls.push(url.to_string());
        self
    }

    pub fn crl(mut self, url: &str) -> Self {
        self.crl_urls.push(url.to_string());
        self
    }

    fn params(&self) -> CertificateParams {
        let mut params = CertificateParams::default();
        let mut dn = rcgen::DistinguishedName::new();
        dn.push(DnType::OrganizationName, "Fixture Trust");
        dn.push(DnType::CommonName, self.cn.as_str());
        params.distinguished_name = dn;
        params.serial_number = Some(SerialNumber::from_slice(&serial_bytes(self.serial)));

        let now = OffsetDateTime::now_utc();
        params.not_before = now + Duration::days(self.not_before_days);
        params.not_after = now + Duration::days(self.not_after_days);

        if self.ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
            params.key_usages = vec![
                KeyUsagePurpose::KeyCertSign,
                KeyUsagePurpose::CrlSign,
                KeyUsagePurpose::DigitalSignature,
            ];
        }
        if !self.ocsp_urls.is_empty() {
            params.custom_extensions.push(CustomExtension::from_oid_content(
                &[1, 3, 6, 1, 5, 5, 7, 1, 1],
                aia_ocsp(&self.ocsp_urls),
            ));
        }
        params.crl_distribution_points = self
            .crl_urls
            .iter()
            .map(|url| CrlDistributionPoint {
                uris: vec![url.clone()],
            })
            .collect();
        params
    }
}

fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.extend_from_slice(&[0x81, len as u8]);
    } else {
        out.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(content);
    out
}

/// AuthorityInfoAccess value listing OCSP responders.
fn aia_ocsp(urls: &[String]) -> Vec<u8> {
    const ID_AD_OCSP: [u8; 10] = [0x06, 0x08, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01];
    let mut descriptions = Vec::new();
    for url in urls {
        let mut access = ID_AD_OCSP.to_vec();
        access.extend(der_tlv(0x86, url.as_bytes()));
        descriptions.extend(der_tlv(0x30, &access));
    }
    der_tlv(0x30, &descriptions)
}

/// A generated certificate with its key and inventory record.
pub struct Issued {
    profile_serial: u32,
    pub cert: rcgen::Certificate,
    pub key: KeyPair,
    pub record: Certificate,
}

impl Issued {
    pub fn serial(&self) -> &str {
        &self.record.serial_number
    }

    pub fn parsed(&self) -> ParsedCertificate {
        self.record.decode().unwrap()
    }
}

pub fn self_signed(profile: Profile) -> Issued {
    let key = KeyPair::generate().unwrap();
    let cert = profile.params().self_signed(&key).unwrap();
    let record = Certificate::from_pem(&cert.pem()).unwrap();
    let own = record.serial_number.clone();
    Issued {
        profile_serial: profile.serial,
        cert,
        key,
        record: record.with_issuer_serial(own),
    }
}

pub fn issued_by(profile: Profile, issuer: &Issued) -> Issued {
    let key = KeyPair::generate().unwrap();
    let cert = profile
        .params()
        .signed_by(&key, &issuer.cert, &issuer.key)
        .unwrap();
    let record = Certificate::from_pem(&cert.pem())
        .unwrap()
        .with_issuer_serial(issuer.serial());
    Issued {
        profile_serial: profile.serial,
        cert,
        key,
        record,
    }
}

/// DER CRL from `issuer` listing `revoked` as key compromises, valid for a year.
pub fn crl_der(issuer: &Issued, revoked: &[&Issued]) -> Vec<u8> {
    let now = OffsetDateTime::now_utc();
    let params = CertificateRevocationListParams {
        this_update: now - Duration::hours(1),
        next_update: now + Duration::days(365),
        crl_number: SerialNumber::from(1u64),
        issuing_distribution_point: None,
        revoked_certs: revoked
            .iter()
            .map(|r| RevokedCertParams {
                serial_number: SerialNumber::from_slice(&serial_bytes(r.profile_serial)),
                revocation_time: now - Duration::hours(1),
                reason_code: Some(RevocationReason::KeyCompromise),
                invalidity_date: None,
            })
            .collect(),
        key_identifier_method: KeyIdMethod::Sha256,
    };
    params
        .signed_by(&issuer.cert, &issuer.key)
        .unwrap()
        .der()
        .to_vec()
}

pub fn repository(certs: &[&Issued]) -> InMemoryRepository {
    InMemoryRepository::from_certificates(certs.iter().map(|c| c.record.clone()))
}

pub fn config() -> EngineConfig {
    EngineConfig::default()
}

/// Revocation answers keyed by URL, with call counters.
///
/// OCSP URLs without a scripted answer fail with a transport error. CRL URLs
/// without a scripted error answer "not listed" unless a hit was scripted for
/// the certificate's serial.
#[derive(Default)]
pub struct ScriptedSource {
    ocsp: HashMap<String, Result<OcspVerdict, RevocationError>>,
    crl_hits: HashMap<(String, String), CrlRevocation>,
    crl_errors: HashMap<String, RevocationError>,
    pub ocsp_calls: AtomicUsize,
    pub crl_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ocsp(mut self, url: &str, answer: Result<OcspVerdict, RevocationError>) -> Self {
        self.ocsp.insert(url.to_string(), answer);
        self
    }

    pub fn crl_hit(mut self, url: &str, serial: &str, hit: CrlRevocation) -> Self {
        self.crl_hits
            .insert((url.to_string(), serial.to_ascii_lowercase()), hit);
        self
    }

    pub fn crl_error(mut self, url: &str, error: RevocationError) -> Self {
        self.crl_errors.insert(url.to_string(), error);
        self
    }

    pub fn ocsp_calls(&self) -> usize {
        self.ocsp_calls.load(Ordering::SeqCst)
    }

    pub fn crl_calls(&self) -> usize {
        self.crl_calls.load(Ordering::SeqCst)
    }
}

impl RevocationSource for ScriptedSource {
    fn ocsp_check(
        &self,
        _subject: &ParsedCertificate,
        _issuer: &ParsedCertificate,
        url: &str,
    ) -> Result<OcspVerdict, RevocationError> {
        self.ocsp_calls.fetch_add(1, Ordering::SeqCst);
        self.ocsp.get(url).cloned().unwrap_or_else(|| {
            Err(RevocationError::Transport {
                url: url.to_string(),
                reason: "no scripted answer".into(),
            })
        })
    }

    fn crl_check(
        &self,
        subject: &ParsedCertificate,
        url: &str,
    ) -> Result<Option<CrlRevocation>, RevocationError> {
        self.crl_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.crl_errors.get(url) {
            return Err(error.clone());
        }
        Ok(self
            .crl_hits
            .get(&(url.to_string(), subject.serial_number()))
            .cloned())
    }
}
