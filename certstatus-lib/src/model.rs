//! Inventory record, statuses, and the ordered validation report.

use crate::fields::ParsedCertificate;
use crate::CertStatusError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

/// Trust status of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    /// Never validated.
    #[default]
    Unknown,
    Valid,
    Expiring,
    Expired,
    Invalid,
    Revoked,
}

impl CertificateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Valid => "valid",
            Self::Expiring => "expiring",
            Self::Expired => "expired",
            Self::Invalid => "invalid",
            Self::Revoked => "revoked",
        }
    }

    /// Statuses under which the certificate may still be relied upon.
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Valid | Self::Expiring)
    }
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one named check inside a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    #[default]
    NotChecked,
    Success,
    Failed,
    Warning,
    Invalid,
    Expiring,
    Expired,
    Revoked,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotChecked => "not_checked",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Warning => "warning",
            Self::Invalid => "invalid",
            Self::Expiring => "expiring",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the checks a report can carry. The display strings are part of
/// the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckName {
    SignatureVerification,
    CertificateValidity,
    OcspVerification,
    CrlVerification,
    CertificateChain,
}

impl CheckName {
    /// The four checks every report starts with, in display order.
    pub const SEEDED: [CheckName; 4] = [
        CheckName::SignatureVerification,
        CheckName::CertificateValidity,
        CheckName::OcspVerification,
        CheckName::CrlVerification,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SignatureVerification => "Signature Verification",
            Self::CertificateValidity => "Certificate Validity",
            Self::OcspVerification => "OCSP Verification",
            Self::CrlVerification => "CRL Verification",
            Self::CertificateChain => "Certificate Chain",
        }
    }
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckName {
    type Err = CertStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Signature Verification" => Ok(Self::SignatureVerification),
            "Certificate Validity" => Ok(Self::CertificateValidity),
            "OCSP Verification" => Ok(Self::OcspVerification),
            "CRL Verification" => Ok(Self::CrlVerification),
            "Certificate Chain" => Ok(Self::CertificateChain),
            other => Err(CertStatusError::ParseError(format!(
                "unknown check name '{}'",
                other
            ))),
        }
    }
}

/// Status and message of one check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationCheckResult {
    pub status: CheckStatus,
    pub message: String,
}

impl ValidationCheckResult {
    pub fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Ordered mapping of check name to result.
///
/// Insertion order is preserved through serialization; recording a check
/// that already exists replaces it in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    entries: Vec<(CheckName, ValidationCheckResult)>,
}

impl ValidationReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// A report holding the four standard checks, all `NOT_CHECKED`.
    pub fn seeded() -> Self {
        let mut report = Self::new();
        for name in CheckName::SEEDED {
            report.record(name, CheckStatus::NotChecked, "");
        }
        report
    }

    pub fn record(&mut self, name: CheckName, status: CheckStatus, message: impl Into<String>) {
        self.set(name, ValidationCheckResult::new(status, message));
    }

    pub fn set(&mut self, name: CheckName, result: ValidationCheckResult) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = result,
            None => self.entries.push((name, result)),
        }
    }

    pub fn get(&self, name: CheckName) -> Option<&ValidationCheckResult> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, r)| r)
    }

    /// Status of a check, `NotChecked` when absent.
    pub fn status_of(&self, name: CheckName) -> CheckStatus {
        self.get(name).map(|r| r.status).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckName, &ValidationCheckResult)> {
        self.entries.iter().map(|(n, r)| (*n, r))
    }

    pub fn names(&self) -> Vec<CheckName> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, result) in &self.entries {
            map.serialize_entry(name.as_str(), result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ValidationReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ReportVisitor;

        impl<'de> Visitor<'de> for ReportVisitor {
            type Value = ValidationReport;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of check name to {status, message}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut report = ValidationReport::new();
                while let Some((key, value)) =
                    access.next_entry::<String, ValidationCheckResult>()?
                {
                    let name = key.parse::<CheckName>().map_err(serde::de::Error::custom)?;
                    report.set(name, value);
                }
                Ok(report)
            }
        }

        deserializer.deserialize_map(ReportVisitor)
    }
}

/// A certificate as held by the inventory.
///
/// The engine writes `status`, `validation_report` and `status_validated_at`;
/// everything else belongs to ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// Compact lowercase hex serial.
    pub serial_number: String,
    /// Serial of the believed issuer, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_serial_number: Option<String>,
    pub subject_dn: String,
    pub issuer_dn: String,
    /// PEM (or bare base64) certificate body.
    pub content: String,
    #[serde(default)]
    pub status: CertificateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_report: Option<ValidationReport>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub status_validated_at: Option<OffsetDateTime>,
}

impl Certificate {
    /// Build an `UNKNOWN` record from PEM content.
    pub fn from_pem(pem: &str) -> Result<Self, CertStatusError> {
        let parsed = crate::parser::decode_x509(pem)?;
        Ok(Self::from_parsed(&parsed, pem.to_string()))
    }

    /// Build an `UNKNOWN` record from DER bytes; content is stored as PEM.
    pub fn from_der(der: &[u8]) -> Result<Self, CertStatusError> {
        let parsed = crate::parser::parse_der(der)?;
        let pem = crate::convert::der_to_pem(&parsed.raw_der);
        Ok(Self::from_parsed(&parsed, pem))
    }

    fn from_parsed(parsed: &ParsedCertificate, content: String) -> Self {
        Self {
            serial_number: parsed.serial_number(),
            issuer_serial_number: None,
            subject_dn: parsed.subject_string(),
            issuer_dn: parsed.issuer_string(),
            content,
            status: CertificateStatus::Unknown,
            validation_report: None,
            status_validated_at: None,
        }
    }

    pub fn with_issuer_serial(mut self, serial: impl Into<String>) -> Self {
        self.issuer_serial_number = Some(serial.into());
        self
    }

    pub fn with_status(mut self, status: CertificateStatus) -> Self {
        self.status = status;
        self
    }

    /// Subject DN equals issuer DN.
    pub fn is_self_signed(&self) -> bool {
        self.subject_dn == self.issuer_dn
    }

    /// Decode the stored content.
    pub fn decode(&self) -> Result<ParsedCertificate, CertStatusError> {
        crate::parser::decode_x509(&self.content)
    }

    /// Short display name taken from the subject DN.
    pub fn display_name(&self) -> &str {
        self.subject_dn
            .split(", ")
            .find_map(|part| part.strip_prefix("CN = "))
            .unwrap_or(&self.subject_dn)
    }
}
