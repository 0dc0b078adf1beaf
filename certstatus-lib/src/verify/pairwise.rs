//! Validation of one certificate against its issuer.
//!
//! Checks run in a fixed order: signature, validity window, OCSP, CRL. A bad
//! signature, a window that has not started or has ended, and any revocation
//! hit end the run early. A prior `REVOKED` status always survives.

use super::signature::{verify_self_signed, verify_signed_by};
use super::validity::{classify, ValidityWindow};
use crate::config::EngineConfig;
use crate::fields::ParsedCertificate;
use crate::model::{CertificateStatus, CheckName, CheckStatus, ValidationReport};
use crate::revocation::{OcspVerdict, RevocationSource};
use crate::util::format_elapsed;
use std::ops::ControlFlow;
use tracing::{debug, warn};

/// Status and report produced for one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    pub status: CertificateStatus,
    pub report: ValidationReport,
}

enum OcspOutcome {
    Revoked,
    /// At least one responder answered good.
    Confirmed,
    Inconclusive,
}

/// Runs the per-certificate checks against a revocation source.
pub struct PairwiseValidator<'a, S: ?Sized> {
    source: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: RevocationSource + ?Sized> PairwiseValidator<'a, S> {
    pub fn new(source: &'a S, config: &'a EngineConfig) -> Self {
        Self { source, config }
    }

    /// Validate a self-signed certificate. Revocation is not consulted.
    pub fn validate_self_signed(
        &self,
        cert: &ParsedCertificate,
        prior: CertificateStatus,
        now_ms: i64,
    ) -> PairOutcome {
        let mut report = ValidationReport::seeded();

        if let Err(e) = verify_self_signed(cert) {
            report.record(
                CheckName::SignatureVerification,
                CheckStatus::Failed,
                format!("Signature verification failed: {}", e),
            );
            return finish(CertificateStatus::Invalid, prior, report);
        }
        report.record(
            CheckName::SignatureVerification,
            CheckStatus::Success,
            "Signature verification completed successfully",
        );

        let status = match self.check_validity(cert, now_ms, &mut report) {
            ControlFlow::Break(terminal) => return finish(terminal, prior, report),
            ControlFlow::Continue(tentative) => tentative,
        };

        report.record(
            CheckName::OcspVerification,
            CheckStatus::NotChecked,
            "Self-signed certificate",
        );
        report.record(
            CheckName::CrlVerification,
            CheckStatus::NotChecked,
            "Self-signed certificate",
        );
        finish(status, prior, report)
    }

    /// Validate `subject` against `issuer`. With no issuer (the top of a
    /// broken chain) the signature cannot be checked and the report gains a
    /// `Certificate Chain` warning.
    pub fn validate_link(
        &self,
        subject: &ParsedCertificate,
        issuer: Option<&ParsedCertificate>,
        prior: CertificateStatus,
        now_ms: i64,
    ) -> PairOutcome {
        let mut report = ValidationReport::seeded();

        match issuer {
            Some(issuer) => {
                if let Err(e) = verify_signed_by(subject, issuer) {
                    report.record(
                        CheckName::SignatureVerification,
                        CheckStatus::Failed,
                        format!("Signature verification failed: {}", e),
                    );
                    return finish(CertificateStatus::Invalid, prior, report);
                }
                report.record(
                    CheckName::SignatureVerification,
                    CheckStatus::Success,
                    "Signature verification successful",
                );
            }
            None => {
                report.record(
                    CheckName::SignatureVerification,
                    CheckStatus::NotChecked,
                    "Issuer information unavailable",
                );
                report.record(
                    CheckName::CertificateChain,
                    CheckStatus::Warning,
                    "Issuer certificate cannot be found. It is unavailable in the inventory",
                );
            }
        }

        let mut status = match self.check_validity(subject, now_ms, &mut report) {
            ControlFlow::Break(terminal) => return finish(terminal, prior, report),
            ControlFlow::Continue(tentative) => tentative,
        };

        match self.check_ocsp(subject, issuer, &mut report) {
            OcspOutcome::Revoked => return finish(CertificateStatus::Revoked, prior, report),
            OcspOutcome::Confirmed if status != CertificateStatus::Expiring => {
                status = CertificateStatus::Valid;
            }
            OcspOutcome::Confirmed | OcspOutcome::Inconclusive => {}
        }

        if self.check_crl(subject, prior, &mut report) {
            return finish(CertificateStatus::Revoked, prior, report);
        }

        finish(status, prior, report)
    }

    fn check_validity(
        &self,
        cert: &ParsedCertificate,
        now_ms: i64,
        report: &mut ValidationReport,
    ) -> ControlFlow<CertificateStatus, CertificateStatus> {
        let window = classify(
            cert.not_before.millis(),
            cert.not_after.millis(),
            now_ms,
            self.config.expiring_threshold_millis(),
        );
        debug!("Validity of {}: {:?}", cert.serial, window);

        match window {
            ValidityWindow::NotYetValid => {
                report.record(
                    CheckName::CertificateValidity,
                    CheckStatus::Invalid,
                    "Not valid yet",
                );
                ControlFlow::Break(CertificateStatus::Invalid)
            }
            ValidityWindow::Expired { since_ms } => {
                report.record(
                    CheckName::CertificateValidity,
                    CheckStatus::Expired,
                    format!("Certificate expired {} ago", format_elapsed(since_ms)),
                );
                ControlFlow::Break(CertificateStatus::Expired)
            }
            ValidityWindow::Expiring { remaining_ms } => {
                report.record(
                    CheckName::CertificateValidity,
                    CheckStatus::Expiring,
                    format!("Expiring within {}", format_elapsed(remaining_ms)),
                );
                ControlFlow::Continue(CertificateStatus::Expiring)
            }
            ValidityWindow::Valid { .. } => {
                report.record(
                    CheckName::CertificateValidity,
                    CheckStatus::Success,
                    "Certificate validity check completed successfully",
                );
                ControlFlow::Continue(CertificateStatus::Valid)
            }
        }
    }

    fn check_ocsp(
        &self,
        subject: &ParsedCertificate,
        issuer: Option<&ParsedCertificate>,
        report: &mut ValidationReport,
    ) -> OcspOutcome {
        if subject.ocsp_urls.is_empty() {
            report.record(
                CheckName::OcspVerification,
                CheckStatus::Warning,
                "No OCSP URL in certificate",
            );
            return OcspOutcome::Inconclusive;
        }
        let Some(issuer) = issuer else {
            report.record(
                CheckName::OcspVerification,
                CheckStatus::NotChecked,
                "Issuer information unavailable",
            );
            return OcspOutcome::Inconclusive;
        };

        let mut lines = Vec::new();
        let mut confirmed = false;
        let mut failed = false;
        for url in &subject.ocsp_urls {
            match self.source.ocsp_check(subject, issuer, url) {
                Ok(OcspVerdict::Good) => {
                    confirmed = true;
                    lines.push(format!("OCSP verification success from {}", url));
                }
                Ok(OcspVerdict::Revoked { revoked_at, reason }) => {
                    let mut message = format!(
                        "Certificate was revoked according to information from OCSP.\nOCSP URL: {}",
                        url
                    );
                    if let Some(at) = revoked_at {
                        message.push_str(&format!("\nRevocation time: {}", at));
                    }
                    if let Some(reason) = reason {
                        message.push_str(&format!("\nReason: {}", reason));
                    }
                    report.record(CheckName::OcspVerification, CheckStatus::Revoked, message);
                    return OcspOutcome::Revoked;
                }
                Ok(OcspVerdict::Unknown) => {
                    lines.push(format!("OCSP check result is unknown.\nOCSP URL: {}", url));
                }
                Err(e) if e.is_timeout() => {
                    warn!("OCSP timeout for {}: {}", subject.serial, e);
                    lines.push(format!("Connection timeout to OCSP URL: {}", url));
                }
                Err(e) => {
                    warn!("OCSP check failed for {}: {}", subject.serial, e);
                    failed = true;
                    lines.push(format!(
                        "Error while checking OCSP URL: {}. Error Message: {}",
                        url, e
                    ));
                }
            }
        }

        let status = if confirmed {
            CheckStatus::Success
        } else if failed {
            CheckStatus::Failed
        } else {
            CheckStatus::Warning
        };
        report.record(CheckName::OcspVerification, status, lines.join("\n"));
        if confirmed {
            OcspOutcome::Confirmed
        } else {
            OcspOutcome::Inconclusive
        }
    }

    /// Returns true when a CRL lists the certificate.
    fn check_crl(
        &self,
        subject: &ParsedCertificate,
        prior: CertificateStatus,
        report: &mut ValidationReport,
    ) -> bool {
        if subject.crl_urls.is_empty() {
            report.record(
                CheckName::CrlVerification,
                CheckStatus::Warning,
                "No CRL URL in certificate",
            );
            return false;
        }
        let url_list = subject.crl_urls.join(", ");

        let mut errors = Vec::new();
        let mut failed = false;
        for url in &subject.crl_urls {
            match self.source.crl_check(subject, url) {
                Ok(Some(hit)) => {
                    report.record(
                        CheckName::CrlVerification,
                        CheckStatus::Revoked,
                        format!(
                            "Certificate was revoked on {} according to the CRL.\nReason: {}.\nCRL URL(s): {}",
                            hit.revoked_at, hit.reason, url_list
                        ),
                    );
                    return true;
                }
                Ok(None) => {}
                Err(e) if e.is_timeout() => {
                    warn!("CRL timeout for {}: {}", subject.serial, e);
                    errors.push(format!("Connection timeout to CRL URL: {}", url));
                }
                Err(e) => {
                    warn!("CRL check failed for {}: {}", subject.serial, e);
                    failed = true;
                    errors.push(format!(
                        "Failed connecting to CRL URL: {}. Error Message: {}",
                        url, e
                    ));
                }
            }
        }

        if !errors.is_empty() {
            let status = if failed {
                CheckStatus::Failed
            } else {
                CheckStatus::Warning
            };
            report.record(CheckName::CrlVerification, status, errors.join("\n"));
        } else if prior == CertificateStatus::Revoked {
            report.record(
                CheckName::CrlVerification,
                CheckStatus::Revoked,
                format!(
                    "Certificate revoked via platform. CRL returns valid. CRL may not be updated.\nCRL URL(s): {}",
                    url_list
                ),
            );
        } else {
            report.record(
                CheckName::CrlVerification,
                CheckStatus::Success,
                format!(
                    "CRL verification completed successfully.\nCRL URL(s): {}",
                    url_list
                ),
            );
        }
        false
    }
}

/// Apply the rule that a prior `REVOKED` is never downgraded.
fn finish(
    status: CertificateStatus,
    prior: CertificateStatus,
    report: ValidationReport,
) -> PairOutcome {
    let status = if prior == CertificateStatus::Revoked {
        CertificateStatus::Revoked
    } else {
        status
    };
    PairOutcome { status, report }
}
