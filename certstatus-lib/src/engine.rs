//! Validation orchestration: chain walk, per-certificate checks,
//! persistence, and revocation propagation.

use crate::config::EngineConfig;
use crate::fields::ParsedCertificate;
use crate::model::{Certificate, CertificateStatus, ValidationReport};
use crate::propagate::RevocationPropagator;
use crate::repository::CertificateRepository;
use crate::revocation::RevocationSource;
use crate::verify::{build_chain, Chain, PairOutcome, PairwiseValidator};
use crate::CertStatusError;
use rayon::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, info, warn};

/// Result of validating one certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub serial_number: String,
    pub subject_dn: String,
    /// Persisted status after the whole chain was walked.
    pub status: CertificateStatus,
    pub report: ValidationReport,
    pub chain_length: usize,
    pub chain_complete: bool,
    /// Dependents newly marked revoked by this run.
    pub propagated: usize,
}

/// A batch item that could not be validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub serial_number: String,
    pub error: String,
}

/// Results of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub validated: Vec<ValidationSummary>,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.validated.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives validation runs against an inventory and a revocation source.
pub struct ValidationEngine<R, S> {
    repository: R,
    source: S,
    config: EngineConfig,
}

impl<R: CertificateRepository, S: RevocationSource> ValidationEngine<R, S> {
    pub fn new(repository: R, source: S, config: EngineConfig) -> Self {
        Self {
            repository,
            source,
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rebuild the issuance chain above `leaf`.
    pub fn build_chain(&self, leaf: &Certificate) -> Result<Chain, CertStatusError> {
        build_chain(&self.repository, leaf, self.config.max_chain_depth)
    }

    /// Validate `certificate` and every certificate above it.
    ///
    /// Each chain member's status, report and timestamp are persisted; a
    /// member ending `REVOKED` revokes its direct dependents. Undecodable
    /// content anywhere on the chain fails the call before anything is saved.
    pub fn validate(&self, certificate: &Certificate) -> Result<ValidationSummary, CertStatusError> {
        let chain = self.build_chain(certificate)?;
        let decoded = chain
            .iter()
            .map(Certificate::decode)
            .collect::<Result<Vec<ParsedCertificate>, _>>()?;
        let cut_issuer = chain.cut_issuer().map(Certificate::decode).transpose()?;

        if chain.is_broken() {
            warn!(
                "Incomplete chain for {}: issuer of {} is not in the inventory",
                certificate.serial_number,
                chain.tail().serial_number
            );
        }

        let validator = PairwiseValidator::new(&self.source, &self.config);
        let now_ms = self.config.now_millis();
        let validated_at = OffsetDateTime::now_utc();

        let mut leaf_report = None;
        let mut propagated = 0;
        for (index, (member, parsed)) in chain.iter().zip(&decoded).enumerate() {
            let mut record = self
                .repository
                .find_by_serial_number(&member.serial_number)?
                .unwrap_or_else(|| member.clone());
            let prior = record.status;

            let outcome: PairOutcome = if member.is_self_signed() {
                validator.validate_self_signed(parsed, prior, now_ms)
            } else {
                // The top of a broken chain has no issuer to check against.
                let issuer = decoded.get(index + 1).or(cut_issuer.as_ref());
                validator.validate_link(parsed, issuer, prior, now_ms)
            };

            info!(
                "{} ({}): {} -> {}",
                record.serial_number,
                record.display_name(),
                prior,
                outcome.status
            );
            record.status = outcome.status;
            record.validation_report = Some(outcome.report.clone());
            record.status_validated_at = Some(validated_at);
            self.repository.save(&record)?;

            if outcome.status == CertificateStatus::Revoked {
                let changed =
                    RevocationPropagator::new(&self.repository).on_revoked(&record.serial_number)?;
                if index == 0 {
                    propagated = changed;
                }
            }
            if index == 0 {
                leaf_report = Some((outcome.status, outcome.report));
            }
        }

        let (leaf_status, report) =
            leaf_report.unwrap_or((certificate.status, ValidationReport::seeded()));
        // An issuer revoked further up the chain revokes the leaf too.
        let status = self
            .repository
            .find_by_serial_number(&certificate.serial_number)?
            .map_or(leaf_status, |stored| stored.status);

        Ok(ValidationSummary {
            serial_number: certificate.serial_number.clone(),
            subject_dn: certificate.subject_dn.clone(),
            status,
            report,
            chain_length: chain.len(),
            chain_complete: chain.is_complete(),
            propagated,
        })
    }

    /// Validate independent certificates in parallel. Failures are logged
    /// and collected; they never abort the batch.
    pub fn validate_batch(&self, certificates: &[Certificate]) -> BatchOutcome {
        let results: Vec<Result<ValidationSummary, BatchFailure>> = certificates
            .par_iter()
            .map(|cert| {
                self.validate(cert).map_err(|e| {
                    warn!(
                        "Unable to validate the certificate {}: {}",
                        cert.serial_number, e
                    );
                    BatchFailure {
                        serial_number: cert.serial_number.clone(),
                        error: e.to_string(),
                    }
                })
            })
            .collect();

        let mut outcome = BatchOutcome::default();
        for result in results {
            match result {
                Ok(summary) => outcome.validated.push(summary),
                Err(failure) => outcome.failed.push(failure),
            }
        }
        info!(
            "Batch finished: {} validated, {} failed",
            outcome.validated.len(),
            outcome.failed.len()
        );
        outcome
    }

    /// Validate every certificate still in `UNKNOWN` status.
    pub fn validate_all_unknown(&self) -> BatchOutcome {
        match self
            .repository
            .find_all_by_status(CertificateStatus::Unknown)
        {
            Ok(pending) => self.validate_batch(&pending),
            Err(e) => {
                error!("Unable to list unvalidated certificates: {}", e);
                BatchOutcome::default()
            }
        }
    }
}
