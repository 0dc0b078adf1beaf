#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! End-to-end validation runs over rcgen-issued inventories.

mod common;

use certstatus_lib::revocation::{CrlRevocation, OcspVerdict, RevocationError};
use certstatus_lib::*;
use common::{issued_by, repository, self_signed, ScriptedSource, Profile};
use std::sync::Arc;

const OCSP_URL: &str = "http://ocsp.example.test/";
const CRL_URL: &str = "http://pki.example.test/root.crl";

fn stored(repo: &InMemoryRepository, serial: &str) -> Certificate {
    repo.find_by_serial_number(serial).unwrap().unwrap()
}

fn check(report: &ValidationReport, name: CheckName) -> &ValidationCheckResult {
    report.get(name).unwrap()
}

#[test]
fn self_signed_root_is_valid() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let repo = repository(&[&root]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let summary = engine.validate(&root.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Valid);
    assert!(summary.chain_complete);
    assert_eq!(summary.chain_length, 1);

    let report = &summary.report;
    assert_eq!(report.len(), 4);
    assert_eq!(
        report.status_of(CheckName::SignatureVerification),
        CheckStatus::Success
    );
    assert_eq!(
        report.status_of(CheckName::CertificateValidity),
        CheckStatus::Success
    );
    assert_eq!(
        check(report, CheckName::OcspVerification).message,
        "Self-signed certificate"
    );
    assert_eq!(
        report.status_of(CheckName::CrlVerification),
        CheckStatus::NotChecked
    );

    let saved = stored(&repo, root.serial());
    assert_eq!(saved.status, CertificateStatus::Valid);
    assert!(saved.status_validated_at.is_some());
    assert_eq!(saved.validation_report.as_ref(), Some(report));
}

#[test]
fn short_lived_leaf_without_urls_is_expiring() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Leaf B", 2).window(-1, 10), &root);
    let repo = repository(&[&root, &leaf]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Expiring);
    assert_eq!(summary.chain_length, 2);

    let report = &summary.report;
    assert_eq!(
        report.status_of(CheckName::SignatureVerification),
        CheckStatus::Success
    );
    assert_eq!(
        report.status_of(CheckName::CertificateValidity),
        CheckStatus::Expiring
    );
    assert!(check(report, CheckName::CertificateValidity)
        .message
        .starts_with("Expiring within 9 days"));
    assert_eq!(
        *check(report, CheckName::OcspVerification),
        ValidationCheckResult::new(CheckStatus::Warning, "No OCSP URL in certificate")
    );
    assert_eq!(
        *check(report, CheckName::CrlVerification),
        ValidationCheckResult::new(CheckStatus::Warning, "No CRL URL in certificate")
    );

    // The root was validated on the way up.
    assert_eq!(stored(&repo, root.serial()).status, CertificateStatus::Valid);
}

#[test]
fn crl_hit_revokes_and_cascades_to_dependents() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let sub = issued_by(Profile::new("Sub C", 3).ca().crl(CRL_URL), &root);
    let leaf = issued_by(Profile::new("Leaf D", 4), &sub);
    let repo = repository(&[&root, &sub, &leaf]);

    let revoked_at = DateTime::from_timestamp(1_790_000_000);
    let source = ScriptedSource::new().crl_hit(
        CRL_URL,
        sub.serial(),
        CrlRevocation {
            reason: "keyCompromise".into(),
            revoked_at: revoked_at.clone(),
        },
    );
    let engine = ValidationEngine::new(&repo, source, common::config());

    let summary = engine.validate(&sub.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Revoked);
    assert_eq!(summary.propagated, 1);

    let crl = check(&summary.report, CheckName::CrlVerification);
    assert_eq!(crl.status, CheckStatus::Revoked);
    assert!(crl.message.contains(&revoked_at.iso8601));
    assert!(crl.message.contains("Reason: keyCompromise."));
    assert!(crl.message.contains(CRL_URL));

    assert_eq!(stored(&repo, leaf.serial()).status, CertificateStatus::Revoked);
    assert_eq!(stored(&repo, root.serial()).status, CertificateStatus::Valid);
}

#[test]
fn leaf_under_revoked_issuer_ends_revoked() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let sub = issued_by(Profile::new("Sub C", 3).ca().crl(CRL_URL), &root);
    let leaf = issued_by(Profile::new("Leaf D", 4), &sub);
    let repo = repository(&[&root, &sub, &leaf]);
    let source = ScriptedSource::new().crl_hit(
        CRL_URL,
        sub.serial(),
        CrlRevocation {
            reason: "cACompromise".into(),
            revoked_at: DateTime::from_timestamp(1_790_000_000),
        },
    );
    let engine = ValidationEngine::new(&repo, source, common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.chain_length, 3);
    assert_eq!(summary.status, CertificateStatus::Revoked);
    // The leaf's own checks were clean; the status came from its issuer.
    assert_eq!(
        summary.report.status_of(CheckName::SignatureVerification),
        CheckStatus::Success
    );
    assert_eq!(stored(&repo, sub.serial()).status, CertificateStatus::Revoked);
}

#[test]
fn propagation_is_single_level() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let sub = issued_by(Profile::new("Sub C", 3).ca().ocsp(OCSP_URL), &root);
    let mid = issued_by(Profile::new("Mid E", 5).ca(), &sub);
    let leaf = issued_by(Profile::new("Leaf F", 6), &mid);
    let repo = repository(&[&root, &sub, &mid, &leaf]);
    let source = ScriptedSource::new().ocsp(
        OCSP_URL,
        Ok(OcspVerdict::Revoked {
            revoked_at: None,
            reason: None,
        }),
    );
    let engine = ValidationEngine::new(&repo, source, common::config());

    engine.validate(&sub.record).unwrap();
    assert_eq!(stored(&repo, mid.serial()).status, CertificateStatus::Revoked);
    assert_eq!(stored(&repo, leaf.serial()).status, CertificateStatus::Unknown);
}

#[test]
fn expired_certificate_skips_revocation() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(
        Profile::new("Old Leaf", 7)
            .window(-30, -2)
            .ocsp(OCSP_URL)
            .crl(CRL_URL),
        &root,
    );
    let repo = repository(&[&root, &leaf]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Expired);
    let validity = check(&summary.report, CheckName::CertificateValidity);
    assert_eq!(validity.status, CheckStatus::Expired);
    assert!(validity.message.starts_with("Certificate expired 2 days"));
    assert_eq!(
        summary.report.status_of(CheckName::OcspVerification),
        CheckStatus::NotChecked
    );
    assert_eq!(engine.source().ocsp_calls(), 0);
    assert_eq!(engine.source().crl_calls(), 0);
}

#[test]
fn not_yet_valid_certificate_is_invalid() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Future Leaf", 8).window(2, 400), &root);
    let repo = repository(&[&root, &leaf]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Invalid);
    assert_eq!(
        *check(&summary.report, CheckName::CertificateValidity),
        ValidationCheckResult::new(CheckStatus::Invalid, "Not valid yet")
    );
}

#[test]
fn wrong_issuer_key_is_invalid_and_skips_revocation() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let impostor = self_signed(Profile::new("Root A", 9).ca());
    let forged = issued_by(Profile::new("Forged", 10).ocsp(OCSP_URL).crl(CRL_URL), &impostor)
        .record
        .with_issuer_serial(root.serial());
    let repo = InMemoryRepository::from_certificates([root.record.clone(), forged.clone()]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let summary = engine.validate(&forged).unwrap();
    assert_eq!(summary.status, CertificateStatus::Invalid);
    let sig = check(&summary.report, CheckName::SignatureVerification);
    assert_eq!(sig.status, CheckStatus::Failed);
    assert!(sig.message.starts_with("Signature verification failed"));
    assert_eq!(engine.source().ocsp_calls(), 0);
    assert_eq!(engine.source().crl_calls(), 0);
}

#[test]
fn tampered_self_signed_root_is_invalid() {
    let root = self_signed(Profile::new("Root A", 1).ca().ocsp(OCSP_URL).crl(CRL_URL));
    let mut der = root.cert.der().to_vec();
    *der.last_mut().unwrap() ^= 0x01;
    let tampered = Certificate::from_der(&der)
        .unwrap()
        .with_issuer_serial(root.serial());
    assert!(tampered.is_self_signed());
    let repo = InMemoryRepository::from_certificates([tampered.clone()]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let summary = engine.validate(&tampered).unwrap();
    assert_eq!(summary.status, CertificateStatus::Invalid);
    let report = &summary.report;
    let sig = check(report, CheckName::SignatureVerification);
    assert_eq!(sig.status, CheckStatus::Failed);
    assert!(sig.message.starts_with("Signature verification failed"));
    for name in [
        CheckName::CertificateValidity,
        CheckName::OcspVerification,
        CheckName::CrlVerification,
    ] {
        assert_eq!(report.status_of(name), CheckStatus::NotChecked, "{name:?}");
    }
    assert_eq!(engine.source().ocsp_calls(), 0);
    assert_eq!(engine.source().crl_calls(), 0);
    assert_eq!(stored(&repo, root.serial()).status, CertificateStatus::Invalid);
}

#[test]
fn depth_bound_tail_is_checked_against_its_known_issuer() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let sub = issued_by(Profile::new("Sub", 22).ca().ocsp(OCSP_URL), &root);
    let leaf = issued_by(Profile::new("Leaf", 23), &sub);
    let repo = repository(&[&root, &sub, &leaf]);
    let source = ScriptedSource::new().ocsp(OCSP_URL, Ok(OcspVerdict::Good));
    let config = EngineConfig::builder().max_chain_depth(2).build();
    let engine = ValidationEngine::new(&repo, source, config);

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.chain_length, 2);
    assert!(!summary.chain_complete);

    let saved = stored(&repo, sub.serial());
    let report = saved.validation_report.unwrap();
    assert_eq!(report.len(), 4);
    assert!(report.get(CheckName::CertificateChain).is_none());
    assert_eq!(
        report.status_of(CheckName::SignatureVerification),
        CheckStatus::Success
    );
    assert_eq!(
        report.status_of(CheckName::OcspVerification),
        CheckStatus::Success
    );
    assert_eq!(saved.status, CertificateStatus::Valid);
    assert_eq!(engine.source().ocsp_calls(), 1);
    // The root sits beyond the bound and is not revalidated.
    assert_eq!(stored(&repo, root.serial()).status, CertificateStatus::Unknown);
}

#[test]
fn ocsp_revocation_short_circuits_crl() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Leaf", 11).ocsp(OCSP_URL).crl(CRL_URL), &root);
    let repo = repository(&[&root, &leaf]);
    let source = ScriptedSource::new().ocsp(
        OCSP_URL,
        Ok(OcspVerdict::Revoked {
            revoked_at: Some(DateTime::from_timestamp(1_790_000_000)),
            reason: Some("keyCompromise".into()),
        }),
    );
    let engine = ValidationEngine::new(&repo, source, common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Revoked);
    let ocsp = check(&summary.report, CheckName::OcspVerification);
    assert_eq!(ocsp.status, CheckStatus::Revoked);
    assert!(ocsp.message.contains("Revocation time: 2026-09-21T"));
    assert!(ocsp.message.contains("Reason: keyCompromise"));
    assert_eq!(
        summary.report.status_of(CheckName::CrlVerification),
        CheckStatus::NotChecked
    );
    assert_eq!(engine.source().crl_calls(), 0);
}

#[test]
fn clean_ocsp_and_crl_is_valid() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Leaf", 12).ocsp(OCSP_URL).crl(CRL_URL), &root);
    let repo = repository(&[&root, &leaf]);
    let source = ScriptedSource::new().ocsp(OCSP_URL, Ok(OcspVerdict::Good));
    let engine = ValidationEngine::new(&repo, source, common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Valid);
    assert_eq!(
        *check(&summary.report, CheckName::OcspVerification),
        ValidationCheckResult::new(
            CheckStatus::Success,
            format!("OCSP verification success from {}", OCSP_URL)
        )
    );
    assert_eq!(
        *check(&summary.report, CheckName::CrlVerification),
        ValidationCheckResult::new(
            CheckStatus::Success,
            format!(
                "CRL verification completed successfully.\nCRL URL(s): {}",
                CRL_URL
            )
        )
    );
}

#[test]
fn good_ocsp_does_not_lift_expiring() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Leaf", 13).window(-1, 5).ocsp(OCSP_URL), &root);
    let repo = repository(&[&root, &leaf]);
    let source = ScriptedSource::new().ocsp(OCSP_URL, Ok(OcspVerdict::Good));
    let engine = ValidationEngine::new(&repo, source, common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Expiring);
}

#[test]
fn manual_revocation_survives_clean_crl() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let mut leaf = issued_by(Profile::new("Leaf", 14).crl(CRL_URL), &root);
    leaf.record.status = CertificateStatus::Revoked;
    let repo = repository(&[&root, &leaf]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Revoked);
    let crl = check(&summary.report, CheckName::CrlVerification);
    assert_eq!(crl.status, CheckStatus::Revoked);
    assert!(crl.message.starts_with("Certificate revoked via platform"));
    assert_eq!(stored(&repo, leaf.serial()).status, CertificateStatus::Revoked);
}

#[test]
fn manual_revocation_survives_expiry() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let mut leaf = issued_by(Profile::new("Leaf", 15).window(-30, -1), &root);
    leaf.record.status = CertificateStatus::Revoked;
    let repo = repository(&[&root, &leaf]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Revoked);
    assert_eq!(
        summary.report.status_of(CheckName::CertificateValidity),
        CheckStatus::Expired
    );
}

#[test]
fn crl_timeout_is_a_warning() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Leaf", 16).crl(CRL_URL), &root);
    let repo = repository(&[&root, &leaf]);
    let source = ScriptedSource::new().crl_error(
        CRL_URL,
        RevocationError::Timeout {
            url: CRL_URL.into(),
        },
    );
    let engine = ValidationEngine::new(&repo, source, common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Valid);
    assert_eq!(
        *check(&summary.report, CheckName::CrlVerification),
        ValidationCheckResult::new(
            CheckStatus::Warning,
            format!("Connection timeout to CRL URL: {}", CRL_URL)
        )
    );
}

#[test]
fn ocsp_transport_failure_is_recorded_not_fatal() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Leaf", 17).ocsp(OCSP_URL), &root);
    let repo = repository(&[&root, &leaf]);
    // No scripted answer: the source fails with a transport error.
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Valid);
    let ocsp = check(&summary.report, CheckName::OcspVerification);
    assert_eq!(ocsp.status, CheckStatus::Failed);
    assert!(ocsp
        .message
        .starts_with(&format!("Error while checking OCSP URL: {}", OCSP_URL)));
}

#[test]
fn unknown_ocsp_answer_is_a_warning() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Leaf", 18).ocsp(OCSP_URL), &root);
    let repo = repository(&[&root, &leaf]);
    let source = ScriptedSource::new().ocsp(OCSP_URL, Ok(OcspVerdict::Unknown));
    let engine = ValidationEngine::new(&repo, source, common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Valid);
    assert_eq!(
        summary.report.status_of(CheckName::OcspVerification),
        CheckStatus::Warning
    );
}

#[test]
fn incomplete_chain_validates_in_degraded_mode() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Orphan", 19).ocsp(OCSP_URL), &root);
    // The issuer is not in the inventory.
    let repo = repository(&[&leaf]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let summary = engine.validate(&leaf.record).unwrap();
    assert!(!summary.chain_complete);
    assert_eq!(summary.status, CertificateStatus::Valid);

    let report = &summary.report;
    assert_eq!(report.len(), 5);
    assert_eq!(report.names()[4], CheckName::CertificateChain);
    assert_eq!(
        report.status_of(CheckName::CertificateChain),
        CheckStatus::Warning
    );
    assert_eq!(
        *check(report, CheckName::SignatureVerification),
        ValidationCheckResult::new(CheckStatus::NotChecked, "Issuer information unavailable")
    );
    assert_eq!(
        report.status_of(CheckName::OcspVerification),
        CheckStatus::NotChecked
    );
    assert_eq!(engine.source().ocsp_calls(), 0);
}

#[test]
fn chain_building_is_deterministic() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let sub = issued_by(Profile::new("Sub", 20).ca(), &root);
    let leaf = issued_by(Profile::new("Leaf", 21), &sub);
    let repo = repository(&[&root, &sub, &leaf]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let first = engine.build_chain(&leaf.record).unwrap();
    let second = engine.build_chain(&leaf.record).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.serial_numbers(),
        vec![leaf.serial(), sub.serial(), root.serial()]
    );
}

#[test]
fn batch_survives_undecodable_certificate() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Leaf", 22), &root);
    let broken = Certificate {
        serial_number: "5e0000ff".into(),
        issuer_serial_number: None,
        subject_dn: "CN = Broken".into(),
        issuer_dn: "CN = Nobody".into(),
        content: "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n".into(),
        status: CertificateStatus::Unknown,
        validation_report: None,
        status_validated_at: None,
    };
    let repo = InMemoryRepository::from_certificates([
        root.record.clone(),
        leaf.record.clone(),
        broken.clone(),
    ]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let outcome = engine.validate_batch(&[leaf.record.clone(), broken, root.record.clone()]);
    assert_eq!(outcome.validated.len(), 2);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].serial_number, "5e0000ff");
    assert!(!outcome.is_clean());
    assert_eq!(
        stored(&repo, "5e0000ff").status,
        CertificateStatus::Unknown
    );
}

#[test]
fn single_validation_surfaces_decode_errors() {
    let broken = Certificate {
        serial_number: "5e0000fe".into(),
        issuer_serial_number: None,
        subject_dn: "CN = Broken".into(),
        issuer_dn: "CN = Broken".into(),
        content: "not a certificate".into(),
        status: CertificateStatus::Unknown,
        validation_report: None,
        status_validated_at: None,
    };
    let repo = InMemoryRepository::from_certificates([broken.clone()]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let err = engine.validate(&broken).unwrap_err();
    assert!(err.is_decode_error());
}

#[test]
fn validate_all_unknown_skips_validated_records() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Leaf", 23), &root);
    let mut done = self_signed(Profile::new("Other Root", 24).ca());
    done.record.status = CertificateStatus::Valid;
    let repo = repository(&[&root, &leaf, &done]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());

    let outcome = engine.validate_all_unknown();
    assert_eq!(outcome.total(), 2);
    assert!(outcome.is_clean());
    assert!(stored(&repo, done.serial()).status_validated_at.is_none());
    assert!(repo
        .find_all_by_status(CertificateStatus::Unknown)
        .unwrap()
        .is_empty());
}

#[test]
fn pool_runs_batches_off_thread() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Leaf", 25).window(-1, 10), &root);
    let repo = Arc::new(repository(&[&root, &leaf]));
    let engine = Arc::new(ValidationEngine::new(
        Arc::clone(&repo),
        ScriptedSource::new(),
        common::config(),
    ));
    let pool = ValidationPool::new(2).unwrap();
    assert_eq!(pool.num_threads(), 2);

    let outcome = pool.submit_unknown(Arc::clone(&engine)).wait().unwrap();
    assert_eq!(outcome.total(), 2);
    assert_eq!(stored(&repo, leaf.serial()).status, CertificateStatus::Expiring);
    assert_eq!(stored(&repo, root.serial()).status, CertificateStatus::Valid);

    let again = pool
        .submit(engine, vec![leaf.record.clone()])
        .wait()
        .unwrap();
    assert_eq!(again.validated.len(), 1);
}

#[test]
fn persisted_report_round_trips_through_json() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let leaf = issued_by(Profile::new("Orphan", 26).crl(CRL_URL), &root);
    let repo = repository(&[&leaf]);
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), common::config());
    engine.validate(&leaf.record).unwrap();

    let saved = stored(&repo, leaf.serial());
    let json = serde_json::to_string(&saved).unwrap();
    let back: Certificate = serde_json::from_str(&json).unwrap();
    assert_eq!(back.validation_report, saved.validation_report);
    assert_eq!(
        back.validation_report.unwrap().names(),
        vec![
            CheckName::SignatureVerification,
            CheckName::CertificateValidity,
            CheckName::OcspVerification,
            CheckName::CrlVerification,
            CheckName::CertificateChain,
        ]
    );
}

#[test]
fn at_time_moves_the_validity_clock() {
    let root = self_signed(Profile::new("Root A", 1).ca());
    let repo = repository(&[&root]);
    let later = time::OffsetDateTime::now_utc() + time::Duration::days(500);
    let config = EngineConfig::builder()
        .at_time(later.unix_timestamp())
        .build();
    let engine = ValidationEngine::new(&repo, ScriptedSource::new(), config);

    let summary = engine.validate(&root.record).unwrap();
    assert_eq!(summary.status, CertificateStatus::Expired);
}
