#![no_main]

use certstatus_lib::inventory::{link_issuers, load_certificates};
use certstatus_lib::{decode_x509, parse_der, Certificate, DigestAlgorithm};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, regardless of input.
    if let Ok(cert) = parse_der(data) {
        let _ = cert.subject_string();
        let _ = cert.issuer_string();
        let _ = cert.serial_number();
        let _ = cert.serial_bytes();
        let _ = cert.is_self_issued();
        let _ = cert.fingerprint(DigestAlgorithm::Sha256);
        let _ = cert.not_after.to_openssl();
        let _ = certstatus_lib::to_json(&cert);

        if let Ok(record) = Certificate::from_der(data) {
            let _ = record.is_self_signed();
            let _ = record.display_name();
        }
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = decode_x509(text);
    }

    if let Ok(mut certs) = load_certificates(data) {
        let _ = link_issuers(&mut certs);
    }
});
