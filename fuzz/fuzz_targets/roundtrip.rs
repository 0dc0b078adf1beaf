#![no_main]

use certstatus_lib::{der_to_pem, parse_der, pem_to_der, Certificate};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // If data parses as DER, roundtrip through PEM and back
    if let Ok(cert1) = parse_der(data) {
        let pem = der_to_pem(data);
        if let Ok(der_back) = pem_to_der(pem.as_bytes()) {
            if let Ok(cert2) = parse_der(&der_back) {
                assert_eq!(
                    cert1.serial_number(),
                    cert2.serial_number(),
                    "serial mismatch after roundtrip"
                );
            }
        }

        // The inventory record keeps the same identity as the decoded view.
        if let Ok(record) = Certificate::from_pem(&pem) {
            assert_eq!(record.serial_number, cert1.serial_number());
            assert_eq!(record.subject_dn, cert1.subject_string());
        }
    }
});
