#![no_main]

use certstatus_lib::revocation::{crl, ocsp};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Responder and CRL bodies are untrusted network input.
    let serial = data.get(..4).unwrap_or_default();
    let _ = ocsp::parse_response(data, serial);
    let _ = crl::crl_der_from_bytes(data);
    let _ = crl::next_update(data);
});
