//! Human-readable and JSON rendering of validation results.

use crate::engine::ValidationSummary;
use crate::model::ValidationReport;
use crate::verify::Chain;
use crate::CertStatusError;
use serde::Serialize;

/// Render a report, one check per block, in report order.
pub fn display_report(report: &ValidationReport) -> String {
    let mut out = String::new();
    for (name, result) in report.iter() {
        out.push_str(&format!(
            "  {}: {}\n",
            name,
            result.status.as_str().to_uppercase()
        ));
        for line in result.message.lines().filter(|l| !l.trim().is_empty()) {
            out.push_str(&format!("    {}\n", line.trim()));
        }
    }
    out
}

/// Render a validation summary with its report.
pub fn display_summary(summary: &ValidationSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Certificate: {}\n", summary.subject_dn));
    out.push_str(&format!("  Serial: {}\n", summary.serial_number));
    out.push_str(&format!(
        "  Status: {}\n",
        summary.status.as_str().to_uppercase()
    ));
    out.push_str(&format!(
        "  Chain: {} certificate(s), {}\n",
        summary.chain_length,
        if summary.chain_complete {
            "complete"
        } else {
            "incomplete"
        }
    ));
    if summary.propagated > 0 {
        out.push_str(&format!(
            "  Revoked dependents: {}\n",
            summary.propagated
        ));
    }
    out.push_str("Checks:\n");
    out.push_str(&display_report(&summary.report));
    out
}

/// Render a chain leaf first, one line per certificate.
pub fn display_chain(chain: &Chain) -> String {
    let mut out = String::new();
    for (depth, cert) in chain.iter().enumerate() {
        out.push_str(&format!(
            "{:>2}: {} [{}] {}\n",
            depth,
            cert.subject_dn,
            cert.serial_number,
            cert.status.as_str().to_uppercase()
        ));
    }
    if let Some(issuer) = chain.cut_issuer() {
        out.push_str(&format!(
            "    (walk stopped before issuer [{}])\n",
            issuer.serial_number
        ));
    } else if !chain.is_complete() {
        out.push_str("    (chain ends without a self-signed certificate)\n");
    }
    out
}

/// Serialize any result type as pretty JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CertStatusError> {
    Ok(serde_json::to_string_pretty(value)?)
}
