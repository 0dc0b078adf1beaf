//! Validity-window classification.

/// Where "now" falls relative to a certificate's validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityWindow {
    NotYetValid,
    /// `notAfter` is at or before now.
    Expired { since_ms: i64 },
    /// Expires within the threshold (inclusive).
    Expiring { remaining_ms: i64 },
    Valid { remaining_ms: i64 },
}

/// Classify a window given in Unix milliseconds.
pub fn classify(
    not_before_ms: i64,
    not_after_ms: i64,
    now_ms: i64,
    threshold_ms: i64,
) -> ValidityWindow {
    if now_ms < not_before_ms {
        return ValidityWindow::NotYetValid;
    }
    let remaining_ms = not_after_ms.saturating_sub(now_ms);
    if remaining_ms <= 0 {
        ValidityWindow::Expired {
            since_ms: -remaining_ms,
        }
    } else if remaining_ms <= threshold_ms {
        ValidityWindow::Expiring { remaining_ms }
    } else {
        ValidityWindow::Valid { remaining_ms }
    }
}
