//! Revocation cascade to directly issued certificates.

use crate::model::CertificateStatus;
use crate::repository::CertificateRepository;
use crate::util::normalize_serial;
use crate::CertStatusError;
use tracing::info;

/// Marks the certificates a revoked issuer signed as `REVOKED`.
///
/// Only direct dependents are touched; they are not re-validated.
pub struct RevocationPropagator<'a, R: ?Sized> {
    repository: &'a R,
}

impl<'a, R: CertificateRepository + ?Sized> RevocationPropagator<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    /// Revoke every certificate whose issuer-serial reference is `serial`.
    /// Returns how many records changed.
    pub fn on_revoked(&self, serial: &str) -> Result<usize, CertStatusError> {
        let own = normalize_serial(serial);
        let mut changed = 0;
        for mut dependent in self.repository.find_all_by_issuer_serial_number(serial)? {
            if normalize_serial(&dependent.serial_number) == own
                || dependent.status == CertificateStatus::Revoked
            {
                continue;
            }
            info!(
                "Revoking {} ({}): issuer {} is revoked",
                dependent.serial_number,
                dependent.display_name(),
                serial
            );
            dependent.status = CertificateStatus::Revoked;
            self.repository.save(&dependent)?;
            changed += 1;
        }
        Ok(changed)
    }
}
