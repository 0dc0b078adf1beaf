//! Certificate inventory access.

use crate::model::{Certificate, CertificateStatus};
use crate::util::normalize_serial;
use crate::CertStatusError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lookup and persistence of inventory certificates.
///
/// Serial numbers compare case-insensitively. A missing certificate is
/// `Ok(None)`; `Err` is reserved for backend failures.
pub trait CertificateRepository: Send + Sync {
    fn find_by_serial_number(&self, serial: &str) -> Result<Option<Certificate>, CertStatusError>;

    /// Certificates whose issuer-serial reference equals `serial`.
    fn find_all_by_issuer_serial_number(
        &self,
        serial: &str,
    ) -> Result<Vec<Certificate>, CertStatusError>;

    fn find_all_by_status(
        &self,
        status: CertificateStatus,
    ) -> Result<Vec<Certificate>, CertStatusError>;

    /// Insert or replace the record keyed by its serial number.
    fn save(&self, certificate: &Certificate) -> Result<(), CertStatusError>;
}

impl<T: CertificateRepository + ?Sized> CertificateRepository for Arc<T> {
    fn find_by_serial_number(&self, serial: &str) -> Result<Option<Certificate>, CertStatusError> {
        (**self).find_by_serial_number(serial)
    }

    fn find_all_by_issuer_serial_number(
        &self,
        serial: &str,
    ) -> Result<Vec<Certificate>, CertStatusError> {
        (**self).find_all_by_issuer_serial_number(serial)
    }

    fn find_all_by_status(
        &self,
        status: CertificateStatus,
    ) -> Result<Vec<Certificate>, CertStatusError> {
        (**self).find_all_by_status(status)
    }

    fn save(&self, certificate: &Certificate) -> Result<(), CertStatusError> {
        (**self).save(certificate)
    }
}

impl<T: CertificateRepository + ?Sized> CertificateRepository for &T {
    fn find_by_serial_number(&self, serial: &str) -> Result<Option<Certificate>, CertStatusError> {
        (**self).find_by_serial_number(serial)
    }

    fn find_all_by_issuer_serial_number(
        &self,
        serial: &str,
    ) -> Result<Vec<Certificate>, CertStatusError> {
        (**self).find_all_by_issuer_serial_number(serial)
    }

    fn find_all_by_status(
        &self,
        status: CertificateStatus,
    ) -> Result<Vec<Certificate>, CertStatusError> {
        (**self).find_all_by_status(status)
    }

    fn save(&self, certificate: &Certificate) -> Result<(), CertStatusError> {
        (**self).save(certificate)
    }
}

/// In-process inventory ordered by serial number.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    certs: RwLock<BTreeMap<String, Certificate>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_certificates(certs: impl IntoIterator<Item = Certificate>) -> Self {
        let map = certs
            .into_iter()
            .map(|c| (normalize_serial(&c.serial_number), c))
            .collect();
        Self {
            certs: RwLock::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.certs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.read().is_empty()
    }

    /// Snapshot of every record, in serial order.
    pub fn all(&self) -> Vec<Certificate> {
        self.certs.read().values().cloned().collect()
    }
}

impl CertificateRepository for InMemoryRepository {
    fn find_by_serial_number(&self, serial: &str) -> Result<Option<Certificate>, CertStatusError> {
        Ok(self.certs.read().get(&normalize_serial(serial)).cloned())
    }

    fn find_all_by_issuer_serial_number(
        &self,
        serial: &str,
    ) -> Result<Vec<Certificate>, CertStatusError> {
        let wanted = normalize_serial(serial);
        Ok(self
            .certs
            .read()
            .values()
            .filter(|c| {
                c.issuer_serial_number
                    .as_deref()
                    .is_some_and(|s| normalize_serial(s) == wanted)
            })
            .cloned()
            .collect())
    }

    fn find_all_by_status(
        &self,
        status: CertificateStatus,
    ) -> Result<Vec<Certificate>, CertStatusError> {
        Ok(self
            .certs
            .read()
            .values()
            .filter(|c| c.status == status)
            .cloned()
            .collect())
    }

    fn save(&self, certificate: &Certificate) -> Result<(), CertStatusError> {
        self.certs.write().insert(
            normalize_serial(&certificate.serial_number),
            certificate.clone(),
        );
        Ok(())
    }
}
