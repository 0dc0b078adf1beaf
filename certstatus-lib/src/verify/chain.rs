//! Chain reconstruction from issuer-serial references.
//!
//! The walk follows each certificate's stored issuer serial through the
//! inventory until the reference is missing, too short to be meaningful,
//! unresolvable, or leads back to a certificate already on the chain.

use crate::model::Certificate;
use crate::repository::CertificateRepository;
use crate::util::normalize_serial;
use crate::CertStatusError;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Default bound on chain length, leaf included.
pub const MAX_CHAIN_DEPTH: usize = 32;

/// Shorter issuer-serial references are treated as absent.
const MIN_ISSUER_SERIAL_LEN: usize = 6;

/// Certificates from the leaf upward. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    leaf: Certificate,
    issuers: Vec<Certificate>,
    cut_issuer: Option<Certificate>,
}

impl Chain {
    fn new(leaf: Certificate) -> Self {
        Self {
            leaf,
            issuers: Vec::new(),
            cut_issuer: None,
        }
    }

    pub fn leaf(&self) -> &Certificate {
        &self.leaf
    }

    /// Highest certificate reached.
    pub fn tail(&self) -> &Certificate {
        self.issuers.last().unwrap_or(&self.leaf)
    }

    /// The walk ended on a self-signed certificate.
    pub fn is_complete(&self) -> bool {
        self.tail().is_self_signed()
    }

    /// Issuer of the tail when the inventory holds it but the walk stopped
    /// at the cycle guard or the depth bound. Not part of the chain.
    pub fn cut_issuer(&self) -> Option<&Certificate> {
        self.cut_issuer.as_ref()
    }

    /// The tail's issuer is missing from the inventory.
    pub fn is_broken(&self) -> bool {
        !self.is_complete() && self.cut_issuer.is_none()
    }

    pub fn len(&self) -> usize {
        1 + self.issuers.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<&Certificate> {
        match index {
            0 => Some(&self.leaf),
            n => self.issuers.get(n - 1),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        std::iter::once(&self.leaf).chain(self.issuers.iter())
    }

    pub fn serial_numbers(&self) -> Vec<&str> {
        self.iter().map(|c| c.serial_number.as_str()).collect()
    }
}

/// Rebuild the chain above `leaf` using `repository` lookups.
///
/// Repository errors propagate; a lookup miss ends the chain.
pub fn build_chain<R: CertificateRepository + ?Sized>(
    repository: &R,
    leaf: &Certificate,
    max_depth: usize,
) -> Result<Chain, CertStatusError> {
    let mut chain = Chain::new(leaf.clone());
    let mut visited: HashSet<String> = HashSet::from([normalize_serial(&leaf.serial_number)]);

    loop {
        let last = chain.tail();
        let last_serial = last.serial_number.clone();
        let Some(issuer_serial) = last.issuer_serial_number.clone() else {
            break;
        };
        if issuer_serial.chars().count() < MIN_ISSUER_SERIAL_LEN {
            debug!(
                "Ignoring short issuer serial '{}' on {}",
                issuer_serial, last_serial
            );
            break;
        }

        let key = normalize_serial(&issuer_serial);
        if key == normalize_serial(&last_serial) {
            break;
        }
        if visited.contains(&key) {
            warn!(
                "Issuer reference cycle at {} -> {}",
                last_serial, issuer_serial
            );
            chain.cut_issuer = repository.find_by_serial_number(&issuer_serial)?;
            break;
        }
        if chain.len() >= max_depth {
            warn!(
                "Chain for {} exceeds maximum depth of {}",
                leaf.serial_number, max_depth
            );
            chain.cut_issuer = repository.find_by_serial_number(&issuer_serial)?;
            break;
        }

        match repository.find_by_serial_number(&issuer_serial)? {
            Some(issuer) => {
                visited.insert(key);
                chain.issuers.push(issuer);
            }
            None => {
                debug!("Issuer {} not found in inventory", issuer_serial);
                break;
            }
        }
    }

    Ok(chain)
}
