//! Worker pool for running batch validations off the caller's thread.

use crate::config::EngineConfig;
use crate::engine::{BatchOutcome, ValidationEngine};
use crate::model::Certificate;
use crate::repository::CertificateRepository;
use crate::revocation::RevocationSource;
use crate::CertStatusError;
use std::sync::mpsc;
use std::sync::Arc;
use tracing::error;

/// Pending result of a submitted batch.
#[derive(Debug)]
pub struct BatchHandle {
    rx: mpsc::Receiver<BatchOutcome>,
}

impl BatchHandle {
    /// Block until the batch finishes. `None` if the worker panicked.
    pub fn wait(self) -> Option<BatchOutcome> {
        self.rx.recv().ok()
    }
}

/// A named rayon pool. Batches submitted here also run their per-certificate
/// work on this pool.
pub struct ValidationPool {
    pool: rayon::ThreadPool,
}

impl ValidationPool {
    /// `threads == 0` sizes the pool to the number of CPUs.
    pub fn new(threads: usize) -> Result<Self, CertStatusError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("certstatus-worker-{}", i))
            .panic_handler(|_| error!("Validation worker panicked"))
            .build()
            .map_err(|e| CertStatusError::Config(format!("worker pool: {}", e)))?;
        Ok(Self { pool })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, CertStatusError> {
        Self::new(config.worker_threads)
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Validate `certificates` in the background.
    pub fn submit<R, S>(
        &self,
        engine: Arc<ValidationEngine<R, S>>,
        certificates: Vec<Certificate>,
    ) -> BatchHandle
    where
        R: CertificateRepository + 'static,
        S: RevocationSource + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.pool.spawn(move || {
            let outcome = engine.validate_batch(&certificates);
            let _ = tx.send(outcome);
        });
        BatchHandle { rx }
    }

    /// Validate every `UNKNOWN` certificate in the background.
    pub fn submit_unknown<R, S>(&self, engine: Arc<ValidationEngine<R, S>>) -> BatchHandle
    where
        R: CertificateRepository + 'static,
        S: RevocationSource + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.pool.spawn(move || {
            let outcome = engine.validate_all_unknown();
            let _ = tx.send(outcome);
        });
        BatchHandle { rx }
    }
}

impl std::fmt::Debug for ValidationPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationPool")
            .field("threads", &self.num_threads())
            .finish()
    }
}
