//! Asynchronous batch processing strategy
//!
//! A multi-threaded implementation of the ProcessingStrategy trait. Payment
//! records are read in batches and each batch is partitioned by student.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (student partitioning + tasks)
//!     └── AsyncFeeEngine (thread-safe processing)
//!         ├── Arc<SchoolRegistry> (read-only during the batch)
//!         └── AsyncFeeLedger (DashMap payments and totals)
//! ```
//!
//! # Ordering
//!
//! - Batches are processed one after another, so a student's records keep
//!   their file order even when they span batches
//! - Within a batch, different students run in parallel on the tokio
//!   multi-threaded runtime

use crate::config::PaymentRules;
use crate::core::balance;
use crate::core::engine::resolve_year;
use crate::core::r#async::{AsyncFeeEngine, AsyncFeeLedger, BatchProcessor};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_balances_csv;
use crate::io::snapshot::SchoolSnapshot;
use crate::io::sync_reader::open_file;
use crate::strategy::{BatchSummary, ProcessingStrategy};
use crate::types::SchoolError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Configuration for batch processing
///
/// Controls how records are batched and the number of worker threads for
/// parallel processing within each batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of records per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                default = default.batch_size,
                "invalid batch_size 0, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                default = default.max_concurrent_batches,
                "invalid max_concurrent_batches 0, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    rules: PaymentRules,
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy
    ///
    /// # Arguments
    ///
    /// * `rules` - Payment rules applied to every record
    /// * `config` - BatchConfig with batch_size and max_concurrent_batches
    pub fn new(rules: PaymentRules, config: BatchConfig) -> Self {
        Self { rules, config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Process payments from the input file and write balances
    ///
    /// 1. Creates a tokio multi-threaded runtime
    /// 2. Loads the snapshot ledger into an AsyncFeeLedger
    /// 3. Reads records in batches and waits for each batch before the next
    /// 4. Writes the current year's balances
    /// 5. Converts the ledger back for the returned snapshot
    fn process(
        &self,
        snapshot: SchoolSnapshot,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<SchoolSnapshot, SchoolError> {
        let file = open_file(input_path)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| SchoolError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        let (registry, ledger) = snapshot.into_parts()?;
        let registry = Arc::new(registry);
        let ledger = Arc::new(AsyncFeeLedger::from_ledger(&ledger));
        let engine = Arc::new(AsyncFeeEngine::new(
            Arc::clone(&registry),
            Arc::clone(&ledger),
            self.rules,
        ));
        let processor = BatchProcessor::new(engine);

        let summary = runtime.block_on(async {
            let file = tokio::fs::File::from_std(file);
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut summary = BatchSummary::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for processed in processor.process_batch(batch).await {
                    match processed.result {
                        Ok(()) => summary.applied += 1,
                        Err(e) => {
                            summary.rejected += 1;
                            warn!(
                                payment = processed.record.payment,
                                error = %e,
                                "payment record rejected"
                            );
                        }
                    }
                }
            }

            summary.skipped = reader.skipped();
            summary
        });
        summary.log();

        let year = resolve_year(&registry, None)?;
        let balances = balance::year_balances(&registry, ledger.as_ref(), year)?;
        write_balances_csv(&balances, output)?;

        Ok(SchoolSnapshot::from_parts(&registry, &ledger.to_fee_ledger()?))
    }
}
