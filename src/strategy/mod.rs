//! Processing strategy module for payment batches
//!
//! This module defines the Strategy pattern for complete payment processing
//! pipelines, covering both CSV parsing and the fee engine. Different
//! implementations (synchronous, asynchronous batch) can be selected at
//! runtime and produce the same balances for the same input.

use crate::cli::StrategyType;
use crate::config::PaymentRules;
use crate::io::snapshot::SchoolSnapshot;
use crate::types::SchoolError;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Counts of what happened to the rows of a payment file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Records applied to the ledger
    pub applied: usize,
    /// Records the engine rejected
    pub rejected: usize,
    /// Rows that could not be parsed
    pub skipped: usize,
}

impl BatchSummary {
    pub(crate) fn log(&self) {
        info!(
            applied = self.applied,
            rejected = self.rejected,
            skipped = self.skipped,
            "payment batch processed"
        );
    }
}

/// Processing strategy trait for complete payment pipelines
///
/// Each strategy reads payment records from a CSV file, applies them to the
/// ledger of the snapshot, and writes the current year's balances to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Process a payment file against a snapshot and write balances
    ///
    /// # Arguments
    ///
    /// * `snapshot` - Registry and ledger the payments apply to
    /// * `input_path` - Path to the payment CSV file
    /// * `output` - Writer for the balances CSV
    ///
    /// # Returns
    ///
    /// The snapshot with the updated ledger, for the caller to save
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened
    /// - There is no current academic year to report balances for
    /// - Output cannot be written
    ///
    /// Rejected or malformed records are logged and counted; they never fail
    /// the batch.
    fn process(
        &self,
        snapshot: SchoolSnapshot,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<SchoolSnapshot, SchoolError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `rules` - Payment rules applied to every record
/// * `config` - Optional configuration for async batch processing (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    rules: PaymentRules,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(rules)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(rules, config))
        }
    }
}
