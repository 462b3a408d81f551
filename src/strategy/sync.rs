//! Synchronous processing strategy
//!
//! A single-threaded implementation of the ProcessingStrategy trait. It
//! coordinates the SyncReader (CSV input) and the FeeEngine (business rules).
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Payment rules to `FeeEngine`
//! - CSV output to `csv_format::write_balances_csv`
//!
//! Records are streamed one at a time; memory grows with the ledger, not
//! with the input file.

use crate::config::PaymentRules;
use crate::core::FeeEngine;
use crate::io::csv_format::write_balances_csv;
use crate::io::snapshot::SchoolSnapshot;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{BatchSummary, ProcessingStrategy};
use crate::types::SchoolError;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use school_fees_engine::config::PaymentRules;
/// use school_fees_engine::io::SchoolSnapshot;
/// use school_fees_engine::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(PaymentRules::default());
/// let snapshot = SchoolSnapshot::load(Path::new("school.json")).unwrap();
/// let mut output = io::stdout();
///
/// strategy.process(snapshot, Path::new("payments.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncProcessingStrategy {
    rules: PaymentRules,
}

impl SyncProcessingStrategy {
    pub fn new(rules: PaymentRules) -> Self {
        Self { rules }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Process payments from the input file and write balances
    ///
    /// 1. Opens a SyncReader over the payment file
    /// 2. Builds a FeeEngine from the snapshot
    /// 3. Applies each record in file order
    /// 4. Writes the current year's balances
    fn process(
        &self,
        snapshot: SchoolSnapshot,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<SchoolSnapshot, SchoolError> {
        let reader = SyncReader::new(input_path)?;

        let (registry, ledger) = snapshot.into_parts()?;
        let mut engine = FeeEngine::new(registry, ledger, self.rules);
        let mut summary = BatchSummary::default();

        for result in reader {
            match result {
                Ok(record) => {
                    let payment = record.payment;
                    match engine.process(record) {
                        Ok(()) => summary.applied += 1,
                        Err(e) => {
                            summary.rejected += 1;
                            warn!(payment, error = %e, "payment record rejected");
                        }
                    }
                }
                Err(e) => {
                    summary.skipped += 1;
                    warn!(error = %e, "skipping payment row");
                }
            }
        }
        summary.log();

        write_balances_csv(&engine.balances(None)?, output)?;

        let (registry, ledger) = engine.into_parts();
        Ok(SchoolSnapshot::from_parts(&registry, &ledger))
    }
}
