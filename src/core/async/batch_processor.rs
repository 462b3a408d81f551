//! Batch processing with student-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which processes a batch
//! of payment records concurrently while keeping each student's records in
//! their original order.
//!
//! # Design
//!
//! A student's balance depends on every earlier payment of that student, so
//! the batch is split into one sub-batch per student. Sub-batches run as
//! separate tokio tasks; records inside a sub-batch run sequentially.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── Arc<AsyncFeeEngine>  (shared payment processor)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::AsyncFeeEngine;
use crate::types::{PaymentRecord, SchoolError, StudentId};
use tracing::error;

/// Result of processing a single payment record
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The record that was processed
    pub record: PaymentRecord,

    /// The result of processing (success or error)
    pub result: Result<(), SchoolError>,
}

/// Batch processor with student-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: Arc<AsyncFeeEngine>,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    pub fn new(engine: Arc<AsyncFeeEngine>) -> Self {
        Self { engine }
    }

    /// Partition a batch of records by student ID
    ///
    /// # Guarantees
    ///
    /// - Each record appears in exactly one sub-batch
    /// - Records of each student keep their original order
    pub fn partition_by_student(
        &self,
        batch: Vec<PaymentRecord>,
    ) -> HashMap<StudentId, Vec<PaymentRecord>> {
        let mut student_batches: HashMap<StudentId, Vec<PaymentRecord>> = HashMap::new();

        for record in batch {
            student_batches
                .entry(record.student)
                .or_default()
                .push(record);
        }

        student_batches
    }

    /// Process all records of a single student sequentially
    ///
    /// Errors are captured in the results and do not stop processing.
    /// Results are in the same order as the input records.
    pub async fn process_student_records(
        &self,
        records: Vec<PaymentRecord>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(records.len());

        for record in records {
            let result = self.engine.process_record(record.clone());
            results.push(ProcessingResult { record, result });
        }

        results
    }

    /// Process a batch of records with student-based partitioning
    ///
    /// 1. Partition the batch by student ID
    /// 2. Spawn one tokio task per student
    /// 3. Wait for all tasks and collect their results
    ///
    /// Results of different students may come back in any order.
    pub async fn process_batch(&self, batch: Vec<PaymentRecord>) -> Vec<ProcessingResult> {
        let student_batches = self.partition_by_student(batch);

        let mut tasks = Vec::with_capacity(student_batches.len());
        for (_student, records) in student_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_student_records(records).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(student_results) => results.extend(student_results),
                Err(e) => error!(error = %e, "payment task panicked"),
            }
        }

        results
    }
}
