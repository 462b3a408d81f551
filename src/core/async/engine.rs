//! Payment processing orchestration for async batch processing
//!
//! This module provides the `AsyncFeeEngine` struct, which processes payment
//! records against a shared, read-only `SchoolRegistry` and a thread-safe
//! `AsyncFeeLedger`.
//!
//! # Architecture
//!
//! ```text
//! AsyncFeeEngine
//!     ├── Arc<SchoolRegistry>  (read-only reference tables)
//!     ├── Arc<AsyncFeeLedger>  (thread-safe payments and totals)
//!     └── PaymentRules         (default policy, overpayment handling)
//! ```
//!
//! Validation and allocation are the same functions the synchronous engine
//! uses; only the storage differs.
//!
//! # Thread Safety
//!
//! The engine is cloneable and can be shared across tasks. Records of one
//! student must be processed in order by a single task; records of
//! different students may run concurrently.

use std::sync::Arc;

use super::AsyncFeeLedger;
use crate::config::PaymentRules;
use crate::core::engine::{check_delete, plan_edited_payment, plan_new_payment};
use crate::core::registry::SchoolRegistry;
use crate::types::{FeePayment, PaymentAction, PaymentAllocation, PaymentRecord, SchoolError};
use tracing::debug;

/// Payment processing orchestrator for async batch processing
#[derive(Debug, Clone)]
pub struct AsyncFeeEngine {
    registry: Arc<SchoolRegistry>,
    ledger: Arc<AsyncFeeLedger>,
    rules: PaymentRules,
}

impl AsyncFeeEngine {
    /// Create a new AsyncFeeEngine
    ///
    /// # Arguments
    ///
    /// * `registry` - Shared school reference tables
    /// * `ledger` - Shared concurrent ledger
    /// * `rules` - Default policy and overpayment handling
    pub fn new(
        registry: Arc<SchoolRegistry>,
        ledger: Arc<AsyncFeeLedger>,
        rules: PaymentRules,
    ) -> Self {
        Self {
            registry,
            ledger,
            rules,
        }
    }

    /// Process a single payment record
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the record was applied
    /// * `Err(SchoolError)` - If it was rejected; the ledger is unchanged
    pub fn process_record(&self, record: PaymentRecord) -> Result<(), SchoolError> {
        match record.action {
            PaymentAction::Record => self.record_payment(&record).map(|_| ()),
            PaymentAction::Edit => self.edit_payment(&record).map(|_| ()),
            PaymentAction::Delete => self.delete_payment(&record).map(|_| ()),
        }
    }

    /// Record a new payment
    pub fn record_payment(&self, record: &PaymentRecord) -> Result<PaymentAllocation, SchoolError> {
        let (payment, allocation) =
            plan_new_payment(&self.registry, self.ledger.as_ref(), self.rules, record)?;
        self.ledger.insert(payment, allocation.clone())?;
        Ok(allocation)
    }

    /// Change an existing payment and recalculate its allocation
    pub fn edit_payment(&self, record: &PaymentRecord) -> Result<PaymentAllocation, SchoolError> {
        let (payment, allocation) =
            plan_edited_payment(&self.registry, self.ledger.as_ref(), self.rules, record)?;
        self.ledger.replace(payment, allocation.clone())?;
        Ok(allocation)
    }

    /// Remove a payment and its allocation
    pub fn delete_payment(&self, record: &PaymentRecord) -> Result<FeePayment, SchoolError> {
        check_delete(self.ledger.as_ref(), record)?;
        let (payment, _) = self
            .ledger
            .remove(record.payment)
            .ok_or_else(|| SchoolError::payment_not_found(record.payment, "delete"))?;
        debug!(payment = payment.id, student = payment.student_id, "payment deleted");
        Ok(payment)
    }

    pub fn registry(&self) -> &SchoolRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &AsyncFeeLedger {
        &self.ledger
    }
}
