//! Thread-safe payment ledger for async batch processing
//!
//! This module provides the `AsyncFeeLedger` struct, which stores fee payments
//! and their allocations in concurrent maps so students can be processed on
//! different worker threads at the same time.
//!
//! # Design
//!
//! Three `DashMap`s mirror the synchronous `FeeLedger`: payments and
//! allocations keyed by receipt ID, plus running totals keyed by
//! (student, academic year). Receipt uniqueness is enforced atomically
//! through the entry API, so two students racing for the same receipt ID
//! cannot both succeed.
//!
//! # Thread Safety
//!
//! No method holds a guard on one map while locking another.

use crate::core::allocation::Buckets;
use crate::core::ledger::{add_allocation, FeeLedger, LedgerTables};
use crate::core::traits::PaymentLedger;
use crate::types::{
    AcademicYearId, FeePayment, PaymentAllocation, PaymentId, SchoolError, StudentId,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Thread-safe payment storage
#[derive(Debug, Default)]
pub struct AsyncFeeLedger {
    payments: DashMap<PaymentId, FeePayment>,
    allocations: DashMap<PaymentId, PaymentAllocation>,
    totals: DashMap<(StudentId, AcademicYearId), Buckets>,
}

impl AsyncFeeLedger {
    /// Create an empty AsyncFeeLedger
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a concurrent ledger from previously recorded payments
    ///
    /// Only payments stored together with their allocation are copied, the
    /// same pairs `FeeLedger::from_tables` keeps.
    pub fn from_ledger(ledger: &FeeLedger) -> Self {
        let concurrent = Self::new();
        for allocation in ledger.allocations() {
            if let Some(payment) = ledger.payment(allocation.payment_id) {
                // the source ledger already holds checked totals
                let key = (allocation.student_id, allocation.academic_year_id);
                concurrent.totals.insert(key, ledger.paid(key.0, key.1));
                concurrent.allocations.insert(allocation.payment_id, allocation.clone());
                concurrent.payments.insert(payment.id, payment);
            }
        }
        concurrent
    }

    /// Copy the current contents into a synchronous ledger
    pub fn to_fee_ledger(&self) -> Result<FeeLedger, SchoolError> {
        FeeLedger::from_tables(LedgerTables {
            fee_payments: self.payments.iter().map(|e| e.value().clone()).collect(),
            payment_allocation: self.allocations.iter().map(|e| e.value().clone()).collect(),
        })
    }

    /// Store a new payment with its allocation (thread-safe)
    ///
    /// # Errors
    ///
    /// * `DuplicatePayment` if the receipt ID is already taken. When several
    ///   threads insert the same receipt ID, exactly one succeeds.
    /// * `ArithmeticOverflow` if the student's running total would overflow;
    ///   the receipt is released again.
    pub fn insert(
        &self,
        payment: FeePayment,
        allocation: PaymentAllocation,
    ) -> Result<(), SchoolError> {
        let id = payment.id;
        match self.payments.entry(id) {
            Entry::Occupied(_) => {
                return Err(SchoolError::duplicate_payment(
                    payment.id,
                    payment.student_id,
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(payment);
            }
        }
        if let Err(e) = self.add_to_totals(&allocation) {
            self.payments.remove(&id);
            return Err(e);
        }
        self.allocations.insert(id, allocation);
        Ok(())
    }

    /// Replace an existing payment and its allocation
    ///
    /// On error the previous payment stays in place.
    pub fn replace(
        &self,
        payment: FeePayment,
        allocation: PaymentAllocation,
    ) -> Result<(), SchoolError> {
        let id = payment.id;
        if !self.payments.contains_key(&id) {
            return Err(SchoolError::payment_not_found(id, "edit"));
        }
        let previous = self.allocations.remove(&id).map(|(_, a)| a);
        if let Some(previous) = &previous {
            self.subtract_from_totals(previous);
        }
        if let Err(e) = self.add_to_totals(&allocation) {
            if let Some(previous) = previous {
                self.add_to_totals(&previous)?;
                self.allocations.insert(id, previous);
            }
            return Err(e);
        }
        self.payments.insert(id, payment);
        self.allocations.insert(id, allocation);
        Ok(())
    }

    /// Remove a payment, returning it with its allocation
    pub fn remove(&self, id: PaymentId) -> Option<(FeePayment, PaymentAllocation)> {
        let (_, payment) = self.payments.remove(&id)?;
        let (_, allocation) = self.allocations.remove(&id)?;
        self.subtract_from_totals(&allocation);
        Some((payment, allocation))
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    fn add_to_totals(&self, allocation: &PaymentAllocation) -> Result<(), SchoolError> {
        let mut total = self
            .totals
            .entry((allocation.student_id, allocation.academic_year_id))
            .or_default();
        *total = add_allocation(*total, allocation)?;
        Ok(())
    }

    fn subtract_from_totals(&self, allocation: &PaymentAllocation) {
        if let Some(mut total) = self
            .totals
            .get_mut(&(allocation.student_id, allocation.academic_year_id))
        {
            total.bus -= allocation.bus_amount;
            total.school -= allocation.school_amount;
        }
    }
}

impl PaymentLedger for AsyncFeeLedger {
    fn payment(&self, id: PaymentId) -> Option<FeePayment> {
        self.payments.get(&id).map(|p| p.value().clone())
    }

    fn allocation(&self, id: PaymentId) -> Option<PaymentAllocation> {
        self.allocations.get(&id).map(|a| a.value().clone())
    }

    fn paid(&self, student: StudentId, year: AcademicYearId) -> Buckets {
        self.totals
            .get(&(student, year))
            .map(|t| *t.value())
            .unwrap_or_default()
    }

    fn payments(&self) -> Vec<FeePayment> {
        let mut payments: Vec<FeePayment> =
            self.payments.iter().map(|p| p.value().clone()).collect();
        payments.sort_by_key(|p| p.id);
        payments
    }

    fn has_payments(&self, student: StudentId) -> bool {
        self.payments.iter().any(|p| p.student_id == student)
    }
}
