//! Read access to recorded payments
//!
//! This module defines the trait abstraction that lets balance computation
//! and payment planning run against both the synchronous ledger (HashMap and
//! BTreeMap) and the asynchronous ledger (DashMap).

use crate::core::allocation::Buckets;
use crate::types::{AcademicYearId, FeePayment, PaymentAllocation, PaymentId, StudentId};

/// Trait for reading recorded payments and their allocations
///
/// Values are returned owned so implementations backed by concurrent maps
/// never hand out guards.
pub trait PaymentLedger {
    /// Get a payment by receipt ID
    fn payment(&self, id: PaymentId) -> Option<FeePayment>;

    /// Get the allocation of a payment
    fn allocation(&self, id: PaymentId) -> Option<PaymentAllocation>;

    /// Total allocated per bucket for a student in an academic year
    fn paid(&self, student: StudentId, year: AcademicYearId) -> Buckets;

    /// All payments ordered by receipt ID
    fn payments(&self) -> Vec<FeePayment>;

    /// Whether any payment was recorded for the student
    fn has_payments(&self, student: StudentId) -> bool {
        self.payments().iter().any(|p| p.student_id == student)
    }
}
