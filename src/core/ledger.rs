//! Payment ledger
//!
//! This module provides the `FeeLedger` that stores fee payments together
//! with their bus/school allocation, keyed by receipt ID.
//!
//! # Running totals
//!
//! Besides the payments themselves the ledger keeps the allocated amount per
//! (student, academic year), updated on every insert and removal, so looking
//! up what a student has paid does not scan the whole ledger.

use crate::core::allocation::Buckets;
use crate::core::traits::PaymentLedger;
use crate::types::{
    AcademicYearId, FeePayment, PaymentAllocation, PaymentId, SchoolError, StudentId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Flat, serializable form of a ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerTables {
    pub fee_payments: Vec<FeePayment>,
    pub payment_allocation: Vec<PaymentAllocation>,
}

/// Payment storage for the synchronous engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeLedger {
    payments: BTreeMap<PaymentId, FeePayment>,
    allocations: BTreeMap<PaymentId, PaymentAllocation>,
    totals: HashMap<(StudentId, AcademicYearId), Buckets>,
}

impl FeeLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from its flat form
    ///
    /// Payments and allocations without a partner are dropped.
    ///
    /// # Errors
    ///
    /// `ArithmeticOverflow` if a student's running total does not fit a
    /// `Decimal`.
    pub fn from_tables(tables: LedgerTables) -> Result<Self, SchoolError> {
        let mut ledger = Self::new();
        let mut allocations: HashMap<PaymentId, PaymentAllocation> = tables
            .payment_allocation
            .into_iter()
            .map(|a| (a.payment_id, a))
            .collect();

        for payment in tables.fee_payments {
            if let Some(allocation) = allocations.remove(&payment.id) {
                ledger.put(payment, allocation)?;
            }
        }
        Ok(ledger)
    }

    /// Flatten the ledger for serialization
    pub fn to_tables(&self) -> LedgerTables {
        LedgerTables {
            fee_payments: self.payments.values().cloned().collect(),
            payment_allocation: self.allocations.values().cloned().collect(),
        }
    }

    /// Store a new payment with its allocation
    ///
    /// # Errors
    ///
    /// * `DuplicatePayment` if the receipt ID is already taken
    /// * `ArithmeticOverflow` if the student's running total would overflow
    ///
    /// The ledger is left unchanged on error.
    pub fn insert(
        &mut self,
        payment: FeePayment,
        allocation: PaymentAllocation,
    ) -> Result<(), SchoolError> {
        if self.payments.contains_key(&payment.id) {
            return Err(SchoolError::duplicate_payment(payment.id, payment.student_id));
        }
        self.put(payment, allocation)
    }

    /// Replace an existing payment and its allocation
    ///
    /// On error the previous payment stays in place.
    pub fn replace(
        &mut self,
        payment: FeePayment,
        allocation: PaymentAllocation,
    ) -> Result<(), SchoolError> {
        let (previous, previous_allocation) = self
            .remove(payment.id)
            .ok_or_else(|| SchoolError::payment_not_found(payment.id, "edit"))?;
        if let Err(e) = self.put(payment, allocation) {
            self.put(previous, previous_allocation)?;
            return Err(e);
        }
        Ok(())
    }

    /// Remove a payment, returning it with its allocation
    pub fn remove(&mut self, id: PaymentId) -> Option<(FeePayment, PaymentAllocation)> {
        let payment = self.payments.remove(&id)?;
        let allocation = self.allocations.remove(&id)?;
        let key = (allocation.student_id, allocation.academic_year_id);
        if let Some(total) = self.totals.get_mut(&key) {
            *total = Buckets::new(
                total.bus - allocation.bus_amount,
                total.school - allocation.school_amount,
            );
        }
        Some((payment, allocation))
    }

    fn put(
        &mut self,
        payment: FeePayment,
        allocation: PaymentAllocation,
    ) -> Result<(), SchoolError> {
        let key = (allocation.student_id, allocation.academic_year_id);
        let current = self.totals.get(&key).copied().unwrap_or_default();
        self.totals.insert(key, add_allocation(current, &allocation)?);
        self.allocations.insert(payment.id, allocation);
        self.payments.insert(payment.id, payment);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// Allocations ordered by receipt ID
    pub fn allocations(&self) -> impl Iterator<Item = &PaymentAllocation> {
        self.allocations.values()
    }
}

/// Add an allocation to a running total
///
/// Both buckets and their sum must stay within `Decimal` range, so
/// `Buckets::total` on a ledger total cannot overflow.
pub(crate) fn add_allocation(
    total: Buckets,
    allocation: &PaymentAllocation,
) -> Result<Buckets, SchoolError> {
    total
        .checked_add(Buckets::new(allocation.bus_amount, allocation.school_amount))
        .filter(|sum| sum.bus.checked_add(sum.school).is_some())
        .ok_or_else(|| SchoolError::arithmetic_overflow("ledger totals", allocation.student_id))
}

impl PaymentLedger for FeeLedger {
    fn payment(&self, id: PaymentId) -> Option<FeePayment> {
        self.payments.get(&id).cloned()
    }

    fn allocation(&self, id: PaymentId) -> Option<PaymentAllocation> {
        self.allocations.get(&id).cloned()
    }

    fn paid(&self, student: StudentId, year: AcademicYearId) -> Buckets {
        self.totals
            .get(&(student, year))
            .copied()
            .unwrap_or_default()
    }

    fn payments(&self) -> Vec<FeePayment> {
        self.payments.values().cloned().collect()
    }

    fn has_payments(&self, student: StudentId) -> bool {
        self.payments.values().any(|p| p.student_id == student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{date, dec};
    use crate::types::{AllocationPolicy, PaymentMode};
    use rust_decimal::Decimal;

    fn entry(id: PaymentId, student: StudentId, bus: &str, school: &str) -> (FeePayment, PaymentAllocation) {
        let (bus, school) = (dec(bus), dec(school));
        (
            FeePayment {
                id,
                student_id: student,
                academic_year_id: 1,
                amount: bus + school,
                payment_date: date(2024, 5, 1),
                mode: PaymentMode::Cash,
                policy: AllocationPolicy::Standard,
                notes: None,
            },
            PaymentAllocation {
                payment_id: id,
                student_id: student,
                academic_year_id: 1,
                bus_amount: bus,
                school_amount: school,
                policy: AllocationPolicy::Standard,
            },
        )
    }

    #[test]
    fn test_insert_updates_totals() {
        let mut ledger = FeeLedger::new();
        let (p, a) = entry(1, 7, "100", "50");
        ledger.insert(p, a).unwrap();
        let (p, a) = entry(2, 7, "0", "25.25");
        ledger.insert(p, a).unwrap();

        assert_eq!(ledger.paid(7, 1), Buckets::new(dec("100"), dec("75.25")));
        assert_eq!(ledger.paid(7, 2), Buckets::default());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_duplicate_receipt_rejected() {
        let mut ledger = FeeLedger::new();
        let (p, a) = entry(1, 7, "100", "0");
        ledger.insert(p, a).unwrap();
        let (p, a) = entry(1, 8, "10", "0");
        let err = ledger.insert(p, a).unwrap_err();

        assert_eq!(err, SchoolError::duplicate_payment(1, 8));
        assert_eq!(ledger.paid(8, 1), Buckets::default());
    }

    #[test]
    fn test_remove_reverses_totals() {
        let mut ledger = FeeLedger::new();
        let (p, a) = entry(1, 7, "100", "50");
        ledger.insert(p, a).unwrap();

        let (payment, _) = ledger.remove(1).unwrap();
        assert_eq!(payment.id, 1);
        assert_eq!(ledger.paid(7, 1).total(), Decimal::ZERO);
        assert!(ledger.remove(1).is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_replace_requires_existing() {
        let mut ledger = FeeLedger::new();
        let (p, a) = entry(3, 7, "10", "10");
        assert!(ledger.replace(p.clone(), a.clone()).is_err());

        ledger.insert(p, a).unwrap();
        let (p, a) = entry(3, 7, "0", "5");
        ledger.replace(p, a).unwrap();
        assert_eq!(ledger.paid(7, 1), Buckets::new(Decimal::ZERO, dec("5")));
    }

    #[test]
    fn test_tables_round_trip_rebuilds_totals() {
        let mut ledger = FeeLedger::new();
        for (p, a) in [entry(1, 7, "100", "50"), entry(2, 8, "0", "20")] {
            ledger.insert(p, a).unwrap();
        }

        let rebuilt = FeeLedger::from_tables(ledger.to_tables()).unwrap();
        assert_eq!(rebuilt, ledger);
        assert!(rebuilt.has_payments(8));
        assert!(!rebuilt.has_payments(9));
    }

    #[test]
    fn test_overflowing_total_leaves_ledger_unchanged() {
        let mut ledger = FeeLedger::new();
        for (p, a) in [
            entry(1, 7, "0", "40000000000000000000000000000"),
            entry(2, 7, "0", "30000000000000000000000000000"),
        ] {
            ledger.insert(p, a).unwrap();
        }

        let (p, a) = entry(3, 7, "0", "10000000000000000000000000000");
        let err = ledger.insert(p, a).unwrap_err();
        assert_eq!(err, SchoolError::arithmetic_overflow("ledger totals", 7));
        assert_eq!(ledger.len(), 2);

        // each bucket fits, but bus + school would not
        let (p, a) = entry(
            2,
            7,
            "30000000000000000000000000000",
            "10000000000000000000000000000",
        );
        assert!(ledger.replace(p, a).is_err());
        assert_eq!(ledger.payment(2).unwrap().amount, dec("30000000000000000000000000000"));
        assert_eq!(
            ledger.paid(7, 1),
            Buckets::new(Decimal::ZERO, dec("70000000000000000000000000000"))
        );
    }

    #[test]
    fn test_unpaired_rows_are_dropped() {
        let (p1, a1) = entry(1, 7, "10", "0");
        let (p2, _) = entry(2, 7, "20", "0");
        let (_, a3) = entry(3, 8, "30", "0");
        let ledger = FeeLedger::from_tables(LedgerTables {
            fee_payments: vec![p1, p2],
            payment_allocation: vec![a1, a3],
        })
        .unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.paid(7, 1).bus, dec("10"));
        assert!(!ledger.has_payments(8));
    }
}
