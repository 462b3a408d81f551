//! Fee payment engine
//!
//! This module provides the `FeeEngine` that records, edits and deletes fee
//! payments against a `SchoolRegistry`, storing each payment together with
//! its split across the bus and school buckets in a `FeeLedger`.
//!
//! The engine enforces business rules such as:
//! - Payments are only taken for existing, active students
//! - A payment goes to the student's current year unless the record names an
//!   earlier year the student was enrolled in (arrears)
//! - Amounts are positive and receipt IDs are unique
//! - A payment never exceeds what the student owes, unless overpayment is
//!   allowed, in which case the excess is credited to the school bucket
//! - Editing a payment recalculates its allocation against the outstanding
//!   balance without its own previous allocation
//!
//! The planning functions at the bottom of this module are shared with the
//! asynchronous engine, so both apply identical rules.

use crate::config::PaymentRules;
use crate::core::allocation::{allocate, Buckets};
use crate::core::balance::{self, StudentBalance};
use crate::core::ledger::FeeLedger;
use crate::core::registry::SchoolRegistry;
use crate::core::traits::PaymentLedger;
use crate::types::{
    AcademicYearId, FeePayment, PaymentAction, PaymentAllocation, PaymentMode, PaymentRecord,
    SchoolError, Student, StudentId,
};
use rust_decimal::Decimal;
use tracing::debug;

/// Synchronous fee payment engine
///
/// Owns the registry and the ledger for the duration of a batch; use
/// [`FeeEngine::into_parts`] to get them back for saving.
#[derive(Debug, Clone, Default)]
pub struct FeeEngine {
    registry: SchoolRegistry,
    ledger: FeeLedger,
    rules: PaymentRules,
}

impl FeeEngine {
    /// Create an engine over existing records
    ///
    /// # Arguments
    ///
    /// * `registry` - School reference tables
    /// * `ledger` - Previously recorded payments
    /// * `rules` - Default policy and overpayment handling
    pub fn new(registry: SchoolRegistry, ledger: FeeLedger, rules: PaymentRules) -> Self {
        Self {
            registry,
            ledger,
            rules,
        }
    }

    /// Process a single payment record
    ///
    /// Routes the record to the handler for its action.
    ///
    /// # Errors
    ///
    /// Returns the error of the handler; the ledger is unchanged on error.
    pub fn process(&mut self, record: PaymentRecord) -> Result<(), SchoolError> {
        match record.action {
            PaymentAction::Record => self.record_payment(record).map(|_| ()),
            PaymentAction::Edit => self.edit_payment(record).map(|_| ()),
            PaymentAction::Delete => self.delete_payment(record).map(|_| ()),
        }
    }

    /// Record a new payment and allocate it
    ///
    /// # Returns
    ///
    /// The allocation stored for the payment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is missing, zero or negative
    /// - The receipt ID is already used
    /// - The student does not exist or is not active
    /// - The requested academic year does not exist or the student was not
    ///   enrolled in it
    /// - The amount exceeds the outstanding balance and overpayment is not allowed
    pub fn record_payment(
        &mut self,
        record: PaymentRecord,
    ) -> Result<PaymentAllocation, SchoolError> {
        let (payment, allocation) =
            plan_new_payment(&self.registry, &self.ledger, self.rules, &record)?;
        self.ledger.insert(payment, allocation.clone())?;
        Ok(allocation)
    }

    /// Change an existing payment and recalculate its allocation
    ///
    /// Fields missing from the record keep their stored values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payment does not exist or belongs to another student
    /// - The new amount is zero or negative
    /// - The new amount exceeds the outstanding balance and overpayment is not allowed
    pub fn edit_payment(
        &mut self,
        record: PaymentRecord,
    ) -> Result<PaymentAllocation, SchoolError> {
        let (payment, allocation) =
            plan_edited_payment(&self.registry, &self.ledger, self.rules, &record)?;
        self.ledger.replace(payment, allocation.clone())?;
        Ok(allocation)
    }

    /// Remove a payment and its allocation
    ///
    /// # Errors
    ///
    /// Returns an error if the payment does not exist or belongs to another
    /// student.
    pub fn delete_payment(&mut self, record: PaymentRecord) -> Result<FeePayment, SchoolError> {
        check_delete(&self.ledger, &record)?;
        let (payment, _) = self
            .ledger
            .remove(record.payment)
            .ok_or_else(|| SchoolError::payment_not_found(record.payment, "delete"))?;
        debug!(payment = payment.id, student = payment.student_id, "payment deleted");
        Ok(payment)
    }

    /// Balance of one student for `year`, or the student's own year
    pub fn statement(
        &self,
        student: StudentId,
        year: Option<AcademicYearId>,
    ) -> Result<StudentBalance, SchoolError> {
        let student = self.registry.require_student(student)?;
        let year = year.unwrap_or(student.academic_year_id);
        balance::student_balance(&self.registry, &self.ledger, student, year)
    }

    /// Balances of all students enrolled in `year`, or the current year
    pub fn balances(
        &self,
        year: Option<AcademicYearId>,
    ) -> Result<Vec<StudentBalance>, SchoolError> {
        let year = resolve_year(&self.registry, year)?;
        balance::year_balances(&self.registry, &self.ledger, year)
    }

    /// Remove a student who has no recorded payments
    pub fn remove_student(&mut self, id: StudentId) -> Result<Student, SchoolError> {
        if self.ledger.has_payments(id) {
            return Err(SchoolError::in_use("Student", id, "fee_payments"));
        }
        self.registry.remove_student(id)
    }

    pub fn registry(&self) -> &SchoolRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &FeeLedger {
        &self.ledger
    }

    /// Hand back the registry and ledger
    pub fn into_parts(self) -> (SchoolRegistry, FeeLedger) {
        (self.registry, self.ledger)
    }
}

/// The requested year, or the registry's current year
pub fn resolve_year(
    registry: &SchoolRegistry,
    year: Option<AcademicYearId>,
) -> Result<AcademicYearId, SchoolError> {
    match year {
        Some(year) => Ok(registry.require_year(year)?.id),
        None => registry
            .current_year()
            .map(|y| y.id)
            .ok_or_else(|| SchoolError::validation("academic year", "no current academic year")),
    }
}

fn positive_amount(amount: Decimal, record: &PaymentRecord) -> Result<Decimal, SchoolError> {
    if amount <= Decimal::ZERO {
        return Err(SchoolError::invalid_amount(amount, record.payment));
    }
    Ok(amount)
}

/// Split `amount` against what is still owed, applying the overpayment rule
fn allocate_against(
    registry: &SchoolRegistry,
    rules: PaymentRules,
    student: &Student,
    year: AcademicYearId,
    paid: Buckets,
    payment: &FeePayment,
) -> Result<PaymentAllocation, SchoolError> {
    let dues = balance::student_dues(registry, student, year)?;
    let outstanding = dues.due.saturating_sub(paid);
    let split = allocate(payment.amount, outstanding, dues.monthly, payment.policy);

    let mut school = split.school;
    if split.excess > Decimal::ZERO {
        if !rules.allow_overpayment {
            return Err(SchoolError::overpayment(
                student.id,
                payment.amount,
                outstanding.total(),
            ));
        }
        school = school
            .checked_add(split.excess)
            .ok_or_else(|| SchoolError::arithmetic_overflow("allocation", student.id))?;
    }

    debug!(
        payment = payment.id,
        student = student.id,
        policy = %payment.policy,
        bus = %split.bus,
        school = %school,
        excess = %split.excess,
        "payment allocated"
    );

    Ok(PaymentAllocation {
        payment_id: payment.id,
        student_id: student.id,
        academic_year_id: year,
        bus_amount: split.bus,
        school_amount: school,
        policy: payment.policy,
    })
}

/// The year a payment applies to: the requested one, or the student's own
fn payment_year(
    registry: &SchoolRegistry,
    student: &Student,
    requested: Option<AcademicYearId>,
) -> Result<AcademicYearId, SchoolError> {
    let year = match requested {
        Some(year) => registry.require_year(year)?.id,
        None => return Ok(student.academic_year_id),
    };
    if !registry.was_enrolled(student, year) {
        return Err(SchoolError::validation(
            "payment",
            format!(
                "student {} was not enrolled in academic year {}",
                student.id, year
            ),
        ));
    }
    Ok(year)
}

/// Validate a `record` action and compute the payment it would store
pub(crate) fn plan_new_payment(
    registry: &SchoolRegistry,
    ledger: &impl PaymentLedger,
    rules: PaymentRules,
    record: &PaymentRecord,
) -> Result<(FeePayment, PaymentAllocation), SchoolError> {
    let amount = record
        .amount
        .ok_or_else(|| SchoolError::missing_amount("record", record.payment))?;
    let amount = positive_amount(amount, record)?;

    if ledger.payment(record.payment).is_some() {
        return Err(SchoolError::duplicate_payment(record.payment, record.student));
    }

    let student = registry.require_student(record.student)?;
    if !student.is_active() {
        return Err(SchoolError::student_not_active(student.id, student.status));
    }

    let year = payment_year(registry, student, record.academic_year)?;
    let payment = FeePayment {
        id: record.payment,
        student_id: student.id,
        academic_year_id: year,
        amount,
        payment_date: record
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
        mode: record.mode.unwrap_or(PaymentMode::Cash),
        policy: record.policy.unwrap_or(rules.default_policy),
        notes: record.notes.clone(),
    };

    let paid = ledger.paid(student.id, year);
    let allocation = allocate_against(registry, rules, student, year, paid, &payment)?;
    Ok((payment, allocation))
}

/// Validate an `edit` action and compute the replacement payment
pub(crate) fn plan_edited_payment(
    registry: &SchoolRegistry,
    ledger: &impl PaymentLedger,
    rules: PaymentRules,
    record: &PaymentRecord,
) -> Result<(FeePayment, PaymentAllocation), SchoolError> {
    let existing = ledger
        .payment(record.payment)
        .ok_or_else(|| SchoolError::payment_not_found(record.payment, "edit"))?;
    if existing.student_id != record.student {
        return Err(SchoolError::student_mismatch(
            record.payment,
            existing.student_id,
            record.student,
            "edit",
        ));
    }

    let amount = positive_amount(record.amount.unwrap_or(existing.amount), record)?;
    let student = registry.require_student(existing.student_id)?;
    let year = match record.academic_year {
        Some(_) => payment_year(registry, student, record.academic_year)?,
        None => existing.academic_year_id,
    };

    let payment = FeePayment {
        academic_year_id: year,
        amount,
        payment_date: record.date.unwrap_or(existing.payment_date),
        mode: record.mode.unwrap_or(existing.mode),
        policy: record.policy.unwrap_or(existing.policy),
        notes: record.notes.clone().or(existing.notes),
        ..existing
    };

    // Outstanding as if this payment had never been made
    let mut paid = ledger.paid(student.id, year);
    if let Some(previous) = ledger
        .allocation(payment.id)
        .filter(|a| a.academic_year_id == year)
    {
        paid = paid.saturating_sub(Buckets::new(previous.bus_amount, previous.school_amount));
    }

    let allocation = allocate_against(registry, rules, student, year, paid, &payment)?;
    Ok((payment, allocation))
}

/// Validate a `delete` action
pub(crate) fn check_delete(
    ledger: &impl PaymentLedger,
    record: &PaymentRecord,
) -> Result<(), SchoolError> {
    let existing = ledger
        .payment(record.payment)
        .ok_or_else(|| SchoolError::payment_not_found(record.payment, "delete"))?;
    if existing.student_id != record.student {
        return Err(SchoolError::student_mismatch(
            record.payment,
            existing.student_id,
            record.student,
            "delete",
        ));
    }
    Ok(())
}
