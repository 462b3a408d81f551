//! Dues and balances per student and academic year
//!
//! What a student owes for a year is derived from the registry on demand:
//!
//! - **school**: every fee line of the student's class in that year (recurring
//!   lines multiplied by the year's billing months) plus the student's
//!   miscellaneous charges.
//! - **bus**: the monthly bus fee of the student's village times the billing
//!   months, only when the student uses the school bus.
//!
//! What has been paid comes from a [`PaymentLedger`]. Outstanding amounts are
//! clamped at zero per bucket.

use crate::core::allocation::Buckets;
use crate::core::registry::SchoolRegistry;
use crate::core::traits::PaymentLedger;
use crate::types::{AcademicYearId, SchoolError, Student, StudentId};
use rust_decimal::Decimal;
use serde::Serialize;

/// Charges billed to one student for one academic year
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudentDues {
    /// Total billed per bucket
    pub due: Buckets,
    /// Recurring monthly charge per bucket
    pub monthly: Buckets,
}

/// Compute the dues of `student` for `year`
///
/// # Errors
///
/// * `NotFound` if the academic year does not exist
/// * `ArithmeticOverflow` if the sums do not fit a `Decimal`
pub fn student_dues(
    registry: &SchoolRegistry,
    student: &Student,
    year: AcademicYearId,
) -> Result<StudentDues, SchoolError> {
    let academic_year = registry.require_year(year)?;
    let months = Decimal::from(academic_year.billing_months());
    let overflow = || SchoolError::arithmetic_overflow("dues", student.id);

    let mut dues = StudentDues::default();

    let class_id = registry.class_in_year(student, year);
    for line in registry.fee_structures_for(class_id, year) {
        let billed = if line.recurring_monthly {
            dues.monthly.school = dues
                .monthly
                .school
                .checked_add(line.amount)
                .ok_or_else(overflow)?;
            line.amount.checked_mul(months).ok_or_else(overflow)?
        } else {
            line.amount
        };
        dues.due.school = dues.due.school.checked_add(billed).ok_or_else(overflow)?;
    }

    for charge in registry.misc_charges_for(student.id, year) {
        dues.due.school = dues
            .due
            .school
            .checked_add(charge.amount)
            .ok_or_else(overflow)?;
    }

    if student.uses_school_bus {
        if let Some(bus_fee) = student
            .village_id
            .and_then(|village| registry.bus_fee_for(village, year))
        {
            dues.monthly.bus = bus_fee.monthly_fee;
            dues.due.bus = bus_fee.monthly_fee.checked_mul(months).ok_or_else(overflow)?;
        }
    }

    Ok(dues)
}

/// A student's position for one academic year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentBalance {
    pub student_id: StudentId,
    pub admission_number: String,
    pub academic_year_id: AcademicYearId,
    pub due: Buckets,
    pub paid: Buckets,
}

impl StudentBalance {
    /// What is still owed per bucket
    pub fn outstanding_buckets(&self) -> Buckets {
        self.due.saturating_sub(self.paid)
    }

    /// Total still owed across both buckets
    pub fn outstanding(&self) -> Decimal {
        self.outstanding_buckets().total()
    }
}

/// Build the balance of one student for one year
pub fn student_balance(
    registry: &SchoolRegistry,
    ledger: &impl PaymentLedger,
    student: &Student,
    year: AcademicYearId,
) -> Result<StudentBalance, SchoolError> {
    let dues = student_dues(registry, student, year)?;
    Ok(StudentBalance {
        student_id: student.id,
        admission_number: student.admission_number.clone(),
        academic_year_id: year,
        due: dues.due,
        paid: ledger.paid(student.id, year),
    })
}

/// Balances of every student enrolled during `year`, ordered by student ID
pub fn year_balances(
    registry: &SchoolRegistry,
    ledger: &impl PaymentLedger,
    year: AcademicYearId,
) -> Result<Vec<StudentBalance>, SchoolError> {
    registry.require_year(year)?;
    registry
        .students_enrolled_in(year)
        .into_iter()
        .map(|student| student_balance(registry, ledger, student, year))
        .collect()
}
