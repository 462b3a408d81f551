//! Fee configuration types
//!
//! School fee line items are scoped to a class and an academic year, bus fees
//! to a village and an academic year. Miscellaneous charges are one-off
//! amounts billed to a single student.

use super::school::{AcademicYearId, ClassId, StudentId, VillageId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fee type identifier
pub type FeeTypeId = u32;

/// Fee structure line identifier
pub type FeeStructureId = u32;

/// Bus fee structure identifier
pub type BusFeeId = u32;

/// Charge category identifier
pub type CategoryId = u32;

/// Miscellaneous charge identifier
pub type ChargeId = u32;

/// A named kind of school fee (tuition, exam, library, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeType {
    pub id: FeeTypeId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A class-scoped, academic-year-scoped fee line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeStructure {
    pub id: FeeStructureId,
    pub class_id: ClassId,
    pub academic_year_id: AcademicYearId,
    pub fee_type_id: FeeTypeId,
    pub amount: Decimal,
    /// Billed every month of the academic year rather than once
    #[serde(default)]
    pub recurring_monthly: bool,
}

/// Monthly bus fee for residents of a village in an academic year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusFeeStructure {
    pub id: BusFeeId,
    pub village_id: VillageId,
    pub academic_year_id: AcademicYearId,
    pub monthly_fee: Decimal,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A grouping for miscellaneous charges (uniform, field trip, fine, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeCategory {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A one-off charge billed to a single student
///
/// Miscellaneous charges are added to the student's school fee bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiscellaneousCharge {
    pub id: ChargeId,
    pub student_id: StudentId,
    pub academic_year_id: AcademicYearId,
    pub category_id: CategoryId,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    pub charge_date: NaiveDate,
}

fn default_true() -> bool {
    true
}
