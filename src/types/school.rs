//! School record types
//!
//! Villages, classes, academic years and students: the reference rows every
//! fee and payment hangs off.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Student identifier
pub type StudentId = u32;

/// Village identifier
pub type VillageId = u32;

/// Class identifier
pub type ClassId = u32;

/// Academic year identifier
pub type AcademicYearId = u32;

/// A catchment area served by the school bus
///
/// The bus fee charged to residents is configured per academic year in
/// [`crate::types::BusFeeStructure`]; the distance is kept for reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Village {
    pub id: VillageId,
    pub name: String,
    /// Distance from the school in kilometres
    pub distance_km: Decimal,
    #[serde(default)]
    pub bus_number: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A class (grade) students are enrolled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    /// Position in the promotion ladder; promotion moves a student to the
    /// class with the next higher order.
    pub grade_order: u32,
}

/// An academic year with its billing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_current: bool,
}

impl AcademicYear {
    /// Number of calendar months touched by the year, counting both ends
    ///
    /// April 1st to March 31st is 12 months; recurring monthly fees are
    /// billed this many times.
    pub fn billing_months(&self) -> u32 {
        if self.end_date < self.start_date {
            return 0;
        }
        let start = self.start_date.year() * 12 + self.start_date.month0() as i32;
        let end = self.end_date.year() * 12 + self.end_date.month0() as i32;
        (end - start + 1) as u32
    }

    /// Whether a date falls inside the year
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Enrollment status of a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    /// Enrolled and billable
    Active,
    /// Temporarily withdrawn; kept on the books but not billable
    Inactive,
    /// Left the school during a transition
    Transferred,
    /// Completed the highest class
    Graduated,
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Transferred => "transferred",
            StudentStatus::Graduated => "graduated",
        };
        f.write_str(s)
    }
}

/// A registered student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    /// School-issued admission number, unique across all students
    pub admission_number: String,
    pub first_name: String,
    pub last_name: String,
    pub class_id: ClassId,
    #[serde(default)]
    pub village_id: Option<VillageId>,
    #[serde(default)]
    pub uses_school_bus: bool,
    /// Academic year the current class assignment belongs to
    pub academic_year_id: AcademicYearId,
    pub status: StudentStatus,
    pub admission_date: NaiveDate,
    #[serde(default)]
    pub guardian_phone: Option<String>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }
}

/// Fields for registering a student; the registry assigns the ID
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub admission_number: String,
    pub first_name: String,
    pub last_name: String,
    pub class_id: ClassId,
    pub village_id: Option<VillageId>,
    pub uses_school_bus: bool,
    pub academic_year_id: AcademicYearId,
    pub admission_date: NaiveDate,
    pub guardian_phone: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn year(start: (i32, u32, u32), end: (i32, u32, u32)) -> AcademicYear {
        AcademicYear {
            id: 1,
            name: "test".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            is_current: false,
        }
    }

    #[rstest]
    #[case::april_to_march((2024, 4, 1), (2025, 3, 31), 12)]
    #[case::june_to_april((2024, 6, 10), (2025, 4, 15), 11)]
    #[case::single_month((2024, 6, 1), (2024, 6, 30), 1)]
    #[case::reversed((2025, 6, 1), (2024, 6, 30), 0)]
    fn test_billing_months(
        #[case] start: (i32, u32, u32),
        #[case] end: (i32, u32, u32),
        #[case] expected: u32,
    ) {
        assert_eq!(year(start, end).billing_months(), expected);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let y = year((2024, 4, 1), (2025, 3, 31));
        assert!(y.contains(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
        assert!(y.contains(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()));
        assert!(!y.contains(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&StudentStatus::Graduated).unwrap();
        assert_eq!(json, "\"graduated\"");
        assert_eq!(StudentStatus::Transferred.to_string(), "transferred");
    }
}
