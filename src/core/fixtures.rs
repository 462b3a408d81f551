//! Shared test data for core unit tests

use crate::core::registry::SchoolRegistry;
use crate::types::NewStudent;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A small school with one billed year (2024-25) and an empty follow-up year
///
/// | student | class   | village   | bus | school due | bus due |
/// |---------|---------|-----------|-----|------------|---------|
/// | 1       | Class 1 | Riverside | yes | 14000      | 6000    |
/// | 2       | Class 2 | -         | no  | 14400      | 0       |
/// | 3       | Class 3 | Hilltop   | yes | 18000      | 9600    |
pub fn sample_registry() -> SchoolRegistry {
    let mut r = SchoolRegistry::new();

    r.add_village("Riverside", dec("5"), Some("BUS-1".to_string()))
        .unwrap();
    r.add_village("Hilltop", dec("12.5"), Some("BUS-2".to_string()))
        .unwrap();

    r.add_class("Class 1", 1).unwrap();
    r.add_class("Class 2", 2).unwrap();
    r.add_class("Class 3", 3).unwrap();

    r.add_academic_year("2024-25", date(2024, 4, 1), date(2025, 3, 31))
        .unwrap();
    r.add_academic_year("2025-26", date(2025, 4, 1), date(2026, 3, 31))
        .unwrap();

    r.add_fee_type("Tuition", None).unwrap();
    r.add_fee_type("Admission", Some("One-time admission fee".to_string()))
        .unwrap();

    r.add_fee_structure(1, 1, 1, dec("1000"), true).unwrap();
    r.add_fee_structure(1, 1, 2, dec("2000"), false).unwrap();
    r.add_fee_structure(2, 1, 1, dec("1200"), true).unwrap();
    r.add_fee_structure(3, 1, 1, dec("1500"), true).unwrap();

    r.add_bus_fee(1, 1, dec("500")).unwrap();
    r.add_bus_fee(2, 1, dec("800")).unwrap();

    r.add_charge_category("Uniform", None).unwrap();

    let students = [
        ("ADM-001", "Asha", "Rao", 1, Some(1)),
        ("ADM-002", "Ravi", "Kumar", 2, None),
        ("ADM-003", "Meena", "Das", 3, Some(2)),
    ];
    for (admission, first, last, class_id, village_id) in students {
        r.register_student(NewStudent {
            admission_number: admission.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            class_id,
            village_id,
            uses_school_bus: village_id.is_some(),
            academic_year_id: 1,
            admission_date: date(2024, 4, 1),
            guardian_phone: Some("+91 98450 12345".to_string()),
        })
        .unwrap();
    }

    r
}
