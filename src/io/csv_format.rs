//! CSV format handling for payment batches and balance output
//!
//! This module centralizes all CSV format concerns, providing:
//! - `PaymentCsvRecord` structure for deserialization
//! - Conversion from CSV rows to `PaymentRecord`
//! - Balance output serialization
//!
//! # Payment batch format
//!
//! ```text
//! action,payment,student,year,amount,date,mode,policy,notes
//! record,1,1,,7000.00,2024-05-02,cash,standard,
//! record,2,1,1,1500.00,2024-05-02,cash,standard,arrears
//! edit,1,1,,6500.00,,,,
//! delete,1,1,,,,,,
//! ```
//!
//! Only `payment` and `student` are required columns. A missing or empty
//! `action` means `record`, and a missing `year` means the student's current
//! academic year. Amounts carry at most two decimal places.

use crate::core::balance::StudentBalance;
use crate::types::{
    AcademicYearId, AllocationPolicy, PaymentAction, PaymentId, PaymentMode, PaymentRecord,
    SchoolError, StudentId,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Date format used in every CSV file
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of a payment batch file
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct PaymentCsvRecord {
    #[serde(default)]
    pub action: Option<String>,
    pub payment: PaymentId,
    pub student: StudentId,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", raw.trim()))
}

/// Convert a CSV row into a `PaymentRecord`
///
/// # Returns
///
/// * `Ok(PaymentRecord)` - Successfully converted record
/// * `Err(String)` - Description of the conversion failure
///
/// # Errors
///
/// - Unknown action, payment mode or allocation policy
/// - Malformed academic year, amount or date
/// - An amount with more than two decimal places
/// - A `record` row without an amount
pub fn convert_payment_record(csv_record: PaymentCsvRecord) -> Result<PaymentRecord, String> {
    let action = match non_empty(&csv_record.action).map(str::to_lowercase).as_deref() {
        None | Some("record") | Some("payment") => PaymentAction::Record,
        Some("edit") => PaymentAction::Edit,
        Some("delete") => PaymentAction::Delete,
        Some(other) => {
            return Err(format!(
                "Invalid action: '{}' for payment {}",
                other, csv_record.payment
            ))
        }
    };

    let academic_year = non_empty(&csv_record.year)
        .map(|raw| {
            raw.parse::<AcademicYearId>().map_err(|_| {
                format!("Invalid academic year '{}' for payment {}", raw, csv_record.payment)
            })
        })
        .transpose()?;

    let amount = match non_empty(&csv_record.amount) {
        Some(raw) => {
            let amount = Decimal::from_str(raw).map_err(|_| {
                format!("Invalid amount '{}' for payment {}", raw, csv_record.payment)
            })?;
            if amount.normalize().scale() > 2 {
                return Err(format!(
                    "Invalid amount '{}' for payment {}: more than two decimal places",
                    raw, csv_record.payment
                ));
            }
            Some(amount)
        }
        None => None,
    };
    if action == PaymentAction::Record && amount.is_none() {
        return Err(format!(
            "{} for payment {} of student {} requires an amount",
            action, csv_record.payment, csv_record.student
        ));
    }

    let date = non_empty(&csv_record.date).map(parse_date).transpose()?;
    let mode = non_empty(&csv_record.mode)
        .map(PaymentMode::from_str)
        .transpose()?;
    let policy = non_empty(&csv_record.policy)
        .map(AllocationPolicy::from_str)
        .transpose()?;

    Ok(PaymentRecord {
        action,
        payment: csv_record.payment,
        student: csv_record.student,
        academic_year,
        amount,
        date,
        mode,
        policy,
        notes: non_empty(&csv_record.notes).map(str::to_string),
    })
}

fn write_error(e: impl std::fmt::Display) -> SchoolError {
    SchoolError::IoError {
        message: format!("Failed to write balances: {}", e),
    }
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Write balances in CSV format
///
/// Columns: student, admission_number, bus_due, school_due, bus_paid,
/// school_paid, outstanding. Rows are sorted by student ID; amounts have
/// two decimal places.
pub fn write_balances_csv(
    balances: &[StudentBalance],
    output: &mut dyn Write,
) -> Result<(), SchoolError> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record([
            "student",
            "admission_number",
            "bus_due",
            "school_due",
            "bus_paid",
            "school_paid",
            "outstanding",
        ])
        .map_err(write_error)?;

    let mut sorted: Vec<&StudentBalance> = balances.iter().collect();
    sorted.sort_by_key(|b| b.student_id);

    for balance in sorted {
        writer
            .write_record(&[
                balance.student_id.to_string(),
                balance.admission_number.clone(),
                money(balance.due.bus),
                money(balance.due.school),
                money(balance.paid.bus),
                money(balance.paid.school),
                money(balance.outstanding()),
            ])
            .map_err(write_error)?;
    }

    writer.flush().map_err(write_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocation::Buckets;
    use rstest::rstest;

    fn row(action: Option<&str>, amount: Option<&str>) -> PaymentCsvRecord {
        PaymentCsvRecord {
            action: action.map(str::to_string),
            payment: 10,
            student: 2,
            amount: amount.map(str::to_string),
            ..PaymentCsvRecord::default()
        }
    }

    #[rstest]
    #[case::default_action(None, Some("100"), PaymentAction::Record)]
    #[case::empty_action(Some(" "), Some("100"), PaymentAction::Record)]
    #[case::record(Some("RECORD"), Some("100"), PaymentAction::Record)]
    #[case::edit_without_amount(Some("edit"), None, PaymentAction::Edit)]
    #[case::delete(Some("Delete"), None, PaymentAction::Delete)]
    fn test_convert_actions(
        #[case] action: Option<&str>,
        #[case] amount: Option<&str>,
        #[case] expected: PaymentAction,
    ) {
        let record = convert_payment_record(row(action, amount)).unwrap();
        assert_eq!(record.action, expected);
        assert_eq!(record.payment, 10);
        assert_eq!(record.student, 2);
    }

    #[test]
    fn test_convert_optional_fields() {
        let csv_record = PaymentCsvRecord {
            date: Some("2024-06-01".to_string()),
            mode: Some("Bank Transfer".to_string()),
            policy: Some("proportional".to_string()),
            notes: Some("  June instalment ".to_string()),
            ..row(None, Some(" 1250.50 "))
        };

        let record = convert_payment_record(csv_record).unwrap();
        assert_eq!(record.amount, Some(Decimal::new(125050, 2)));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(record.mode, Some(PaymentMode::BankTransfer));
        assert_eq!(record.policy, Some(AllocationPolicy::Proportional));
        assert_eq!(record.notes.as_deref(), Some("June instalment"));
        assert_eq!(record.academic_year, None);
    }

    #[rstest]
    #[case::trailing_zeros("100.500", "100.5")]
    #[case::two_places("0.99", "0.99")]
    #[case::whole("250", "250")]
    fn test_convert_accepts_cent_amounts(#[case] raw: &str, #[case] expected: &str) {
        let record = convert_payment_record(row(None, Some(raw))).unwrap();
        assert_eq!(record.amount, Some(Decimal::from_str(expected).unwrap()));
    }

    #[test]
    fn test_convert_arrears_year() {
        let csv_record = PaymentCsvRecord {
            year: Some(" 1 ".to_string()),
            ..row(None, Some("1500"))
        };
        let record = convert_payment_record(csv_record).unwrap();
        assert_eq!(record.academic_year, Some(1));
    }

    #[rstest]
    #[case::invalid_action(row(Some("refund"), Some("1")), "Invalid action")]
    #[case::record_missing_amount(row(None, None), "requires an amount")]
    #[case::record_blank_amount(row(None, Some("  ")), "requires an amount")]
    #[case::invalid_amount(row(None, Some("ten")), "Invalid amount")]
    #[case::sub_cent_amount(row(None, Some("100.005")), "more than two decimal places")]
    #[case::invalid_year(PaymentCsvRecord { year: Some("2024-25".to_string()), ..row(None, Some("1")) }, "Invalid academic year")]
    #[case::invalid_date(PaymentCsvRecord { date: Some("01/06/2024".to_string()), ..row(None, Some("1")) }, "Invalid date")]
    #[case::invalid_mode(PaymentCsvRecord { mode: Some("barter".to_string()), ..row(None, Some("1")) }, "Invalid payment mode")]
    #[case::invalid_policy(PaymentCsvRecord { policy: Some("greedy".to_string()), ..row(None, Some("1")) }, "Invalid allocation policy")]
    fn test_convert_errors(#[case] csv_record: PaymentCsvRecord, #[case] expected: &str) {
        let err = convert_payment_record(csv_record).unwrap_err();
        assert!(err.contains(expected), "got: {}", err);
    }

    fn balance(student: u32, due: (&str, &str), paid: (&str, &str)) -> StudentBalance {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        StudentBalance {
            student_id: student,
            admission_number: format!("ADM-{:03}", student),
            academic_year_id: 1,
            due: Buckets::new(d(due.0), d(due.1)),
            paid: Buckets::new(d(paid.0), d(paid.1)),
        }
    }

    #[rstest]
    #[case::empty(vec![], "student,admission_number,bus_due,school_due,bus_paid,school_paid,outstanding\n")]
    #[case::sorted_and_padded(
        vec![
            balance(2, ("0", "14400"), ("0", "5000")),
            balance(1, ("6000", "14000"), ("6000", "1000.5")),
        ],
        "student,admission_number,bus_due,school_due,bus_paid,school_paid,outstanding\n\
         1,ADM-001,6000.00,14000.00,6000.00,1000.50,12999.50\n\
         2,ADM-002,0.00,14400.00,0.00,5000.00,9400.00\n"
    )]
    #[case::overpaid_bucket_clamped(
        vec![balance(3, ("100", "100"), ("150", "0"))],
        "student,admission_number,bus_due,school_due,bus_paid,school_paid,outstanding\n\
         3,ADM-003,100.00,100.00,150.00,0.00,100.00\n"
    )]
    fn test_write_balances_csv(#[case] balances: Vec<StudentBalance>, #[case] expected: &str) {
        let mut output = Vec::new();
        write_balances_csv(&balances, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }
}
