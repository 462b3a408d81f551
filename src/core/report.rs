//! Year-end report
//!
//! Aggregates one academic year: enrollment by status and class, dues,
//! collections and outstanding per bucket, collections by payment mode,
//! defaulters, and the counts of the transition out of the year when it has
//! run. Reports are stored in the registry settings under
//! `year_end_report:<year id>`.

use crate::core::allocation::Buckets;
use crate::core::balance;
use crate::core::registry::SchoolRegistry;
use crate::core::traits::PaymentLedger;
use crate::types::{AcademicYearId, SchoolError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Counts of the transition out of the reported year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionSummary {
    pub to_year: AcademicYearId,
    pub promoted: u32,
    pub retained: u32,
    pub transferred: u32,
    pub graduated: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearEndReport {
    pub academic_year_id: AcademicYearId,
    pub academic_year: String,
    pub generated_on: NaiveDate,
    pub total_students: usize,
    pub students_by_status: BTreeMap<String, usize>,
    pub students_by_class: BTreeMap<String, usize>,
    pub total_due: Buckets,
    /// Part of the school dues that came from miscellaneous charges
    pub miscellaneous_charges: Decimal,
    pub collected: Buckets,
    pub outstanding: Buckets,
    pub collection_by_mode: BTreeMap<String, Decimal>,
    pub payment_count: usize,
    /// Students with anything left to pay
    pub defaulters: usize,
    pub promotion: Option<PromotionSummary>,
}

/// Settings key a year's report is stored under
pub fn report_key(year: AcademicYearId) -> String {
    format!("year_end_report:{}", year)
}

/// Build the report for `year`
///
/// # Errors
///
/// * `NotFound` if the year does not exist
/// * `ArithmeticOverflow` if a sum does not fit a `Decimal`
pub fn generate_year_end_report(
    registry: &SchoolRegistry,
    ledger: &impl PaymentLedger,
    year: AcademicYearId,
    generated_on: NaiveDate,
) -> Result<YearEndReport, SchoolError> {
    let academic_year = registry.require_year(year)?;
    let students = registry.students_enrolled_in(year);

    let overflow = |student| SchoolError::arithmetic_overflow("year-end report", student);
    let mut students_by_status = BTreeMap::new();
    let mut students_by_class = BTreeMap::new();
    let mut miscellaneous_charges = Decimal::ZERO;
    for student in &students {
        *students_by_status
            .entry(student.status.to_string())
            .or_insert(0) += 1;

        let class_id = registry.class_in_year(student, year);
        let class_name = registry
            .class(class_id)
            .map_or_else(|| format!("class {}", class_id), |c| c.name.clone());
        *students_by_class.entry(class_name).or_insert(0) += 1;

        for charge in registry.misc_charges_for(student.id, year) {
            miscellaneous_charges = miscellaneous_charges
                .checked_add(charge.amount)
                .ok_or_else(|| overflow(student.id))?;
        }
    }

    let mut total_due = Buckets::default();
    let mut collected = Buckets::default();
    let mut outstanding = Buckets::default();
    let mut defaulters = 0;
    for balance in balance::year_balances(registry, ledger, year)? {
        let owed = balance.outstanding_buckets();
        total_due = total_due
            .checked_add(balance.due)
            .ok_or_else(|| overflow(balance.student_id))?;
        collected = collected
            .checked_add(balance.paid)
            .ok_or_else(|| overflow(balance.student_id))?;
        outstanding = outstanding
            .checked_add(owed)
            .ok_or_else(|| overflow(balance.student_id))?;
        if owed.total() > Decimal::ZERO {
            defaulters += 1;
        }
    }

    let mut collection_by_mode = BTreeMap::new();
    let mut payment_count = 0;
    for payment in ledger
        .payments()
        .into_iter()
        .filter(|p| p.academic_year_id == year)
    {
        let collected_by_mode = collection_by_mode
            .entry(payment.mode.to_string())
            .or_insert(Decimal::ZERO);
        *collected_by_mode = collected_by_mode
            .checked_add(payment.amount)
            .ok_or_else(|| overflow(payment.student_id))?;
        payment_count += 1;
    }

    let promotion = registry
        .transitions()
        .find(|t| t.from_year == year)
        .map(|t| PromotionSummary {
            to_year: t.to_year,
            promoted: t.promoted,
            retained: t.retained,
            transferred: t.transferred,
            graduated: t.graduated,
        });

    Ok(YearEndReport {
        academic_year_id: year,
        academic_year: academic_year.name.clone(),
        generated_on,
        total_students: students.len(),
        students_by_status,
        students_by_class,
        total_due,
        miscellaneous_charges,
        collected,
        outstanding,
        collection_by_mode,
        payment_count,
        defaulters,
        promotion,
    })
}

/// Store a report in the registry settings, replacing an earlier one
///
/// # Returns
///
/// The settings key the report was stored under
pub fn store_report(
    registry: &mut SchoolRegistry,
    report: &YearEndReport,
) -> Result<String, SchoolError> {
    let key = report_key(report.academic_year_id);
    registry.put_setting(key.clone(), serde_json::to_value(report)?);
    info!(key = %key, "year-end report stored");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaymentRules;
    use crate::core::engine::FeeEngine;
    use crate::core::fixtures::{date, dec, sample_registry};
    use crate::core::ledger::FeeLedger;
    use crate::core::promotion::{promote_students, PromotionRequest};
    use crate::types::{PaymentMode, PaymentRecord};

    fn engine_with_payments() -> FeeEngine {
        let mut registry = sample_registry();
        registry
            .add_misc_charge(2, 1, 1, dec("600"), Some("Uniform".to_string()), date(2024, 6, 1))
            .unwrap();
        let mut engine = FeeEngine::new(registry, FeeLedger::new(), PaymentRules::default());

        // student 1 settles in full, student 2 pays part by UPI
        engine
            .record_payment(PaymentRecord::record(1, 1, dec("20000")))
            .unwrap();
        engine
            .record_payment(PaymentRecord {
                mode: Some(PaymentMode::Upi),
                ..PaymentRecord::record(2, 2, dec("5000"))
            })
            .unwrap();
        engine
    }

    #[test]
    fn test_report_totals() {
        let engine = engine_with_payments();
        let report =
            generate_year_end_report(engine.registry(), engine.ledger(), 1, date(2025, 3, 31))
                .unwrap();

        assert_eq!(report.academic_year, "2024-25");
        assert_eq!(report.total_students, 3);
        assert_eq!(report.students_by_status["active"], 3);
        assert_eq!(report.students_by_class["Class 2"], 1);

        // school: 14000 + (14400 + 600) + 18000, bus: 6000 + 9600
        assert_eq!(report.total_due, Buckets::new(dec("15600"), dec("47000")));
        assert_eq!(report.miscellaneous_charges, dec("600"));
        assert_eq!(report.collected, Buckets::new(dec("6000"), dec("19000")));
        assert_eq!(report.outstanding, Buckets::new(dec("9600"), dec("28000")));
        assert_eq!(report.collection_by_mode["cash"], dec("20000"));
        assert_eq!(report.collection_by_mode["upi"], dec("5000"));
        assert_eq!(report.payment_count, 2);
        assert_eq!(report.defaulters, 2);
        assert!(report.promotion.is_none());
    }

    #[test]
    fn test_report_after_transition() {
        let engine = engine_with_payments();
        let (mut registry, ledger) = engine.into_parts();
        promote_students(&mut registry, &PromotionRequest::new(1, 2, date(2025, 3, 31)))
            .unwrap();

        let report = generate_year_end_report(&registry, &ledger, 1, date(2025, 4, 1)).unwrap();

        // classes are reported as attended during the year
        assert_eq!(report.students_by_class["Class 1"], 1);
        assert_eq!(report.students_by_status["graduated"], 1);
        assert_eq!(
            report.promotion,
            Some(PromotionSummary {
                to_year: 2,
                promoted: 2,
                retained: 0,
                transferred: 0,
                graduated: 1,
            })
        );
        assert_eq!(report.outstanding, Buckets::new(dec("9600"), dec("28000")));
    }

    #[test]
    fn test_store_report_in_settings() {
        let engine = engine_with_payments();
        let (mut registry, ledger) = engine.into_parts();
        let report = generate_year_end_report(&registry, &ledger, 1, date(2025, 3, 31)).unwrap();

        let key = store_report(&mut registry, &report).unwrap();
        assert_eq!(key, "year_end_report:1");

        let stored = registry.setting(&key).unwrap();
        assert_eq!(stored["payment_count"], 2);
        assert_eq!(stored["academic_year"], "2024-25");
    }

    #[test]
    fn test_report_unknown_year() {
        let registry = sample_registry();
        let err = generate_year_end_report(&registry, &FeeLedger::new(), 5, date(2025, 1, 1))
            .unwrap_err();
        assert_eq!(err, SchoolError::not_found("Academic year", 5));
    }

    #[test]
    fn test_report_sums_that_overflow_are_errors() {
        let mut registry = sample_registry();
        for student in [1, 2] {
            registry
                .add_misc_charge(student, 1, 1, dec("50000000000000000000000000000"), None, date(2024, 6, 1))
                .unwrap();
        }
        let err = generate_year_end_report(&registry, &FeeLedger::new(), 1, date(2025, 3, 31))
            .unwrap_err();
        assert_eq!(err, SchoolError::arithmetic_overflow("year-end report", 2));

        let rules = PaymentRules {
            allow_overpayment: true,
            ..PaymentRules::default()
        };
        let mut engine = FeeEngine::new(sample_registry(), FeeLedger::new(), rules);
        for (payment, student) in [(1, 1), (2, 2)] {
            engine
                .record_payment(PaymentRecord::record(payment, student, dec("50000000000000000000000000000")))
                .unwrap();
        }
        let err = generate_year_end_report(engine.registry(), engine.ledger(), 1, date(2025, 3, 31))
            .unwrap_err();
        assert!(matches!(err, SchoolError::ArithmeticOverflow { .. }));
    }
}
