//! Payment-related types
//!
//! This module defines fee payments, their split across the bus and school
//! fee buckets, and the batch records used to record, edit or delete them.

use super::school::{AcademicYearId, StudentId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment identifier (receipt number)
///
/// Supports receipt numbers from 0 to 4,294,967,295
pub type PaymentId = u32;

/// How the money was handed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Upi,
    Card,
    Cheque,
    BankTransfer,
}

impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "upi" => Ok(PaymentMode::Upi),
            "card" => Ok(PaymentMode::Card),
            "cheque" | "check" => Ok(PaymentMode::Cheque),
            "bank_transfer" | "bank" | "neft" => Ok(PaymentMode::BankTransfer),
            other => Err(format!("Invalid payment mode: '{}'", other)),
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
            PaymentMode::Card => "card",
            PaymentMode::Cheque => "cheque",
            PaymentMode::BankTransfer => "bank_transfer",
        };
        f.write_str(s)
    }
}

/// Policy for splitting one payment between the bus and school buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationPolicy {
    /// Bus balance first, remainder to school
    #[default]
    Standard,
    /// Half to each bucket, overflow moved to the other bucket
    Equal,
    /// Split by the ratio of the buckets' recurring monthly charges
    Proportional,
}

impl FromStr for AllocationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(AllocationPolicy::Standard),
            "equal" => Ok(AllocationPolicy::Equal),
            "proportional" => Ok(AllocationPolicy::Proportional),
            other => Err(format!("Invalid allocation policy: '{}'", other)),
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AllocationPolicy::Standard => "standard",
            AllocationPolicy::Equal => "equal",
            AllocationPolicy::Proportional => "proportional",
        };
        f.write_str(s)
    }
}

/// A recorded fee payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeePayment {
    pub id: PaymentId,
    pub student_id: StudentId,
    pub academic_year_id: AcademicYearId,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub mode: PaymentMode,
    pub policy: AllocationPolicy,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The split of a payment across the two fee buckets
///
/// `bus_amount + school_amount` always equals the payment amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub payment_id: PaymentId,
    pub student_id: StudentId,
    pub academic_year_id: AcademicYearId,
    pub bus_amount: Decimal,
    pub school_amount: Decimal,
    pub policy: AllocationPolicy,
}

/// What a batch row asks the ledger to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentAction {
    /// Record a new payment
    Record,
    /// Change an existing payment and recalculate its allocation
    Edit,
    /// Remove a payment and its allocation
    Delete,
}

impl fmt::Display for PaymentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentAction::Record => "record",
            PaymentAction::Edit => "edit",
            PaymentAction::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// One payment instruction, as read from a batch file
///
/// Optional fields fall back to the student's current academic year, today's
/// date, cash and the configured default policy. For edits, missing fields
/// keep the payment's existing values. An explicit `academic_year` pays the
/// dues of an earlier year the student was enrolled in.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub action: PaymentAction,
    pub payment: PaymentId,
    pub student: StudentId,
    pub academic_year: Option<AcademicYearId>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub mode: Option<PaymentMode>,
    pub policy: Option<AllocationPolicy>,
    pub notes: Option<String>,
}

impl PaymentRecord {
    /// A plain "record" instruction with everything else defaulted
    pub fn record(payment: PaymentId, student: StudentId, amount: Decimal) -> Self {
        Self {
            action: PaymentAction::Record,
            payment,
            student,
            academic_year: None,
            amount: Some(amount),
            date: None,
            mode: None,
            policy: None,
            notes: None,
        }
    }

    pub fn with_policy(mut self, policy: AllocationPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn for_year(mut self, year: AcademicYearId) -> Self {
        self.academic_year = Some(year);
        self
    }
}
