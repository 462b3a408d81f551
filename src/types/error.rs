//! Error types for the school fees engine
//!
//! This module defines all error types that can occur while maintaining school
//! records, recording fee payments and running academic-year transitions.
//! Errors are designed to be descriptive and user-friendly for CLI output.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: File not found, permission denied, corrupt snapshots
//! - **CSV Parsing Errors**: Malformed CSV, invalid data types, etc.
//! - **Record Errors**: Invalid names or amounts, unknown or duplicate references
//! - **Payment Errors**: Inactive students, overpayments, unknown receipts
//! - **Promotion Errors**: Repeated or malformed academic-year transitions

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the school fees engine
///
/// Each variant includes relevant context to help diagnose and resolve the
/// issue. Per-record errors in batch flows are logged and skipped; the rest
/// abort the current command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchoolError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// Recoverable in batch flows: the malformed row is skipped.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// The JSON snapshot could not be read or written
    #[error("Snapshot error: {message}")]
    SnapshotError {
        /// Description of the serialization failure
        message: String,
    },

    /// A configuration value is missing or out of range
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfig {
        /// Configuration key
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// A record failed field validation (empty name, negative amount, ...)
    #[error("Invalid {entity}: {message}")]
    Validation {
        /// Kind of record being validated
        entity: String,
        /// Description of the violated rule
        message: String,
    },

    /// A referenced record does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record
        entity: String,
        /// Identifier that was looked up
        id: u32,
    },

    /// A unique key is already taken
    #[error("{entity} '{key}' already exists")]
    Duplicate {
        /// Kind of record
        entity: String,
        /// The conflicting key
        key: String,
    },

    /// A record cannot be removed while other records point at it
    #[error("{entity} {id} is still referenced by {referenced_by}")]
    InUse {
        /// Kind of record being removed
        entity: String,
        /// Identifier of the record being removed
        id: u32,
        /// Table holding the reference
        referenced_by: String,
    },

    /// Payments can only be taken for active students
    #[error("Student {student} is not active ({status})")]
    StudentNotActive {
        /// Student ID
        student: u32,
        /// Current status of the student
        status: String,
    },

    /// Amount field is missing for an operation that requires it
    #[error("{action} for payment {payment} requires an amount")]
    MissingAmount {
        /// Operation that requires an amount
        action: String,
        /// Payment (receipt) ID
        payment: u32,
    },

    /// Invalid amount value (zero, negative or malformed)
    #[error("Invalid amount '{amount}' for payment {payment}")]
    InvalidAmount {
        /// The invalid amount string
        amount: String,
        /// Payment (receipt) ID
        payment: u32,
    },

    /// Payment amount exceeds what the student still owes
    #[error(
        "Payment of {amount} for student {student} exceeds outstanding balance {outstanding}"
    )]
    Overpayment {
        /// Student ID
        student: u32,
        /// Requested payment amount
        amount: Decimal,
        /// Total outstanding across both buckets
        outstanding: Decimal,
    },

    /// Duplicate payment (receipt) ID encountered
    #[error("Duplicate payment ID {payment} for student {student}")]
    DuplicatePayment {
        /// Payment ID that is duplicated
        payment: u32,
        /// Student ID
        student: u32,
    },

    /// Payment not found for edit/delete
    #[error("Payment {payment} not found for {operation}")]
    PaymentNotFound {
        /// Payment ID that was not found
        payment: u32,
        /// Operation that failed
        operation: String,
    },

    /// Student mismatch when editing or deleting a payment
    #[error("Student mismatch for {operation} on payment {payment}: expected student {expected_student}, got student {actual_student}")]
    StudentMismatch {
        /// Payment ID
        payment: u32,
        /// Student owning the payment
        expected_student: u32,
        /// Student named by the operation
        actual_student: u32,
        /// Operation that failed
        operation: String,
    },

    /// Promotion source and target years are the same
    #[error("Cannot transition academic year {year} into itself")]
    SameAcademicYear {
        /// Academic year ID
        year: u32,
    },

    /// The transition between these years has already run
    #[error("Transition from academic year {from} to {to} has already been completed")]
    TransitionAlreadyCompleted {
        /// Source academic year
        from: u32,
        /// Target academic year
        to: u32,
    },

    /// No active students are enrolled in the source year
    #[error("No active students to promote in academic year {year}")]
    NoStudentsToPromote {
        /// Source academic year
        year: u32,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation} for student {student}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Student ID
        student: u32,
    },
}

// Conversion from io::Error to SchoolError
impl From<std::io::Error> for SchoolError {
    fn from(error: std::io::Error) -> Self {
        SchoolError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to SchoolError
impl From<csv::Error> for SchoolError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        SchoolError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for SchoolError {
    fn from(error: serde_json::Error) -> Self {
        SchoolError::SnapshotError {
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for SchoolError {
    fn from(error: toml::de::Error) -> Self {
        SchoolError::InvalidConfig {
            field: "toml".to_string(),
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl SchoolError {
    /// Create a Validation error
    pub fn validation(entity: &str, message: impl Into<String>) -> Self {
        SchoolError::Validation {
            entity: entity.to_string(),
            message: message.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: &str, id: u32) -> Self {
        SchoolError::NotFound {
            entity: entity.to_string(),
            id,
        }
    }

    /// Create a Duplicate error
    pub fn duplicate(entity: &str, key: impl Into<String>) -> Self {
        SchoolError::Duplicate {
            entity: entity.to_string(),
            key: key.into(),
        }
    }

    /// Create an InUse error
    pub fn in_use(entity: &str, id: u32, referenced_by: &str) -> Self {
        SchoolError::InUse {
            entity: entity.to_string(),
            id,
            referenced_by: referenced_by.to_string(),
        }
    }

    /// Create a StudentNotActive error
    pub fn student_not_active(student: u32, status: impl std::fmt::Display) -> Self {
        SchoolError::StudentNotActive {
            student,
            status: status.to_string(),
        }
    }

    /// Create a MissingAmount error
    pub fn missing_amount(action: &str, payment: u32) -> Self {
        SchoolError::MissingAmount {
            action: action.to_string(),
            payment,
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: impl std::fmt::Display, payment: u32) -> Self {
        SchoolError::InvalidAmount {
            amount: amount.to_string(),
            payment,
        }
    }

    /// Create an Overpayment error
    pub fn overpayment(student: u32, amount: Decimal, outstanding: Decimal) -> Self {
        SchoolError::Overpayment {
            student,
            amount,
            outstanding,
        }
    }

    /// Create a DuplicatePayment error
    pub fn duplicate_payment(payment: u32, student: u32) -> Self {
        SchoolError::DuplicatePayment { payment, student }
    }

    /// Create a PaymentNotFound error
    pub fn payment_not_found(payment: u32, operation: &str) -> Self {
        SchoolError::PaymentNotFound {
            payment,
            operation: operation.to_string(),
        }
    }

    /// Create a StudentMismatch error
    pub fn student_mismatch(
        payment: u32,
        expected_student: u32,
        actual_student: u32,
        operation: &str,
    ) -> Self {
        SchoolError::StudentMismatch {
            payment,
            expected_student,
            actual_student,
            operation: operation.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, student: u32) -> Self {
        SchoolError::ArithmeticOverflow {
            operation: operation.to_string(),
            student,
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(field: &str, message: impl Into<String>) -> Self {
        SchoolError::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Whether the error concerns a single record and batch processing may continue
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SchoolError::FileNotFound { .. }
                | SchoolError::IoError { .. }
                | SchoolError::SnapshotError { .. }
                | SchoolError::InvalidConfig { .. }
        )
    }
}
