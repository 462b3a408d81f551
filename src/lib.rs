//! School Fees Engine Library
//! # Overview
//!
//! This library keeps the records of a village school (students, classes,
//! villages, fee structures, academic years) and the fee payments made
//! against them, with a synchronous and an asynchronous strategy for
//! applying payment batches from CSV.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Student, FeePayment, PaymentRecord, etc.)
//! - [`config`] - TOML configuration
//! - [`cli`] - CLI arguments parsing and subcommands
//! - [`core`] - Business logic components:
//!   - [`core::registry`] - Reference tables and referential integrity
//!   - [`core::balance`] - Dues and outstanding amounts per student
//!   - [`core::allocation`] - Splitting a payment between bus and school fees
//!   - [`core::engine`] - Recording, editing and deleting payments
//!   - [`core::promotion`] - Academic-year transitions
//!   - [`core::report`] - Year-end report
//! - [`io`] - CSV readers and writers, bulk admission and the JSON snapshot
//! - [`strategy`] - Pluggable payment batch pipelines
//! - [`logging`] - tracing subscriber setup
//!
//! # Fee buckets
//!
//! Every student owes two separate amounts per academic year:
//!
//! - **bus**: the village's monthly bus fee for each billing month, when the
//!   student uses the school bus
//! - **school**: the class's fee structure (monthly items times the billing
//!   months, one-off items once) plus miscellaneous charges
//!
//! # Allocation policies
//!
//! - **standard**: bus balance first, the rest to school
//! - **equal**: half to each bucket, overflow moved to the other one
//! - **proportional**: split by the ratio of the monthly charges

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use config::{PaymentRules, SchoolConfig};
pub use crate::core::{FeeEngine, FeeLedger, PaymentLedger, SchoolRegistry};
pub use io::{write_balances_csv, SchoolSnapshot};
pub use types::{
    AllocationPolicy, FeePayment, PaymentAction, PaymentAllocation, PaymentId, PaymentMode,
    PaymentRecord, SchoolError, Student, StudentId,
};
