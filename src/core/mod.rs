//! Core business logic module
//!
//! This module contains the school record and fee processing components:
//! - `registry` - Reference tables with validation and referential integrity
//! - `balance` - Dues, payments and outstanding amounts per student
//! - `allocation` - Splitting a payment across the bus and school buckets
//! - `traits` - Read access shared by the sync and async ledgers
//! - `ledger` - Payment storage for the synchronous engine
//! - `engine` - Payment recording, editing and deletion
//! - `promotion` - Academic-year transitions
//! - `report` - Year-end reporting
//! - `async` - Concurrent ledger, engine and batch processor

pub mod allocation;
pub mod r#async;
pub mod balance;
pub mod engine;
pub mod ledger;
pub mod promotion;
pub mod registry;
pub mod report;
pub mod traits;

#[cfg(test)]
pub(crate) mod fixtures;

pub use allocation::{allocate, Allocation, Buckets};
pub use balance::{StudentBalance, StudentDues};
pub use engine::FeeEngine;
pub use ledger::FeeLedger;
pub use promotion::{promote_students, PromotionOutcome, PromotionRequest};
pub use r#async::{AsyncFeeEngine, AsyncFeeLedger, BatchProcessor};
pub use registry::SchoolRegistry;
pub use report::{generate_year_end_report, YearEndReport};
pub use traits::PaymentLedger;
