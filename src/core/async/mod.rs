//! Asynchronous implementations of core components
//!
//! This module provides thread-safe, concurrent implementations of the
//! payment processing components using DashMap for locking.
//!
//! - **AsyncFeeLedger**: Thread-safe payments, allocations and running totals
//! - **AsyncFeeEngine**: Applies payment records against a shared registry
//! - **BatchProcessor**: Runs each student's records as a separate task
//!
//! # Thread Safety
//!
//! - Records of different students proceed in parallel
//! - Records of the same student are processed sequentially by one task
//! - No global locks; DashMap shards lock per entry

pub mod batch_processor;
pub mod engine;
pub mod ledger;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::AsyncFeeEngine;
pub use ledger::AsyncFeeLedger;
