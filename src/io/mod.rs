//! I/O module
//!
//! Handles CSV parsing and output, bulk admission and the JSON data store.
//!
//! # Components
//!
//! - `csv_format` - Payment CSV rows, record conversion, balances output
//! - `sync_reader` - Synchronous payment reader with iterator interface
//! - `async_reader` - Asynchronous payment reader with batch reading interface
//! - `admission` - Bulk student admission from CSV
//! - `snapshot` - Load and save the registry and ledger as JSON

pub mod admission;
pub mod async_reader;
pub mod csv_format;
pub mod snapshot;
pub mod sync_reader;

pub use admission::{import_admissions, ImportSummary};
pub use async_reader::AsyncReader;
pub use csv_format::{convert_payment_record, write_balances_csv, PaymentCsvRecord};
pub use snapshot::SchoolSnapshot;
pub use sync_reader::SyncReader;
