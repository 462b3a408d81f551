//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over payment records from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<PaymentRecord, SchoolError>` for each CSV row:
//!
//! ```no_run
//! use school_fees_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("payments.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("Processing payment: {:?}", record),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as `ParseError` with the line number
//!   (the header is line 1)

use crate::io::csv_format::{convert_payment_record, PaymentCsvRecord};
use crate::types::{PaymentRecord, SchoolError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Open a file, mapping a missing file to `FileNotFound`
pub(crate) fn open_file(path: &Path) -> Result<File, SchoolError> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SchoolError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => SchoolError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        },
    })
}

/// Synchronous payment CSV reader
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing optional columns)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if the file does not exist
    /// * `IoError` if it cannot be opened
    pub fn new(path: &Path) -> Result<Self, SchoolError> {
        let file = open_file(path)?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<PaymentRecord, SchoolError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<PaymentCsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;
        let line = Some(self.line_num);

        Some(match row {
            Ok(csv_record) => convert_payment_record(csv_record)
                .map_err(|message| SchoolError::ParseError { line, message }),
            Err(e) => Err(SchoolError::ParseError {
                line,
                message: e.to_string(),
            }),
        })
    }
}
