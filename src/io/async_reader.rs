//! Asynchronous CSV reader with batch interface
//!
//! Provides batch reading of payment records for the async strategy.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of PaymentRecords
//!                  ↓
//!           csv_format module
//!           (PaymentCsvRecord, convert_payment_record)
//! ```

use crate::io::csv_format::{convert_payment_record, PaymentCsvRecord};
use crate::types::PaymentRecord;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous payment CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
    skipped: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
            skipped: 0,
        }
    }

    /// Read up to `batch_size` payment records
    ///
    /// Malformed rows are logged with their line number, counted in
    /// [`AsyncReader::skipped`] and left out of the batch.
    ///
    /// # Returns
    ///
    /// The converted records; an empty vector at end of file.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<PaymentRecord> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<PaymentCsvRecord>();

        while batch.len() < batch_size {
            let Some(row) = records.next().await else {
                break;
            };
            self.line_num += 1;
            match row.map_err(|e| e.to_string()).and_then(convert_payment_record) {
                Ok(record) => batch.push(record),
                Err(e) => {
                    self.skipped += 1;
                    warn!(line = self.line_num, error = %e, "skipping payment row");
                }
            }
        }

        batch
    }

    /// Number of rows skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
