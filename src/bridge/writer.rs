// In: src/bridge/writer.rs

//! The stateful write facade: Arrow record batches in, case records out.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::bridge::session::SessionGuard;
use crate::codec::RowEncoder;
use crate::config::{CodecConfig, ColumnSelection};
use crate::dictionary::Dictionary;
use crate::error::{CodecWarning, SavCaseError};
use crate::exchange::RowSink;
use crate::layout::RowLayout;
use crate::observability::WarningLog;

/// Totals of a finished write session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteSummary {
    pub rows_written: u64,
    /// Encode batches handed to the sink on the whole-row path.
    pub batches: usize,
    pub warnings: Vec<CodecWarning>,
}

/// An open write session over `K`.
pub struct CaseWriter<K: RowSink> {
    guard: SessionGuard<K>,
    layout: Arc<RowLayout>,
    encoder: RowEncoder,
    scratch: Vec<u8>,
    rows_written: u64,
    batches: usize,
    warnings: WarningLog,
}

impl<K: RowSink> CaseWriter<K> {
    pub fn new(sink: K, dictionary: &Dictionary, config: &CodecConfig) -> Result<Self, SavCaseError> {
        let mut guard = SessionGuard::new(sink, <K as RowSink>::close);
        config.validate()?;
        if dictionary.is_empty() {
            return Err(SavCaseError::InvalidConfig(
                "cannot write rows for an empty dictionary".to_string(),
            ));
        }

        let session = *guard.get()?.session();
        if session.row_size != dictionary.row_size() {
            return Err(SavCaseError::LayoutMismatch {
                dictionary_row_size: dictionary.row_size(),
                session_row_size: session.row_size,
            });
        }

        let layout = Arc::new(RowLayout::build(
            dictionary,
            &ColumnSelection::All,
            session.byte_order,
        ));
        let encoder = RowEncoder::new(Arc::clone(&layout), session.context, config);
        log::info!(
            "Opened write session: {} columns, row_size={}, {} rows per encode batch",
            dictionary.len(),
            session.row_size,
            encoder.batch_row_limit()
        );

        Ok(Self {
            guard,
            layout,
            encoder,
            scratch: Vec::new(),
            rows_written: 0,
            batches: 0,
            warnings: WarningLog::new(config.show_warnings),
        })
    }

    /// Encodes `batch` into whole rows and writes them, one memory-bounded
    /// slice at a time. Returns the number of rows written.
    pub fn write_batch(&mut self, batch: &RecordBatch) -> Result<usize, SavCaseError> {
        let total = batch.num_rows();
        let row_size = self.layout.row_size();
        let limit = self.encoder.batch_row_limit();

        let mut start = 0;
        while start < total {
            let len = limit.min(total - start);
            let slice = batch.slice(start, len);

            self.scratch.clear();
            let mut warnings = Vec::new();
            self.encoder
                .encode_into(&slice, self.rows_written, &mut self.scratch, &mut warnings)?;
            self.warnings.extend(warnings);

            for row in self.scratch.chunks_exact(row_size) {
                let sink = self.guard.get()?;
                if let Err(status) = sink.write_row(row) {
                    if let Some(w) = status.check("write_row", Some(self.rows_written))? {
                        self.warnings.push(w);
                    }
                }
                self.rows_written += 1;
            }
            self.batches += 1;
            log_metric!("event" = "encode_batch", "rows" = len, "bytes" = self.scratch.len());
            start += len;
        }
        Ok(total)
    }

    /// Writes `batch` one cell at a time through `RowSink::set_value`.
    pub fn write_batch_by_value(&mut self, batch: &RecordBatch) -> Result<usize, SavCaseError> {
        let sink = self.guard.get()?;
        let mut warnings = Vec::new();
        let result = self
            .encoder
            .encode_by_value(batch, self.rows_written, sink, &mut warnings);
        self.warnings.extend(warnings);
        let rows = result?;
        self.rows_written += rows as u64;
        Ok(rows)
    }

    /// Writes `batch`, choosing the whole-row path when its columns follow
    /// dictionary order and the value-by-value path otherwise.
    pub fn append_batch(&mut self, batch: &RecordBatch) -> Result<usize, SavCaseError> {
        if self.follows_dictionary_order(batch) {
            self.write_batch(batch)
        } else {
            log::debug!("Batch columns are out of dictionary order; writing value by value");
            self.write_batch_by_value(batch)
        }
    }

    fn follows_dictionary_order(&self, batch: &RecordBatch) -> bool {
        let dictionary = self.layout.dictionary();
        let mut last: Option<usize> = None;
        for field in batch.schema().fields() {
            match dictionary.index_of(field.name()) {
                Some(idx) if last.map_or(true, |prev| idx > prev) => last = Some(idx),
                _ => return false,
            }
        }
        true
    }

    /// Closes the sink and reports the session totals.
    pub fn finish(&mut self) -> Result<WriteSummary, SavCaseError> {
        if let Some(w) = self.guard.close()? {
            self.warnings.push(w);
        }
        log::info!(
            "Closed write session after {} rows with {} warnings",
            self.rows_written,
            self.warnings.len()
        );
        Ok(WriteSummary {
            rows_written: self.rows_written,
            batches: self.batches,
            warnings: self.warnings.take(),
        })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn warnings(&self) -> &[CodecWarning] {
        self.warnings.as_slice()
    }

    /// The underlying sink, for inspection.
    pub fn sink(&self) -> &K {
        self.guard.peek()
    }
}
