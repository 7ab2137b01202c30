// In: src/bridge/reader.rs

//! The stateful read facade: a row source in, Arrow record batches out.

use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchReader};

use crate::bridge::session::SessionGuard;
use crate::codec::{output_schema, DecodeOutcome, RowDecoder};
use crate::config::{CodecConfig, ReadRequest};
use crate::dictionary::Dictionary;
use crate::error::{CodecWarning, SavCaseError};
use crate::exchange::{CodecContext, RowSource, StatusCode};
use crate::layout::RowLayout;
use crate::observability::WarningLog;

/// An open read session over `S`.
///
/// Opening validates the session against the dictionary, builds the layout
/// once and positions the source at the requested row offset. The source is
/// closed when the reader (or the iterator it turns into) is finished,
/// fails, or is dropped.
pub struct CaseReader<S: RowSource> {
    guard: SessionGuard<S>,
    layout: Arc<RowLayout>,
    context: CodecContext,
    config: CodecConfig,
    request: ReadRequest,
    total_rows: u64,
    warnings: WarningLog,
}

impl<S: RowSource> CaseReader<S> {
    pub fn open(
        source: S,
        dictionary: &Dictionary,
        request: ReadRequest,
        config: &CodecConfig,
    ) -> Result<Self, SavCaseError> {
        // From here on, any early return drops the guard and closes the source.
        let mut guard = SessionGuard::new(source, <S as RowSource>::close);
        config.validate()?;
        request.validate()?;

        let session = *guard.get()?.session();
        if session.row_size != dictionary.row_size() {
            return Err(SavCaseError::LayoutMismatch {
                dictionary_row_size: dictionary.row_size(),
                session_row_size: session.row_size,
            });
        }

        let layout = Arc::new(RowLayout::build(
            dictionary,
            &request.columns,
            session.byte_order,
        ));
        let available = session.case_count.saturating_sub(request.row_offset);
        let total_rows = request.row_limit.map_or(available, |limit| limit.min(available));

        let mut warnings = WarningLog::new(config.show_warnings);
        if request.row_offset > 0 && total_rows > 0 {
            if let Err(status) = guard.get()?.seek(request.row_offset) {
                if let Some(w) = status.check("seek", Some(request.row_offset))? {
                    warnings.push(w);
                }
            }
        }

        log::info!(
            "Opened read session: rows {}..{} of {}, {} output columns, row_size={}",
            request.row_offset,
            request.row_offset + total_rows,
            session.case_count,
            layout.outputs().len(),
            session.row_size
        );

        Ok(Self {
            guard,
            layout,
            context: session.context,
            config: config.clone(),
            request,
            total_rows,
            warnings,
        })
    }

    pub fn layout(&self) -> &Arc<RowLayout> {
        &self.layout
    }

    /// The schema every batch of this session carries.
    pub fn schema(&self) -> SchemaRef {
        output_schema(&self.layout, &self.config)
    }

    /// Rows this session will yield, unless the source ends early.
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    /// Streams the requested rows in batches of `chunk_size`.
    pub fn batches(self) -> CaseBatchIter<S> {
        let chunk = self.request.chunk_size;
        self.into_iter_with_chunk(chunk)
    }

    /// Reads every requested row into one batch.
    pub fn read_all(self) -> Result<DecodeOutcome, SavCaseError> {
        let schema = self.schema();
        let mut iter = self.into_iter_with_chunk(None);
        let batch = iter
            .next_batch()?
            .unwrap_or_else(|| RecordBatch::new_empty(schema));
        // A single chunk covers everything; this closes the session.
        while iter.next_batch()?.is_some() {}
        Ok(DecodeOutcome {
            batch,
            warnings: iter.take_warnings(),
        })
    }

    fn into_iter_with_chunk(self, chunk_size: Option<usize>) -> CaseBatchIter<S> {
        let row_size = self.layout.row_size();
        let chunk_size = chunk_size
            .unwrap_or_else(|| usize::try_from(self.total_rows).unwrap_or(usize::MAX))
            .max(1);
        let mut decoder = RowDecoder::new(Arc::clone(&self.layout), self.context, &self.config);
        decoder.set_row_index(self.request.row_offset);
        CaseBatchIter {
            guard: self.guard,
            decoder,
            row_buf: vec![0u8; row_size],
            chunk_size,
            start_row: self.request.row_offset,
            total_rows: self.total_rows,
            emitted: 0,
            finished: false,
            warnings: self.warnings,
        }
    }
}

/// A lazy, finite and non-restartable stream of decoded batches.
pub struct CaseBatchIter<S: RowSource> {
    guard: SessionGuard<S>,
    decoder: RowDecoder,
    row_buf: Vec<u8>,
    chunk_size: usize,
    start_row: u64,
    total_rows: u64,
    emitted: u64,
    finished: bool,
    warnings: WarningLog,
}

impl<S: RowSource> CaseBatchIter<S> {
    /// The next batch, or `None` once the range (or the file) is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<RecordBatch>, SavCaseError> {
        if self.finished {
            return Ok(None);
        }
        let remaining = self.total_rows - self.emitted;
        if remaining == 0 {
            self.finish_session()?;
            return Ok(None);
        }
        let want = usize::try_from(remaining).map_or(self.chunk_size, |r| r.min(self.chunk_size));

        match self.read_chunk(want) {
            Ok((rows, hit_end)) => {
                self.emitted += rows as u64;
                let outcome = match self.decoder.finish() {
                    Ok(outcome) => outcome,
                    Err(e) => return Err(self.abort(e)),
                };
                self.warnings.extend(outcome.warnings);
                if hit_end || self.emitted == self.total_rows {
                    if hit_end {
                        log::info!(
                            "Source ended early at row {} ({} rows expected)",
                            self.start_row + self.emitted,
                            self.total_rows
                        );
                    }
                    self.finish_session()?;
                }
                if rows == 0 {
                    return Ok(None);
                }
                log_metric!("event" = "read_batch", "rows" = rows, "cursor" = self.start_row + self.emitted);
                Ok(Some(outcome.batch))
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    /// Reads up to `want` rows into the decoder. Returns the rows read and
    /// whether the source reported end of file.
    fn read_chunk(&mut self, want: usize) -> Result<(usize, bool), SavCaseError> {
        let first = self.start_row + self.emitted;
        for i in 0..want {
            let row_index = first + i as u64;
            let source = self.guard.get()?;
            match source.read_next_row(&mut self.row_buf) {
                Ok(()) => {}
                Err(StatusCode::FILE_END) => return Ok((i, true)),
                Err(status) => {
                    if let Some(w) = status.check("read_next_row", Some(row_index))? {
                        self.warnings.push(w);
                    }
                }
            }
            self.decoder.push_row(&self.row_buf)?;
        }
        Ok((want, false))
    }

    fn finish_session(&mut self) -> Result<(), SavCaseError> {
        self.finished = true;
        if let Some(w) = self.guard.close()? {
            self.warnings.push(w);
        }
        log::info!(
            "Closed read session after {} rows with {} warnings",
            self.emitted,
            self.warnings.len()
        );
        Ok(())
    }

    /// Closes the source after a failure; the original error wins.
    fn abort(&mut self, err: SavCaseError) -> SavCaseError {
        self.finished = true;
        if let Err(close_err) = self.guard.close() {
            log::warn!("Failed to close source after error: {}", close_err);
        }
        err
    }

    /// Stops early and closes the source.
    pub fn close(&mut self) -> Result<(), SavCaseError> {
        if self.guard.is_open() {
            self.finish_session()?;
        }
        self.finished = true;
        Ok(())
    }

    /// Rows yielded so far.
    pub fn rows_emitted(&self) -> u64 {
        self.emitted
    }

    pub fn warnings(&self) -> &[CodecWarning] {
        self.warnings.as_slice()
    }

    pub fn take_warnings(&mut self) -> Vec<CodecWarning> {
        self.warnings.take()
    }

    /// The underlying source, for inspection.
    pub fn source(&self) -> &S {
        self.guard.peek()
    }
}

impl<S: RowSource> Iterator for CaseBatchIter<S> {
    type Item = Result<RecordBatch, ArrowError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().map_err(ArrowError::from).transpose()
    }
}

impl<S: RowSource> RecordBatchReader for CaseBatchIter<S> {
    fn schema(&self) -> SchemaRef {
        self.decoder.schema()
    }
}
