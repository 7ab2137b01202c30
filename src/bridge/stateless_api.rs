// In: src/bridge/stateless_api.rs

use std::sync::Arc;

use arrow::record_batch::RecordBatch;

use crate::codec::{DecodeOutcome, EncodeOutcome, RowDecoder, RowEncoder};
use crate::config::{CodecConfig, ColumnSelection};
use crate::dictionary::Dictionary;
use crate::error::SavCaseError;
use crate::exchange::CodecContext;
use crate::layout::{ByteOrder, RowLayout};

/// Builds the shared, immutable layout for one session.
pub fn build_layout(
    dictionary: &Dictionary,
    selection: &ColumnSelection,
    byte_order: ByteOrder,
) -> Arc<RowLayout> {
    Arc::new(RowLayout::build(dictionary, selection, byte_order))
}

/// Decodes a slice of row buffers into one batch.
/// Row indices in warnings count from zero.
pub fn decode_batch<R: AsRef<[u8]>>(
    layout: &Arc<RowLayout>,
    rows: &[R],
    context: &CodecContext,
    config: &CodecConfig,
) -> Result<DecodeOutcome, SavCaseError> {
    config.validate()?;
    let mut decoder = RowDecoder::new(Arc::clone(layout), *context, config);
    for row in rows {
        decoder.push_row(row.as_ref())?;
    }
    decoder.finish()
}

/// Encodes every row of `batch` into one contiguous buffer.
///
/// Columns are cast and encoded in slices of at most `batch_row_limit` rows,
/// so the memory budget bounds the intermediate arrays; the returned buffer
/// still holds every row.
pub fn encode_batch(
    layout: &Arc<RowLayout>,
    batch: &RecordBatch,
    context: &CodecContext,
    config: &CodecConfig,
) -> Result<EncodeOutcome, SavCaseError> {
    config.validate()?;
    let encoder = RowEncoder::new(Arc::clone(layout), *context, config);
    let total = batch.num_rows();
    let limit = encoder.batch_row_limit();

    let mut outcome = EncodeOutcome {
        data: Vec::with_capacity(total * encoder.row_size()),
        row_size: encoder.row_size(),
        warnings: Vec::new(),
    };
    let mut start = 0;
    while start < total {
        let len = limit.min(total - start);
        encoder.encode_into(
            &batch.slice(start, len),
            start as u64,
            &mut outcome.data,
            &mut outcome.warnings,
        )?;
        start += len;
    }
    Ok(outcome)
}

/// A JSON description of a layout's spans and placements.
pub fn describe_layout(layout: &RowLayout) -> Result<String, SavCaseError> {
    layout.describe()
}
