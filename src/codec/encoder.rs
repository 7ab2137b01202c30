// In: src/codec/encoder.rs

//! The row encoder: Arrow columns in, fixed-size case records out.
//!
//! Every row starts as a copy of the layout's blank row (system missing in
//! numeric fields, spaces in string fields). Each batch column is then bound to
//! its dictionary column and written at that column's offset. Columns the batch
//! does not supply keep their blank value.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BinaryArray, Float64Array, LargeBinaryArray, LargeStringArray,
    StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type, TimeUnit};
use arrow::record_batch::RecordBatch;

use crate::config::CodecConfig;
use crate::error::{CodecWarning, SavCaseError};
use crate::exchange::{CellValue, CodecContext, ColumnHandle, RowSink};
use crate::kernels::text::TextFit;
use crate::kernels::{epoch, float8, text};
use crate::layout::{ColumnPlacement, RowLayout};
use crate::types::StorageKind;
use crate::utils::available_memory_bytes;

/// Encoded rows, back to back, plus any warnings.
#[derive(Debug, Clone, Default)]
pub struct EncodeOutcome {
    pub data: Vec<u8>,
    pub row_size: usize,
    pub warnings: Vec<CodecWarning>,
}

impl EncodeOutcome {
    pub fn num_rows(&self) -> usize {
        if self.row_size == 0 {
            0
        } else {
            self.data.len() / self.row_size
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.row_size.max(1))
    }
}

/// Rows per encode batch for a byte budget: `max(1, floor(allowed / row_size))`.
pub fn plan_batch_rows(row_size: usize, allowed_bytes: u64) -> usize {
    let per_batch = allowed_bytes / row_size.max(1) as u64;
    usize::try_from(per_batch).unwrap_or(usize::MAX).max(1)
}

//==================================================================================
// 1. Column Binding
//==================================================================================

enum Feed {
    /// Values already in wire units; `None` is written as system missing.
    Numbers(Float64Array),
    Utf8(StringArray),
    LargeUtf8(LargeStringArray),
    Binary(BinaryArray),
    LargeBinary(LargeBinaryArray),
}

struct BoundColumn {
    index: usize,
    name: String,
    placement: ColumnPlacement,
    feed: Feed,
}

enum Cell<'a> {
    Null,
    Number(f64),
    Str(&'a str),
    Bytes(&'a [u8]),
}

impl BoundColumn {
    fn cell(&self, row: usize) -> Cell<'_> {
        fn pick<T>(array: &dyn Array, row: usize, value: impl FnOnce() -> T) -> Option<T> {
            if array.is_null(row) {
                None
            } else {
                Some(value())
            }
        }
        let cell = match &self.feed {
            Feed::Numbers(a) => pick(a, row, || Cell::Number(a.value(row))),
            Feed::Utf8(a) => pick(a, row, || Cell::Str(a.value(row))),
            Feed::LargeUtf8(a) => pick(a, row, || Cell::Str(a.value(row))),
            Feed::Binary(a) => pick(a, row, || Cell::Bytes(a.value(row))),
            Feed::LargeBinary(a) => pick(a, row, || Cell::Bytes(a.value(row))),
        };
        match cell {
            // NaN carries no value on the wire.
            Some(Cell::Number(v)) if v.is_nan() => Cell::Null,
            Some(c) => c,
            None => Cell::Null,
        }
    }
}

fn mismatch(column: &str, expected: &str, found: &DataType) -> SavCaseError {
    SavCaseError::TypeMismatch {
        column: column.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// Converts any temporal or numeric array into wire-unit floats.
fn to_wire_numbers(name: &str, array: &ArrayRef) -> Result<Float64Array, SavCaseError> {
    let numbers = match array.data_type() {
        DataType::Timestamp(unit, _) => {
            let unit = *unit;
            let ticks = cast(array, &DataType::Int64)?;
            ticks
                .as_primitive::<Int64Type>()
                .unary::<_, Float64Type>(|t| epoch::timestamp_to_seconds(t, unit))
        }
        DataType::Date64 => {
            let ticks = cast(array, &DataType::Int64)?;
            ticks
                .as_primitive::<Int64Type>()
                .unary::<_, Float64Type>(|t| epoch::timestamp_to_seconds(t, TimeUnit::Millisecond))
        }
        DataType::Date32 => array
            .as_primitive::<Date32Type>()
            .unary::<_, Float64Type>(epoch::date32_to_seconds),
        DataType::Duration(unit) => {
            let unit = *unit;
            let ticks = cast(array, &DataType::Int64)?;
            ticks
                .as_primitive::<Int64Type>()
                .unary::<_, Float64Type>(|t| epoch::duration_to_seconds(t, unit))
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Binary | DataType::LargeBinary => {
            return Err(mismatch(name, "a numeric or temporal value", array.data_type()))
        }
        _ => cast(array, &DataType::Float64)
            .map_err(|_| mismatch(name, "a numeric or temporal value", array.data_type()))?
            .as_primitive::<Float64Type>()
            .clone(),
    };
    Ok(numbers)
}

fn to_text_feed(name: &str, array: &ArrayRef) -> Result<Feed, SavCaseError> {
    let feed = match array.data_type() {
        DataType::Utf8 => Feed::Utf8(array.as_string::<i32>().clone()),
        DataType::LargeUtf8 => Feed::LargeUtf8(array.as_string::<i64>().clone()),
        DataType::Binary => Feed::Binary(array.as_binary::<i32>().clone()),
        DataType::LargeBinary => Feed::LargeBinary(array.as_binary::<i64>().clone()),
        other => return Err(mismatch(name, "a text or binary value", other)),
    };
    Ok(feed)
}

//==================================================================================
// 2. The Encoder
//==================================================================================

pub struct RowEncoder {
    layout: Arc<RowLayout>,
    context: CodecContext,
    config: CodecConfig,
    template: Vec<u8>,
}

impl RowEncoder {
    pub fn new(layout: Arc<RowLayout>, context: CodecContext, config: &CodecConfig) -> Self {
        let template = layout.blank_row(&context);
        Self {
            layout,
            context,
            config: config.clone(),
            template,
        }
    }

    pub fn row_size(&self) -> usize {
        self.layout.row_size()
    }

    /// Byte budget of one encode batch.
    pub fn allowed_memory_bytes(&self) -> u64 {
        match self.config.max_encode_memory_bytes {
            Some(bytes) => bytes,
            None => (available_memory_bytes() as f64 * self.config.memory_allocation) as u64,
        }
    }

    /// Rows per encode batch under the configured memory budget.
    pub fn batch_row_limit(&self) -> usize {
        plan_batch_rows(self.row_size(), self.allowed_memory_bytes())
    }

    fn bind(&self, batch: &RecordBatch) -> Result<Vec<BoundColumn>, SavCaseError> {
        let dictionary = self.layout.dictionary();
        let schema = batch.schema();
        schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| {
                let name = field.name();
                let index = dictionary
                    .index_of(name)
                    .ok_or_else(|| SavCaseError::UnknownColumn(name.clone()))?;
                let placement = self.layout.placements()[index];
                let feed = match placement.storage {
                    StorageKind::Numeric => Feed::Numbers(to_wire_numbers(name, array)?),
                    StorageKind::String(_) => to_text_feed(name, array)?,
                };
                Ok(BoundColumn {
                    index,
                    name: name.clone(),
                    placement,
                    feed,
                })
            })
            .collect()
    }

    /// Appends one encoded row per batch row to `out`.
    ///
    /// `first_row` is the absolute index of the batch's first row, used in
    /// warnings. Returns the number of rows written.
    pub fn encode_into(
        &self,
        batch: &RecordBatch,
        first_row: u64,
        out: &mut Vec<u8>,
        warnings: &mut Vec<CodecWarning>,
    ) -> Result<usize, SavCaseError> {
        let bound = self.bind(batch)?;
        let row_size = self.row_size();
        let order = self.layout.byte_order();
        let rows = batch.num_rows();
        let base = out.len();
        out.reserve(rows * row_size);

        for r in 0..rows {
            out.extend_from_slice(&self.template);
            let row = &mut out[base + r * row_size..base + (r + 1) * row_size];

            for col in &bound {
                let p = col.placement;
                let field = &mut row[p.offset..p.offset + p.width];
                let limit = match p.storage {
                    StorageKind::String(declared) => declared,
                    StorageKind::Numeric => 8,
                };
                let fit = match col.cell(r) {
                    Cell::Null => {
                        // Blank template already holds the right value.
                        TextFit::Complete
                    }
                    Cell::Number(v) => {
                        float8::write_f64(field, v, order);
                        TextFit::Complete
                    }
                    Cell::Str(s) => text::encode_into(s, self.context.encoding, field, limit, &col.name)?,
                    Cell::Bytes(b) => text::copy_into(b, field, limit),
                };
                if let TextFit::Truncated { encoded_len } = fit {
                    warnings.push(CodecWarning::Truncation {
                        column: col.name.clone(),
                        row: first_row + r as u64,
                        width: limit,
                        encoded_len,
                    });
                }
            }
        }
        Ok(rows)
    }

    /// Encodes a whole batch into one contiguous buffer.
    pub fn encode(&self, batch: &RecordBatch) -> Result<EncodeOutcome, SavCaseError> {
        let mut outcome = EncodeOutcome {
            data: Vec::new(),
            row_size: self.row_size(),
            warnings: Vec::new(),
        };
        self.encode_into(batch, 0, &mut outcome.data, &mut outcome.warnings)?;
        Ok(outcome)
    }

    /// Sends each non-null cell through `sink.set_value`, committing once per row.
    ///
    /// Null cells are skipped and keep the sink's blank value. Returns the
    /// number of rows committed.
    pub fn encode_by_value<K: RowSink>(
        &self,
        batch: &RecordBatch,
        first_row: u64,
        sink: &mut K,
        warnings: &mut Vec<CodecWarning>,
    ) -> Result<usize, SavCaseError> {
        let bound = self.bind(batch)?;
        let mut scratch = Vec::new();

        for r in 0..batch.num_rows() {
            let row_index = first_row + r as u64;
            for col in &bound {
                let limit = match col.placement.storage {
                    StorageKind::String(declared) => declared,
                    StorageKind::Numeric => 8,
                };
                let (value, fit) = match col.cell(r) {
                    Cell::Null => continue,
                    Cell::Number(v) => (CellValue::Number(v), TextFit::Complete),
                    Cell::Str(s) => {
                        scratch.clear();
                        scratch.resize(limit, b' ');
                        let fit = text::encode_into(s, self.context.encoding, &mut scratch, limit, &col.name)?;
                        let used = text::trim_padding(&scratch).len();
                        (CellValue::Text(&scratch[..used]), fit)
                    }
                    Cell::Bytes(b) => {
                        let n = b.len().min(limit);
                        let fit = if b.len() > limit {
                            TextFit::Truncated { encoded_len: b.len() }
                        } else {
                            TextFit::Complete
                        };
                        (CellValue::Text(&b[..n]), fit)
                    }
                };
                if let TextFit::Truncated { encoded_len } = fit {
                    warnings.push(CodecWarning::Truncation {
                        column: col.name.clone(),
                        row: row_index,
                        width: limit,
                        encoded_len,
                    });
                }
                if let Err(status) = sink.set_value(ColumnHandle(col.index), value) {
                    if let Some(w) = status.check("set_value", Some(row_index)).map_err(|e| {
                        with_column(e, &col.name)
                    })? {
                        warnings.push(w);
                    }
                }
            }
            if let Err(status) = sink.commit_row() {
                if let Some(w) = status.check("commit_row", Some(row_index))? {
                    warnings.push(w);
                }
            }
        }
        Ok(batch.num_rows())
    }
}

fn with_column(err: SavCaseError, name: &str) -> SavCaseError {
    match err {
        SavCaseError::Upstream {
            operation,
            status,
            row,
            ..
        } => SavCaseError::Upstream {
            operation,
            status,
            row,
            column: Some(name.to_string()),
        },
        other => other,
    }
}
