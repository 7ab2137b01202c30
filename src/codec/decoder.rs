// In: src/codec/decoder.rs

//! The row decoder: raw case records in, one Arrow `RecordBatch` out.
//!
//! Rows are pushed one at a time into per-column accumulators. For every row,
//! each bucket's spans are gathered into a scratch buffer, the values are
//! classified against the missing-value rules, converted (dates, times,
//! text), and appended. `finish` assembles the accumulated columns into a
//! batch and resets the decoder for the next one.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Float64Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::config::{CodecConfig, StringNull};
use crate::error::{CodecWarning, SavCaseError};
use crate::exchange::CodecContext;
use crate::kernels::{epoch, float8, text};
use crate::layout::{Bucket, RowLayout};
use crate::null_handling::{bitmap, sentinel};

/// Field metadata key carrying the column's print format.
pub const FORMAT_METADATA_KEY: &str = "format";

/// A decoded batch plus the warnings raised while producing it.
#[derive(Debug, Clone)]
pub struct DecodeOutcome {
    pub batch: RecordBatch,
    pub warnings: Vec<CodecWarning>,
}

enum ColumnBuffer {
    Float { values: Vec<f64>, validity: Vec<bool> },
    Ticks { values: Vec<i64>, validity: Vec<bool> },
    Text(Vec<Option<String>>),
}

impl ColumnBuffer {
    fn for_type(data_type: &DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Utf8 => ColumnBuffer::Text(Vec::with_capacity(capacity)),
            DataType::Timestamp(_, _) | DataType::Duration(_) => ColumnBuffer::Ticks {
                values: Vec::with_capacity(capacity),
                validity: Vec::with_capacity(capacity),
            },
            _ => ColumnBuffer::Float {
                values: Vec::with_capacity(capacity),
                validity: Vec::with_capacity(capacity),
            },
        }
    }

    fn take_array(&mut self, data_type: &DataType) -> Result<ArrayRef, SavCaseError> {
        let array: ArrayRef = match self {
            ColumnBuffer::Float { values, validity } => Arc::new(bitmap::reapply_bitmap_from_vec::<
                Float64Type,
            >(
                std::mem::take(values),
                std::mem::take(validity),
            )?),
            ColumnBuffer::Ticks { values, validity } => bitmap::reapply_bitmap_temporal(
                std::mem::take(values),
                std::mem::take(validity),
                data_type,
            )?,
            ColumnBuffer::Text(values) => Arc::new(StringArray::from(std::mem::take(values))),
        };
        Ok(array)
    }
}

pub struct RowDecoder {
    layout: Arc<RowLayout>,
    context: CodecContext,
    config: CodecConfig,
    schema: SchemaRef,
    buffers: Vec<ColumnBuffer>,
    numeric_scratch: [Vec<f64>; 3],
    text_scratch: Vec<u8>,
    warnings: Vec<CodecWarning>,
    rows_in_batch: usize,
    next_row: u64,
}

impl RowDecoder {
    pub fn new(layout: Arc<RowLayout>, context: CodecContext, config: &CodecConfig) -> Self {
        let schema = output_schema(&layout, config);
        let buffers = schema
            .fields()
            .iter()
            .map(|f| ColumnBuffer::for_type(f.data_type(), 0))
            .collect();
        Self {
            layout,
            context,
            config: config.clone(),
            schema,
            buffers,
            numeric_scratch: Default::default(),
            text_scratch: Vec::new(),
            warnings: Vec::new(),
            rows_in_batch: 0,
            next_row: 0,
        }
    }

    /// Sets the absolute row index reported in warnings for the next pushed row.
    pub fn set_row_index(&mut self, row: u64) {
        self.next_row = row;
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn rows_in_batch(&self) -> usize {
        self.rows_in_batch
    }

    /// Decodes one row buffer into the pending batch.
    pub fn push_row(&mut self, row: &[u8]) -> Result<(), SavCaseError> {
        let layout = Arc::clone(&self.layout);
        if row.len() != layout.row_size() {
            return Err(SavCaseError::InvalidRowBuffer {
                expected: layout.row_size(),
                actual: row.len(),
            });
        }

        // --- Gather each bucket into its scratch buffer ---
        let order = layout.byte_order();
        for (slot, bucket) in [Bucket::Numeric, Bucket::Datetime, Bucket::Time]
            .into_iter()
            .enumerate()
        {
            let b = layout.bucket(bucket);
            if !b.is_empty() {
                float8::gather(row, &b.spans, order, &mut self.numeric_scratch[slot]);
            }
        }
        let strings = layout.bucket(Bucket::String);
        self.text_scratch.clear();
        for span in &strings.spans {
            self.text_scratch.extend_from_slice(&row[span.range()]);
        }

        // --- Classify, convert and append, in output order ---
        let row_index = self.next_row;
        for (out_idx, slot) in layout.outputs().iter().enumerate() {
            let column = layout.column(slot.column);
            let missing = column.missing.as_ref();
            let include = self.config.include_user_missing;

            match (&mut self.buffers[out_idx], slot.bucket) {
                (ColumnBuffer::Text(values), Bucket::String) => {
                    let start = strings.packed_offsets[slot.position];
                    let field = &self.text_scratch[start..start + column.byte_width()];
                    let mut decoded = text::decode(field, self.context.encoding, &column.name)?;
                    if sentinel::text_is_user_missing(&decoded, missing, include) {
                        decoded.clear();
                    }
                    values.push(if decoded.is_empty() {
                        match &self.config.string_null {
                            StringNull::Empty => Some(decoded),
                            StringNull::Null => None,
                            StringNull::Text(replacement) => Some(replacement.clone()),
                        }
                    } else {
                        Some(decoded)
                    });
                }
                (ColumnBuffer::Float { values, validity }, bucket) => {
                    let v = self.numeric_scratch[scratch_slot(bucket)][slot.position];
                    let is_null = sentinel::numeric_is_null(v, &self.context, missing, include);
                    values.push(if is_null { 0.0 } else { v });
                    validity.push(!is_null);
                }
                (ColumnBuffer::Ticks { values, validity }, bucket) => {
                    let v = self.numeric_scratch[scratch_slot(bucket)][slot.position];
                    let unit = self.config.time_unit;
                    let ticks = if sentinel::numeric_is_null(v, &self.context, missing, include) {
                        None
                    } else {
                        let converted = match bucket {
                            Bucket::Time => epoch::seconds_to_duration(v, unit),
                            _ => epoch::seconds_to_timestamp(v, unit),
                        };
                        if converted.is_none() {
                            self.warnings.push(CodecWarning::TimestampOutOfRange {
                                column: column.name.clone(),
                                row: row_index,
                                value: v,
                            });
                        }
                        converted
                    };
                    values.push(ticks.unwrap_or(0));
                    validity.push(ticks.is_some());
                }
                (ColumnBuffer::Text(_), _) => {
                    return Err(SavCaseError::InternalError(format!(
                        "column '{}' routed to a text buffer outside the string bucket",
                        column.name
                    )))
                }
            }
        }

        self.rows_in_batch += 1;
        self.next_row += 1;
        Ok(())
    }

    /// Assembles the pending rows into a batch and resets for the next one.
    ///
    /// With no active columns the batch has no columns and zero rows.
    pub fn finish(&mut self) -> Result<DecodeOutcome, SavCaseError> {
        let batch = if self.buffers.is_empty() {
            RecordBatch::new_empty(self.schema.clone())
        } else {
            let arrays = self
                .buffers
                .iter_mut()
                .zip(self.schema.fields().iter())
                .map(|(buffer, field)| buffer.take_array(field.data_type()))
                .collect::<Result<Vec<_>, _>>()?;
            RecordBatch::try_new(self.schema.clone(), arrays)?
        };
        log_metric!("event" = "decode_batch", "rows" = self.rows_in_batch, "columns" = batch.num_columns());
        self.rows_in_batch = 0;
        Ok(DecodeOutcome {
            batch,
            warnings: std::mem::take(&mut self.warnings),
        })
    }
}

fn scratch_slot(bucket: Bucket) -> usize {
    match bucket {
        Bucket::Datetime => 1,
        Bucket::Time => 2,
        _ => 0,
    }
}

/// The Arrow schema of decoded batches for `layout` under `config`.
pub fn output_schema(layout: &RowLayout, config: &CodecConfig) -> SchemaRef {
    let fields = layout
        .outputs()
        .iter()
        .map(|slot| {
            let column = layout.column(slot.column);
            let data_type = match slot.bucket {
                Bucket::String => DataType::Utf8,
                Bucket::Datetime if config.convert_datetimes => {
                    DataType::Timestamp(config.time_unit, None)
                }
                Bucket::Time if config.convert_datetimes => DataType::Duration(config.time_unit),
                _ => DataType::Float64,
            };
            let metadata = HashMap::from([(
                FORMAT_METADATA_KEY.to_string(),
                column.format.to_string(),
            )]);
            Field::new(column.name.clone(), data_type, true).with_metadata(metadata)
        })
        .collect::<Vec<_>>();
    Arc::new(Schema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnSelection;
    use crate::dictionary::Dictionary;
    use crate::layout::ByteOrder;
    use crate::types::{ColumnDescriptor, MissingValues};
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::{DurationNanosecondType, TimeUnit, TimestampNanosecondType};

    fn layout_for(columns: Vec<ColumnDescriptor>, order: ByteOrder) -> Arc<RowLayout> {
        let dict = Dictionary::new(columns).unwrap();
        Arc::new(RowLayout::build(&dict, &ColumnSelection::All, order))
    }

    fn f(v: f64) -> [u8; 8] {
        v.to_le_bytes()
    }

    #[test]
    fn test_sysmis_and_short_string() {
        // --- ARRANGE ---
        let layout = layout_for(
            vec![ColumnDescriptor::numeric("x"), ColumnDescriptor::string("s", 3)],
            ByteOrder::Little,
        );
        let mut row = Vec::new();
        row.extend_from_slice(&f(-f64::MAX));
        row.extend_from_slice(b"abc     ");

        // --- ACT ---
        let mut decoder = RowDecoder::new(layout, CodecContext::default(), &CodecConfig::default());
        decoder.push_row(&row).unwrap();
        let outcome = decoder.finish().unwrap();

        // --- ASSERT ---
        let x = outcome.batch.column(0).as_primitive::<Float64Type>();
        assert!(x.is_null(0));
        assert_eq!(outcome.batch.column(1).as_string::<i32>().value(0), "abc");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_epoch_offset_decodes_to_unix_zero() {
        let layout = layout_for(
            vec![ColumnDescriptor::datetime("dt"), ColumnDescriptor::time("t")],
            ByteOrder::Little,
        );
        let mut row = Vec::new();
        row.extend_from_slice(&f(epoch::EPOCH_OFFSET_SECONDS));
        row.extend_from_slice(&f(0.0));

        let mut decoder = RowDecoder::new(layout, CodecContext::default(), &CodecConfig::default());
        decoder.push_row(&row).unwrap();
        let batch = decoder.finish().unwrap().batch;

        assert_eq!(
            batch.schema().field(0).data_type(),
            &DataType::Timestamp(TimeUnit::Nanosecond, None)
        );
        assert_eq!(batch.column(0).as_primitive::<TimestampNanosecondType>().value(0), 0);
        assert_eq!(batch.column(1).as_primitive::<DurationNanosecondType>().value(0), 0);
    }

    #[test]
    fn test_open_low_range_nulls_only_without_include() {
        let x = ColumnDescriptor::numeric("x")
            .with_missing(MissingValues::range(f64::NEG_INFINITY, 0.0, None).unwrap())
            .unwrap();
        let layout = layout_for(vec![x], ByteOrder::Little);
        let rows: Vec<[u8; 8]> = vec![f(-1e300), f(0.0), f(0.5)];

        let config = CodecConfig {
            include_user_missing: false,
            ..CodecConfig::default()
        };
        let mut decoder = RowDecoder::new(layout.clone(), CodecContext::default(), &config);
        for r in &rows {
            decoder.push_row(r).unwrap();
        }
        let batch = decoder.finish().unwrap().batch;
        let col = batch.column(0).as_primitive::<Float64Type>();
        assert!(col.is_null(0));
        assert!(col.is_null(1));
        assert_eq!(col.value(2), 0.5);

        let mut decoder = RowDecoder::new(layout, CodecContext::default(), &CodecConfig::default());
        for r in &rows {
            decoder.push_row(r).unwrap();
        }
        let batch = decoder.finish().unwrap().batch;
        assert_eq!(batch.column(0).null_count(), 0);
    }

    #[test]
    fn test_wrong_row_length_is_rejected() {
        let layout = layout_for(vec![ColumnDescriptor::numeric("x")], ByteOrder::Little);
        let mut decoder = RowDecoder::new(layout, CodecContext::default(), &CodecConfig::default());
        let err = decoder.push_row(&[0u8; 7]).unwrap_err();
        assert!(matches!(
            err,
            SavCaseError::InvalidRowBuffer {
                expected: 8,
                actual: 7
            }
        ));
    }

    #[test]
    fn test_string_null_modes_and_text_missing() {
        let s = ColumnDescriptor::string("s", 4)
            .with_missing(MissingValues::text(["NA"]).unwrap())
            .unwrap();
        let layout = layout_for(vec![s], ByteOrder::Little);
        let rows: [&[u8; 8]; 3] = [b"        ", b"NA      ", b"ok      "];

        let run = |config: CodecConfig| {
            let mut decoder = RowDecoder::new(layout.clone(), CodecContext::default(), &config);
            for r in rows {
                decoder.push_row(r).unwrap();
            }
            decoder.finish().unwrap().batch
        };

        let batch = run(CodecConfig {
            include_user_missing: false,
            string_null: StringNull::Null,
            ..CodecConfig::default()
        });
        let col = batch.column(0).as_string::<i32>();
        assert!(col.is_null(0));
        assert!(col.is_null(1));
        assert_eq!(col.value(2), "ok");

        let batch = run(CodecConfig {
            string_null: StringNull::Text("<none>".to_string()),
            ..CodecConfig::default()
        });
        let col = batch.column(0).as_string::<i32>();
        assert_eq!(col.value(0), "<none>");
        assert_eq!(col.value(1), "NA");
    }

    #[test]
    fn test_raw_floats_when_conversion_disabled() {
        let layout = layout_for(vec![ColumnDescriptor::date("d")], ByteOrder::Big);
        let config = CodecConfig {
            convert_datetimes: false,
            ..CodecConfig::default()
        };
        let mut decoder = RowDecoder::new(layout, CodecContext::default(), &config);
        decoder.push_row(&13_000_000_000.0f64.to_be_bytes()).unwrap();
        let batch = decoder.finish().unwrap().batch;
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Float64);
        assert_eq!(
            batch.column(0).as_primitive::<Float64Type>().value(0),
            13_000_000_000.0
        );
        assert_eq!(
            batch.schema().field(0).metadata().get(FORMAT_METADATA_KEY).map(String::as_str),
            Some("DATE11")
        );
    }

    #[test]
    fn test_out_of_range_date_becomes_null_with_warning() {
        let layout = layout_for(vec![ColumnDescriptor::datetime("dt")], ByteOrder::Little);
        let mut decoder = RowDecoder::new(layout, CodecContext::default(), &CodecConfig::default());
        decoder.set_row_index(41);
        decoder.push_row(&f(1e15)).unwrap();
        let outcome = decoder.finish().unwrap();
        assert!(outcome.batch.column(0).is_null(0));
        assert_eq!(
            outcome.warnings,
            vec![CodecWarning::TimestampOutOfRange {
                column: "dt".to_string(),
                row: 41,
                value: 1e15
            }]
        );
    }

    #[test]
    fn test_selection_order_is_output_order() {
        let dict = Dictionary::new(vec![
            ColumnDescriptor::numeric("a"),
            ColumnDescriptor::string("s", 8),
            ColumnDescriptor::numeric("b"),
        ])
        .unwrap();
        let layout = Arc::new(RowLayout::build(
            &dict,
            &ColumnSelection::names(["b", "s"]),
            ByteOrder::Little,
        ));
        let mut row = Vec::new();
        row.extend_from_slice(&f(1.0));
        row.extend_from_slice(b"mid     ");
        row.extend_from_slice(&f(2.0));

        let mut decoder = RowDecoder::new(layout, CodecContext::default(), &CodecConfig::default());
        decoder.push_row(&row).unwrap();
        let batch = decoder.finish().unwrap().batch;
        assert_eq!(batch.schema().field(0).name(), "b");
        assert_eq!(batch.column(0).as_primitive::<Float64Type>().value(0), 2.0);
        assert_eq!(batch.column(1).as_string::<i32>().value(0), "mid");
    }

    #[test]
    fn test_empty_selection_yields_zero_rows() {
        let dict = Dictionary::new(vec![ColumnDescriptor::numeric("a")]).unwrap();
        let layout = Arc::new(RowLayout::build(
            &dict,
            &ColumnSelection::names(Vec::<String>::new()),
            ByteOrder::Little,
        ));
        let mut decoder = RowDecoder::new(layout, CodecContext::default(), &CodecConfig::default());
        decoder.push_row(&f(1.0)).unwrap();
        let batch = decoder.finish().unwrap().batch;
        assert_eq!(batch.num_columns(), 0);
        assert_eq!(batch.num_rows(), 0);
    }
}
