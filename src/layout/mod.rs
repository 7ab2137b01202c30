// In: src/layout/mod.rs

//! The case-record layout builder.
//!
//! Given a dictionary and the subset of columns the caller wants, this module
//! computes, once per session, where every column lives inside a row buffer and
//! how the wanted columns group into four decode buckets. Adjacent columns of
//! the same bucket are merged into a single byte span so the decoder can copy
//! each bucket with the fewest possible slices.
//!
//! The builder is a single linear pass over *all* dictionary columns. Inactive
//! columns still advance the running offset; they are simply not recorded in
//! any bucket.

use serde::Serialize;

use crate::config::ColumnSelection;
use crate::dictionary::Dictionary;
use crate::error::SavCaseError;
use crate::exchange::CodecContext;
use crate::kernels::float8;
use crate::types::column::{ColumnDescriptor, StorageKind};
use crate::types::format::FormatCategory;

//==================================================================================
// 1. Layout Types
//==================================================================================

/// Byte order of the numeric fields in a case record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// Maps the endian code of the host's release information (`0` little,
    /// `1` big).
    pub fn from_release_code(code: i32) -> Result<Self, SavCaseError> {
        match code {
            0 => Ok(ByteOrder::Little),
            1 => Ok(ByteOrder::Big),
            other => Err(SavCaseError::InvalidConfig(format!(
                "unknown endian code {}",
                other
            ))),
        }
    }
}

/// The decode category a column is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Numeric,
    /// Dates and datetimes; both are seconds since the SPSS epoch.
    Datetime,
    /// Durations in seconds.
    Time,
    String,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::Numeric, Bucket::Datetime, Bucket::Time, Bucket::String];

    fn index(self) -> usize {
        match self {
            Bucket::Numeric => 0,
            Bucket::Datetime => 1,
            Bucket::Time => 2,
            Bucket::String => 3,
        }
    }

    /// Routes a column by storage first, then by format category.
    pub fn classify(column: &ColumnDescriptor) -> Self {
        if column.storage.is_string() {
            return Bucket::String;
        }
        match column.category() {
            FormatCategory::Date | FormatCategory::Datetime => Bucket::Datetime,
            FormatCategory::Time => Bucket::Time,
            _ => Bucket::Numeric,
        }
    }
}

/// A half-open byte range `[start, end)` of a row buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Where one dictionary column sits inside the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnPlacement {
    pub offset: usize,
    pub width: usize,
    pub storage: StorageKind,
    pub active: bool,
}

/// The active columns of one bucket and the merged spans that cover them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketLayout {
    /// Dictionary indices, in declaration order.
    pub columns: Vec<usize>,
    pub spans: Vec<Span>,
    /// Start of each member column inside the concatenated span bytes.
    pub packed_offsets: Vec<usize>,
}

impl BucketLayout {
    /// Bytes of the bucket once its spans are concatenated.
    pub fn packed_len(&self) -> usize {
        self.spans.iter().map(Span::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn push(&mut self, column: usize, offset: usize, width: usize) -> usize {
        let position = self.columns.len();
        self.packed_offsets.push(self.packed_len());
        self.columns.push(column);
        match self.spans.last_mut() {
            Some(span) if span.end == offset => span.end += width,
            _ => self.spans.push(Span {
                start: offset,
                end: offset + width,
            }),
        }
        position
    }
}

/// One column of the decoded output, in selection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputSlot {
    /// Dictionary index.
    pub column: usize,
    pub bucket: Bucket,
    /// Position among the bucket's members.
    pub position: usize,
}

/// The immutable, per-session byte layout of a case record.
#[derive(Debug, Clone, Serialize)]
pub struct RowLayout {
    row_size: usize,
    byte_order: ByteOrder,
    dictionary: Dictionary,
    placements: Vec<ColumnPlacement>,
    buckets: [BucketLayout; 4],
    outputs: Vec<OutputSlot>,
}

//==================================================================================
// 2. Public API
//==================================================================================

impl RowLayout {
    /// Builds the layout for `selection` over `dictionary`.
    ///
    /// Selected names that the dictionary does not contain are dropped, and a
    /// name selected twice keeps its first position. This never fails: an empty
    /// selection yields a layout with empty buckets and no outputs.
    pub fn build(
        dictionary: &Dictionary,
        selection: &ColumnSelection,
        byte_order: ByteOrder,
    ) -> Self {
        let selected = resolve_selection(dictionary, selection);

        let mut active = vec![false; dictionary.len()];
        for &idx in &selected {
            active[idx] = true;
        }

        let mut buckets: [BucketLayout; 4] = Default::default();
        let mut placements = Vec::with_capacity(dictionary.len());
        let mut bucket_of = vec![None; dictionary.len()];
        let mut offset = 0usize;

        for (idx, column) in dictionary.columns().iter().enumerate() {
            let width = column.byte_width();
            if active[idx] {
                let bucket = Bucket::classify(column);
                let position = buckets[bucket.index()].push(idx, offset, width);
                bucket_of[idx] = Some((bucket, position));
            }
            placements.push(ColumnPlacement {
                offset,
                width,
                storage: column.storage,
                active: active[idx],
            });
            offset += width;
        }

        let outputs = selected
            .iter()
            .filter_map(|&idx| {
                bucket_of[idx].map(|(bucket, position)| OutputSlot {
                    column: idx,
                    bucket,
                    position,
                })
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Built row layout: row_size={} active={}/{} spans=[num:{} dt:{} time:{} str:{}]",
            offset,
            outputs.len(),
            dictionary.len(),
            buckets[0].spans.len(),
            buckets[1].spans.len(),
            buckets[2].spans.len(),
            buckets[3].spans.len()
        );

        Self {
            row_size: offset,
            byte_order,
            dictionary: dictionary.clone(),
            placements,
            buckets,
            outputs,
        }
    }

    pub fn row_size(&self) -> usize {
        self.row_size
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn bucket(&self, bucket: Bucket) -> &BucketLayout {
        &self.buckets[bucket.index()]
    }

    /// The full dictionary the layout was built from, active columns or not.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn column(&self, idx: usize) -> &ColumnDescriptor {
        &self.dictionary.columns()[idx]
    }

    pub fn placements(&self) -> &[ColumnPlacement] {
        &self.placements
    }

    pub fn outputs(&self) -> &[OutputSlot] {
        &self.outputs
    }

    /// A row holding no data: system missing in every numeric field and
    /// spaces in every string field.
    pub fn blank_row(&self, context: &CodecContext) -> Vec<u8> {
        let mut row = vec![b' '; self.row_size];
        for p in self.placements.iter().filter(|p| !p.storage.is_string()) {
            float8::write_f64(
                &mut row[p.offset..p.offset + p.width],
                context.system_missing,
                self.byte_order,
            );
        }
        row
    }

    /// A JSON rendering of the layout, for diagnostics.
    pub fn describe(&self) -> Result<String, SavCaseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Turns a selection into ordered, unique dictionary indices.
fn resolve_selection(dictionary: &Dictionary, selection: &ColumnSelection) -> Vec<usize> {
    match selection {
        ColumnSelection::All => (0..dictionary.len()).collect(),
        ColumnSelection::Names(names) => {
            let mut seen = vec![false; dictionary.len()];
            let mut out = Vec::with_capacity(names.len());
            for name in names {
                match dictionary.index_of(name) {
                    Some(idx) if !seen[idx] => {
                        seen[idx] = true;
                        out.push(idx);
                    }
                    Some(_) => {}
                    None => log::debug!("Ignoring unknown column '{}' in selection", name),
                }
            }
            out
        }
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests;
