// In: src/dictionary.rs

//! The ordered column dictionary of a dataset.
//!
//! Column order is significant: it fixes every column's byte offset inside the
//! case record. Names are resolved to positions once, through a hash map built
//! at construction, and positions are used everywhere after that.

use arrow::array::AsArray;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use encoding_rs::Encoding;
use hashbrown::HashMap;
use serde::Serialize;

use crate::error::SavCaseError;
use crate::kernels::text::encoded_len;
use crate::types::column::{ColumnDescriptor, MAX_STRING_WIDTH};

#[derive(Debug, Clone, Serialize)]
pub struct Dictionary {
    columns: Vec<ColumnDescriptor>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Dictionary {
    /// Builds a dictionary, rejecting empty and duplicate names and any
    /// descriptor whose width, format or missing values do not fit its storage.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Result<Self, SavCaseError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if col.name.is_empty() {
                return Err(SavCaseError::InvalidFormat(format!(
                    "column {} has an empty name",
                    i
                )));
            }
            col.validate()?;
            if index.insert(col.name.clone(), i).is_some() {
                return Err(SavCaseError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self { columns, index })
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Size in bytes of one case record described by this dictionary.
    pub fn row_size(&self) -> usize {
        self.columns.iter().map(ColumnDescriptor::byte_width).sum()
    }

    /// Infers a dictionary for writing `batch`.
    ///
    /// Text columns become strings as wide as their longest encoded value;
    /// temporal columns get the default date, datetime or time formats; every
    /// other numeric or boolean column becomes a plain `F8.2` number.
    pub fn infer_from_batch(
        batch: &RecordBatch,
        encoding: &'static Encoding,
    ) -> Result<Self, SavCaseError> {
        let schema = batch.schema();
        let mut columns = Vec::with_capacity(schema.fields().len());

        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            let name = field.name().clone();
            let col = match field.data_type() {
                DataType::Utf8 => {
                    let arr = array.as_string::<i32>();
                    let width = arr
                        .iter()
                        .flatten()
                        .map(|s| encoded_len(s, encoding))
                        .max()
                        .unwrap_or(1);
                    ColumnDescriptor::string(name, width.clamp(1, MAX_STRING_WIDTH))
                }
                DataType::LargeUtf8 => {
                    let arr = array.as_string::<i64>();
                    let width = arr
                        .iter()
                        .flatten()
                        .map(|s| encoded_len(s, encoding))
                        .max()
                        .unwrap_or(1);
                    ColumnDescriptor::string(name, width.clamp(1, MAX_STRING_WIDTH))
                }
                DataType::Binary => {
                    let width = array
                        .as_binary::<i32>()
                        .iter()
                        .flatten()
                        .map(<[u8]>::len)
                        .max()
                        .unwrap_or(1);
                    ColumnDescriptor::string(name, width.clamp(1, MAX_STRING_WIDTH))
                }
                DataType::LargeBinary => {
                    let width = array
                        .as_binary::<i64>()
                        .iter()
                        .flatten()
                        .map(<[u8]>::len)
                        .max()
                        .unwrap_or(1);
                    ColumnDescriptor::string(name, width.clamp(1, MAX_STRING_WIDTH))
                }
                DataType::Timestamp(_, _) | DataType::Date64 => ColumnDescriptor::datetime(name),
                DataType::Date32 => ColumnDescriptor::date(name),
                DataType::Duration(_) => ColumnDescriptor::time(name),
                dt if dt.is_numeric() || *dt == DataType::Boolean || *dt == DataType::Null => {
                    ColumnDescriptor::numeric(name)
                }
                other => {
                    return Err(SavCaseError::TypeMismatch {
                        column: name,
                        expected: "a numeric, temporal or text column".to_string(),
                        found: other.to_string(),
                    })
                }
            };
            columns.push(col);
        }
        log::debug!(
            "Inferred dictionary with {} columns ({} rows sampled)",
            columns.len(),
            batch.num_rows()
        );
        Self::new(columns)
    }
}
