// In: src/types/column.rs

//! The column descriptor: name, storage kind, print format and missing values.

use serde::{Deserialize, Serialize};

use crate::error::SavCaseError;
use crate::types::format::{FormatCategory, FormatSpec};
use crate::types::missing::MissingValues;
use crate::utils::round_up_to_word;

/// Widest string column the row exchange accepts.
pub const MAX_STRING_WIDTH: usize = 32767;

/// Only strings up to this width may declare text missing values.
pub const MAX_SHORT_STRING: usize = 8;

/// How a column's bytes are stored inside a case record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "width", rename_all = "snake_case")]
pub enum StorageKind {
    /// One 8-byte float.
    Numeric,
    /// A fixed-width, space-padded byte field of the given declared width.
    String(usize),
}

impl StorageKind {
    /// Bytes the column occupies in a row: 8 for numerics, the declared width
    /// rounded up to a multiple of 8 for strings.
    pub fn byte_width(&self) -> usize {
        match self {
            StorageKind::Numeric => 8,
            StorageKind::String(w) => round_up_to_word(*w),
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, StorageKind::String(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub storage: StorageKind,
    pub format: FormatSpec,
    #[serde(default)]
    pub missing: Option<MissingValues>,
}

impl ColumnDescriptor {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::with_storage(name, StorageKind::Numeric, FormatSpec::default_numeric())
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::with_storage(name, StorageKind::Numeric, FormatSpec::default_date())
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::with_storage(name, StorageKind::Numeric, FormatSpec::default_datetime())
    }

    pub fn time(name: impl Into<String>) -> Self {
        Self::with_storage(name, StorageKind::Numeric, FormatSpec::default_time())
    }

    /// A string column of `width` declared bytes. Widths are clamped into
    /// `1..=MAX_STRING_WIDTH`.
    pub fn string(name: impl Into<String>, width: usize) -> Self {
        let width = width.clamp(1, MAX_STRING_WIDTH);
        Self::with_storage(name, StorageKind::String(width), FormatSpec::string(width))
    }

    fn with_storage(name: impl Into<String>, storage: StorageKind, format: FormatSpec) -> Self {
        Self {
            name: name.into(),
            storage,
            format,
            missing: None,
        }
    }

    /// Replaces the print format. String formats on numeric storage (and the
    /// reverse) are rejected.
    pub fn with_format(mut self, format: FormatSpec) -> Result<Self, SavCaseError> {
        self.check_format(&format)?;
        self.format = format;
        Ok(self)
    }

    pub fn with_missing(mut self, missing: MissingValues) -> Result<Self, SavCaseError> {
        self.check_missing(&missing)?;
        self.missing = Some(missing);
        Ok(self)
    }

    /// Re-checks a descriptor that did not come through the builders, such as
    /// one loaded from JSON.
    pub fn validate(&self) -> Result<(), SavCaseError> {
        if let StorageKind::String(w) = self.storage {
            if !(1..=MAX_STRING_WIDTH).contains(&w) {
                return Err(SavCaseError::InvalidFormat(format!(
                    "column '{}' has string width {}, expected 1..={}",
                    self.name, w, MAX_STRING_WIDTH
                )));
            }
        }
        self.check_format(&self.format)?;
        match &self.missing {
            Some(missing) => self.check_missing(missing),
            None => Ok(()),
        }
    }

    fn check_format(&self, format: &FormatSpec) -> Result<(), SavCaseError> {
        let is_string_format = format.category() == FormatCategory::StringFormat;
        if is_string_format != self.storage.is_string() {
            return Err(SavCaseError::InvalidFormat(format!(
                "format {} is incompatible with column '{}'",
                format, self.name
            )));
        }
        Ok(())
    }

    fn check_missing(&self, missing: &MissingValues) -> Result<(), SavCaseError> {
        missing.validate()?;
        match (&self.storage, missing.is_text()) {
            (StorageKind::Numeric, false) => Ok(()),
            (StorageKind::String(w), true) if *w <= MAX_SHORT_STRING => Ok(()),
            (StorageKind::String(w), true) => Err(SavCaseError::InvalidMissingSpec(format!(
                "column '{}' is a long string ({} bytes); only strings up to {} bytes may declare missing values",
                self.name, w, MAX_SHORT_STRING
            ))),
            _ => Err(SavCaseError::InvalidMissingSpec(format!(
                "missing-value kind does not match column '{}'",
                self.name
            ))),
        }
    }

    pub fn byte_width(&self) -> usize {
        self.storage.byte_width()
    }

    /// String storage always reads as text, whatever the format says.
    pub fn category(&self) -> FormatCategory {
        if self.storage.is_string() {
            FormatCategory::StringFormat
        } else {
            match self.format.category() {
                FormatCategory::StringFormat => FormatCategory::PlainNumeric,
                other => other,
            }
        }
    }
}
