// In: src/config.rs

//! The single source of truth for all savcase codec configuration.
//!
//! This module defines the `CodecConfig` struct, which is designed to be created
//! once at the application boundary (e.g., from a JSON document or a caller's
//! options) and then passed down by reference to the decoder, the encoder and
//! the session facades. There are no process-wide mutable defaults.

use arrow_schema::TimeUnit;
use serde::{Deserialize, Serialize};

use crate::error::SavCaseError;

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// What an empty decoded string turns into.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum StringNull {
    /// **Default:** keep the empty string.
    #[default]
    Empty,
    /// Emit an Arrow null.
    Null,
    /// Replace with the given text.
    Text(String),
}

/// Which columns a read returns, and in what order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(tag = "select", content = "names", rename_all = "snake_case")]
pub enum ColumnSelection {
    /// **Default:** every dictionary column, in dictionary order.
    #[default]
    All,
    /// The named columns, in the given order. Unknown names are ignored.
    Names(Vec<String>),
}

impl ColumnSelection {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSelection::Names(names.into_iter().map(Into::into).collect())
    }

    /// Parses a comma-separated list such as `"id, age ,score"`.
    pub fn parse_list(list: &str) -> Self {
        ColumnSelection::Names(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }
}

//==================================================================================
// II. The Unified CodecConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// Convert date, datetime and time columns to Arrow temporal types.
    /// When false they are returned as the raw on-wire float.
    #[serde(default = "default_true")]
    pub convert_datetimes: bool,

    /// Keep values that match a column's user missing specification.
    /// When false they are nulled (numeric) or emptied (text).
    #[serde(default = "default_true")]
    pub include_user_missing: bool,

    #[serde(default)]
    pub string_null: StringNull,

    /// Resolution of decoded timestamps and durations.
    #[serde(default = "default_time_unit")]
    pub time_unit: TimeUnit,

    /// Fraction of currently available memory one encode batch may occupy.
    #[serde(default = "default_memory_allocation")]
    pub memory_allocation: f64,

    /// A fixed byte budget for one encode batch. Overrides `memory_allocation`.
    #[serde(default)]
    pub max_encode_memory_bytes: Option<u64>,

    /// Surface informational statuses and codec warnings through `log::warn!`.
    #[serde(default)]
    pub show_warnings: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            convert_datetimes: true,
            include_user_missing: true,
            string_null: StringNull::default(),
            time_unit: default_time_unit(),
            memory_allocation: default_memory_allocation(),
            max_encode_memory_bytes: None,
            show_warnings: false,
        }
    }
}

impl CodecConfig {
    /// Loads a config from JSON; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SavCaseError> {
        let config: CodecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SavCaseError> {
        if !(self.memory_allocation > 0.0 && self.memory_allocation <= 1.0) {
            return Err(SavCaseError::InvalidConfig(format!(
                "memory_allocation must be in (0, 1], got {}",
                self.memory_allocation
            )));
        }
        if self.max_encode_memory_bytes == Some(0) {
            return Err(SavCaseError::InvalidConfig(
                "max_encode_memory_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

//==================================================================================
// III. Read Requests
//==================================================================================

/// Which slice of the file a reader session covers.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ReadRequest {
    #[serde(default)]
    pub row_offset: u64,

    /// `None` reads to the end of the file.
    #[serde(default)]
    pub row_limit: Option<u64>,

    #[serde(default)]
    pub columns: ColumnSelection,

    /// Rows per streamed batch. `None` streams the whole range as one batch.
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

impl ReadRequest {
    pub fn validate(&self) -> Result<(), SavCaseError> {
        if self.chunk_size == Some(0) {
            return Err(SavCaseError::InvalidConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

fn default_time_unit() -> TimeUnit {
    TimeUnit::Nanosecond
}

fn default_memory_allocation() -> f64 {
    0.1
}
