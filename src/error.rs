// In: src/error.rs

//! This module defines the single, unified error type for the entire savcase library,
//! plus the non-fatal warning channel that travels alongside successful results.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::exchange::status::StatusCode;

#[derive(Error, Debug)]
pub enum SavCaseError {
    // =========================================================================
    // === Codec Errors (raised by the row decoder / encoder)
    // =========================================================================
    #[error("Invalid row buffer: expected {expected} bytes, got {actual}")]
    InvalidRowBuffer { expected: usize, actual: usize },

    #[error("Text in column '{column}' could not be converted with encoding {encoding}: {detail}")]
    EncodingFailure {
        column: String,
        encoding: &'static str,
        detail: String,
    },

    #[error("{operation} failed with status {status}{}{}", fmt_row(.row), fmt_column(.column))]
    Upstream {
        operation: &'static str,
        status: StatusCode,
        row: Option<u64>,
        column: Option<String>,
    },

    // =========================================================================
    // === Dictionary & Layout Errors
    // =========================================================================
    #[error("Dictionary row size {dictionary_row_size} does not match session row size {session_row_size}")]
    LayoutMismatch {
        dictionary_row_size: usize,
        session_row_size: usize,
    },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Column '{column}' cannot hold {found}: {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid missing-value specification: {0}")]
    InvalidMissingSpec(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("The row exchange session has already been closed")]
    SessionClosed,

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading a config.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

fn fmt_row(row: &Option<u64>) -> String {
    row.map(|r| format!(" at row {}", r)).unwrap_or_default()
}

fn fmt_column(column: &Option<String>) -> String {
    column
        .as_ref()
        .map(|c| format!(" (column '{}')", c))
        .unwrap_or_default()
}

impl SavCaseError {
    /// Builds an `Upstream` error with no row or column context attached yet.
    pub fn upstream(operation: &'static str, status: StatusCode) -> Self {
        SavCaseError::Upstream {
            operation,
            status,
            row: None,
            column: None,
        }
    }

    /// Attaches a row index to an `Upstream` error. Other variants pass through.
    pub fn at_row(self, at: u64) -> Self {
        match self {
            SavCaseError::Upstream {
                operation,
                status,
                column,
                ..
            } => SavCaseError::Upstream {
                operation,
                status,
                row: Some(at),
                column,
            },
            other => other,
        }
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<SavCaseError> for arrow::error::ArrowError {
    fn from(err: SavCaseError) -> Self {
        match err {
            SavCaseError::Arrow(inner) => inner,
            other => arrow::error::ArrowError::ExternalError(Box::new(other)),
        }
    }
}

// =============================================================================
// === Warning Channel ===
// =============================================================================

/// A non-fatal condition observed while decoding or encoding rows.
///
/// Warnings never abort an operation. They are collected and returned next to
/// the result so the caller can decide whether to surface them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodecWarning {
    /// A text value was longer than its column and was cut to fit.
    Truncation {
        column: String,
        row: u64,
        width: usize,
        encoded_len: usize,
    },
    /// The row exchange reported an informational status.
    Upstream {
        operation: &'static str,
        status: StatusCode,
        row: Option<u64>,
    },
    /// A date/time value does not fit the chosen Arrow time unit and was nulled.
    TimestampOutOfRange { column: String, row: u64, value: f64 },
}

impl fmt::Display for CodecWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecWarning::Truncation {
                column,
                row,
                width,
                encoded_len,
            } => write!(
                f,
                "value in column '{}' at row {} truncated from {} to {} bytes",
                column, row, encoded_len, width
            ),
            CodecWarning::Upstream {
                operation,
                status,
                row,
            } => write!(f, "{} reported {}{}", operation, status, fmt_row(row)),
            CodecWarning::TimestampOutOfRange { column, row, value } => write!(
                f,
                "value {} in column '{}' at row {} is outside the representable time range",
                value, column, row
            ),
        }
    }
}
