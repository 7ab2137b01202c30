// In: src/exchange/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Row Exchange Seam
// ====================================================================================
//
// The codec never touches a file. Rows move in and out through two traits that
// model the native I/O library's case-level calls:
//
//   [RowSource]  session() -> seek(row) -> read_next_row(buf)* -> close()
//   [RowSink]    session() -> (write_row(buf) | set_value(..)* commit_row())* -> close()
//
// Every call reports a raw `StatusCode` on failure. The bridge layer classifies
// it (error / warning / end of file) and attaches row and column context.
//
// `MemoryCaseFile` implements both traits over an in-memory byte vector.
// ====================================================================================

pub mod memory;
pub mod status;

use encoding_rs::{Encoding, UTF_8};

use crate::error::SavCaseError;
use crate::layout::ByteOrder;

pub use memory::MemoryCaseFile;
pub use status::{StatusClass, StatusCode};

//==================================================================================
// 1. Session Constants
//==================================================================================

/// Host constants the codec needs to interpret row bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecContext {
    /// The float that means "no data present".
    pub system_missing: f64,
    /// Reserved lowest value; open-ended missing ranges start here.
    pub low_value: f64,
    /// Reserved highest value; open-ended missing ranges end here.
    pub high_value: f64,
    /// Encoding of string fields.
    pub encoding: &'static Encoding,
}

impl Default for CodecContext {
    fn default() -> Self {
        Self {
            system_missing: -f64::MAX,
            low_value: f64::from_bits(0xFFEF_FFFF_FFFF_FFFE),
            high_value: f64::MAX,
            encoding: UTF_8,
        }
    }
}

impl CodecContext {
    /// Switches the text encoding by WHATWG label (`"windows-1252"`, `"utf-8"`).
    ///
    /// Only ASCII-compatible encodings are accepted: string fields are padded
    /// with the byte `0x20`, which UTF-16 cannot represent on its own.
    pub fn with_encoding_label(mut self, label: &str) -> Result<Self, SavCaseError> {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| SavCaseError::InvalidConfig(format!("unknown encoding '{}'", label)))?;
        if encoding.output_encoding() != encoding {
            return Err(SavCaseError::InvalidConfig(format!(
                "encoding {} cannot be used for fixed-width fields",
                encoding.name()
            )));
        }
        self.encoding = encoding;
        Ok(self)
    }
}

/// What the row exchange reports about an open session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionInfo {
    pub row_size: usize,
    pub byte_order: ByteOrder,
    /// Rows currently in the file.
    pub case_count: u64,
    pub context: CodecContext,
}

//==================================================================================
// 2. Row Exchange Traits
//==================================================================================

/// Index of a dictionary column, as understood by the row exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnHandle(pub usize);

/// One cell handed to [`RowSink::set_value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    Number(f64),
    /// Encoded text, at most the column's declared width, without padding.
    Text(&'a [u8]),
}

/// Reads whole case records.
///
/// Methods return `Err(status)` for every non-OK status, including
/// informational ones; the caller decides how to classify them. For
/// `read_next_row`, `StatusCode::FILE_END` means no more rows.
pub trait RowSource {
    fn session(&self) -> &SessionInfo;

    /// Fills `buf` (exactly `row_size` bytes) with the next row.
    fn read_next_row(&mut self, buf: &mut [u8]) -> Result<(), StatusCode>;

    /// Positions the cursor so the next read returns row `row` (0-based).
    fn seek(&mut self, row: u64) -> Result<(), StatusCode>;

    fn close(&mut self) -> Result<(), StatusCode>;
}

/// Writes case records, either whole or one value at a time.
pub trait RowSink {
    fn session(&self) -> &SessionInfo;

    fn write_row(&mut self, row: &[u8]) -> Result<(), StatusCode>;

    /// Sets one cell of the pending row. Cells never set keep their blank value.
    fn set_value(&mut self, column: ColumnHandle, value: CellValue<'_>) -> Result<(), StatusCode>;

    /// Appends the pending row and starts a fresh blank one.
    fn commit_row(&mut self) -> Result<(), StatusCode>;

    fn close(&mut self) -> Result<(), StatusCode>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_uses_host_sentinels() {
        let ctx = CodecContext::default();
        assert_eq!(ctx.system_missing, -f64::MAX);
        assert!(ctx.low_value > ctx.system_missing);
        assert_eq!(ctx.encoding, UTF_8);
    }

    #[test]
    fn test_encoding_labels() {
        let ctx = CodecContext::default().with_encoding_label("latin1").unwrap();
        assert_eq!(ctx.encoding.name(), "windows-1252");
        assert!(CodecContext::default().with_encoding_label("utf-16le").is_err());
        assert!(CodecContext::default().with_encoding_label("klingon").is_err());
    }
}
