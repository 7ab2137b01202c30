//! This file is the root of the `savcase` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`layout`, `codec`,
//!     `bridge`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types most callers need.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod codec;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod exchange;
pub mod kernels;
pub mod layout;
pub mod null_handling;
pub mod types;
pub mod utils;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use bridge::{CaseBatchIter, CaseReader, CaseWriter, WriteSummary};
pub use codec::{DecodeOutcome, EncodeOutcome, RowDecoder, RowEncoder};
pub use config::{CodecConfig, ColumnSelection, ReadRequest, StringNull};
pub use dictionary::Dictionary;
pub use error::{CodecWarning, SavCaseError};
pub use exchange::{CellValue, CodecContext, ColumnHandle, MemoryCaseFile, RowSink, RowSource, SessionInfo};
pub use layout::{ByteOrder, RowLayout};
pub use observability::enable_verbose_logging;
pub use types::{ColumnDescriptor, FormatSpec, FormatType, MissingValues};
