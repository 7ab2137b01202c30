//! This module defines the core, strongly-typed dictionary model used
//! throughout the savcase codec.
//!
//! It holds the print format codes that decide a column's meaning, the column
//! descriptor itself, and the user missing-value specifications.

pub mod column;
pub mod format;
pub mod missing;

// Re-export the main type(s) for easier access.
pub use column::{ColumnDescriptor, StorageKind, MAX_STRING_WIDTH};
pub use format::{FormatCategory, FormatSpec, FormatType};
pub use missing::MissingValues;
