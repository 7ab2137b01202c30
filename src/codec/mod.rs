// In: src/codec/mod.rs

//! The row codec.
//!
//! `decoder` turns case records into Arrow batches; `encoder` turns Arrow
//! batches back into case records. Both are driven by a shared, immutable
//! [`RowLayout`](crate::layout::RowLayout) and never perform I/O themselves.

pub mod decoder;
pub mod encoder;

pub use decoder::{output_schema, DecodeOutcome, RowDecoder, FORMAT_METADATA_KEY};
pub use encoder::{plan_batch_rows, EncodeOutcome, RowEncoder};
