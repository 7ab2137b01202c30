// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the public-facing API of savcase. It ties a row exchange
// session (`RowSource` / `RowSink`) to the pure, I/O-free codec and owns the
// session's lifetime.
//
// Data Flow (Read):
//
//   1. [Stateful Facade (CaseReader::open)]  -> validates the session, builds the layout
//         |
//         `-> seeks to `row_offset`, hands everything to ->
//
//   2. [CaseBatchIter]                       -> reads `chunk_size` rows per step
//         |
//         `-> pushes each row into the `RowDecoder` ->
//
//   3. [Codec (codec::decoder)]              -> Returns a `RecordBatch`
//
//
// Data Flow (Write):
//
//   1. [Stateful Facade (CaseWriter)]        -> Receives `RecordBatch`es
//         |
//         `-> slices each batch to the memory bound, calls ->
//
//   2. [Codec (codec::encoder)]              -> Returns contiguous row bytes
//         |
//         `-> each row goes to `RowSink::write_row` (or `set_value` + `commit_row`)
//
// The stateless API exposes the codec directly for callers that already hold
// row bytes. Sessions are closed exactly once, on every exit path.
// ====================================================================================
pub mod reader;
pub(crate) mod session;
pub mod stateless_api;
pub mod writer;

// --- High-Level Stateful API ---
pub use reader::{CaseBatchIter, CaseReader};
pub use writer::{CaseWriter, WriteSummary};

// --- Low-Level Stateless API ---
pub use stateless_api::{build_layout, decode_batch, describe_layout, encode_batch};
