//! This module contains the pure, stateless kernels of the row codec.
//!
//! Each kernel converts one kind of field between its on-wire bytes and its
//! in-memory value. Kernels know nothing about dictionaries, sessions or Arrow
//! batches; the decoder and encoder compose them.

pub mod epoch;
pub mod float8;
pub mod text;
