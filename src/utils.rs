//! This module provides a set of shared, low-level utility functions used
//! throughout the savcase core.
//!
//! Its primary responsibilities include:
//! 1.  Word-size arithmetic for fixed-width record fields.
//! 2.  Querying the host for currently available memory.

use sysinfo::System;

/// Every field in a case record is a whole number of 8-byte words.
pub const WORD_SIZE: usize = 8;

//==================================================================================
// 1. Core Utility Functions
//==================================================================================

/// Rounds `n` up to the next multiple of [`WORD_SIZE`].
pub fn round_up_to_word(n: usize) -> usize {
    n.div_ceil(WORD_SIZE) * WORD_SIZE
}

/// Bytes of memory the OS reports as currently available.
pub fn available_memory_bytes() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.available_memory()
}
