//! This module owns every rule that turns a present-looking value into a null.
//!
//! `sentinel` classifies raw on-wire floats and strings against the system
//! missing value and the column's user missing specification. `bitmap`
//! rebuilds Arrow arrays from dense values plus a validity mask.

pub mod bitmap;
pub mod sentinel;
