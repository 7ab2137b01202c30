//! This module contains the kernel for 8-byte floating point fields.
//!
//! Numeric fields are IEEE-754 doubles in the byte order the session reports.
//! Gathering goes through a `Vec<f64>` viewed as bytes with `bytemuck`, so the
//! resulting floats are always correctly aligned regardless of where the spans
//! sat inside the row buffer.

use crate::layout::{ByteOrder, Span};

//==================================================================================
// 1. Public API
//==================================================================================

/// Copies the bytes of `spans` out of `row` and reinterprets them as floats.
///
/// `out` is resized to hold exactly `sum(span lengths) / 8` values. The spans
/// must be 8-byte multiples and lie inside `row`; the layout builder guarantees
/// both.
pub fn gather(row: &[u8], spans: &[Span], order: ByteOrder, out: &mut Vec<f64>) {
    let total: usize = spans.iter().map(Span::len).sum();
    out.clear();
    out.resize(total / 8, 0.0);

    let bytes: &mut [u8] = bytemuck::cast_slice_mut(out.as_mut_slice());
    let mut pos = 0;
    for span in spans {
        bytes[pos..pos + span.len()].copy_from_slice(&row[span.range()]);
        pos += span.len();
    }

    if order != ByteOrder::native() {
        for v in out.iter_mut() {
            *v = f64::from_bits(v.to_bits().swap_bytes());
        }
    }
}

/// Reads one float from the first 8 bytes of `src`.
pub fn read_f64(src: &[u8], order: ByteOrder) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&src[..8]);
    match order {
        ByteOrder::Little => f64::from_le_bytes(raw),
        ByteOrder::Big => f64::from_be_bytes(raw),
    }
}

/// Writes one float into the first 8 bytes of `dst`.
pub fn write_f64(dst: &mut [u8], value: f64, order: ByteOrder) {
    let raw = match order {
        ByteOrder::Little => value.to_le_bytes(),
        ByteOrder::Big => value.to_be_bytes(),
    };
    dst[..8].copy_from_slice(&raw);
}

//==================================================================================
// 2. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn row_of(values: &[f64], order: ByteOrder) -> Vec<u8> {
        let mut row = vec![0u8; values.len() * 8];
        for (i, v) in values.iter().enumerate() {
            write_f64(&mut row[i * 8..], *v, order);
        }
        row
    }

    #[test]
    fn test_gather_non_contiguous_spans() {
        let row = row_of(&[1.0, 2.0, 3.0, 4.0], ByteOrder::Little);
        let spans = [Span { start: 0, end: 8 }, Span { start: 16, end: 32 }];
        let mut out = Vec::new();
        gather(&row, &spans, ByteOrder::Little, &mut out);
        assert_eq!(out, vec![1.0, 3.0, 4.0]);
    }

    #[test]
    fn test_gather_big_endian() {
        let row = row_of(&[-1.5, 1e300], ByteOrder::Big);
        let mut out = Vec::new();
        gather(&row, &[Span { start: 0, end: 16 }], ByteOrder::Big, &mut out);
        assert_eq!(out, vec![-1.5, 1e300]);
    }

    #[test]
    fn test_read_write_preserve_bits() {
        let sysmis = -f64::MAX;
        let mut buf = [0u8; 8];
        for order in [ByteOrder::Little, ByteOrder::Big] {
            write_f64(&mut buf, sysmis, order);
            assert_eq!(read_f64(&buf, order).to_bits(), sysmis.to_bits());
        }
        write_f64(&mut buf, 1.0, ByteOrder::Big);
        assert_eq!(buf, [0x3F, 0xF0, 0, 0, 0, 0, 0, 0]);
    }
}
