//! Classification of raw values against missing-value rules.
//!
//! All checks run on the on-wire value, before any date/time conversion, so a
//! user missing range on a date column is expressed in wire seconds.

use crate::exchange::CodecContext;
use crate::types::MissingValues;

/// True when `v` is bit-for-bit the system-missing sentinel.
#[inline]
pub fn is_system_missing(v: f64, context: &CodecContext) -> bool {
    v.to_bits() == context.system_missing.to_bits()
}

/// Whether a raw numeric value must be emitted as null.
#[inline]
pub fn numeric_is_null(
    v: f64,
    context: &CodecContext,
    missing: Option<&MissingValues>,
    include_user_missing: bool,
) -> bool {
    if is_system_missing(v, context) {
        return true;
    }
    !include_user_missing && missing.map_or(false, |m| m.matches_number(v))
}

/// Whether a decoded (already trimmed) string must be emptied.
#[inline]
pub fn text_is_user_missing(
    s: &str,
    missing: Option<&MissingValues>,
    include_user_missing: bool,
) -> bool {
    !include_user_missing && missing.map_or(false, |m| m.matches_text(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_missing_is_bit_exact() {
        let ctx = CodecContext::default();
        assert!(is_system_missing(-f64::MAX, &ctx));
        assert!(!is_system_missing(f64::MIN_POSITIVE, &ctx));
        assert!(!is_system_missing(ctx.low_value, &ctx));
    }

    #[test]
    fn test_user_missing_respects_include_flag() {
        let ctx = CodecContext::default();
        let declared = MissingValues::range(f64::NEG_INFINITY, 0.0, None).unwrap();

        assert!(numeric_is_null(-5.0, &ctx, Some(&declared), false));
        assert!(!numeric_is_null(-5.0, &ctx, Some(&declared), true));
        assert!(!numeric_is_null(1.0, &ctx, Some(&declared), false));
        // System missing is null regardless.
        assert!(numeric_is_null(-f64::MAX, &ctx, None, true));
    }

    #[test]
    fn test_text_user_missing() {
        let declared = MissingValues::text(["NA"]).unwrap();
        assert!(text_is_user_missing("NA", Some(&declared), false));
        assert!(!text_is_user_missing("NA", Some(&declared), true));
        assert!(!text_is_user_missing("ok", Some(&declared), false));
    }
}
