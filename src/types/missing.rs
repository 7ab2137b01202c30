// In: src/types/missing.rs

//! User-declared missing values.
//!
//! A user missing value is a real, present value that the dataset author asked
//! to be treated as missing (e.g. `-99` meaning "refused"). Numeric columns may
//! declare up to three discrete values, or an inclusive range plus at most one
//! extra discrete value. Short string columns may declare up to three values.

use serde::{Deserialize, Serialize};

use crate::error::SavCaseError;

/// Maximum number of discrete missing values a column can declare.
pub const MAX_DISCRETE: usize = 3;

/// Raw missing-format codes used by the row exchange.
pub const MISS_NONE: i32 = 0;
pub const MISS_RANGE: i32 = -2;
pub const MISS_RANGE_AND_VALUE: i32 = -3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingValues {
    Numeric {
        #[serde(default)]
        values: Vec<f64>,
        /// Inclusive `(lo, hi)`; infinite bounds are open-ended.
        #[serde(default)]
        range: Option<(f64, f64)>,
    },
    Text {
        values: Vec<String>,
    },
}

impl MissingValues {
    pub fn discrete(values: Vec<f64>) -> Result<Self, SavCaseError> {
        let declared = MissingValues::Numeric {
            values,
            range: None,
        };
        declared.validate()?;
        Ok(declared)
    }

    pub fn range(lo: f64, hi: f64, value: Option<f64>) -> Result<Self, SavCaseError> {
        let declared = MissingValues::Numeric {
            values: value.into_iter().collect(),
            range: Some((lo, hi)),
        };
        declared.validate()?;
        Ok(declared)
    }

    pub fn text<I, S>(values: I) -> Result<Self, SavCaseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let declared = MissingValues::Text {
            values: values.into_iter().map(Into::into).collect(),
        };
        declared.validate()?;
        Ok(declared)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, MissingValues::Text { .. })
    }

    pub fn validate(&self) -> Result<(), SavCaseError> {
        match self {
            MissingValues::Numeric { values, range } => {
                let limit = if range.is_some() { 1 } else { MAX_DISCRETE };
                if values.len() > limit {
                    return Err(SavCaseError::InvalidMissingSpec(format!(
                        "{} discrete values given, at most {} allowed",
                        values.len(),
                        limit
                    )));
                }
                if values.iter().any(|v| v.is_nan()) {
                    return Err(SavCaseError::InvalidMissingSpec(
                        "NaN cannot be a missing value".to_string(),
                    ));
                }
                if let Some((lo, hi)) = range {
                    if lo.is_nan() || hi.is_nan() || lo > hi {
                        return Err(SavCaseError::InvalidMissingSpec(format!(
                            "invalid range [{}, {}]",
                            lo, hi
                        )));
                    }
                }
                if values.is_empty() && range.is_none() {
                    return Err(SavCaseError::InvalidMissingSpec(
                        "empty numeric specification".to_string(),
                    ));
                }
                Ok(())
            }
            MissingValues::Text { values } => {
                if values.is_empty() || values.len() > MAX_DISCRETE {
                    return Err(SavCaseError::InvalidMissingSpec(format!(
                        "{} text values given, between 1 and {} allowed",
                        values.len(),
                        MAX_DISCRETE
                    )));
                }
                Ok(())
            }
        }
    }

    /// True when `v` is one of the discrete values or falls inside the range.
    pub fn matches_number(&self, v: f64) -> bool {
        match self {
            MissingValues::Numeric { values, range } => {
                values.iter().any(|m| *m == v)
                    || range.map_or(false, |(lo, hi)| lo <= v && v <= hi)
            }
            MissingValues::Text { .. } => false,
        }
    }

    /// Compares against right-trimmed declared values.
    pub fn matches_text(&self, s: &str) -> bool {
        match self {
            MissingValues::Text { values } => {
                values.iter().any(|m| m.trim_end_matches(' ') == s)
            }
            MissingValues::Numeric { .. } => false,
        }
    }

    //==============================================================================
    // Raw conversion (row exchange representation)
    //==============================================================================

    /// Builds numeric missing values from the raw `(code, v1, v2, v3)` form.
    ///
    /// Range bounds at or beyond the host's reserved lowest/highest values
    /// become open-ended (`-inf` / `+inf`). Returns `Ok(None)` for code `0`.
    pub fn from_raw_numeric(
        code: i32,
        raw: [f64; 3],
        low_value: f64,
        high_value: f64,
    ) -> Result<Option<Self>, SavCaseError> {
        let open = |lo: f64, hi: f64| {
            let lo = if lo <= low_value { f64::NEG_INFINITY } else { lo };
            let hi = if hi >= high_value { f64::INFINITY } else { hi };
            (lo, hi)
        };
        let declared = match code {
            MISS_NONE => return Ok(None),
            1..=3 => MissingValues::Numeric {
                values: raw[..code as usize].to_vec(),
                range: None,
            },
            MISS_RANGE => MissingValues::Numeric {
                values: Vec::new(),
                range: Some(open(raw[0], raw[1])),
            },
            MISS_RANGE_AND_VALUE => MissingValues::Numeric {
                values: vec![raw[2]],
                range: Some(open(raw[0], raw[1])),
            },
            other => {
                return Err(SavCaseError::InvalidMissingSpec(format!(
                    "unknown missing-format code {}",
                    other
                )))
            }
        };
        declared.validate()?;
        Ok(Some(declared))
    }

    /// The inverse of [`from_raw_numeric`](Self::from_raw_numeric). Unused slots
    /// carry the system-missing value.
    pub fn to_raw_numeric(
        &self,
        low_value: f64,
        high_value: f64,
        system_missing: f64,
    ) -> Result<(i32, [f64; 3]), SavCaseError> {
        let (values, range) = match self {
            MissingValues::Numeric { values, range } => (values, range),
            MissingValues::Text { .. } => {
                return Err(SavCaseError::InvalidMissingSpec(
                    "text specification on a numeric column".to_string(),
                ))
            }
        };
        self.validate()?;
        let mut raw = [system_missing; 3];
        match range {
            None => {
                raw[..values.len()].copy_from_slice(values);
                Ok((values.len() as i32, raw))
            }
            Some((lo, hi)) => {
                raw[0] = if lo.is_infinite() { low_value } else { *lo };
                raw[1] = if hi.is_infinite() { high_value } else { *hi };
                match values.first() {
                    Some(v) => {
                        raw[2] = *v;
                        Ok((MISS_RANGE_AND_VALUE, raw))
                    }
                    None => Ok((MISS_RANGE, raw)),
                }
            }
        }
    }

    /// Text counterpart of the raw form; unused slots are empty strings.
    pub fn from_raw_text(code: i32, raw: [&str; 3]) -> Result<Option<Self>, SavCaseError> {
        match code {
            MISS_NONE => Ok(None),
            1..=3 => Self::text(raw[..code as usize].iter().map(|s| s.to_string())).map(Some),
            other => Err(SavCaseError::InvalidMissingSpec(format!(
                "missing-format code {} is not valid for text columns",
                other
            ))),
        }
    }

    pub fn to_raw_text(&self) -> Result<(i32, [String; 3]), SavCaseError> {
        match self {
            MissingValues::Text { values } => {
                self.validate()?;
                let mut raw: [String; 3] = Default::default();
                for (slot, v) in raw.iter_mut().zip(values) {
                    slot.clone_from(v);
                }
                Ok((values.len() as i32, raw))
            }
            MissingValues::Numeric { .. } => Err(SavCaseError::InvalidMissingSpec(
                "numeric specification on a text column".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIGH: f64 = f64::MAX;
    const SYSMIS: f64 = -f64::MAX;

    #[test]
    fn test_range_matching_is_inclusive() {
        let declared = MissingValues::range(f64::NEG_INFINITY, 0.0, None).unwrap();
        assert!(declared.matches_number(-1e300));
        assert!(declared.matches_number(0.0));
        assert!(!declared.matches_number(0.5));
    }

    #[test]
    fn test_discrete_and_range_combination() {
        let declared = MissingValues::range(90.0, 99.0, Some(-1.0)).unwrap();
        assert!(declared.matches_number(-1.0));
        assert!(declared.matches_number(95.0));
        assert!(!declared.matches_number(89.0));
    }

    #[test]
    fn test_validation() {
        assert!(MissingValues::discrete(vec![1.0, 2.0, 3.0, 4.0]).is_err());
        assert!(MissingValues::range(5.0, 1.0, None).is_err());
        assert!(MissingValues::Numeric {
            values: vec![1.0, 2.0],
            range: Some((0.0, 1.0))
        }
        .validate()
        .is_err());
        assert!(MissingValues::text(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_raw_range_maps_sentinels_to_infinity() {
        let low = f64::from_bits(0xFFEF_FFFF_FFFF_FFFE);
        let declared = MissingValues::from_raw_numeric(MISS_RANGE, [low, 0.0, SYSMIS], low, HIGH)
            .unwrap()
            .unwrap();
        assert_eq!(
            declared,
            MissingValues::Numeric {
                values: vec![],
                range: Some((f64::NEG_INFINITY, 0.0))
            }
        );

        let (code, raw) = declared.to_raw_numeric(low, HIGH, SYSMIS).unwrap();
        assert_eq!(code, MISS_RANGE);
        assert_eq!(raw[0].to_bits(), low.to_bits());
        assert_eq!(raw[1], 0.0);
        assert_eq!(raw[2].to_bits(), SYSMIS.to_bits());
    }

    #[test]
    fn test_raw_discrete_and_range_plus_value() {
        let low = f64::from_bits(0xFFEF_FFFF_FFFF_FFFE);
        let declared = MissingValues::from_raw_numeric(2, [7.0, 8.0, SYSMIS], low, HIGH)
            .unwrap()
            .unwrap();
        assert!(declared.matches_number(8.0));
        assert_eq!(declared.to_raw_numeric(low, HIGH, SYSMIS).unwrap().0, 2);

        let declared = MissingValues::from_raw_numeric(MISS_RANGE_AND_VALUE, [1.0, HIGH, -9.0], low, HIGH)
            .unwrap()
            .unwrap();
        assert!(declared.matches_number(1e308));
        assert!(declared.matches_number(-9.0));
        assert_eq!(
            declared.to_raw_numeric(low, HIGH, SYSMIS).unwrap(),
            (MISS_RANGE_AND_VALUE, [1.0, HIGH, -9.0])
        );

        assert!(MissingValues::from_raw_numeric(0, [0.0; 3], low, HIGH)
            .unwrap()
            .is_none());
        assert!(MissingValues::from_raw_numeric(7, [0.0; 3], low, HIGH).is_err());
    }

    #[test]
    fn test_text_matching_and_raw_form() {
        let declared = MissingValues::from_raw_text(2, ["NA  ", "--", ""]).unwrap().unwrap();
        assert!(declared.matches_text("NA"));
        assert!(declared.matches_text("--"));
        assert!(!declared.matches_text(""));

        let (code, raw) = declared.to_raw_text().unwrap();
        assert_eq!(code, 2);
        assert_eq!(raw[2], "");
    }
}
