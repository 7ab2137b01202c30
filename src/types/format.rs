// In: src/types/format.rs

//! Print format codes and their classification.
//!
//! The bytes of a numeric field are always an 8-byte float. Whether that float
//! is a plain number, a calendar date or a duration is decided solely by the
//! column's print format, so every semantic decision in the codec starts here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SavCaseError;

/// The semantic category a print format resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatCategory {
    PlainNumeric,
    Date,
    Datetime,
    Time,
    StringFormat,
}

macro_rules! format_types {
    ($( $variant:ident = $code:literal => $category:ident ),+ $(,)?) => {
        /// A print format type code.
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum FormatType {
            $( $variant, )+
        }

        impl FormatType {
            pub const ALL: &'static [FormatType] = &[ $( FormatType::$variant, )+ ];

            pub fn code(self) -> i32 {
                match self { $( FormatType::$variant => $code, )+ }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $( $code => Some(FormatType::$variant), )+
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self { $( FormatType::$variant => stringify!($variant), )+ }
            }

            pub fn category(self) -> FormatCategory {
                match self { $( FormatType::$variant => FormatCategory::$category, )+ }
            }
        }
    };
}

format_types! {
    A = 1 => StringFormat,
    AHEX = 2 => StringFormat,
    COMMA = 3 => PlainNumeric,
    DOLLAR = 4 => PlainNumeric,
    F = 5 => PlainNumeric,
    IB = 6 => PlainNumeric,
    PIBHEX = 7 => PlainNumeric,
    P = 8 => PlainNumeric,
    PIB = 9 => PlainNumeric,
    PK = 10 => PlainNumeric,
    RB = 11 => PlainNumeric,
    RBHEX = 12 => PlainNumeric,
    Z = 15 => PlainNumeric,
    N = 16 => PlainNumeric,
    E = 17 => PlainNumeric,
    DATE = 20 => Date,
    TIME = 21 => Time,
    DATETIME = 22 => Datetime,
    ADATE = 23 => Date,
    JDATE = 24 => Date,
    DTIME = 25 => Time,
    WKDAY = 26 => PlainNumeric,
    MONTH = 27 => PlainNumeric,
    MOYR = 28 => Date,
    QYR = 29 => Date,
    WKYR = 30 => Date,
    PCT = 31 => PlainNumeric,
    DOT = 32 => PlainNumeric,
    CCA = 33 => PlainNumeric,
    CCB = 34 => PlainNumeric,
    CCC = 35 => PlainNumeric,
    CCD = 36 => PlainNumeric,
    CCE = 37 => PlainNumeric,
    EDATE = 38 => Date,
    SDATE = 39 => Date,
    MTIME = 85 => Time,
    YMDHMS = 86 => Datetime,
}

impl FormatType {
    /// Case-insensitive lookup by name (`"datetime"`, `"F"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

/// A complete print format: type, display width and decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatSpec {
    pub format_type: FormatType,
    pub width: u16,
    pub decimals: u8,
}

impl FormatSpec {
    pub const fn new(format_type: FormatType, width: u16, decimals: u8) -> Self {
        Self {
            format_type,
            width,
            decimals,
        }
    }

    pub fn category(&self) -> FormatCategory {
        self.format_type.category()
    }

    /// `F8.2`, used for plain numeric columns without an explicit format.
    pub const fn default_numeric() -> Self {
        Self::new(FormatType::F, 8, 2)
    }

    /// `DATE11`.
    pub const fn default_date() -> Self {
        Self::new(FormatType::DATE, 11, 0)
    }

    /// `TIME8`.
    pub const fn default_time() -> Self {
        Self::new(FormatType::TIME, 8, 0)
    }

    /// `DATETIME20`.
    pub const fn default_datetime() -> Self {
        Self::new(FormatType::DATETIME, 20, 0)
    }

    /// `A<width>`; widths above `u16::MAX` cannot occur for valid columns.
    pub fn string(width: usize) -> Self {
        Self::new(FormatType::A, width.min(u16::MAX as usize) as u16, 0)
    }

    /// The `(type code, width, decimals)` triple used by the row exchange.
    pub fn to_tuple(&self) -> (i32, i32, i32) {
        (
            self.format_type.code(),
            i32::from(self.width),
            i32::from(self.decimals),
        )
    }

    pub fn from_tuple((code, width, decimals): (i32, i32, i32)) -> Result<Self, SavCaseError> {
        let format_type = FormatType::from_code(code)
            .ok_or_else(|| SavCaseError::InvalidFormat(format!("unknown format code {}", code)))?;
        let width = u16::try_from(width)
            .map_err(|_| SavCaseError::InvalidFormat(format!("width {} out of range", width)))?;
        let decimals = u8::try_from(decimals).map_err(|_| {
            SavCaseError::InvalidFormat(format!("decimals {} out of range", decimals))
        })?;
        Ok(Self::new(format_type, width, decimals))
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimals > 0 {
            write!(
                f,
                "{}{}.{}",
                self.format_type.name(),
                self.width,
                self.decimals
            )
        } else {
            write!(f, "{}{}", self.format_type.name(), self.width)
        }
    }
}

impl FromStr for FormatSpec {
    type Err = SavCaseError;

    /// Parses text such as `"F8.2"`, `"datetime20"` or `"A10"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let split = text
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| SavCaseError::InvalidFormat(format!("missing width in '{}'", s)))?;
        let (name, numbers) = text.split_at(split);

        let format_type = FormatType::from_name(name)
            .ok_or_else(|| SavCaseError::InvalidFormat(format!("unknown format type '{}'", name)))?;

        let (width_text, decimals_text) = match numbers.split_once('.') {
            Some((w, d)) => (w, d),
            None => (numbers, "0"),
        };
        let width: u16 = width_text
            .parse()
            .map_err(|_| SavCaseError::InvalidFormat(format!("invalid width in '{}'", s)))?;
        let decimals: u8 = if decimals_text.is_empty() {
            0
        } else {
            decimals_text
                .parse()
                .map_err(|_| SavCaseError::InvalidFormat(format!("invalid decimals in '{}'", s)))?
        };

        Ok(Self::new(format_type, width, decimals))
    }
}

impl Serialize for FormatSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FormatSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
