// In: src/exchange/status.rs

//! Return codes of the native row-exchange library.
//!
//! Every call into the row exchange reports a signed status. Zero is success,
//! positive codes are errors and negative codes are informational. The one
//! exception is `NO_TYPE73`, which is positive but only tells the caller that
//! an optional record is absent.

use std::fmt;

use serde::Serialize;

use crate::error::{CodecWarning, SavCaseError};

/// How a status code must be treated by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Ok,
    Warning,
    Error,
}

/// A raw status code returned by the row exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StatusCode(pub i32);

macro_rules! status_table {
    ($( $name:ident = $code:expr, $class:ident, $msg:expr; )+) => {
        impl StatusCode {
            $( pub const $name: StatusCode = StatusCode($code); )+
        }

        // Some warning codes share a value; the first entry wins on lookup.
        const STATUS_TABLE: &[(i32, &str, StatusClass, &str)] = &[
            $( ($code, stringify!($name), StatusClass::$class, $msg), )+
        ];
    };
}

status_table! {
    OK = 0, Ok, "No error";
    FILE_OERROR = 1, Error, "Error opening new file for output";
    FILE_WERROR = 2, Error, "File write error";
    FILE_RERROR = 3, Error, "Error reading file";
    FITAB_FULL = 4, Error, "File table full (too many open data files)";
    INVALID_HANDLE = 5, Error, "The file handle is not valid";
    INVALID_FILE = 6, Error, "The file is not a valid data file";
    NO_MEMORY = 7, Error, "Insufficient memory";
    OPEN_RDMODE = 8, Error, "File is open for reading, not writing";
    OPEN_WRMODE = 9, Error, "File is open for writing, not reading";
    INVALID_VARNAME = 10, Error, "The variable name is not valid";
    DICT_EMPTY = 11, Error, "No variables defined in the dictionary";
    VAR_NOTFOUND = 12, Error, "A variable with the given name does not exist";
    DUP_VAR = 13, Error, "There is already a variable with the same name";
    NUME_EXP = 14, Error, "At least one of the variables is not numeric";
    STR_EXP = 15, Error, "At least one of the variables is numeric";
    SHORTSTR_EXP = 16, Error, "At least one of the variables is a long string";
    INVALID_VARTYPE = 17, Error, "Invalid length code (negative or exceeds 32767)";
    INVALID_MISSFOR = 18, Error, "Invalid missing values specification";
    INVALID_COMPSW = 19, Error, "Invalid compression switch";
    INVALID_PRFOR = 20, Error, "The print format is invalid or incompatible with the variable type";
    INVALID_WRFOR = 21, Error, "The write format is invalid or incompatible with the variable type";
    INVALID_DATE = 22, Error, "The date value is negative";
    INVALID_TIME = 23, Error, "Invalid time";
    NO_VARIABLES = 24, Error, "Number of variables is zero or negative";
    MIXED_TYPES = 25, Error, "Mixed variable types";
    DUP_VALUE = 27, Error, "The list of values contains duplicates";
    INVALID_CASEWGT = 28, Error, "The given case weight variable is invalid";
    INCOMPATIBLE_DICT = 29, Error, "There is no code page equivalent for the file's encoding";
    DICT_COMMIT = 30, Error, "Dictionary has already been written";
    DICT_NOTCOMMIT = 31, Error, "Dictionary of the output file has not yet been written";
    NO_TYPE2 = 33, Error, "File is not a valid data file (no type 2 record)";
    NO_TYPE73 = 41, Warning, "There is no type 7, subtype 3 record present";
    INVALID_DATEINFO = 45, Error, "The date variable information is invalid";
    NO_TYPE999 = 46, Error, "File is not a valid data file (missing type 999 record)";
    EXC_STRVALUE = 47, Error, "At least one value is longer than the length of the variable";
    CANNOT_FREE = 48, Error, "Cannot deallocate the memory";
    BUFFER_SHORT = 49, Error, "Buffer value is too short to hold the value";
    INVALID_CASE = 50, Error, "Current case is not valid";
    INTERNAL_VLABS = 51, Error, "Internal data structures of the I/O module are invalid";
    INCOMPAT_APPEND = 52, Error, "File created on an incompatible system";
    INTERNAL_D_A = 53, Error, "Internal error";
    FILE_BADTEMP = 54, Error, "Cannot open or write to temporary file";
    DEW_NOFIRST = 55, Error, "Data entry information was never started";
    INVALID_MEASURELEVEL = 56, Error, "Measure level is not in the legal range";
    INVALID_7SUBTYPE = 57, Error, "Record subtype out of range";
    INVALID_VARHANDLE = 58, Error, "The variable handle is not valid";
    INVALID_ENCODING = 59, Error, "The specified encoding is not valid";
    FILES_OPEN = 60, Error, "Data files are open";
    INVALID_MRSETDEF = 70, Error, "Existing multiple-response set definitions are invalid";
    INVALID_MRSETNAME = 71, Error, "The multiple-response set name is invalid";
    DUP_MRSETNAME = 72, Error, "The multiple-response set name is a duplicate";
    BAD_EXTENSION = 73, Error, "Bad file extension";
    INVALID_EXTENDEDSTRING = 74, Error, "Invalid extended string";
    INVALID_ATTRNAME = 75, Error, "Lexically invalid attribute name";
    INVALID_ATTRDEF = 76, Error, "Missing name, missing text, or invalid subscript";
    INVALID_MRSETINDEX = 77, Error, "The index is out of range";
    INVALID_VARSETDEF = 78, Error, "Invalid variable set definition";
    INVALID_ROLE = 79, Error, "Invalid role value";
    EXC_LEN64 = -1, Warning, "Label length exceeds 64; truncated and used";
    EXC_LEN120 = -2, Warning, "Label length exceeds 120; truncated and used";
    EXC_LEN60 = -4, Warning, "Label length exceeds 60; truncated and used";
    FILE_END = -5, Warning, "End of the file reached; no more cases";
    NO_VARSETS = -6, Warning, "There is no variable sets information in the file";
    EMPTY_VARSETS = -7, Warning, "The variable sets information is empty";
    NO_LABELS = -8, Warning, "Number of labels is zero or negative";
    NO_LABEL = -9, Warning, "There is no label for the given value";
    NO_CASEWGT = -10, Warning, "A case weight variable has not been defined for this file";
    NO_DATEINFO = -11, Warning, "There is no date variable information in the file";
    NO_MULTRESP = -12, Warning, "No multiple-response definitions on the file";
    EMPTY_MULTRESP = -13, Warning, "The string contains no definitions";
    NO_DEW = -14, Warning, "File contains no data entry information";
    EMPTY_DEW = -15, Warning, "Zero bytes to be written";
}

impl StatusCode {
    fn entry(self) -> Option<&'static (i32, &'static str, StatusClass, &'static str)> {
        STATUS_TABLE.iter().find(|(code, ..)| *code == self.0)
    }

    /// The symbolic name of the code, or `"UNKNOWN"` for unlisted codes.
    pub fn name(self) -> &'static str {
        self.entry().map(|e| e.1).unwrap_or("UNKNOWN")
    }

    pub fn message(self) -> &'static str {
        self.entry()
            .map(|e| e.3)
            .unwrap_or("Return code not recognized")
    }

    /// Unlisted codes are classified by sign, so a new warning code from a newer
    /// library is never promoted to a hard error.
    pub fn class(self) -> StatusClass {
        match self.entry() {
            Some(e) => e.2,
            None if self.0 < 0 => StatusClass::Warning,
            None if self.0 == 0 => StatusClass::Ok,
            None => StatusClass::Error,
        }
    }

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Turns a status into the codec's error/warning channels.
    ///
    /// Errors become `SavCaseError::Upstream`; warnings come back as `Some` so the
    /// caller can push them into its warning log; success yields `None`.
    pub fn check(
        self,
        operation: &'static str,
        row: Option<u64>,
    ) -> Result<Option<CodecWarning>, SavCaseError> {
        match self.class() {
            StatusClass::Ok => Ok(None),
            StatusClass::Warning => Ok(Some(CodecWarning::Upstream {
                operation,
                status: self,
                row,
            })),
            StatusClass::Error => {
                let err = SavCaseError::upstream(operation, self);
                Err(match row {
                    Some(r) => err.at_row(r),
                    None => err,
                })
            }
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.0, self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_follows_sign_with_type73_exception() {
        assert_eq!(StatusCode::OK.class(), StatusClass::Ok);
        assert_eq!(StatusCode::FILE_RERROR.class(), StatusClass::Error);
        assert_eq!(StatusCode::FILE_END.class(), StatusClass::Warning);
        assert_eq!(StatusCode::NO_TYPE73.class(), StatusClass::Warning);
        assert_eq!(StatusCode(-99).class(), StatusClass::Warning);
        assert_eq!(StatusCode(999).class(), StatusClass::Error);
    }

    #[test]
    fn test_shared_codes_resolve_to_first_name() {
        assert_eq!(StatusCode(-2).name(), "EXC_LEN120");
        assert_eq!(StatusCode(12345).name(), "UNKNOWN");
    }

    #[test]
    fn test_check_routes_into_error_and_warning_channels() {
        assert!(StatusCode::OK.check("read", None).unwrap().is_none());

        let warning = StatusCode::NO_TYPE73.check("open", None).unwrap();
        assert!(matches!(warning, Some(CodecWarning::Upstream { .. })));

        let err = StatusCode::FILE_RERROR.check("read_next_row", Some(7)).unwrap_err();
        match err {
            SavCaseError::Upstream { status, row, .. } => {
                assert_eq!(status, StatusCode::FILE_RERROR);
                assert_eq!(row, Some(7));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display_includes_name_and_code() {
        let text = StatusCode::FILE_WERROR.to_string();
        assert!(text.contains("FILE_WERROR"));
        assert!(text.contains("(2)"));
    }
}
