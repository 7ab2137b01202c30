// In: src/observability.rs

//! Logging setup and the warning log shared by the session facades.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Once;

use log::LevelFilter;

use crate::error::{CodecWarning, SavCaseError};

/// Emits a structured `key=value` debug line.
///
/// ```ignore
/// log_metric!("event" = "decode_batch", "rows" = 1024);
/// ```
#[macro_export]
macro_rules! log_metric {
    ( $( $key:literal = $value:expr ),+ $(,)? ) => {
        log::debug!(
            "{}",
            [ $( format!("{}={}", $key, $value) ),+ ].join(" ")
        )
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs the process logger at `level`, optionally appending to `log_file`.
///
/// Only the first call installs a logger; later calls are no-ops.
pub fn enable_verbose_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), SavCaseError> {
    let file = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.is_test(false);
        builder.filter_level(level);

        // Level and message only
        builder.format(|buf, record| {
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}

/// Collects codec warnings, echoing each one to the log as it arrives.
///
/// With `show` set, warnings are logged at `warn` level; otherwise at `debug`.
#[derive(Debug, Default, Clone)]
pub struct WarningLog {
    show: bool,
    items: Vec<CodecWarning>,
}

impl WarningLog {
    pub fn new(show: bool) -> Self {
        Self {
            show,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, warning: CodecWarning) {
        if self.show {
            log::warn!("{}", warning);
        } else {
            log::debug!("{}", warning);
        }
        self.items.push(warning);
    }

    pub fn extend(&mut self, warnings: impl IntoIterator<Item = CodecWarning>) {
        for w in warnings {
            self.push(w);
        }
    }

    pub fn as_slice(&self) -> &[CodecWarning] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drains the collected warnings.
    pub fn take(&mut self) -> Vec<CodecWarning> {
        std::mem::take(&mut self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_log_collects_in_order() {
        let mut log = WarningLog::new(true);
        log.push(CodecWarning::TimestampOutOfRange {
            column: "a".into(),
            row: 1,
            value: 1e20,
        });
        log.extend([CodecWarning::TimestampOutOfRange {
            column: "b".into(),
            row: 2,
            value: 1e20,
        }]);
        assert_eq!(log.len(), 2);
        let drained = log.take();
        assert!(log.is_empty());
        assert!(matches!(&drained[1], CodecWarning::TimestampOutOfRange { column, .. } if column == "b"));
    }

    #[test]
    fn test_log_metric_expands() {
        log_metric!("event" = "test", "rows" = 3);
    }
}
