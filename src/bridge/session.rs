// In: src/bridge/session.rs

//! Close-once ownership of a row exchange handle.

use crate::error::{CodecWarning, SavCaseError};
use crate::exchange::StatusCode;

type CloseFn<T> = fn(&mut T) -> Result<(), StatusCode>;

/// Owns a source or sink and guarantees its `close` runs exactly once.
///
/// The handle stays inside the guard after closing so callers can still
/// inspect it; any further use through [`SessionGuard::get`] is refused.
pub(crate) struct SessionGuard<T> {
    inner: T,
    open: bool,
    close_fn: CloseFn<T>,
}

impl<T> SessionGuard<T> {
    pub(crate) fn new(inner: T, close_fn: CloseFn<T>) -> Self {
        Self {
            inner,
            open: true,
            close_fn,
        }
    }

    pub(crate) fn get(&mut self) -> Result<&mut T, SavCaseError> {
        if self.open {
            Ok(&mut self.inner)
        } else {
            Err(SavCaseError::SessionClosed)
        }
    }

    pub(crate) fn peek(&self) -> &T {
        &self.inner
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    /// Closes the handle. A second call is a no-op.
    pub(crate) fn close(&mut self) -> Result<Option<CodecWarning>, SavCaseError> {
        if !self.open {
            return Ok(None);
        }
        self.open = false;
        match (self.close_fn)(&mut self.inner) {
            Ok(()) => Ok(None),
            Err(status) => status.check("close", None),
        }
    }
}

impl<T> Drop for SessionGuard<T> {
    fn drop(&mut self) {
        match self.close() {
            Ok(Some(warning)) => log::debug!("{}", warning),
            Ok(None) => {}
            Err(e) => log::warn!("Failed to close row exchange session: {}", e),
        }
    }
}
