//! Call Context Module
//!
//! Cancellation and deadline carrier passed to every cache operation.
//! Operations only look at it on entry; an in-flight lock wait or eviction
//! scan is never interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{CacheError, Result};

// == Context ==
/// Cancellable call context.
///
/// Clones share the same cancellation flag, so cancelling any clone cancels
/// all of them.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// Returns a context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a context that expires `timeout` from now.
    ///
    /// A timeout too large to represent as an instant yields no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    /// Returns a context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Marks this context and all of its clones as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    // == Err ==
    /// Returns why the context is done, or `None` while it is still live.
    ///
    /// Explicit cancellation wins over an elapsed deadline.
    pub fn err(&self) -> Option<CacheError> {
        if self.cancelled.load(Ordering::Acquire) {
            return Some(CacheError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CacheError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Returns true once the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Fails with the context's error if it is already done.
    pub(crate) fn check(&self) -> Result<()> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_background_is_never_done() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_is_shared_by_clones() {
        let ctx = Context::background();
        let clone = ctx.clone();

        clone.cancel();

        assert!(matches!(ctx.err(), Some(CacheError::Cancelled)));
        assert!(matches!(clone.check(), Err(CacheError::Cancelled)));
    }

    #[test]
    fn test_unrepresentable_timeout_has_no_deadline() {
        let ctx = Context::with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert!(ctx.check().is_ok());

        ctx.cancel();
        assert!(matches!(ctx.err(), Some(CacheError::Cancelled)));
    }

    #[test]
    fn test_deadline_exceeded() {
        let ctx = Context::with_timeout(Duration::from_millis(10));
        assert!(!ctx.is_done());

        sleep(Duration::from_millis(30));

        assert!(matches!(ctx.err(), Some(CacheError::DeadlineExceeded)));
    }

    #[test]
    fn test_cancel_takes_precedence_over_deadline() {
        let ctx = Context::with_deadline(Instant::now());
        ctx.cancel();
        assert!(matches!(ctx.err(), Some(CacheError::Cancelled)));
    }
}
