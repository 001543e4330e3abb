//! Cancellation and deadline propagation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{OrmError, OrmResult};

/// Deadline and cancellation flag handed to executors and context-aware
/// hooks. Cloning shares the cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::default().deadline(Instant::now() + timeout)
    }

    pub fn deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(at);
        self
    }

    pub fn deadline_at(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail fast when cancelled or already past the deadline.
    pub fn check(&self) -> OrmResult<()> {
        if self.is_cancelled() {
            return Err(OrmError::Cancelled);
        }
        match self.remaining() {
            Some(left) if left.is_zero() => Err(OrmError::Timeout(Duration::ZERO)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = Context::new();
        let other = ctx.clone();
        assert!(ctx.check().is_ok());
        other.cancel();
        assert!(matches!(ctx.check(), Err(OrmError::Cancelled)));
    }

    #[test]
    fn expired_deadline_times_out() {
        let ctx = Context::new().deadline(Instant::now());
        assert!(ctx.check().unwrap_err().is_timeout());
        assert!(Context::with_timeout(Duration::from_secs(60)).check().is_ok());
    }
}
