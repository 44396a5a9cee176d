//! Cancellation and deadline carrier passed to every pull.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Cheap to clone; clones share one cancel flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A child sharing the cancel flag whose deadline is the earlier of
    /// this one's and `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(d) if d < deadline => d,
            _ => deadline,
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_shared_by_clones() {
        let ctx = Context::new();
        let child = ctx.with_timeout(Duration::from_secs(60));
        assert!(child.check().is_ok());
        ctx.cancel();
        assert_eq!(child.check(), Err(Error::Cancelled));
    }

    #[test]
    fn past_deadline_fails_check() {
        let ctx = Context::new().with_deadline(Instant::now());
        assert_eq!(ctx.check(), Err(Error::DeadlineExceeded));
    }

    #[test]
    fn child_keeps_earlier_deadline() {
        let early = Instant::now() + Duration::from_millis(5);
        let ctx = Context::new().with_deadline(early);
        let child = ctx.with_timeout(Duration::from_secs(3600));
        assert_eq!(child.deadline(), Some(early));
    }
}
