//! Per-call deadline carrier.

use std::time::{Duration, Instant};

use crate::error::ApiError;

/// Deadline for a single client operation.
///
/// `Context::background()` never expires. The remaining time is handed to the
/// transport as the request timeout, so cancellation is left to the HTTP
/// agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    pub fn background() -> Self {
        Self { deadline: None }
    }

    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    /// Fails once the deadline has passed.
    pub fn remaining(&self) -> Result<Option<Duration>, ApiError> {
        match self.deadline {
            None => Ok(None),
            Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                Some(left) if !left.is_zero() => Ok(Some(left)),
                _ => Err(ApiError::DeadlineExceeded),
            },
        }
    }

    /// The tighter of this context's remaining time and `fallback`.
    pub(crate) fn effective_timeout(&self, fallback: Option<Duration>) -> Result<Option<Duration>, ApiError> {
        Ok(match (self.remaining()?, fallback) {
            (Some(left), Some(limit)) => Some(left.min(limit)),
            (left, limit) => left.or(limit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_has_no_deadline() {
        let ctx = Context::background();
        assert_eq!(ctx.remaining().unwrap(), None);
        assert_eq!(ctx.effective_timeout(None).unwrap(), None);
    }

    #[test]
    fn unrepresentable_timeout_means_no_deadline() {
        let ctx = Context::with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.remaining().unwrap(), None);
    }

    #[test]
    fn expired_deadline_is_rejected() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_secs(1));
        assert!(matches!(ctx.remaining(), Err(ApiError::DeadlineExceeded)));
    }

    #[test]
    fn shorter_limit_wins() {
        let ctx = Context::with_timeout(Duration::from_secs(60));
        let timeout = ctx.effective_timeout(Some(Duration::from_secs(5))).unwrap();
        assert_eq!(timeout, Some(Duration::from_secs(5)));

        let timeout = Context::background()
            .effective_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(timeout, Some(Duration::from_secs(5)));

        let timeout = ctx.effective_timeout(Some(Duration::from_secs(600))).unwrap().unwrap();
        assert!(timeout <= Duration::from_secs(60));
    }
}
