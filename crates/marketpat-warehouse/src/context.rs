//! Per-call deadline and cancellation.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::WarehouseError;

/// Bounds a single repository call.
///
/// The context is checked before a call touches storage and again just
/// before a write commits; a failed check rolls the write back.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl CallContext {
    /// No deadline, never cancelled unless a token is attached.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancellationToken::new(),
        }
    }

    /// Attach an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fail if the call was cancelled or its deadline has passed.
    ///
    /// # Errors
    /// [`WarehouseError::Cancelled`] or [`WarehouseError::DeadlineExceeded`].
    pub fn check(&self) -> Result<(), WarehouseError> {
        if self.cancel.is_cancelled() {
            return Err(WarehouseError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(WarehouseError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
