//! Polling for long-running remote operations.
//!
//! The control plane acknowledges create, update, and delete requests before
//! applying them. [`OperationWaiter::wait`] turns that acknowledgement into a
//! call that returns only once the operation is terminal or the caller
//! cancels. There is no attempt cap: the remote operation or the caller's
//! token decides when polling stops.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{OperationHandle, OperationStatus, ServerApi};
use crate::error::ReconcileError;

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Races `future` against `cancel`, preferring cancellation when both are
/// ready.
///
/// # Errors
///
/// Returns [`ReconcileError::Cancelled`] when the token fires first.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to a modulo for branch rotation"
)]
pub async fn cancellable<F>(cancel: &CancellationToken, future: F) -> Result<F::Output, ReconcileError>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ReconcileError::Cancelled),
        output = future => Ok(output),
    }
}

/// Blocks on operation handles until they reach a terminal state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OperationWaiter {
    poll_interval: Duration,
}

impl Default for OperationWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl OperationWaiter {
    /// Creates a waiter polling at `poll_interval`.
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Returns the delay between polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Polls `handle` until the operation finishes.
    ///
    /// A [`OperationHandle::Completed`] handle returns at once without a
    /// status query.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::OperationFailed`] with the remote detail when
    /// the operation fails, [`ReconcileError::Cancelled`] when `cancel` fires
    /// during a poll or between polls, and [`ReconcileError::Transport`] when
    /// a status query itself fails.
    pub async fn wait<A>(
        &self,
        api: &A,
        handle: &OperationHandle,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError>
    where
        A: ServerApi + ?Sized,
    {
        if matches!(handle, OperationHandle::Completed) {
            debug!("operation completed synchronously");
            return Ok(());
        }
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let status = cancellable(cancel, api.poll_operation(handle)).await??;
            match status {
                OperationStatus::Succeeded => {
                    debug!(attempt, "operation succeeded");
                    return Ok(());
                }
                OperationStatus::Failed(detail) => {
                    debug!(attempt, detail = %detail, "operation failed");
                    return Err(ReconcileError::OperationFailed { detail });
                }
                OperationStatus::Pending => {
                    debug!(attempt, "operation still running");
                }
            }
            cancellable(cancel, sleep(self.poll_interval)).await?;
        }
    }
}
