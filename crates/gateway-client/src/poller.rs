//! Waiting for a submitted transaction to reach a terminal status.
//!
//! A [Poller] queries the status of a transaction once per interval and
//! feeds each answer through [ConfirmationPolicy::next] until the
//! transaction is confirmed, rejected or unknown to the network. Polling is
//! unbounded; callers layer a deadline on top by cancelling the
//! [CancellationToken] or dropping the future.
use std::future::Future;
use std::time::Duration;

use courier_gateway_types::reply::Status;
use tokio_util::sync::CancellationToken;

/// Decides which statuses end the wait successfully.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationPolicy {
    /// `PENDING` and `ACCEPTED_ONCHAIN` both confirm the transaction.
    #[default]
    AcceptPending,
    /// Only `ACCEPTED_ONCHAIN` confirms the transaction, `PENDING` keeps
    /// polling.
    RequireAcceptedOnchain,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Confirmed,
    Rejected,
    Failed,
}

impl ConfirmationPolicy {
    /// The state following the observation of `status`.
    pub fn next(self, status: Status) -> PollState {
        use ConfirmationPolicy::*;

        match (status, self) {
            (Status::AcceptedOnchain, _) => PollState::Confirmed,
            // Reverted transactions are part of a block and charged a fee.
            (Status::Reverted, _) => PollState::Confirmed,
            (Status::Pending, AcceptPending) => PollState::Confirmed,
            (Status::Pending, RequireAcceptedOnchain) => PollState::Polling,
            (Status::Received, _) => PollState::Polling,
            (Status::Rejected | Status::Aborted, _) => PollState::Rejected,
            // The hash was never accepted, asking again will not change that.
            (Status::NotReceived, _) => PollState::Failed,
        }
    }
}

/// Terminal failures of a wait.
#[derive(Debug, thiserror::Error)]
pub enum WaitError<E> {
    #[error("transaction status {reason}")]
    Rejected { reason: String },
    #[error("transaction status {reason}")]
    NotReceived { reason: String },
    #[error("wait was cancelled")]
    Cancelled,
    #[error(transparent)]
    Query(E),
}

impl<E> WaitError<E> {
    /// The status which ended the wait, for terminal statuses.
    pub fn reason(&self) -> Option<&str> {
        match self {
            WaitError::Rejected { reason } | WaitError::NotReceived { reason } => Some(reason),
            WaitError::Cancelled | WaitError::Query(_) => None,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Poller {
    interval: Duration,
    policy: ConfirmationPolicy,
}

impl Poller {
    pub fn new(interval: Duration, policy: ConfirmationPolicy) -> Self {
        Self { interval, policy }
    }

    /// Calls `query` once per interval, the first time after one interval
    /// has passed, until it reports a terminal status. Returns the status
    /// which confirmed the transaction.
    ///
    /// Errors of `query` end the wait. Once `cancellation` fires no further
    /// query is issued and an in-flight one is dropped.
    pub async fn run<F, Fut, E>(
        &self,
        mut query: F,
        cancellation: &CancellationToken,
    ) -> Result<Status, WaitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Status, E>>,
    {
        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => return Err(WaitError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }

            let status = tokio::select! {
                biased;
                _ = cancellation.cancelled() => return Err(WaitError::Cancelled),
                status = query() => status.map_err(WaitError::Query)?,
            };

            let state = self.policy.next(status);
            tracing::debug!(%status, ?state, "Polled transaction status");

            match state {
                PollState::Polling => continue,
                PollState::Confirmed => return Ok(status),
                PollState::Rejected => {
                    return Err(WaitError::Rejected {
                        reason: status.to_string(),
                    })
                }
                PollState::Failed => {
                    return Err(WaitError::NotReceived {
                        reason: status.to_string(),
                    })
                }
            }
        }
    }
}
