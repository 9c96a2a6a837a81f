use std::{
    fmt,
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
};

use shared::protocol::MutationResponse;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::notify::{NotificationKey, Notifier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationPhase {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    pub phase: MutationPhase,
    /// Empty while idle or pending.
    pub message: String,
}

impl MutationOutcome {
    fn new(phase: MutationPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("a {0} is already in flight")]
    AlreadyPending(NotificationKey),
    #[error("{0}")]
    MissingTarget(String),
    #[error("{0}")]
    Failed(String),
}

/// Runs one kind of mutation at a time and reports each stage to a notifier.
///
/// The stages are strictly ordered: a loading toast first, then exactly one
/// success or error toast under the same key.
pub struct MutationController<N> {
    key: NotificationKey,
    notifier: N,
    in_flight: AtomicBool,
    status: watch::Sender<MutationOutcome>,
}

impl<N: Notifier> MutationController<N> {
    pub fn new(key: NotificationKey, notifier: N) -> Self {
        let (status, _) = watch::channel(MutationOutcome::default());
        Self {
            key,
            notifier,
            in_flight: AtomicBool::new(false),
            status,
        }
    }

    pub fn key(&self) -> NotificationKey {
        self.key
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn status(&self) -> MutationOutcome {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationOutcome> {
        self.status.subscribe()
    }

    /// Runs `op` against `target`. A second call while one is pending is
    /// refused without touching the notifier; a missing target settles as an
    /// error without calling `op`.
    pub async fn execute<Id, F, Fut, E>(
        &self,
        target: Option<Id>,
        op: F,
    ) -> Result<MutationResponse, MutationError>
    where
        Id: fmt::Display,
        F: FnOnce(Id) -> Fut,
        Fut: Future<Output = Result<MutationResponse, E>>,
        E: fmt::Display,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(key = %self.key, "mutation already in flight");
            return Err(MutationError::AlreadyPending(self.key));
        }
        let _gate = InFlight(self);

        let label = self.key.entity.label();
        self.status
            .send_replace(MutationOutcome::new(MutationPhase::Pending, ""));
        self.notifier.loading(
            self.key,
            &format!("{label} {}...", self.key.operation.progressive()),
        );

        let Some(id) = target else {
            let message = format!("{label} ID is missing");
            warn!(key = %self.key, "mutation has no target");
            self.settle(MutationPhase::Error, &message);
            return Err(MutationError::MissingTarget(message));
        };

        info!(key = %self.key, %id, "mutation started");
        match op(id).await {
            Ok(response) => {
                self.settle(MutationPhase::Success, &response.success);
                Ok(response)
            }
            Err(err) => {
                let message = err.to_string();
                warn!(key = %self.key, error = %message, "mutation failed");
                self.settle(MutationPhase::Error, &message);
                Err(MutationError::Failed(message))
            }
        }
    }

    fn settle(&self, phase: MutationPhase, message: &str) {
        match phase {
            MutationPhase::Success => self.notifier.success(self.key, message),
            _ => self.notifier.error(self.key, message),
        }
        self.status.send_replace(MutationOutcome::new(phase, message));
    }
}

/// Reopens the gate when `execute` returns or its future is dropped.
struct InFlight<'a, N>(&'a MutationController<N>);

impl<N> Drop for InFlight<'_, N> {
    fn drop(&mut self) {
        self.0.status.send_if_modified(|outcome| {
            // Abandoned before settling: nothing was reported, go back to idle.
            if outcome.phase == MutationPhase::Pending {
                *outcome = MutationOutcome::default();
                true
            } else {
                false
            }
        });
        self.0.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "tests/mutation_tests.rs"]
mod tests;
