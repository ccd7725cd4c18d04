use std::{future, sync::Arc, time::Duration};

use tokio::{sync::watch, time::Instant};

/// Why a call stopped before producing an outcome.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Interruption {
    /// The owning [`CancelHandle`] was triggered.
    Cancelled,
    /// The context deadline passed.
    DeadlineExceeded,
}

/// Cancellation signal and optional deadline carried by every call.
///
/// Both the network request and the backoff wait race [`CallContext::done`],
/// so cancelling or hitting the deadline aborts a call promptly instead of
/// after the next attempt.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Triggers cancellation of every [`CallContext`] derived from it.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    /// A context paired with the handle that cancels it.
    pub fn cancellable() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            deadline: None,
            cancel: Some(rx),
        };
        (ctx, CancelHandle { tx: Arc::new(tx) })
    }

    /// Derives a context that keeps this one's cancellation and uses the
    /// earlier of the existing deadline and `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the interruption if the context has already ended.
    pub fn interruption(&self) -> Option<Interruption> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some(Interruption::Cancelled);
        }
        if self.deadline.is_some_and(|at| Instant::now() >= at) {
            return Some(Interruption::DeadlineExceeded);
        }
        None
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Never resolves for a background context.
    pub async fn done(&self) -> Interruption {
        let cancelled = async {
            if let Some(mut rx) = self.cancel.clone() {
                loop {
                    if *rx.borrow_and_update() {
                        return;
                    }
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
            }
            // No handle, or the handle was dropped without cancelling.
            future::pending::<()>().await
        };
        let expired = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => Interruption::Cancelled,
            () = expired => Interruption::DeadlineExceeded,
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}
