//! Stop context threaded through every remote call
//!
//! A `StopContext` ends outstanding requests and long-running-operation waits
//! when its handle is stopped or its deadline passes.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::client::{ClientError, ClientResult};

/// Cooperative cancellation and deadline for remote operations
#[derive(Debug, Clone)]
pub struct StopContext {
    stopped: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Stops every clone of the `StopContext` it was created with
#[derive(Debug)]
pub struct StopHandle {
    sender: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        // send_replace never fails, even with no receivers left
        self.sender.send_replace(true);
    }
}

impl StopContext {
    /// A context that never stops
    pub fn background() -> Self {
        Self {
            stopped: None,
            deadline: None,
        }
    }

    /// A context that stops once `timeout` has elapsed
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline_in(timeout)
    }

    /// A context stopped through the returned handle
    pub fn cancellable() -> (Self, StopHandle) {
        let (sender, receiver) = watch::channel(false);
        let ctx = Self {
            stopped: Some(receiver),
            deadline: None,
        };
        (ctx, StopHandle { sender })
    }

    /// Same context, with a deadline `timeout` from now (keeps the earlier deadline if sooner)
    ///
    /// A timeout too large to represent leaves the context without a new deadline.
    pub fn deadline_in(mut self, timeout: Duration) -> Self {
        let Some(candidate) = Instant::now().checked_add(timeout) else {
            return self;
        };
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Run `fut` unless the context stops first
    pub async fn run<T, F>(&self, fut: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        if self.is_stopped() {
            return Err(ClientError::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(ClientError::DeadlineExceeded);
        }

        let stopped = wait_stopped(self.stopped.clone());
        let deadline = wait_deadline(self.deadline);

        tokio::select! {
            result = fut => result,
            _ = stopped => Err(ClientError::Cancelled),
            _ = deadline => Err(ClientError::DeadlineExceeded),
        }
    }

    /// Sleep for `delay` unless the context stops first
    pub async fn sleep(&self, delay: Duration) -> ClientResult<()> {
        self.run(async {
            tokio::time::sleep(delay).await;
            Ok(())
        })
        .await
    }
}

impl Default for StopContext {
    fn default() -> Self {
        Self::background()
    }
}

async fn wait_stopped(receiver: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = receiver else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Handle dropped without stopping: never stops
            return std::future::pending().await;
        }
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
