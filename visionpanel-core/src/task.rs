//! Background backend calls whose results are picked up by the owner loop.
//!
//! A `PendingTask` is spawned on the tokio runtime and reports back over a
//! oneshot channel. The owner polls it once per frame, so results are always
//! applied on the owner's thread and state is never touched from a task.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// Result of polling a pending task.
#[derive(Debug, PartialEq, Eq)]
pub enum TaskPoll<T> {
    Ready(T),
    Pending,
    /// The task died without reporting (panicked or was dropped).
    Lost,
}

/// Handle to a spawned task's eventual output.
#[derive(Debug)]
pub struct PendingTask<T> {
    rx: Option<oneshot::Receiver<T>>,
}

impl<T: Send + 'static> PendingTask<T> {
    /// Spawn `future` on `runtime`.
    pub fn spawn<F>(runtime: &Handle, future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        runtime.spawn(async move {
            let _ = tx.send(future.await);
        });
        Self { rx: Some(rx) }
    }
}

impl<T> PendingTask<T> {
    /// Non-blocking check for the result. Once `Ready` or `Lost` has been
    /// returned, later polls return `Lost`.
    pub fn poll(&mut self) -> TaskPoll<T> {
        let Some(rx) = self.rx.as_mut() else {
            return TaskPoll::Lost;
        };
        match rx.try_recv() {
            Ok(value) => {
                self.rx = None;
                TaskPoll::Ready(value)
            }
            Err(TryRecvError::Empty) => TaskPoll::Pending,
            Err(TryRecvError::Closed) => {
                self.rx = None;
                TaskPoll::Lost
            }
        }
    }
}

/// Poll every task in `tasks`, returning finished outputs and keeping the rest.
pub fn drain_ready<T>(tasks: &mut Vec<PendingTask<T>>, what: &str) -> Vec<T> {
    let mut ready = Vec::new();
    tasks.retain_mut(|task| match task.poll() {
        TaskPoll::Ready(value) => {
            ready.push(value);
            false
        }
        TaskPoll::Pending => true,
        TaskPoll::Lost => {
            tracing::warn!(task = what, "Background task ended without a result");
            false
        }
    });
    ready
}
