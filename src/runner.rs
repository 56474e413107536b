//! Generic background execution: a bounded worker pool with completion
//! callbacks marshaled back to the caller's scheduling context.

use anyhow::Result;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Runtime;
use tracing::warn;

/// Default worker pool size.
pub const DEFAULT_WORKERS: usize = 4;

/// Marshals a completion closure onto the embedding application's
/// interactive scheduling context (an event loop, usually) so UI state can
/// be mutated from it safely. With no dispatcher registered, completions
/// run directly on the worker that produced them.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>);
}

/// Handle to one scheduled unit of work.
///
/// After `shutdown` the runner hands out handles that are already
/// finished; a pending refresh may still complete in-flight work but its
/// completion is dropped, so callers must not rely on it firing.
pub struct TaskHandle {
    inner: Option<tokio::task::JoinHandle<()>>,
}

impl TaskHandle {
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            Some(handle) => handle.is_finished(),
            None => true,
        }
    }

    /// Cancel the task if it has not started. Work already running on a
    /// worker is not interrupted, but its completion will not fire.
    pub fn abort(&self) {
        if let Some(handle) = &self.inner {
            handle.abort();
        }
    }
}

/// Runs zero-argument work off the interactive thread and delivers the
/// result (or captured failure) through a completion handler. No mail
/// knowledge lives here.
pub struct TaskRunner {
    runtime: Mutex<Option<Runtime>>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
}

impl TaskRunner {
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_WORKERS, None)
    }

    pub fn with_options(workers: usize, dispatcher: Option<Arc<dyn Dispatcher>>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers.max(1))
            .thread_name("mailfeed-worker")
            .build()?;
        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            dispatcher,
        })
    }

    /// Schedule `work` with no completion callback.
    pub fn spawn<T, W>(&self, work: W) -> TaskHandle
    where
        T: Send + 'static,
        W: FnOnce() -> Result<T> + Send + 'static,
    {
        self.schedule(work, None)
    }

    /// Schedule `work`; `on_done` fires exactly once with its result or
    /// captured failure, on the registered dispatcher if there is one.
    pub fn run<T, W, F>(&self, work: W, on_done: F) -> TaskHandle
    where
        T: Send + 'static,
        W: FnOnce() -> Result<T> + Send + 'static,
        F: FnOnce(Result<T>) + Send + 'static,
    {
        self.schedule(work, Some(Box::new(on_done)))
    }

    fn schedule<T, W>(
        &self,
        work: W,
        on_done: Option<Box<dyn FnOnce(Result<T>) + Send>>,
    ) -> TaskHandle
    where
        T: Send + 'static,
        W: FnOnce() -> Result<T> + Send + 'static,
    {
        let guard = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let runtime = match guard.as_ref() {
            Some(runtime) => runtime,
            None => {
                warn!("task runner is shut down; dropping scheduled work");
                return TaskHandle { inner: None };
            }
        };

        let dispatcher = self.dispatcher.clone();
        let handle = runtime.spawn(async move {
            let outcome = match tokio::task::spawn_blocking(work).await {
                Ok(result) => result,
                Err(err) => Err(anyhow::anyhow!("background task panicked: {err}")),
            };
            if let Some(on_done) = on_done {
                match dispatcher {
                    Some(dispatcher) => dispatcher.dispatch(Box::new(move || on_done(outcome))),
                    None => on_done(outcome),
                }
            }
        });
        TaskHandle {
            inner: Some(handle),
        }
    }

    /// Stop accepting work and drop tasks that have not started. In-flight
    /// work is not interrupted; its completion is silently discarded.
    pub fn shutdown(&self) {
        let mut guard = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(runtime) = guard.take() {
            runtime.shutdown_background();
        }
    }
}
