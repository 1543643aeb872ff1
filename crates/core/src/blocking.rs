//! Blocking Runner
//!
//! Bridges synchronous callers (handlers, the tool bridge, the text
//! generator facade) onto async work. Each runner owns a small dedicated
//! tokio runtime so callers never block the runtime they were invoked from.
//!
//! A runner is either single-flight (one call at a time, for tool calls
//! that must not interleave) or concurrent (independent calls such as model
//! requests). Every wait is bounded: a future that outlives its timeout is
//! aborted and reported as `CoreError::Timeout`.

use std::future::Future;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use crate::error::{CoreError, CoreResult};

/// Runs futures to completion from synchronous code with a bounded wait.
pub struct BlockingRunner {
    runtime: Option<Runtime>,
    /// Held for the duration of a call so at most one request is in flight.
    /// `None` for concurrent runners.
    in_flight: Option<Mutex<()>>,
    name: String,
}

/// Worker threads for a concurrent runner's runtime.
const CONCURRENT_WORKERS: usize = 2;

impl BlockingRunner {
    /// Build a single-flight runner with its own single-worker runtime.
    pub fn new(name: impl Into<String>) -> CoreResult<Self> {
        Self::build(name.into(), 1, true)
    }

    /// Build a runner whose calls may overlap.
    pub fn concurrent(name: impl Into<String>) -> CoreResult<Self> {
        Self::build(name.into(), CONCURRENT_WORKERS, false)
    }

    fn build(name: String, workers: usize, single_flight: bool) -> CoreResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .enable_all()
            .thread_name(format!("{}-worker", name))
            .build()
            .map_err(|e| CoreError::internal(format!("Failed to start runtime '{}': {}", name, e)))?;

        Ok(Self {
            runtime: Some(runtime),
            in_flight: single_flight.then(|| Mutex::new(())),
            name,
        })
    }

    pub fn is_single_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Name given to this runner at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drive `fut` to completion, waiting at most `timeout`.
    ///
    /// Must be called from a thread that is allowed to block (a plain thread
    /// or `tokio::task::spawn_blocking`).
    pub fn run<F, T>(&self, timeout: Duration, fut: F) -> CoreResult<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| CoreError::internal(format!("Runner '{}' is shut down", self.name)))?;

        let _guard = self
            .in_flight
            .as_ref()
            .map(|lock| lock.lock().unwrap_or_else(|e| e.into_inner()));

        let (tx, rx) = mpsc::sync_channel(1);
        let handle = runtime.spawn(async move {
            let _ = tx.send(fut.await);
        });

        match rx.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => {
                handle.abort();
                tracing::warn!(
                    runner = %self.name,
                    timeout_secs = timeout.as_secs(),
                    "Blocking call timed out"
                );
                Err(CoreError::timeout(timeout.as_secs()))
            }
            Err(RecvTimeoutError::Disconnected) => Err(CoreError::internal(format!(
                "Runner '{}' task ended without a result",
                self.name
            ))),
        }
    }
}

impl Drop for BlockingRunner {
    fn drop(&mut self) {
        // Dropping a runtime from inside another runtime panics.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for BlockingRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingRunner")
            .field("name", &self.name)
            .field("single_flight", &self.is_single_flight())
            .finish()
    }
}
