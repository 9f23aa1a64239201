//! Task spawning and deferred task scheduling.
//!
//! [`TaskExecutor`] wraps a tokio runtime handle and a shutdown token. It spawns
//! long-running futures and implements [`DeferredTaskQueue`], the fire-and-forget
//! timer primitive used to re-enter state machines after a delay.
//!
//! Panics inside spawned futures and deferred closures are caught at the task
//! boundary and logged, so one failing task never takes down the timers that
//! other components rely on.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod metrics;

pub use metrics::{IncCounterOnDrop, TaskExecutorMetrics};

use std::{any::Any, future::Future, panic::AssertUnwindSafe, time::Duration};

use futures_util::FutureExt;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{error, trace};

pub use tokio_util::sync::CancellationToken;

/// Shutdown signal handed to tasks spawned with
/// [`TaskExecutor::spawn_with_graceful_shutdown_signal`].
pub type GracefulShutdown = CancellationToken;

/// A unit of deferred work.
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules closures to run after a delay.
///
/// There is no ordering guarantee between independently scheduled tasks beyond
/// their delays, and scheduled tasks cannot be cancelled individually.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait DeferredTaskQueue: Send + Sync {
    /// Run `task` once `delay` has elapsed.
    fn schedule(&self, name: &'static str, delay: Duration, task: DeferredTask);
}

/// Tokio-backed task executor with graceful shutdown.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    handle: Handle,
    shutdown: CancellationToken,
    metrics: TaskExecutorMetrics,
}

impl TaskExecutor {
    /// Create an executor spawning onto the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            shutdown: CancellationToken::new(),
            metrics: TaskExecutorMetrics::default(),
        }
    }

    /// Create an executor for the runtime we are currently running on.
    ///
    /// Returns `None` when called outside of a tokio runtime.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// The runtime handle tasks are spawned onto.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// A clone of the shutdown token.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Signal all graceful tasks to stop and drop pending deferred tasks.
    pub fn shutdown(&self) {
        trace!("task executor shutdown requested");
        self.shutdown.cancel();
    }

    /// Spawn a future. A panic inside it is logged and swallowed.
    pub fn spawn<F>(&self, name: &'static str, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.metrics.inc_spawned_tasks();
        let finished = IncCounterOnDrop::new(self.metrics.finished_tasks_total.clone());
        let metrics = self.metrics.clone();

        self.handle.spawn(async move {
            let _finished = finished;
            if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
                metrics.inc_panicked_tasks();
                error!(task = name, panic = panic_message(&*payload), "task panicked");
            }
        })
    }

    /// Spawn a long-running future that observes the shutdown signal.
    ///
    /// ```ignore
    /// executor.spawn_with_graceful_shutdown_signal("manage", |shutdown| async move {
    ///     loop {
    ///         tokio::select! {
    ///             _ = shutdown.cancelled() => break,
    ///             _ = tokio::time::sleep(interval) => tick(),
    ///         }
    ///     }
    /// });
    /// ```
    pub fn spawn_with_graceful_shutdown_signal<F, Fut>(
        &self,
        name: &'static str,
        f: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(GracefulShutdown) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let fut = f(self.shutdown.clone());
        self.spawn(name, fut)
    }
}

impl DeferredTaskQueue for TaskExecutor {
    fn schedule(&self, name: &'static str, delay: Duration, task: DeferredTask) {
        self.metrics.inc_deferred_tasks();
        let finished = IncCounterOnDrop::new(self.metrics.finished_deferred_tasks_total.clone());
        let shutdown = self.shutdown.clone();
        let metrics = self.metrics.clone();

        self.handle.spawn(async move {
            let _finished = finished;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    trace!(task = name, "dropping deferred task on shutdown");
                }
                _ = tokio::time::sleep(delay) => {
                    run_deferred(name, task, &metrics);
                }
            }
        });
    }
}

fn run_deferred(name: &'static str, task: DeferredTask, metrics: &TaskExecutorMetrics) {
    trace!(task = name, "running deferred task");
    if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(task)) {
        metrics.inc_panicked_tasks();
        error!(task = name, panic = panic_message(&*payload), "deferred task panicked");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
