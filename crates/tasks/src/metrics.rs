//! Task Executor Metrics

use core::fmt;
use metrics::Counter;

/// Task Executor Metrics
#[derive(Clone, Debug)]
pub struct TaskExecutorMetrics {
    /// Number of spawned tasks
    pub(crate) spawned_tasks_total: Counter,
    /// Number of finished spawned tasks
    pub(crate) finished_tasks_total: Counter,
    /// Number of scheduled deferred tasks
    pub(crate) deferred_tasks_total: Counter,
    /// Number of deferred tasks that ran (or were dropped on shutdown)
    pub(crate) finished_deferred_tasks_total: Counter,
    /// Number of tasks that panicked
    pub(crate) panicked_tasks_total: Counter,
}

impl Default for TaskExecutorMetrics {
    fn default() -> Self {
        Self {
            spawned_tasks_total: metrics::counter!("executor.spawn.tasks_total"),
            finished_tasks_total: metrics::counter!("executor.spawn.finished_tasks_total"),
            deferred_tasks_total: metrics::counter!("executor.deferred.tasks_total"),
            finished_deferred_tasks_total: metrics::counter!(
                "executor.deferred.finished_tasks_total"
            ),
            panicked_tasks_total: metrics::counter!("executor.panicked_tasks_total"),
        }
    }
}

impl TaskExecutorMetrics {
    /// Increments the counter for spawned tasks.
    pub(crate) fn inc_spawned_tasks(&self) {
        self.spawned_tasks_total.increment(1);
    }

    /// Increments the counter for scheduled deferred tasks.
    pub(crate) fn inc_deferred_tasks(&self) {
        self.deferred_tasks_total.increment(1);
    }

    /// Increments the counter for panicked tasks.
    pub(crate) fn inc_panicked_tasks(&self) {
        self.panicked_tasks_total.increment(1);
    }
}

/// Helper type for increasing counters even if a task fails
pub struct IncCounterOnDrop(Counter);

impl fmt::Debug for IncCounterOnDrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IncCounterOnDrop").finish()
    }
}

impl IncCounterOnDrop {
    /// Creates a new instance of `IncCounterOnDrop` with the given counter.
    pub const fn new(counter: Counter) -> Self {
        Self(counter)
    }
}

impl Drop for IncCounterOnDrop {
    /// Increment the counter when the instance is dropped.
    fn drop(&mut self) {
        self.0.increment(1);
    }
}
