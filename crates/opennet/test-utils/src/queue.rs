//! Deferred task queue that only runs tasks when told to.

use std::time::Duration;

use opennet_tasks::{DeferredTask, DeferredTaskQueue};
use parking_lot::Mutex;

/// A task recorded by [`ManualTaskQueue`].
pub struct ScheduledTask {
    pub name: &'static str,
    pub delay: Duration,
    task: DeferredTask,
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

/// Records scheduled tasks instead of running them on a timer.
///
/// Tasks run outside the internal lock, so they may schedule further tasks.
#[derive(Debug, Default)]
pub struct ManualTaskQueue {
    tasks: Mutex<Vec<ScheduledTask>>,
}

impl ManualTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names and delays of all pending tasks, in scheduling order.
    pub fn scheduled(&self) -> Vec<(&'static str, Duration)> {
        self.tasks
            .lock()
            .iter()
            .map(|task| (task.name, task.delay))
            .collect()
    }

    /// Whether a task with this name is pending.
    pub fn has(&self, name: &str) -> bool {
        self.tasks.lock().iter().any(|task| task.name == name)
    }

    /// Number of pending tasks with this name.
    pub fn count(&self, name: &str) -> usize {
        self.tasks.lock().iter().filter(|task| task.name == name).count()
    }

    /// Delay of the first pending task with this name.
    pub fn delay_of(&self, name: &str) -> Option<Duration> {
        self.tasks
            .lock()
            .iter()
            .find(|task| task.name == name)
            .map(|task| task.delay)
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Drop every pending task without running it.
    pub fn clear(&self) {
        self.tasks.lock().clear();
    }

    /// Run the first pending task with this name. Returns `false` if none.
    pub fn run_next(&self, name: &str) -> bool {
        let task = {
            let mut tasks = self.tasks.lock();
            match tasks.iter().position(|task| task.name == name) {
                Some(pos) => tasks.remove(pos),
                None => return false,
            }
        };
        (task.task)();
        true
    }

    /// Run every task pending right now. Tasks they schedule stay queued.
    pub fn run_all(&self) -> usize {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        let count = tasks.len();
        for task in tasks {
            (task.task)();
        }
        count
    }
}

impl DeferredTaskQueue for ManualTaskQueue {
    fn schedule(&self, name: &'static str, delay: Duration, task: DeferredTask) {
        self.tasks.lock().push(ScheduledTask { name, delay, task });
    }
}
