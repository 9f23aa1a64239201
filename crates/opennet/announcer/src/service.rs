//! Background tasks driving the announcer.

use std::sync::Arc;

use opennet_tasks::{GracefulShutdown, TaskExecutor};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::announcer::Announcer;
use crate::config::AnnouncerConfig;
use crate::error::ConfigError;
use crate::outcome::OutcomeReceiver;
use crate::traits::AnnouncerContext;

/// Apply session outcomes until the channel closes or shutdown is signalled.
pub async fn run_outcome_loop(
    announcer: Arc<Announcer>,
    mut outcomes: OutcomeReceiver,
    shutdown: GracefulShutdown,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("announcer outcome loop shutting down");
                break;
            }
            event = outcomes.recv() => match event {
                Some(event) => announcer.handle_event(event),
                None => break,
            },
        }
    }
}

/// Announcer running on a [`TaskExecutor`].
///
/// Besides the deferred re-entries the announcer schedules itself, a recurring
/// tick re-runs the decision loop so progress never depends on a single timer.
#[derive(Debug)]
pub struct AnnouncerService {
    announcer: Arc<Announcer>,
    outcome_loop: JoinHandle<()>,
    tick_loop: JoinHandle<()>,
}

impl AnnouncerService {
    /// Create the announcer, spawn its tasks and start it.
    pub fn spawn(
        config: AnnouncerConfig,
        ctx: AnnouncerContext,
        executor: &TaskExecutor,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let tick_interval = config.tick_interval;
        let (announcer, outcomes) = Announcer::new(config, ctx, Arc::new(executor.clone()));

        let outcome_loop = executor.spawn_with_graceful_shutdown_signal(
            "announcer_outcomes",
            {
                let announcer = announcer.clone();
                move |shutdown| run_outcome_loop(announcer, outcomes, shutdown)
            },
        );

        let tick_loop = executor.spawn_with_graceful_shutdown_signal("announcer_tick", {
            let announcer = announcer.clone();
            move |shutdown| async move {
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            debug!("announcer tick loop shutting down");
                            break;
                        }
                        _ = tokio::time::sleep(tick_interval) => {
                            trace!("announcer tick");
                        }
                    }
                    announcer.maybe_send_announcement();
                }
            }
        });

        info!(
            want = announcer.config().want_announcements,
            ?tick_interval,
            "announcer started"
        );
        announcer.start();

        Ok(Self {
            announcer,
            outcome_loop,
            tick_loop,
        })
    }

    pub fn announcer(&self) -> &Arc<Announcer> {
        &self.announcer
    }

    /// Stop the announcer. Background tasks end on executor shutdown.
    pub fn stop(&self) {
        self.announcer.stop();
    }

    /// Wait for both background tasks to end.
    pub async fn join(self) {
        let _ = self.outcome_loop.await;
        let _ = self.tick_loop.await;
    }
}
