//! The announcement scheduler.
//!
//! [`Announcer`] decides when to connect seed nodes and when to announce to
//! them. All coordination state lives in a single [`AnnouncerState`] behind one
//! lock. Collaborator side effects that do not need the lock (launching
//! sessions, scheduling re-entries, raising alerts) are collected while it is
//! held and performed after it is released.
//!
//! Every deferred re-entry is a [`ScheduledAction`] that re-derives its decision
//! from current state, so stale or duplicate timers are harmless.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use opennet_tasks::DeferredTaskQueue;
use parking_lot::Mutex;
use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::alert::UserAlert;
use crate::config::AnnouncerConfig;
use crate::metrics::AnnouncerMetrics;
use crate::outcome::{
    AnnouncementOutcome, OutcomeReceiver, OutcomeReporter, OutcomeSender, SessionEvent, SessionId,
    outcome_channel,
};
use crate::state::{ActiveSession, AnnouncerPhase, AnnouncerState};
use crate::status::StatusReport;
use crate::traits::AnnouncerContext;
use crate::types::{IpDetection, NodeIdentity, SeedNode, SeedRecord, UpdaterState};

/// A deferred re-entry into the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduledAction {
    /// Run the decision loop again.
    Recheck,
    /// After having had enough peers for a while, drop the seed connections,
    /// or start over if the peers are gone again.
    FinalDelayCheck,
    /// Stop waiting for external address detection.
    ForceAnnounceWithoutIp,
    /// Give up on seeds that never connected and start a new dedup cycle.
    ClearStaleSeeds,
}

impl ScheduledAction {
    /// Task name used when scheduling the action.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Recheck => "announcer.recheck",
            Self::FinalDelayCheck => "announcer.final_delay_check",
            Self::ForceAnnounceWithoutIp => "announcer.force_announce_without_ip",
            Self::ClearStaleSeeds => "announcer.clear_stale_seeds",
        }
    }
}

/// Result of the peer sufficiency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sufficiency {
    /// More peers are needed.
    Insufficient,
    /// The node has enough opennet peers.
    Enough,
    /// Announcing was shut down by this check because the node is too old.
    KilledTooOld,
    /// Announcing was shut down earlier and stays off.
    Halted,
}

impl Sufficiency {
    /// Whether announcing should not proceed.
    pub fn is_enough(self) -> bool {
        !matches!(self, Self::Insufficient)
    }
}

/// Node figures the sufficiency check works on.
#[derive(Debug, Clone, Copy)]
struct PeerSnapshot {
    opennet_peers: usize,
    aim_peers: usize,
    too_new_peers: usize,
    updater: UpdaterState,
}

/// Side effects gathered under the lock.
#[derive(Default)]
struct Effects {
    alert: Option<UserAlert>,
    launches: Vec<(SeedNode, OutcomeReporter)>,
    schedule: Vec<(ScheduledAction, Duration)>,
}

/// Opennet bootstrap announcement scheduler.
pub struct Announcer {
    config: AnnouncerConfig,
    ctx: AnnouncerContext,
    queue: Arc<dyn DeferredTaskQueue>,
    state: Mutex<AnnouncerState>,
    outcomes: OutcomeSender,
    start_called: AtomicBool,
    metrics: AnnouncerMetrics,
    this: Weak<Self>,
}

impl Announcer {
    /// Create an announcer.
    ///
    /// Session outcomes arrive on the returned receiver and must be fed back
    /// through [`handle_event`](Self::handle_event), usually by
    /// [`run_outcome_loop`](crate::run_outcome_loop).
    pub fn new(
        config: AnnouncerConfig,
        ctx: AnnouncerContext,
        queue: Arc<dyn DeferredTaskQueue>,
    ) -> (Arc<Self>, OutcomeReceiver) {
        let (tx, rx) = outcome_channel();
        let announcer = Arc::new_cyclic(|this| Self {
            config,
            ctx,
            queue,
            state: Mutex::new(AnnouncerState::default()),
            outcomes: tx,
            start_called: AtomicBool::new(false),
            metrics: AnnouncerMetrics::default(),
            this: this.clone(),
        });
        (announcer, rx)
    }

    pub fn config(&self) -> &AnnouncerConfig {
        &self.config
    }

    /// Kick off announcing at node startup. Only the first call made while
    /// opennet is enabled has an effect.
    ///
    /// A node without any peers connects seeds right away; otherwise the first
    /// check happens after the seed interval.
    pub fn start(&self) {
        if !self.ctx.node.opennet_enabled() {
            debug!("opennet disabled, not announcing");
            return;
        }
        if self.start_called.swap(true, Ordering::AcqRel) {
            debug!("announcer already started");
            return;
        }

        if self.ctx.node.total_peers() == 0 {
            info!("no peers at all, attempting announcement to seed nodes");
            self.state.lock().phase = AnnouncerPhase::Loading;
            self.connect_some_seednodes();
        } else {
            self.schedule(
                ScheduledAction::Recheck,
                self.config.min_added_seeds_interval,
            );
        }
    }

    /// Nothing to flush.
    pub fn stop(&self) {
        debug!("announcer stopped");
    }

    /// The decision loop. Safe to call at any time, from any thread.
    pub fn maybe_send_announcement(&self) {
        self.state.lock().started = true;
        trace!("maybe_send_announcement");

        if !self.ctx.node.opennet_enabled() {
            return;
        }
        let now = Instant::now();

        // A halted announcer keeps queueing the final check so seeds connected
        // before the kill are still dropped once their sessions finish.
        let sufficiency = self.enough_peers();
        if sufficiency.is_enough() {
            debug!(?sufficiency, "enough peers, dropping seeds after final delay");
            self.schedule(ScheduledAction::FinalDelayCheck, self.config.final_delay);
            return;
        }

        let ignore_ip_undetected = self.state.lock().ignore_ip_undetected;
        if !ignore_ip_undetected && self.ctx.node.ip_detection() == IpDetection::Detecting {
            debug!(
                delay = ?self.config.force_announcement_no_ip,
                "external address not detected yet, waiting"
            );
            self.schedule(
                ScheduledAction::ForceAnnounceWithoutIp,
                self.config.force_announcement_no_ip,
            );
            return;
        }

        let snapshot = self.peer_snapshot();
        let mut effects = Effects::default();
        let connect_more = {
            let mut state = self.state.lock();
            self.dispatch(&mut state, &snapshot, now, &mut effects)
        };
        self.apply(effects);

        if connect_more {
            self.connect_some_seednodes();
        }
    }

    /// Announce to connected seeds under the lock.
    ///
    /// Returns `true` when more seeds should be connected.
    fn dispatch(
        &self,
        state: &mut AnnouncerState,
        snapshot: &PeerSnapshot,
        now: Instant,
        effects: &mut Effects,
    ) -> bool {
        // The checks above ran without the lock.
        match self.evaluate(state, snapshot, now) {
            Sufficiency::Insufficient => {}
            Sufficiency::KilledTooOld => {
                effects.alert = Some(UserAlert::too_old(snapshot.too_new_peers));
                return false;
            }
            _ => return false,
        }

        let want = self.config.want_announcements;
        if state.running > want {
            trace!(running = state.running, "announcements already running");
            return false;
        }
        if state.in_cooling_off(now) {
            trace!(remaining = ?state.cooling_off_remaining(now), "in cooling-off period");
            return false;
        }
        if state.sent >= want {
            trace!(sent = state.sent, "sent enough announcements");
            return false;
        }

        let mut seeds = self
            .ctx
            .seeds
            .connected_seeds(state.dedup.announced_identities());
        let mut rng = rand::rng();
        while state.sent < want {
            if seeds.is_empty() {
                trace!(
                    announced = state.dedup.announced_count(),
                    "no more seed nodes to announce to"
                );
                break;
            }
            let seed = seeds.swap_remove(rng.random_range(0..seeds.len()));
            let ips = seed.ip_addrs();
            if !state
                .dedup
                .has_new_address(&ips, self.ctx.classifier.as_ref())
            {
                debug!(%seed, "not announcing, addresses already used");
                continue;
            }

            state.dedup.record_announced(seed.identity, &ips);
            state.sent += 1;
            state.running += 1;
            let session = state.next_session_id();
            state.sessions.insert(
                session,
                ActiveSession {
                    seed: seed.identity,
                    counters: Default::default(),
                },
            );
            let reporter = OutcomeReporter::new(session, seed.identity, self.outcomes.clone());
            effects.launches.push((seed, reporter));
        }
        self.metrics.set_running(state.running);

        if state.running >= want {
            debug!(running = state.running, "running enough announcements");
            return false;
        }

        let remaining = state.seed_interval_remaining(now, self.config.min_added_seeds_interval);
        if !remaining.is_zero() {
            trace!(?remaining, "waiting for the seed interval");
            effects.schedule.push((ScheduledAction::Recheck, remaining));
            return false;
        }
        true
    }

    /// Check whether the node has enough peers, updating the sufficiency
    /// timestamp and the too-old latch.
    ///
    /// Raises the too-old alert when this call sets the latch.
    pub fn enough_peers(&self) -> Sufficiency {
        let snapshot = self.peer_snapshot();
        let sufficiency = self.evaluate(&mut self.state.lock(), &snapshot, Instant::now());
        if sufficiency == Sufficiency::KilledTooOld {
            self.raise(UserAlert::too_old(snapshot.too_new_peers));
        }
        sufficiency
    }

    fn peer_snapshot(&self) -> PeerSnapshot {
        let node = &self.ctx.node;
        PeerSnapshot {
            opennet_peers: node.connected_opennet_peers(),
            aim_peers: node.aim_peer_count(),
            too_new_peers: node.too_new_peers(),
            updater: node.updater_state(),
        }
    }

    fn evaluate(
        &self,
        state: &mut AnnouncerState,
        snapshot: &PeerSnapshot,
        now: Instant,
    ) -> Sufficiency {
        if state.killed_too_old {
            return Sufficiency::Halted;
        }

        let target = self.config.target_peers(snapshot.aim_peers);
        if snapshot.opennet_peers >= target {
            let since = *state.time_got_enough_peers.get_or_insert(now);
            trace!(
                peers = snapshot.opennet_peers,
                target,
                since = ?now.saturating_duration_since(since),
                "enough opennet peers"
            );
            return Sufficiency::Enough;
        }

        if !snapshot.updater.can_self_update()
            && snapshot.too_new_peers > self.config.too_new_peers_threshold
        {
            state.killed_too_old = true;
            state.time_got_enough_peers = None;
            error!(
                too_new_peers = snapshot.too_new_peers,
                updater = %snapshot.updater,
                "shutting down announcement, node is older than the mandatory build and cannot update itself"
            );
            return Sufficiency::KilledTooOld;
        }

        state.time_got_enough_peers = None;
        Sufficiency::Insufficient
    }

    /// Connect a batch of seed nodes, at most once per seed interval.
    pub fn connect_some_seednodes(&self) {
        if !self.ctx.node.opennet_enabled() {
            return;
        }
        trace!("connecting some seed nodes");

        let candidates = self.ctx.seeds.load_candidates();
        let now = Instant::now();
        let interval = self.config.min_added_seeds_interval;
        let mut effects = Effects::default();

        let announce_now = {
            let mut state = self.state.lock();
            if !state.seed_interval_remaining(now, interval).is_zero() {
                trace!("seed batch too soon");
                return;
            }
            state.time_added_seeds = Some(now);
            if candidates.is_empty() {
                warn!("no seed nodes available");
                state.phase = AnnouncerPhase::NoSeedsAvailable;
                return;
            }
            state.phase = AnnouncerPhase::ConnectingSeeds;
            self.metrics.seed_batches.increment(1);

            let count = self.connect_batch(&mut state, candidates);
            let connected = state.dedup.connected_count();
            let announced = state.dedup.announced_count();
            debug!(
                count,
                connected,
                announced,
                running = state.running,
                "seed batch done"
            );

            let mut announce_now = false;
            if count == 0 && state.running == 0 {
                if connected > announced {
                    // Some seeds have not connected yet; give them a while.
                    debug!(
                        delay = ?self.config.not_all_connected_delay,
                        "clearing announced seeds later"
                    );
                    effects.schedule.push((
                        ScheduledAction::ClearStaleSeeds,
                        self.config.not_all_connected_delay,
                    ));
                } else if connected == announced && state.clear_dedup() {
                    debug!("all connected seeds announced to, starting a new cycle");
                    self.metrics.dedup_clears.increment(1);
                    announce_now = true;
                }
            }
            announce_now
        };

        let delay = if announce_now { Duration::ZERO } else { interval };
        effects.schedule.push((ScheduledAction::Recheck, delay));
        self.apply(effects);
    }

    fn connect_batch(&self, state: &mut AnnouncerState, mut candidates: Vec<SeedRecord>) -> usize {
        trace!(candidates = candidates.len(), "connecting seed batch");
        let mut rng = rand::rng();
        let mut count = 0;

        while count < self.config.connect_at_once && !candidates.is_empty() {
            let record = candidates.swap_remove(rng.random_range(0..candidates.len()));
            let seed = match self.ctx.admission.parse_seed(&record) {
                Ok(seed) => seed,
                Err(err) => {
                    self.metrics.seed_records_rejected.increment(1);
                    error!(%err, ?record, "invalid seed in seed list");
                    continue;
                }
            };
            if state.dedup.is_announced(&seed.identity) {
                trace!(%seed, "already announced to, not connecting");
                continue;
            }
            if self.ctx.admission.try_connect(&seed) {
                count += 1;
                state.dedup.record_connected(seed.identity);
                self.metrics.seeds_connected.increment(1);
                debug!(%seed, "connecting to seed node");
            } else {
                trace!(%seed, "not connecting to seed node");
            }
        }
        count
    }

    /// Run a deferred action.
    pub fn run_action(&self, action: ScheduledAction) {
        trace!(action = action.name(), "running scheduled action");
        match action {
            ScheduledAction::Recheck => self.maybe_send_announcement(),
            ScheduledAction::FinalDelayCheck => self.final_delay_check(),
            ScheduledAction::ForceAnnounceWithoutIp => {
                {
                    let mut state = self.state.lock();
                    if state.ignore_ip_undetected {
                        return;
                    }
                    state.ignore_ip_undetected = true;
                }
                info!("external address still unknown, announcing anyway");
                self.maybe_send_announcement();
            }
            ScheduledAction::ClearStaleSeeds => {
                {
                    let mut state = self.state.lock();
                    if !state.clear_dedup() {
                        debug!(running = state.running, "announcements running, not clearing");
                        return;
                    }
                }
                self.metrics.dedup_clears.increment(1);
                debug!("cleared announced seeds");
                self.maybe_send_announcement();
            }
        }
    }

    fn final_delay_check(&self) {
        if self.state.lock().running > 0 {
            return;
        }
        if self.enough_peers().is_enough() {
            let seeds = self.ctx.seeds.connected_seeds(&HashSet::new());
            debug!(seeds = seeds.len(), "enough peers, disconnecting seed nodes");
            for seed in seeds {
                self.ctx.admission.disconnect_seed(&seed.identity);
            }
        } else {
            debug!("lost peers during final delay, announcing again");
            self.schedule(ScheduledAction::Recheck, self.config.retry_delay);
            self.maybe_send_announcement();
        }
    }

    /// Apply one session outcome.
    pub fn handle_event(&self, event: SessionEvent) {
        let SessionEvent {
            session,
            seed,
            outcome,
        } = event;

        match outcome {
            AnnouncementOutcome::NodeAdded { peer } => {
                let (total, this_session) = {
                    let mut state = self.state.lock();
                    state.total_added += 1;
                    let this_session = state.sessions.get_mut(&session).map(|active| {
                        active.counters.added += 1;
                        active.counters.added
                    });
                    (state.total_added, this_session)
                };
                self.metrics.nodes_added.increment(1);
                info!(%seed, %peer, total, ?this_session, "announcement added node");
            }
            AnnouncementOutcome::BogusReference { reason } => {
                error!(%seed, %reason, "announcement got bogus reference");
            }
            AnnouncementOutcome::NodeFailed { peer, reason } => {
                warn!(%seed, %peer, %reason, "announced node failed");
            }
            AnnouncementOutcome::NoRouteFound => {
                warn!(%seed, "announcement ran out of nodes");
            }
            AnnouncementOutcome::NodeNotWanted => {
                let (total, this_session) = {
                    let mut state = self.state.lock();
                    state.total_not_wanted += 1;
                    let this_session = state.sessions.get_mut(&session).map(|active| {
                        active.counters.not_wanted += 1;
                        active.counters.not_wanted
                    });
                    (state.total_not_wanted, this_session)
                };
                self.metrics.nodes_not_wanted.increment(1);
                info!(%seed, total, ?this_session, "announcement returned node not wanted");
            }
            AnnouncementOutcome::NodeNotAdded => {
                info!(%seed, "announced node not added");
            }
            AnnouncementOutcome::SessionCompleted => self.complete_session(session, seed),
        }
    }

    fn complete_session(&self, session: SessionId, seed: NodeIdentity) {
        let mut effects = Effects::default();
        {
            let mut state = self.state.lock();
            if let Some(active) = state.sessions.remove(&session) {
                state.running = state.running.saturating_sub(1);
                self.metrics.set_running(state.running);
                self.metrics.announcements_completed.increment(1);
                info!(
                    seed = %active.seed,
                    %session,
                    added = active.counters.added,
                    not_wanted = active.counters.not_wanted,
                    running = state.running,
                    "announcement completed"
                );

                if state.running == 0 {
                    let cooling_off = self.config.cooling_off_period;
                    state.cooling_off_until = Some(Instant::now() + cooling_off);
                    state.sent = 0;
                    effects.schedule.push((ScheduledAction::Recheck, cooling_off));
                }
            } else {
                // Counters were settled already; the seed still goes.
                warn!(%session, %seed, "completion for unknown announcement session");
            }
        }

        self.apply(effects);
        self.ctx.admission.disconnect_seed(&seed);
    }

    fn apply(&self, effects: Effects) {
        let Effects {
            alert,
            launches,
            schedule,
        } = effects;

        if let Some(alert) = alert {
            self.raise(alert);
        }
        for (seed, reporter) in launches {
            self.launch(seed, reporter);
        }
        for (action, delay) in schedule {
            self.schedule(action, delay);
        }
    }

    fn launch(&self, seed: SeedNode, reporter: OutcomeReporter) {
        if !self.ctx.node.opennet_enabled() {
            // Dropping the reporter completes the session.
            return;
        }
        info!(%seed, session = %reporter.session(), "announcement starting");
        self.metrics.announcements_sent.increment(1);
        self.ctx.sessions.launch(seed, reporter);
    }

    fn raise(&self, alert: UserAlert) {
        self.ctx.alerts.raise(alert);
    }

    fn schedule(&self, action: ScheduledAction, delay: Duration) {
        let this = self.this.clone();
        self.queue.schedule(
            action.name(),
            delay,
            Box::new(move || {
                if let Some(announcer) = this.upgrade() {
                    announcer.run_action(action);
                }
            }),
        );
    }

    /// Snapshot for status display.
    pub fn status_report(&self) -> StatusReport {
        let seeds = self.ctx.seeds.seed_counts();
        let state = self.state.lock();
        StatusReport {
            phase: state.phase,
            added_nodes: state.total_added,
            not_wanted_nodes: state.total_not_wanted,
            sent_announcements: state.sent,
            running_announcements: state.running,
            cooling_off: state.cooling_off_remaining(Instant::now()),
            connected_seeds: seeds.connected,
            disconnected_seeds: seeds.disconnected,
        }
    }

    /// Whether the "announcing" alert should be shown: we ran at least once,
    /// still need peers and opennet is on.
    pub fn alert_is_relevant(&self) -> bool {
        let snapshot = self.peer_snapshot();
        let (started, killed) = {
            let state = self.state.lock();
            (state.started, state.killed_too_old)
        };
        let enough =
            killed || snapshot.opennet_peers >= self.config.target_peers(snapshot.aim_peers);
        started && !enough && self.ctx.node.opennet_enabled()
    }

    pub fn phase(&self) -> AnnouncerPhase {
        self.state.lock().phase
    }

    pub fn running_announcements(&self) -> usize {
        self.state.lock().running
    }

    pub fn sent_announcements(&self) -> usize {
        self.state.lock().sent
    }

    /// Nodes added through announcements since startup.
    pub fn total_added(&self) -> u64 {
        self.state.lock().total_added
    }

    /// Nodes that did not want us since startup.
    pub fn total_not_wanted(&self) -> u64 {
        self.state.lock().total_not_wanted
    }

    pub fn cooling_off_remaining(&self) -> Duration {
        self.state.lock().cooling_off_remaining(Instant::now())
    }

    /// Since when the node has continuously had enough peers.
    pub fn time_got_enough_peers(&self) -> Option<Instant> {
        self.state.lock().time_got_enough_peers
    }

    pub fn announced_identities(&self) -> HashSet<NodeIdentity> {
        self.state.lock().dedup.announced_identities().clone()
    }

    pub fn announced_ips(&self) -> HashSet<IpAddr> {
        self.state.lock().dedup.announced_ips().clone()
    }

    pub fn connected_identities(&self) -> HashSet<NodeIdentity> {
        self.state.lock().dedup.connected_identities().clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    pub fn is_killed_too_old(&self) -> bool {
        self.state.lock().killed_too_old
    }

    pub fn ignores_undetected_ip(&self) -> bool {
        self.state.lock().ignore_ip_undetected
    }
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("config", &self.config)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
