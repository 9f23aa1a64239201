//! In-memory seed network the announcer runs against.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::B256;
use libp2p::Multiaddr;
use opennet_announcer::{
    AlertSink, AnnouncementOutcome, AnnouncementSessionRunner, IpDetection, NodeIdentity,
    NodeStatus, OutcomeReporter, PeerAdmission, SeedCounts, SeedDirectory, SeedNode, SeedRecord,
    SeedRecordError, UpdaterState, UserAlert,
};
use opennet_tasks::TaskExecutor;
use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, warn};

/// Parameters of the simulated network.
#[derive(Debug, Clone)]
pub(crate) struct MeshParams {
    pub(crate) seeds: usize,
    pub(crate) aim_peers: usize,
    pub(crate) connect_failure_rate: f64,
}

#[derive(Debug, Default)]
struct MeshState {
    /// Seeds with a connection in progress.
    connecting: HashSet<NodeIdentity>,
    connected: HashMap<NodeIdentity, SeedNode>,
    opennet_peers: usize,
    alerts: Vec<UserAlert>,
}

/// A node plus a seed network, all in memory.
///
/// Seed connections complete after a short random delay and announcement
/// sessions add a few peers each before completing.
#[derive(Debug)]
pub(crate) struct SimulatedMesh {
    params: MeshParams,
    records: Vec<SeedRecord>,
    state: Arc<Mutex<MeshState>>,
    executor: TaskExecutor,
}

impl SimulatedMesh {
    pub(crate) fn new(params: MeshParams, executor: TaskExecutor) -> Self {
        let mut rng = rand::rng();
        let records = (0..params.seeds)
            .map(|i| random_seed_record(&mut rng, i))
            .collect();
        Self {
            params,
            records,
            state: Arc::default(),
            executor,
        }
    }

    pub(crate) fn opennet_peers(&self) -> usize {
        self.state.lock().opennet_peers
    }

    pub(crate) fn alert_count(&self) -> usize {
        self.state.lock().alerts.len()
    }
}

fn random_seed_record(rng: &mut impl Rng, index: usize) -> SeedRecord {
    let identity = B256::from(rng.random::<[u8; 32]>());
    // 11.0.0.0 - 99.255.255.255 avoids private and shared ranges.
    let ip = Ipv4Addr::new(
        rng.random_range(11..=99),
        rng.random(),
        rng.random(),
        rng.random_range(1..=254),
    );
    SeedRecord::new()
        .with("identity", identity.to_string())
        .with("addrs", format!("/ip4/{ip}/udp/{}", rng.random_range(1024..=65535u16)))
        .with("name", format!("seed-{index}"))
}

impl NodeStatus for SimulatedMesh {
    fn opennet_enabled(&self) -> bool {
        true
    }

    fn connected_opennet_peers(&self) -> usize {
        self.state.lock().opennet_peers
    }

    fn total_peers(&self) -> usize {
        let state = self.state.lock();
        state.opennet_peers + state.connected.len()
    }

    fn aim_peer_count(&self) -> usize {
        self.params.aim_peers
    }

    fn too_new_peers(&self) -> usize {
        0
    }

    fn updater_state(&self) -> UpdaterState {
        UpdaterState::Active
    }

    fn ip_detection(&self) -> IpDetection {
        IpDetection::Detected
    }
}

impl SeedDirectory for SimulatedMesh {
    fn load_candidates(&self) -> Vec<SeedRecord> {
        self.records.clone()
    }

    fn connected_seeds(&self, exclude: &HashSet<NodeIdentity>) -> Vec<SeedNode> {
        self.state
            .lock()
            .connected
            .values()
            .filter(|seed| !exclude.contains(&seed.identity))
            .cloned()
            .collect()
    }

    fn seed_counts(&self) -> SeedCounts {
        let state = self.state.lock();
        SeedCounts {
            connected: state.connected.len(),
            disconnected: state.connecting.len(),
        }
    }
}

impl PeerAdmission for SimulatedMesh {
    fn parse_seed(&self, record: &SeedRecord) -> Result<SeedNode, SeedRecordError> {
        let identity = record
            .get("identity")
            .ok_or(SeedRecordError::MissingField("identity"))?;
        let identity = B256::from_str(identity).map_err(|e| SeedRecordError::Parse {
            field: "identity",
            reason: e.to_string(),
        })?;
        let addr = record
            .get("addrs")
            .ok_or(SeedRecordError::MissingField("addrs"))?;
        let addr = Multiaddr::from_str(addr)
            .map_err(|_| SeedRecordError::InvalidAddress(addr.to_string()))?;

        let seed = SeedNode::new(identity.into(), vec![addr]);
        Ok(match record.get("name") {
            Some(name) => seed.with_name(name),
            None => seed,
        })
    }

    fn try_connect(&self, seed: &SeedNode) -> bool {
        let mut rng = rand::rng();
        {
            let mut state = self.state.lock();
            if state.connected.contains_key(&seed.identity)
                || !state.connecting.insert(seed.identity)
            {
                return false;
            }
        }

        let fails = rng.random_bool(self.params.connect_failure_rate.clamp(0.0, 1.0));
        let delay = Duration::from_millis(rng.random_range(100..=2_000));
        let state = self.state.clone();
        let seed = seed.clone();
        self.executor.spawn("sim_seed_connect", async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock();
            state.connecting.remove(&seed.identity);
            if fails {
                debug!(%seed, "simulated seed connection failed");
            } else {
                debug!(%seed, "simulated seed connected");
                state.connected.insert(seed.identity, seed);
            }
        });
        true
    }

    fn disconnect_seed(&self, identity: &NodeIdentity) {
        let mut state = self.state.lock();
        state.connected.remove(identity);
        state.connecting.remove(identity);
    }
}

impl AnnouncementSessionRunner for SimulatedMesh {
    fn launch(&self, seed: SeedNode, reporter: OutcomeReporter) {
        let mut rng = rand::rng();
        let steps: Vec<(Duration, AnnouncementOutcome)> = (0..rng.random_range(1..=6))
            .map(|_| {
                let delay = Duration::from_millis(rng.random_range(200..=3_000));
                let outcome = match rng.random_range(0..10) {
                    0..=5 => AnnouncementOutcome::NodeAdded {
                        peer: NodeIdentity::from(rng.random::<[u8; 32]>()),
                    },
                    6 | 7 => AnnouncementOutcome::NodeNotWanted,
                    8 => AnnouncementOutcome::NodeNotAdded,
                    _ => AnnouncementOutcome::NoRouteFound,
                };
                (delay, outcome)
            })
            .collect();

        let state = self.state.clone();
        self.executor.spawn("sim_announcement", async move {
            for (delay, outcome) in steps {
                tokio::time::sleep(delay).await;
                if matches!(outcome, AnnouncementOutcome::NodeAdded { .. }) {
                    state.lock().opennet_peers += 1;
                }
                reporter.report(outcome);
            }
            debug!(%seed, "simulated announcement finished");
            reporter.complete();
        });
    }
}

impl AlertSink for SimulatedMesh {
    fn raise(&self, alert: UserAlert) {
        warn!(%alert, "user alert");
        self.state.lock().alerts.push(alert);
    }
}
