//! Opennet bootstrap announcer.
//!
//! Decides whether the node needs more opennet peers and, if so, connects
//! seed nodes and announces to a bounded number of them at a time. Network
//! access, the seed list and user alerts are provided by the collaborators in
//! [`AnnouncerContext`]; deferred re-entries go through an
//! [`opennet_tasks::DeferredTaskQueue`].

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod alert;
mod announcer;
mod dedup;
mod error;
mod metrics;
mod outcome;
mod service;
mod state;
mod status;
mod traits;
mod types;

pub mod address;
pub mod args;
pub mod config;
pub mod constants;

pub use address::{AddressClassifier, PermissiveAddressClassifier, PublicAddressClassifier};
pub use alert::{AlertKind, AlertPriority, UserAlert};
pub use announcer::{Announcer, ScheduledAction, Sufficiency};
pub use args::AnnouncerArgs;
pub use config::AnnouncerConfig;
pub use dedup::DedupTracker;
pub use error::{ConfigError, SeedRecordError};
pub use outcome::{AnnouncementOutcome, OutcomeReceiver, OutcomeReporter, SessionEvent, SessionId};
pub use service::{AnnouncerService, run_outcome_loop};
pub use state::{AnnouncerPhase, SessionCounters};
pub use status::StatusReport;
pub use traits::{
    AlertSink, AnnouncementSessionRunner, AnnouncerContext, NodeStatus, PeerAdmission,
    SeedDirectory,
};
pub use types::{
    IpDetection, NodeIdentity, SeedCounts, SeedNode, SeedRecord, UpdaterState,
};
