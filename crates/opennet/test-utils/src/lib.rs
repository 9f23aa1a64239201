//! Test utilities for opennet crates.
//!
//! Deterministic stand-ins for every announcer collaborator, plus a
//! [`TestHarness`] wiring them to an [`Announcer`](opennet_announcer::Announcer).

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod harness;
mod node;
mod queue;
mod seeds;
mod sessions;

pub use harness::TestHarness;
pub use node::MockNode;
pub use queue::{ManualTaskQueue, ScheduledTask};
pub use seeds::{MockSeedNetwork, identity, seed_node, seed_record};
pub use sessions::{RecordingAlerts, RecordingSessionRunner};
