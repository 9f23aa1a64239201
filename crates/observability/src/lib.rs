//! Logging and metrics initialisation for opennet nodes.

mod logging;
mod prometheus;

pub use logging::{LogArgs, init_logging};
pub use prometheus::install_prometheus_exporter;
