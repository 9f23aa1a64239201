//! Simulator command line.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use opennet_announcer::{AnnouncerArgs, AnnouncerConfig};
use opennet_observability::LogArgs;
use serde::{Deserialize, Serialize};

/// Run the opennet announcer against a simulated seed network.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct SimCli {
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    #[command(flatten)]
    pub(crate) announce: AnnouncerArgs,

    /// TOML file with announcer settings. Replaces the `--announce.*` flags.
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    /// Number of simulated seed nodes.
    #[arg(long, default_value_t = 20)]
    pub(crate) seeds: usize,

    /// Peer count the simulated node aims for.
    #[arg(long = "aim-peers", default_value_t = 40)]
    pub(crate) aim_peers: usize,

    /// Fraction of seed connections that fail.
    #[arg(long = "connect-failure-rate", default_value_t = 0.2)]
    pub(crate) connect_failure_rate: f64,

    /// Give up after this many seconds.
    #[arg(long, value_name = "SECS", default_value_t = 600)]
    pub(crate) duration: u64,

    /// Serve Prometheus metrics on this address.
    #[arg(long, value_name = "ADDR")]
    pub(crate) metrics: Option<SocketAddr>,
}

/// Layout of the `--config` file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SimConfigFile {
    announce: AnnouncerArgs,
}

impl SimCli {
    pub(crate) fn duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }

    /// Announcer configuration from the config file if given, else the flags.
    pub(crate) fn announcer_config(&self) -> Result<AnnouncerConfig> {
        let args = match &self.config {
            Some(path) => load_config_file(path)?.announce,
            None => self.announce.clone(),
        };
        let config = AnnouncerConfig::from(&args);
        config.validate().wrap_err("invalid announcer configuration")?;
        Ok(config)
    }
}

fn load_config_file(path: &Path) -> Result<SimConfigFile> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).wrap_err_with(|| format!("failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = SimCli::parse_from(["opennet-sim"]);
        assert_eq!(cli.seeds, 20);
        assert_eq!(cli.aim_peers, 40);
        assert_eq!(cli.duration(), Duration::from_secs(600));
        assert_eq!(cli.announcer_config().unwrap(), AnnouncerConfig::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cli = SimCli::parse_from(["opennet-sim", "--announce.want", "0"]);
        assert!(cli.announcer_config().is_err());
    }

    #[test]
    fn test_config_file_layout() {
        let file: SimConfigFile =
            toml::from_str("[announce]\nwant_announcements = 5\ncooling_off_secs = 1\n").unwrap();
        let config = AnnouncerConfig::from(&file.announce);
        assert_eq!(config.want_announcements, 5);
        assert_eq!(config.cooling_off_period, Duration::from_secs(1));
    }
}
