//! Announcer CLI arguments.

use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::config::AnnouncerConfig;
use crate::constants::*;

/// Announcement scheduling parameters.
///
/// Can be flattened into a CLI parser or deserialized from a config file.
/// Durations are given in whole seconds.
#[derive(Debug, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Announcement")]
#[serde(default)]
pub struct AnnouncerArgs {
    /// Distinct seed nodes to announce to per cycle.
    #[arg(long = "announce.want", default_value_t = DEFAULT_WANT_ANNOUNCEMENTS)]
    pub want_announcements: usize,

    /// Maximum seed nodes to connect per batch.
    #[arg(long = "announce.connect-at-once", default_value_t = DEFAULT_CONNECT_AT_ONCE)]
    pub connect_at_once: usize,

    /// Stop announcing once this many opennet peers are connected.
    #[arg(long = "announce.min-peers", default_value_t = DEFAULT_MIN_OPENNET_CONNECTED_PEERS)]
    pub min_opennet_connected_peers: usize,

    /// Shut announcing down when more peers than this report we are too old.
    #[arg(long = "announce.too-new-threshold", default_value_t = DEFAULT_TOO_NEW_PEERS_THRESHOLD)]
    pub too_new_peers_threshold: usize,

    /// Minimum seconds between seed connection batches.
    #[arg(long = "announce.seed-interval", value_name = "SECS", default_value_t = DEFAULT_MIN_ADDED_SEEDS_INTERVAL.as_secs())]
    pub min_added_seeds_interval_secs: u64,

    /// Seconds to pause after a batch of announcements completes.
    #[arg(long = "announce.cooling-off", value_name = "SECS", default_value_t = DEFAULT_COOLING_OFF_PERIOD.as_secs())]
    pub cooling_off_secs: u64,

    /// Seconds to wait before dropping seeds once enough peers are connected.
    #[arg(long = "announce.final-delay", value_name = "SECS", default_value_t = DEFAULT_FINAL_DELAY.as_secs())]
    pub final_delay_secs: u64,

    /// Seconds before retrying when peers were lost during the final delay.
    #[arg(long = "announce.retry-delay", value_name = "SECS", default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    pub retry_delay_secs: u64,

    /// Seconds to wait for external address detection before announcing anyway.
    #[arg(long = "announce.no-ip-delay", value_name = "SECS", default_value_t = DEFAULT_FORCE_ANNOUNCEMENT_NO_IP.as_secs())]
    pub force_announcement_no_ip_secs: u64,

    /// Seconds to give slow seed connections before resetting the cycle.
    #[arg(long = "announce.stale-seed-delay", value_name = "SECS", default_value_t = DEFAULT_NOT_ALL_CONNECTED_DELAY.as_secs())]
    pub not_all_connected_delay_secs: u64,

    /// Seconds between recurring announcement checks.
    #[arg(long = "announce.tick", value_name = "SECS", default_value_t = DEFAULT_TICK_INTERVAL.as_secs())]
    pub tick_interval_secs: u64,
}

impl Default for AnnouncerArgs {
    fn default() -> Self {
        Self::from(&AnnouncerConfig::default())
    }
}

impl From<&AnnouncerConfig> for AnnouncerArgs {
    fn from(config: &AnnouncerConfig) -> Self {
        Self {
            want_announcements: config.want_announcements,
            connect_at_once: config.connect_at_once,
            min_opennet_connected_peers: config.min_opennet_connected_peers,
            too_new_peers_threshold: config.too_new_peers_threshold,
            min_added_seeds_interval_secs: config.min_added_seeds_interval.as_secs(),
            cooling_off_secs: config.cooling_off_period.as_secs(),
            final_delay_secs: config.final_delay.as_secs(),
            retry_delay_secs: config.retry_delay.as_secs(),
            force_announcement_no_ip_secs: config.force_announcement_no_ip.as_secs(),
            not_all_connected_delay_secs: config.not_all_connected_delay.as_secs(),
            tick_interval_secs: config.tick_interval.as_secs(),
        }
    }
}

impl From<&AnnouncerArgs> for AnnouncerConfig {
    fn from(args: &AnnouncerArgs) -> Self {
        Self {
            want_announcements: args.want_announcements,
            connect_at_once: args.connect_at_once,
            min_opennet_connected_peers: args.min_opennet_connected_peers,
            too_new_peers_threshold: args.too_new_peers_threshold,
            min_added_seeds_interval: Duration::from_secs(args.min_added_seeds_interval_secs),
            cooling_off_period: Duration::from_secs(args.cooling_off_secs),
            final_delay: Duration::from_secs(args.final_delay_secs),
            retry_delay: Duration::from_secs(args.retry_delay_secs),
            force_announcement_no_ip: Duration::from_secs(args.force_announcement_no_ip_secs),
            not_all_connected_delay: Duration::from_secs(args.not_all_connected_delay_secs),
            tick_interval: Duration::from_secs(args.tick_interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        announce: AnnouncerArgs,
    }

    #[test]
    fn test_cli_defaults_match_config() {
        let cli = TestCli::parse_from(["test"]);
        assert_eq!(cli.announce, AnnouncerArgs::default());
        assert_eq!(AnnouncerConfig::from(&cli.announce), AnnouncerConfig::default());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = TestCli::parse_from([
            "test",
            "--announce.want",
            "5",
            "--announce.cooling-off",
            "10",
        ]);
        let config = AnnouncerConfig::from(&cli.announce);
        assert_eq!(config.want_announcements, 5);
        assert_eq!(config.cooling_off_period, Duration::from_secs(10));
        assert_eq!(config.final_delay, DEFAULT_FINAL_DELAY);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let args: AnnouncerArgs = toml::from_str("want_announcements = 2\ntick_interval_secs = 5\n").unwrap();
        assert_eq!(args.want_announcements, 2);
        assert_eq!(args.tick_interval_secs, 5);
        assert_eq!(args.connect_at_once, DEFAULT_CONNECT_AT_ONCE);
    }
}
