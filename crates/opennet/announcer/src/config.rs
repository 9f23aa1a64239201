//! Announcer configuration.

use std::time::Duration;

use crate::constants::*;
use crate::error::ConfigError;

/// Configuration for the announcement scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncerConfig {
    /// Distinct seed nodes to announce to per cycle (default: 3).
    pub want_announcements: usize,

    /// Maximum seed nodes connected per batch (default: 10).
    pub connect_at_once: usize,

    /// Upper bound for the sufficient opennet peer count (default: 10).
    /// The effective target is `min(this, aim / 2)`.
    pub min_opennet_connected_peers: usize,

    /// Too-new peer count above which announcing is shut down when we cannot
    /// update ourselves (default: 10).
    pub too_new_peers_threshold: usize,

    /// Minimum interval between seed connection batches (default: 60s).
    pub min_added_seeds_interval: Duration,

    /// Pause after a batch of announcements completes (default: 60s).
    pub cooling_off_period: Duration,

    /// Delay before dropping seeds once we have enough peers (default: 60s).
    pub final_delay: Duration,

    /// Retry delay when peers were lost during the final delay (default: 60s).
    pub retry_delay: Duration,

    /// How long to wait for external address detection (default: 120s).
    pub force_announcement_no_ip: Duration,

    /// Grace period for slow seed connections before resetting the dedup
    /// cycle (default: 60s).
    pub not_all_connected_delay: Duration,

    /// Interval of the recurring decision tick (default: 60s).
    pub tick_interval: Duration,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            want_announcements: DEFAULT_WANT_ANNOUNCEMENTS,
            connect_at_once: DEFAULT_CONNECT_AT_ONCE,
            min_opennet_connected_peers: DEFAULT_MIN_OPENNET_CONNECTED_PEERS,
            too_new_peers_threshold: DEFAULT_TOO_NEW_PEERS_THRESHOLD,
            min_added_seeds_interval: DEFAULT_MIN_ADDED_SEEDS_INTERVAL,
            cooling_off_period: DEFAULT_COOLING_OFF_PERIOD,
            final_delay: DEFAULT_FINAL_DELAY,
            retry_delay: DEFAULT_RETRY_DELAY,
            force_announcement_no_ip: DEFAULT_FORCE_ANNOUNCEMENT_NO_IP,
            not_all_connected_delay: DEFAULT_NOT_ALL_CONNECTED_DELAY,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl AnnouncerConfig {
    /// Opennet peer count at which announcing stops for a node aiming at
    /// `aim_peer_count` peers.
    pub fn target_peers(&self, aim_peer_count: usize) -> usize {
        self.min_opennet_connected_peers.min(aim_peer_count / 2)
    }

    /// Check the configuration for values the scheduler cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.want_announcements == 0 {
            return Err(ConfigError::ZeroWantAnnouncements);
        }
        if self.connect_at_once == 0 {
            return Err(ConfigError::ZeroConnectAtOnce);
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }

    pub fn with_want_announcements(mut self, want: usize) -> Self {
        self.want_announcements = want;
        self
    }

    pub fn with_connect_at_once(mut self, count: usize) -> Self {
        self.connect_at_once = count;
        self
    }

    pub fn with_min_opennet_connected_peers(mut self, count: usize) -> Self {
        self.min_opennet_connected_peers = count;
        self
    }

    pub fn with_too_new_peers_threshold(mut self, count: usize) -> Self {
        self.too_new_peers_threshold = count;
        self
    }

    pub fn with_min_added_seeds_interval(mut self, interval: Duration) -> Self {
        self.min_added_seeds_interval = interval;
        self
    }

    pub fn with_cooling_off_period(mut self, period: Duration) -> Self {
        self.cooling_off_period = period;
        self
    }

    pub fn with_final_delay(mut self, delay: Duration) -> Self {
        self.final_delay = delay;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_force_announcement_no_ip(mut self, delay: Duration) -> Self {
        self.force_announcement_no_ip = delay;
        self
    }

    pub fn with_not_all_connected_delay(mut self, delay: Duration) -> Self {
        self.not_all_connected_delay = delay;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnnouncerConfig::default();
        assert_eq!(config.want_announcements, 3);
        assert_eq!(config.connect_at_once, 10);
        assert_eq!(config.cooling_off_period, Duration::from_secs(60));
        assert_eq!(config.force_announcement_no_ip, Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_peers() {
        let config = AnnouncerConfig::default();
        assert_eq!(config.target_peers(40), 10);
        assert_eq!(config.target_peers(14), 7);
        assert_eq!(config.target_peers(1), 0);
    }

    #[test]
    fn test_validate() {
        let config = AnnouncerConfig::default().with_want_announcements(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroWantAnnouncements));

        let config = AnnouncerConfig::default().with_connect_at_once(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroConnectAtOnce));

        let config = AnnouncerConfig::default().with_tick_interval(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickInterval));
    }

    #[test]
    fn test_config_builder() {
        let config = AnnouncerConfig::default()
            .with_want_announcements(5)
            .with_cooling_off_period(Duration::from_secs(10))
            .with_final_delay(Duration::from_secs(5));

        assert_eq!(config.want_announcements, 5);
        assert_eq!(config.cooling_off_period, Duration::from_secs(10));
        assert_eq!(config.final_delay, Duration::from_secs(5));
    }
}
