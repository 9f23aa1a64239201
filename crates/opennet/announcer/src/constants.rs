//! Announcer defaults.

use std::time::Duration;

/// Number of distinct seed nodes announced to per cycle.
pub const DEFAULT_WANT_ANNOUNCEMENTS: usize = 3;

/// Maximum number of seed nodes connected per batch.
pub const DEFAULT_CONNECT_AT_ONCE: usize = 10;

/// Do not announce once this many opennet peers are connected.
pub const DEFAULT_MIN_OPENNET_CONNECTED_PEERS: usize = 10;

/// Announcing is shut down once more than this many peers report that we are
/// too old, and we cannot update ourselves.
pub const DEFAULT_TOO_NEW_PEERS_THRESHOLD: usize = 10;

/// Minimum interval between two seed connection batches.
pub const DEFAULT_MIN_ADDED_SEEDS_INTERVAL: Duration = Duration::from_secs(60);

/// Pause after a batch of announcements completes before sending more.
pub const DEFAULT_COOLING_OFF_PERIOD: Duration = Duration::from_secs(60);

/// Once we have enough peers, wait this long before dropping seed nodes.
pub const DEFAULT_FINAL_DELAY: Duration = Duration::from_secs(60);

/// If we lost our peers by the end of the final delay, retry after this long.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Give up waiting for external address detection after this long.
pub const DEFAULT_FORCE_ANNOUNCEMENT_NO_IP: Duration = Duration::from_secs(120);

/// Grace period for slow seed connections before the dedup cycle is reset.
pub const DEFAULT_NOT_ALL_CONNECTED_DELAY: Duration = Duration::from_secs(60);

/// Interval of the recurring decision tick.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);
