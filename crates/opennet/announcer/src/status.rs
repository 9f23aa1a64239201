//! Read-only announcer status for display.

use std::fmt;
use std::time::Duration;

use crate::state::AnnouncerPhase;

/// Point-in-time view of the announcer.
///
/// `Display` prints a one-line summary; the alternate form (`{:#}`) adds the
/// counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub phase: AnnouncerPhase,
    /// Nodes added through announcements since startup.
    pub added_nodes: u64,
    /// Nodes that did not want us since startup.
    pub not_wanted_nodes: u64,
    /// Announcements sent in the current cycle.
    pub sent_announcements: usize,
    pub running_announcements: usize,
    /// Time left in the cooling-off period.
    pub cooling_off: Duration,
    pub connected_seeds: usize,
    pub disconnected_seeds: usize,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            AnnouncerPhase::NoSeedsAvailable => {
                return f.write_str("No seed nodes available, cannot announce to the network.");
            }
            AnnouncerPhase::Loading => {
                return f.write_str("Loading seed nodes.");
            }
            AnnouncerPhase::ConnectingSeeds => {
                f.write_str("Connecting to seed nodes and announcing to the network.")?;
            }
        }

        if f.alternate() {
            write!(
                f,
                " Added {} nodes, {} refused. Sent {} announcements, {} running. \
                 Seed nodes: {} connected, {} disconnected.",
                self.added_nodes,
                self.not_wanted_nodes,
                self.sent_announcements,
                self.running_announcements,
                self.connected_seeds,
                self.disconnected_seeds,
            )?;
            let secs = self.cooling_off.as_secs();
            if secs > 0 {
                write!(f, " Cooling off for {secs}s.")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(phase: AnnouncerPhase) -> StatusReport {
        StatusReport {
            phase,
            added_nodes: 4,
            not_wanted_nodes: 1,
            sent_announcements: 2,
            running_announcements: 1,
            cooling_off: Duration::ZERO,
            connected_seeds: 3,
            disconnected_seeds: 5,
        }
    }

    #[test]
    fn test_phase_messages() {
        assert!(report(AnnouncerPhase::Loading).to_string().starts_with("Loading"));
        assert!(
            report(AnnouncerPhase::NoSeedsAvailable)
                .to_string()
                .starts_with("No seed nodes")
        );
        // Detail is only shown for the connecting phase.
        assert!(!format!("{:#}", report(AnnouncerPhase::Loading)).contains("Added"));
    }

    #[test]
    fn test_detail_only_in_alternate_form() {
        let status = report(AnnouncerPhase::ConnectingSeeds);
        assert!(!status.to_string().contains("Added"));

        let detail = format!("{status:#}");
        assert!(detail.contains("Added 4 nodes, 1 refused"));
        assert!(detail.contains("3 connected, 5 disconnected"));
        assert!(!detail.contains("Cooling off"));
    }

    #[test]
    fn test_cooling_off_shown() {
        let mut status = report(AnnouncerPhase::ConnectingSeeds);
        status.cooling_off = Duration::from_secs(42);
        assert!(format!("{status:#}").ends_with("Cooling off for 42s."));
    }
}
