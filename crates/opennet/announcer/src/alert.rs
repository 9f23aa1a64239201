//! User-visible alerts raised by the announcer.

use std::fmt;

/// How prominently an alert should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AlertPriority {
    Minor,
    Warning,
    Error,
    /// Stays visible until the user acknowledges it.
    CriticalError,
}

/// Reason an alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AlertKind {
    /// Announcing has been shut down because our software is too old.
    TooOld,
}

/// An alert for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAlert {
    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub title: String,
    pub text: String,
}

impl UserAlert {
    /// Announcing stopped because many peers report that we run outdated
    /// software and we cannot update ourselves.
    pub fn too_old(too_new_peers: usize) -> Self {
        Self {
            kind: AlertKind::TooOld,
            priority: AlertPriority::CriticalError,
            title: "Announcing disabled: node is too old".to_string(),
            text: format!(
                "{too_new_peers} peers report that this node runs outdated software. \
                 Announcing to seed nodes has been stopped to avoid flooding them. \
                 Please update the node."
            ),
        }
    }
}

impl fmt::Display for UserAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.priority, self.title, self.text)
    }
}
