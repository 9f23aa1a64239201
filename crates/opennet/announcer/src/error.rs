//! Announcer error types.

/// A seed record that could not be turned into a usable seed node.
///
/// These never abort a connection batch: the candidate is logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedRecordError {
    /// A mandatory field is absent from the record.
    #[error("missing field {0:?}")]
    MissingField(&'static str),

    /// A field is present but malformed.
    #[error("invalid field {field:?}: {reason}")]
    Parse { field: &'static str, reason: String },

    /// The record lists no address we could connect to.
    #[error("no usable address: {0}")]
    InvalidAddress(String),

    /// The reference signature does not verify.
    #[error("reference signature verification failed")]
    SignatureVerification,
}

/// Invalid announcer configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("want_announcements must be at least 1")]
    ZeroWantAnnouncements,

    #[error("connect_at_once must be at least 1")]
    ZeroConnectAtOnce,

    #[error("tick_interval must be non-zero")]
    ZeroTickInterval,
}
