use serde::{Deserialize, Serialize};

/// What to do with a record that cannot be grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Log the record, leave it out and keep going.
    #[default]
    Skip,
    /// Abort the whole batch.
    Fail,
}

/// Why a notification record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Malformation {
    #[error("account id is empty")]
    EmptyAccountId,

    #[error("notification type is empty")]
    EmptyType,
}

#[derive(Debug, thiserror::Error)]
pub enum GroupingError {
    #[error("malformed notification at index {index}: {reason}")]
    Malformed { index: usize, reason: Malformation },

    #[error("invalid timezone '{0}': expected 'local', 'utc' or an offset such as '+02:00'")]
    InvalidZone(String),
}

/// A record left out of a batch under [`MalformedPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Where the record came from: a feed page path, or `input` for
    /// records handed straight to [`crate::grouping::Aggregator`].
    pub origin: String,
    /// Position of the record within its origin.
    pub index: usize,
    pub reason: String,
}
