//! Error types for the observable list core.
//!
//! The core itself is infallible: subscribing, replacing, and mutating
//! cannot fail. Errors only arise at the serialization boundary
//! (encoding or decoding snapshots) and at the durable store boundary
//! (reading or writing persisted state).

use thiserror::Error;

/// Errors produced by the serialization and persistence contracts.
#[derive(Debug, Error)]
pub enum Error {
    /// Encoding the list state into a snapshot failed.
    #[error("failed to encode list state: {0}")]
    Encode(#[source] serde_json::Error),

    /// The durable store held a value that is not valid JSON.
    ///
    /// Surfaced to the caller of [`persist`](crate::persist::persist)
    /// rather than silently discarding the stored state.
    #[error("stored value under key '{key}' is not valid JSON: {source}")]
    MalformedSnapshot {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A snapshot parsed as JSON but has the wrong shape, or one of its
    /// elements failed to decode into the list's element type.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// The durable store failed to read or write.
    #[error("durable store error: {0}")]
    Store(String),
}
