//! Error types, one enum per concern.

use std::time::Duration;

/// Local failure of the underlying pub/sub transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("subscribe to {subject:?} failed: {reason}")]
    Subscribe { subject: String, reason: String },
    #[error("publish to {subject:?} failed: {reason}")]
    Publish { subject: String, reason: String },
    #[error("transport closed: {0}")]
    Closed(String),
}

/// Failure of one scatter-gather collection.
///
/// Timeouts are deliberately absent: both the quiescence and the deadline
/// stopping conditions are success outcomes carrying whatever was collected.
#[derive(Debug, thiserror::Error)]
pub enum GatherError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The transport signalled that nothing is listening on the subject.
    /// Any replies accepted before the signal are discarded.
    #[error("no responders available on {subject:?}")]
    NoResponders { subject: String },
    #[error("invalid gather options: {0}")]
    InvalidOptions(String),
}

/// Failure of a typed system-client call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Gather(#[from] GatherError),
    /// The single-target variant got no reply within its timeout.
    #[error("no reply on {subject:?} within {timeout:?}")]
    NoReply { subject: String, timeout: Duration },
    #[error("failed to decode reply payload: {0}")]
    Decode(#[from] serde_json::Error),
}
