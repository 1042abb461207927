//! probe-client: scatter-gather query client for fleet monitoring.
//!
//! Queries an unknown, variable-sized population of servers over a
//! connected pub/sub transport and assembles their replies into one result
//! set within a bounded time budget. The caller supplies the transport
//! (see [`transport::Transport`]); the collector owns nothing but the
//! per-call inbox subscription and never looks inside reply payloads.
//!
//! ```no_run
//! use std::sync::Arc;
//! use probe_client::{SysClient, transport::memory::MemoryTransport};
//! use probe_types::StatusFilter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SysClient::new(Arc::new(MemoryTransport::new()));
//! let statuses = client.server_status_all(&StatusFilter::default()).await?;
//! println!("{} servers answered", statuses.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod gather;
pub mod transport;

pub use client::{status_subject, SysClient, BROADCAST_TARGET};
pub use error::{ClientError, GatherError, TransportError};
pub use gather::{
    gather, GatherOptions, DEFAULT_MAX_INTERVAL, DEFAULT_MAX_WAIT, REPLY_QUEUE_CAPACITY,
};
pub use transport::{Headers, Reply, SubscriptionId, Transport};
