//! Typed system client over the scatter-gather collector.
//!
//! [`SysClient`] issues monitoring queries against a fleet of servers:
//! either one specific server (`server_status`) or every live member via
//! the broadcast target (`server_status_all`). Both are thin wrappers
//! around the raw `request_one` / `request_many` calls, which expose the
//! collector directly for callers with their own wire schema.

use std::sync::Arc;

use bytes::Bytes;
use tokio::time::Duration;
use tracing::debug;

use probe_types::{StatusFilter, StatusResponse};

use crate::error::{ClientError, GatherError};
use crate::gather::{gather, GatherOptions, DEFAULT_MAX_WAIT};
use crate::transport::{Reply, Transport};

/// Broadcast addressing target: every live server answers.
pub const BROADCAST_TARGET: &str = "PING";

/// Subject a server's status endpoint listens on.
pub fn status_subject(server_id: &str) -> String {
    format!("$SYS.REQ.SERVER.{server_id}.VARZ")
}

/// Monitoring query client. Cheap to clone; the transport is shared.
pub struct SysClient<T: Transport> {
    transport: Arc<T>,
}

impl<T: Transport> Clone for SysClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> SysClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Publish `payload` on `subject` and collect every reply that arrives
    /// before a stopping condition fires. See [`GatherOptions`].
    pub async fn request_many(
        &self,
        subject: &str,
        payload: impl Into<Bytes>,
        options: &GatherOptions,
    ) -> Result<Vec<Reply>, GatherError> {
        gather(self.transport.as_ref(), subject, payload.into(), options).await
    }

    /// Single-target variant: exactly one reply is expected. Returns it,
    /// or [`ClientError::NoReply`] if none arrived within `timeout`.
    pub async fn request_one(
        &self,
        subject: &str,
        payload: impl Into<Bytes>,
        timeout: Duration,
    ) -> Result<Reply, ClientError> {
        let options = GatherOptions::default()
            .max_wait(timeout)
            .expected_count(1);
        let mut replies = gather(self.transport.as_ref(), subject, payload.into(), &options).await?;
        replies.pop().ok_or_else(|| ClientError::NoReply {
            subject: subject.to_string(),
            timeout,
        })
    }

    /// Query one specific server's runtime status.
    pub async fn server_status(
        &self,
        server_id: &str,
        filter: &StatusFilter,
    ) -> Result<StatusResponse, ClientError> {
        let subject = status_subject(server_id);
        let payload = serde_json::to_vec(filter)?;
        let reply = self.request_one(&subject, payload, DEFAULT_MAX_WAIT).await?;
        Ok(serde_json::from_slice(&reply.payload)?)
    }

    /// Broadcast the status query to every live server and decode each
    /// reply. The fleet size is unknown up front; collection stops on
    /// quiescence or the deadline.
    pub async fn server_status_all(
        &self,
        filter: &StatusFilter,
    ) -> Result<Vec<StatusResponse>, ClientError> {
        let subject = status_subject(BROADCAST_TARGET);
        let payload = serde_json::to_vec(filter)?;
        let replies = self
            .request_many(&subject, payload, &GatherOptions::default())
            .await?;

        debug!(subject = %subject, count = replies.len(), "decoding status replies");
        let mut statuses = Vec::with_capacity(replies.len());
        for reply in &replies {
            statuses.push(serde_json::from_slice(&reply.payload)?);
        }
        Ok(statuses)
    }
}
