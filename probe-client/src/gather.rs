//! Scatter-gather collector.
//!
//! One call of [`gather`] runs one request/multi-reply cycle: subscribe an
//! ephemeral inbox, publish the request with the inbox as reply-to, then
//! race three stopping conditions until one fires:
//!
//! - a reply arrives: accept it, and stop early once `expected_count` is
//!   reached;
//! - no reply for `max_interval` after at least one arrived: silence
//!   means no more responders are coming, so stop with what was collected;
//! - `max_wait` since the call started: hard cutoff regardless of ongoing
//!   traffic.
//!
//! Both timer exits are successes; a possibly-empty reply list is the
//! normal answer to "how many responders are out there". The only failures
//! are local transport errors and the in-band "no responders" signal.

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{GatherError, TransportError};
use crate::transport::{Reply, Transport};

/// Default absolute deadline for one collection.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10);

/// Default silence window after which collection stops.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_millis(300);

/// Replies buffered between the delivery task and the collection loop.
/// When full, the delivery task blocks until the loop drains.
pub const REPLY_QUEUE_CAPACITY: usize = 100;

/// Configuration for one [`gather`] call. Built once, validated once,
/// never mutated after the race loop starts.
#[derive(Debug, Clone)]
pub struct GatherOptions {
    /// Absolute deadline, measured from the start of the call.
    pub max_wait: Duration,
    /// Silence window; resets every time a reply is accepted.
    pub max_interval: Duration,
    /// Exact number of replies to wait for. `None` means unbounded: wait
    /// until one of the timers fires.
    pub expected_count: Option<usize>,
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
            max_interval: DEFAULT_MAX_INTERVAL,
            expected_count: None,
        }
    }
}

impl GatherOptions {
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    pub fn expected_count(mut self, count: usize) -> Self {
        self.expected_count = Some(count);
        self
    }

    fn validate(&self) -> Result<(), GatherError> {
        if self.max_wait.is_zero() {
            return Err(GatherError::InvalidOptions("max_wait must be positive".into()));
        }
        if self.max_interval.is_zero() {
            return Err(GatherError::InvalidOptions(
                "max_interval must be positive".into(),
            ));
        }
        if self.expected_count == Some(0) {
            return Err(GatherError::InvalidOptions(
                "expected_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Publish `payload` on `subject` and collect the replies that arrive on a
/// fresh inbox, in arrival order, until a stopping condition fires.
///
/// Exactly one subscription is created per call and it is released before
/// this function returns, on every path. On a transport failure or a "no
/// responders" signal the error is returned and already-accepted replies
/// are dropped.
pub async fn gather<T: Transport + ?Sized>(
    transport: &T,
    subject: &str,
    payload: Bytes,
    options: &GatherOptions,
) -> Result<Vec<Reply>, GatherError> {
    if subject.is_empty() {
        return Err(GatherError::InvalidOptions("request subject is empty".into()));
    }
    options.validate()?;

    let inbox = transport.new_inbox();
    let (delivery, replies) = mpsc::channel(REPLY_QUEUE_CAPACITY);
    let sub = transport.subscribe(&inbox, delivery).await?;

    debug!(subject = %subject, inbox = %inbox, ?options, "starting collection");

    let outcome = collect_replies(transport, subject, &inbox, payload, options, replies).await;

    // Single release point for every exit path above.
    if let Err(err) = transport.unsubscribe(sub).await {
        warn!(inbox = %inbox, error = %err, "failed to release reply subscription");
    }

    outcome
}

async fn collect_replies<T: Transport + ?Sized>(
    transport: &T,
    subject: &str,
    inbox: &str,
    payload: Bytes,
    options: &GatherOptions,
    mut replies: mpsc::Receiver<Reply>,
) -> Result<Vec<Reply>, GatherError> {
    transport.publish_request(subject, inbox, payload).await?;

    let mut collected = Vec::new();

    // The deadline is armed once; only the quiescence timer is ever reset.
    let deadline = tokio::time::sleep(options.max_wait);
    tokio::pin!(deadline);
    let quiet = tokio::time::sleep(options.max_interval);
    tokio::pin!(quiet);

    loop {
        tokio::select! {
            received = replies.recv() => {
                let Some(reply) = received else {
                    // The delivery sender only disappears while we still
                    // hold the subscription if the transport tore down.
                    return Err(TransportError::Closed(
                        "reply delivery channel closed mid-collection".into(),
                    )
                    .into());
                };
                if reply.is_no_responders() {
                    debug!(subject = %subject, "got no-responders status, aborting");
                    return Err(GatherError::NoResponders {
                        subject: subject.to_string(),
                    });
                }
                collected.push(reply);
                if let Some(expected) = options.expected_count {
                    if collected.len() >= expected {
                        debug!(subject = %subject, count = collected.len(), "expected count reached");
                        return Ok(collected);
                    }
                }
                quiet.as_mut().reset(Instant::now() + options.max_interval);
            }
            // Quiescence means "silence since the last reply"; until the
            // first reply arrives only the deadline can stop the call.
            _ = &mut quiet, if !collected.is_empty() => {
                debug!(subject = %subject, count = collected.len(), "quiescence window elapsed");
                return Ok(collected);
            }
            _ = &mut deadline => {
                debug!(subject = %subject, count = collected.len(), "deadline reached");
                return Ok(collected);
            }
        }
    }
}
