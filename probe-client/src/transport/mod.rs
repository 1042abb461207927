//! Transport facade: the pub/sub seam the collector runs against.
//!
//! The client never owns a connection. Whoever constructs it hands in
//! something implementing [`Transport`]: a connected pub/sub client that can
//! mint fresh reply subjects, subscribe, publish a request tagged with a
//! reply-to, and unsubscribe. Delivery happens on the transport's own task;
//! replies are pushed into the bounded channel the subscriber provided, so a
//! saturated, undrained channel blocks the delivery task rather than growing
//! memory.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::TransportError;

pub mod memory;

/// Header carrying the transport-level status code on control replies.
pub const STATUS_HEADER: &str = "Status";

/// Status code meaning "no responders available on this subject".
pub const NO_RESPONDERS_CODE: &str = "503";

/// One message delivered on a subscription.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Subject the message arrived on (the inbox, for collected replies).
    pub subject: String,
    /// Header fields, looked up case-insensitively.
    pub headers: Headers,
    /// Opaque payload. The collector never inspects it.
    pub payload: Bytes,
}

impl Reply {
    pub fn new(subject: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            subject: subject.into(),
            headers: Headers::default(),
            payload: payload.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Whether this reply is the transport's "no responders" control signal.
    pub fn is_no_responders(&self) -> bool {
        self.headers.get(STATUS_HEADER) == Some(NO_RESPONDERS_CODE)
    }
}

/// String-keyed header map with case-insensitive lookup.
///
/// Keys are folded to lowercase on insert, so `get("Status")` and
/// `get("status")` hit the same entry.
#[derive(Debug, Clone, Default)]
pub struct Headers(std::collections::HashMap<String, String>);

impl Headers {
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Token identifying one active subscription on a [`Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A connected pub/sub client, as consumed by the collector.
///
/// Implementations route every message arriving on a subscribed subject into
/// the `delivery` sender, in arrival order, until [`Transport::unsubscribe`]
/// is called for that subscription. `publish_request` fails only on local
/// transport problems: the absence of remote responders is signalled
/// in-band by a [`NO_RESPONDERS_CODE`] reply, not by a publish error.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// A fresh reply subject, guaranteed not to collide with any other
    /// in-flight inbox.
    fn new_inbox(&self) -> String;

    /// Start delivering messages on `subject` into `delivery`.
    async fn subscribe(
        &self,
        subject: &str,
        delivery: mpsc::Sender<Reply>,
    ) -> Result<SubscriptionId, TransportError>;

    /// Publish one request to `subject`, tagging replies for `reply_to`.
    async fn publish_request(
        &self,
        subject: &str,
        reply_to: &str,
        payload: Bytes,
    ) -> Result<(), TransportError>;

    /// Stop delivery for `id`. Idempotent: releasing an unknown or already
    /// released subscription is not an error.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), TransportError>;
}
