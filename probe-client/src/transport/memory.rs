//! In-process [`Transport`] for tests and local simulation.
//!
//! Routes on exact subject match. Tests script a fleet of responders with
//! [`MemoryTransport::serve`]; each published request fans out to every
//! responder registered on its subject, and each produced reply is
//! delivered to the request's reply-to inbox after its configured delay,
//! on a spawned task, the same "delivery happens elsewhere" shape a real
//! connection has.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::debug;

use super::{Headers, Reply, SubscriptionId, Transport};
use crate::error::TransportError;

/// A request observed by the transport, as recorded for test introspection.
#[derive(Debug, Clone)]
pub struct PublishedRequest {
    pub subject: String,
    pub reply_to: String,
    pub payload: Bytes,
}

/// One reply a scripted responder produces for a request.
#[derive(Debug, Clone)]
pub struct ResponderReply {
    pub delay: Duration,
    pub headers: Headers,
    pub payload: Bytes,
}

impl ResponderReply {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            delay: Duration::ZERO,
            headers: Headers::default(),
            payload: payload.into(),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

type Responder = Box<dyn Fn(&PublishedRequest) -> Vec<ResponderReply> + Send + Sync>;

struct State {
    subscriptions: HashMap<SubscriptionId, (String, mpsc::Sender<Reply>)>,
    responders: Vec<(String, Arc<Responder>)>,
    published: Vec<PublishedRequest>,
    unsubscribe_calls: u64,
    publish_failure: Option<String>,
}

/// In-memory pub/sub bus implementing [`Transport`].
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
    next_sub: AtomicU64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                subscriptions: HashMap::new(),
                responders: Vec::new(),
                published: Vec::new(),
                unsubscribe_calls: 0,
                publish_failure: None,
            })),
            next_sub: AtomicU64::new(1),
        }
    }

    /// Register a responder for `subject`. Every request published to that
    /// subject invokes it once; each returned reply is delivered to the
    /// request's reply-to after its delay.
    pub fn serve<F>(&self, subject: &str, responder: F)
    where
        F: Fn(&PublishedRequest) -> Vec<ResponderReply> + Send + Sync + 'static,
    {
        let mut state = self.state.lock().expect("memory transport lock");
        state
            .responders
            .push((subject.to_string(), Arc::new(Box::new(responder))));
    }

    /// Deliver a message directly to `subject`, bypassing responders.
    /// Returns false if nothing is subscribed there.
    pub async fn deliver(&self, subject: &str, reply: Reply) -> bool {
        let senders = self.senders_for(subject);
        for sender in &senders {
            let _ = sender.send(reply.clone()).await;
        }
        !senders.is_empty()
    }

    /// Make the next `publish_request` calls fail with `reason`.
    pub fn inject_publish_failure(&self, reason: &str) {
        let mut state = self.state.lock().expect("memory transport lock");
        state.publish_failure = Some(reason.to_string());
    }

    /// Requests published so far, in order.
    pub fn published(&self) -> Vec<PublishedRequest> {
        self.state
            .lock()
            .expect("memory transport lock")
            .published
            .clone()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.state
            .lock()
            .expect("memory transport lock")
            .subscriptions
            .len()
    }

    /// Total number of unsubscribe calls, counting repeats.
    pub fn unsubscribe_calls(&self) -> u64 {
        self.state
            .lock()
            .expect("memory transport lock")
            .unsubscribe_calls
    }

    fn senders_for(&self, subject: &str) -> Vec<mpsc::Sender<Reply>> {
        let state = self.state.lock().expect("memory transport lock");
        state
            .subscriptions
            .values()
            .filter(|(sub_subject, _)| sub_subject.as_str() == subject)
            .map(|(_, sender)| sender.clone())
            .collect()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    fn new_inbox(&self) -> String {
        format!("_INBOX.{}", uuid::Uuid::new_v4().simple())
    }

    async fn subscribe(
        &self,
        subject: &str,
        delivery: mpsc::Sender<Reply>,
    ) -> Result<SubscriptionId, TransportError> {
        let id = SubscriptionId(self.next_sub.fetch_add(1, Ordering::Relaxed));
        let mut state = self.state.lock().expect("memory transport lock");
        state
            .subscriptions
            .insert(id, (subject.to_string(), delivery));
        debug!(subject = %subject, id = id.0, "memory transport subscribed");
        Ok(id)
    }

    async fn publish_request(
        &self,
        subject: &str,
        reply_to: &str,
        payload: Bytes,
    ) -> Result<(), TransportError> {
        let request = PublishedRequest {
            subject: subject.to_string(),
            reply_to: reply_to.to_string(),
            payload,
        };

        let responders: Vec<Arc<Responder>> = {
            let mut state = self.state.lock().expect("memory transport lock");
            if let Some(reason) = state.publish_failure.clone() {
                return Err(TransportError::Publish {
                    subject: subject.to_string(),
                    reason,
                });
            }
            state.published.push(request.clone());
            state
                .responders
                .iter()
                .filter(|(resp_subject, _)| resp_subject.as_str() == subject)
                .map(|(_, responder)| Arc::clone(responder))
                .collect()
        };

        for responder in responders {
            for scripted in responder(&request) {
                let state = Arc::clone(&self.state);
                let inbox = request.reply_to.clone();
                tokio::spawn(async move {
                    if !scripted.delay.is_zero() {
                        tokio::time::sleep(scripted.delay).await;
                    }
                    let sender = {
                        let state = state.lock().expect("memory transport lock");
                        state
                            .subscriptions
                            .values()
                            .find(|(subject, _)| *subject == inbox)
                            .map(|(_, sender)| sender.clone())
                    };
                    // Subscription may be gone by now; that just means the
                    // collection already stopped.
                    if let Some(sender) = sender {
                        let _ = sender
                            .send(Reply {
                                subject: inbox,
                                headers: scripted.headers,
                                payload: scripted.payload,
                            })
                            .await;
                    }
                });
            }
        }

        Ok(())
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), TransportError> {
        let mut state = self.state.lock().expect("memory transport lock");
        state.unsubscribe_calls += 1;
        state.subscriptions.remove(&id);
        Ok(())
    }
}
