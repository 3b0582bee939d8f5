//! In-process implementation of the resource control API.
//!
//! Keeps topics, subscriptions and per-subscription queues in memory.
//! Publishing fans a message out to every pull subscription of the topic.
//! Delivered messages stay outstanding until acknowledged; acknowledging an
//! id twice succeeds, acknowledging an id that was never issued fails the
//! whole batch. Deadlines are recorded but never expire.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::wire::{
    AcknowledgeRequest, ModifyAckDeadlineRequest, ModifyPushConfigRequest, PubsubEvent,
    PublishRequest, PullRequest, PullResponse, SubscriptionResource, TopicResource, WireMessage,
};
use super::ResourceApi;
use crate::error::{Error, Result};

/// How long a blocking pull waits for a publish before returning empty.
const DEFAULT_BLOCKING_WAIT: Duration = Duration::from_millis(200);

#[derive(Debug, Default)]
struct State {
    topics: HashMap<String, TopicResource>,
    subscriptions: HashMap<String, SubscriptionResource>,
    queues: HashMap<String, VecDeque<WireMessage>>,
    /// ack id -> subscription it was issued for
    outstanding: HashMap<String, String>,
    /// Acknowledged ids, kept so a repeated ack succeeds. Dropped with the
    /// subscription.
    acked: HashMap<String, String>,
}

/// In-memory [`ResourceApi`].
#[derive(Debug)]
pub struct MemoryApi {
    state: Mutex<State>,
    published: Notify,
    next_id: AtomicU64,
    fail_pulls: AtomicBool,
    blocking_wait: Duration,
    calls: Mutex<Vec<&'static str>>,
    last_deadline: Mutex<Option<ModifyAckDeadlineRequest>>,
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::with_blocking_wait(DEFAULT_BLOCKING_WAIT)
    }

    /// Create an instance whose blocking pulls wait at most `wait`.
    pub fn with_blocking_wait(wait: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            published: Notify::new(),
            next_id: AtomicU64::new(1),
            fail_pulls: AtomicBool::new(false),
            blocking_wait: wait,
            calls: Mutex::new(Vec::new()),
            last_deadline: Mutex::new(None),
        }
    }

    /// Make every subsequent pull fail with a 503 until reset.
    pub fn set_fail_pulls(&self, fail: bool) {
        self.fail_pulls.store(fail, Ordering::SeqCst);
    }

    /// Names of the RPCs invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// The most recent deadline modification request received.
    pub fn last_ack_deadline_request(&self) -> Option<ModifyAckDeadlineRequest> {
        self.last_deadline.lock().unwrap().clone()
    }

    /// Number of delivered but unacknowledged messages.
    pub fn outstanding(&self) -> usize {
        self.state.lock().unwrap().outstanding.len()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Pop the next queued message for `subscription`, if any.
    fn try_deliver(&self, subscription: &str) -> Result<Option<PullResponse>> {
        let mut state = self.state.lock().unwrap();
        let queue = state
            .queues
            .get_mut(subscription)
            .ok_or_else(|| not_found("subscription", subscription))?;
        let Some(message) = queue.pop_front() else {
            return Ok(None);
        };

        let ack_id = format!("ack-{}", self.next_id());
        state
            .outstanding
            .insert(ack_id.clone(), subscription.to_string());

        Ok(Some(PullResponse {
            ack_id: Some(ack_id),
            pubsub_event: Some(PubsubEvent {
                subscription: Some(subscription.to_string()),
                message: Some(message),
            }),
        }))
    }
}

fn not_found(kind: &str, name: &str) -> Error {
    Error::Service {
        status: 404,
        message: format!("{kind} not found: {name}"),
    }
}

fn conflict(kind: &str, name: &str) -> Error {
    Error::Service {
        status: 409,
        message: format!("{kind} already exists: {name}"),
    }
}

fn bad_request(message: String) -> Error {
    Error::Service {
        status: 400,
        message,
    }
}

#[async_trait]
impl ResourceApi for MemoryApi {
    async fn create_topic(&self, topic: &TopicResource) -> Result<TopicResource> {
        self.record("create_topic");
        let mut state = self.state.lock().unwrap();
        if state.topics.contains_key(&topic.name) {
            return Err(conflict("topic", &topic.name));
        }
        state.topics.insert(topic.name.clone(), topic.clone());
        Ok(topic.clone())
    }

    async fn get_topic(&self, name: &str) -> Result<Option<TopicResource>> {
        self.record("get_topic");
        Ok(self.state.lock().unwrap().topics.get(name).cloned())
    }

    async fn delete_topic(&self, name: &str) -> Result<()> {
        self.record("delete_topic");
        self.state
            .lock()
            .unwrap()
            .topics
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("topic", name))
    }

    async fn publish(&self, request: &PublishRequest) -> Result<()> {
        self.record("publish");
        {
            let mut state = self.state.lock().unwrap();
            if !state.topics.contains_key(&request.topic) {
                return Err(not_found("topic", &request.topic));
            }

            let mut message = request.message.clone();
            message.message_id = Some(self.next_id().to_string());

            let targets: Vec<String> = state
                .subscriptions
                .values()
                .filter(|s| s.topic == request.topic && s.push_config.is_none())
                .map(|s| s.name.clone())
                .collect();
            for name in targets {
                state
                    .queues
                    .entry(name)
                    .or_default()
                    .push_back(message.clone());
            }
        }
        self.published.notify_waiters();
        Ok(())
    }

    async fn create_subscription(
        &self,
        subscription: &SubscriptionResource,
    ) -> Result<SubscriptionResource> {
        self.record("create_subscription");
        let mut state = self.state.lock().unwrap();
        if !state.topics.contains_key(&subscription.topic) {
            return Err(not_found("topic", &subscription.topic));
        }
        if state.subscriptions.contains_key(&subscription.name) {
            return Err(conflict("subscription", &subscription.name));
        }
        state
            .subscriptions
            .insert(subscription.name.clone(), subscription.clone());
        state
            .queues
            .insert(subscription.name.clone(), VecDeque::new());
        Ok(subscription.clone())
    }

    async fn get_subscription(&self, name: &str) -> Result<Option<SubscriptionResource>> {
        self.record("get_subscription");
        Ok(self.state.lock().unwrap().subscriptions.get(name).cloned())
    }

    async fn delete_subscription(&self, name: &str) -> Result<()> {
        self.record("delete_subscription");
        let mut state = self.state.lock().unwrap();
        if state.subscriptions.remove(name).is_none() {
            return Err(not_found("subscription", name));
        }
        state.queues.remove(name);
        state.outstanding.retain(|_, sub| sub != name);
        state.acked.retain(|_, sub| sub != name);
        Ok(())
    }

    async fn modify_push_config(&self, request: &ModifyPushConfigRequest) -> Result<()> {
        self.record("modify_push_config");
        let mut state = self.state.lock().unwrap();
        let sub = state
            .subscriptions
            .get_mut(&request.subscription)
            .ok_or_else(|| not_found("subscription", &request.subscription))?;
        sub.push_config = request.push_config.clone();
        Ok(())
    }

    async fn pull(&self, request: &PullRequest) -> Result<PullResponse> {
        self.record("pull");
        if self.fail_pulls.load(Ordering::SeqCst) {
            return Err(Error::Service {
                status: 503,
                message: "pull unavailable".into(),
            });
        }

        if let Some(resp) = self.try_deliver(&request.subscription)? {
            return Ok(resp);
        }
        if request.return_immediately {
            return Ok(PullResponse::default());
        }

        // A publish landing between the check above and this wait is picked
        // up on the retry below.
        let _ = tokio::time::timeout(self.blocking_wait, self.published.notified()).await;
        Ok(self
            .try_deliver(&request.subscription)?
            .unwrap_or_default())
    }

    async fn acknowledge(&self, request: &AcknowledgeRequest) -> Result<()> {
        self.record("acknowledge");
        let mut state = self.state.lock().unwrap();
        if !state.subscriptions.contains_key(&request.subscription) {
            return Err(not_found("subscription", &request.subscription));
        }

        for id in &request.ack_id {
            let issued_here = state.outstanding.get(id) == Some(&request.subscription)
                || state.acked.get(id) == Some(&request.subscription);
            if !issued_here {
                return Err(bad_request(format!(
                    "unknown ack id for {}: {id}",
                    request.subscription
                )));
            }
        }
        for id in &request.ack_id {
            if let Some(sub) = state.outstanding.remove(id) {
                state.acked.insert(id.clone(), sub);
            }
        }
        Ok(())
    }

    async fn modify_ack_deadline(&self, request: &ModifyAckDeadlineRequest) -> Result<()> {
        self.record("modify_ack_deadline");
        {
            let mut state = self.state.lock().unwrap();
            let sub = state
                .subscriptions
                .get_mut(&request.subscription)
                .ok_or_else(|| not_found("subscription", &request.subscription))?;
            if let Some(secs) = request.ack_deadline_seconds {
                sub.ack_deadline_seconds = Some(secs);
            }
        }
        *self.last_deadline.lock().unwrap() = Some(request.clone());
        Ok(())
    }
}
