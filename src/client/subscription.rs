//! Subscription handle: pull, acknowledgement and listening.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api::wire::{
    AcknowledgeRequest, ModifyAckDeadlineRequest, ModifyPushConfigRequest, PullRequest,
    PushConfig, SubscriptionResource,
};
use crate::api::ResourceApi;
use crate::client::listener::Listener;
use crate::codec;
use crate::config::ListenerConfig;
use crate::error::{Error, Result};
use crate::message::{AckId, Message};
use crate::names;

/// A named, topic-bound source of messages.
///
/// Clones share listener state: across all clones of a handle at most one
/// listener session is open at a time.
#[derive(Clone)]
pub struct Subscription {
    project: Arc<str>,
    name: String,
    full_name: Arc<str>,
    api: Arc<dyn ResourceApi>,
    listening: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new(project: Arc<str>, name: String, api: Arc<dyn ResourceApi>) -> Self {
        let full_name = names::full_subscription_name(&project, &name).into();
        Self {
            project,
            name,
            full_name,
            api,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full resource name, `/subscriptions/{project}/{name}`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Create the subscription bound to `topic` (a short name in the same
    /// project).
    ///
    /// A zero `ack_deadline` leaves the service default in place. A push
    /// endpoint turns the subscription into a push subscription.
    #[tracing::instrument(skip(self), fields(subscription = %self.full_name))]
    pub async fn create(
        &self,
        topic: &str,
        ack_deadline: Duration,
        push_endpoint: Option<&str>,
    ) -> Result<()> {
        names::validate("subscription", &self.name)?;
        names::validate("topic", topic)?;

        self.api
            .create_subscription(&SubscriptionResource {
                name: self.full_name.to_string(),
                topic: names::full_topic_name(&self.project, topic),
                ack_deadline_seconds: deadline_seconds(ack_deadline),
                push_config: push_config(push_endpoint),
            })
            .await?;
        tracing::debug!("Subscription created");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(subscription = %self.full_name))]
    pub async fn delete(&self) -> Result<()> {
        names::validate("subscription", &self.name)?;
        self.api.delete_subscription(&self.full_name).await
    }

    /// Whether the subscription exists on the service.
    pub async fn exists(&self) -> Result<bool> {
        names::validate("subscription", &self.name)?;
        Ok(self.api.get_subscription(&self.full_name).await?.is_some())
    }

    /// Change the push endpoint. `None` (or an empty string) switches the
    /// subscription back to pull delivery.
    #[tracing::instrument(skip(self), fields(subscription = %self.full_name))]
    pub async fn modify_push_endpoint(&self, endpoint: Option<&str>) -> Result<()> {
        names::validate("subscription", &self.name)?;
        self.api
            .modify_push_config(&ModifyPushConfigRequest {
                subscription: self.full_name.to_string(),
                push_config: push_config(endpoint),
            })
            .await
    }

    /// Pull at most one message.
    ///
    /// Returns `Ok(None)` when nothing was ready. With `return_immediately`
    /// unset the service may hold the request open while it waits.
    #[tracing::instrument(skip(self), fields(subscription = %self.full_name))]
    pub async fn pull(&self, return_immediately: bool) -> Result<Option<Message>> {
        names::validate("subscription", &self.name)?;

        let response = self
            .api
            .pull(&PullRequest {
                subscription: self.full_name.to_string(),
                return_immediately,
            })
            .await?;

        let (ack_id, wire) = match (
            response.ack_id,
            response.pubsub_event.and_then(|e| e.message),
        ) {
            (Some(ack_id), Some(wire)) => (ack_id, wire),
            (None, None) => return Ok(None),
            (None, Some(_)) => return Err(Error::decode("pulled message without ack id")),
            (Some(_), None) => return Err(Error::decode("ack id without message")),
        };

        let (data, labels) = codec::decode(&wire)?;
        tracing::trace!(ack_id = %ack_id, bytes = data.len(), "Message pulled");

        Ok(Some(Message::delivered(
            data,
            labels,
            wire.message_id,
            AckId::new(self.full_name.clone(), ack_id),
        )))
    }

    /// Wrap a raw acknowledgement identifier issued by this subscription.
    pub fn ack_id(&self, raw: impl Into<String>) -> AckId {
        AckId::new(self.full_name.clone(), raw.into())
    }

    /// Acknowledge a batch of deliveries in one request.
    ///
    /// Every id must have been issued by this subscription. Failure of any
    /// id fails the whole batch. An empty batch makes no request.
    #[tracing::instrument(skip(self, ack_ids), fields(subscription = %self.full_name))]
    pub async fn ack<'a, I>(&self, ack_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a AckId>,
    {
        names::validate("subscription", &self.name)?;

        let mut ids = Vec::new();
        for ack_id in ack_ids {
            if ack_id.subscription() != &*self.full_name {
                return Err(Error::validation(format!(
                    "ack id {ack_id} was issued by {}, not {}",
                    ack_id.subscription(),
                    self.full_name
                )));
            }
            ids.push(ack_id.as_str().to_string());
        }
        if ids.is_empty() {
            return Ok(());
        }

        let count = ids.len();
        self.api
            .acknowledge(&AcknowledgeRequest {
                subscription: self.full_name.to_string(),
                ack_id: ids,
            })
            .await?;
        tracing::debug!(count, "Messages acknowledged");
        Ok(())
    }

    /// Change the acknowledgement deadline of the subscription.
    ///
    /// This applies to every outstanding delivery, not a single message. A
    /// zero duration leaves the current deadline unchanged and sends no
    /// deadline value.
    #[tracing::instrument(skip(self), fields(subscription = %self.full_name))]
    pub async fn modify_ack_deadline(&self, deadline: Duration) -> Result<()> {
        names::validate("subscription", &self.name)?;
        self.api
            .modify_ack_deadline(&ModifyAckDeadlineRequest {
                subscription: self.full_name.to_string(),
                ack_deadline_seconds: deadline_seconds(deadline),
            })
            .await
    }

    /// Start a listener session with default settings.
    pub fn listen(&self) -> Result<Listener> {
        self.listen_with(ListenerConfig::default())
    }

    /// Start a listener session.
    ///
    /// Fails with [`Error::AlreadyListening`] while another session on this
    /// handle is still running. Must be called within a tokio runtime.
    pub fn listen_with(&self, config: ListenerConfig) -> Result<Listener> {
        names::validate("subscription", &self.name)?;
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyListening(self.full_name.to_string()));
        }
        Ok(Listener::spawn(
            self.clone(),
            ListeningSlot(self.listening.clone()),
            config,
        ))
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// Marks a subscription handle as listening until dropped.
pub(crate) struct ListeningSlot(Arc<AtomicBool>);

impl Drop for ListeningSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Whole seconds to send for a deadline, rounding sub-second remainders up.
/// Zero means "no value".
fn deadline_seconds(deadline: Duration) -> Option<i64> {
    if deadline.is_zero() {
        return None;
    }
    let secs = deadline
        .as_secs()
        .saturating_add(u64::from(deadline.subsec_nanos() > 0));
    Some(i64::try_from(secs).unwrap_or(i64::MAX))
}

fn push_config(endpoint: Option<&str>) -> Option<PushConfig> {
    endpoint
        .filter(|e| !e.is_empty())
        .map(|e| PushConfig {
            push_endpoint: e.to_string(),
        })
}
