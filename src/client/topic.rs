//! Topic handle.

use std::sync::Arc;

use crate::api::wire::{PublishRequest, TopicResource};
use crate::api::ResourceApi;
use crate::codec;
use crate::error::Result;
use crate::message::Message;
use crate::names;

/// A named publish target.
#[derive(Clone)]
pub struct Topic {
    name: String,
    full_name: String,
    api: Arc<dyn ResourceApi>,
}

impl Topic {
    pub(crate) fn new(project: Arc<str>, name: String, api: Arc<dyn ResourceApi>) -> Self {
        let full_name = names::full_topic_name(&project, &name);
        Self {
            name,
            full_name,
            api,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full resource name, `/topics/{project}/{name}`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[tracing::instrument(skip(self), fields(topic = %self.full_name))]
    pub async fn create(&self) -> Result<()> {
        names::validate("topic", &self.name)?;
        self.api
            .create_topic(&TopicResource {
                name: self.full_name.clone(),
            })
            .await?;
        tracing::debug!("Topic created");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(topic = %self.full_name))]
    pub async fn delete(&self) -> Result<()> {
        names::validate("topic", &self.name)?;
        self.api.delete_topic(&self.full_name).await
    }

    /// Whether the topic exists on the service.
    pub async fn exists(&self) -> Result<bool> {
        names::validate("topic", &self.name)?;
        Ok(self.api.get_topic(&self.full_name).await?.is_some())
    }

    /// Publish one message.
    ///
    /// Names and labels are validated before any request is made.
    #[tracing::instrument(skip(self, message), fields(topic = %self.full_name, bytes = message.data.len()))]
    pub async fn publish(&self, message: &Message) -> Result<()> {
        names::validate("topic", &self.name)?;
        let wire = codec::encode(&message.data, &message.labels)?;

        self.api
            .publish(&PublishRequest {
                topic: self.full_name.clone(),
                message: wire,
            })
            .await?;

        tracing::debug!(labels = message.labels.len(), "Message published");
        Ok(())
    }
}

impl std::fmt::Debug for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::api::MemoryApi;
    use crate::{Client, Error, Message};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_exists_delete() {
        let api = Arc::new(MemoryApi::new());
        let client = Client::with_api("proj", api.clone()).unwrap();
        let topic = client.topic("orders");

        assert!(!topic.exists().await.unwrap());
        topic.create().await.unwrap();
        assert!(topic.exists().await.unwrap());
        topic.delete().await.unwrap();
        assert!(!topic.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_publish_validation_makes_no_call() {
        let api = Arc::new(MemoryApi::new());
        let client = Client::with_api("proj", api.clone()).unwrap();

        let err = client
            .topic("orders")
            .publish(&Message::new("x").with_label("", 1i64))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = client
            .topic("")
            .publish(&Message::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_publish_to_missing_topic_surfaces_service_error() {
        let client = Client::new("proj", MemoryApi::new()).unwrap();
        let err = client
            .topic("missing")
            .publish(&Message::new("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
