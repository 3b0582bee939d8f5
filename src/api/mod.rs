//! Resource control API.
//!
//! Every network interaction of the client goes through [`ResourceApi`]:
//! one method per RPC, each a single request/response round trip. The core
//! builds requests from full resource names and never retries.
//!
//! Implementations:
//! - [`HttpApi`]: JSON over HTTP against the REST surface
//! - [`MemoryApi`]: in-process, for tests and offline use

mod auth;
mod http;
mod memory;
pub mod wire;

pub use auth::{BearerToken, NoAuth, RequestSigner};
pub use http::{HttpApi, HttpConfig, DEFAULT_ENDPOINT};
pub use memory::MemoryApi;

use async_trait::async_trait;

use crate::error::Result;
use wire::{
    AcknowledgeRequest, ModifyAckDeadlineRequest, ModifyPushConfigRequest, PublishRequest,
    PullRequest, PullResponse, SubscriptionResource, TopicResource,
};

/// The RPC surface the client calls into.
///
/// Names passed to the `get_*` and `delete_*` methods are full resource
/// names. `get_*` returns `Ok(None)` when the resource does not exist.
#[async_trait]
pub trait ResourceApi: Send + Sync + 'static {
    async fn create_topic(&self, topic: &TopicResource) -> Result<TopicResource>;

    async fn get_topic(&self, name: &str) -> Result<Option<TopicResource>>;

    async fn delete_topic(&self, name: &str) -> Result<()>;

    async fn publish(&self, request: &PublishRequest) -> Result<()>;

    async fn create_subscription(
        &self,
        subscription: &SubscriptionResource,
    ) -> Result<SubscriptionResource>;

    async fn get_subscription(&self, name: &str) -> Result<Option<SubscriptionResource>>;

    async fn delete_subscription(&self, name: &str) -> Result<()>;

    async fn modify_push_config(&self, request: &ModifyPushConfigRequest) -> Result<()>;

    /// Pull at most one message. An empty response means nothing was ready.
    async fn pull(&self, request: &PullRequest) -> Result<PullResponse>;

    /// Acknowledge a batch. Failure of any id fails the whole call.
    async fn acknowledge(&self, request: &AcknowledgeRequest) -> Result<()>;

    async fn modify_ack_deadline(&self, request: &ModifyAckDeadlineRequest) -> Result<()>;
}
