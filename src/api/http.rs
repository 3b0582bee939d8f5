//! JSON-over-HTTP implementation of the resource control API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::auth::RequestSigner;
use super::wire::{
    AcknowledgeRequest, ModifyAckDeadlineRequest, ModifyPushConfigRequest, PublishRequest,
    PullRequest, PullResponse, SubscriptionResource, TopicResource,
};
use super::ResourceApi;
use crate::error::{Error, Result};

/// Base URL of the hosted REST surface.
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/pubsub/v1beta1";

/// Transport settings for [`HttpApi`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL every request path is appended to.
    pub endpoint: String,
    pub user_agent: String,
    /// Per-request timeout. `None` leaves blocking pulls unbounded.
    pub request_timeout: Option<Duration>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: concat!("pubsub-rs/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: None,
        }
    }
}

/// Resource control API over HTTP with JSON bodies.
#[derive(Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base: String,
    signer: Arc<dyn RequestSigner>,
}

impl HttpApi {
    /// Build a client for the configured endpoint.
    pub fn new(config: HttpConfig, signer: impl RequestSigner) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base: config.endpoint.trim_end_matches('/').to_string(),
            signer: Arc::new(signer),
        })
    }

    /// Resolve `path` against the base URL. Full resource names start with
    /// `/`, which is kept, so `topics/` + `/topics/p/t` yields `topics//topics/p/t`.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.signer.sign(self.http.request(method, self.url(path)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Service {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Default,
    {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        read_body(response).await
    }

    async fn get<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Default,
    {
        match self.send(self.request(Method::GET, path)).await {
            Ok(response) => read_body(response).await.map(Some),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}

/// Decode a JSON body. An empty body decodes to `T::default()`.
async fn read_body<T: DeserializeOwned + Default>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    decode_body(&bytes)
}

fn decode_body<T: DeserializeOwned + Default>(bytes: &[u8]) -> Result<T> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| Error::decode(format!("invalid response body: {e}")))
}

/// Pull the human-readable message out of an error body, falling back to
/// the raw text or the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    if let Some(msg) = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/message"))
        .and_then(serde_json::Value::as_str)
    {
        return msg.to_string();
    }
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }
    body.trim().to_string()
}

#[async_trait]
impl ResourceApi for HttpApi {
    async fn create_topic(&self, topic: &TopicResource) -> Result<TopicResource> {
        self.post("topics", topic).await
    }

    async fn get_topic(&self, name: &str) -> Result<Option<TopicResource>> {
        self.get(&format!("topics/{name}")).await
    }

    async fn delete_topic(&self, name: &str) -> Result<()> {
        self.delete(&format!("topics/{name}")).await
    }

    async fn publish(&self, request: &PublishRequest) -> Result<()> {
        let _: serde_json::Value = self.post("topics/publish", request).await?;
        Ok(())
    }

    async fn create_subscription(
        &self,
        subscription: &SubscriptionResource,
    ) -> Result<SubscriptionResource> {
        self.post("subscriptions", subscription).await
    }

    async fn get_subscription(&self, name: &str) -> Result<Option<SubscriptionResource>> {
        self.get(&format!("subscriptions/{name}")).await
    }

    async fn delete_subscription(&self, name: &str) -> Result<()> {
        self.delete(&format!("subscriptions/{name}")).await
    }

    async fn modify_push_config(&self, request: &ModifyPushConfigRequest) -> Result<()> {
        let _: serde_json::Value = self
            .post("subscriptions/modifyPushConfig", request)
            .await?;
        Ok(())
    }

    async fn pull(&self, request: &PullRequest) -> Result<PullResponse> {
        self.post("subscriptions/pull", request).await
    }

    async fn acknowledge(&self, request: &AcknowledgeRequest) -> Result<()> {
        let _: serde_json::Value = self.post("subscriptions/acknowledge", request).await?;
        Ok(())
    }

    async fn modify_ack_deadline(&self, request: &ModifyAckDeadlineRequest) -> Result<()> {
        let _: serde_json::Value = self
            .post("subscriptions/modifyAckDeadline", request)
            .await?;
        Ok(())
    }
}
