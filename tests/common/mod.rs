//! Test utilities and server harness for pubsub tests.
//!
//! Provides:
//! - In-process HTTP service speaking the REST surface, backed by `MemoryApi`
//! - A record of every request body the service received
//! - Client helpers pointed at the running service

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use pubsub::api::{HttpApi, HttpConfig, MemoryApi, NoAuth, RequestSigner, ResourceApi};
use pubsub::{Client, Error};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A request as the service saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
    pub authorization: Option<String>,
}

#[derive(Clone)]
struct StubState {
    api: Arc<MemoryApi>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// In-process service bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub api: Arc<MemoryApi>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start the service.
    pub async fn start() -> Self {
        pubsub::observability::tracing::init_test_tracing();

        let api = Arc::new(MemoryApi::with_blocking_wait(Duration::from_millis(50)));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(dispatch).with_state(StubState {
            api: api.clone(),
            requests: requests.clone(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("no local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("test server failed");
        });

        Self {
            addr,
            api,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Base URL of the REST surface.
    pub fn endpoint(&self) -> String {
        format!("http://{}/v1beta1", self.addr)
    }

    /// Client for `project` talking to this service without credentials.
    pub fn client(&self, project: &str) -> Client {
        self.client_with(project, NoAuth)
    }

    /// Client for `project` signing requests with `signer`.
    pub fn client_with(&self, project: &str, signer: impl RequestSigner) -> Client {
        let api = HttpApi::new(
            HttpConfig {
                endpoint: self.endpoint(),
                request_timeout: Some(Duration::from_secs(5)),
                ..HttpConfig::default()
            },
            signer,
        )
        .expect("failed to build http api");
        Client::new(project, api).expect("failed to build client")
    }

    /// Requests received so far whose path equals `path`.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Stop the service.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(Duration::from_secs(2), &mut self.handle).await;
    }
}

async fn dispatch(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/v1beta1/")
        .unwrap_or(uri.path())
        .to_string();
    let body_value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        body: body_value,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    match route(&state.api, method.as_str(), &path, &body).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(Error::Service { status, message }) => {
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = json!({"error": {"code": status, "message": message}});
            (code, Json(body)).into_response()
        }
        Err(other) => {
            let body = json!({"error": {"code": 400, "message": other.to_string()}});
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
    }
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> pubsub::Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::Service {
        status: 400,
        message: format!("invalid request body: {e}"),
    })
}

fn to_value<T: serde::Serialize>(value: T) -> pubsub::Result<Value> {
    Ok(serde_json::to_value(value).expect("wire types serialize"))
}

fn found<T: serde::Serialize>(value: Option<T>, path: &str) -> pubsub::Result<Value> {
    match value {
        Some(v) => to_value(v),
        None => Err(Error::Service {
            status: 404,
            message: format!("not found: {path}"),
        }),
    }
}

async fn route(api: &MemoryApi, method: &str, path: &str, body: &[u8]) -> pubsub::Result<Value> {
    match (method, path) {
        ("POST", "topics") => to_value(api.create_topic(&parse(body)?).await?),
        ("POST", "topics/publish") => {
            api.publish(&parse(body)?).await?;
            Ok(json!({}))
        }
        ("POST", "subscriptions") => to_value(api.create_subscription(&parse(body)?).await?),
        ("POST", "subscriptions/pull") => to_value(api.pull(&parse(body)?).await?),
        ("POST", "subscriptions/acknowledge") => {
            api.acknowledge(&parse(body)?).await?;
            Ok(json!({}))
        }
        ("POST", "subscriptions/modifyAckDeadline") => {
            api.modify_ack_deadline(&parse(body)?).await?;
            Ok(json!({}))
        }
        ("POST", "subscriptions/modifyPushConfig") => {
            api.modify_push_config(&parse(body)?).await?;
            Ok(json!({}))
        }
        ("GET", p) if p.starts_with("topics/") => {
            found(api.get_topic(&p["topics/".len()..]).await?, p)
        }
        ("DELETE", p) if p.starts_with("topics/") => {
            api.delete_topic(&p["topics/".len()..]).await?;
            Ok(json!({}))
        }
        ("GET", p) if p.starts_with("subscriptions/") => {
            found(api.get_subscription(&p["subscriptions/".len()..]).await?, p)
        }
        ("DELETE", p) if p.starts_with("subscriptions/") => {
            api.delete_subscription(&p["subscriptions/".len()..]).await?;
            Ok(json!({}))
        }
        _ => Err(Error::Service {
            status: 404,
            message: format!("no route for {method} {path}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_starts_and_stops() {
        let server = TestServer::start().await;
        assert!(server.endpoint().starts_with("http://127.0.0.1:"));
        server.shutdown().await;
    }
}
