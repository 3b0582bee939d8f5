//! Subcommand implementations.

pub mod listen;
pub mod publish;
pub mod pull;
pub mod subscriptions;
pub mod topics;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pubsub::config::Config;
use pubsub::{Client, Labels, Message};
use serde::Serialize;

/// Connect a client from the global flags.
pub fn connect(config: &Config) -> Result<Client> {
    Client::from_config(config).context("failed to build client")
}

/// A delivered message as printed by `pull` and `listen`.
#[derive(Serialize)]
pub struct MessageOutput {
    pub subscription: String,
    pub ack_id: Option<String>,
    pub message_id: Option<String>,
    /// Payload as UTF-8 when valid, base64 otherwise.
    pub payload: String,
    pub payload_bytes: usize,
    pub labels: serde_json::Map<String, serde_json::Value>,
}

impl MessageOutput {
    pub fn new(subscription: &str, msg: &Message) -> Self {
        let payload = match std::str::from_utf8(&msg.data) {
            Ok(text) => text.to_string(),
            Err(_) => STANDARD.encode(&msg.data),
        };
        Self {
            subscription: subscription.to_string(),
            ack_id: msg.ack_id().map(|id| id.as_str().to_string()),
            message_id: msg.message_id.clone(),
            payload,
            payload_bytes: msg.data.len(),
            labels: labels_json(&msg.labels),
        }
    }

    /// One-line text rendering.
    pub fn line(&self) -> String {
        let labels = if self.labels.is_empty() {
            String::new()
        } else {
            format!(" {}", serde_json::Value::Object(self.labels.clone()))
        };
        format!(
            "[{}] ack={}: {}{}",
            self.subscription,
            self.ack_id.as_deref().unwrap_or("-"),
            self.payload,
            labels
        )
    }
}

fn labels_json(labels: &Labels) -> serde_json::Map<String, serde_json::Value> {
    labels
        .iter()
        .map(|(k, v)| {
            let value = match v {
                pubsub::LabelValue::Int(n) => serde_json::Value::from(*n),
                pubsub::LabelValue::Str(s) => serde_json::Value::from(s.as_str()),
            };
            (k.clone(), value)
        })
        .collect()
}
