//! Pubsub: a client for a topic/subscription publish-subscribe service.
//!
//! Callers create and manage named topics and subscriptions, publish
//! messages to a topic, and consume messages from a subscription either by
//! explicit pull or through a cancellable streaming [`Listener`].
//!
//! # Architecture
//!
//! - **Envelope codec**: base64 payloads plus integer/string labels
//! - **Resource control seam**: every RPC goes through [`api::ResourceApi`];
//!   [`api::HttpApi`] speaks the JSON REST surface, [`api::MemoryApi`] runs
//!   in-process
//! - **Delivery**: single pulls, batched acks, subscription-level deadline
//!   changes
//! - **Listener**: one background task per session, stoppable any number of
//!   times
//!
//! # Modules
//!
//! - [`api`]: Resource control trait, wire types and implementations
//! - [`client`]: Client, topic and subscription handles, listener
//! - [`codec`]: Message envelope encoding
//! - [`config`]: CLI and environment configuration
//! - [`flow`]: Listener backoff policy
//! - [`observability`]: Tracing setup
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use pubsub::{Client, LabelValue, Message};
//!
//! # async fn run() -> pubsub::Result<()> {
//! pubsub::observability::tracing::init_tracing("orders-worker");
//!
//! let client = Client::from_config(&pubsub::config::Config::default())?;
//! let topic = client.topic("orders");
//! topic
//!     .publish(&Message::new("hello").with_label("retry", LabelValue::Int(3)))
//!     .await?;
//!
//! let subscription = client.subscription("orders-worker");
//! let mut listener = subscription.listen()?;
//! while let Some(message) = listener.next().await {
//!     if let Some(ack_id) = message.ack_id() {
//!         subscription.ack([ack_id]).await?;
//!     }
//! }
//! listener.finish().await?;
//! # Ok(())
//! # }
//! ```

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // api::http::HttpApi is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod api;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod flow;
pub mod message;
pub mod names;
pub mod observability;

pub use client::{Client, Listener, StopHandle, Subscription, Topic};
pub use codec::{LabelValue, Labels};
pub use error::{Error, Result};
pub use message::{AckId, Message};

/// OAuth scope granting full access to the publish-subscribe service.
pub const SCOPE_PUBSUB: &str = "https://www.googleapis.com/auth/pubsub";

/// OAuth scope granting access to all cloud platform services.
pub const SCOPE_CLOUD_PLATFORM: &str = "https://www.googleapis.com/auth/cloud-platform";
