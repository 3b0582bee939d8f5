//! Subscription commands.

use std::time::Duration;

use anyhow::{Context, Result};
use pubsub::config::Config;
use serde::Serialize;

use super::connect;
use crate::OutputFormat;

#[derive(Serialize)]
struct SubscriptionOutput<'a> {
    subscription: &'a str,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
}

fn print(format: OutputFormat, output: &SubscriptionOutput<'_>) -> Result<()> {
    match format {
        OutputFormat::Text => match output.exists {
            Some(true) => println!("Subscription '{}' exists", output.subscription),
            Some(false) => println!("Subscription '{}' does not exist", output.subscription),
            None => println!("Subscription '{}' {}", output.subscription, output.action),
        },
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(output)?),
    }
    Ok(())
}

pub async fn create(
    config: &Config,
    name: &str,
    topic: &str,
    ack_deadline_secs: u64,
    push_endpoint: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let sub = connect(config)?.subscription(name);
    sub.create(topic, Duration::from_secs(ack_deadline_secs), push_endpoint)
        .await
        .context("create subscription failed")?;
    print(
        format,
        &SubscriptionOutput {
            subscription: sub.full_name(),
            action: "created",
            exists: None,
        },
    )
}

pub async fn delete(config: &Config, name: &str, format: OutputFormat) -> Result<()> {
    let sub = connect(config)?.subscription(name);
    sub.delete().await.context("delete subscription failed")?;
    print(
        format,
        &SubscriptionOutput {
            subscription: sub.full_name(),
            action: "deleted",
            exists: None,
        },
    )
}

pub async fn exists(config: &Config, name: &str, format: OutputFormat) -> Result<()> {
    let sub = connect(config)?.subscription(name);
    let exists = sub.exists().await.context("subscription lookup failed")?;
    print(
        format,
        &SubscriptionOutput {
            subscription: sub.full_name(),
            action: "checked",
            exists: Some(exists),
        },
    )
}

pub async fn modify_push(
    config: &Config,
    name: &str,
    endpoint: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let sub = connect(config)?.subscription(name);
    sub.modify_push_endpoint(endpoint)
        .await
        .context("modify push config failed")?;
    let action = if endpoint.is_some() {
        "switched to push delivery"
    } else {
        "switched to pull delivery"
    };
    print(
        format,
        &SubscriptionOutput {
            subscription: sub.full_name(),
            action,
            exists: None,
        },
    )
}
