//! Topic commands.

use anyhow::{Context, Result};
use pubsub::config::Config;
use serde::Serialize;

use super::connect;
use crate::OutputFormat;

#[derive(Serialize)]
struct TopicOutput<'a> {
    topic: &'a str,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
}

fn print(format: OutputFormat, output: &TopicOutput<'_>) -> Result<()> {
    match format {
        OutputFormat::Text => match output.exists {
            Some(true) => println!("Topic '{}' exists", output.topic),
            Some(false) => println!("Topic '{}' does not exist", output.topic),
            None => println!("Topic '{}' {}", output.topic, output.action),
        },
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(output)?),
    }
    Ok(())
}

pub async fn create(config: &Config, name: &str, format: OutputFormat) -> Result<()> {
    let topic = connect(config)?.topic(name);
    topic.create().await.context("create topic failed")?;
    print(
        format,
        &TopicOutput {
            topic: topic.full_name(),
            action: "created",
            exists: None,
        },
    )
}

pub async fn delete(config: &Config, name: &str, format: OutputFormat) -> Result<()> {
    let topic = connect(config)?.topic(name);
    topic.delete().await.context("delete topic failed")?;
    print(
        format,
        &TopicOutput {
            topic: topic.full_name(),
            action: "deleted",
            exists: None,
        },
    )
}

pub async fn exists(config: &Config, name: &str, format: OutputFormat) -> Result<()> {
    let topic = connect(config)?.topic(name);
    let exists = topic.exists().await.context("topic lookup failed")?;
    print(
        format,
        &TopicOutput {
            topic: topic.full_name(),
            action: "checked",
            exists: Some(exists),
        },
    )
}
