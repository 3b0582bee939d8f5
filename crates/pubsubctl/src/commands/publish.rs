//! Publish command implementation.

use std::fs;

use anyhow::{anyhow, Context, Result};
use pubsub::config::Config;
use pubsub::{LabelValue, Message};
use serde::Serialize;

use super::connect;
use crate::OutputFormat;

#[derive(Serialize)]
struct PublishOutput {
    topic: String,
    payload_size: usize,
    labels: usize,
}

/// Parse `key=value`; values that parse as i64 become integer labels.
fn parse_label(raw: &str) -> Result<(String, LabelValue)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("label must be key=value: {}", raw))?;
    if key.is_empty() {
        return Err(anyhow!("label key cannot be empty: {}", raw));
    }
    let value = match value.parse::<i64>() {
        Ok(n) => LabelValue::Int(n),
        Err(_) => LabelValue::Str(value.to_string()),
    };
    Ok((key.to_string(), value))
}

pub async fn run(
    config: &Config,
    topic: &str,
    payload: Option<String>,
    file: Option<String>,
    labels: &[String],
    format: OutputFormat,
) -> Result<()> {
    // Determine payload source
    let payload_bytes = match (payload, file) {
        (Some(p), None) => p.into_bytes(),
        (None, Some(f)) => fs::read(&f).with_context(|| format!("failed to read file: {}", f))?,
        (Some(_), Some(_)) => {
            return Err(anyhow!("cannot specify both payload and --file"));
        }
        (None, None) => {
            // Read from stdin
            use std::io::{self, Read};
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read from stdin")?;
            buffer
        }
    };

    let mut message = Message::new(payload_bytes);
    for raw in labels {
        let (key, value) = parse_label(raw)?;
        message = message.with_label(key, value);
    }

    let handle = connect(config)?.topic(topic);
    handle.publish(&message).await.context("publish failed")?;

    let output = PublishOutput {
        topic: handle.full_name().to_string(),
        payload_size: message.data.len(),
        labels: message.labels.len(),
    };

    match format {
        OutputFormat::Text => {
            println!("Published message to '{}'", output.topic);
            println!("  Payload size: {} bytes", output.payload_size);
            println!("  Labels: {}", output.labels);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
