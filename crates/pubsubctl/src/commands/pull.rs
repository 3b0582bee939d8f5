//! Pull, ack and deadline commands.

use std::time::Duration;

use anyhow::{Context, Result};
use pubsub::config::Config;
use serde::Serialize;

use super::{connect, MessageOutput};
use crate::OutputFormat;

pub async fn pull(
    config: &Config,
    subscription: &str,
    immediate: bool,
    ack: bool,
    format: OutputFormat,
) -> Result<()> {
    let sub = connect(config)?.subscription(subscription);
    let Some(msg) = sub.pull(immediate).await.context("pull failed")? else {
        match format {
            OutputFormat::Text => eprintln!("No message available"),
            OutputFormat::Json => println!("null"),
        }
        return Ok(());
    };

    let output = MessageOutput::new(sub.full_name(), &msg);
    match format {
        OutputFormat::Text => println!("{}", output.line()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }

    if ack {
        sub.ack(msg.ack_id()).await.context("ack failed")?;
        tracing::debug!(subscription = sub.full_name(), "Message acknowledged");
    }
    Ok(())
}

#[derive(Serialize)]
struct AckOutput<'a> {
    subscription: &'a str,
    acknowledged: usize,
}

pub async fn ack(
    config: &Config,
    subscription: &str,
    ack_ids: &[String],
    format: OutputFormat,
) -> Result<()> {
    let sub = connect(config)?.subscription(subscription);
    let ids: Vec<_> = ack_ids.iter().map(|id| sub.ack_id(id.as_str())).collect();
    sub.ack(&ids).await.context("ack failed")?;

    let output = AckOutput {
        subscription: sub.full_name(),
        acknowledged: ids.len(),
    };
    match format {
        OutputFormat::Text => println!(
            "Acknowledged {} message(s) on '{}'",
            output.acknowledged, output.subscription
        ),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }
    Ok(())
}

#[derive(Serialize)]
struct DeadlineOutput<'a> {
    subscription: &'a str,
    ack_deadline_seconds: Option<u64>,
}

pub async fn modify_deadline(
    config: &Config,
    subscription: &str,
    seconds: u64,
    format: OutputFormat,
) -> Result<()> {
    let sub = connect(config)?.subscription(subscription);
    sub.modify_ack_deadline(Duration::from_secs(seconds))
        .await
        .context("modify ack deadline failed")?;

    let output = DeadlineOutput {
        subscription: sub.full_name(),
        ack_deadline_seconds: (seconds > 0).then_some(seconds),
    };
    match format {
        OutputFormat::Text => match output.ack_deadline_seconds {
            Some(s) => println!("Ack deadline of '{}' set to {}s", output.subscription, s),
            None => println!("Ack deadline of '{}' left unchanged", output.subscription),
        },
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }
    Ok(())
}
