//! Listen command implementation.

use anyhow::{Context, Result};
use futures::StreamExt;
use pubsub::config::Config;
use tokio::signal;

use super::{connect, MessageOutput};
use crate::OutputFormat;

pub async fn run(
    config: &Config,
    subscription: &str,
    count: u64,
    auto_ack: bool,
    format: OutputFormat,
) -> Result<()> {
    let sub = connect(config)?.subscription(subscription);
    let mut listener = sub.listen().context("failed to start listener")?;

    // Ctrl+C stops the session; the loop below drains to the end of stream.
    let stop = listener.stop_handle();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });

    if format == OutputFormat::Text {
        eprintln!("Listening on '{}'", sub.full_name());
        eprintln!("Press Ctrl+C to stop...\n");
    }

    let mut received: u64 = 0;
    while let Some(msg) = listener.next().await {
        received += 1;

        let output = MessageOutput::new(sub.full_name(), &msg);
        match format {
            OutputFormat::Text => println!("{}", output.line()),
            OutputFormat::Json => println!("{}", serde_json::to_string(&output)?),
        }

        if auto_ack {
            sub.ack(msg.ack_id()).await.context("ack failed")?;
        }

        // Check count limit
        if count > 0 && received >= count {
            if format == OutputFormat::Text {
                eprintln!("\nReached message limit ({})", count);
            }
            listener.stop();
        }
    }

    if format == OutputFormat::Text {
        eprintln!("\nReceived {} message(s)", received);
    }

    listener.finish().await.context("listener stopped on error")
}
