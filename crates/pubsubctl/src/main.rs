//! pubsubctl: Command-line interface for the pubsub client.
//!
//! Provides commands for managing topics and subscriptions, publishing
//! messages, pulling and acknowledging them, and listening to a
//! subscription from the terminal.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pubsub::config::Config;

/// Command-line interface for the pubsub client.
#[derive(Parser)]
#[command(name = "pubsubctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Manage topics
    Topics {
        #[command(subcommand)]
        action: TopicsAction,
    },
    /// Manage subscriptions
    Subscriptions {
        #[command(subcommand)]
        action: SubscriptionsAction,
    },
    /// Publish a message to a topic
    Publish {
        /// Topic name
        topic: String,
        /// Message payload (or use --file)
        payload: Option<String>,
        /// Read payload from file
        #[arg(short, long)]
        file: Option<String>,
        /// Label as key=value; integer values are sent as numeric labels
        #[arg(short, long = "label")]
        labels: Vec<String>,
    },
    /// Pull a single message from a subscription
    Pull {
        /// Subscription name
        subscription: String,
        /// Return at once when no message is ready
        #[arg(long)]
        immediate: bool,
        /// Acknowledge the message after printing it
        #[arg(long)]
        ack: bool,
    },
    /// Acknowledge deliveries by ack id
    Ack {
        /// Subscription name
        subscription: String,
        /// Ack ids to acknowledge in one batch
        #[arg(required = true)]
        ack_ids: Vec<String>,
    },
    /// Change the ack deadline of a subscription (0 keeps the current one)
    ModifyDeadline {
        /// Subscription name
        subscription: String,
        /// Deadline in seconds
        seconds: u64,
    },
    /// Listen to a subscription and print messages
    Listen {
        /// Subscription name
        subscription: String,
        /// Maximum number of messages to receive (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        count: u64,
        /// Acknowledge each message after printing it
        #[arg(long)]
        auto_ack: bool,
    },
}

#[derive(Subcommand)]
enum TopicsAction {
    /// Create a topic
    Create { name: String },
    /// Delete a topic
    Delete { name: String },
    /// Check whether a topic exists
    Exists { name: String },
}

#[derive(Subcommand)]
enum SubscriptionsAction {
    /// Create a subscription bound to a topic
    Create {
        name: String,
        /// Topic the subscription receives from
        #[arg(short, long)]
        topic: String,
        /// Ack deadline in seconds (0 = service default)
        #[arg(long, default_value = "0")]
        ack_deadline: u64,
        /// Push endpoint; omit for pull delivery
        #[arg(long)]
        push_endpoint: Option<String>,
    },
    /// Delete a subscription
    Delete { name: String },
    /// Check whether a subscription exists
    Exists { name: String },
    /// Change or clear the push endpoint
    ModifyPush {
        name: String,
        /// New push endpoint; omit to switch to pull delivery
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let format = cli.output;

    match cli.command {
        Commands::Topics { action } => match action {
            TopicsAction::Create { name } => {
                commands::topics::create(&cli.config, &name, format).await?
            }
            TopicsAction::Delete { name } => {
                commands::topics::delete(&cli.config, &name, format).await?
            }
            TopicsAction::Exists { name } => {
                commands::topics::exists(&cli.config, &name, format).await?
            }
        },
        Commands::Subscriptions { action } => match action {
            SubscriptionsAction::Create {
                name,
                topic,
                ack_deadline,
                push_endpoint,
            } => {
                commands::subscriptions::create(
                    &cli.config,
                    &name,
                    &topic,
                    ack_deadline,
                    push_endpoint.as_deref(),
                    format,
                )
                .await?
            }
            SubscriptionsAction::Delete { name } => {
                commands::subscriptions::delete(&cli.config, &name, format).await?
            }
            SubscriptionsAction::Exists { name } => {
                commands::subscriptions::exists(&cli.config, &name, format).await?
            }
            SubscriptionsAction::ModifyPush { name, endpoint } => {
                commands::subscriptions::modify_push(
                    &cli.config,
                    &name,
                    endpoint.as_deref(),
                    format,
                )
                .await?
            }
        },
        Commands::Publish {
            topic,
            payload,
            file,
            labels,
        } => {
            commands::publish::run(&cli.config, &topic, payload, file, &labels, format).await?;
        }
        Commands::Pull {
            subscription,
            immediate,
            ack,
        } => {
            commands::pull::pull(&cli.config, &subscription, immediate, ack, format).await?;
        }
        Commands::Ack {
            subscription,
            ack_ids,
        } => {
            commands::pull::ack(&cli.config, &subscription, &ack_ids, format).await?;
        }
        Commands::ModifyDeadline {
            subscription,
            seconds,
        } => {
            commands::pull::modify_deadline(&cli.config, &subscription, seconds, format).await?;
        }
        Commands::Listen {
            subscription,
            count,
            auto_ack,
        } => {
            commands::listen::run(&cli.config, &subscription, count, auto_ack, format).await?;
        }
    }

    Ok(())
}
