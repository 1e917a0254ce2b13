//! notify-send — send one notification using the channels in `notify.json`.
//!
//! Examples:
//! - `notify-send text "BTC crossed 70k"`
//! - `notify-send email "Subject: fills\n\n3 orders filled"`
//! - `notify-send chat --json '{"equity": 10250.5, "open_orders": 3}' --header "Daily"`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use blankly_notify::email::SmtpMailer;
use blankly_notify::webhook::HttpWebhook;
use blankly_notify::{Dispatcher, FilePreferences, Payload};

// ── CLI ─────────────────────────────────────────────────────────────

/// Send a text, email or chat notification.
#[derive(Parser, Debug)]
#[command(name = "notify-send", version, about)]
struct Cli {
    /// Path to the notification preferences file.
    #[arg(long, env = "BLANKLY_NOTIFY_PATH", default_value = "notify.json")]
    preferences: String,

    /// Network timeout in seconds for SMTP commands and webhook requests.
    #[arg(long, env = "BLANKLY_NOTIFY_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Text the configured phone number through its carrier gateway.
    Text { body: String },
    /// Email the configured receiver.
    Email { body: String },
    /// Post to the configured chat webhook.
    Chat {
        /// Plain text, or JSON when `--json` is given.
        message: String,
        /// Parse the message as JSON and render tables/mappings/lists as a card.
        #[arg(long)]
        json: bool,
        /// Card title (ignored for plain text).
        #[arg(long)]
        header: Option<String>,
    },
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout);

    let dispatcher = Dispatcher::new(
        Arc::new(FilePreferences::new(&cli.preferences)),
        Arc::new(SmtpMailer::new().with_timeout(Some(timeout))),
        Arc::new(HttpWebhook::with_timeout(timeout)?),
    );

    match cli.command {
        Command::Text { body } => {
            dispatcher.send_text(&body).await?;
            info!("text sent");
        }
        Command::Email { body } => {
            dispatcher.send_email(&body).await?;
            info!("email sent");
        }
        Command::Chat {
            message,
            json,
            header,
        } => {
            let payload = if json {
                let value: serde_json::Value =
                    serde_json::from_str(&message).context("--json message is not valid JSON")?;
                Payload::infer(value)
            } else {
                Payload::Text(message)
            };
            let shape = payload.shape();
            dispatcher.send_chat(payload, header.as_deref()).await?;
            info!(shape, "chat message posted");
        }
    }

    Ok(())
}
