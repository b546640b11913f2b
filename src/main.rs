//! Bot API gateway command-line driver
//!
//! Usage:
//!   botgate <method> [json-params]
//!   botgate broadcast <text> <chat_id>...

use anyhow::{Context, Result};
use botgate::models::{ApiResponse, BatchOptions, CallParams, ChatId, OutboundMessage};
use botgate::utils::logging::init_logging;
use botgate::{BotClient, Dispatcher, Settings};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("Failed to load settings")?;
    init_logging(&settings.logging);
    info!("{}", botgate::version_info());

    if !settings.has_token() {
        warn!("BOT_TOKEN is not set; every call will fail with an auth error");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let client = Arc::new(BotClient::new(&settings).context("Failed to create Bot API client")?);

    let output = match args.first().map(String::as_str) {
        None | Some("-h") | Some("--help") => {
            eprintln!("usage: botgate <method> [json-params]");
            eprintln!("       botgate broadcast <text> <chat_id>...");
            return Ok(());
        }
        Some("broadcast") => {
            let text = args.get(1).context("broadcast needs a message text")?;
            let targets: Vec<ChatId> = args[2..].iter().map(|t| ChatId::from(t.as_str())).collect();
            if targets.is_empty() {
                anyhow::bail!("broadcast needs at least one chat id");
            }

            let dispatcher = Dispatcher::new(client);
            let report = dispatcher
                .send_broadcast(&OutboundMessage::text(text.as_str()), &targets, &BatchOptions::default())
                .await;
            serde_json::to_string_pretty(&report)?
        }
        Some(method) => {
            let params = match args.get(1) {
                Some(raw) => {
                    let value = serde_json::from_str(raw).context("Invalid JSON parameters")?;
                    CallParams::from_value(value)?
                }
                None => CallParams::new(),
            };

            let response: ApiResponse = client.execute(method, &params).await.into();
            serde_json::to_string_pretty(&response)?
        }
    };

    println!("{}", output);
    Ok(())
}
