//! A bot that searches for a term, then keeps replying to new mentions.
//!
//! This example demonstrates:
//! - Loading a `BotConfig` from TOML
//! - Running a filtered search
//! - Polling the mentions timeline until Ctrl-C
//!
//! To run this example (set `silent = true` in the config to dry-run):
//! ```sh
//! cargo run --example search_bot --features logging -- bot.toml rust
//! ```

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use twitbot::{BotConfig, BotError, Cursor, Item, Result, Twitbot};

#[tokio::main]
async fn main() -> Result<()> {
    twitbot::logging::init("twitbot=info")?;

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| BotError::config_error("usage: search_bot <config.toml> [term]"))?;
    let term = args.next().unwrap_or_else(|| "rustlang".to_string());

    let config = BotConfig::from_file(&path)?;
    let bot = Twitbot::connect(&config)?;

    for tweet in bot.search(&term).await? {
        info!(id = tweet.id, author = tweet.author(), "found: {}", tweet.text);
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let (tx, mut mentions) = mpsc::unbounded_channel::<Item>();
    let poller = bot.poller("statuses/mentions_timeline");
    let poll_cancel = cancel.clone();
    let polling = tokio::spawn(async move {
        poller
            .run(
                Cursor::START,
                |mention: &Item| {
                    let _ = tx.send(mention.clone());
                },
                &poll_cancel,
            )
            .await
    });

    while let Some(mention) = mentions.recv().await {
        if let Err(e) = bot.reply(&mention, "thanks for the mention :wave:").await {
            error!(id = mention.id, error = %e, "reply failed");
        }
    }

    let cursor = polling
        .await
        .map_err(|e| BotError::config_error_with_source("poller task failed", e))??;
    info!(cursor = cursor.id(), "shutting down");
    Ok(())
}
