#![warn(unused_crate_dependencies)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! A small asynchronous framework for Twitter bots.
//!
//! A bot can:
//! - Consume a filtered real-time stream of tweets
//! - Run one-shot searches
//! - Poll an endpoint for tweets newer than a since-id cursor
//! - Post tweets, replies and retweets, and update its profile
//!
//! # Architecture
//!
//! Every incoming tweet passes through a [`SuitabilityFilter`](filter::SuitabilityFilter),
//! which evaluates a [`RuleSet`](rules::RuleSet) of short-coded predicates
//! (language, denylist, mentions, links, quotes, retweets, self-authorship).
//! Which rules are active is decided by an [`AllowPolicy`](rules::AllowPolicy).
//!
//! All network access goes through the [`ApiClient`](types::ApiClient) trait;
//! [`TwitterClient`](client::TwitterClient) implements it over HTTP with
//! OAuth 1.0a signing. The [`Twitbot`](bot::Twitbot) facade wires the pieces
//! together from a [`BotConfig`](config::BotConfig).
//!
//! # Example
//!
//! ```rust,no_run
//! use twitbot::{BotConfig, Cursor, Result, Twitbot};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = BotConfig::from_file("bot.toml")?;
//!     let bot = Twitbot::connect(&config)?;
//!
//!     // Print suitable tweets as they arrive
//!     let handle = bot.stream("rust", |tweet| println!("{}", tweet.text)).await?;
//!
//!     // Reply to new mentions until cancelled
//!     let cancel = CancellationToken::new();
//!     let mut mentions = Vec::new();
//!     let cursor = bot
//!         .poll("statuses/mentions_timeline", Cursor::START, |t| mentions.push(t.clone()), &cancel)
//!         .await?;
//!
//!     handle.close().await?;
//!     Ok(())
//! }
//! ```

/// Twitbot facade tying configuration, filter and API operations together
pub mod bot;

/// HTTP client for the REST and streaming APIs
pub mod client;

/// TOML configuration
pub mod config;

/// `:shortcode:` emoji substitution
pub mod emoji;

/// Error types and handling
pub mod error;

/// Suitability filter and decision diagnostics
pub mod filter;

/// Optional `tracing-subscriber` setup
#[cfg(feature = "logging")]
pub mod logging;

/// Prometheus metrics for monitoring
pub mod metrics;

/// OAuth 1.0a request signing
pub mod oauth;

/// Since-id polling loop
pub mod poller;

/// Tweets, replies, retweets and profile updates
pub mod post;

/// Suitability rules and allow policies
pub mod rules;

/// One-shot search
pub mod search;

/// Filtered stream subscriptions
pub mod stream;

/// Core data model and the API client trait
pub mod types;

pub use bot::Twitbot;
pub use config::{BotConfig, BotOptions, Credentials};
pub use error::{BotError, Result};
pub use filter::{FilterDecision, SuitabilityFilter};
pub use post::Posted;
pub use rules::{AllowPolicy, Denylist, Rule, RuleSet};
pub use types::{ApiClient, Cursor, Item};
