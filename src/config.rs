//! Bot configuration loaded from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::rules::{AllowPolicy, Denylist};

/// OAuth 1.0a user-context credentials.
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token_key: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token_key", &self.access_token_key)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Behavioural switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotOptions {
    /// Replace `:shortcode:` markers before posting.
    #[serde(default = "default_emojify")]
    pub emojify: bool,

    /// Skip the network on writes.
    #[serde(default)]
    pub silent: bool,

    /// Only these rule codes are evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,

    /// Every rule except these codes is evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny: Option<Vec<String>>,

    /// Extra words and phrases rejected by the `bl` rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blacklist: Vec<String>,

    /// Start the `bl` list from the standard word list.
    #[serde(default = "default_standard_blacklist")]
    pub standard_blacklist: bool,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_emojify() -> bool {
    true
}

fn default_standard_blacklist() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    600
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            emojify: default_emojify(),
            silent: false,
            allow: None,
            deny: None,
            blacklist: Vec::new(),
            standard_blacklist: default_standard_blacklist(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl BotOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn allow_policy(&self) -> Result<AllowPolicy> {
        match (&self.allow, &self.deny) {
            (Some(_), Some(_)) => Err(BotError::config_error(
                "`allow` and `deny` cannot both be set",
            )),
            (Some(allow), None) => Ok(AllowPolicy::only(allow.iter().cloned())),
            (None, Some(deny)) => Ok(AllowPolicy::all_except(deny.iter().cloned())),
            (None, None) => Ok(AllowPolicy::AllowAll),
        }
    }

    pub fn denylist(&self) -> Denylist {
        let mut list = if self.standard_blacklist {
            Denylist::default()
        } else {
            Denylist::empty()
        };
        list.add_words(&self.blacklist);
        list
    }
}

/// Base URLs of the REST and streaming APIs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiEndpoints {
    #[serde(default = "default_rest_url")]
    pub rest_url: String,

    #[serde(default = "default_stream_url")]
    pub stream_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rest_url() -> String {
    "https://api.twitter.com/1.1".into()
}

fn default_stream_url() -> String {
    "https://stream.twitter.com/1.1".into()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            stream_url: default_stream_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Everything needed to build a [`Twitbot`](crate::bot::Twitbot).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BotConfig {
    /// The bot's own screen name; its tweets are never accepted.
    pub username: String,

    #[serde(default)]
    pub credentials: Credentials,

    #[serde(default)]
    pub options: BotOptions,

    #[serde(default)]
    pub api: ApiEndpoints,
}

impl BotConfig {
    pub fn new(username: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            username: username.into(),
            credentials,
            options: BotOptions::default(),
            api: ApiEndpoints::default(),
        }
    }

    pub fn with_options(mut self, options: BotOptions) -> Self {
        self.options = options;
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            BotError::config_error_with_source(
                format!("Failed to read {}", path.display()),
                e,
            )
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(BotError::config_error("`username` must not be empty"));
        }
        self.options.allow_policy()?;
        Ok(())
    }
}
