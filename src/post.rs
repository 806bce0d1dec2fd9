use std::sync::Arc;

use tracing::{error, info};

use crate::emoji::emojify;
use crate::error::Result;
use crate::metrics::METRICS;
use crate::types::{ApiClient, Item, Params};

/// Outcome of [`PostClient::tweet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Posted {
    /// The tweet the API created.
    Sent(Item),
    /// Silent mode: nothing was sent; holds the text that would have been.
    Silent(String),
}

impl Posted {
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Sent(item) => &item.text,
            Self::Silent(text) => text,
        }
    }
}

/// Writes tweets, replies, retweets and profile updates.
pub struct PostClient<C> {
    client: Arc<C>,
    emojify: bool,
    silent: bool,
}

impl<C> Clone for PostClient<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            emojify: self.emojify,
            silent: self.silent,
        }
    }
}

impl<C: ApiClient> PostClient<C> {
    pub fn new(client: Arc<C>, emojify: bool, silent: bool) -> Self {
        Self {
            client,
            emojify,
            silent,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    fn prepare(&self, text: &str) -> String {
        if self.emojify {
            emojify(text).into_owned()
        } else {
            text.to_string()
        }
    }

    async fn send(&self, kind: &str, endpoint: &str, params: &Params) -> Result<serde_json::Value> {
        METRICS.inc_posts(kind, false);
        self.client.post(endpoint, params).await.inspect_err(|e| {
            error!(kind, endpoint, error = %e, "post failed");
            METRICS.record_error("post", e.kind());
        })
    }

    /// Posts `text` as a new tweet. In silent mode nothing is sent.
    pub async fn tweet(&self, text: &str) -> Result<Posted> {
        let status = self.prepare(text);
        if self.silent {
            info!(status = %status, "silent mode, tweet not sent");
            METRICS.inc_posts("tweet", true);
            return Ok(Posted::Silent(status));
        }

        let params: Params = vec![("status".to_string(), status)];
        let value = self.send("tweet", "statuses/update", &params).await?;
        let item: Item = serde_json::from_value(value)?;
        info!(tweet_id = item.id, "tweet sent");
        Ok(Posted::Sent(item))
    }

    /// Replies to `item`, mentioning its author.
    pub async fn reply(&self, item: &Item, text: &str) -> Result<()> {
        let status = format!("@{} {}", item.author(), self.prepare(text));
        if self.silent {
            info!(in_reply_to = item.id, status = %status, "silent mode, reply not sent");
            METRICS.inc_posts("reply", true);
            return Ok(());
        }

        let params: Params = vec![
            ("status".to_string(), status),
            ("in_reply_to_status_id".to_string(), item.id.to_string()),
        ];
        self.send("reply", "statuses/update", &params).await?;
        info!(in_reply_to = item.id, "reply sent");
        Ok(())
    }

    pub async fn retweet(&self, item: &Item) -> Result<()> {
        if self.silent {
            info!(tweet_id = item.id, "silent mode, retweet not sent");
            METRICS.inc_posts("retweet", true);
            return Ok(());
        }

        let endpoint = format!("statuses/retweet/{}", item.id);
        self.send("retweet", &endpoint, &Vec::new()).await?;
        info!(tweet_id = item.id, "retweeted");
        Ok(())
    }

    /// Replaces the profile description. Not affected by silent mode.
    pub async fn update_profile(&self, description: &str) -> Result<serde_json::Value> {
        let params: Params = vec![("description".to_string(), description.to_string())];
        self.send("profile", "account/update_profile", &params).await
    }
}
