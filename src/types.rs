use std::pin::Pin;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;

use crate::error::Result;

/// The author of an [`Item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct User {
    pub screen_name: String,
}

/// A single tweet, as returned by the REST and streaming endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Item {
    pub id: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub is_quote_status: bool,
    #[serde(default)]
    pub is_quote_tweet: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_status_id: Option<u64>,
}

impl Item {
    pub fn author(&self) -> &str {
        &self.user.screen_name
    }

    pub fn is_quote(&self) -> bool {
        self.is_quote_status || self.is_quote_tweet
    }

    pub fn is_retweet(&self) -> bool {
        self.retweeted_status.is_some()
    }
}

/// Rate-limit notice sent on a filtered stream in place of a tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LimitNotice {
    /// Number of undelivered tweets since the connection was opened.
    #[serde(default)]
    pub track: u64,
}

/// One message read off a filtered stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamMessage {
    Limit { limit: LimitNotice },
    Item(Item),
}

/// A stream of messages produced by [`ApiClient::open_stream`].
pub type ItemStream = Pin<Box<dyn Stream<Item = Result<StreamMessage>> + Send + 'static>>;

/// Query or form parameters for an API call.
pub type Params = Vec<(String, String)>;

/// The operations the bot needs from the remote API.
///
/// [`TwitterClient`](crate::client::TwitterClient) is the HTTP implementation;
/// tests plug in-memory implementations into the same seam.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Opens a filtered real-time stream keyed by `track`.
    async fn open_stream(&self, track: &str) -> Result<ItemStream>;

    /// Authenticated GET against `endpoint` (e.g. `search/tweets`).
    async fn get(&self, endpoint: &str, params: &Params) -> Result<serde_json::Value>;

    /// Authenticated POST against `endpoint` (e.g. `statuses/update`).
    async fn post(&self, endpoint: &str, params: &Params) -> Result<serde_json::Value>;
}

/// The highest tweet id seen by a polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cursor(pub u64);

impl Cursor {
    pub const START: Cursor = Cursor(0);

    pub fn id(self) -> u64 {
        self.0
    }

    /// `max(self, max id in batch)`. An empty batch leaves the cursor unchanged.
    pub fn advance<'a>(self, batch: impl IntoIterator<Item = &'a Item>) -> Cursor {
        batch
            .into_iter()
            .map(|item| Cursor(item.id))
            .fold(self, std::cmp::max)
    }
}

impl From<u64> for Cursor {
    fn from(id: u64) -> Self {
        Cursor(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64) -> Item {
        Item {
            id,
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_status() {
        let json = r#"{
            "id": 1050118621198921728,
            "text": "hello world",
            "lang": "en",
            "user": { "screen_name": "someone", "followers_count": 3 },
            "is_quote_status": false,
            "retweeted_status": { "id": 1 }
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, 1050118621198921728);
        assert_eq!(item.author(), "someone");
        assert_eq!(item.lang.as_deref(), Some("en"));
        assert!(!item.is_quote());
        assert!(item.is_retweet());
    }

    #[test]
    fn test_quote_flag_either_key() {
        let item: Item = serde_json::from_str(r#"{"id": 1, "is_quote_tweet": true}"#).unwrap();
        assert!(item.is_quote());

        let item: Item = serde_json::from_str(
            r#"{"id": 2, "is_quote_status": false, "is_quote_tweet": true}"#,
        )
        .unwrap();
        assert!(item.is_quote());

        let item: Item =
            serde_json::from_str(r#"{"id": 3, "is_quote_status": true, "is_quote_tweet": true}"#)
                .unwrap();
        assert!(item.is_quote());
    }

    #[test]
    fn test_stream_message_variants() {
        let limit: StreamMessage = serde_json::from_str(r#"{"limit": {"track": 12}}"#).unwrap();
        assert_eq!(limit, StreamMessage::Limit {
            limit: LimitNotice { track: 12 }
        });

        let tweet: StreamMessage =
            serde_json::from_str(r#"{"id": 7, "text": "hi", "user": {"screen_name": "a"}}"#)
                .unwrap();
        assert!(matches!(tweet, StreamMessage::Item(item) if item.id == 7));
    }

    #[test]
    fn test_cursor_advance() {
        let batch = vec![item(3), item(7), item(2)];
        assert_eq!(Cursor(5).advance(&batch), Cursor(7));
        assert_eq!(Cursor(9).advance(&batch), Cursor(9));
        assert_eq!(Cursor(4).advance(&Vec::<Item>::new()), Cursor(4));
    }
}
