use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::TwitterClient;
use crate::config::{BotConfig, BotOptions};
use crate::error::Result;
use crate::filter::SuitabilityFilter;
use crate::poller::Poller;
use crate::post::{PostClient, Posted};
use crate::rules::RuleSet;
use crate::search::SearchClient;
use crate::stream::{StreamConsumer, StreamHandle};
use crate::types::{ApiClient, Cursor, Item};

/// A bot bound to one account.
///
/// The filter is built once from the configuration and shared by the stream
/// and search paths. Each operation is independent; only a running poller
/// carries state, and it owns its cursor.
pub struct Twitbot<C> {
    name: String,
    options: BotOptions,
    client: Arc<C>,
    filter: Arc<SuitabilityFilter>,
}

impl Twitbot<TwitterClient> {
    /// Builds a bot talking to the live API.
    pub fn connect(config: &BotConfig) -> Result<Self> {
        let client = TwitterClient::new(config)?;
        Self::new(config, client)
    }
}

impl<C: ApiClient> Twitbot<C> {
    pub fn new(config: &BotConfig, client: C) -> Result<Self> {
        config.validate()?;
        let rules = RuleSet::defaults(&config.username, config.options.denylist())
            .with_policy(config.options.allow_policy()?)?;
        Ok(Self::with_rules(config, client, rules))
    }

    /// Like [`Twitbot::new`] but with a caller-supplied rule set.
    pub fn with_rules(config: &BotConfig, client: C, rules: RuleSet) -> Self {
        Self {
            name: config.username.clone(),
            options: config.options.clone(),
            client: Arc::new(client),
            filter: Arc::new(SuitabilityFilter::new(rules)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &BotOptions {
        &self.options
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn filter(&self) -> &SuitabilityFilter {
        &self.filter
    }

    pub fn is_tweet_suitable(&self, item: &Item) -> bool {
        self.filter.accept(item)
    }

    pub fn stream_consumer(&self) -> StreamConsumer<C> {
        StreamConsumer::new(Arc::clone(&self.client), Arc::clone(&self.filter))
    }

    pub fn search_client(&self) -> SearchClient<C> {
        SearchClient::new(Arc::clone(&self.client), Arc::clone(&self.filter))
    }

    pub fn post_client(&self) -> PostClient<C> {
        PostClient::new(
            Arc::clone(&self.client),
            self.options.emojify,
            self.options.silent,
        )
    }

    /// A poller for `endpoint` using the configured interval.
    pub fn poller(&self, endpoint: impl Into<String>) -> Poller<C> {
        Poller::new(Arc::clone(&self.client), endpoint).with_interval(self.options.poll_interval())
    }

    pub async fn stream<F>(&self, track: &str, on_item: F) -> Result<StreamHandle>
    where
        F: FnMut(Item) + Send + 'static,
    {
        self.stream_consumer().subscribe(track, on_item).await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Item>> {
        self.search_client().search(term).await
    }

    /// Polls `endpoint` from `since` until `cancel` fires.
    pub async fn poll<F>(
        &self,
        endpoint: &str,
        since: Cursor,
        on_item: F,
        cancel: &CancellationToken,
    ) -> Result<Cursor>
    where
        F: FnMut(&Item),
    {
        self.poller(endpoint).run(since, on_item, cancel).await
    }

    pub async fn tweet(&self, text: &str) -> Result<Posted> {
        self.post_client().tweet(text).await
    }

    pub async fn reply(&self, item: &Item, text: &str) -> Result<()> {
        self.post_client().reply(item, text).await
    }

    pub async fn retweet(&self, item: &Item) -> Result<()> {
        self.post_client().retweet(item).await
    }

    pub async fn profile(&self, description: &str) -> Result<serde_json::Value> {
        self.post_client().update_profile(description).await
    }
}
