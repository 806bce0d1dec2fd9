use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error};

use crate::error::Result;
use crate::filter::SuitabilityFilter;
use crate::metrics::METRICS;
use crate::types::{ApiClient, Item, Params};

/// Most results a single search returns.
pub const SEARCH_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    statuses: Vec<Item>,
}

/// One-shot recent search, filtered for suitability.
pub struct SearchClient<C> {
    client: Arc<C>,
    filter: Arc<SuitabilityFilter>,
}

impl<C> Clone for SearchClient<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            filter: Arc::clone(&self.filter),
        }
    }
}

impl<C: ApiClient> SearchClient<C> {
    pub fn new(client: Arc<C>, filter: Arc<SuitabilityFilter>) -> Self {
        Self { client, filter }
    }

    pub(crate) fn params(term: &str) -> Params {
        vec![
            ("lang".to_string(), "en".to_string()),
            ("q".to_string(), term.to_string()),
            ("result_type".to_string(), "recent".to_string()),
            ("count".to_string(), SEARCH_LIMIT.to_string()),
        ]
    }

    /// Searches recent English tweets for `term` and keeps the suitable ones.
    pub async fn search(&self, term: &str) -> Result<Vec<Item>> {
        let value = self
            .client
            .get("search/tweets", &Self::params(term))
            .await
            .inspect_err(|e| {
                error!(term, error = %e, "search failed");
                METRICS.record_error("search", e.kind());
            })?;
        let response: SearchResponse = serde_json::from_value(value)?;
        let fetched = response.statuses.len();

        let accepted: Vec<Item> = response
            .statuses
            .into_iter()
            .take(SEARCH_LIMIT)
            .filter(|item| self.filter.accept(item))
            .collect();

        debug!(term, fetched, accepted = accepted.len(), "search complete");
        for _ in &accepted {
            METRICS.inc_items_dispatched("search");
        }
        Ok(accepted)
    }
}
