//! Since-id polling of a timeline endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::metrics::METRICS;
use crate::types::{ApiClient, Cursor, Item, Params};

/// Wait between fetches unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Batch {
    Items(Vec<Item>),
    Search { statuses: Vec<Item> },
}

impl From<Batch> for Vec<Item> {
    fn from(batch: Batch) -> Self {
        match batch {
            Batch::Items(items) | Batch::Search { statuses: items } => items,
        }
    }
}

/// Hands every item newer than `previous` to `on_item`, in batch order, and
/// returns the next cursor.
///
/// Items are compared against `previous`, not against ids seen earlier in the
/// same batch, so an unordered batch still dispatches every new item.
pub fn dispatch<F>(previous: Cursor, batch: &[Item], on_item: &mut F) -> Cursor
where
    F: FnMut(&Item),
{
    for item in batch.iter().filter(|item| item.id > previous.id()) {
        on_item(item);
    }
    previous.advance(batch)
}

/// Repeatedly fetches an endpoint for items newer than a cursor.
pub struct Poller<C> {
    client: Arc<C>,
    endpoint: String,
    params: Params,
    interval: Duration,
}

impl<C: ApiClient> Poller<C> {
    pub fn new(client: Arc<C>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            params: Vec::new(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Extra parameters sent with every fetch alongside `since_id`.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetches once since `cursor` and dispatches the new items.
    pub async fn poll_once<F>(&self, cursor: Cursor, on_item: &mut F) -> Result<Cursor>
    where
        F: FnMut(&Item),
    {
        let mut params = self.params.clone();
        params.push(("since_id".to_string(), cursor.id().to_string()));

        let value = self.client.get(&self.endpoint, &params).await?;
        let batch: Vec<Item> = serde_json::from_value::<Batch>(value)?.into();

        let mut dispatched = 0usize;
        let next = dispatch(cursor, &batch, &mut |item: &Item| {
            dispatched += 1;
            on_item(item);
        });

        debug!(
            endpoint = %self.endpoint,
            since_id = cursor.id(),
            fetched = batch.len(),
            dispatched,
            next_cursor = next.id(),
            "poll complete"
        );
        METRICS.record_poll(&self.endpoint, next.id());
        for _ in 0..dispatched {
            METRICS.inc_items_dispatched("poll");
        }
        Ok(next)
    }

    /// Polls until `cancel` fires, waiting the configured interval between
    /// fetches.
    ///
    /// Returns the last cursor on cancellation. A failed fetch ends the loop
    /// with that error; nothing is retried.
    pub async fn run<F>(&self, since: Cursor, mut on_item: F, cancel: &CancellationToken) -> Result<Cursor>
    where
        F: FnMut(&Item),
    {
        let mut cursor = since;
        info!(endpoint = %self.endpoint, since_id = cursor.id(), "poller started");

        loop {
            cursor = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = self.poll_once(cursor, &mut on_item) => match result {
                    Ok(next) => next,
                    Err(e) => {
                        error!(endpoint = %self.endpoint, error = %e, "poll failed");
                        METRICS.record_error("poller", e.kind());
                        return Err(e);
                    }
                },
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(endpoint = %self.endpoint, cursor = cursor.id(), "poller stopped");
        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[u64]) -> Vec<Item> {
        ids.iter()
            .map(|&id| Item {
                id,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_dispatch_only_newer_items() {
        let mut seen = Vec::new();
        let next = dispatch(Cursor(5), &items(&[3, 7, 2]), &mut |item: &Item| {
            seen.push(item.id)
        });
        assert_eq!(seen, vec![7]);
        assert_eq!(next, Cursor(7));
    }

    #[test]
    fn test_dispatch_unordered_batch_keeps_order() {
        let mut seen = Vec::new();
        let next = dispatch(Cursor(1), &items(&[9, 4, 6]), &mut |item: &Item| {
            seen.push(item.id)
        });
        assert_eq!(seen, vec![9, 4, 6]);
        assert_eq!(next, Cursor(9));
    }

    #[test]
    fn test_dispatch_empty_batch() {
        let mut calls = 0;
        let next = dispatch(Cursor(5), &[], &mut |_: &Item| calls += 1);
        assert_eq!(calls, 0);
        assert_eq!(next, Cursor(5));
    }

    #[test]
    fn test_dispatch_never_moves_backwards() {
        let next = dispatch(Cursor(50), &items(&[10, 20]), &mut |_: &Item| {});
        assert_eq!(next, Cursor(50));
    }

    #[test]
    fn test_batch_shapes() {
        let bare: Vec<Item> = serde_json::from_str::<Batch>(r#"[{"id": 1}, {"id": 2}]"#)
            .unwrap()
            .into();
        assert_eq!(bare.len(), 2);

        let wrapped: Vec<Item> =
            serde_json::from_str::<Batch>(r#"{"statuses": [{"id": 3}], "search_metadata": {}}"#)
                .unwrap()
                .into();
        assert_eq!(wrapped[0].id, 3);
    }
}
