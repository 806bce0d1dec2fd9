use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{BotError, Result};
use crate::filter::SuitabilityFilter;
use crate::metrics::METRICS;
use crate::types::{ApiClient, Item, StreamMessage};

/// Delivers suitable tweets from a filtered stream to a callback.
pub struct StreamConsumer<C> {
    client: Arc<C>,
    filter: Arc<SuitabilityFilter>,
}

impl<C> Clone for StreamConsumer<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            filter: Arc::clone(&self.filter),
        }
    }
}

impl<C: ApiClient> StreamConsumer<C> {
    pub fn new(client: Arc<C>, filter: Arc<SuitabilityFilter>) -> Self {
        Self { client, filter }
    }

    /// Opens a stream tracking `track` and returns once it is established.
    ///
    /// Messages are consumed on a background task: rate-limit notices are
    /// skipped, tweets passing the filter are handed to `on_item` one at a
    /// time. The first stream error is logged and ends the subscription; there
    /// is no reconnect.
    pub async fn subscribe<F>(&self, track: &str, mut on_item: F) -> Result<StreamHandle>
    where
        F: FnMut(Item) + Send + 'static,
    {
        let mut stream = self.client.open_stream(track).await.inspect_err(|e| {
            error!(track, error = %e, "failed to open stream");
            METRICS.record_error("stream", e.kind());
        })?;

        let token = CancellationToken::new();
        let task_token = token.clone();
        let filter = Arc::clone(&self.filter);
        let track = track.to_string();

        info!(track = %track, "stream subscription opened");
        METRICS.stream_opened();

        let task = tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    () = task_token.cancelled() => {
                        info!(track = %track, "stream subscription closed");
                        break;
                    }
                    next = stream.next() => next,
                };

                match next {
                    Some(Ok(StreamMessage::Limit { limit })) => {
                        debug!(track = %track, undelivered = limit.track, "skipping limit notice");
                    }
                    Some(Ok(StreamMessage::Item(item))) => {
                        if filter.accept(&item) {
                            METRICS.inc_items_dispatched("stream");
                            on_item(item);
                        }
                    }
                    Some(Err(e)) => {
                        error!(track = %track, error = %e, "stream error");
                        METRICS.record_error("stream", e.kind());
                        task_token.cancel();
                        break;
                    }
                    None => {
                        info!(track = %track, "stream ended");
                        break;
                    }
                }
            }
            drop(stream);
            METRICS.stream_closed();
        });

        Ok(StreamHandle { token, task })
    }
}

/// Handle to a live subscription returned by [`StreamConsumer::subscribe`].
#[derive(Debug)]
pub struct StreamHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// True once the consuming task has stopped.
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }

    /// Token that closes the subscription when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Tears the stream down and waits for the consumer to stop.
    pub async fn close(self) -> Result<()> {
        self.token.cancel();
        self.join().await
    }

    /// Waits for the subscription to end on its own.
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| BotError::stream_fault_with_source("stream task failed", e))
    }
}
