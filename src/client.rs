//! HTTP implementation of [`ApiClient`] for the v1.1 REST and streaming APIs.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, Response};
use tracing::{debug, instrument, warn};

use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::oauth::OAuthSigner;
use crate::types::{ApiClient, ItemStream, Params, StreamMessage};

/// Authenticated client for the REST and streaming endpoints.
#[derive(Debug)]
pub struct TwitterClient {
    http: Client,
    stream_http: Client,
    rest_url: String,
    stream_url: String,
    signer: OAuthSigner,
}

impl TwitterClient {
    pub fn new(config: &BotConfig) -> Result<Self> {
        let user_agent = format!("twitbot/{}", env!("CARGO_PKG_VERSION"));
        let timeout = Duration::from_secs(config.api.timeout_secs);

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.clone())
            .build()?;
        // No overall timeout: only connecting is bounded for long-lived streams.
        let stream_http = Client::builder()
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            stream_http,
            rest_url: config.api.rest_url.trim_end_matches('/').to_string(),
            stream_url: config.api.stream_url.trim_end_matches('/').to_string(),
            signer: OAuthSigner::new(&config.credentials),
        })
    }

    fn url(base: &str, endpoint: &str) -> String {
        let endpoint = endpoint.trim_matches('/');
        let endpoint = endpoint.strip_suffix(".json").unwrap_or(endpoint);
        format!("{base}/{endpoint}.json")
    }

    async fn send(&self, method: Method, endpoint: &str, params: &Params) -> Result<serde_json::Value> {
        let url = Self::url(&self.rest_url, endpoint);
        let auth = self.signer.sign(method.as_str(), &url, params)?;

        debug!(%method, endpoint, "Making API request");

        let request = if method == Method::GET {
            self.http.get(&url).query(params)
        } else {
            self.http.request(method, &url).form(params)
        };

        let response = request.header(AUTHORIZATION, auth).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ApiClient for TwitterClient {
    #[instrument(skip(self))]
    async fn open_stream(&self, track: &str) -> Result<ItemStream> {
        let url = Self::url(&self.stream_url, "statuses/filter");
        let params: Params = vec![("track".to_string(), track.to_string())];
        let auth = self.signer.sign("POST", &url, &params)?;

        let response = self
            .stream_http
            .post(&url)
            .header(AUTHORIZATION, auth)
            .form(&params)
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(Box::pin(decode_lines(response.bytes_stream())))
    }

    #[instrument(skip(self, params))]
    async fn get(&self, endpoint: &str, params: &Params) -> Result<serde_json::Value> {
        self.send(Method::GET, endpoint, params).await
    }

    #[instrument(skip(self, params))]
    async fn post(&self, endpoint: &str, params: &Params) -> Result<serde_json::Value> {
        self.send(Method::POST, endpoint, params).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BotError::api(status.as_u16(), api_message(&body)))
}

/// First `errors[].message` of an error body, or the raw body.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("errors")?
                .get(0)?
                .get("message")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Longest stream message buffered while waiting for its newline.
pub(crate) const MAX_LINE_BYTES: usize = 1024 * 1024;

struct LineDecoder<S> {
    chunks: Pin<Box<S>>,
    buffer: Vec<u8>,
    finished: bool,
}

/// Splits a chunked body into newline-delimited JSON messages.
///
/// Keep-alive blank lines and messages that are neither tweets nor limit
/// notices are skipped. A transport error, or a line longer than
/// [`MAX_LINE_BYTES`], is yielded once and ends the stream.
pub(crate) fn decode_lines<S, B, E>(chunks: S) -> impl Stream<Item = Result<StreamMessage>> + Send + 'static
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<BotError> + Send + 'static,
{
    let decoder = LineDecoder {
        chunks: Box::pin(chunks),
        buffer: Vec::new(),
        finished: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        loop {
            if let Some(pos) = decoder.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = decoder.buffer.drain(..=pos).collect();
                if let Some(message) = parse_line(&line) {
                    return Some((Ok(message), decoder));
                }
                continue;
            }

            if decoder.buffer.len() > MAX_LINE_BYTES {
                decoder.finished = true;
                decoder.buffer.clear();
                let error = BotError::stream_fault(format!(
                    "stream message exceeds {MAX_LINE_BYTES} bytes without a newline"
                ));
                return Some((Err(error), decoder));
            }

            if decoder.finished {
                let rest = std::mem::take(&mut decoder.buffer);
                return parse_line(&rest).map(|message| (Ok(message), decoder));
            }

            match decoder.chunks.next().await {
                Some(Ok(chunk)) => decoder.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    decoder.finished = true;
                    decoder.buffer.clear();
                    let error: BotError = e.into();
                    return Some((Err(error), decoder));
                }
                None => decoder.finished = true,
            }
        }
    })
}

fn parse_line(line: &[u8]) -> Option<StreamMessage> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamMessage>(text) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(error = %e, data = %text, "Skipping unrecognised stream message");
            None
        }
    }
}
