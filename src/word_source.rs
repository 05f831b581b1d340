//! Where secret words come from.
//!
//! The game session never waits on the network. A [`WordRequest`] is handed to a
//! [`WordRequester`]; the production one is [`WordFetcher`], which runs the HTTP
//! call on a tokio runtime and posts the tagged result back into the event loop
//! as a [`GameEvent::WordFetched`].

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use derive_more::{Display, Error};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::game::WordRequest;
use crate::runtime::GameEvent;

pub const DEFAULT_WORD_API_URL: &str = "https://random-word-api.herokuapp.com/word";

/// Why a secret word could not be obtained
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum FetchError {
    #[display("{message}")]
    Transport { message: String },
    #[display("word service answered with status {code}")]
    Status { code: u16 },
    #[display("unexpected response: {message}")]
    Malformed { message: String },
    #[display("word service returned no words")]
    Empty,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        FetchError::Transport { message }
    }
}

/// Decode a word-list body (a JSON array of strings) and take its first entry
pub fn parse_word_list(body: &str) -> Result<String, FetchError> {
    let words: Vec<String> =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed {
            message: e.to_string(),
        })?;

    match words.into_iter().next() {
        Some(word) if !word.trim().is_empty() => Ok(word.trim().to_string()),
        _ => Err(FetchError::Empty),
    }
}

#[async_trait]
pub trait WordSource: Send + Sync {
    async fn fetch_random_word(&self) -> Result<String, FetchError>;
}

/// Fetches words from a random-word HTTP API
#[derive(Debug, Clone)]
pub struct HttpWordSource {
    client: reqwest::Client,
    url: String,
}

impl HttpWordSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WordSource for HttpWordSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_random_word(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_word_list(&body)
    }
}

/// Anything that can take a word request off the game's hands
pub trait WordRequester {
    fn request_word(&self, request: WordRequest);
}

/// Tests and headless drivers can simply collect requests
impl WordRequester for Sender<WordRequest> {
    fn request_word(&self, request: WordRequest) {
        let _ = self.send(request);
    }
}

/// Runs word fetches on a tokio runtime and reports back through the event channel
pub struct WordFetcher {
    handle: Handle,
    source: Arc<dyn WordSource>,
    events: Sender<GameEvent>,
}

impl WordFetcher {
    pub fn new(handle: Handle, source: Arc<dyn WordSource>, events: Sender<GameEvent>) -> Self {
        Self {
            handle,
            source,
            events,
        }
    }

    pub fn spawn(&self, request: WordRequest) -> JoinHandle<()> {
        let source = Arc::clone(&self.source);
        let events = self.events.clone();

        self.handle.spawn(async move {
            let result = source.fetch_random_word().await;
            match &result {
                Ok(word) => debug!(round = %request.round, letters = word.chars().count(), "word fetched"),
                Err(err) => warn!(round = %request.round, error = %err, "word fetch failed"),
            }

            let event = GameEvent::WordFetched {
                round: request.round,
                result,
            };
            if events.send(event).is_err() {
                debug!(round = %request.round, "event loop gone, dropping fetched word");
            }
        })
    }
}

impl WordRequester for WordFetcher {
    fn request_word(&self, request: WordRequest) {
        // No cancellation: a superseded fetch still completes and is discarded by round id
        let _ = self.spawn(request);
    }
}
