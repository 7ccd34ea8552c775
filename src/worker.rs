//! Background search worker and its message protocol.
//!
//! The worker owns a [`SearchSession`] and processes requests strictly one at
//! a time on a tokio task. Callers talk to it only through typed messages:
//! `INIT` builds (or rebuilds) the engine, `SEARCH` runs a query. Every
//! failure comes back as an `ERROR` message; the task itself keeps running.

use crate::config::SearchConfig;
use crate::corpus::{SearchData, null_as_default};
use crate::engine::SearchEngine;
use crate::error::{self, InitError, SearchError};
use crate::search::synonyms::SynonymEntries;
use crate::search::{Language, SearchHit, SynonymTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Caller-chosen correlation id, echoed back unchanged.
///
/// Any JSON scalar is accepted so that callers are never forced into a
/// particular id scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(serde_json::Number),
    Text(String),
    Bool(bool),
}

impl RequestId {
    /// Reads `payload.requestId` out of a raw message that may not decode as
    /// a [`Request`].
    pub fn from_raw_message(message: &serde_json::Value) -> Option<Self> {
        let id = message.get("payload")?.get("requestId")?;
        serde_json::from_value(id.clone()).ok()
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self::Number(id.into())
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Inbound messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    Init(InitPayload),
    Search(SearchPayload),
}

impl Request {
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::Init(_) => None,
            Self::Search(payload) => Some(&payload.request_id),
        }
    }

    /// Decode one wire message.
    ///
    /// A message that is valid JSON but not a valid request is answered with
    /// an ERROR that still echoes `payload.requestId` when it can be read.
    pub fn decode(text: &str) -> Result<Self, Response> {
        let message: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Response::error(None, format!("Invalid message: {e}")))?;
        let request_id = RequestId::from_raw_message(&message);

        serde_json::from_value(message)
            .map_err(|e| Response::error(request_id, format!("Invalid message: {e}")))
    }
}

/// Everything but the message shape is decoded while building, so a payload
/// with a malformed field is an initialization error rather than an
/// unreadable message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    #[serde(default)]
    pub search_data: serde_json::Value,
    /// Site language tag such as `en` or `ru`.
    #[serde(default)]
    pub current_lang: serde_json::Value,
    #[serde(default)]
    pub synonyms: serde_json::Value,
    /// Partial [`SearchConfig`]; missing fields take defaults.
    #[serde(default)]
    pub config: serde_json::Value,
}

impl InitPayload {
    pub fn build_engine(self) -> Result<SearchEngine, InitError> {
        let corpus = SearchData::from_value(self.search_data)?;

        let synonyms = if self.synonyms.is_null() {
            SynonymTable::default()
        } else {
            let entries: SynonymEntries = serde_json::from_value(self.synonyms)
                .map_err(|e| InitError::InvalidSynonyms(e.to_string()))?;
            SynonymTable::new(entries)
        };

        let language = match &self.current_lang {
            serde_json::Value::Null => Language::default(),
            serde_json::Value::String(tag) => Language::from_tag(tag),
            other => {
                return Err(InitError::InvalidField {
                    field: "currentLang",
                    message: format!("expected a language tag, got {other}"),
                });
            }
        };

        let config: SearchConfig = if self.config.is_null() {
            SearchConfig::default()
        } else {
            serde_json::from_value(self.config).map_err(|e| InitError::InvalidField {
                field: "config",
                message: e.to_string(),
            })?
        };

        Ok(SearchEngine::build(corpus, language, synonyms, config))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    pub request_id: RequestId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query: String,
}

/// Outbound messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    Ready(ReadyPayload),
    SearchResult(SearchResultPayload),
    Error(ErrorPayload),
}

impl Response {
    pub fn error(request_id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            request_id,
            message: message.into(),
        })
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::Ready(_) => None,
            Self::SearchResult(payload) => Some(&payload.request_id),
            Self::Error(payload) => payload.request_id.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPayload {
    pub available_modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPayload {
    pub request_id: RequestId,
    pub results: Vec<SearchHit>,
    pub highlight_query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// Absent for initialization failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    pub message: String,
}

/// Worker state: Uninitialized until an INIT succeeds, then Ready.
#[derive(Debug, Default)]
pub struct SearchSession {
    engine: Option<SearchEngine>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&SearchEngine> {
        self.engine.as_ref()
    }

    /// Handle one request synchronously. Never fails; errors become
    /// [`Response::Error`].
    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::Init(payload) => self.init(payload),
            Request::Search(payload) => self.search(payload),
        }
    }

    fn init(&mut self, payload: InitPayload) -> Response {
        // Drop the old engine first so a failed rebuild leaves nothing behind.
        self.engine = None;

        match payload.build_engine() {
            Ok(engine) => {
                let available_modules = engine.available_modules().to_vec();
                self.engine = Some(engine);
                Response::Ready(ReadyPayload { available_modules })
            }
            Err(e) => {
                tracing::warn!("Search worker initialization failed: {}", e);
                Response::error(None, format!("Failed to initialize search worker: {e}"))
            }
        }
    }

    fn search(&self, payload: SearchPayload) -> Response {
        let outcome = self
            .engine
            .as_ref()
            .ok_or(SearchError::NotInitialized)
            .and_then(|engine| engine.search(&payload.query));

        match outcome {
            Ok(outcome) => Response::SearchResult(SearchResultPayload {
                request_id: payload.request_id,
                results: outcome.results,
                highlight_query: outcome.highlight_query,
            }),
            Err(e) => {
                tracing::debug!("Search {} failed: {}", payload.request_id, e);
                Response::error(Some(payload.request_id), format!("Worker search failed: {e}"))
            }
        }
    }
}

/// Caller side of a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    requests: Option<mpsc::UnboundedSender<Request>>,
    responses: mpsc::UnboundedReceiver<Response>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Queue a request. Fails once the worker has stopped or the request side
    /// was closed.
    pub fn send(&self, request: Request) -> error::Result<()> {
        let sender = self
            .requests
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("search worker request channel is closed"))?;
        sender
            .send(request)
            .map_err(|_| anyhow::anyhow!("search worker has stopped"))
    }

    /// Another sender for producers running on other tasks.
    pub fn sender(&self) -> Option<mpsc::UnboundedSender<Request>> {
        self.requests.clone()
    }

    /// Next response, or `None` after the worker has stopped and every queued
    /// response was received.
    pub async fn recv(&mut self) -> Option<Response> {
        self.responses.recv().await
    }

    /// Stop accepting requests. Queued requests are still answered, then the
    /// worker exits once all other senders are gone too.
    pub fn close(&mut self) {
        self.requests = None;
    }

    /// Stop the worker without waiting for queued requests.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("Search worker task ended abnormally: {}", e);
        }
    }
}

/// Spawn the search worker as a tokio task.
///
/// Each request runs on the blocking pool so index builds and queries do not
/// stall the runtime; requests are still handled one at a time, in order.
pub fn spawn_search_worker() -> WorkerHandle {
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
    let (response_tx, response_rx) = mpsc::unbounded_channel::<Response>();
    let shutdown = CancellationToken::new();
    let cancelled = shutdown.clone();

    let task = tokio::spawn(async move {
        let mut session = SearchSession::new();

        loop {
            let request = tokio::select! {
                () = cancelled.cancelled() => break,
                request = request_rx.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            let request_id = request.request_id().cloned();
            let handled = tokio::task::spawn_blocking(move || {
                let response = session.handle(request);
                (session, response)
            })
            .await;

            let response = match handled {
                Ok((returned, response)) => {
                    session = returned;
                    response
                }
                Err(e) => {
                    // The session went down with the panicking request.
                    tracing::error!("Search worker request panicked: {}", e);
                    session = SearchSession::new();
                    Response::error(request_id, format!("Worker search failed: {e}"))
                }
            };

            if response_tx.send(response).is_err() {
                tracing::debug!("Response receiver dropped, stopping search worker");
                break;
            }
        }

        tracing::debug!("Search worker stopped");
    });

    WorkerHandle {
        requests: Some(request_tx),
        responses: response_rx,
        shutdown,
        task,
    }
}
