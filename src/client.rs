use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use url::Url;

use crate::error::{Error, Result};
use crate::ndjson::process_ndjson;
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, STREAM_BYTES, STREAM_ERRORS,
    STREAM_FRAGMENTS,
};
use crate::types::{ChatChunk, ChatRequest, ErrorBody, Message};

/// Default address of a locally hosted inference server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/";

const CHAT_PATH: &str = "api/chat";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A pull-based sequence of text fragments, in the order the endpoint produced them.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A chat-capable model bound to an endpoint.
///
/// `send` returns the whole reply; `stream` returns it fragment by fragment.  Neither call
/// mutates the history it is given.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// The model this backend generates with.
    fn model(&self) -> &str;

    /// Generate a complete reply for `history`.
    async fn send(&self, history: &[Message]) -> Result<String>;

    /// Generate a reply for `history` as a stream of fragments.
    async fn stream(&self, history: &[Message]) -> Result<FragmentStream>;
}

/// Client for an Ollama-compatible chat endpoint, bound to one model.
#[derive(Debug, Clone)]
pub struct Ollama {
    client: ReqwestClient,
    base_url: Url,
    model: String,
    timeout: Duration,
}

impl Ollama {
    /// Create a new client for `model` at `base_url`.
    ///
    /// No network traffic happens here; connection problems surface on the first request.
    pub fn new(base_url: Url, model: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, model, None)
    }

    /// Create a new client with a custom request timeout.
    pub fn with_options(
        base_url: Url,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            model: model.into(),
            timeout,
        })
    }

    fn chat_url(&self) -> Result<Url> {
        Ok(self.base_url.join(CHAT_PATH)?)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self, accept: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static(accept));
        headers
    }

    async fn post(&self, request: &ChatRequest, accept: &'static str) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let url = self.chat_url()?;
        let response = self
            .client
            .post(url)
            .headers(self.default_headers(accept))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if !response.status().is_success() {
            return Err(self.process_error_response(response).await);
        }
        Ok(response)
    }

    fn map_request_error(&self, e: reqwest::Error) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(
                format!("Could not reach {}: {e}", self.base_url),
                Some(Box::new(e)),
            )
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(&self, response: Response) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        let status = response.status();

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let message = serde_json::from_str::<ErrorBody>(&error_body)
            .map(|body| body.error)
            .unwrap_or(error_body);

        match status {
            StatusCode::NOT_FOUND => Error::model_not_found(&self.model, message),
            StatusCode::BAD_REQUEST => Error::bad_request(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Error::timeout(message, None)
            }
            _ => Error::api(status.as_u16(), message),
        }
    }
}

#[async_trait::async_trait]
impl ChatBackend for Ollama {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, history: &[Message]) -> Result<String> {
        let start = Instant::now();
        let request = ChatRequest::new(&self.model, history.to_vec());
        let response = self.post(&request, "application/json").await?;

        let chunk = response.json::<ChatChunk>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Some(message) = chunk.error {
            return Err(Error::api(200, message));
        }
        match chunk.message {
            Some(message) => Ok(message.content),
            None => Err(Error::serialization(
                "response did not contain a message",
                None,
            )),
        }
    }

    async fn stream(&self, history: &[Message]) -> Result<FragmentStream> {
        let request = ChatRequest::new_streaming(&self.model, history.to_vec());
        let response = self.post(&request, "application/x-ndjson").await?;

        let bytes = response.bytes_stream().inspect(|chunk| {
            if let Ok(chunk) = chunk {
                STREAM_BYTES.count(chunk.len() as u64);
            }
        });
        let fragments = process_ndjson(bytes).inspect(|fragment| match fragment {
            Ok(_) => STREAM_FRAGMENTS.click(),
            Err(_) => STREAM_ERRORS.click(),
        });
        Ok(Box::pin(fragments))
    }
}
