//! A model provider for the Google Gemini API.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use itinera_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use mime::Mime;
use reqwest::{Client, StatusCode, header};

pub use config::{GeminiConfig, GeminiConfigBuilder};
use io::{Chunks, Sse};
use response::GeminiResponse;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error type for [`GeminiProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

fn error_kind_for_code(code: Option<u16>) -> ErrorKind {
    match code {
        Some(401 | 403) => ErrorKind::Unauthenticated,
        Some(429) => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::Other,
    }
}

/// Turns a non-success HTTP response into an [`Error`].
fn error_from_status(status: StatusCode, body: &str) -> Error {
    let kind = error_kind_for_code(Some(status.as_u16()));
    let message = match proto::parse_error_body(body)
        .and_then(|error| error.message)
    {
        Some(message) => format!("HTTP {}: {}", status.as_u16(), message),
        None => format!("HTTP {}: request failed", status.as_u16()),
    };
    Error::new(message, kind)
}

/// Gemini model provider.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for GeminiProvider {
    type Error = Error;
    type Response = GeminiResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let gemini_req = proto::create_request(req);
        let resp_fut = self
            .client
            .post(self.config.stream_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(&gemini_req)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Other)
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                debug!("request failed with {status}: {body}");
                return Err(error_from_status(status, &body));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(GeminiResponse::from_sse(sse))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_status() {
        let err = error_from_status(
            StatusCode::FORBIDDEN,
            r#"{"error":{"code":403,"message":"Permission denied.","status":"PERMISSION_DENIED"}}"#,
        );
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert_eq!(err.message(), "HTTP 403: Permission denied.");

        let err = error_from_status(StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(err.message(), "HTTP 429: request failed");

        let err = error_from_status(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
