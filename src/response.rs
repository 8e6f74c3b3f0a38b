//! Raw responses handed back by a [`Transport`](crate::Transport).
//!
//! The body is fully buffered, so the decoder can read it as many times as a
//! destination shape needs without holding a connection open.

use http::{HeaderMap, StatusCode};
use std::borrow::Cow;
use std::time::Duration;

/// A response as returned by the transport, before any decoding.
///
/// # Examples
///
/// ```
/// # use fws_client::Response;
/// # use http::{HeaderMap, StatusCode};
/// # use std::time::Duration;
/// let response = Response::new(
///     StatusCode::OK,
///     HeaderMap::new(),
///     br#"{"data":null}"#.to_vec(),
///     Duration::from_millis(100),
///     3,
/// );
///
/// assert!(response.is_success());
/// assert!(response.was_retried());
/// assert_eq!(response.text(), r#"{"data":null}"#);
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// The fully read body; empty for 204 and HEAD.
    pub body: Vec<u8>,
    /// Wall time from the first attempt to the last byte, backoff included.
    pub latency: Duration,
    /// 1 unless the transport retried.
    pub attempts: usize,
}

impl Response {
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Vec<u8>,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            latency,
            attempts,
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// The body as text, with invalid UTF-8 replaced. Used for error logs and
    /// [`Error::DeserializationFailed`](crate::Error::DeserializationFailed).
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// A header value, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}
