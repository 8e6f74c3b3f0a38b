//! Prepared requests.

use http::{HeaderMap, Method};
use url::Url;

/// Media type used for both `Accept` and `Content-Type`.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// A fully-formed request, ready to hand to a [`Transport`](crate::Transport).
///
/// Built by [`Client::new_request`](crate::Client::new_request); the body, when
/// present, is already encoded.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The target URL, already resolved against the client's base URL.
    pub url: Url,

    /// Authorization and content-negotiation headers.
    pub headers: HeaderMap,

    /// Encoded request body.
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns `true` for methods that carry a body.
    pub(crate) fn is_write(method: &Method) -> bool {
        matches!(
            *method,
            Method::DELETE | Method::PATCH | Method::POST | Method::PUT
        )
    }
}
