//! Error types for backend calls.
//!
//! Every failure a [`Client`](crate::Client) can produce is a variant of
//! [`Error`]. Transport failures, the two sentinel statuses (401 and 404) and
//! backend error documents are kept apart so resource handlers can match on
//! them directly instead of inspecting messages.

use std::fmt;

use http::StatusCode;
use serde::Deserialize;

use crate::response::Response;

/// The main error type for backend calls.
///
/// # Examples
///
/// ```no_run
/// use fws_client::{Client, Error, resources::Server};
/// use http::Method;
///
/// # async fn example(client: Client) -> Result<(), Error> {
/// let request = client.new_request(Method::GET, "servers/srv-1", None)?;
/// let mut server = Server::default();
///
/// match client.execute(request, Some(&mut server)).await {
///     Ok(()) => println!("server: {}", server.name),
///     Err(Error::ResourceNotFound) => println!("server is gone"),
///     Err(Error::Api { errors, .. }) => {
///         for e in errors {
///             eprintln!("backend rejected the call: {}", e.title);
///         }
///     }
///     Err(e) => return Err(e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection failed, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The transport gave up after exhausting its retry budget.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// The number of attempts made
        attempts: usize,
        /// The last error encountered
        last_error: Box<Error>,
    },

    /// The backend answered 401.
    #[error("unauthorized")]
    Unauthorized,

    /// The backend answered 404.
    #[error("resource not found")]
    ResourceNotFound,

    /// The backend answered with any other non-2xx status.
    ///
    /// `errors` holds the entries of the JSON:API errors document in document
    /// order. It is empty when the body was not such a document, in which case
    /// the error displays the HTTP status line.
    #[error("{}", join_api_errors(.status, .errors))]
    Api {
        /// The HTTP status code
        status: StatusCode,
        /// The decoded error objects
        errors: Vec<ApiError>,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The request body is not a record or a sequence of records.
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// Failed to serialize the request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// Invalid configuration was provided (hostname, token, header values).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request path could not be resolved against the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Writing the response body into a raw sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for transport failures worth another attempt.
    ///
    /// Network errors and timeouts are retryable. Classified HTTP errors
    /// are decided on their status by the retry predicate instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout)
    }

    /// Returns `true` if the backend reported the resource as missing.
    ///
    /// Resource handlers use this to drop their local record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ResourceNotFound)
    }

    /// Returns `true` if the error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Timeout | Error::MaxRetriesExceeded { .. }
        )
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Error::ResourceNotFound => Some(StatusCode::NOT_FOUND),
            Error::Api { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body for decode failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the backend's error objects, if any were decoded.
    pub fn api_errors(&self) -> &[ApiError] {
        match self {
            Error::Api { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// A single entry of a JSON:API errors document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    /// Short, human-readable summary.
    #[serde(default)]
    pub title: String,
    /// Longer explanation, if the backend sent one.
    #[serde(default)]
    pub detail: Option<String>,
    /// Application-specific error code.
    #[serde(default)]
    pub code: Option<String>,
    /// The HTTP status the backend associates with this entry.
    #[serde(default)]
    pub status: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail.as_deref() {
            Some(detail) if !detail.is_empty() => write!(f, "{}\n\n{}", self.title, detail),
            _ => f.write_str(&self.title),
        }
    }
}

fn join_api_errors(status: &StatusCode, errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return status.to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Deserialize)]
struct ErrorsDocument {
    #[serde(default)]
    errors: Vec<ApiError>,
}

/// Maps a non-2xx response onto the error taxonomy.
///
/// 401 and 404 become sentinels without looking at the body. Anything else is
/// read as a JSON:API errors document; a body that does not decode (or lists
/// no errors) yields an [`Error::Api`] with no entries.
pub(crate) fn classify(response: &Response) -> Error {
    let status = response.status;

    match status {
        StatusCode::UNAUTHORIZED => return Error::Unauthorized,
        StatusCode::NOT_FOUND => return Error::ResourceNotFound,
        _ => {}
    }

    let errors = serde_json::from_slice::<ErrorsDocument>(&response.body)
        .map(|doc| doc.errors)
        .unwrap_or_default();

    if status.is_client_error() {
        tracing::error!(
            status = status.as_u16(),
            errors = errors.len(),
            response = %response.text(),
            "Client error (4xx)"
        );
    } else {
        tracing::warn!(
            status = status.as_u16(),
            errors = errors.len(),
            response = %response.text(),
            "Server error"
        );
    }

    Error::Api { status, errors }
}

/// A specialized `Result` type for backend calls.
pub type Result<T> = std::result::Result<T, Error>;
