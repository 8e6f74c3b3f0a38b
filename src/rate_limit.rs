//! `Retry-After` handling for throttled or unavailable backends.
//!
//! When the backend answers 429 or 503 with a `Retry-After` header, the
//! transport waits for the time the server asked for instead of its own
//! backoff curve, capped at [`RateLimitConfig::max_wait`].

use http::{HeaderMap, StatusCode};
use std::time::{Duration, SystemTime};

/// Configuration for server-directed retry delays.
///
/// # Examples
///
/// ```
/// use fws_client::rate_limit::RateLimitConfig;
/// use std::time::Duration;
///
/// let config = RateLimitConfig {
///     max_wait: Duration::from_secs(60),
///     ..Default::default()
/// };
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Whether to honor `Retry-After` at all.
    pub enabled: bool,

    /// Upper bound on a server-directed wait. Defaults to 5 minutes.
    pub max_wait: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_wait: Duration::from_secs(300),
        }
    }
}

impl RateLimitConfig {
    /// Creates a configuration that ignores `Retry-After`.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Returns the server-directed delay for a response, if one applies.
    ///
    /// Only 429 and 503 responses are considered.
    pub fn delay(&self, status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::SERVICE_UNAVAILABLE {
            return None;
        }
        parse_retry_after(headers).map(|d| d.min(self.max_wait))
    }
}

/// Parses the Retry-After header.
///
/// Supports both delay-seconds (integer) and HTTP-date formats. A date in the
/// past yields no delay.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get("retry-after")?.to_str().ok()?.trim();

    if let Ok(seconds) = header.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date_time = httpdate::parse_http_date(header).ok()?;
    date_time.duration_since(SystemTime::now()).ok()
}
