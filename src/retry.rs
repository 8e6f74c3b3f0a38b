//! Retry strategies and predicates used by [`HttpTransport`](crate::HttpTransport).
//!
//! Retrying is entirely a transport concern: the client never repeats a call
//! on its own. Both the backoff curve and the decision to retry are injected,
//! so tests can switch retries off with [`RetryStrategy::None`].

use crate::{Error, Response};
use http::StatusCode;
use rand::Rng;
use std::time::Duration;

/// The backoff curve between attempts.
///
/// Attempts are numbered from 1; the delay for attempt `n` is the wait before
/// attempt `n + 1`.
///
/// # Examples
///
/// ```
/// use fws_client::RetryStrategy;
/// use std::time::Duration;
///
/// // 1s, 2s, 4s, 8s, then give up
/// let standard = RetryStrategy::standard();
/// assert_eq!(standard.delay_for_attempt(3), Some(Duration::from_secs(4)));
///
/// // A fixed pause, for impatient callers
/// let quick = RetryStrategy::Linear {
///     delay: Duration::from_millis(250),
///     max_retries: 2,
/// };
/// assert_eq!(quick.delay_for_attempt(3), None);
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Every attempt is final.
    #[default]
    None,

    /// `initial_delay`, doubled per attempt, never above `max_delay`.
    ExponentialBackoff {
        initial_delay: Duration,
        max_delay: Duration,
        max_retries: usize,
        /// Scale each delay by a random factor in `[0.5, 1.0]`.
        jitter: bool,
    },

    /// The same `delay` before each retry.
    Linear { delay: Duration, max_retries: usize },

    /// Delay chosen by a function of the attempt number; `None` stops.
    Custom {
        delay_fn: fn(attempt: usize) -> Option<Duration>,
    },
}

impl RetryStrategy {
    /// The transport's default curve: 4 retries, doubling from 1s up to 30s.
    pub fn standard() -> Self {
        RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: 4,
            jitter: false,
        }
    }

    /// The wait after `attempt` failed, or `None` once retries are used up.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match *self {
            RetryStrategy::None => None,
            RetryStrategy::Linear { delay, max_retries } => {
                (attempt <= max_retries).then_some(delay)
            }
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                max_retries,
                jitter,
            } => {
                if attempt > max_retries {
                    return None;
                }

                let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                let factor = 1u32.checked_shl(shift).unwrap_or(u32::MAX);
                let delay = initial_delay.saturating_mul(factor).min(max_delay);

                if !jitter {
                    return Some(delay);
                }
                Some(delay.mul_f64(rand::thread_rng().gen_range(0.5..=1.0)))
            }
            RetryStrategy::Custom { delay_fn } => delay_fn(attempt),
        }
    }

    /// How many retries follow the first attempt; unknown for `Custom`.
    pub fn max_retries(&self) -> Option<usize> {
        match *self {
            RetryStrategy::None => Some(0),
            RetryStrategy::ExponentialBackoff { max_retries, .. }
            | RetryStrategy::Linear { max_retries, .. } => Some(max_retries),
            RetryStrategy::Custom { .. } => None,
        }
    }
}

/// The result of a single attempt, as seen by a [`RetryPredicate`].
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    /// The server answered, with any status.
    Response(&'a Response),
    /// The attempt failed before a response arrived.
    Error(&'a Error),
}

impl Outcome<'_> {
    /// Returns the response status, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Outcome::Response(response) => Some(response.status),
            Outcome::Error(_) => None,
        }
    }
}

/// Decides whether an attempt should be repeated.
///
/// # Examples
///
/// ```
/// use fws_client::retry::{Outcome, RetryPredicate};
///
/// struct RetryOnConflict;
///
/// impl RetryPredicate for RetryOnConflict {
///     fn should_retry(&self, outcome: &Outcome<'_>, _attempt: usize) -> bool {
///         outcome.status().map_or(false, |s| s.as_u16() == 409)
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if the attempt should be repeated. `attempt` is 1-indexed.
    fn should_retry(&self, outcome: &Outcome<'_>, attempt: usize) -> bool;
}

/// The default predicate.
///
/// Retries network errors, timeouts, 429, and every 5xx except 501.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, outcome: &Outcome<'_>, attempt: usize) -> bool {
        match outcome.status() {
            None => RetryOnTransportError.should_retry(outcome, attempt),
            Some(status) => {
                status == StatusCode::TOO_MANY_REQUESTS
                    || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
            }
        }
    }
}

/// Retries when no response arrived: network errors and timeouts.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnTransportError;

impl RetryPredicate for RetryOnTransportError {
    fn should_retry(&self, outcome: &Outcome<'_>, _attempt: usize) -> bool {
        matches!(outcome, Outcome::Error(error) if error.is_retryable())
    }
}

/// Retries responses with one of the listed statuses.
///
/// ```
/// use fws_client::retry::RetryOnStatus;
/// use http::StatusCode;
///
/// let throttled = RetryOnStatus::new([StatusCode::TOO_MANY_REQUESTS]);
/// ```
#[derive(Debug, Clone)]
pub struct RetryOnStatus {
    statuses: Vec<StatusCode>,
}

impl RetryOnStatus {
    pub fn new(statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }
}

impl RetryPredicate for RetryOnStatus {
    fn should_retry(&self, outcome: &Outcome<'_>, _attempt: usize) -> bool {
        outcome
            .status()
            .is_some_and(|status| self.statuses.contains(&status))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NeverRetry;

impl RetryPredicate for NeverRetry {
    fn should_retry(&self, _outcome: &Outcome<'_>, _attempt: usize) -> bool {
        false
    }
}

/// Retries when any of the wrapped predicates does.
///
/// # Examples
///
/// ```
/// use fws_client::retry::{AnyOf, RetryOnStatus, RetryOnTransportError};
/// use http::StatusCode;
///
/// let predicate = AnyOf::new(vec![
///     Box::new(RetryOnTransportError),
///     Box::new(RetryOnStatus::new([StatusCode::CONFLICT])),
/// ]);
/// ```
pub struct AnyOf(Vec<Box<dyn RetryPredicate>>);

impl AnyOf {
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self(predicates)
    }
}

impl RetryPredicate for AnyOf {
    fn should_retry(&self, outcome: &Outcome<'_>, attempt: usize) -> bool {
        self.0.iter().any(|p| p.should_retry(outcome, attempt))
    }
}
