//! Sending prepared requests over the network.
//!
//! [`Transport`] is the seam between the client and the wire. The default
//! implementation, [`HttpTransport`], wraps `reqwest` and owns the whole retry
//! policy: backoff curve, retry predicate and `Retry-After` handling.

use crate::{
    rate_limit::RateLimitConfig,
    retry::{Outcome, RetryOnRetryable, RetryPredicate, RetryStrategy},
    Error, Request, Response, Result,
};
use http::{HeaderMap, StatusCode};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sends a prepared [`Request`] and returns the buffered [`Response`].
///
/// Implementations apply their own retry policy; a returned error means the
/// transport has already given up. Any status, including 4xx and 5xx, is a
/// successful send.
pub trait Transport: Send + Sync {
    /// Send the request and return the response.
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

/// A retrying [`Transport`] backed by [`reqwest`].
///
/// # Examples
///
/// ```no_run
/// use fws_client::{HttpTransport, RetryStrategy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), fws_client::Error> {
/// let transport = HttpTransport::builder()
///     .timeout(Duration::from_secs(30))
///     .retry_strategy(RetryStrategy::Linear {
///         delay: Duration::from_millis(500),
///         max_retries: 2,
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    http_client: reqwest::Client,
    retry_strategy: RetryStrategy,
    retry_predicate: Box<dyn RetryPredicate>,
    timeout: Option<Duration>,
    rate_limit_config: RateLimitConfig,
}

impl HttpTransport {
    /// Creates a new `HttpTransportBuilder`.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Executes a single attempt and buffers the body.
    async fn execute_attempt(
        &self,
        request: &Request,
        attempt: usize,
    ) -> Result<(StatusCode, HeaderMap, Vec<u8>)> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            attempt = attempt,
            "Executing HTTP request"
        );

        let mut builder = self
            .inner
            .http_client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok((status, headers, body.to_vec()))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        let http_client = reqwest::Client::builder().build().unwrap_or_default();
        HttpTransportBuilder::new().assemble(http_client)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let start_time = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.execute_attempt(&request, attempt).await {
                Ok((status, headers, body)) => {
                    let response =
                        Response::new(status, headers, body, start_time.elapsed(), attempt);

                    tracing::info!(
                        status = status.as_u16(),
                        latency_ms = response.latency.as_millis(),
                        attempts = attempt,
                        "Received HTTP response"
                    );

                    if !self
                        .inner
                        .retry_predicate
                        .should_retry(&Outcome::Response(&response), attempt)
                    {
                        return Ok(response);
                    }

                    let Some(backoff) = self.inner.retry_strategy.delay_for_attempt(attempt) else {
                        tracing::warn!(
                            status = status.as_u16(),
                            attempts = attempt,
                            "Retries exhausted, returning last response"
                        );
                        return Ok(response);
                    };

                    // Prefer the server's Retry-After over our own curve
                    let delay = match self
                        .inner
                        .rate_limit_config
                        .delay(status, &response.headers)
                    {
                        Some(delay) => {
                            tracing::info!(
                                rate_limit_delay_ms = delay.as_millis(),
                                attempt = attempt,
                                "Rate limited - waiting before retry"
                            );
                            delay
                        }
                        None => backoff,
                    };

                    tracing::info!(
                        delay_ms = delay.as_millis(),
                        attempt = attempt,
                        status = status.as_u16(),
                        "Retrying request after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        attempt = attempt,
                        method = %request.method,
                        url = %request.url,
                        "Request failed"
                    );

                    if !self
                        .inner
                        .retry_predicate
                        .should_retry(&Outcome::Error(&e), attempt)
                    {
                        return Err(e);
                    }

                    match self.inner.retry_strategy.delay_for_attempt(attempt) {
                        Some(delay) => {
                            tracing::info!(
                                delay_ms = delay.as_millis(),
                                attempt = attempt,
                                "Retrying request after delay"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        // Nothing was retried, so there is nothing to wrap
                        None if attempt == 1 => return Err(e),
                        None => {
                            return Err(Error::MaxRetriesExceeded {
                                attempts: attempt,
                                last_error: Box::new(e),
                            });
                        }
                    }
                }
            }
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(err)
    }
}

/// Builder for configuring and creating an [`HttpTransport`].
///
/// Defaults: [`RetryStrategy::standard`], [`RetryOnRetryable`], `Retry-After`
/// honored up to 5 minutes, no per-request timeout.
pub struct HttpTransportBuilder {
    http_client: Option<reqwest::Client>,
    retry_strategy: RetryStrategy,
    retry_predicate: Option<Box<dyn RetryPredicate>>,
    timeout: Option<Duration>,
    rate_limit_config: RateLimitConfig,
}

impl HttpTransportBuilder {
    /// Creates a new `HttpTransportBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            http_client: None,
            retry_strategy: RetryStrategy::standard(),
            retry_predicate: None,
            timeout: None,
            rate_limit_config: RateLimitConfig::default(),
        }
    }

    /// Uses an existing `reqwest::Client` instead of building one.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the backoff curve. [`RetryStrategy::None`] disables retries.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Sets a custom retry predicate.
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(predicate);
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets how `Retry-After` headers are honored.
    pub fn rate_limit_config(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit_config = config;
        self
    }

    /// Builds the configured `HttpTransport`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn build(mut self) -> Result<HttpTransport> {
        let http_client = match self.http_client.take() {
            Some(client) => client,
            None => reqwest::Client::builder().build().map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?,
        };
        Ok(self.assemble(http_client))
    }

    fn assemble(self, http_client: reqwest::Client) -> HttpTransport {
        let retry_predicate = self
            .retry_predicate
            .unwrap_or_else(|| Box::new(RetryOnRetryable));

        HttpTransport {
            inner: Arc::new(TransportInner {
                http_client,
                retry_strategy: self.retry_strategy,
                retry_predicate,
                timeout: self.timeout,
                rate_limit_config: self.rate_limit_config,
            }),
        }
    }
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
