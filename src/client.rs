//! Client for the fake web services API.
//!
//! The [`Client`] type builds requests with [`Client::new_request`] and runs
//! them with [`Client::execute`]. Use [`ClientBuilder`] to configure and create
//! clients.

use crate::{
    body::RequestBody,
    config::{ClientConfig, DEFAULT_HOSTNAME},
    decode::Decode,
    error,
    request::JSON_API_MEDIA_TYPE,
    Error, HttpTransport, Request, Result, Transport,
};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// A client for the fake web services API.
///
/// The client is immutable once built and cheap to clone; clones share the
/// same transport. It can be used from many tasks at once.
///
/// # Examples
///
/// ```no_run
/// use fws_client::{Client, resources::{Server, ServerCreateOptions}};
/// use http::Method;
///
/// # async fn example() -> Result<(), fws_client::Error> {
/// let client = Client::new("app.terraform.io", "my-token")?;
///
/// let options = ServerCreateOptions {
///     name: Some("web-1".to_string()),
///     server_type: Some("small".to_string()),
///     ..Default::default()
/// };
/// let request = client.new_request(Method::POST, "servers", Some(&options))?;
///
/// let mut server = Server::default();
/// client.execute(request, Some(&mut server)).await?;
/// println!("Created server with ID: {}", server.id);
/// # Ok(())
/// # }
/// ```
pub struct Client<T = HttpTransport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T> {
    base_url: Url,
    hostname: String,
    authorization: HeaderValue,
    transport: T,
}

impl Client {
    /// Creates a client for `https://<hostname>/api/fake-resources/` using the
    /// default [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the hostname does not form a
    /// valid URL or the token is empty.
    pub fn new(hostname: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::builder().hostname(hostname).token(token).build()
    }

    /// Creates a client from a resolved [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.hostname.clone(), config.token.clone())
    }

    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<T: Transport> Client<T> {
    /// The base URL every request path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The hostname the client was configured with.
    pub fn hostname(&self) -> &str {
        &self.inner.hostname
    }

    /// The transport requests are sent through.
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Builds a request for `path`, relative to the base URL.
    ///
    /// Every request carries the bearer token. GET requests accept
    /// `application/vnd.api+json`; DELETE, PATCH, POST and PUT also send it as
    /// `Content-Type`, whatever encoding the body uses, and encode `body` if
    /// one is given. Other methods never carry a body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `path` cannot be resolved, or the
    /// body's encoding error.
    pub fn new_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&dyn RequestBody>,
    ) -> Result<Request> {
        let url = self.inner.base_url.join(path)?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.inner.authorization.clone());

        let mut encoded = None;
        if method == Method::GET {
            headers.insert(ACCEPT, HeaderValue::from_static(JSON_API_MEDIA_TYPE));
        } else if Request::is_write(&method) {
            headers.insert(ACCEPT, HeaderValue::from_static(JSON_API_MEDIA_TYPE));
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_API_MEDIA_TYPE));

            if let Some(body) = body {
                encoded = Some(body.encode()?);
            }
        }

        tracing::debug!(
            method = %method,
            url = %url,
            body_bytes = encoded.as_ref().map_or(0, Vec::len),
            "Built request"
        );

        Ok(Request {
            method,
            url,
            headers,
            body: encoded,
        })
    }

    /// Sends `request` and decodes the response into `destination`.
    ///
    /// This is the single entry point for talking to the backend. A non-2xx
    /// status is classified into [`Error::Unauthorized`],
    /// [`Error::ResourceNotFound`] or [`Error::Api`] without decoding the body
    /// as a success. On success, what happens depends on `destination`:
    ///
    /// - `None`: nothing is decoded (e.g. for DELETE);
    /// - a [`Payload`](crate::Payload) type: the primary resource;
    /// - a [`Page`](crate::Page): the primary-data array and its pagination;
    /// - a [`RawSink`](crate::RawSink): the raw body bytes.
    ///
    /// Transport errors are returned unchanged; the client never retries.
    pub async fn execute(
        &self,
        request: Request,
        destination: Option<&mut (dyn Decode + Send)>,
    ) -> Result<()> {
        let method = request.method.clone();
        let url = request.url.clone();

        let response = self.inner.transport.send(request).await?;

        if !response.is_success() {
            return Err(error::classify(&response));
        }

        let Some(destination) = destination else {
            tracing::debug!(
                method = %method,
                url = %url,
                status = response.status.as_u16(),
                "No destination, skipping decode"
            );
            return Ok(());
        };

        destination.decode(&response)
    }
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("hostname", &self.inner.hostname)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use fws_client::{Client, HttpTransport, RetryStrategy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), fws_client::Error> {
/// let transport = HttpTransport::builder()
///     .timeout(Duration::from_secs(30))
///     .retry_strategy(RetryStrategy::None)
///     .build()?;
///
/// let client = Client::builder()
///     .hostname("fws.example.com")
///     .token("my-token")
///     .transport(transport)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder<T = HttpTransport> {
    hostname: Option<String>,
    token: Option<String>,
    base_url: Option<Url>,
    transport: T,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with the default transport.
    pub fn new() -> Self {
        Self {
            hostname: None,
            token: None,
            base_url: None,
            transport: HttpTransport::default(),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> ClientBuilder<T> {
    /// Sets the API hostname. Defaults to [`DEFAULT_HOSTNAME`].
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Sets the bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Overrides the base URL derived from the hostname.
    ///
    /// A trailing `/` is added if missing so relative paths resolve below it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let mut url = Url::parse(url.as_ref())?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Replaces the transport.
    pub fn transport<U: Transport>(self, transport: U) -> ClientBuilder<U> {
        ClientBuilder {
            hostname: self.hostname,
            token: self.token,
            base_url: self.base_url,
            transport,
        }
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the token is missing or empty,
    /// or if the hostname does not produce a valid base URL.
    pub fn build(self) -> Result<Client<T>> {
        let token = self
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::ConfigurationError("missing API token".to_string()))?;

        let hostname = self
            .hostname
            .filter(|hostname| !hostname.is_empty())
            .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());

        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(&format!("https://{hostname}/api/fake-resources/"))
                .map_err(|_| Error::ConfigurationError(format!("invalid hostname: {hostname}")))?,
        };

        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::ConfigurationError(format!("Invalid API token: {}", e)))?;
        authorization.set_sensitive(true);

        Ok(Client {
            inner: Arc::new(ClientInner {
                base_url,
                hostname,
                authorization,
                transport: self.transport,
            }),
        })
    }
}
