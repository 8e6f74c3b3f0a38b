//! # fws-client - a JSON:API client for the fake web services backend
//!
//! The client builds authenticated requests, encodes bodies as plain JSON or
//! JSON:API documents, and decodes responses into whatever shape the caller
//! asks for: a single resource, a page of resources, or the raw bytes.
//! Failures come back as a small typed [`Error`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use fws_client::{Client, Page, resources::{Server, ServerCreateOptions}};
//! use http::Method;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fws_client::Error> {
//!     let client = Client::new("app.terraform.io", "my-token")?;
//!
//!     // Create a server
//!     let options = ServerCreateOptions {
//!         name: Some("web-1".to_string()),
//!         server_type: Some("small".to_string()),
//!         ..Default::default()
//!     };
//!     let request = client.new_request(Method::POST, "servers", Some(&options))?;
//!     let mut server = Server::default();
//!     client.execute(request, Some(&mut server)).await?;
//!
//!     // List servers; the destination's type selects collection decoding
//!     let request = client.new_request(Method::GET, "servers", None)?;
//!     let mut page = Page::<Server>::default();
//!     client.execute(request, Some(&mut page)).await?;
//!     println!("{} servers in total", page.pagination.total_count);
//!
//!     // Delete it; nothing to decode
//!     let path = format!("servers/{}", server.id);
//!     let request = client.new_request(Method::DELETE, &path, None)?;
//!     client.execute(request, None).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use fws_client::{Client, Error, resources::Vpc};
//! use http::Method;
//!
//! # async fn example(client: Client) -> Result<(), Error> {
//! let request = client.new_request(Method::GET, "vpcs/vpc-1", None)?;
//! let mut vpc = Vpc::default();
//!
//! match client.execute(request, Some(&mut vpc)).await {
//!     Ok(()) => println!("VPC {} is {}", vpc.name, vpc.cidr_block),
//!     Err(Error::ResourceNotFound) => println!("VPC was deleted"),
//!     Err(Error::Unauthorized) => eprintln!("check your token"),
//!     Err(e) => eprintln!("request failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Retries
//!
//! Retrying belongs to the transport. The default [`HttpTransport`] retries
//! network errors, 429 and 5xx with exponential backoff; configure it through
//! [`HttpTransport::builder`] and pass it to [`ClientBuilder::transport`].

mod body;
mod client;
pub mod config;
mod decode;
mod error;
mod jsonapi;
pub mod rate_limit;
mod request;
pub mod resources;
mod response;
pub mod retry;
mod transport;

pub use body::{serialize, Encoding, Payload, RequestBody};
pub use client::{Client, ClientBuilder};
pub use decode::{decode_page, decode_resource, Decode, Page, Paginated, Pagination, RawSink};
pub use error::{ApiError, Error, Result};
pub use request::{Request, JSON_API_MEDIA_TYPE};
pub use response::Response;
pub use retry::{RetryPredicate, RetryStrategy};
pub use transport::{HttpTransport, HttpTransportBuilder, Transport};
