//! Response decoding into caller-supplied destinations.
//!
//! [`Client::execute`](crate::Client::execute) has a single entry point for
//! every read. What gets decoded is decided by the destination's type:
//!
//! - a [`Payload`] type receives a single primary resource,
//! - a [`Page`] (or any [`Paginated`] type) receives a collection plus its
//!   pagination block,
//! - a [`RawSink`] receives the body bytes untouched.

use std::io::Write;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::body::{Encoding, Payload};
use crate::{jsonapi, Error, Response, Result};

/// A destination for a successful response body.
pub trait Decode {
    /// Decodes the response into `self`.
    ///
    /// Only called for 2xx responses.
    fn decode(&mut self, response: &Response) -> Result<()>;
}

impl<T: Payload + DeserializeOwned> Decode for T {
    fn decode(&mut self, response: &Response) -> Result<()> {
        *self = decode_resource(response)?;
        Ok(())
    }
}

/// Decodes a single primary resource.
///
/// JSON:API payloads are read from the document's primary data; a
/// `Vec` of them reads a primary-data array. Plain JSON payloads are decoded
/// from the whole body.
pub fn decode_resource<T: Payload + DeserializeOwned>(response: &Response) -> Result<T> {
    match T::ENCODING {
        Encoding::Json => serde_json::from_slice(&response.body)
            .map_err(|e| deserialization_failed(response, e.to_string())),
        Encoding::JsonApi { resource_type } => {
            let data = primary_data(response)?;
            let record = jsonapi::flatten_primary(data, Some(resource_type))
                .map_err(|e| deserialization_failed(response, e))?;
            serde_json::from_value(record).map_err(|e| deserialization_failed(response, e.to_string()))
        }
    }
}

/// Pagination details of a collection response.
///
/// Read from `meta.pagination`. Missing or `null` members are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(rename = "current-page", default, deserialize_with = "zero_if_null")]
    pub current_page: u64,
    #[serde(rename = "prev-page", default, deserialize_with = "zero_if_null")]
    pub previous_page: u64,
    #[serde(rename = "next-page", default, deserialize_with = "zero_if_null")]
    pub next_page: u64,
    #[serde(rename = "total-pages", default, deserialize_with = "zero_if_null")]
    pub total_pages: u64,
    #[serde(rename = "total-count", default, deserialize_with = "zero_if_null")]
    pub total_count: u64,
}

fn zero_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    Option::<u64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A destination holding one page of a collection.
///
/// Implement this for a custom page type and forward its [`Decode`] impl to
/// [`decode_page`].
pub trait Paginated {
    /// The resource type listed on the page.
    type Item: Payload + DeserializeOwned;

    /// The items, in document order.
    fn items(&self) -> &[Self::Item];

    /// The pagination block.
    fn pagination(&self) -> &Pagination;

    /// Replaces the page contents.
    fn set_page(&mut self, items: Vec<Self::Item>, pagination: Pagination);
}

/// A page of resources together with its pagination details.
///
/// # Examples
///
/// ```no_run
/// use fws_client::{Client, Page, resources::Server};
/// use http::Method;
///
/// # async fn example(client: Client) -> Result<(), fws_client::Error> {
/// let request = client.new_request(Method::GET, "servers?page%5Bnumber%5D=2", None)?;
/// let mut page = Page::<Server>::default();
/// client.execute(request, Some(&mut page)).await?;
///
/// println!("{} of {} servers", page.items.len(), page.pagination.total_count);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::default(),
        }
    }
}

impl<T: Payload + DeserializeOwned> Paginated for Page<T> {
    type Item = T;

    fn items(&self) -> &[T] {
        &self.items
    }

    fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    fn set_page(&mut self, items: Vec<T>, pagination: Pagination) {
        self.items = items;
        self.pagination = pagination;
    }
}

impl<T: Payload + DeserializeOwned> Decode for Page<T> {
    fn decode(&mut self, response: &Response) -> Result<()> {
        decode_page(self, response)
    }
}

/// Decodes a collection response into a [`Paginated`] destination.
///
/// The body is read twice: once for the primary-data array and once for
/// `meta.pagination`. The destination is only updated when both succeed.
pub fn decode_page<P: Paginated + ?Sized>(page: &mut P, response: &Response) -> Result<()> {
    let expected = <P::Item as Payload>::ENCODING.resource_type();

    let data = primary_data(response)?;
    if !data.is_array() {
        return Err(deserialization_failed(
            response,
            "collection response must have an array of primary data".to_string(),
        ));
    }

    let records = jsonapi::flatten_primary(data, expected)
        .map_err(|e| deserialization_failed(response, e))?;
    let items: Vec<P::Item> = serde_json::from_value(records)
        .map_err(|e| deserialization_failed(response, e.to_string()))?;

    let pagination = jsonapi::parse_pagination(&response.body)
        .map_err(|e| deserialization_failed(response, e.to_string()))?;

    page.set_page(items, pagination);
    Ok(())
}

/// Receives the response body verbatim.
///
/// # Examples
///
/// ```no_run
/// use fws_client::{Client, RawSink};
/// use http::Method;
///
/// # async fn example(client: Client) -> Result<(), fws_client::Error> {
/// let request = client.new_request(Method::GET, "servers", None)?;
/// let mut sink = RawSink(Vec::new());
/// client.execute(request, Some(&mut sink)).await?;
///
/// let raw = String::from_utf8_lossy(&sink.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RawSink<W>(pub W);

impl<W> RawSink<W> {
    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write> Decode for RawSink<W> {
    fn decode(&mut self, response: &Response) -> Result<()> {
        self.0.write_all(&response.body)?;
        self.0.flush()?;
        Ok(())
    }
}

fn primary_data(response: &Response) -> Result<serde_json::Value> {
    serde_json::from_slice::<jsonapi::Document>(&response.body)
        .map(|document| document.data)
        .map_err(|e| deserialization_failed(response, e.to_string()))
}

fn deserialization_failed(response: &Response, serde_error: String) -> Error {
    let raw_response = response.text().into_owned();

    tracing::error!(
        error = %serde_error,
        raw_response = %raw_response,
        "Failed to deserialize response"
    );

    Error::DeserializationFailed {
        raw_response,
        serde_error,
        status: response.status,
    }
}
