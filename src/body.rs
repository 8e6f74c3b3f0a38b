//! Request body encoding.
//!
//! A payload type states its wire encoding once, through [`Payload::ENCODING`],
//! instead of having it inferred per call. A record is either plain JSON or a
//! JSON:API resource, never both.
//!
//! For JSON:API payloads the serde field named `id` becomes the primary id and
//! every other serialized field becomes an attribute. Fields skipped by serde
//! (for example with `skip_serializing_if`) are left out of the attributes.

use serde::Serialize;
use serde_json::Value;

use crate::{jsonapi, Error, Result};

/// The wire encoding of a payload type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Encoded as-is with `serde_json`.
    Json,
    /// Wrapped in a JSON:API document as a resource of this type.
    JsonApi {
        /// The JSON:API `type` member, e.g. `fake-resources-servers`.
        resource_type: &'static str,
    },
}

impl Encoding {
    /// Returns the JSON:API resource type, if any.
    pub fn resource_type(&self) -> Option<&'static str> {
        match self {
            Encoding::Json => None,
            Encoding::JsonApi { resource_type } => Some(resource_type),
        }
    }
}

/// A record that can be sent to, or decoded from, the backend.
///
/// # Examples
///
/// ```
/// use fws_client::{Encoding, Payload};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct Vpc {
///     #[serde(default)]
///     id: String,
///     #[serde(default, skip_serializing_if = "String::is_empty")]
///     name: String,
/// }
///
/// impl Payload for Vpc {
///     const ENCODING: Encoding = Encoding::JsonApi {
///         resource_type: "fake-resources-vpcs",
///     };
/// }
/// ```
pub trait Payload: Serialize {
    /// How values of this type go over the wire.
    const ENCODING: Encoding;
}

/// A sequence of records is encoded like its elements.
impl<P: Payload> Payload for Vec<P> {
    const ENCODING: Encoding = P::ENCODING;
}

/// An encodable request body.
///
/// Implemented for every [`Payload`]; this is the object-safe form that
/// [`Client::new_request`](crate::Client::new_request) accepts.
pub trait RequestBody {
    /// Encodes the body into bytes.
    fn encode(&self) -> Result<Vec<u8>>;
}

impl<P: Payload> RequestBody for P {
    fn encode(&self) -> Result<Vec<u8>> {
        serialize(self)
    }
}

/// Serializes a payload according to its declared [`Encoding`].
///
/// # Errors
///
/// Returns [`Error::InvalidBody`] unless the payload serializes to an object or
/// a sequence of objects, and [`Error::SerializationFailed`] if serde fails.
pub fn serialize<P: Payload + ?Sized>(payload: &P) -> Result<Vec<u8>> {
    let value =
        serde_json::to_value(payload).map_err(|e| Error::SerializationFailed(e.to_string()))?;

    if !is_record_shaped(&value) {
        return Err(Error::InvalidBody(
            "body must be a record or a sequence of records".to_string(),
        ));
    }

    match P::ENCODING {
        // Encode the payload itself so field order matches a direct encoding
        Encoding::Json => {
            serde_json::to_vec(payload).map_err(|e| Error::SerializationFailed(e.to_string()))
        }
        Encoding::JsonApi { resource_type } => jsonapi::encode_document(resource_type, value),
    }
}

fn is_record_shaped(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().all(Value::is_object),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct CreateServer {
        id: String,
        name: Option<String>,
        #[serde(rename = "server-type")]
        server_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        vpc: Option<String>,
    }

    impl Payload for CreateServer {
        const ENCODING: Encoding = Encoding::JsonApi {
            resource_type: "fake-resources-servers",
        };
    }

    #[derive(Serialize)]
    struct Rename {
        name: String,
        force: bool,
    }

    impl Payload for Rename {
        const ENCODING: Encoding = Encoding::Json;
    }

    #[derive(Serialize)]
    struct Tag(String);

    impl Payload for Tag {
        const ENCODING: Encoding = Encoding::Json;
    }

    fn parse(bytes: Vec<u8>) -> Value {
        serde_json::from_slice(&bytes).unwrap()
    }

    fn web_1() -> CreateServer {
        CreateServer {
            id: String::new(),
            name: Some("web-1".to_string()),
            server_type: Some("small".to_string()),
            vpc: None,
        }
    }

    #[test]
    fn test_jsonapi_document_shape() {
        let body = parse(serialize(&web_1()).unwrap());

        assert_eq!(
            body,
            json!({
                "data": {
                    "type": "fake-resources-servers",
                    "attributes": {
                        "name": "web-1",
                        "server-type": "small"
                    }
                }
            })
        );
    }

    #[test]
    fn test_jsonapi_keeps_nonempty_id_and_nulls() {
        let mut server = web_1();
        server.id = "srv-1".to_string();
        server.name = None;

        let body = parse(serialize(&server).unwrap());
        assert_eq!(body["data"]["id"], "srv-1");
        assert_eq!(body["data"]["attributes"]["name"], Value::Null);
        assert!(body["data"]["attributes"].get("vpc").is_none());
    }

    #[test]
    fn test_jsonapi_sequence() {
        let body = parse(serialize(&vec![web_1(), web_1()]).unwrap());
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1]["type"], "fake-resources-servers");
    }

    #[test]
    fn test_plain_json_matches_direct_encoding() {
        let rename = Rename {
            name: "db".to_string(),
            force: true,
        };
        assert_eq!(
            serialize(&rename).unwrap(),
            serde_json::to_vec(&rename).unwrap()
        );
    }

    #[test]
    fn test_non_record_is_invalid_body() {
        let err = serialize(&Tag("x".to_string())).unwrap_err();
        assert!(matches!(err, Error::InvalidBody(_)));
    }

    #[test]
    fn test_request_body_trait_object() {
        let body: &dyn RequestBody = &web_1();
        assert!(!body.encode().unwrap().is_empty());
    }
}
