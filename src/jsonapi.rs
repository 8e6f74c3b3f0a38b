//! JSON:API document helpers.
//!
//! Resources are converted between their document form
//! (`{"type", "id", "attributes"}`) and a flat object holding `id` next to the
//! attributes, which is what payload types derive `Serialize`/`Deserialize` for.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::decode::Pagination;
use crate::{Error, Result};

/// Wraps a flat record (or a sequence of them) into a document with primary
/// data only: no `included` section and no relationships.
pub(crate) fn encode_document(resource_type: &str, value: Value) -> Result<Vec<u8>> {
    let data = match value {
        Value::Object(record) => resource_object(resource_type, record),
        Value::Array(records) => Value::Array(
            records
                .into_iter()
                .map(|record| match record {
                    Value::Object(record) => Ok(resource_object(resource_type, record)),
                    _ => Err(Error::InvalidBody(
                        "sequence elements must be records".to_string(),
                    )),
                })
                .collect::<Result<_>>()?,
        ),
        _ => {
            return Err(Error::InvalidBody(
                "body must be a record or a sequence of records".to_string(),
            ))
        }
    };

    let mut document = Map::new();
    document.insert("data".to_string(), data);

    serde_json::to_vec(&Value::Object(document))
        .map_err(|e| Error::SerializationFailed(e.to_string()))
}

fn resource_object(resource_type: &str, mut attributes: Map<String, Value>) -> Value {
    let mut resource = Map::new();
    resource.insert("type".to_string(), Value::from(resource_type));

    match attributes.remove("id") {
        Some(Value::String(id)) if !id.is_empty() => {
            resource.insert("id".to_string(), Value::String(id));
        }
        Some(Value::Number(id)) => {
            resource.insert("id".to_string(), Value::String(id.to_string()));
        }
        _ => {}
    }

    if !attributes.is_empty() {
        resource.insert("attributes".to_string(), Value::Object(attributes));
    }

    Value::Object(resource)
}

/// The primary data of a document.
#[derive(Deserialize)]
pub(crate) struct Document {
    #[serde(default)]
    pub(crate) data: Value,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default, deserialize_with = "default_if_null")]
    meta: Meta,
}

#[derive(Deserialize, Default)]
struct Meta {
    #[serde(default, deserialize_with = "default_if_null")]
    pagination: Pagination,
}

fn default_if_null<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Reads `meta.pagination`, independent of the primary data.
///
/// A document without pagination metadata, or with a `null` one, yields the
/// zero value.
pub(crate) fn parse_pagination(body: &[u8]) -> serde_json::Result<Pagination> {
    serde_json::from_slice::<Envelope>(body).map(|envelope| envelope.meta.pagination)
}

/// Flattens primary data into the shape payload types deserialize from.
///
/// With an `expected` type, every resource must carry that `type` member.
pub(crate) fn flatten_primary(
    data: Value,
    expected: Option<&str>,
) -> std::result::Result<Value, String> {
    match data {
        Value::Object(resource) => flatten_resource(resource, expected),
        Value::Array(resources) => resources
            .into_iter()
            .map(|resource| match resource {
                Value::Object(resource) => flatten_resource(resource, expected),
                other => Err(format!("expected a resource object, found {other}")),
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Null => Err("document has no primary data".to_string()),
        other => Err(format!("invalid primary data: {other}")),
    }
}

fn flatten_resource(
    mut resource: Map<String, Value>,
    expected: Option<&str>,
) -> std::result::Result<Value, String> {
    if let Some(expected) = expected {
        let found = resource.get("type").and_then(Value::as_str).unwrap_or("");
        if found != expected {
            return Err(format!(
                "resource type mismatch: expected {expected}, found {found:?}"
            ));
        }
    }

    let mut record = match resource.remove("attributes") {
        Some(Value::Object(attributes)) => attributes,
        _ => Map::new(),
    };
    // Null attributes leave the field at its default
    record.retain(|_, value| !value.is_null());

    if let Some(id) = resource.remove("id") {
        record.insert("id".to_string(), id);
    }

    Ok(Value::Object(record))
}
