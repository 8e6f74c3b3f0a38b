//! JSON:API payloads for the backend's resources.
//!
//! Read models omit empty attributes when sent. Create/update options send
//! every attribute, as `null` when unset.

use serde::{Deserialize, Serialize};

use crate::body::{Encoding, Payload};

macro_rules! jsonapi_payload {
    ($resource_type:literal => $($ty:ty),+) => {
        $(
            impl Payload for $ty {
                const ENCODING: Encoding = Encoding::JsonApi {
                    resource_type: $resource_type,
                };
            }
        )+
    };
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// A server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "server-type", default, skip_serializing_if = "String::is_empty")]
    pub server_type: String,
    /// Name of the VPC the server is deployed in.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vpc: String,
}

/// Attributes for creating or updating a [`Server`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerCreateOptions {
    /// Left empty; the backend assigns ids.
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "server-type")]
    pub server_type: Option<String>,
    pub vpc: Option<String>,
}

pub type ServerUpdateOptions = ServerCreateOptions;

jsonapi_payload!("fake-resources-servers" => Server, ServerCreateOptions);

/// A database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub size: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseCreateOptions {
    pub id: String,
    pub name: Option<String>,
    pub size: Option<i64>,
}

pub type DatabaseUpdateOptions = DatabaseCreateOptions;

jsonapi_payload!("fake-resources-databases" => Database, DatabaseCreateOptions);

/// A load balancer in front of a set of servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Names of the servers behind the load balancer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadBalancerCreateOptions {
    pub id: String,
    pub name: Option<String>,
    pub servers: Option<Vec<String>>,
}

pub type LoadBalancerUpdateOptions = LoadBalancerCreateOptions;

jsonapi_payload!(
    "fake-resources-load-balancers" => LoadBalancer, LoadBalancerCreateOptions
);

/// A virtual private cloud.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VpcCreateOptions {
    pub id: String,
    pub name: Option<String>,
    pub cidr_block: Option<String>,
}

pub type VpcUpdateOptions = VpcCreateOptions;

jsonapi_payload!("fake-resources-vpcs" => Vpc, VpcCreateOptions);
