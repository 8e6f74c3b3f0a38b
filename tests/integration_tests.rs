//! Integration tests using wiremock to simulate the backend.

use fws_client::rate_limit::RateLimitConfig;
use fws_client::resources::{Database, Server, ServerCreateOptions, Vpc};
use fws_client::{
    Client, Error, HttpTransport, Page, RawSink, RetryStrategy, Transport, JSON_API_MEDIA_TYPE,
};
use http::Method;
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(mock_server: &MockServer, strategy: RetryStrategy) -> Client {
    let transport = HttpTransport::builder()
        .retry_strategy(strategy)
        .build()
        .unwrap();

    Client::builder()
        .token("test-token")
        .base_url(format!("{}/api/fake-resources/", mock_server.uri()))
        .unwrap()
        .transport(transport)
        .build()
        .unwrap()
}

fn jsonapi(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), JSON_API_MEDIA_TYPE)
}

fn short_linear(max_retries: usize) -> RetryStrategy {
    RetryStrategy::Linear {
        delay: Duration::from_millis(10),
        max_retries,
    }
}

#[tokio::test]
async fn test_create_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/fake-resources/servers"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", JSON_API_MEDIA_TYPE))
        .and(header("content-type", JSON_API_MEDIA_TYPE))
        .and(body_json(json!({
            "data": {
                "type": "fake-resources-servers",
                "attributes": {"name": "web-1", "server-type": "small", "vpc": null}
            }
        })))
        .respond_with(jsonapi(
            201,
            json!({
                "data": {
                    "type": "fake-resources-servers",
                    "id": "srv-1",
                    "attributes": {"name": "web-1", "server-type": "small", "vpc": null}
                }
            }),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, RetryStrategy::None);
    let options = ServerCreateOptions {
        name: Some("web-1".to_string()),
        server_type: Some("small".to_string()),
        ..Default::default()
    };

    let request = client
        .new_request(Method::POST, "servers", Some(&options))
        .unwrap();
    let mut server = Server::default();
    client.execute(request, Some(&mut server)).await.unwrap();

    assert_eq!(server.id, "srv-1");
    assert_eq!(server.name, "web-1");
    assert_eq!(server.server_type, "small");
    assert!(server.vpc.is_empty());
}

#[tokio::test]
async fn test_list_collection() {
    let mock_server = MockServer::start().await;

    let data: Vec<_> = (1..=5)
        .map(|i| {
            json!({
                "type": "fake-resources-vpcs",
                "id": format!("vpc-{i}"),
                "attributes": {"name": format!("net-{i}"), "cidr_block": "10.0.0.0/16"}
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/api/fake-resources/vpcs"))
        .respond_with(jsonapi(
            200,
            json!({
                "data": data,
                "meta": {"pagination": {
                    "current-page": 1,
                    "prev-page": null,
                    "next-page": null,
                    "total-pages": 1,
                    "total-count": 5
                }}
            }),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, RetryStrategy::None);
    let request = client.new_request(Method::GET, "vpcs", None).unwrap();
    let mut page = Page::<Vpc>::default();
    client.execute(request, Some(&mut page)).await.unwrap();

    assert_eq!(page.items.len(), 5);
    assert_eq!(page.pagination.total_count, 5);
    assert_eq!(page.pagination.previous_page, 0);
    let ids: Vec<_> = page.items.iter().map(|vpc| vpc.id.as_str()).collect();
    assert_eq!(ids, ["vpc-1", "vpc-2", "vpc-3", "vpc-4", "vpc-5"]);
}

#[tokio::test]
async fn test_read_single_resource() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/fake-resources/databases/db-1"))
        .and(header("accept", JSON_API_MEDIA_TYPE))
        .respond_with(jsonapi(
            200,
            json!({
                "data": {
                    "type": "fake-resources-databases",
                    "id": "db-1",
                    "attributes": {"name": "orders", "size": 20}
                },
                "meta": {"pagination": {"total-count": 99}}
            }),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, RetryStrategy::None);
    let request = client
        .new_request(Method::GET, "databases/db-1", None)
        .unwrap();
    let mut database = Database::default();
    client.execute(request, Some(&mut database)).await.unwrap();

    assert_eq!(database.id, "db-1");
    assert_eq!(database.name, "orders");
    assert_eq!(database.size, 20);
}

#[tokio::test]
async fn test_unauthorized_and_not_found_ignore_body() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/api/fake-resources/servers/locked"))
        .respond_with(jsonapi(401, json!({"errors": [{"title": "bad token"}]})))
        .mount(&mock_server)
        .await;
    Mock::given(path("/api/fake-resources/servers/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>missing</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, RetryStrategy::None);

    let request = client
        .new_request(Method::GET, "servers/locked", None)
        .unwrap();
    let err = client.execute(request, None).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(err.to_string(), "unauthorized");

    let request = client
        .new_request(Method::GET, "servers/gone", None)
        .unwrap();
    let mut server = Server::default();
    let err = client.execute(request, Some(&mut server)).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "resource not found");
    assert!(server.id.is_empty());
}

#[tokio::test]
async fn test_validation_errors_joined_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/fake-resources/servers/srv-1"))
        .respond_with(jsonapi(
            422,
            json!({"errors": [
                {"title": "name is taken", "status": "422"},
                {"title": "server-type is invalid", "detail": "must be small or large"}
            ]}),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, RetryStrategy::None);
    let options = ServerCreateOptions {
        name: Some("web-1".to_string()),
        ..Default::default()
    };
    let request = client
        .new_request(Method::PATCH, "servers/srv-1", Some(&options))
        .unwrap();
    let err = client.execute(request, None).await.unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(422));
    assert_eq!(err.api_errors().len(), 2);
    assert_eq!(
        err.to_string(),
        "name is taken\nserver-type is invalid\n\nmust be small or large"
    );
}

#[tokio::test]
async fn test_delete_without_destination() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/fake-resources/load-balancers/lb-1"))
        .and(header("content-type", JSON_API_MEDIA_TYPE))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, RetryStrategy::None);
    let request = client
        .new_request(Method::DELETE, "load-balancers/lb-1", None)
        .unwrap();

    client.execute(request, None).await.unwrap();
}

#[tokio::test]
async fn test_empty_ok_without_destination() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/fake-resources/servers/srv-1/actions/reboot"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, RetryStrategy::None);
    let request = client
        .new_request(Method::POST, "servers/srv-1/actions/reboot", None)
        .unwrap();

    client.execute(request, None).await.unwrap();
}

#[tokio::test]
async fn test_raw_sink_receives_body_verbatim() {
    let mock_server = MockServer::start().await;
    let body = r#"{"data":[],"meta":{"note":"kept as-is"}}"#;

    Mock::given(method("GET"))
        .and(path("/api/fake-resources/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, RetryStrategy::None);
    let request = client.new_request(Method::GET, "servers", None).unwrap();
    let mut sink = RawSink(Vec::new());
    client.execute(request, Some(&mut sink)).await.unwrap();

    assert_eq!(sink.into_inner(), body.as_bytes());
}

#[tokio::test]
async fn test_malformed_success_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/fake-resources/vpcs/vpc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, RetryStrategy::None);
    let request = client.new_request(Method::GET, "vpcs/vpc-1", None).unwrap();
    let mut vpc = Vpc::default();
    let err = client.execute(request, Some(&mut vpc)).await.unwrap_err();

    assert!(matches!(err, Error::DeserializationFailed { .. }));
    assert_eq!(err.raw_response(), Some("not json"));
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/fake-resources/vpcs/vpc-1"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/fake-resources/vpcs/vpc-1"))
        .respond_with(jsonapi(
            200,
            json!({"data": {"type": "fake-resources-vpcs", "id": "vpc-1"}}),
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, short_linear(3));
    let request = client.new_request(Method::GET, "vpcs/vpc-1", None).unwrap();

    let response = client.transport().send(request).await.unwrap();
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.attempts, 3);
    assert!(response.was_retried());
}

#[tokio::test]
async fn test_not_implemented_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(501))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, short_linear(3));
    let request = client.new_request(Method::GET, "servers", None).unwrap();
    let err = client.execute(request, None).await.unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(501));
}

#[tokio::test]
async fn test_exhausted_retries_return_last_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/fake-resources/servers"))
        .respond_with(jsonapi(
            503,
            json!({"errors": [{"title": "backend is down for maintenance"}]}),
        ))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, short_linear(2));
    let request = client.new_request(Method::GET, "servers", None).unwrap();
    let err = client.execute(request, None).await.unwrap_err();

    match err {
        Error::Api { status, errors } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(errors[0].title, "backend is down for maintenance");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retry_after_is_capped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::builder()
        .retry_strategy(short_linear(1))
        .rate_limit_config(RateLimitConfig {
            max_wait: Duration::from_millis(200),
            ..Default::default()
        })
        .build()
        .unwrap();
    let client = Client::builder()
        .token("test-token")
        .base_url(format!("{}/api/fake-resources/", mock_server.uri()))
        .unwrap()
        .transport(transport)
        .build()
        .unwrap();

    let start = Instant::now();
    let request = client.new_request(Method::GET, "servers", None).unwrap();
    client.execute(request, None).await.unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(200), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(10), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_connection_error_exhausts_retries() {
    // Nothing listens on the discard port
    let client = Client::builder()
        .token("test-token")
        .base_url("http://127.0.0.1:9/api/fake-resources/")
        .unwrap()
        .transport(
            HttpTransport::builder()
                .retry_strategy(short_linear(2))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let request = client.new_request(Method::GET, "servers", None).unwrap();
    let err = client.execute(request, None).await.unwrap_err();

    assert!(err.is_transport());
    match err {
        Error::MaxRetriesExceeded {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.is_retryable());
        }
        other => panic!("Expected MaxRetriesExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_error_without_retries_is_unwrapped() {
    let client = Client::builder()
        .token("test-token")
        .base_url("http://127.0.0.1:9/api/fake-resources/")
        .unwrap()
        .transport(
            HttpTransport::builder()
                .retry_strategy(RetryStrategy::None)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let request = client.new_request(Method::GET, "servers", None).unwrap();
    let err = client.execute(request, None).await.unwrap_err();

    assert!(matches!(err, Error::Network(_)), "got {err:?}");
}
