//! Walks a server through its lifecycle against a live backend.
//!
//! This example shows how to:
//! - Resolve the hostname and token from the environment and CLI credentials
//! - Create a server from JSON:API create options
//! - Read it back, then list every server with its pagination details
//! - Delete it and handle a resource that is already gone
//!
//! Run with: `cargo run --example servers`

use fws_client::config::ClientConfig;
use fws_client::resources::{Server, ServerCreateOptions};
use fws_client::{Client, Error, Page};
use http::Method;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fws_client=debug,servers=info".into()),
        )
        .init();

    let config = ClientConfig::from_env();
    println!("Using backend at {}", config.hostname);
    let client = Client::from_config(&config)?;

    println!("=== Create ===");
    let options = ServerCreateOptions {
        name: Some("web-1".to_string()),
        server_type: Some("small".to_string()),
        ..Default::default()
    };
    let request = client.new_request(Method::POST, "servers", Some(&options))?;
    let mut server = Server::default();
    client.execute(request, Some(&mut server)).await?;
    println!("Created {} ({}, {})", server.id, server.name, server.server_type);

    println!("\n=== Read ===");
    let path = format!("servers/{}", server.id);
    let request = client.new_request(Method::GET, &path, None)?;
    let mut fetched = Server::default();
    client.execute(request, Some(&mut fetched)).await?;
    println!("Fetched {:?}", fetched);

    println!("\n=== List ===");
    let request = client.new_request(Method::GET, "servers", None)?;
    let mut page = Page::<Server>::default();
    client.execute(request, Some(&mut page)).await?;
    println!(
        "Page {} of {}, {} servers in total",
        page.pagination.current_page, page.pagination.total_pages, page.pagination.total_count
    );
    for server in &page.items {
        println!("  {} {}", server.id, server.name);
    }

    println!("\n=== Delete ===");
    let request = client.new_request(Method::DELETE, &path, None)?;
    client.execute(request, None).await?;
    println!("Deleted {}", server.id);

    // A second delete finds nothing
    let request = client.new_request(Method::DELETE, &path, None)?;
    match client.execute(request, None).await {
        Err(e) if e.is_not_found() => println!("{} is already gone", server.id),
        Err(e) => return Err(e),
        Ok(()) => println!("Backend accepted a second delete"),
    }

    Ok(())
}
