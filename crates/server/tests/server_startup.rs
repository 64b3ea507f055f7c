//! Process-level tests: spawn the `bugtrail` binary against a temp config.

use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use bugtrail_core::{Collection, DocumentStore, SqliteDocumentStore};
use reqwest::Client;
use serde_json::json;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Config with database and object storage inside `dir`
fn config_in(port: u16, dir: &Path) -> String {
    format!(
        r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = {port}

[database]
path = "{db}"

[storage]
root = "{objects}"
public_url = "http://127.0.0.1:{port}/objects"
"#,
        port = port,
        db = dir.join("bugtrail.db").display(),
        objects = dir.join("objects").display(),
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_bugtrail"))
        .env("BUGTRAIL_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&config_in(port, temp_dir.path()));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    // The database file is created on startup
    assert!(temp_dir.path().join("bugtrail.db").exists());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_returns_sanitized() {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&config_in(port, temp_dir.path()));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["auth"]["method"], "none");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["submission"]["max_image_bytes"], 3_145_728);
    assert_eq!(json["submission"]["user_index"], "merge");
    // The local object root isn't exposed
    assert!(json["storage"].get("root").is_none());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_submission_end_to_end() {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();

    {
        let store = SqliteDocumentStore::new(&temp_dir.path().join("bugtrail.db")).unwrap();
        let seed = |value: serde_json::Value| match value {
            serde_json::Value::Object(document) => document,
            _ => unreachable!(),
        };
        store
            .set(Collection::Projects, "p1", seed(json!({"name": "Storefront"})))
            .await
            .unwrap();
        store
            .set(
                Collection::Users,
                "u1",
                seed(json!({"displayName": "Ann", "email": "a@x.com", "role": "QA"})),
            )
            .await
            .unwrap();
    }

    let config = write_config(&config_in(port, temp_dir.path()));
    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let image: Vec<u8> = (0..300_000).map(|i| (i % 253) as u8).collect();
    let form = reqwest::multipart::Form::new()
        .text("title", "Checkout crashes")
        .text("description", "Blank page on pay")
        .text("priority", "Severe")
        .part(
            "image",
            reqwest::multipart::Part::bytes(image.clone())
                .file_name("crash.png")
                .mime_str("image/png")
                .unwrap(),
        );

    let client = Client::new();
    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/projects/p1/defects",
            port
        ))
        .header("X-User-Id", "u1")
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let json: serde_json::Value = response.json().await.unwrap();
    let ticket_id = json["ticket"]["id"].as_str().unwrap().to_string();
    let image_url = json["ticket"]["imageUrl"].as_str().unwrap().to_string();
    assert_eq!(
        image_url,
        format!("http://127.0.0.1:{}/objects/images/{}", port, ticket_id)
    );

    // The download URL serves the uploaded bytes
    let downloaded = client.get(&image_url).send().await.unwrap();
    assert!(downloaded.status().is_success());
    assert_eq!(downloaded.bytes().await.unwrap().to_vec(), image);

    // The ticket reads back under its id
    let ticket = client
        .get(format!("http://127.0.0.1:{}/api/v1/tickets/{}", port, ticket_id))
        .header("X-User-Id", "u1")
        .send()
        .await
        .unwrap();
    assert!(ticket.status().is_success());

    // The reporter's index eventually lists it
    let mut listed = false;
    for _ in 0..40 {
        let me: serde_json::Value = client
            .get(format!("http://127.0.0.1:{}/api/v1/me", port))
            .header("X-User-Id", "u1")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if me["myTickets"] == json!([ticket_id.clone()]) {
            listed = true;
            break;
        }
        sleep(Duration::from_millis(50)).await;
    }
    assert!(listed, "ticket id never reached myTickets");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_service_started_persists_across_restarts() {
    let temp_dir = TempDir::new().unwrap();

    for _ in 0..2 {
        let port = get_available_port();
        let config = write_config(&config_in(port, temp_dir.path()));
        let mut server = spawn_server(config.path()).await;
        assert!(
            wait_for_server(port, 40).await,
            "Server did not start in time"
        );
        sleep(Duration::from_millis(100)).await;
        server.kill().await.ok();
        sleep(Duration::from_millis(100)).await;
    }

    let port = get_available_port();
    let config = write_config(&config_in(port, temp_dir.path()));
    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );
    sleep(Duration::from_millis(100)).await;

    let json: serde_json::Value = Client::new()
        .get(format!(
            "http://127.0.0.1:{}/api/v1/audit?event_type=service_started",
            port
        ))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");

    let events = json["events"].as_array().expect("events should be an array");
    assert!(
        events.len() >= 3,
        "Should have a service_started event per start, got {}",
        events.len()
    );
    assert!(events[0]["data"]["version"].is_string());
    assert!(events[0]["data"]["config_hash"].is_string());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_bugtrail"))
            .env("BUGTRAIL_CONFIG", "/nonexistent/config.toml")
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_missing_auth_section_exits_with_error() {
    let config = write_config(
        r#"
[server]
port = 8080
"#,
    );

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_bugtrail"))
            .env("BUGTRAIL_CONFIG", config.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_api_key_without_keys_exits_with_error() {
    let config = write_config(
        r#"
[auth]
method = "api_key"
"#,
    );

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_bugtrail"))
            .env("BUGTRAIL_CONFIG", config.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
