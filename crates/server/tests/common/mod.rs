//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture builds the real router over a mock document store and a mock
//! object store, so tests can seed documents, inject failures and inspect
//! what the submission workflow wrote.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use bugtrail_core::{
    create_audit_system, AuditStore, AuthConfig, AuthMethod, Collection, Config, DatabaseConfig,
    DocumentStore, NoneAuthenticator, ObjectStore, ServerConfig, SqliteAuditStore, StorageConfig,
    SubmissionConfig,
    testing::{MockDocumentStore, MockObjectStore},
};

pub const BOUNDARY: &str = "bugtrail-test-boundary";

/// Test fixture with an in-process router and controllable stores.
///
/// Seeds project `p1` ("Storefront") and user `u1` (Ann, QA, no tickets).
/// Requests are made as a user via the `X-User-Id` header.
pub struct TestFixture {
    pub router: Router,
    pub documents: Arc<MockDocumentStore>,
    pub objects: Arc<MockObjectStore>,
    pub audit_store: Arc<SqliteAuditStore>,
    /// Holds the audit database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_submission(SubmissionConfig::default()).await
    }

    pub async fn with_submission(submission: SubmissionConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("audit.db");

        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                api_keys: HashMap::new(),
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            storage: StorageConfig {
                root: temp_dir.path().join("objects"),
                ..StorageConfig::default()
            },
            submission,
        };

        let documents = Arc::new(MockDocumentStore::new());
        let objects = Arc::new(MockObjectStore::new());
        let audit_store =
            Arc::new(SqliteAuditStore::new(&db_path).expect("Failed to create audit store"));

        documents
            .seed(Collection::Projects, "p1", json!({"name": "Storefront"}))
            .await;
        documents
            .seed(
                Collection::Users,
                "u1",
                json!({
                    "displayName": "Ann",
                    "email": "a@x.com",
                    "role": "QA",
                    "myTickets": []
                }),
            )
            .await;

        let (audit_handle, audit_writer) =
            create_audit_system(Arc::clone(&audit_store) as Arc<dyn AuditStore>, 100);
        tokio::spawn(audit_writer.run());

        let state = Arc::new(bugtrail_server::state::AppState::new(
            config,
            Arc::new(NoneAuthenticator::new()),
            audit_handle,
            Arc::clone(&audit_store) as Arc<dyn AuditStore>,
            Arc::clone(&documents) as Arc<dyn DocumentStore>,
            Arc::clone(&objects) as Arc<dyn ObjectStore>,
        ));

        let router = bugtrail_server::api::create_router(state);

        Self {
            router,
            documents,
            objects,
            audit_store,
            temp_dir,
        }
    }

    /// GET as an anonymous caller.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// GET as `user_id`.
    pub async fn get_as(&self, user_id: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header("X-User-Id", user_id)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST a multipart form as `user_id`.
    pub async fn post_multipart(&self, user_id: &str, path: &str, parts: &[Part<'_>]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("X-User-Id", user_id)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    /// Submit a defect for project `p1` as `u1`.
    pub async fn submit(&self, parts: &[Part<'_>]) -> TestResponse {
        self.post_multipart("u1", "/api/v1/projects/p1/defects", parts)
            .await
    }

    /// Wait until the user's ticket index holds `expected` ids.
    ///
    /// The index write runs detached from the request, so it may land after
    /// the response.
    pub async fn wait_for_my_tickets(&self, user_id: &str, expected: usize) -> Vec<String> {
        for _ in 0..100 {
            let tickets = self.my_tickets(user_id).await;
            if tickets.len() >= expected {
                return tickets;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.my_tickets(user_id).await
    }

    pub async fn my_tickets(&self, user_id: &str) -> Vec<String> {
        self.documents
            .document(Collection::Users, user_id)
            .await
            .and_then(|doc| doc.get("myTickets").cloned())
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Wait until the audit log holds an event of `event_type`.
    pub async fn wait_for_audit(&self, event_type: &str) -> bool {
        let filter = bugtrail_core::AuditFilter::new().with_event_type(event_type);
        for _ in 0..100 {
            if self.audit_store.count(&filter).unwrap_or(0) > 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let raw = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body: Value = if raw.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&raw).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            raw,
        }
    }
}

/// Encode parts as a `multipart/form-data` body using [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Standard text fields of a defect form.
pub fn text_fields<'a>(title: &'a str, description: &'a str, priority: &'a str) -> Vec<Part<'a>> {
    vec![
        Part::Text("title", title),
        Part::Text("description", description),
        Part::Text("priority", priority),
    ]
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
