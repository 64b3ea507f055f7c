//! Defect submission through the HTTP API.

mod common;

use axum::http::StatusCode;
use bugtrail_core::{Collection, ObjectStoreError, SubmissionConfig, UserIndexMode};

use common::{text_fields, Part, TestFixture};

fn png(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_submit_without_image_creates_ticket() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .submit(&text_fields("Checkout crashes", "Blank page on pay", "Severe"))
        .await;

    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["reset_form"], true);
    assert_eq!(response.body["warnings"], serde_json::json!([]));

    let ticket = &response.body["ticket"];
    assert_eq!(ticket["title"], "Checkout crashes");
    assert_eq!(ticket["description"], "Blank page on pay");
    assert_eq!(ticket["priority"], "Severe");
    assert_eq!(ticket["imageUrl"], "");
    assert_eq!(ticket["status"], "unassigned");
    assert_eq!(ticket["owner"]["id"], "u1");
    assert_eq!(ticket["owner"]["displayName"], "Ann");
    assert_eq!(ticket["project"]["projectId"], "p1");
    assert_eq!(ticket["project"]["projectName"], "Storefront");
    assert_eq!(ticket["assignee"]["id"], "");

    let logs = ticket["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["statusChangedTo"], "created");
    assert_eq!(logs[0]["personName"], "Ann");
    assert_eq!(logs[0]["personRole"], "QA");
    assert_eq!(logs[0]["timestamp"], ticket["createdAt"]);

    assert_eq!(fixture.documents.count(Collection::Tickets).await, 1);
    assert_eq!(fixture.objects.upload_count().await, 0);
}

#[tokio::test]
async fn test_submit_with_image_stores_and_serves_it() {
    let fixture = TestFixture::new().await;
    let image = png(50_000);

    let mut parts = text_fields("Broken layout", "Header overlaps", "High");
    parts.push(Part::File {
        name: "image",
        file_name: "layout.png",
        content_type: "image/png",
        data: &image,
    });

    let response = fixture.submit(&parts).await;
    assert_status!(response, StatusCode::CREATED);

    let ticket_id = response.body["ticket"]["id"].as_str().unwrap().to_string();
    let key = format!("images/{}", ticket_id);
    assert_eq!(
        response.body["ticket"]["imageUrl"],
        format!("mock://objects/{}", key)
    );
    assert_eq!(fixture.objects.object_bytes(&key).await.unwrap(), image);

    // Every image is tagged with the configured content type.
    let uploads = fixture.objects.recorded_uploads().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].content_type, "image/jpeg");

    let served = fixture.get(&format!("/objects/{}", key)).await;
    assert_status!(served, StatusCode::OK);
    assert_eq!(served.raw, image);
    assert_eq!(served.headers["content-type"], "image/jpeg");
}

#[tokio::test]
async fn test_empty_image_part_counts_as_no_image() {
    let fixture = TestFixture::new().await;

    let mut parts = text_fields("Typo", "In footer", "Low");
    parts.push(Part::File {
        name: "image",
        file_name: "",
        content_type: "application/octet-stream",
        data: &[],
    });

    let response = fixture.submit(&parts).await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["ticket"]["imageUrl"], "");
    assert_eq!(fixture.objects.upload_count().await, 0);
}

#[tokio::test]
async fn test_oversized_image_is_dropped_with_warning() {
    let fixture = TestFixture::with_submission(SubmissionConfig {
        max_image_bytes: 1_000,
        ..SubmissionConfig::default()
    })
    .await;
    let image = png(1_001);

    let mut parts = text_fields("Slow search", "Takes 10s", "Medium");
    parts.push(Part::File {
        name: "image",
        file_name: "search.png",
        content_type: "image/png",
        data: &image,
    });

    let response = fixture.submit(&parts).await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["ticket"]["imageUrl"], "");

    let warnings = response.body["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["kind"], "image_too_large");
    assert_eq!(warnings[0]["size_bytes"], 1_001);
    assert_eq!(warnings[0]["max_bytes"], 1_000);

    assert_eq!(fixture.objects.upload_count().await, 0);
    assert!(fixture.wait_for_audit("image_rejected").await);
}

#[tokio::test]
async fn test_very_large_image_is_dropped_with_warning() {
    let fixture = TestFixture::new().await;
    let size = 17 * 1024 * 1024;
    let image = png(size);

    let mut parts = text_fields("Huge screenshot", "Whole page capture", "Low");
    parts.push(Part::File {
        name: "image",
        file_name: "page.png",
        content_type: "image/png",
        data: &image,
    });

    let response = fixture.submit(&parts).await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["ticket"]["title"], "Huge screenshot");
    assert_eq!(response.body["ticket"]["imageUrl"], "");

    let warnings = response.body["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["kind"], "image_too_large");
    assert_eq!(warnings[0]["size_bytes"], size as u64);
    assert_eq!(warnings[0]["max_bytes"], 3_145_728);

    assert_eq!(fixture.documents.count(Collection::Tickets).await, 1);
    assert_eq!(fixture.objects.upload_count().await, 0);
}

#[tokio::test]
async fn test_oversized_text_field_is_rejected() {
    let fixture = TestFixture::new().await;
    let description = "x".repeat(64 * 1024 + 1);

    let response = fixture
        .submit(&text_fields("Long", &description, "Low"))
        .await;

    assert_status!(response, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("description"));
    assert_eq!(fixture.documents.count(Collection::Tickets).await, 0);
}

#[tokio::test]
async fn test_ticket_write_failure_keeps_form_and_orphans_index_entry() {
    let fixture = TestFixture::new().await;
    fixture.documents.fail_writes(Collection::Tickets).await;

    let response = fixture
        .submit(&text_fields("Login loop", "Redirects forever", "Severe"))
        .await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["failed_step"], "write");
    assert_eq!(response.body["form"]["title"], "Login loop");
    assert_eq!(response.body["form"]["description"], "Redirects forever");
    assert_eq!(response.body["form"]["priority"], "Severe");
    assert!(!response.body["error"].as_str().unwrap().is_empty());
    assert!(response.body.get("reset_form").is_none());

    assert_eq!(fixture.documents.count(Collection::Tickets).await, 0);

    // The index write was dispatched before the failure and still lands.
    let ticket_id = response.body["ticket_id"].as_str().unwrap().to_string();
    let my_tickets = fixture.wait_for_my_tickets("u1", 1).await;
    assert_eq!(my_tickets, vec![ticket_id]);

    assert!(fixture.wait_for_audit("submission_failed").await);
}

#[tokio::test]
async fn test_upload_failure_skips_ticket_write() {
    let fixture = TestFixture::new().await;
    fixture
        .objects
        .set_next_upload_error(ObjectStoreError::Unavailable("bucket offline".to_string()))
        .await;
    let image = png(2_000);

    let mut parts = text_fields("Cart empty", "Items vanish", "High");
    parts.push(Part::File {
        name: "image",
        file_name: "cart.png",
        content_type: "image/png",
        data: &image,
    });

    let response = fixture.submit(&parts).await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["failed_step"], "upload");
    assert_eq!(response.body["form"]["image_file_name"], "cart.png");
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("bucket offline"));
    assert_eq!(fixture.documents.count(Collection::Tickets).await, 0);
}

#[tokio::test]
async fn test_sequential_submissions_extend_ticket_index() {
    let fixture = TestFixture::new().await;

    let first = fixture.submit(&text_fields("One", "", "Low")).await;
    assert_status!(first, StatusCode::CREATED);
    fixture.wait_for_my_tickets("u1", 1).await;

    let second = fixture.submit(&text_fields("Two", "", "Low")).await;
    assert_status!(second, StatusCode::CREATED);
    let my_tickets = fixture.wait_for_my_tickets("u1", 2).await;

    let first_id = first.body["ticket"]["id"].as_str().unwrap();
    let second_id = second.body["ticket"]["id"].as_str().unwrap();
    assert_ne!(first_id, second_id);
    assert_eq!(my_tickets, vec![first_id.to_string(), second_id.to_string()]);

    let me = fixture.get_as("u1", "/api/v1/me").await;
    assert_status!(me, StatusCode::OK);
    assert_eq!(me.body["id"], "u1");
    assert_eq!(me.body["displayName"], "Ann");
    assert_eq!(me.body["myTickets"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrent_submissions_with_array_union() {
    let fixture = TestFixture::with_submission(SubmissionConfig {
        user_index: UserIndexMode::ArrayUnion,
        ..SubmissionConfig::default()
    })
    .await;

    let titles = ["A", "B", "C", "D"];
    let forms: Vec<_> = titles
        .iter()
        .map(|title| text_fields(title, "", "Medium"))
        .collect();
    let responses =
        futures::future::join_all(forms.iter().map(|parts| fixture.submit(parts))).await;

    let mut ids = Vec::new();
    for response in &responses {
        assert_status!(response, StatusCode::CREATED);
        ids.push(response.body["ticket"]["id"].as_str().unwrap().to_string());
    }

    let my_tickets = fixture.wait_for_my_tickets("u1", titles.len()).await;
    assert_eq!(my_tickets.len(), titles.len());
    for id in &ids {
        assert!(my_tickets.contains(id));
    }
}

#[tokio::test]
async fn test_submitted_ticket_is_readable_by_id() {
    let fixture = TestFixture::new().await;

    let created = fixture
        .submit(&text_fields("Search", "No results", "Feature request"))
        .await;
    assert_status!(created, StatusCode::CREATED);
    let ticket_id = created.body["ticket"]["id"].as_str().unwrap();

    let fetched = fixture
        .get_as("u1", &format!("/api/v1/tickets/{}", ticket_id))
        .await;
    assert_status!(fetched, StatusCode::OK);
    assert_eq!(fetched.body, created.body["ticket"]);

    let missing = fixture.get_as("u1", "/api/v1/tickets/no-such-ticket").await;
    assert_status!(missing, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_project_submits_with_empty_name() {
    let fixture = TestFixture::new().await;

    let project = fixture.get_as("u1", "/api/v1/projects/p404").await;
    assert_status!(project, StatusCode::OK);
    assert_eq!(project.body["projectId"], "p404");
    assert_eq!(project.body["projectName"], "");

    let response = fixture
        .post_multipart(
            "u1",
            "/api/v1/projects/p404/defects",
            &text_fields("Orphan", "", ""),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["ticket"]["project"]["projectName"], "");
    assert_eq!(response.body["ticket"]["priority"], "");
}

#[tokio::test]
async fn test_user_without_profile_is_forbidden() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_multipart(
            "stranger",
            "/api/v1/projects/p1/defects",
            &text_fields("Hi", "", "Low"),
        )
        .await;
    assert_status!(response, StatusCode::FORBIDDEN);
    assert_eq!(fixture.documents.count(Collection::Tickets).await, 0);

    let me = fixture.get("/api/v1/me").await;
    assert_status!(me, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let fixture = TestFixture::new().await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/projects/p1/defects")
        .header("X-User-Id", "u1")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from("{}"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(fixture.router.clone(), request)
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(fixture.documents.count(Collection::Tickets).await, 0);
}

#[tokio::test]
async fn test_metrics_count_submissions() {
    let fixture = TestFixture::new().await;

    let response = fixture.submit(&text_fields("Metrics", "", "Low")).await;
    assert_status!(response, StatusCode::CREATED);

    let metrics = fixture.get("/metrics").await;
    assert_status!(metrics, StatusCode::OK);
    let text = String::from_utf8(metrics.raw).unwrap();
    assert!(text.contains("bugtrail_submissions_total"));
    assert!(text.contains("bugtrail_http_requests_total"));
}
