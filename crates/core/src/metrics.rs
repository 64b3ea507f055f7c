//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Submissions (outcomes, duration, ticket priorities)
//! - Image uploads (bytes, rejections)
//! - Reporter ticket index writes

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Submission Metrics
// =============================================================================

/// Submissions total by result.
pub static SUBMISSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bugtrail_submissions_total", "Total defect submissions"),
        &["result"], // "created", "upload_failed", "write_failed"
    )
    .unwrap()
});

/// Submission duration in seconds, from id generation to outcome.
pub static SUBMISSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bugtrail_submission_duration_seconds",
            "Duration of a defect submission",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["result"],
    )
    .unwrap()
});

/// Created tickets by priority. Unrecognised labels share one bucket.
pub static TICKETS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bugtrail_tickets_created_total", "Tickets created"),
        &["priority"], // a known level, "unset" or "other"
    )
    .unwrap()
});

// =============================================================================
// Image Metrics
// =============================================================================

/// Bytes of image data stored.
pub static IMAGE_UPLOAD_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "bugtrail_image_upload_bytes_total",
        "Total bytes of attached images stored",
    )
    .unwrap()
});

/// Images dropped for exceeding the size limit.
pub static IMAGES_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "bugtrail_images_rejected_total",
        "Attached images dropped for exceeding the size limit",
    )
    .unwrap()
});

// =============================================================================
// User Index Metrics
// =============================================================================

/// Reporter ticket index writes by mode and status.
pub static USER_INDEX_WRITES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bugtrail_user_index_writes_total",
            "Writes to the reporter's ticket index",
        ),
        &["mode", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SUBMISSIONS_TOTAL.clone()),
        Box::new(SUBMISSION_DURATION.clone()),
        Box::new(TICKETS_CREATED.clone()),
        Box::new(IMAGE_UPLOAD_BYTES.clone()),
        Box::new(IMAGES_REJECTED.clone()),
        Box::new(USER_INDEX_WRITES.clone()),
    ]
}
