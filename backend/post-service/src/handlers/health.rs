/// Health check handlers
use crate::db::PostRepository;
use crate::services::PostService;
use crate::storage::BlobStore;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Stores probed by the readiness check
#[derive(Clone)]
pub struct HealthState {
    posts: Arc<dyn PostRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl HealthState {
    pub fn new(posts: Arc<dyn PostRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { posts, blobs }
    }
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

fn component_check(result: crate::Result<()>, started: Instant, ok_message: &str) -> ComponentCheck {
    let latency_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: ok_message.to_string(),
            latency_ms,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: e.to_string(),
            latency_ms,
        },
    }
}

/// Overall service health
pub async fn health_summary(service: web::Data<PostService>) -> HttpResponse {
    match service.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "post-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "error": e.to_string(),
                "service": "post-service"
            }))
        }
    }
}

/// Per-store readiness with latencies
pub async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let record_store = state.posts.health_check().await;
    checks.insert(
        "record_store".to_string(),
        component_check(record_store, start, "Record store reachable"),
    );

    let start = Instant::now();
    let blob_store = state.blobs.health_check().await;
    checks.insert(
        "blob_store".to_string(),
        component_check(blob_store, start, "Blob store reachable"),
    );

    let ready = checks
        .values()
        .all(|check| matches!(check.status, ComponentStatus::Healthy));

    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
