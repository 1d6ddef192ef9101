use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;

use crate::context::USER_ID_HEADER;
use crate::workflows::feedback::router::feedback_router;
use crate::workflows::feedback::service::FeedbackService;

fn feedback_request(user: Option<&str>, payload: Value) -> Request<Body> {
    let mut builder =
        Request::post("/api/v1/feedback").header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    builder
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

async fn status_for(store: &Arc<MemoryStore>, user: Option<&str>, payload: Value) -> StatusCode {
    let router = feedback_router(Arc::new(FeedbackService::new(store.clone())));
    router
        .oneshot(feedback_request(user, payload))
        .await
        .expect("response")
        .status()
}

#[tokio::test]
async fn created_for_valid_feedback() {
    let store = Arc::new(MemoryStore::default());
    let status = status_for(
        &store,
        Some("user-1"),
        json!({
            "resource_id": "doc-1",
            "rating": 5,
            "comment": "Ótimo",
            "aspects": { "clarity": 5, "legal_basis": 4 },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.entries().len(), 1);
}

#[tokio::test]
async fn unauthorized_without_user_header() {
    let store = Arc::new(MemoryStore::default());
    let status = status_for(&store, None, json!({ "resource_id": "doc-1", "rating": 5 })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unprocessable_without_rating() {
    let store = Arc::new(MemoryStore::default());
    let status = status_for(&store, Some("user-1"), json!({ "resource_id": "doc-1" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(store.entries().is_empty());
}
