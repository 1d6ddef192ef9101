use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::extraction::DocumentExtractor;
use super::fields::FieldMap;
use super::review::ExtractionReview;
use super::service::{IntakeService, IntakeServiceError, UploadId};
use super::upload::{CandidateFile, UploadError};

/// Headroom above the upload ceiling so oversized files reach the policy
/// check and get a descriptive rejection instead of a bare 413.
const BODY_LIMIT_SLACK: u64 = 1024 * 1024;

/// Router builder exposing the upload gate and field completeness checks.
pub fn intake_router<E>(service: Arc<IntakeService<E>>) -> Router
where
    E: DocumentExtractor + 'static,
{
    let body_limit = service
        .policy()
        .max_size_bytes()
        .saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .route("/api/v1/uploads", post(stage_handler::<E>))
        .route(
            "/api/v1/uploads/:upload_id/confirm",
            post(confirm_handler::<E>),
        )
        .route("/api/v1/uploads/:upload_id", delete(cancel_handler::<E>))
        .route("/api/v1/fields/completeness", post(completeness_handler))
        .layer(DefaultBodyLimit::max(
            usize::try_from(body_limit).unwrap_or(usize::MAX),
        ))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StageQuery {
    pub(crate) file_name: String,
}

pub(crate) async fn stage_handler<E>(
    State(service): State<Arc<IntakeService<E>>>,
    Query(query): Query<StageQuery>,
    body: Bytes,
) -> Response
where
    E: DocumentExtractor + 'static,
{
    let candidate = CandidateFile::new(query.file_name, body.to_vec());
    match service.stage(candidate) {
        Ok(staged) => (StatusCode::CREATED, Json(staged)).into_response(),
        Err(rejection) => {
            let payload = json!({ "error": rejection.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn confirm_handler<E>(
    State(service): State<Arc<IntakeService<E>>>,
    Path(upload_id): Path<String>,
) -> Response
where
    E: DocumentExtractor + 'static,
{
    let id = UploadId(upload_id);
    match service.confirm(&id).await {
        Ok(document) => (StatusCode::OK, Json(document)).into_response(),
        Err(
            err @ (IntakeServiceError::UnknownUpload(_)
            | IntakeServiceError::Upload(UploadError::NothingPending)),
        ) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(err @ (IntakeServiceError::InFlight(_) | IntakeServiceError::Cancelled(_))) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        Err(IntakeServiceError::Upload(UploadError::Extraction(err))) => {
            let payload = json!({
                "error": err.to_string(),
                "upload_id": id.0,
                "still_pending": true,
            });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn cancel_handler<E>(
    State(service): State<Arc<IntakeService<E>>>,
    Path(upload_id): Path<String>,
) -> Response
where
    E: DocumentExtractor + 'static,
{
    if service.cancel(&UploadId(upload_id.clone())) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        let payload = json!({ "error": format!("upload {upload_id} is not pending") });
        (StatusCode::NOT_FOUND, Json(payload)).into_response()
    }
}

pub(crate) async fn completeness_handler(Json(fields): Json<FieldMap>) -> Response {
    let review = ExtractionReview::new(fields);
    (StatusCode::OK, Json(review.status())).into_response()
}
