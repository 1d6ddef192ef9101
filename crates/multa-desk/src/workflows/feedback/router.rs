use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::domain::{FeedbackError, FeedbackSubmission};
use super::service::{FeedbackService, FeedbackStore};
use crate::context::SessionContext;
use crate::notice::Notice;

pub fn feedback_router<S>(service: Arc<FeedbackService<S>>) -> Router
where
    S: FeedbackStore + 'static,
{
    Router::new()
        .route("/api/v1/feedback", post(submit_handler::<S>))
        .with_state(service)
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<FeedbackService<S>>>,
    ctx: SessionContext,
    Json(submission): Json<FeedbackSubmission>,
) -> Response
where
    S: FeedbackStore + 'static,
{
    match service.submit(&ctx, submission).await {
        Ok(entry) => {
            let payload = json!({
                "feedback": entry,
                "notice": Notice::success("Obrigado pela sua avaliação!"),
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => {
            let status = match &err {
                FeedbackError::Unauthenticated => StatusCode::UNAUTHORIZED,
                FeedbackError::Store(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            let payload = json!({
                "error": err.to_string(),
                "notice": err.notice(),
            });
            (status, Json(payload)).into_response()
        }
    }
}
