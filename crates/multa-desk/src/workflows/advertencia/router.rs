use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::draft::{DraftError, GeneratedDocument, TemplateSource};
use super::eligibility::EligibilityGate;
use super::history::{DriverHistoryLookup, TemplateStore, WarningEligibilityResult};
use super::service::{AdvertenciaService, DraftOutcome};
use crate::notice::Notice;
use crate::workflows::intake::{ExtractionReview, FieldMap};

/// Router builder exposing eligibility, drafting and export endpoints.
pub fn advertencia_router<H, T>(service: Arc<AdvertenciaService<H, T>>) -> Router
where
    H: DriverHistoryLookup + 'static,
    T: TemplateStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/advertencia/eligibility",
            post(eligibility_handler::<H, T>),
        )
        .route("/api/v1/advertencia/draft", post(draft_handler::<H, T>))
        .route("/api/v1/advertencia/export", post(export_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct EligibilityRequest {
    #[serde(default)]
    pub(crate) had_violations: Option<bool>,
    #[serde(default)]
    pub(crate) driver_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DraftRequest {
    pub(crate) fields: FieldMap,
    #[serde(default)]
    pub(crate) had_violations: Option<bool>,
    #[serde(default)]
    pub(crate) eligibility: Option<WarningEligibilityResult>,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportRequest {
    pub(crate) document_number: String,
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn eligibility_handler<H, T>(
    State(service): State<Arc<AdvertenciaService<H, T>>>,
    Json(request): Json<EligibilityRequest>,
) -> Response
where
    H: DriverHistoryLookup + 'static,
    T: TemplateStore + 'static,
{
    let suggestion = match request.driver_id.as_deref().map(str::trim) {
        Some(driver_id) if !driver_id.is_empty() => match service.suggest(driver_id).await {
            Ok(suggestion) => Some(suggestion),
            Err(err) => {
                let payload = json!({
                    "error": err.to_string(),
                    "notice": Notice::error("Consulta ao histórico do condutor indisponível."),
                });
                return (StatusCode::BAD_GATEWAY, Json(payload)).into_response();
            }
        },
        _ => None,
    };

    let mut gate = EligibilityGate::new();
    let route = request
        .had_violations
        .map(|had_violations| gate.answer(had_violations));

    let payload = json!({
        "resolved": gate.is_resolved(),
        "route": route,
        "suggestion": suggestion,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn draft_handler<H, T>(
    State(service): State<Arc<AdvertenciaService<H, T>>>,
    Json(request): Json<DraftRequest>,
) -> Response
where
    H: DriverHistoryLookup + 'static,
    T: TemplateStore + 'static,
{
    let DraftRequest {
        fields,
        had_violations,
        eligibility,
        today,
    } = request;

    let mut gate = EligibilityGate::new();
    if let Some(had_violations) = had_violations {
        gate.answer(had_violations);
    }
    let review = ExtractionReview::new(fields);
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    match service
        .draft(&gate, &review, eligibility.as_ref(), today)
        .await
    {
        Ok(outcome @ DraftOutcome::Drafted { .. }) => {
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Ok(outcome @ DraftOutcome::Recovered { .. }) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(outcome)).into_response()
        }
        Err(err) => {
            let status = match &err {
                DraftError::TemplateStore(_) => StatusCode::BAD_GATEWAY,
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

pub(crate) async fn export_handler(Json(request): Json<ExportRequest>) -> Response {
    let ExportRequest {
        document_number,
        text,
        today,
    } = request;

    let mut document =
        GeneratedDocument::new(document_number, String::new(), TemplateSource::Fallback);
    document.edit(text);
    let file = document.export(today.unwrap_or_else(|| Local::now().date_naive()));

    let disposition =
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file.file_name))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let content_type = HeaderValue::from_str(file.content_type.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("text/plain; charset=utf-8"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}
