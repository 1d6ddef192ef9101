use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::service::{
    resolver_for, BalanceService, BillingError, BillingService, PaymentGateway, SettlementRequest,
};
use crate::context::SessionContext;

/// Router builder exposing balances, method resolution and settlement.
pub fn billing_router<B, G>(service: Arc<BillingService<B, G>>) -> Router
where
    B: BalanceService + 'static,
    G: PaymentGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/billing/balances/:client_id",
            get(balances_handler::<B, G>),
        )
        .route("/api/v1/billing/resolve", post(resolve_handler))
        .route("/api/v1/billing/settle", post(settle_handler::<B, G>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolveRequest {
    pub(crate) prepaid_balance: Decimal,
    pub(crate) service_cost: Decimal,
    pub(crate) service_amount: Decimal,
}

pub(crate) async fn balances_handler<B, G>(
    State(service): State<Arc<BillingService<B, G>>>,
    ctx: SessionContext,
    Path(client_id): Path<String>,
) -> Response
where
    B: BalanceService + 'static,
    G: PaymentGateway + 'static,
{
    match service.balances(&ctx, &client_id).await {
        Ok(balances) => (StatusCode::OK, Json(balances)).into_response(),
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn resolve_handler(Json(request): Json<ResolveRequest>) -> Response {
    match resolver_for(
        request.prepaid_balance,
        request.service_cost,
        request.service_amount,
    ) {
        Ok(resolver) => (StatusCode::OK, Json(resolver.decision())).into_response(),
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn settle_handler<B, G>(
    State(service): State<Arc<BillingService<B, G>>>,
    ctx: SessionContext,
    Json(request): Json<SettlementRequest>,
) -> Response
where
    B: BalanceService + 'static,
    G: PaymentGateway + 'static,
{
    match service.settle(&ctx, &request).await {
        Ok(settlement) => (StatusCode::OK, Json(settlement)).into_response(),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &BillingError) -> Response {
    let status = match err {
        BillingError::Unauthenticated => StatusCode::UNAUTHORIZED,
        BillingError::NegativeAmount { .. } | BillingError::InsufficientBalance { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        BillingError::Collaborator(_) => StatusCode::BAD_GATEWAY,
    };

    let mut payload = json!({
        "error": err.to_string(),
        "notice": err.notice(),
    });
    if let BillingError::InsufficientBalance { shortfall } = err {
        payload["shortfall"] = json!(shortfall);
    }
    (status, Json(payload)).into_response()
}
