use super::common::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::context::{COMPANY_ID_HEADER, USER_ID_HEADER};
use crate::workflows::billing::domain::OwnerRef;
use crate::workflows::billing::router::billing_router;

fn json_request(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .header(USER_ID_HEADER, "user-1")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn resolve_reports_projection_for_covered_cost() {
    let (service, _, _) = billing(LedgerBalances::default());
    let response = billing_router(service)
        .oneshot(json_request(
            "/api/v1/billing/resolve",
            json!({ "prepaid_balance": "100.00", "service_cost": "35.00", "service_amount": "150.00" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["has_sufficient_balance"], json!(true));
    assert_eq!(body["projected_balance"], json!("65.00"));
    assert_eq!(body["available_methods"], json!(["prepaid", "gateway"]));
}

#[tokio::test]
async fn resolve_reports_shortfall() {
    let (service, _, _) = billing(LedgerBalances::default());
    let response = billing_router(service)
        .oneshot(json_request(
            "/api/v1/billing/resolve",
            json!({ "prepaid_balance": "20.00", "service_cost": "35.00", "service_amount": "150.00" }),
        ))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["has_sufficient_balance"], json!(false));
    assert_eq!(body["shortfall"], json!("15.00"));
    assert_eq!(body["available_methods"], json!(["gateway"]));
}

#[tokio::test]
async fn balances_use_the_session_company() {
    let (service, _, _) = billing(LedgerBalances::with(vec![
        snapshot(OwnerRef::client("cli-1"), dec!(5)),
        snapshot(OwnerRef::company("escritorio-9"), dec!(80)),
    ]));

    let response = billing_router(service)
        .oneshot(
            Request::get("/api/v1/billing/balances/cli-1")
                .header(USER_ID_HEADER, "user-1")
                .header(COMPANY_ID_HEADER, "escritorio-9")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["client"]["owner"]["id"], json!("cli-1"));
    assert_eq!(body["company"]["owner"]["kind"], json!("company"));
}

#[tokio::test]
async fn short_prepaid_settlement_is_unprocessable() {
    let (service, _, _) = billing(LedgerBalances::with(vec![snapshot(
        OwnerRef::company("escritorio-9"),
        dec!(20.00),
    )]));

    let response = billing_router(service)
        .oneshot(json_request(
            "/api/v1/billing/settle",
            json!({
                "service_id": "svc-301",
                "payer": { "kind": "company", "id": "escritorio-9" },
                "method": "prepaid",
                "service_cost": "35.00",
                "service_amount": "150.00",
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["shortfall"], json!("15.00"));
    assert_eq!(body["notice"]["level"], json!("warning"));
}

#[tokio::test]
async fn asaas_alias_settles_through_the_gateway() {
    let (service, _, gateway) = billing(LedgerBalances::default());

    let response = billing_router(service)
        .oneshot(json_request(
            "/api/v1/billing/settle",
            json!({
                "service_id": "svc-302",
                "payer": { "kind": "client", "id": "cli-1" },
                "method": "asaas",
                "service_cost": "35.00",
                "service_amount": "150.00",
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["method"], json!("gateway"));
    assert_eq!(body["invoice"]["status"], json!("pending"));
    assert_eq!(gateway.requests().len(), 1);
}
