use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::workflows::billing::domain::{
    CreditBalanceSnapshot, GatewayInvoice, InvoiceRequest, InvoiceStatus, OwnerKind, OwnerRef,
};
use crate::workflows::billing::service::{BalanceService, BillingService, PaymentGateway};
use crate::workflows::CollaboratorError;

pub(super) fn snapshot(owner: OwnerRef, balance: Decimal) -> CreditBalanceSnapshot {
    CreditBalanceSnapshot {
        current_balance: balance,
        total_purchased: balance,
        ..CreditBalanceSnapshot::empty(owner)
    }
}

/// Balance service double keyed by owner; records every debit.
#[derive(Default)]
pub(super) struct LedgerBalances {
    pub(super) snapshots: Mutex<HashMap<OwnerRef, CreditBalanceSnapshot>>,
    pub(super) debits: Mutex<Vec<(OwnerRef, Decimal, String)>>,
    pub(super) offline_kind: Option<OwnerKind>,
}

impl LedgerBalances {
    pub(super) fn with(snapshots: Vec<CreditBalanceSnapshot>) -> Self {
        Self {
            snapshots: Mutex::new(
                snapshots
                    .into_iter()
                    .map(|snapshot| (snapshot.owner.clone(), snapshot))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub(super) fn debits(&self) -> Vec<(OwnerRef, Decimal, String)> {
        self.debits.lock().expect("debits mutex").clone()
    }
}

#[async_trait]
impl BalanceService for LedgerBalances {
    async fn fetch(&self, owner: &OwnerRef) -> Result<CreditBalanceSnapshot, CollaboratorError> {
        if self.offline_kind == Some(owner.kind) {
            return Err(CollaboratorError::unavailable("balances", "timeout"));
        }
        Ok(self
            .snapshots
            .lock()
            .expect("snapshots mutex")
            .get(owner)
            .cloned()
            .unwrap_or_else(|| CreditBalanceSnapshot::empty(owner.clone())))
    }

    async fn debit(
        &self,
        owner: &OwnerRef,
        amount: Decimal,
        reference: &str,
    ) -> Result<CreditBalanceSnapshot, CollaboratorError> {
        self.debits
            .lock()
            .expect("debits mutex")
            .push((owner.clone(), amount, reference.to_string()));
        let mut snapshots = self.snapshots.lock().expect("snapshots mutex");
        let entry = snapshots
            .entry(owner.clone())
            .or_insert_with(|| CreditBalanceSnapshot::empty(owner.clone()));
        entry.current_balance -= amount;
        entry.total_used += amount;
        entry.transaction_count += 1;
        Ok(entry.clone())
    }
}

/// Gateway double that records invoice requests.
#[derive(Default)]
pub(super) struct RecordingGateway {
    pub(super) requests: Mutex<Vec<InvoiceRequest>>,
}

impl RecordingGateway {
    pub(super) fn requests(&self) -> Vec<InvoiceRequest> {
        self.requests.lock().expect("gateway mutex").clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_invoice(
        &self,
        request: &InvoiceRequest,
    ) -> Result<GatewayInvoice, CollaboratorError> {
        let mut requests = self.requests.lock().expect("gateway mutex");
        requests.push(request.clone());
        Ok(GatewayInvoice {
            reference: format!("pay_{:04}", requests.len()),
            amount: request.amount,
            pix_code: Some("00020126580014br.gov.bcb.pix".to_string()),
            invoice_url: Some("https://pagamentos.example/i/1".to_string()),
            status: InvoiceStatus::Pending,
        })
    }
}

pub(super) fn billing(
    balances: LedgerBalances,
) -> (
    Arc<BillingService<LedgerBalances, RecordingGateway>>,
    Arc<LedgerBalances>,
    Arc<RecordingGateway>,
) {
    let balances = Arc::new(balances);
    let gateway = Arc::new(RecordingGateway::default());
    let service = Arc::new(BillingService::new(balances.clone(), gateway.clone()));
    (service, balances, gateway)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
