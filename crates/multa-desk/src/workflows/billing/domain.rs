use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::context::CompanyId;

/// Who a credit balance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    Client,
    Company,
}

impl OwnerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OwnerKind::Client => "client",
            OwnerKind::Company => "company",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: OwnerKind,
    pub id: String,
}

impl OwnerRef {
    pub fn client(id: impl Into<String>) -> Self {
        Self {
            kind: OwnerKind::Client,
            id: id.into(),
        }
    }

    pub fn company(id: impl Into<String>) -> Self {
        Self {
            kind: OwnerKind::Company,
            id: id.into(),
        }
    }
}

impl From<&CompanyId> for OwnerRef {
    fn from(company: &CompanyId) -> Self {
        Self::company(company.0.clone())
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// Read-only view of an owner's prepaid credits as reported by the balance
/// service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalanceSnapshot {
    pub owner: OwnerRef,
    pub current_balance: Decimal,
    pub total_purchased: Decimal,
    pub total_used: Decimal,
    pub transaction_count: u32,
}

impl CreditBalanceSnapshot {
    /// Snapshot for an owner that never bought credits.
    pub fn empty(owner: OwnerRef) -> Self {
        Self {
            owner,
            current_balance: Decimal::ZERO,
            total_purchased: Decimal::ZERO,
            total_used: Decimal::ZERO,
            transaction_count: 0,
        }
    }
}

/// Invoice lifecycle as reported by the gateway. Observed, never driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, InvoiceStatus::Paid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub service_id: String,
    pub customer: OwnerRef,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInvoice {
    pub reference: String,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pix_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_url: Option<String>,
    pub status: InvoiceStatus,
}

/// Confirmation of a prepaid debit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebitReceipt {
    pub owner: OwnerRef,
    pub service_id: String,
    pub amount: Decimal,
    pub remaining_balance: Decimal,
    pub paid_at: DateTime<Utc>,
}
