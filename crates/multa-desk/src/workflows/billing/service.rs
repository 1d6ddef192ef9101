use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    CreditBalanceSnapshot, DebitReceipt, GatewayInvoice, InvoiceRequest, OwnerRef,
};
use super::resolver::{PaymentInstruction, PaymentMethod, PaymentMethodResolver};
use crate::context::SessionContext;
use crate::notice::Notice;
use crate::workflows::CollaboratorError;

#[async_trait]
pub trait BalanceService: Send + Sync {
    async fn fetch(&self, owner: &OwnerRef) -> Result<CreditBalanceSnapshot, CollaboratorError>;

    /// Debits `amount` and returns the balance after the debit.
    async fn debit(
        &self,
        owner: &OwnerRef,
        amount: Decimal,
        reference: &str,
    ) -> Result<CreditBalanceSnapshot, CollaboratorError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_invoice(
        &self,
        request: &InvoiceRequest,
    ) -> Result<GatewayInvoice, CollaboratorError>;
}

/// Client balance plus, when the session acts for a company, the company's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerBalances {
    pub client: CreditBalanceSnapshot,
    pub company: Option<CreditBalanceSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub service_id: String,
    pub payer: OwnerRef,
    pub method: PaymentMethod,
    pub service_cost: Decimal,
    pub service_amount: Decimal,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Settlement {
    Prepaid { receipt: DebitReceipt },
    Gateway { invoice: GatewayInvoice },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BillingError {
    #[error("a signed-in user is required")]
    Unauthenticated,
    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },
    #[error("prepaid balance is short by {shortfall}")]
    InsufficientBalance { shortfall: Decimal },
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl BillingError {
    pub fn notice(&self) -> Notice {
        match self {
            BillingError::Unauthenticated => Notice::error("Faça login para continuar."),
            BillingError::NegativeAmount { .. } => {
                Notice::error("Valores não podem ser negativos.")
            }
            BillingError::InsufficientBalance { shortfall } => Notice::warning(format!(
                "Saldo pré-pago insuficiente: faltam R$ {shortfall}."
            )),
            BillingError::Collaborator(_) => {
                Notice::error("Serviço de pagamento indisponível. Tente novamente.")
            }
        }
    }
}

/// Rejects negative cost or amount before a resolver is built.
pub fn resolver_for(
    prepaid_balance: Decimal,
    service_cost: Decimal,
    service_amount: Decimal,
) -> Result<PaymentMethodResolver, BillingError> {
    if service_cost < Decimal::ZERO {
        return Err(BillingError::NegativeAmount {
            field: "service_cost",
        });
    }
    if service_amount < Decimal::ZERO {
        return Err(BillingError::NegativeAmount {
            field: "service_amount",
        });
    }
    Ok(PaymentMethodResolver::new(
        prepaid_balance,
        service_cost,
        service_amount,
    ))
}

/// Executes payment decisions against the balance service and gateway.
pub struct BillingService<B, G> {
    balances: Arc<B>,
    gateway: Arc<G>,
}

impl<B, G> BillingService<B, G>
where
    B: BalanceService + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(balances: Arc<B>, gateway: Arc<G>) -> Self {
        Self { balances, gateway }
    }

    /// Fetches the client and company snapshots together.
    pub async fn balances(
        &self,
        ctx: &SessionContext,
        client_id: &str,
    ) -> Result<OwnerBalances, BillingError> {
        let client_owner = OwnerRef::client(client_id);
        let company_owner = ctx.company().map(OwnerRef::from);

        let (client, company) = tokio::join!(self.balances.fetch(&client_owner), async {
            match &company_owner {
                Some(owner) => self.balances.fetch(owner).await.map(Some),
                None => Ok(None),
            }
        });

        Ok(OwnerBalances {
            client: client?,
            company: company?,
        })
    }

    pub async fn settle(
        &self,
        ctx: &SessionContext,
        request: &SettlementRequest,
    ) -> Result<Settlement, BillingError> {
        if ctx.user().is_none() {
            return Err(BillingError::Unauthenticated);
        }

        match request.method {
            PaymentMethod::Prepaid => self.settle_prepaid(request).await,
            PaymentMethod::Gateway => {
                let resolver =
                    resolver_for(Decimal::ZERO, request.service_cost, request.service_amount)?;
                self.settle_gateway(request, resolver.select_gateway()).await
            }
        }
    }

    async fn settle_prepaid(
        &self,
        request: &SettlementRequest,
    ) -> Result<Settlement, BillingError> {
        let snapshot = self.balances.fetch(&request.payer).await?;
        let resolver = resolver_for(
            snapshot.current_balance,
            request.service_cost,
            request.service_amount,
        )?;

        let Some(PaymentInstruction::Prepaid { debit }) = resolver.select_prepaid() else {
            let shortfall = resolver.shortfall().unwrap_or_default();
            warn!(payer = %request.payer, %shortfall, "prepaid payment blocked");
            return Err(BillingError::InsufficientBalance { shortfall });
        };

        let after = self
            .balances
            .debit(&request.payer, debit, &request.service_id)
            .await?;
        info!(
            payer = %request.payer,
            service_id = %request.service_id,
            %debit,
            remaining = %after.current_balance,
            "service paid from prepaid credits"
        );

        Ok(Settlement::Prepaid {
            receipt: DebitReceipt {
                owner: request.payer.clone(),
                service_id: request.service_id.clone(),
                amount: debit,
                remaining_balance: after.current_balance,
                paid_at: Utc::now(),
            },
        })
    }

    async fn settle_gateway(
        &self,
        request: &SettlementRequest,
        instruction: PaymentInstruction,
    ) -> Result<Settlement, BillingError> {
        let invoice_request = InvoiceRequest {
            service_id: request.service_id.clone(),
            customer: request.payer.clone(),
            amount: instruction.amount(),
            description: request.description.clone(),
        };

        let invoice = self.gateway.create_invoice(&invoice_request).await?;
        info!(
            payer = %request.payer,
            service_id = %request.service_id,
            reference = %invoice.reference,
            status = ?invoice.status,
            "gateway invoice created"
        );
        Ok(Settlement::Gateway { invoice })
    }
}
