//! Payment method resolution between prepaid credits and gateway invoices,
//! and execution of the chosen method.

pub mod domain;
pub mod resolver;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CreditBalanceSnapshot, DebitReceipt, GatewayInvoice, InvoiceRequest, InvoiceStatus,
    OwnerKind, OwnerRef,
};
pub use resolver::{
    PaymentInstruction, PaymentMethod, PaymentMethodDecision, PaymentMethodResolver,
};
pub use router::billing_router;
pub use service::{
    resolver_for, BalanceService, BillingError, BillingService, OwnerBalances, PaymentGateway,
    Settlement, SettlementRequest,
};
