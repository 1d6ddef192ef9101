use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ways a service can be paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Debit from prepaid credits; the service is paid immediately.
    Prepaid,
    /// External invoice (PIX/boleto) reconciled by the gateway.
    #[serde(alias = "asaas")]
    Gateway,
}

/// What the caller must do once a method is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentInstruction {
    /// Debit `debit` from the balance and mark the service paid.
    Prepaid { debit: Decimal },
    /// Issue an invoice for `invoice_amount` through the gateway.
    Gateway { invoice_amount: Decimal },
}

impl PaymentInstruction {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentInstruction::Prepaid { .. } => PaymentMethod::Prepaid,
            PaymentInstruction::Gateway { .. } => PaymentMethod::Gateway,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            PaymentInstruction::Prepaid { debit } => *debit,
            PaymentInstruction::Gateway { invoice_amount } => *invoice_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethodDecision {
    pub prepaid_balance: Decimal,
    pub service_cost: Decimal,
    pub service_amount: Decimal,
    pub has_sufficient_balance: bool,
    /// Display only; may be negative.
    pub projected_balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<Decimal>,
    pub available_methods: Vec<PaymentMethod>,
}

/// Chooses between prepaid credits and a gateway invoice.
///
/// `service_cost` is what the office pays out of its credits; `service_amount`
/// is what the end customer is invoiced. The two are never interchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentMethodResolver {
    prepaid_balance: Decimal,
    service_cost: Decimal,
    service_amount: Decimal,
}

impl PaymentMethodResolver {
    pub fn new(prepaid_balance: Decimal, service_cost: Decimal, service_amount: Decimal) -> Self {
        Self {
            prepaid_balance,
            service_cost,
            service_amount,
        }
    }

    pub fn has_sufficient_balance(&self) -> bool {
        self.prepaid_balance >= self.service_cost
    }

    pub fn projected_balance(&self) -> Decimal {
        self.prepaid_balance - self.service_cost
    }

    /// Credits missing to pay by prepaid; `None` when the balance covers the cost.
    pub fn shortfall(&self) -> Option<Decimal> {
        (!self.has_sufficient_balance()).then(|| self.service_cost - self.prepaid_balance)
    }

    /// `None` when the balance does not cover the cost.
    pub fn select_prepaid(&self) -> Option<PaymentInstruction> {
        self.has_sufficient_balance().then_some(PaymentInstruction::Prepaid {
            debit: self.service_cost,
        })
    }

    pub fn select_gateway(&self) -> PaymentInstruction {
        PaymentInstruction::Gateway {
            invoice_amount: self.service_amount,
        }
    }

    pub fn select(&self, method: PaymentMethod) -> Option<PaymentInstruction> {
        match method {
            PaymentMethod::Prepaid => self.select_prepaid(),
            PaymentMethod::Gateway => Some(self.select_gateway()),
        }
    }

    pub fn decision(&self) -> PaymentMethodDecision {
        let mut available_methods = Vec::with_capacity(2);
        if self.has_sufficient_balance() {
            available_methods.push(PaymentMethod::Prepaid);
        }
        available_methods.push(PaymentMethod::Gateway);

        PaymentMethodDecision {
            prepaid_balance: self.prepaid_balance,
            service_cost: self.service_cost,
            service_amount: self.service_amount,
            has_sufficient_balance: self.has_sufficient_balance(),
            projected_balance: self.projected_balance(),
            shortfall: self.shortfall(),
            available_methods,
        }
    }
}
