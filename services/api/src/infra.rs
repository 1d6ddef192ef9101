use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use multa_desk::boundary::ErrorBoundary;
use multa_desk::config::AppEnvironment;
use multa_desk::workflows::advertencia::{
    AdvertenciaService, DriverHistoryCheck, DriverHistoryLookup, TemplateStore,
};
use multa_desk::workflows::billing::{
    BalanceService, BillingService, CreditBalanceSnapshot, GatewayInvoice, InvoiceRequest,
    InvoiceStatus, OwnerRef, PaymentGateway,
};
use multa_desk::workflows::feedback::{FeedbackEntry, FeedbackService, FeedbackStore};
use multa_desk::workflows::intake::{
    keys, DocumentExtractor, FieldMap, IntakeService, PendingUpload, UploadPolicy,
};
use multa_desk::workflows::CollaboratorError;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Intake = IntakeService<SampleExtractor>;
pub(crate) type Advertencia = AdvertenciaService<InMemoryDriverHistory, InMemoryTemplates>;
pub(crate) type Billing = BillingService<InMemoryBalances, InMemoryGateway>;
pub(crate) type Feedback = FeedbackService<InMemoryFeedbackStore>;

/// Flow services wired to the in-memory collaborators.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) intake: Arc<Intake>,
    pub(crate) advertencia: Arc<Advertencia>,
    pub(crate) billing: Arc<Billing>,
    pub(crate) feedback: Arc<Feedback>,
    pub(crate) history: InMemoryDriverHistory,
    pub(crate) balances: Arc<InMemoryBalances>,
    pub(crate) feedback_store: Arc<InMemoryFeedbackStore>,
}

impl Services {
    pub(crate) fn in_memory(environment: AppEnvironment, uploads: UploadPolicy) -> Self {
        Self::with_templates(environment, uploads, InMemoryTemplates::default())
    }

    pub(crate) fn with_templates(
        environment: AppEnvironment,
        uploads: UploadPolicy,
        templates: InMemoryTemplates,
    ) -> Self {
        let history = InMemoryDriverHistory::default();
        let balances = Arc::new(InMemoryBalances::default());
        let feedback_store = Arc::new(InMemoryFeedbackStore::default());

        Self {
            intake: Arc::new(IntakeService::new(Arc::new(SampleExtractor), uploads)),
            advertencia: Arc::new(AdvertenciaService::new(
                Arc::new(history.clone()),
                Arc::new(templates),
                ErrorBoundary::new(environment),
            )),
            billing: Arc::new(BillingService::new(
                balances.clone(),
                Arc::new(InMemoryGateway::default()),
            )),
            feedback: Arc::new(FeedbackService::new(feedback_store.clone())),
            history,
            balances,
            feedback_store,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stand-in for the OCR service: every confirmed scan yields the same notice.
pub(crate) struct SampleExtractor;

pub(crate) fn sample_notice_fields() -> FieldMap {
    [
        (keys::NUMBER, "SP-2025-004417"),
        (keys::INFRACTION_CODE, "554-12"),
        (
            keys::INFRACTION,
            "Estacionar em local proibido pela sinalização",
        ),
        (keys::LOCATION, "Al. Santos, 745 - São Paulo/SP"),
        (keys::DATE, "18/02/2025"),
        (keys::VALUE, "195,23"),
        (keys::VEHICLE_PLATE, "QWE4R56"),
        (keys::DRIVER_NAME, "Ana Souza"),
        (keys::DRIVER_DOCUMENT_ID, "321.654.987-00"),
        (keys::ISSUING_AUTHORITY, "DSV/CET-SP"),
        (keys::POINTS, "5"),
    ]
    .into_iter()
    .collect()
}

#[async_trait]
impl DocumentExtractor for SampleExtractor {
    async fn extract(&self, _upload: &PendingUpload) -> Result<FieldMap, CollaboratorError> {
        Ok(sample_notice_fields())
    }
}

/// Violation counts keyed by driver id; unknown drivers have a clean record.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDriverHistory {
    violations: Arc<Mutex<HashMap<String, u32>>>,
}

impl InMemoryDriverHistory {
    pub(crate) fn record(&self, driver_id: impl Into<String>, violation_count: u32) {
        lock(&self.violations).insert(driver_id.into(), violation_count);
    }
}

#[async_trait]
impl DriverHistoryLookup for InMemoryDriverHistory {
    async fn check(&self, driver_id: &str) -> Result<DriverHistoryCheck, CollaboratorError> {
        let violation_count = lock(&self.violations)
            .get(driver_id)
            .copied()
            .unwrap_or_default();
        Ok(DriverHistoryCheck {
            violation_count,
            checked_at: Utc::now(),
        })
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryTemplates {
    templates: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryTemplates {
    pub(crate) fn insert(&self, key: impl Into<String>, text: impl Into<String>) {
        lock(&self.templates).insert(key.into(), text.into());
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplates {
    async fn template(&self, key: &str) -> Result<Option<String>, CollaboratorError> {
        Ok(lock(&self.templates).get(key).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBalances {
    snapshots: Arc<Mutex<HashMap<OwnerRef, CreditBalanceSnapshot>>>,
}

impl InMemoryBalances {
    /// Adds purchased credits to the owner's balance.
    pub(crate) fn top_up(&self, owner: OwnerRef, amount: Decimal) {
        let mut snapshots = lock(&self.snapshots);
        let snapshot = snapshots
            .entry(owner.clone())
            .or_insert_with(|| CreditBalanceSnapshot::empty(owner));
        snapshot.current_balance += amount;
        snapshot.total_purchased += amount;
        snapshot.transaction_count += 1;
    }
}

#[async_trait]
impl BalanceService for InMemoryBalances {
    async fn fetch(&self, owner: &OwnerRef) -> Result<CreditBalanceSnapshot, CollaboratorError> {
        Ok(lock(&self.snapshots)
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
        let mut snapshots = lock(&self.snapshots);
        let snapshot = snapshots
            .get_mut(owner)
            .ok_or_else(|| CollaboratorError::not_found("balances", owner.to_string()))?;
        if snapshot.current_balance < amount {
            return Err(CollaboratorError::rejected(
                "balances",
                format!("debit {amount} for {reference} exceeds balance"),
            ));
        }
        snapshot.current_balance -= amount;
        snapshot.total_used += amount;
        snapshot.transaction_count += 1;
        Ok(snapshot.clone())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryGateway {
    invoices: Arc<Mutex<Vec<GatewayInvoice>>>,
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn create_invoice(
        &self,
        request: &InvoiceRequest,
    ) -> Result<GatewayInvoice, CollaboratorError> {
        let mut invoices = lock(&self.invoices);
        let reference = format!("pay_{:06}", invoices.len() + 1);
        let invoice = GatewayInvoice {
            invoice_url: Some(format!("https://sandbox.gateway.local/i/{reference}")),
            pix_code: Some(format!(
                "00020126360014br.gov.bcb.pix0114{}5204000053039865406{}",
                request.customer.id, request.amount
            )),
            reference,
            amount: request.amount,
            status: InvoiceStatus::Pending,
        };
        invoices.push(invoice.clone());
        Ok(invoice)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryFeedbackStore {
    entries: Arc<Mutex<Vec<FeedbackEntry>>>,
}

impl InMemoryFeedbackStore {
    pub(crate) fn entries(&self) -> Vec<FeedbackEntry> {
        lock(&self.entries).clone()
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn insert(&self, entry: FeedbackEntry) -> Result<(), CollaboratorError> {
        lock(&self.entries).push(entry);
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
