use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::boundary::ErrorBoundary;
use crate::config::AppEnvironment;
use crate::workflows::advertencia::history::{
    DriverHistoryCheck, DriverHistoryLookup, TemplateStore,
};
use crate::workflows::advertencia::service::AdvertenciaService;
use crate::workflows::intake::fields::{keys, FieldMap};
use crate::workflows::CollaboratorError;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 20).expect("valid date")
}

pub(super) fn notice_fields() -> FieldMap {
    [
        (keys::NUMBER, "AB-12345678"),
        (keys::INFRACTION_CODE, "745-50"),
        (keys::INFRACTION, "Transitar em velocidade superior à máxima permitida em até 20%"),
        (keys::LOCATION, "Av. Paulista, 1000 - São Paulo/SP"),
        (keys::DATE, "12/03/2025"),
        (keys::VALUE, "130,16"),
        (keys::VEHICLE_PLATE, "ABC1D23"),
        (keys::DRIVER_NAME, "Maria da Silva"),
        (keys::DRIVER_DOCUMENT_ID, "123.456.789-00"),
        (keys::ISSUING_AUTHORITY, "DETRAN-SP"),
    ]
    .into_iter()
    .collect()
}

/// History double returning a fixed violation count.
pub(super) struct FixedHistory {
    pub(super) violation_count: u32,
}

#[async_trait]
impl DriverHistoryLookup for FixedHistory {
    async fn check(&self, _driver_id: &str) -> Result<DriverHistoryCheck, CollaboratorError> {
        Ok(DriverHistoryCheck {
            violation_count: self.violation_count,
            checked_at: Utc
                .with_ymd_and_hms(2025, 6, 20, 9, 0, 0)
                .single()
                .expect("valid timestamp"),
        })
    }
}

pub(super) struct OfflineHistory;

#[async_trait]
impl DriverHistoryLookup for OfflineHistory {
    async fn check(&self, _driver_id: &str) -> Result<DriverHistoryCheck, CollaboratorError> {
        Err(CollaboratorError::unavailable("driver_history", "timeout"))
    }
}

/// Template store double that counts lookups.
#[derive(Default)]
pub(super) struct StoredTemplates {
    pub(super) text: Option<String>,
    pub(super) offline: bool,
    pub(super) lookups: AtomicUsize,
}

impl StoredTemplates {
    pub(super) fn empty() -> Self {
        Self::default()
    }

    pub(super) fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub(super) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub(super) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TemplateStore for StoredTemplates {
    async fn template(&self, _key: &str) -> Result<Option<String>, CollaboratorError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(CollaboratorError::unavailable("templates", "connection reset"));
        }
        Ok(self.text.clone())
    }
}

pub(super) fn service<H, T>(history: H, templates: T) -> Arc<AdvertenciaService<H, T>>
where
    H: DriverHistoryLookup + 'static,
    T: TemplateStore + 'static,
{
    Arc::new(AdvertenciaService::new(
        Arc::new(history),
        Arc::new(templates),
        ErrorBoundary::new(AppEnvironment::Test),
    ))
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json payload")
}
