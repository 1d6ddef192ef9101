use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::workflows::intake::extraction::DocumentExtractor;
use crate::workflows::intake::fields::{keys, FieldMap};
use crate::workflows::intake::upload::{CandidateFile, PendingUpload, UploadPolicy};
use crate::workflows::CollaboratorError;

pub(super) fn policy() -> UploadPolicy {
    UploadPolicy::default()
}

pub(super) fn scanned_pdf(size_bytes: usize) -> CandidateFile {
    CandidateFile::new("auto-infracao.pdf", vec![0x25; size_bytes])
}

pub(super) fn extracted_fields() -> FieldMap {
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

/// Extractor double that records how many files it received.
#[derive(Default)]
pub(super) struct RecordingExtractor {
    pub(super) calls: AtomicUsize,
    pub(super) received: Mutex<Vec<String>>,
}

impl RecordingExtractor {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentExtractor for RecordingExtractor {
    async fn extract(&self, upload: &PendingUpload) -> Result<FieldMap, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .expect("extractor mutex poisoned")
            .push(upload.file_name.clone());
        Ok(extracted_fields())
    }
}

pub(super) struct OfflineExtractor;

#[async_trait]
impl DocumentExtractor for OfflineExtractor {
    async fn extract(&self, _upload: &PendingUpload) -> Result<FieldMap, CollaboratorError> {
        Err(CollaboratorError::unavailable("extraction", "timeout"))
    }
}

/// Extractor that holds every call until `release` is notified, then fails.
#[derive(Default)]
pub(super) struct StalledExtractor {
    pub(super) started: Notify,
    pub(super) release: Notify,
}

#[async_trait]
impl DocumentExtractor for StalledExtractor {
    async fn extract(&self, _upload: &PendingUpload) -> Result<FieldMap, CollaboratorError> {
        self.started.notify_one();
        self.release.notified().await;
        Err(CollaboratorError::unavailable("extraction", "timeout"))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
