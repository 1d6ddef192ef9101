use super::common::*;
use crate::workflows::intake::service::{IntakeService, IntakeServiceError, UploadId};
use crate::workflows::intake::upload::{
    CandidateFile, UploadError, UploadGate, UploadPolicy, UploadRejection,
};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

const MB: usize = 1024 * 1024;

#[test]
fn oversized_file_is_rejected_before_confirmation() {
    let mut gate = UploadGate::new(policy());

    match gate.stage(scanned_pdf(12 * MB)) {
        Err(UploadRejection::TooLarge { size_bytes, max_mb }) => {
            assert_eq!(size_bytes, (12 * MB) as u64);
            assert_eq!(max_mb, 10);
        }
        other => panic!("expected size rejection, got {other:?}"),
    }
    assert!(gate.pending().is_none());
}

#[test]
fn file_exactly_at_limit_is_accepted() {
    let mut gate = UploadGate::new(policy());
    let pending = gate.stage(scanned_pdf(10 * MB)).expect("at limit");
    assert_eq!(pending.size_bytes(), (10 * MB) as u64);
}

#[test]
fn extension_check_is_case_insensitive() {
    let mut gate = UploadGate::new(policy());
    let pending = gate
        .stage(CandidateFile::new("FOTO.JPG", vec![1, 2, 3]))
        .expect("uppercase jpg accepted");
    assert_eq!(pending.content_type, mime::IMAGE_JPEG);
}

#[test]
fn disallowed_and_missing_extensions_are_rejected() {
    let mut gate = UploadGate::new(policy());

    match gate.stage(CandidateFile::new("multa.docx", vec![1])) {
        Err(UploadRejection::ExtensionNotAllowed { extension, .. }) => {
            assert_eq!(extension, "docx")
        }
        other => panic!("expected extension rejection, got {other:?}"),
    }

    assert!(matches!(
        gate.stage(CandidateFile::new("multa", vec![1])),
        Err(UploadRejection::MissingExtension { .. })
    ));
    assert!(matches!(
        gate.stage(CandidateFile::new(".pdf", vec![1])),
        Err(UploadRejection::MissingExtension { .. })
    ));
}

#[test]
fn empty_files_are_rejected() {
    let mut gate = UploadGate::new(policy());
    assert!(matches!(
        gate.stage(scanned_pdf(0)),
        Err(UploadRejection::Empty { .. })
    ));
}

#[test]
fn rejection_keeps_previously_pending_file() {
    let mut gate = UploadGate::new(policy());
    gate.stage(scanned_pdf(10)).expect("first file staged");
    gate.stage(CandidateFile::new("planilha.xlsx", vec![1]))
        .expect_err("second file rejected");

    let pending = gate.pending().expect("first file still pending");
    assert_eq!(pending.file_name, "auto-infracao.pdf");
}

#[test]
fn cancel_discards_without_calling_extractor() {
    let mut gate = UploadGate::new(policy());
    gate.stage(scanned_pdf(10)).expect("staged");
    assert!(gate.cancel());
    assert!(!gate.cancel());
    assert!(gate.pending().is_none());
}

#[tokio::test]
async fn confirm_forwards_pending_file_once() {
    let extractor = RecordingExtractor::default();
    let mut gate = UploadGate::new(policy());
    gate.stage(scanned_pdf(10)).expect("staged");

    let fields = gate.confirm(&extractor).await.expect("extraction");
    assert_eq!(fields, extracted_fields());
    assert_eq!(extractor.calls(), 1);
    assert!(gate.pending().is_none());

    match gate.confirm(&extractor).await {
        Err(UploadError::NothingPending) => {}
        other => panic!("expected nothing pending, got {other:?}"),
    }
    assert_eq!(extractor.calls(), 1);
}

#[tokio::test]
async fn failed_extraction_keeps_file_pending() {
    let mut gate = UploadGate::new(policy());
    gate.stage(scanned_pdf(10)).expect("staged");

    let err = gate.confirm(&OfflineExtractor).await.expect_err("offline");
    assert!(matches!(err, UploadError::Extraction(_)));
    assert!(gate.pending().is_some());
}

#[tokio::test]
async fn service_tracks_uploads_independently() {
    let extractor = Arc::new(RecordingExtractor::default());
    let service = IntakeService::new(extractor.clone(), UploadPolicy::default());

    let first = service.stage(scanned_pdf(10)).expect("first");
    let second = service
        .stage(CandidateFile::new("verso.png", vec![7; 32]))
        .expect("second");
    assert_ne!(first.upload_id, second.upload_id);
    assert_eq!(second.file.content_type, "image/png");
    assert_eq!(service.pending_count(), 2);

    assert!(service.cancel(&first.upload_id));
    let document = service
        .confirm(&second.upload_id)
        .await
        .expect("second confirmed");
    assert!(document.status.complete);
    assert_eq!(service.pending_count(), 0);
    assert_eq!(
        *extractor.received.lock().expect("mutex"),
        vec!["verso.png".to_string()]
    );

    match service.confirm(&first.upload_id).await {
        Err(IntakeServiceError::UnknownUpload(id)) => assert_eq!(id, first.upload_id),
        other => panic!("expected unknown upload, got {other:?}"),
    }
}

#[tokio::test]
async fn service_requeues_upload_when_extractor_is_down() {
    let service = IntakeService::new(Arc::new(OfflineExtractor), UploadPolicy::default());
    let staged = service.stage(scanned_pdf(10)).expect("staged");

    assert!(service.confirm(&staged.upload_id).await.is_err());
    assert_eq!(service.pending_count(), 1);
    assert!(!service.cancel(&UploadId("upl-missing".to_string())));
    assert!(service.cancel(&staged.upload_id));
}

#[tokio::test]
async fn cancel_during_extraction_discards_upload() {
    let extractor = Arc::new(StalledExtractor::default());
    let service = Arc::new(IntakeService::new(
        extractor.clone(),
        UploadPolicy::default(),
    ));
    let staged = service.stage(scanned_pdf(10)).expect("staged");

    let confirming = tokio::spawn({
        let service = service.clone();
        let upload_id = staged.upload_id.clone();
        async move { service.confirm(&upload_id).await }
    });
    extractor.started.notified().await;

    match service.confirm(&staged.upload_id).await {
        Err(IntakeServiceError::InFlight(id)) => assert_eq!(id, staged.upload_id),
        other => panic!("expected in-flight rejection, got {other:?}"),
    }
    assert!(service.cancel(&staged.upload_id));
    assert!(!service.cancel(&staged.upload_id));

    extractor.release.notify_one();
    match confirming.await.expect("confirm task joins") {
        Err(IntakeServiceError::Cancelled(id)) => assert_eq!(id, staged.upload_id),
        other => panic!("expected cancelled upload, got {other:?}"),
    }
    assert_eq!(service.pending_count(), 0);
    assert!(matches!(
        service.confirm(&staged.upload_id).await,
        Err(IntakeServiceError::UnknownUpload(_))
    ));
}

#[test]
fn unconfirmed_uploads_expire_after_pending_ttl() {
    let policy = UploadPolicy {
        pending_ttl_secs: 60,
        ..UploadPolicy::default()
    };
    let service = IntakeService::new(Arc::new(RecordingExtractor::default()), policy);
    let start = Utc
        .with_ymd_and_hms(2025, 6, 20, 9, 0, 0)
        .single()
        .expect("valid instant");

    let abandoned = service.stage_at(scanned_pdf(10), start).expect("abandoned");
    service
        .stage_at(scanned_pdf(10), start + Duration::seconds(30))
        .expect("recent");
    assert_eq!(service.pending_count(), 2);

    service
        .stage_at(scanned_pdf(10), start + Duration::seconds(61))
        .expect("fresh");
    assert_eq!(service.pending_count(), 2);
    assert!(!service.cancel(&abandoned.upload_id));

    assert_eq!(service.evict_expired(start + Duration::seconds(200)), 2);
    assert_eq!(service.pending_count(), 0);
}
