//! Document intake: the confirmation-gated upload and the review of the
//! fields the extraction service returns.

pub mod extraction;
pub mod fields;
pub mod review;
pub mod router;
pub mod service;
pub mod upload;

#[cfg(test)]
mod tests;

pub use extraction::DocumentExtractor;
pub use fields::{
    is_complete, keys, missing_fields, FieldMap, FieldMapError, IncompleteFields,
    InfractionRecord, REQUIRED_FIELDS,
};
pub use review::{ExtractionReview, ReviewStatus};
pub use router::intake_router;
pub use service::{ExtractedDocument, IntakeService, IntakeServiceError, StagedUpload, UploadId};
pub use upload::{
    CandidateFile, PendingUpload, PendingUploadView, UploadError, UploadGate, UploadPolicy,
    UploadRejection,
};
