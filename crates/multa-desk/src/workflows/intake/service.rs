use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::extraction::DocumentExtractor;
use super::fields::FieldMap;
use super::review::{ExtractionReview, ReviewStatus};
use super::upload::{
    CandidateFile, PendingUploadView, UploadError, UploadGate, UploadPolicy, UploadRejection,
};

/// Identifier handed back between the stage and confirm requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(pub String);

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static UPLOAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_upload_id() -> UploadId {
    let id = UPLOAD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UploadId(format!("upl-{id:06}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedUpload {
    pub upload_id: UploadId,
    #[serde(flatten)]
    pub file: PendingUploadView,
    pub confirmation_required: bool,
}

/// Extraction result together with the review status it starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedDocument {
    pub upload_id: UploadId,
    pub fields: FieldMap,
    pub status: ReviewStatus,
}

/// Map entry for one staged file. While the extractor is running the gate
/// lives with the confirming request, so only the cancel flag stays here.
enum Slot {
    Waiting {
        gate: UploadGate,
        staged_at: DateTime<Utc>,
    },
    Confirming {
        cancelled: bool,
        started_at: DateTime<Utc>,
    },
}

/// Keeps one upload gate per staged file so several operators can have
/// documents waiting for confirmation at the same time.
pub struct IntakeService<E> {
    extractor: Arc<E>,
    policy: UploadPolicy,
    slots: Mutex<HashMap<UploadId, Slot>>,
}

impl<E> IntakeService<E>
where
    E: DocumentExtractor + 'static,
{
    pub fn new(extractor: Arc<E>, policy: UploadPolicy) -> Self {
        Self {
            extractor,
            policy,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn stage(&self, file: CandidateFile) -> Result<StagedUpload, UploadRejection> {
        self.stage_at(file, Utc::now())
    }

    /// Stages a file as of `now`, first evicting prompts that were left
    /// unanswered for longer than the policy allows.
    pub fn stage_at(
        &self,
        file: CandidateFile,
        now: DateTime<Utc>,
    ) -> Result<StagedUpload, UploadRejection> {
        let mut gate = UploadGate::new(self.policy.clone());
        let view = gate.stage(file)?.view();
        let upload_id = next_upload_id();

        let mut slots = self.slots();
        Self::sweep(&mut slots, now - self.policy.pending_ttl());
        slots.insert(
            upload_id.clone(),
            Slot::Waiting {
                gate,
                staged_at: now,
            },
        );

        Ok(StagedUpload {
            upload_id,
            file: view,
            confirmation_required: true,
        })
    }

    /// Drops staged files older than the pending TTL and returns how many went.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        Self::sweep(&mut self.slots(), now - self.policy.pending_ttl())
    }

    /// Sends the staged file to extraction. The gate is put back when the
    /// extractor fails so the same upload can be confirmed again, unless the
    /// upload was cancelled while the extractor was running.
    pub async fn confirm(
        &self,
        upload_id: &UploadId,
    ) -> Result<ExtractedDocument, IntakeServiceError> {
        let mut gate = {
            let mut slots = self.slots();
            match slots.remove(upload_id) {
                Some(Slot::Waiting { gate, .. }) => {
                    slots.insert(
                        upload_id.clone(),
                        Slot::Confirming {
                            cancelled: false,
                            started_at: Utc::now(),
                        },
                    );
                    gate
                }
                Some(slot @ Slot::Confirming { .. }) => {
                    slots.insert(upload_id.clone(), slot);
                    return Err(IntakeServiceError::InFlight(upload_id.clone()));
                }
                None => return Err(IntakeServiceError::UnknownUpload(upload_id.clone())),
            }
        };

        let result = gate.confirm(self.extractor.as_ref()).await;

        let mut slots = self.slots();
        let cancelled = matches!(
            slots.remove(upload_id),
            Some(Slot::Confirming {
                cancelled: true,
                ..
            })
        );
        if cancelled {
            info!(upload_id = %upload_id, "upload cancelled during extraction");
            return Err(IntakeServiceError::Cancelled(upload_id.clone()));
        }

        match result {
            Ok(fields) => {
                let review = ExtractionReview::new(fields);
                Ok(ExtractedDocument {
                    upload_id: upload_id.clone(),
                    status: review.status(),
                    fields: review.fields().clone(),
                })
            }
            Err(err) => {
                if gate.pending().is_some() {
                    slots.insert(
                        upload_id.clone(),
                        Slot::Waiting {
                            gate,
                            staged_at: Utc::now(),
                        },
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Discards a staged file. An upload whose extraction is running is
    /// marked so its result is dropped when the extractor returns.
    pub fn cancel(&self, upload_id: &UploadId) -> bool {
        let mut slots = self.slots();
        if let Some(Slot::Confirming { cancelled, .. }) = slots.get_mut(upload_id) {
            return !std::mem::replace(cancelled, true);
        }
        match slots.remove(upload_id) {
            Some(Slot::Waiting { mut gate, .. }) => gate.cancel(),
            _ => false,
        }
    }

    /// Files staged and waiting for the operator, excluding ones mid-extraction.
    pub fn pending_count(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| matches!(slot, Slot::Waiting { .. }))
            .count()
    }

    fn sweep(slots: &mut HashMap<UploadId, Slot>, cutoff: DateTime<Utc>) -> usize {
        let before = slots.len();
        slots.retain(|upload_id, slot| match slot {
            Slot::Waiting { staged_at, .. } if *staged_at < cutoff => {
                warn!(upload_id = %upload_id, "evicting unconfirmed upload");
                false
            }
            // A confirm request that never came back leaves this marker behind.
            Slot::Confirming { started_at, .. } if *started_at < cutoff => {
                warn!(upload_id = %upload_id, "evicting stale extraction marker");
                false
            }
            _ => true,
        });
        before - slots.len()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<UploadId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error("upload {0} is not waiting for confirmation")]
    UnknownUpload(UploadId),
    #[error("upload {0} is already being extracted")]
    InFlight(UploadId),
    #[error("upload {0} was cancelled during extraction")]
    Cancelled(UploadId),
    #[error(transparent)]
    Upload(#[from] UploadError),
}
