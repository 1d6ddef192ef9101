use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::extraction::DocumentExtractor;
use super::fields::FieldMap;
use crate::workflows::CollaboratorError;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Which scanned documents the intake accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// Lowercase extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
    pub max_size_mb: u64,
    /// Seconds a staged file may wait for confirmation before it is evicted.
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,
}

fn default_pending_ttl_secs() -> u64 {
    15 * 60
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: ["pdf", "jpg", "jpeg", "png"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            max_size_mb: 10,
            pending_ttl_secs: default_pending_ttl_secs(),
        }
    }
}

impl UploadPolicy {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn pending_ttl(&self) -> chrono::Duration {
        let secs = u32::try_from(self.pending_ttl_secs).unwrap_or(u32::MAX);
        chrono::Duration::seconds(i64::from(secs))
    }

    pub fn check(&self, file: &CandidateFile) -> Result<(), UploadRejection> {
        let extension = file
            .extension()
            .ok_or_else(|| UploadRejection::MissingExtension {
                file_name: file.file_name.clone(),
            })?;

        if !self
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
        {
            return Err(UploadRejection::ExtensionNotAllowed {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        if file.size_bytes() == 0 {
            return Err(UploadRejection::Empty {
                file_name: file.file_name.clone(),
            });
        }

        if file.size_bytes() > self.max_size_bytes() {
            return Err(UploadRejection::TooLarge {
                size_bytes: file.size_bytes(),
                max_mb: self.max_size_mb,
            });
        }

        Ok(())
    }
}

/// File picked by the operator, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn extension(&self) -> Option<String> {
        let (stem, extension) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || extension.is_empty() {
            return None;
        }
        Some(extension.to_ascii_lowercase())
    }
}

/// Validated file waiting for the operator to confirm it is the right document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub file_name: String,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

impl PendingUpload {
    fn from_candidate(file: CandidateFile) -> Self {
        let content_type = mime_guess::from_path(&file.file_name).first_or_octet_stream();
        Self {
            file_name: file.file_name,
            content_type,
            bytes: file.bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn view(&self) -> PendingUploadView {
        PendingUploadView {
            file_name: self.file_name.clone(),
            content_type: self.content_type.essence_str().to_string(),
            size_bytes: self.size_bytes(),
        }
    }
}

/// Summary shown in the confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUploadView {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("file '{file_name}' has no extension")]
    MissingExtension { file_name: String },
    #[error("file type .{extension} is not accepted (allowed: {})", .allowed.join(", "))]
    ExtensionNotAllowed {
        extension: String,
        allowed: Vec<String>,
    },
    #[error("file '{file_name}' is empty")]
    Empty { file_name: String },
    #[error("file has {size_bytes} bytes, limit is {max_mb} MB")]
    TooLarge { size_bytes: u64, max_mb: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file is waiting for confirmation")]
    NothingPending,
    #[error(transparent)]
    Extraction(#[from] CollaboratorError),
}

/// Two-step commit: `stage` validates and holds a file, `confirm` hands it to
/// the extraction service, `cancel` drops it.
#[derive(Debug, Clone, Default)]
pub struct UploadGate {
    policy: UploadPolicy,
    pending: Option<PendingUpload>,
}

impl UploadGate {
    pub fn new(policy: UploadPolicy) -> Self {
        Self {
            policy,
            pending: None,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn pending(&self) -> Option<&PendingUpload> {
        self.pending.as_ref()
    }

    /// Validates `file` and holds it for confirmation. A rejected file leaves
    /// whatever was pending before untouched.
    pub fn stage(&mut self, file: CandidateFile) -> Result<&PendingUpload, UploadRejection> {
        if let Err(rejection) = self.policy.check(&file) {
            warn!(file_name = %file.file_name, %rejection, "upload rejected");
            return Err(rejection);
        }

        let pending = PendingUpload::from_candidate(file);
        info!(
            file_name = %pending.file_name,
            content_type = %pending.content_type,
            size_bytes = pending.size_bytes(),
            "upload staged for confirmation"
        );
        Ok(self.pending.insert(pending))
    }

    /// Forwards the pending file to the extractor. On failure the file stays
    /// pending so the operator can try again or cancel.
    pub async fn confirm<E>(&mut self, extractor: &E) -> Result<FieldMap, UploadError>
    where
        E: DocumentExtractor + ?Sized,
    {
        let pending = self.pending.take().ok_or(UploadError::NothingPending)?;

        match extractor.extract(&pending).await {
            Ok(fields) => {
                info!(
                    file_name = %pending.file_name,
                    field_count = fields.len(),
                    "document extracted"
                );
                Ok(fields)
            }
            Err(err) => {
                warn!(file_name = %pending.file_name, error = %err, "extraction failed");
                self.pending = Some(pending);
                Err(err.into())
            }
        }
    }

    /// Discards the pending file, returning whether there was one.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
