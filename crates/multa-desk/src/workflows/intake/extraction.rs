use async_trait::async_trait;

use super::fields::FieldMap;
use super::upload::PendingUpload;
use crate::workflows::CollaboratorError;

/// Remote service that reads a scanned infraction notice and returns its fields.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, upload: &PendingUpload) -> Result<FieldMap, CollaboratorError>;
}
