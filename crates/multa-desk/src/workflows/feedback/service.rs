use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use super::domain::{FeedbackEntry, FeedbackError, FeedbackSubmission};
use crate::context::SessionContext;
use crate::notice::Notice;
use crate::workflows::CollaboratorError;

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn insert(&self, entry: FeedbackEntry) -> Result<(), CollaboratorError>;
}

impl FeedbackError {
    pub fn notice(&self) -> Notice {
        match self {
            FeedbackError::Unauthenticated => {
                Notice::error("Faça login para enviar sua avaliação.")
            }
            FeedbackError::MissingResource => Notice::error("Documento não identificado."),
            FeedbackError::MissingRating => {
                Notice::warning("Selecione uma nota de 1 a 5 estrelas.")
            }
            FeedbackError::RatingOutOfRange { .. } => {
                Notice::warning("As notas devem estar entre 1 e 5.")
            }
            FeedbackError::Store(_) => {
                Notice::error("Não foi possível enviar sua avaliação. Tente novamente.")
            }
        }
    }
}

pub struct FeedbackService<S> {
    store: Arc<S>,
}

impl<S> FeedbackService<S>
where
    S: FeedbackStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validates and stores the submission for the signed-in user. Nothing is
    /// written when validation fails.
    pub async fn submit(
        &self,
        ctx: &SessionContext,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackEntry, FeedbackError> {
        let Some(user_id) = ctx.user().cloned() else {
            return Err(FeedbackError::Unauthenticated);
        };
        submission.validate()?;

        let entry = FeedbackEntry {
            resource_id: submission.resource_id.trim().to_string(),
            user_id,
            company_id: ctx.company().cloned(),
            rating: submission.rating,
            comment: submission
                .comment
                .map(|comment| comment.trim().to_string())
                .filter(|comment| !comment.is_empty()),
            aspects: submission.aspects,
            submitted_at: Utc::now(),
        };

        if let Err(err) = self.store.insert(entry.clone()).await {
            warn!(resource_id = %entry.resource_id, error = %err, "feedback not stored");
            return Err(err.into());
        }
        info!(
            resource_id = %entry.resource_id,
            rating = entry.rating,
            aspects = entry.aspects.len(),
            "feedback stored"
        );
        Ok(entry)
    }
}
