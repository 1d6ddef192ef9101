use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::{CompanyId, UserId};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Fixed set of aspects a generated document can be rated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackAspect {
    Clarity,
    LegalBasis,
    Formatting,
    Usefulness,
}

impl FeedbackAspect {
    pub const ALL: [FeedbackAspect; 4] = [
        FeedbackAspect::Clarity,
        FeedbackAspect::LegalBasis,
        FeedbackAspect::Formatting,
        FeedbackAspect::Usefulness,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackAspect::Clarity => "clarity",
            FeedbackAspect::LegalBasis => "legal_basis",
            FeedbackAspect::Formatting => "formatting",
            FeedbackAspect::Usefulness => "usefulness",
        }
    }
}

/// What the operator submits about a generated document. A rating of 0 means
/// no star was picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub resource_id: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub aspects: BTreeMap<FeedbackAspect, u8>,
}

impl FeedbackSubmission {
    pub fn new(resource_id: impl Into<String>, rating: u8) -> Self {
        Self {
            resource_id: resource_id.into(),
            rating,
            comment: None,
            aspects: BTreeMap::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_aspect(mut self, aspect: FeedbackAspect, rating: u8) -> Self {
        self.aspects.insert(aspect, rating);
        self
    }

    pub fn validate(&self) -> Result<(), FeedbackError> {
        if self.resource_id.trim().is_empty() {
            return Err(FeedbackError::MissingResource);
        }
        if self.rating == 0 {
            return Err(FeedbackError::MissingRating);
        }
        if self.rating > MAX_RATING {
            return Err(FeedbackError::RatingOutOfRange {
                field: "rating",
                value: self.rating,
            });
        }
        for (aspect, &value) in &self.aspects {
            if !(MIN_RATING..=MAX_RATING).contains(&value) {
                return Err(FeedbackError::RatingOutOfRange {
                    field: aspect.as_str(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Stored feedback row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub resource_id: String,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub aspects: BTreeMap<FeedbackAspect, u8>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedbackError {
    #[error("a signed-in user is required to send feedback")]
    Unauthenticated,
    #[error("feedback must reference a document")]
    MissingResource,
    #[error("choose a rating between 1 and 5")]
    MissingRating,
    #[error("{field} must be between 1 and 5, got {value}")]
    RatingOutOfRange { field: &'static str, value: u8 },
    #[error(transparent)]
    Store(#[from] crate::workflows::CollaboratorError),
}
