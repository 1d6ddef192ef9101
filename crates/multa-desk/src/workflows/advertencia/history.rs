use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::CollaboratorError;

/// Result of the driver history lookup over the last twelve months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverHistoryCheck {
    pub violation_count: u32,
    pub checked_at: DateTime<Utc>,
}

impl DriverHistoryCheck {
    pub fn has_violations(&self) -> bool {
        self.violation_count > 0
    }
}

/// Eligibility verdict computed upstream from infraction severity and history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningEligibilityResult {
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_text: Option<String>,
}

#[async_trait]
pub trait DriverHistoryLookup: Send + Sync {
    async fn check(&self, driver_id: &str) -> Result<DriverHistoryCheck, CollaboratorError>;
}

/// Stored document templates keyed by purpose.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn template(&self, key: &str) -> Result<Option<String>, CollaboratorError>;
}
