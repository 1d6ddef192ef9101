use serde::Serialize;

use super::fields::{self, FieldMap, IncompleteFields, InfractionRecord};

/// In-memory review of extracted fields before drafting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReview {
    fields: FieldMap,
}

/// Completeness state re-evaluated after every edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewStatus {
    pub complete: bool,
    pub missing: Vec<&'static str>,
}

impl ExtractionReview {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Overwrites one field and returns the refreshed status.
    pub fn edit(&mut self, key: impl Into<String>, value: impl Into<String>) -> ReviewStatus {
        self.fields.set(key, value);
        self.status()
    }

    pub fn clear(&mut self, key: &str) -> ReviewStatus {
        self.fields.remove(key);
        self.status()
    }

    pub fn can_proceed(&self) -> bool {
        fields::is_complete(&self.fields)
    }

    pub fn status(&self) -> ReviewStatus {
        let missing = fields::missing_fields(&self.fields);
        ReviewStatus {
            complete: missing.is_empty(),
            missing,
        }
    }

    pub fn record(&self) -> Result<InfractionRecord, IncompleteFields> {
        InfractionRecord::from_fields(&self.fields)
    }
}
