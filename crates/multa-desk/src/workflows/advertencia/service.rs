use std::convert::Infallible;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::draft::{render_draft, DraftError, GeneratedDocument, TemplateSource};
use super::eligibility::{EligibilityGate, EligibilityRoute, HistoryAnswer};
use super::history::{
    DriverHistoryCheck, DriverHistoryLookup, TemplateStore, WarningEligibilityResult,
};
use super::template::{self, ADVERTENCIA_TEMPLATE_KEY};
use crate::boundary::{BoundaryOutcome, ErrorBoundary, RecoveryPanel};
use crate::notice::Notice;
use crate::workflows::intake::ExtractionReview;
use crate::workflows::CollaboratorError;

/// History lookup result paired with the answer it suggests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySuggestion {
    pub check: DriverHistoryCheck,
    pub suggested_answer: HistoryAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DraftOutcome {
    Drafted {
        document: GeneratedDocument,
        notice: Notice,
    },
    /// The render step faulted; the caller shows the panel and may retry.
    Recovered {
        panel: RecoveryPanel,
        notice: Notice,
    },
}

/// Drafts Art. 267 written-warning requests once the eligibility gate routes
/// the case there.
pub struct AdvertenciaService<H, T> {
    history: Arc<H>,
    templates: Arc<T>,
    boundary: ErrorBoundary,
}

impl<H, T> AdvertenciaService<H, T>
where
    H: DriverHistoryLookup + 'static,
    T: TemplateStore + 'static,
{
    pub fn new(history: Arc<H>, templates: Arc<T>, boundary: ErrorBoundary) -> Self {
        Self {
            history,
            templates,
            boundary,
        }
    }

    pub async fn suggest(&self, driver_id: &str) -> Result<HistorySuggestion, CollaboratorError> {
        let check = self.history.check(driver_id).await?;
        let suggested_answer = EligibilityGate::suggest_from(&check);
        Ok(HistorySuggestion {
            check,
            suggested_answer,
        })
    }

    /// Picks the template text: the eligibility verdict's own text, then the
    /// store, then the built-in request.
    pub async fn resolve_template(
        &self,
        eligibility: Option<&WarningEligibilityResult>,
        today: NaiveDate,
    ) -> Result<(String, TemplateSource), DraftError> {
        if let Some(text) = eligibility
            .and_then(|result| result.template_text.as_deref())
            .filter(|text| !text.trim().is_empty())
        {
            return Ok((text.to_string(), TemplateSource::Eligibility));
        }

        match self.templates.template(ADVERTENCIA_TEMPLATE_KEY).await? {
            Some(text) if !text.trim().is_empty() => Ok((text, TemplateSource::Store)),
            _ => Ok((template::fallback_template(today), TemplateSource::Fallback)),
        }
    }

    /// Builds the draft for a reviewed case. Nothing in `review` is modified,
    /// whatever the outcome.
    pub async fn draft(
        &self,
        gate: &EligibilityGate,
        review: &ExtractionReview,
        eligibility: Option<&WarningEligibilityResult>,
        today: NaiveDate,
    ) -> Result<DraftOutcome, DraftError> {
        match gate.route() {
            None => return Err(DraftError::Unanswered),
            Some(EligibilityRoute::StandardAppeal) => return Err(DraftError::NotEligible),
            Some(EligibilityRoute::WarningDraft) => {}
        }

        let record = review.record()?;
        let (template_text, source) = self.resolve_template(eligibility, today).await?;

        let outcome = self.boundary.run("advertencia_draft", || {
            Ok::<_, Infallible>(render_draft(&record, &template_text, source))
        });

        match outcome {
            BoundaryOutcome::Rendered(Ok(document)) => {
                info!(
                    document_number = %document.document_number(),
                    source = ?document.source(),
                    "advertencia drafted"
                );
                Ok(DraftOutcome::Drafted {
                    document,
                    notice: Notice::success("Advertência gerada com sucesso."),
                })
            }
            BoundaryOutcome::Rendered(Err(err)) => {
                warn!(document_number = %record.number, error = %err, "advertencia draft failed");
                Err(err)
            }
            BoundaryOutcome::Recovered(panel) => Ok(DraftOutcome::Recovered {
                panel,
                notice: Notice::error("Erro inesperado ao gerar a advertência."),
            }),
        }
    }
}
