//! Written-warning (advertência, Art. 267 CTB) drafting: the eligibility
//! gate, template filling and export of the final document.

pub mod draft;
pub mod eligibility;
pub mod history;
pub mod router;
pub mod service;
pub mod template;

#[cfg(test)]
mod tests;

pub use draft::{
    export_file_name, render_draft, DraftError, ExportedFile, GeneratedDocument, TemplateSource,
};
pub use eligibility::{EligibilityGate, EligibilityRoute, HistoryAnswer};
pub use history::{
    DriverHistoryCheck, DriverHistoryLookup, TemplateStore, WarningEligibilityResult,
};
pub use router::advertencia_router;
pub use service::{AdvertenciaService, DraftOutcome, HistorySuggestion};
pub use template::{
    fallback_template, fill_template, format_br_date, placeholders, TemplateError,
    ADVERTENCIA_TEMPLATE_KEY,
};
