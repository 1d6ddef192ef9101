use chrono::NaiveDate;
use serde::Serialize;

use super::template::{self, TemplateError};
use crate::notice::Notice;
use crate::workflows::intake::{IncompleteFields, InfractionRecord};
use crate::workflows::CollaboratorError;

/// Where the text of a draft came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    /// Supplied with the eligibility verdict.
    Eligibility,
    /// Looked up in the template store.
    Store,
    /// Built-in request text.
    Fallback,
}

/// Draft text seeded from a template and freely editable before export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDocument {
    document_number: String,
    text: String,
    source: TemplateSource,
    edited: bool,
}

impl GeneratedDocument {
    pub fn new(document_number: impl Into<String>, text: String, source: TemplateSource) -> Self {
        Self {
            document_number: document_number.into(),
            text,
            source,
            edited: false,
        }
    }

    pub fn document_number(&self) -> &str {
        &self.document_number
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> TemplateSource {
        self.source
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    /// Replaces the draft text with the operator's version.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.edited = true;
    }

    pub fn export(&self, today: NaiveDate) -> ExportedFile {
        ExportedFile {
            file_name: export_file_name(&self.document_number, today),
            content_type: mime::TEXT_PLAIN_UTF_8,
            bytes: self.text.as_bytes().to_vec(),
        }
    }
}

/// Plain-text download of the final document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

/// `advertencia_{number}_{YYYY-MM-DD}.txt`. Characters that are unsafe in a
/// file name are replaced with `_`.
pub fn export_file_name(document_number: &str, today: NaiveDate) -> String {
    let number: String = document_number
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let number = if number.is_empty() {
        "sem_numero".to_string()
    } else {
        number
    };

    format!("advertencia_{number}_{}.txt", today.format("%Y-%m-%d"))
}

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("eligibility question has not been answered")]
    Unanswered,
    #[error("driver has violations in the last 12 months; use the standard appeal")]
    NotEligible,
    #[error(transparent)]
    Incomplete(#[from] IncompleteFields),
    #[error("template store failed: {0}")]
    TemplateStore(#[from] CollaboratorError),
    #[error("template could not be filled: {0}")]
    Template(#[from] TemplateError),
}

impl DraftError {
    /// Message shown to the operator when drafting fails.
    pub fn notice(&self) -> Notice {
        let message = match self {
            DraftError::Unanswered => {
                "Informe se o condutor cometeu infrações nos últimos 12 meses.".to_string()
            }
            DraftError::NotEligible => {
                "Condutor com infrações nos últimos 12 meses: siga com o recurso padrão."
                    .to_string()
            }
            DraftError::Incomplete(err) => format!(
                "Preencha os campos obrigatórios: {}.",
                err.missing.join(", ")
            ),
            DraftError::TemplateStore(_) => {
                "Não foi possível carregar o modelo de advertência. Tente novamente.".to_string()
            }
            DraftError::Template(_) => {
                "Erro ao gerar a advertência a partir do modelo.".to_string()
            }
        };
        Notice::error(message)
    }
}

/// Fills `template_text` with the record's fields.
pub fn render_draft(
    record: &InfractionRecord,
    template_text: &str,
    source: TemplateSource,
) -> Result<GeneratedDocument, DraftError> {
    let text = template::fill_template(template_text, &record.to_fields())?;
    Ok(GeneratedDocument::new(record.number.clone(), text, source))
}
