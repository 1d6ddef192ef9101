/// Failure reported by an external collaborator (extraction, history lookup,
/// template store, balance service, payment gateway, feedback store).
///
/// Calls are never retried; the caller surfaces the error once and keeps its
/// previous in-memory state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{service} unavailable: {detail}")]
    Unavailable {
        service: &'static str,
        detail: String,
    },
    #[error("{service} rejected the request: {detail}")]
    Rejected {
        service: &'static str,
        detail: String,
    },
    #[error("{service} has no record for {key}")]
    NotFound { service: &'static str, key: String },
}

impl CollaboratorError {
    pub fn unavailable(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Unavailable {
            service,
            detail: detail.into(),
        }
    }

    pub fn rejected(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Rejected {
            service,
            detail: detail.into(),
        }
    }

    pub fn not_found(service: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            service,
            key: key.into(),
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::Unavailable { service, .. }
            | Self::Rejected { service, .. }
            | Self::NotFound { service, .. } => service,
        }
    }
}
