use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const COMPANY_ID_HEADER: &str = "x-company-id";

/// Authenticated subject identifier issued by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Company (law office) the current user acts for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub String);

/// Session state handed explicitly to every flow that needs to know who is acting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: Option<UserId>,
    pub company_id: Option<CompanyId>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(UserId(user_id.into())),
            company_id: None,
        }
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(CompanyId(company_id.into()));
        self
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn company(&self) -> Option<&CompanyId> {
        self.company_id.as_ref()
    }
}

/// Reads the session from the headers set by the auth proxy. Missing or blank
/// headers yield an anonymous session; flows decide whether that is acceptable.
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            user_id: header(USER_ID_HEADER).map(UserId),
            company_id: header(COMPANY_ID_HEADER).map(CompanyId),
        })
    }
}
