use serde::{Deserialize, Serialize};
use tracing::debug;

use super::history::DriverHistoryCheck;

/// Operator's answer to "did the driver commit violations in the last 12 months?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAnswer {
    NoViolations,
    HasViolations,
}

impl HistoryAnswer {
    pub fn from_had_violations(had_violations: bool) -> Self {
        if had_violations {
            Self::HasViolations
        } else {
            Self::NoViolations
        }
    }

    pub fn route(self) -> EligibilityRoute {
        match self {
            HistoryAnswer::NoViolations => EligibilityRoute::WarningDraft,
            HistoryAnswer::HasViolations => EligibilityRoute::StandardAppeal,
        }
    }
}

/// Where the case goes after the history question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityRoute {
    /// Art. 267 CTB conversion into a written warning.
    WarningDraft,
    /// Regular defence/appeal drafting.
    StandardAppeal,
}

/// Two-state gate: unknown until the operator answers, resolved afterwards.
/// Answers live only as long as the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EligibilityGate {
    #[default]
    Unknown,
    Resolved(HistoryAnswer),
}

impl EligibilityGate {
    pub fn new() -> Self {
        Self::Unknown
    }

    /// Records the operator's answer, replacing any earlier one.
    pub fn answer(&mut self, had_violations_last_12_months: bool) -> EligibilityRoute {
        let answer = HistoryAnswer::from_had_violations(had_violations_last_12_months);
        *self = Self::Resolved(answer);
        debug!(?answer, route = ?answer.route(), "eligibility answered");
        answer.route()
    }

    pub fn route(&self) -> Option<EligibilityRoute> {
        match self {
            Self::Unknown => None,
            Self::Resolved(answer) => Some(answer.route()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Pre-selects an answer from the history lookup without resolving the gate.
    pub fn suggest_from(check: &DriverHistoryCheck) -> HistoryAnswer {
        HistoryAnswer::from_had_violations(check.has_violations())
    }
}
