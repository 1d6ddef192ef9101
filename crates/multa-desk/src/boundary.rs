//! Supervisor around render/compute steps.
//!
//! A step either produces its value or is replaced by a [`RecoveryPanel`]
//! offering retry-in-place or a full reload. Both returned errors and panics
//! are caught; fault details are only exposed in development.

use std::any::Any;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::error;

use crate::config::AppEnvironment;

const GENERIC_MESSAGE: &str = "Algo deu errado ao exibir esta seção.";

/// Action offered by the recovery panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Run the same step again without leaving the current view.
    Retry,
    /// Discard in-memory state and start over.
    Reload,
}

/// Fault description shown only when the environment allows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultDetails {
    pub error_name: String,
    pub message: String,
    /// Source chain of the fault, outermost first.
    pub details: Vec<String>,
}

/// Fallback rendered in place of a failed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryPanel {
    pub step: String,
    pub message: String,
    pub actions: Vec<RecoveryAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<FaultDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryOutcome<T> {
    Rendered(T),
    Recovered(RecoveryPanel),
}

impl<T> BoundaryOutcome<T> {
    pub fn rendered(self) -> Option<T> {
        match self {
            BoundaryOutcome::Rendered(value) => Some(value),
            BoundaryOutcome::Recovered(_) => None,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, BoundaryOutcome::Recovered(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorBoundary {
    environment: AppEnvironment,
}

impl ErrorBoundary {
    pub fn new(environment: AppEnvironment) -> Self {
        Self { environment }
    }

    /// Runs a one-off step.
    pub fn run<T, E, F>(&self, step_name: &str, step: F) -> BoundaryOutcome<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: Error + 'static,
    {
        match panic::catch_unwind(AssertUnwindSafe(step)) {
            Ok(Ok(value)) => BoundaryOutcome::Rendered(value),
            Ok(Err(err)) => {
                let fault = FaultDetails {
                    error_name: short_type_name::<E>().to_string(),
                    message: err.to_string(),
                    details: source_chain(&err),
                };
                BoundaryOutcome::Recovered(self.panel(step_name, fault))
            }
            Err(payload) => {
                let fault = FaultDetails {
                    error_name: "panic".to_string(),
                    message: panic_message(payload.as_ref()),
                    details: Vec::new(),
                };
                BoundaryOutcome::Recovered(self.panel(step_name, fault))
            }
        }
    }

    /// Wraps a repeatable step so the caller can retry it after a recovery.
    pub fn supervise<F>(&self, step_name: impl Into<String>, step: F) -> Supervised<F> {
        Supervised {
            boundary: *self,
            step_name: step_name.into(),
            step,
            attempts: 0,
        }
    }

    fn panel(&self, step_name: &str, fault: FaultDetails) -> RecoveryPanel {
        error!(
            step = step_name,
            error_name = %fault.error_name,
            message = %fault.message,
            "step failed, recovery panel substituted"
        );

        RecoveryPanel {
            step: step_name.to_string(),
            message: GENERIC_MESSAGE.to_string(),
            actions: vec![RecoveryAction::Retry, RecoveryAction::Reload],
            fault: self
                .environment
                .exposes_fault_details()
                .then_some(fault),
        }
    }
}

/// A step held by the boundary so it can be rendered again in place.
pub struct Supervised<F> {
    boundary: ErrorBoundary,
    step_name: String,
    step: F,
    attempts: u32,
}

impl<F, T, E> Supervised<F>
where
    F: FnMut() -> Result<T, E>,
    E: Error + 'static,
{
    pub fn render(&mut self) -> BoundaryOutcome<T> {
        self.attempts += 1;
        let step = &mut self.step;
        self.boundary.run(&self.step_name, || step())
    }

    pub fn retry(&mut self) -> BoundaryOutcome<T> {
        self.render()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

fn short_type_name<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn source_chain(err: &(dyn Error + 'static)) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = err.source();
    while let Some(source) = current {
        chain.push(source.to_string());
        current = source.source();
    }
    chain
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
