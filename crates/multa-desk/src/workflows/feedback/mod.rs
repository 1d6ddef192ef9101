//! Star ratings and comments on generated documents.

pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    FeedbackAspect, FeedbackEntry, FeedbackError, FeedbackSubmission, MAX_RATING, MIN_RATING,
};
pub use router::feedback_router;
pub use service::{FeedbackService, FeedbackStore};
