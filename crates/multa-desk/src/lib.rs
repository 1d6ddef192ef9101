//! Back-office flows for traffic-fine ("multa") appeals.
//!
//! Each flow under [`workflows`] is self-contained: document intake and field
//! review, written-warning (advertência) eligibility and drafting, payment
//! method resolution over prepaid credit, and feedback on generated documents.
//! External services are modelled as async traits so callers decide how they
//! are reached.

pub mod boundary;
pub mod config;
pub mod context;
pub mod error;
pub mod notice;
pub mod telemetry;
pub mod workflows;
