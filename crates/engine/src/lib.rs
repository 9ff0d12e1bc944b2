//! Adaptive banner selection — UCB1-style multi-armed bandit over per-slot
//! candidate sets and the service that keeps assignments, counters and
//! notifications consistent around it.

pub mod bandit;
pub mod service;

pub use service::RotationService;
