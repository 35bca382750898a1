//! Error kinds raised while constructing an [`crate::instance::Instance`] or
//! building the constraint model from one.
//!
//! Solver-reported infeasibility is never an error here — see
//! [`crate::solve::SolveResult`] and [`crate::diagnostics`] for how a failed
//! solve is surfaced instead.

use thiserror::Error;

/// Errors the core can raise before or while building a model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The `Instance` (or a pin/availability string within it) violates one
    /// of the invariants in the data model: duplicate ids, a dangling
    /// reference to an unknown specialty/therapy/therapist, an out-of-range
    /// day or block, or a malformed time-range string.
    #[error("invalid {entity}: {reason}")]
    Validation { entity: String, reason: String },

    /// Variable construction hit a degenerate state that cannot be modeled
    /// at all (reserved for invariants that `Validation` cannot catch ahead
    /// of time, e.g. an internal index overflow).
    #[error("cannot build model for {entity}: {reason}")]
    ModelBuild { entity: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    pub fn validation(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        SchedulerError::Validation {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    pub fn model_build(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        SchedulerError::ModelBuild {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}
