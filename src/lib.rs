//! A constraint-programming engine for the weekly group-therapy scheduling
//! problem: assign sessions to (room, day, hour-block) slots, admit
//! patients, and staff each session with therapists of the required
//! specialties, subject to availability/capacity/staffing/preference
//! constraints, while minimizing patient days used and therapist idle
//! single-block gaps.
//!
//! The crate's single entry point is [`solve::solve`]. Everything else —
//! [`instance`]'s validated problem description, [`model`]'s variable and
//! constraint tables, and [`diagnostics`]'s three infeasibility explainers
//! — exists to build and explain that one call.

pub mod diagnostics;
pub mod error;
pub mod instance;
pub mod model;
pub mod schedule;
pub mod solve;
pub mod time;

pub use error::{Result, SchedulerError};
pub use instance::Instance;
pub use model::objective::ObjectiveWeights;
pub use schedule::SessionRecord;
pub use solve::{solve, DiagnosticsByMethod, SolveResult, SolveStatus, SolverOptions};
