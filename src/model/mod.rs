//! Model building: variable tables, the constraint emitter, constraint
//! families, and the objective, shared by the primary solve and both
//! diagnostic sub-solves.

pub mod constraints;
pub mod emitter;
pub mod ids;
pub mod objective;
pub mod vars;

use std::collections::BTreeSet;

use cp_sat::builder::CpModelBuilder;

use crate::instance::Instance;
use emitter::{Emitter, Mode};
use ids::Index;
use vars::VariableSet;

/// Builds the variable tables and emits every constraint family against
/// `model` in the given [`Mode`]. Returns the variable tables (needed to
/// build indicators or read back a solution) and the full set of
/// constraint-group labels the emitter saw, regardless of whether `mode`
/// left them active — the assumption-core explainer uses this to learn
/// the candidate label set from the same pass that builds the model.
pub fn build<'a>(
    model: &mut CpModelBuilder,
    instance: &Instance,
    idx: &Index,
    mode: Mode<'a>,
) -> (VariableSet, BTreeSet<String>) {
    let vars = vars::build_variables(model, instance, idx);
    let mut emitter = Emitter::new(model, mode);
    constraints::emit_all(&mut emitter, instance, idx, &vars);
    let labels = emitter.seen_labels();
    (vars, labels)
}
