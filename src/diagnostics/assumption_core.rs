//! Assumption-core (§4.5.2): finds a sufficient subset of constraint-group
//! labels whose conjunction is already unsatisfiable.
//!
//! The `cp_sat` binding this crate is built on does not expose native
//! solver assumption literals (see [`crate::model::emitter`]), so instead
//! of assuming literals true and reading back the solver's own UNSAT core,
//! this explainer re-solves with different label sets disabled via
//! [`crate::model::emitter::Mode::AssumptionGuarded`] and performs a
//! standard deletion-based minimal-unsatisfiable-subset search: visit each
//! label once, tentatively disable it, and keep it disabled permanently
//! whenever the rest of the guarded groups are still enough to stay
//! infeasible. What remains enabled at the end is the core.

use std::collections::BTreeSet;

use cp_sat::builder::CpModelBuilder;

use crate::instance::Instance;
use crate::model::emitter::Mode;
use crate::model::ids::Index;
use crate::solve::{build_parameters, map_status, SolveStatus, SolverOptions};

fn infeasible_with(instance: &Instance, idx: &Index, disabled: &BTreeSet<String>, options: &SolverOptions) -> (bool, BTreeSet<String>) {
    let mut model = CpModelBuilder::default();
    let (_, labels) = crate::model::build(&mut model, instance, idx, Mode::AssumptionGuarded { disabled });
    let params = build_parameters(options);
    let response = model.solve_with_parameters(&params);
    (map_status(response.status()) == SolveStatus::Infeasible, labels)
}

/// Renders a `kind|id1|id2…` label (§4.5.2) into a human-readable sentence.
fn render_label(label: &str) -> String {
    let parts: Vec<&str> = label.split('|').collect();
    match parts.as_slice() {
        ["patient_requirement", patient, therapy] => {
            format!("Patient '{patient}''s requirement for '{therapy}' cannot be fully met.")
        }
        ["pinned_session", patient, therapy, day, block] => {
            format!("Patient '{patient}''s pinned '{therapy}' session on {day} block {block} cannot be honored.")
        }
        ["fixed_therapist", patient, therapy, specialty, therapist] => {
            format!("Patient '{patient}' requires therapist '{therapist}' for '{therapy}' ({specialty}), which cannot be honored.")
        }
        ["no_same_day", patient, therapy, day] => {
            format!("Patient '{patient}' cannot attend '{therapy}' twice on {day} (no_same_day).")
        }
        ["patient_one_at_a_time", patient, day, block] => {
            format!("Patient '{patient}' cannot attend two sessions on {day} block {block}.")
        }
        ["continuous_hours", patient, day, start_block] => {
            format!("Patient '{patient}''s continuous-hours limit is exceeded in the window starting {day} block {start_block}.")
        }
        ["therapist_one_at_a_time", therapist, day, block] => {
            format!("Therapist '{therapist}' cannot staff two sessions on {day} block {block}.")
        }
        ["room_one_at_a_time", room, day, block] => {
            format!("Room '{room}' cannot host two sessions on {day} block {block}.")
        }
        ["session_capacity", therapy, room, day, block] => {
            format!("A session of '{therapy}' in room '{room}' on {day} block {block} would exceed capacity.")
        }
        ["session_min_attendance", therapy, room, day, block] => {
            format!("A session of '{therapy}' in room '{room}' on {day} block {block} cannot reach its minimum attendance.")
        }
        ["staffing", therapy, room, day, block, specialty] => {
            format!("A session of '{therapy}' in room '{room}' on {day} block {block} cannot be staffed with the required '{specialty}'.")
        }
        _ => label.to_string(),
    }
}

/// Runs the deletion-based search and returns the raw `kind|id1|id2…`
/// labels of a sufficient infeasible subset, or `None` if the model is
/// satisfiable once objective weights are dropped to 0 (nothing for this
/// method to explain).
pub fn core_labels(instance: &Instance, idx: &Index, options: &SolverOptions) -> Option<BTreeSet<String>> {
    let empty = BTreeSet::new();
    let (fully_infeasible, all_labels) = infeasible_with(instance, idx, &empty, options);
    if !fully_infeasible {
        return None;
    }

    let mut disabled: BTreeSet<String> = BTreeSet::new();
    for label in &all_labels {
        let mut trial = disabled.clone();
        trial.insert(label.clone());
        let (still_infeasible, _) = infeasible_with(instance, idx, &trial, options);
        if still_infeasible {
            disabled = trial;
        }
    }

    Some(all_labels.difference(&disabled).cloned().collect())
}

/// Runs the deletion-based core search and returns the rendered core, or a
/// single explanatory message if the solver has nothing to report.
pub fn run(instance: &Instance, idx: &Index, options: &SolverOptions) -> Vec<String> {
    let Some(core) = core_labels(instance, idx, options) else {
        return vec![
            "assumption-core is unsupported for this result: the model is satisfiable once objective weights are dropped to 0".to_string(),
        ];
    };

    if core.is_empty() {
        return vec!["infeasibility stems from unconditional constraints outside the guarded groups".to_string()];
    }

    core.iter().map(|label| render_label(label)).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::collections::BTreeSet as Set;

    use super::*;
    use crate::instance::{Patient, Therapist, TherapyInfo};

    #[test]
    fn labels_sharing_ids_but_different_kinds_render_distinctly() {
        let a = render_label("patient_one_at_a_time|P1|Monday|0");
        let b = render_label("no_same_day|P1|Monday|0");
        assert_ne!(a, b);
        assert!(a.contains("cannot attend two sessions"));
        assert!(b.contains("no_same_day"));
    }

    #[test]
    fn core_contains_fixed_therapist_label_when_that_binding_is_impossible() {
        let therapy = TherapyInfo {
            requirements: BTreeMap::from([("lang".to_string(), 1)]),
            min_patients: 1,
            max_patients: 1,
        };
        let instance = Instance::build(
            vec![
                Therapist {
                    id: "T1".to_string(),
                    specialties: Set::from(["lang".to_string()]),
                    availability: BTreeMap::from([("Monday".to_string(), Set::from([0, 1]))]),
                },
                Therapist {
                    id: "T2".to_string(),
                    specialties: Set::from(["lang".to_string()]),
                    availability: BTreeMap::from([("Tuesday".to_string(), Set::from([0]))]),
                },
            ],
            vec![Patient {
                id: "P1".to_string(),
                therapies: BTreeMap::from([("speech".to_string(), 1)]),
                availability: BTreeMap::from([("Monday".to_string(), Set::from([0, 1]))]),
                max_continuous_hours: 3,
                no_same_day_therapies: Set::new(),
                fixed_therapists: BTreeMap::from([(
                    "speech".to_string(),
                    BTreeMap::from([("lang".to_string(), vec!["T2".to_string()])]),
                )]),
                pinned_sessions: BTreeMap::new(),
            }],
            vec![crate::instance::Room {
                id: "R1".to_string(),
                therapies: Set::from(["speech".to_string()]),
                capacity: 1,
            }],
            Set::from(["lang".to_string()]),
            BTreeMap::from([("speech".to_string(), therapy)]),
        )
        .unwrap();
        let idx = Index::build(&instance);
        let options = SolverOptions { time_limit_secs: 5.0, ..SolverOptions::default() };
        let core = core_labels(&instance, &idx, &options).expect("model should be infeasible");
        assert!(core.contains("fixed_therapist|P1|speech|lang|T2"));
    }
}
