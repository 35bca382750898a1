//! Soft-slack (§4.5.3): rebuilds the model with every softenable hard
//! constraint group relaxed by a slack variable, minimizes the sum of
//! slacks, and reports which groups were violated and by how much.
//!
//! Per §9's open question, pinning, patient/therapist/room one-at-a-time,
//! continuous-hours, and the session-active linking constraints are never
//! softened (the emitter's `hard_eq`/`hard_le`/`add_le` linking calls stay
//! hard even in [`Mode::Soft`]) — so this relaxation can itself be
//! infeasible in rare cases. That is preserved behavior, not a bug.

use std::cell::RefCell;

use cp_sat::builder::{CpModelBuilder, LinearExpr};
use cp_sat::proto::CpSolverResponse;

use crate::instance::Instance;
use crate::model::emitter::{Mode, SlackBound, SlackRecord};
use crate::model::ids::Index;
use crate::solve::{build_parameters, map_status, SolveStatus, SolverOptions};

const MAX_MESSAGES: usize = 20;

fn slack_expr(bound: &SlackBound) -> LinearExpr {
    match bound {
        SlackBound::Bool(v) => LinearExpr::from(v.clone()),
        SlackBound::Int(v) => LinearExpr::from(v.clone()),
    }
}

fn slack_value(bound: &SlackBound, response: &CpSolverResponse) -> i64 {
    match bound {
        SlackBound::Bool(v) => i64::from(v.solution_value(response)),
        SlackBound::Int(v) => v.solution_value(response),
    }
}

/// Rebuilds the model in [`Mode::Soft`], minimizes the total slack, and
/// reports one message per non-zero slack (capped at 20, with an
/// "...and N more" tail).
pub fn run(instance: &Instance, idx: &Index, options: &SolverOptions) -> Vec<String> {
    let slacks: RefCell<Vec<SlackRecord>> = RefCell::new(Vec::new());
    let mut model = CpModelBuilder::default();
    crate::model::build(&mut model, instance, idx, Mode::Soft { slacks: &slacks });

    let objective = {
        let records = slacks.borrow();
        let mut expr = LinearExpr::from(0);
        for record in records.iter() {
            expr = expr + slack_expr(&record.bound);
        }
        expr
    };
    model.minimize(objective);

    let params = build_parameters(options);
    let response = model.solve_with_parameters(&params);
    let status = map_status(response.status());

    if !matches!(status, SolveStatus::Optimal | SolveStatus::Feasible) {
        return vec![
            "the soft-slack relaxation is itself infeasible: constraints exempted from softening (pinning, one-at-a-time, continuous-hours, session-active linking) still conflict".to_string(),
        ];
    }

    let records = slacks.borrow();
    let mut violations: Vec<(String, i64)> = records
        .iter()
        .filter_map(|record| {
            let value = slack_value(&record.bound, &response);
            (value > 0).then(|| (format!("{} (deficit {value})", record.description), value))
        })
        .collect();
    violations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let total = violations.len();
    let mut messages: Vec<String> = violations.into_iter().take(MAX_MESSAGES).map(|(msg, _)| msg).collect();
    if total > MAX_MESSAGES {
        messages.push(format!("...and {} more", total - MAX_MESSAGES));
    }
    messages
}
