//! The solve driver (§4.4): builds the primary hard model, runs the
//! underlying CP-SAT solver under a time limit, and extracts a schedule
//! from a feasible solution. On non-success, hands off to [`crate::diagnostics`].

use cp_sat::builder::CpModelBuilder;
use cp_sat::proto::{CpSolverResponse, CpSolverStatus, SatParameters};
use serde::{Deserialize, Serialize};

use crate::diagnostics;
use crate::instance::Instance;
use crate::model::emitter::Mode;
use crate::model::ids::Index;
use crate::model::objective::{self, ObjectiveWeights};
use crate::model::vars::VariableSet;
use crate::schedule::{sort_schedule, SessionRecord, StaffEntry};
use crate::time::{self, DAY_ORDER};

/// The knobs this design cares about keeping stable across calls: a time
/// limit, a logging toggle, and the reproducibility/search-diversification
/// parameters the teacher crate already threads through to `SatParameters`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverOptions {
    pub time_limit_secs: f64,
    pub log: bool,
    pub random_seed: i64,
    pub num_workers: i32,
    pub randomize_search: bool,
    pub interleave_search: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            time_limit_secs: 30.0,
            log: false,
            random_seed: 42,
            num_workers: 8,
            randomize_search: true,
            interleave_search: true,
        }
    }
}

/// One of the five solver-reported outcomes (§4.4/§7). Never an error:
/// a non-success status is a normal result whose `diagnostics` carry the
/// explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
    ModelInvalid,
}

/// `{assumptions, prechecks, soft} -> list of strings` (§4.6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsByMethod {
    pub prechecks: Vec<String>,
    pub assumptions: Vec<String>,
    pub soft: Vec<String>,
}

/// The full result of one `solve` call (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub objective_value: f64,
    pub schedule: Vec<SessionRecord>,
    pub diagnostics: Vec<String>,
    pub diagnostics_by_method: DiagnosticsByMethod,
}

pub(crate) fn map_status(status: CpSolverStatus) -> SolveStatus {
    match status {
        CpSolverStatus::Optimal => SolveStatus::Optimal,
        CpSolverStatus::Feasible => SolveStatus::Feasible,
        CpSolverStatus::Infeasible => SolveStatus::Infeasible,
        CpSolverStatus::ModelInvalid => SolveStatus::ModelInvalid,
        CpSolverStatus::Unknown => SolveStatus::Unknown,
    }
}

pub(crate) fn build_parameters(options: &SolverOptions) -> SatParameters {
    let mut params = SatParameters::default();
    params.max_time_in_seconds = Some(options.time_limit_secs);
    params.num_search_workers = Some(options.num_workers);
    params.random_seed = Some(options.random_seed);
    params.randomize_search = Some(options.randomize_search);
    params.interleave_search = Some(options.interleave_search);
    params.log_search_progress = Some(options.log);
    params
}

/// The single entry point of the core: `solve(instance, weights, options) ->
/// SolveResult` (§6).
pub fn solve(instance: &Instance, weights: ObjectiveWeights, options: &SolverOptions) -> SolveResult {
    log::info!(
        "solve: starting (therapists={}, patients={}, rooms={}, therapies={})",
        instance.therapists.len(),
        instance.patients.len(),
        instance.rooms.len(),
        instance.therapies.len(),
    );

    let idx = Index::build(instance);
    let mut model = CpModelBuilder::default();
    let (vars, _labels) = crate::model::build(&mut model, instance, &idx, Mode::Hard);
    let indicators = objective::build_indicators(&mut model, instance, &idx, &vars);
    objective::apply_objective(&mut model, &indicators, weights);

    log::debug!(
        "solve: built {} session_active, {} patient_in_session, {} staff variables",
        vars.session_active.len(),
        vars.patient_in_session.len(),
        vars.staff.len(),
    );

    let params = build_parameters(options);
    let response = model.solve_with_parameters(&params);
    let status = map_status(response.status());

    log::info!("solve: status={status:?}");

    match status {
        SolveStatus::Optimal | SolveStatus::Feasible => {
            let schedule = extract_schedule(instance, &idx, &vars, &response);
            SolveResult {
                status,
                objective_value: response.objective_value,
                schedule,
                diagnostics: Vec::new(),
                diagnostics_by_method: DiagnosticsByMethod::default(),
            }
        }
        SolveStatus::Infeasible | SolveStatus::Unknown | SolveStatus::ModelInvalid => {
            log::warn!("solve: no feasible solution, running diagnostics");
            let report = diagnostics::run(instance, &idx, options);
            log::info!(
                "solve: diagnostics produced {} precheck, {} assumption, {} soft message(s)",
                report.prechecks.len(),
                report.assumptions.len(),
                report.soft.len(),
            );
            SolveResult {
                status,
                objective_value: 0.0,
                schedule: Vec::new(),
                diagnostics: report.flattened(),
                diagnostics_by_method: DiagnosticsByMethod {
                    prechecks: report.prechecks,
                    assumptions: report.assumptions,
                    soft: report.soft,
                },
            }
        }
    }
}

/// Reads back every active session from a feasible `response`, with its
/// attending patients and staffing therapists (§4.4).
fn extract_schedule(instance: &Instance, idx: &Index, vars: &VariableSet, response: &CpSolverResponse) -> Vec<SessionRecord> {
    let mut schedule = Vec::new();

    for (key, session_var) in &vars.session_active {
        if !session_var.solution_value(response) {
            continue;
        }
        let therapy_id = idx.therapies.id(key.therapy).to_string();
        let room_id = idx.rooms.id(key.room).to_string();
        let day = DAY_ORDER[key.day as usize].to_string();

        debug_assert!(
            instance.rooms.iter().any(|r| r.id == room_id && r.therapies.contains(&therapy_id)),
            "session built for a therapy the room does not allow"
        );

        let patient_ids: Vec<String> = vars
            .patient_in_session
            .iter()
            .filter(|(k, _)| k.therapy == key.therapy && k.room == key.room && k.day == key.day && k.block == key.block)
            .filter(|(_, v)| v.solution_value(response))
            .map(|(k, _)| idx.patients.id(k.patient).to_string())
            .collect();

        let staff: Vec<StaffEntry> = vars
            .staff
            .iter()
            .filter(|(k, _)| k.therapy == key.therapy && k.room == key.room && k.day == key.day && k.block == key.block)
            .filter(|(_, v)| v.solution_value(response))
            .map(|(k, _)| StaffEntry {
                specialty: idx.specialties.id(k.specialty).to_string(),
                therapist_id: idx.therapists.id(k.therapist).to_string(),
            })
            .collect();

        schedule.push(SessionRecord {
            therapy_id,
            room_id,
            day,
            time: time::block_to_range(key.block as usize).to_string(),
            patient_ids,
            staff,
        });
    }

    sort_schedule(&mut schedule);
    schedule
}
