//! Builds the two auxiliary indicator families and the weighted objective
//! (§4.3) as a dedicated pass over already-built variables and constraints,
//! rather than mutating state while constraints are emitted.

use std::collections::BTreeMap;

use cp_sat::builder::{BoolVar, CpModelBuilder, LinearExpr};

use crate::instance::Instance;
use crate::model::ids::Index;
use crate::model::vars::VariableSet;
use crate::time::{self, BLOCKS, DAY_ORDER};

/// Relative weight of each soft term; either may be zero to drop that term
/// from the objective entirely.
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveWeights {
    pub w_days: i64,
    pub w_gap: i64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        ObjectiveWeights { w_days: 1, w_gap: 1 }
    }
}

/// The indicator variables built for the objective, kept around so a caller
/// can inspect them after solving (e.g. for reporting).
pub struct Indicators {
    pub patient_day_used: BTreeMap<(u32, u8), BoolVar>,
    pub therapist_busy: BTreeMap<(u32, u8, u8), BoolVar>,
    pub idle_gap: BTreeMap<(u32, u8, u8), BoolVar>,
}

fn sum(vars: impl Iterator<Item = BoolVar>) -> LinearExpr {
    let mut expr = LinearExpr::from(0);
    for v in vars {
        expr = expr + LinearExpr::from(v);
    }
    expr
}

/// `indicator <= sum <= |vars| * indicator`, the standard linearization of
/// "indicator is 1 iff any of these bools is 1".
fn link_any(model: &mut CpModelBuilder, indicator: &BoolVar, terms: &[BoolVar]) {
    let sum_expr = sum(terms.iter().cloned());
    model.add_le(LinearExpr::from(indicator.clone()), sum_expr.clone());
    let upper: LinearExpr = terms.iter().cloned().map(|_| (1i64, indicator.clone())).collect();
    model.add_le(sum_expr, upper);
}

/// Builds `patient_day_used` and `therapist_busy`/`idle_gap` indicators and
/// links them to the underlying assignment variables.
pub fn build_indicators(model: &mut CpModelBuilder, instance: &Instance, idx: &Index, vars: &VariableSet) -> Indicators {
    let mut patient_day_used = BTreeMap::new();
    for patient in &instance.patients {
        let patient_idx = idx.patients.idx(&patient.id).unwrap();
        for (d, _day) in DAY_ORDER.iter().enumerate() {
            let terms: Vec<BoolVar> = vars
                .patient_in_session
                .iter()
                .filter(|(k, _)| k.patient == patient_idx && k.day == d as u8)
                .map(|(_, v)| v.clone())
                .collect();
            if terms.is_empty() {
                continue;
            }
            let indicator = model.new_bool_var();
            link_any(model, &indicator, &terms);
            patient_day_used.insert((patient_idx, d as u8), indicator);
        }
    }

    let mut therapist_busy = BTreeMap::new();
    for therapist in &instance.therapists {
        let therapist_idx = idx.therapists.idx(&therapist.id).unwrap();
        for (d, _day) in DAY_ORDER.iter().enumerate() {
            for &block in &BLOCKS {
                let terms: Vec<BoolVar> = vars.therapist_busy_candidates(therapist_idx, d as u8, block as u8).cloned().collect();
                if terms.is_empty() {
                    continue;
                }
                let indicator = model.new_bool_var();
                link_any(model, &indicator, &terms);
                therapist_busy.insert((therapist_idx, d as u8, block as u8), indicator);
            }
        }
    }

    let mut idle_gap = BTreeMap::new();
    for therapist in &instance.therapists {
        let therapist_idx = idx.therapists.idx(&therapist.id).unwrap();
        for (d, _day) in DAY_ORDER.iter().enumerate() {
            for segment in time::segments() {
                for window in segment.windows(3) {
                    let (prev, curr, next) = (window[0] as u8, window[1] as u8, window[2] as u8);
                    let (Some(busy_prev), Some(busy_curr), Some(busy_next)) = (
                        therapist_busy.get(&(therapist_idx, d as u8, prev)).cloned(),
                        therapist_busy.get(&(therapist_idx, d as u8, curr)).cloned(),
                        therapist_busy.get(&(therapist_idx, d as u8, next)).cloned(),
                    ) else {
                        continue;
                    };
                    let gap = model.new_bool_var();
                    model.add_le(LinearExpr::from(gap.clone()), LinearExpr::from(busy_prev));
                    model.add_le(LinearExpr::from(gap.clone()), LinearExpr::from(busy_next));
                    model.add_le(LinearExpr::from(gap.clone()), LinearExpr::from(1) - LinearExpr::from(busy_curr));
                    idle_gap.insert((therapist_idx, d as u8, curr), gap);
                }
            }
        }
    }

    Indicators { patient_day_used, therapist_busy, idle_gap }
}

/// Builds `min w_days * sum(patient_day_used) + w_gap * sum(idle_gap)` and
/// applies it to `model`. A weight of zero drops its term; if both are zero
/// the objective minimizes the constant `0`.
pub fn apply_objective(model: &mut CpModelBuilder, indicators: &Indicators, weights: ObjectiveWeights) {
    let mut objective = LinearExpr::from(0);
    if weights.w_days != 0 {
        for v in indicators.patient_day_used.values() {
            let term: LinearExpr = std::iter::once((weights.w_days, v.clone())).collect();
            objective = objective + term;
        }
    }
    if weights.w_gap != 0 {
        for v in indicators.idle_gap.values() {
            let term: LinearExpr = std::iter::once((weights.w_gap, v.clone())).collect();
            objective = objective + term;
        }
    }
    model.minimize(objective);
}
