//! The three complementary infeasibility explainers (§4.5), run in sequence
//! whenever the primary solve does not return OPTIMAL/FEASIBLE. Each
//! operates on a freshly built model over the same [`Instance`], with
//! objective weights set to 0, and none mutates the primary model.

pub mod assumption_core;
pub mod precheck;
pub mod soft_slack;

use crate::instance::Instance;
use crate::model::ids::Index;
use crate::solve::SolverOptions;

/// The three explainers' outputs, kept both separately and (via
/// [`Report::flattened`]) as one prefixed list (§4.6).
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub prechecks: Vec<String>,
    pub assumptions: Vec<String>,
    pub soft: Vec<String>,
}

impl Report {
    pub fn flattened(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.prechecks.len() + self.assumptions.len() + self.soft.len());
        out.extend(self.prechecks.iter().map(|m| format!("[precheck] {m}")));
        out.extend(self.assumptions.iter().map(|m| format!("[assumption-core] {m}")));
        out.extend(self.soft.iter().map(|m| format!("[soft-slack] {m}")));
        out
    }
}

/// Runs precheck, assumption-core, then soft-slack, in that order.
pub fn run(instance: &Instance, idx: &Index, options: &SolverOptions) -> Report {
    log::debug!("diagnostics: running precheck");
    let prechecks = precheck::run(instance, idx);

    log::debug!("diagnostics: running assumption-core");
    let assumptions = assumption_core::run(instance, idx, options);

    log::debug!("diagnostics: running soft-slack");
    let soft = soft_slack::run(instance, idx, options);

    Report { prechecks, assumptions, soft }
}
