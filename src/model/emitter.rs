//! The constraint emitter: one traversal of the index space, three ways to
//! turn what it finds into a CP-SAT constraint (§9). A constraint "group" is
//! the hard rule for one (patient, therapy) pair, one session, etc.; each
//! group gets a stable label so the three modes stay addressable by the same
//! name.
//!
//! - `Hard`: emits the constraint unconditionally (the primary solve).
//! - `AssumptionGuarded`: skips a group entirely if its label is in the
//!   caller-supplied `disabled` set. Re-solving with different `disabled`
//!   sets is how the assumption-core explainer (§4.5.2) finds a sufficient
//!   infeasible subset, since this binding does not expose native solver
//!   assumption literals.
//! - `Soft`: replaces the constraint with a slacked version and records the
//!   slack variable against the group's label, for the soft-slack explainer
//!   (§4.5.3).

use std::cell::RefCell;
use std::collections::BTreeSet;

use cp_sat::builder::{BoolVar, CpModelBuilder, IntVar, LinearExpr};

/// One slack variable introduced by `Soft` mode, tagged with the label and a
/// human-readable description of what it measures.
pub struct SlackRecord {
    pub label: String,
    pub description: String,
    pub bound: SlackBound,
}

/// The slack variable itself, boolean for per-assignment slacks (fixed
/// therapist) and a bounded integer everywhere else.
pub enum SlackBound {
    Bool(BoolVar),
    Int(IntVar),
}

pub enum Mode<'a> {
    Hard,
    AssumptionGuarded { disabled: &'a BTreeSet<String> },
    Soft { slacks: &'a RefCell<Vec<SlackRecord>> },
}

/// Thin wrapper that routes constraint emission through the active [`Mode`].
pub struct Emitter<'a, 'm> {
    pub model: &'m mut CpModelBuilder,
    pub mode: Mode<'a>,
    /// Every label this emitter has been asked to emit, whether or not it
    /// was actually active. A first assumption-guarded pass with an empty
    /// `disabled` set uses this to discover the full candidate label set
    /// without a second traversal of the index space.
    seen: RefCell<BTreeSet<String>>,
}

impl<'a, 'm> Emitter<'a, 'm> {
    pub fn new(model: &'m mut CpModelBuilder, mode: Mode<'a>) -> Self {
        Emitter { model, mode, seen: RefCell::new(BTreeSet::new()) }
    }

    /// All labels seen so far, in label order.
    pub fn seen_labels(&self) -> BTreeSet<String> {
        self.seen.borrow().clone()
    }

    fn active(&self, label: &str) -> bool {
        self.seen.borrow_mut().insert(label.to_string());
        match &self.mode {
            Mode::Hard => true,
            Mode::AssumptionGuarded { disabled } => !disabled.contains(label),
            Mode::Soft { .. } => true,
        }
    }

    /// `lhs == rhs`, softened (when in `Soft` mode) as `lhs + slack == rhs`
    /// with `slack` a bounded integer in `[0, slack_bound]`.
    pub fn eq(&mut self, label: impl Into<String>, description: impl Into<String>, lhs: LinearExpr, rhs: i64, slack_bound: i64) {
        let label = label.into();
        if !self.active(&label) {
            return;
        }
        match &self.mode {
            Mode::Hard | Mode::AssumptionGuarded { .. } => {
                self.model.add_eq(lhs, LinearExpr::from(rhs));
            }
            Mode::Soft { slacks } => {
                let slack = self.model.new_int_var(vec![(0, slack_bound)]);
                self.model.add_eq(lhs + LinearExpr::from(slack.clone()), LinearExpr::from(rhs));
                slacks.borrow_mut().push(SlackRecord {
                    label,
                    description: description.into(),
                    bound: SlackBound::Int(slack),
                });
            }
        }
    }

    /// `lhs <= rhs`, softened as `lhs <= rhs + slack`.
    pub fn le(&mut self, label: impl Into<String>, description: impl Into<String>, lhs: LinearExpr, rhs: i64, slack_bound: i64) {
        let label = label.into();
        if !self.active(&label) {
            return;
        }
        match &self.mode {
            Mode::Hard | Mode::AssumptionGuarded { .. } => {
                self.model.add_le(lhs, LinearExpr::from(rhs));
            }
            Mode::Soft { slacks } => {
                let slack = self.model.new_int_var(vec![(0, slack_bound)]);
                self.model.add_le(lhs, LinearExpr::from(rhs) + LinearExpr::from(slack.clone()));
                slacks.borrow_mut().push(SlackRecord {
                    label,
                    description: description.into(),
                    bound: SlackBound::Int(slack),
                });
            }
        }
    }

    /// `lhs >= k * active_var`, softened as `lhs + slack >= k * active_var`.
    pub fn ge_scaled(
        &mut self,
        label: impl Into<String>,
        description: impl Into<String>,
        lhs: LinearExpr,
        k: i64,
        active_var: BoolVar,
        slack_bound: i64,
    ) {
        let label = label.into();
        if !self.active(&label) {
            return;
        }
        let rhs: LinearExpr = std::iter::once((k, active_var)).collect();
        match &self.mode {
            Mode::Hard | Mode::AssumptionGuarded { .. } => {
                self.model.add_ge(lhs, rhs);
            }
            Mode::Soft { slacks } => {
                let slack = self.model.new_int_var(vec![(0, slack_bound)]);
                self.model.add_ge(lhs + LinearExpr::from(slack.clone()), rhs);
                slacks.borrow_mut().push(SlackRecord {
                    label,
                    description: description.into(),
                    bound: SlackBound::Int(slack),
                });
            }
        }
    }

    /// `lhs == k * active_var`, softened as `lhs + slack == k * active_var`.
    pub fn eq_scaled(
        &mut self,
        label: impl Into<String>,
        description: impl Into<String>,
        lhs: LinearExpr,
        k: i64,
        active_var: BoolVar,
        slack_bound: i64,
    ) {
        let label = label.into();
        if !self.active(&label) {
            return;
        }
        let rhs: LinearExpr = std::iter::once((k, active_var)).collect();
        match &self.mode {
            Mode::Hard | Mode::AssumptionGuarded { .. } => {
                self.model.add_eq(lhs, rhs);
            }
            Mode::Soft { slacks } => {
                let slack = self.model.new_int_var(vec![(0, slack_bound)]);
                self.model.add_eq(lhs + LinearExpr::from(slack.clone()), rhs);
                slacks.borrow_mut().push(SlackRecord {
                    label,
                    description: description.into(),
                    bound: SlackBound::Int(slack),
                });
            }
        }
    }

    /// `x <= y` (fixed-therapist linking), softened as `x <= y + slack` with
    /// a boolean slack.
    pub fn le_bool_slack(&mut self, label: impl Into<String>, description: impl Into<String>, x: BoolVar, y: LinearExpr) {
        let label = label.into();
        if !self.active(&label) {
            return;
        }
        match &self.mode {
            Mode::Hard | Mode::AssumptionGuarded { .. } => {
                self.model.add_le(LinearExpr::from(x), y);
            }
            Mode::Soft { slacks } => {
                let slack = self.model.new_bool_var();
                self.model.add_le(LinearExpr::from(x), y + LinearExpr::from(slack.clone()));
                slacks.borrow_mut().push(SlackRecord {
                    label,
                    description: description.into(),
                    bound: SlackBound::Bool(slack),
                });
            }
        }
    }

    /// `x == 0` (no candidate staff/staff-less fixed-therapist binding),
    /// softened as `x <= slack` with a boolean slack.
    pub fn force_zero(&mut self, label: impl Into<String>, description: impl Into<String>, x: BoolVar) {
        let label = label.into();
        if !self.active(&label) {
            return;
        }
        match &self.mode {
            Mode::Hard | Mode::AssumptionGuarded { .. } => {
                self.model.add_eq(LinearExpr::from(x), LinearExpr::from(0));
            }
            Mode::Soft { slacks } => {
                let slack = self.model.new_bool_var();
                self.model.add_le(LinearExpr::from(x), LinearExpr::from(slack.clone()));
                slacks.borrow_mut().push(SlackRecord {
                    label,
                    description: description.into(),
                    bound: SlackBound::Bool(slack),
                });
            }
        }
    }

    /// Constraint groups the design notes (§9 Open Questions) exclude from
    /// softening (pinning, one-at-a-time, continuous-hours, session-active
    /// linking): always emitted hard, but still skippable when `disabled`
    /// names the label, so the assumption-core explainer can still toggle
    /// them.
    pub fn hard_eq(&mut self, label: impl Into<String>, lhs: LinearExpr, rhs: i64) {
        let label = label.into();
        if !self.active(&label) {
            return;
        }
        self.model.add_eq(lhs, LinearExpr::from(rhs));
    }

    pub fn hard_le(&mut self, label: impl Into<String>, lhs: LinearExpr, rhs: i64) {
        let label = label.into();
        if !self.active(&label) {
            return;
        }
        self.model.add_le(lhs, LinearExpr::from(rhs));
    }
}
