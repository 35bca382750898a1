//! End-to-end solve scenarios against small, literal instances.

use std::collections::{BTreeMap, BTreeSet};

use therapy_scheduler_core::model::objective::ObjectiveWeights;
use therapy_scheduler_core::solve::{solve, SolverOptions};
use therapy_scheduler_core::{
    instance::{Patient, PinnedSession, Room, Therapist, TherapyInfo},
    Instance, SolveStatus,
};

fn fast_options() -> SolverOptions {
    SolverOptions { time_limit_secs: 5.0, ..SolverOptions::default() }
}

fn speech_therapy(min_patients: u32, max_patients: u32) -> TherapyInfo {
    TherapyInfo {
        requirements: BTreeMap::from([("lang".to_string(), 1)]),
        min_patients,
        max_patients,
    }
}

fn t1() -> Therapist {
    Therapist {
        id: "T1".to_string(),
        specialties: BTreeSet::from(["lang".to_string()]),
        availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0, 1]))]),
    }
}

fn p1(required: u32) -> Patient {
    Patient {
        id: "P1".to_string(),
        therapies: BTreeMap::from([("speech".to_string(), required)]),
        availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0, 1]))]),
        max_continuous_hours: 3,
        no_same_day_therapies: BTreeSet::new(),
        fixed_therapists: BTreeMap::new(),
        pinned_sessions: BTreeMap::new(),
    }
}

fn r1() -> Room {
    Room { id: "R1".to_string(), therapies: BTreeSet::from(["speech".to_string()]), capacity: 1 }
}

/// S1 — minimal feasible instance: one session, P1 attends, T1 staffs.
#[test]
fn s1_minimal_feasible() {
    let instance = Instance::build(
        vec![t1()],
        vec![p1(1)],
        vec![r1()],
        BTreeSet::from(["lang".to_string()]),
        BTreeMap::from([("speech".to_string(), speech_therapy(1, 1))]),
    )
    .unwrap();

    let result = solve(&instance, ObjectiveWeights { w_days: 1, w_gap: 0 }, &fast_options());

    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.schedule.len(), 1);
    let session = &result.schedule[0];
    assert_eq!(session.day, "Monday");
    assert!(session.time == "08:00-09:00" || session.time == "09:00-10:00");
    assert_eq!(session.patient_ids, vec!["P1".to_string()]);
    assert_eq!(session.staff.len(), 1);
    assert_eq!(session.staff[0].therapist_id, "T1");
    assert_eq!(result.objective_value, 1.0);
}

/// S2 — a pin forces the session onto a specific block.
#[test]
fn s2_pin_forces_choice() {
    let mut patient = p1(1);
    patient
        .pinned_sessions
        .insert("speech".to_string(), vec![PinnedSession { day: "Monday".to_string(), block: 1 }]);

    let instance = Instance::build(
        vec![t1()],
        vec![patient],
        vec![r1()],
        BTreeSet::from(["lang".to_string()]),
        BTreeMap::from([("speech".to_string(), speech_therapy(1, 1))]),
    )
    .unwrap();

    let result = solve(&instance, ObjectiveWeights::default(), &fast_options());

    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.schedule.len(), 1);
    assert_eq!(result.schedule[0].day, "Monday");
    assert_eq!(result.schedule[0].time, "09:00-10:00");
}

/// S3 — removing the only allowing room makes the instance infeasible.
#[test]
fn s3_infeasible_by_room() {
    let instance = Instance::build(
        vec![t1()],
        vec![p1(1)],
        vec![],
        BTreeSet::from(["lang".to_string()]),
        BTreeMap::from([("speech".to_string(), speech_therapy(1, 1))]),
    )
    .unwrap();

    let result = solve(&instance, ObjectiveWeights::default(), &fast_options());

    assert_eq!(result.status, SolveStatus::Infeasible);
    assert!(result.schedule.is_empty());
    assert!(result
        .diagnostics_by_method
        .prechecks
        .iter()
        .any(|m| m.contains("not allowed in any room")));
    assert!(result
        .diagnostics_by_method
        .prechecks
        .iter()
        .any(|m| m.contains("Patient 'P1' needs 'speech'")));
}

/// S4 — a no-same-day requirement that needs more days than are available.
#[test]
fn s4_infeasible_by_no_same_day() {
    let mut patient = p1(2);
    patient.no_same_day_therapies.insert("speech".to_string());

    let instance = Instance::build(
        vec![t1()],
        vec![patient],
        vec![r1()],
        BTreeSet::from(["lang".to_string()]),
        BTreeMap::from([("speech".to_string(), speech_therapy(1, 1))]),
    )
    .unwrap();

    let result = solve(&instance, ObjectiveWeights::default(), &fast_options());

    assert_eq!(result.status, SolveStatus::Infeasible);
    assert!(result
        .diagnostics_by_method
        .prechecks
        .iter()
        .any(|m| m.contains("no_same_day") && m.contains('2') && m.contains('1')));
}

/// S5 — a fixed therapist who is never available overlapping the patient.
#[test]
fn s5_fixed_therapist_impossible() {
    let mut therapists = vec![t1()];
    therapists.push(Therapist {
        id: "T2".to_string(),
        specialties: BTreeSet::from(["lang".to_string()]),
        availability: BTreeMap::from([("Tuesday".to_string(), BTreeSet::from([0]))]),
    });

    let mut patient = p1(1);
    patient
        .fixed_therapists
        .insert("speech".to_string(), BTreeMap::from([("lang".to_string(), vec!["T2".to_string()])]));

    let instance = Instance::build(
        therapists,
        vec![patient],
        vec![r1()],
        BTreeSet::from(["lang".to_string()]),
        BTreeMap::from([("speech".to_string(), speech_therapy(1, 1))]),
    )
    .unwrap();

    let result = solve(&instance, ObjectiveWeights::default(), &fast_options());

    assert_eq!(result.status, SolveStatus::Infeasible);
    assert!(result
        .diagnostics_by_method
        .prechecks
        .iter()
        .any(|m| m.contains("requires therapist 'T2'") && m.contains("no slots")));
    assert!(result
        .diagnostics_by_method
        .assumptions
        .iter()
        .any(|m| m.contains("requires therapist 'T2'")));
}

/// S6 — gap minimization prefers back-to-back blocks over a split shift.
#[test]
fn s6_gap_minimization_prefers_contiguous_blocks() {
    let therapist = Therapist {
        id: "T1".to_string(),
        specialties: BTreeSet::from(["lang".to_string()]),
        availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0, 1, 2]))]),
    };
    let patients = vec![
        Patient {
            id: "P1".to_string(),
            therapies: BTreeMap::from([("speech".to_string(), 1)]),
            availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0, 2]))]),
            max_continuous_hours: 3,
            no_same_day_therapies: BTreeSet::new(),
            fixed_therapists: BTreeMap::new(),
            pinned_sessions: BTreeMap::new(),
        },
        Patient {
            id: "P2".to_string(),
            therapies: BTreeMap::from([("speech".to_string(), 1)]),
            availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([1, 2]))]),
            max_continuous_hours: 3,
            no_same_day_therapies: BTreeSet::new(),
            fixed_therapists: BTreeMap::new(),
            pinned_sessions: BTreeMap::new(),
        },
    ];

    let instance = Instance::build(
        vec![therapist],
        patients,
        vec![r1()],
        BTreeSet::from(["lang".to_string()]),
        BTreeMap::from([("speech".to_string(), speech_therapy(1, 1))]),
    )
    .unwrap();

    let result = solve(&instance, ObjectiveWeights { w_days: 0, w_gap: 1 }, &fast_options());

    assert_eq!(result.status, SolveStatus::Optimal);
    let blocks: BTreeSet<&str> = result.schedule.iter().map(|s| s.time.as_str()).collect();
    let has_gap_free_pair = blocks.contains("08:00-09:00") && blocks.contains("09:00-10:00")
        || blocks.contains("09:00-10:00") && blocks.contains("10:00-11:00");
    assert!(has_gap_free_pair, "expected contiguous blocks, got {blocks:?}");
    assert_eq!(result.objective_value, 0.0);
}
