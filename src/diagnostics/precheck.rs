//! Precheck (§4.5.1): purely structural infeasibility diagnostics read off
//! variable counts and `Instance` structure directly, with no solver run.

use std::collections::BTreeSet;

use crate::instance::{Instance, Patient, Room};
use crate::model::ids::Index;
use crate::time::DAY_ORDER;

fn rooms_allowing<'a>(instance: &'a Instance, therapy_id: &str) -> Vec<&'a Room> {
    instance.rooms.iter().filter(|r| r.therapies.contains(therapy_id)).collect()
}

fn availability_blocks(patient: &Patient, day: &str) -> BTreeSet<usize> {
    patient.availability.get(day).cloned().unwrap_or_default()
}

fn pinned_blocks(patient: &Patient, therapy_id: &str, day: &str) -> BTreeSet<usize> {
    patient
        .pinned_sessions
        .get(therapy_id)
        .map(|pins| pins.iter().filter(|pin| pin.day == day).map(|pin| pin.block).collect())
        .unwrap_or_default()
}

/// Candidate `patient_in_session` blocks on `day`: availability OR a pin
/// for this exact `(therapy, day, ...)`, per §4.1's pin-inclusion rule.
fn candidate_blocks(patient: &Patient, therapy_id: &str, day: &str) -> BTreeSet<usize> {
    let mut blocks = availability_blocks(patient, day);
    blocks.extend(pinned_blocks(patient, therapy_id, day));
    blocks
}

/// Number of candidate `(room, block)` tuples for `(patient, therapy)` on
/// `day` — zero if no room allows the therapy at all.
fn feasible_slot_count_on_day(instance: &Instance, patient: &Patient, therapy_id: &str, day: &str) -> usize {
    let room_count = rooms_allowing(instance, therapy_id).len();
    if room_count == 0 {
        return 0;
    }
    candidate_blocks(patient, therapy_id, day).len() * room_count
}

fn total_candidate_count(instance: &Instance, patient: &Patient, therapy_id: &str) -> usize {
    DAY_ORDER.iter().map(|day| feasible_slot_count_on_day(instance, patient, therapy_id, day)).sum()
}

/// Reports every structural issue the index-space layout can reveal
/// without running a solver (§4.5.1).
pub fn run(instance: &Instance, _idx: &Index) -> Vec<String> {
    let mut out = Vec::new();

    for therapy_id in instance.therapies.keys() {
        if rooms_allowing(instance, therapy_id).is_empty() {
            out.push(format!("Therapy '{therapy_id}' is not allowed in any room."));
        }
    }

    for (therapy_id, info) in &instance.therapies {
        if rooms_allowing(instance, therapy_id).is_empty() {
            continue;
        }
        let total: usize = instance.patients.iter().map(|p| total_candidate_count(instance, p, therapy_id)).sum();
        if total == 0 {
            out.push(format!(
                "Therapy '{therapy_id}' has {} required patient(s) but zero feasible patient attendance slots exist across the week.",
                info.min_patients
            ));
        }
        for specialty in info.requirements.keys() {
            let any_staff = instance
                .therapists
                .iter()
                .any(|t| t.specialties.contains(specialty) && t.availability.values().any(|blocks| !blocks.is_empty()));
            if !any_staff {
                out.push(format!(
                    "Therapy '{therapy_id}' requires specialty '{specialty}', but no therapist holds it with any availability."
                ));
            }
        }
    }

    for patient in &instance.patients {
        for (therapy_id, &required) in &patient.therapies {
            if required == 0 {
                continue;
            }
            let count = total_candidate_count(instance, patient, therapy_id);
            if count < required as usize {
                if count == 0 {
                    if rooms_allowing(instance, therapy_id).is_empty() {
                        out.push(format!("Patient '{}' needs '{therapy_id}' but no room allows that therapy.", patient.id));
                    } else if patient.availability.values().all(|blocks| blocks.is_empty())
                        && patient.pinned_sessions.get(therapy_id).map_or(true, |p| p.is_empty())
                    {
                        out.push(format!(
                            "Patient '{}' needs '{therapy_id}' but has stated no availability at all.",
                            patient.id
                        ));
                    } else {
                        out.push(format!(
                            "Patient '{}' needs {required} session(s) of '{therapy_id}' but has zero feasible slots.",
                            patient.id
                        ));
                    }
                } else {
                    let per_day: Vec<String> = DAY_ORDER
                        .iter()
                        .map(|day| format!("{day}={}", feasible_slot_count_on_day(instance, patient, therapy_id, day)))
                        .collect();
                    out.push(format!(
                        "Patient '{}' needs {required} session(s) of '{therapy_id}' but only {count} feasible slot(s) exist ({}).",
                        patient.id,
                        per_day.join(", ")
                    ));
                }
            }

            if patient.no_same_day_therapies.contains(therapy_id) {
                let days_with_slot = DAY_ORDER
                    .iter()
                    .filter(|day| feasible_slot_count_on_day(instance, patient, therapy_id, day) > 0)
                    .count();
                if (days_with_slot as u32) < required {
                    out.push(format!(
                        "Patient '{}' needs {required} session(s) of '{therapy_id}' spread across distinct days (no_same_day), but only {days_with_slot} day(s) have a feasible slot.",
                        patient.id
                    ));
                }
            }
        }

        for (therapy_id, pins) in &patient.pinned_sessions {
            let rooms = rooms_allowing(instance, therapy_id);
            for pin in pins {
                let has_candidate = !rooms.is_empty();
                if !has_candidate {
                    out.push(format!(
                        "Patient '{}' pins '{therapy_id}' on {} block {} but no room allows that therapy.",
                        patient.id, pin.day, pin.block
                    ));
                }
            }
        }

        for (therapy_id, by_specialty) in &patient.fixed_therapists {
            for (specialty, therapist_ids) in by_specialty {
                for therapist_id in therapist_ids {
                    let Some(therapist) = instance.therapists.iter().find(|t| &t.id == therapist_id) else {
                        out.push(format!(
                            "Patient '{}' requires unknown therapist '{therapist_id}' for '{therapy_id}' ({specialty}).",
                            patient.id
                        ));
                        continue;
                    };
                    if !therapist.specialties.contains(specialty) {
                        out.push(format!(
                            "Patient '{}' requires therapist '{therapist_id}' for '{therapy_id}' ({specialty}), but that therapist lacks '{specialty}'.",
                            patient.id
                        ));
                        continue;
                    }
                    let rooms_exist = !rooms_allowing(instance, therapy_id).is_empty();
                    let mut overlap = false;
                    if rooms_exist {
                        'days: for day in DAY_ORDER {
                            let Some(therapist_blocks) = therapist.availability.get(day) else { continue };
                            let candidates = candidate_blocks(patient, therapy_id, day);
                            for block in candidates {
                                if therapist_blocks.contains(&block) {
                                    overlap = true;
                                    break 'days;
                                }
                            }
                        }
                    }
                    if !overlap {
                        out.push(format!(
                            "Patient '{}' requires therapist '{therapist_id}' for '{therapy_id}' ({specialty}), but there are no slots where both the patient and that therapist are available.",
                            patient.id
                        ));
                    }
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::instance::{PinnedSession, TherapyInfo};

    fn speech_therapy() -> TherapyInfo {
        TherapyInfo {
            requirements: BTreeMap::from([("lang".to_string(), 1)]),
            min_patients: 1,
            max_patients: 1,
        }
    }

    #[test]
    fn reports_therapy_with_no_allowing_room() {
        let instance = Instance::build(
            vec![],
            vec![Patient {
                id: "P1".to_string(),
                therapies: BTreeMap::from([("speech".to_string(), 1)]),
                availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0]))]),
                max_continuous_hours: 3,
                no_same_day_therapies: BTreeSet::new(),
                fixed_therapists: BTreeMap::new(),
                pinned_sessions: BTreeMap::new(),
            }],
            vec![],
            BTreeSet::from(["lang".to_string()]),
            BTreeMap::from([("speech".to_string(), speech_therapy())]),
        )
        .unwrap();
        let idx = Index::build(&instance);
        let messages = run(&instance, &idx);
        assert!(messages.iter().any(|m| m.contains("not allowed in any room")));
    }

    #[test]
    fn reports_no_same_day_week_cap_shortfall() {
        let instance = Instance::build(
            vec![crate::instance::Therapist {
                id: "T1".to_string(),
                specialties: BTreeSet::from(["lang".to_string()]),
                availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0, 1]))]),
            }],
            vec![Patient {
                id: "P1".to_string(),
                therapies: BTreeMap::from([("speech".to_string(), 2)]),
                availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0, 1]))]),
                max_continuous_hours: 3,
                no_same_day_therapies: BTreeSet::from(["speech".to_string()]),
                fixed_therapists: BTreeMap::new(),
                pinned_sessions: BTreeMap::new(),
            }],
            vec![Room { id: "R1".to_string(), therapies: BTreeSet::from(["speech".to_string()]), capacity: 1 }],
            BTreeSet::from(["lang".to_string()]),
            BTreeMap::from([("speech".to_string(), speech_therapy())]),
        )
        .unwrap();
        let idx = Index::build(&instance);
        let messages = run(&instance, &idx);
        assert!(messages.iter().any(|m| m.contains("no_same_day") && m.contains('2') && m.contains('1')));
    }

    #[test]
    fn reports_fixed_therapist_with_no_overlap() {
        let instance = Instance::build(
            vec![
                crate::instance::Therapist {
                    id: "T1".to_string(),
                    specialties: BTreeSet::from(["lang".to_string()]),
                    availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0]))]),
                },
                crate::instance::Therapist {
                    id: "T2".to_string(),
                    specialties: BTreeSet::from(["lang".to_string()]),
                    availability: BTreeMap::from([("Tuesday".to_string(), BTreeSet::from([0]))]),
                },
            ],
            vec![Patient {
                id: "P1".to_string(),
                therapies: BTreeMap::from([("speech".to_string(), 1)]),
                availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0]))]),
                max_continuous_hours: 3,
                no_same_day_therapies: BTreeSet::new(),
                fixed_therapists: BTreeMap::from([(
                    "speech".to_string(),
                    BTreeMap::from([("lang".to_string(), vec!["T2".to_string()])]),
                )]),
                pinned_sessions: BTreeMap::new(),
            }],
            vec![Room { id: "R1".to_string(), therapies: BTreeSet::from(["speech".to_string()]), capacity: 1 }],
            BTreeSet::from(["lang".to_string()]),
            BTreeMap::from([("speech".to_string(), speech_therapy())]),
        )
        .unwrap();
        let idx = Index::build(&instance);
        let messages = run(&instance, &idx);
        assert!(messages.iter().any(|m| m.contains("requires therapist 'T2'") && m.contains("no slots")));
    }

    #[test]
    fn pinned_session_at_unreachable_day() {
        let mut therapies = BTreeMap::new();
        therapies.insert("speech".to_string(), speech_therapy());
        let patient = Patient {
            id: "P1".to_string(),
            therapies: BTreeMap::from([("speech".to_string(), 1)]),
            availability: BTreeMap::new(),
            max_continuous_hours: 3,
            no_same_day_therapies: BTreeSet::new(),
            fixed_therapists: BTreeMap::new(),
            pinned_sessions: BTreeMap::from([(
                "speech".to_string(),
                vec![PinnedSession { day: "Monday".to_string(), block: 0 }],
            )]),
        };
        let instance = Instance::build(
            vec![],
            vec![patient],
            vec![],
            BTreeSet::from(["lang".to_string()]),
            therapies,
        )
        .unwrap();
        let idx = Index::build(&instance);
        let messages = run(&instance, &idx);
        assert!(messages.iter().any(|m| m.contains("pins 'speech'") && m.contains("no room allows")));
    }
}
