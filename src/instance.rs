//! The validated, immutable problem description a solve runs against.
//!
//! Construction goes through [`Instance::build`], which enforces every
//! cross-entity invariant up front: after that, every other component in
//! this crate may assume the `Instance` it receives is internally
//! consistent and never re-checks those invariants itself.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};
use crate::time::{self, BLOCKS};

/// A therapist: a set of specialties and a weekly availability map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Therapist {
    pub id: String,
    pub specialties: BTreeSet<String>,
    /// `day -> set of available block indices`.
    pub availability: BTreeMap<String, BTreeSet<usize>>,
}

/// A patient's hard preassignment of one `(therapy, day, block)` slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct PinnedSession {
    pub day: String,
    pub block: usize,
}

/// A patient: required session counts per therapy, availability, and the
/// optional hard preferences (continuous-hours cap, no-same-day therapies,
/// fixed therapists, pinned sessions).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patient {
    pub id: String,
    /// `therapy_id -> required session count` (may be 0).
    pub therapies: BTreeMap<String, u32>,
    /// `day -> set of available block indices`.
    pub availability: BTreeMap<String, BTreeSet<usize>>,
    #[serde(default = "default_max_continuous_hours")]
    pub max_continuous_hours: u32,
    #[serde(default)]
    pub no_same_day_therapies: BTreeSet<String>,
    /// `therapy_id -> specialty -> ordered list of therapist ids` the
    /// patient requires staffing that role whenever they attend.
    #[serde(default)]
    pub fixed_therapists: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// `therapy_id -> pinned (day, block) slots`.
    #[serde(default)]
    pub pinned_sessions: BTreeMap<String, Vec<PinnedSession>>,
}

fn default_max_continuous_hours() -> u32 {
    3
}

/// A room: the therapies it may host and its patient capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub therapies: BTreeSet<String>,
    pub capacity: u32,
}

/// A therapy's staffing requirements and patient attendance band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TherapyInfo {
    /// `specialty -> required therapist count` (every count must be > 0).
    pub requirements: BTreeMap<String, u32>,
    pub min_patients: u32,
    pub max_patients: u32,
}

/// The full, validated weekly scheduling problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    pub therapists: Vec<Therapist>,
    pub patients: Vec<Patient>,
    pub rooms: Vec<Room>,
    pub specialties: BTreeSet<String>,
    pub therapies: BTreeMap<String, TherapyInfo>,
}

impl Instance {
    /// Builds an `Instance`, enforcing every invariant in the data model
    /// (§3). Returns the first violation found as a
    /// [`SchedulerError::Validation`].
    pub fn build(
        therapists: Vec<Therapist>,
        patients: Vec<Patient>,
        rooms: Vec<Room>,
        specialties: BTreeSet<String>,
        therapies: BTreeMap<String, TherapyInfo>,
    ) -> Result<Instance> {
        validate(&therapists, &patients, &rooms, &specialties, &therapies)?;
        Ok(Instance {
            therapists,
            patients,
            rooms,
            specialties,
            therapies,
        })
    }
}

fn validate(
    therapists: &[Therapist],
    patients: &[Patient],
    rooms: &[Room],
    specialties: &BTreeSet<String>,
    therapies: &BTreeMap<String, TherapyInfo>,
) -> Result<()> {
    let therapist_ids: BTreeSet<&str> = therapists.iter().map(|t| t.id.as_str()).collect();
    if therapist_ids.len() != therapists.len() {
        return Err(SchedulerError::validation("therapists", "ids must be unique"));
    }
    let patient_ids: BTreeSet<&str> = patients.iter().map(|p| p.id.as_str()).collect();
    if patient_ids.len() != patients.len() {
        return Err(SchedulerError::validation("patients", "ids must be unique"));
    }
    let room_ids: BTreeSet<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
    if room_ids.len() != rooms.len() {
        return Err(SchedulerError::validation("rooms", "ids must be unique"));
    }

    for therapist in therapists {
        for specialty in &therapist.specialties {
            if !specialties.contains(specialty) {
                return Err(SchedulerError::validation(
                    format!("therapist {}", therapist.id),
                    format!("unknown specialty '{specialty}'"),
                ));
            }
        }
        for day in therapist.availability.keys() {
            if !time::is_canonical_day(day) {
                return Err(SchedulerError::validation(
                    format!("therapist {}", therapist.id),
                    format!("invalid day '{day}'"),
                ));
            }
        }
    }

    for (therapy_id, info) in therapies {
        if info.min_patients < 1 || info.max_patients < info.min_patients {
            return Err(SchedulerError::validation(
                format!("therapy '{therapy_id}'"),
                format!(
                    "invalid patient bounds (min={}, max={})",
                    info.min_patients, info.max_patients
                ),
            ));
        }
        if info.requirements.is_empty() {
            return Err(SchedulerError::validation(
                format!("therapy '{therapy_id}'"),
                "must define at least one required specialty",
            ));
        }
        for (specialty, count) in &info.requirements {
            if !specialties.contains(specialty) {
                return Err(SchedulerError::validation(
                    format!("therapy '{therapy_id}'"),
                    format!("unknown specialty '{specialty}'"),
                ));
            }
            if *count == 0 {
                return Err(SchedulerError::validation(
                    format!("therapy '{therapy_id}'"),
                    format!("requires a positive count for '{specialty}'"),
                ));
            }
        }
    }

    for room in rooms {
        if room.capacity < 1 {
            return Err(SchedulerError::validation(
                format!("room {}", room.id),
                "capacity must be positive",
            ));
        }
        for therapy_id in &room.therapies {
            if !therapies.contains_key(therapy_id) {
                return Err(SchedulerError::validation(
                    format!("room {}", room.id),
                    format!("unknown therapy '{therapy_id}'"),
                ));
            }
        }
    }

    for patient in patients {
        for day in patient.availability.keys() {
            if !time::is_canonical_day(day) {
                return Err(SchedulerError::validation(
                    format!("patient {}", patient.id),
                    format!("invalid day '{day}'"),
                ));
            }
        }

        for (therapy_id, required) in &patient.therapies {
            if !therapies.contains_key(therapy_id) {
                return Err(SchedulerError::validation(
                    format!("patient {}", patient.id),
                    format!("unknown therapy '{therapy_id}'"),
                ));
            }
            // required is u32, so "non-negative" is structural; nothing further to check.
            let _ = required;
        }

        for therapy_id in &patient.no_same_day_therapies {
            if !therapies.contains_key(therapy_id) {
                return Err(SchedulerError::validation(
                    format!("patient {}", patient.id),
                    format!("unknown therapy '{therapy_id}' in no_same_day_therapies"),
                ));
            }
        }

        for (therapy_id, by_specialty) in &patient.fixed_therapists {
            let info = therapies.get(therapy_id).ok_or_else(|| {
                SchedulerError::validation(
                    format!("patient {}", patient.id),
                    format!("unknown therapy '{therapy_id}' in fixed_therapists"),
                )
            })?;
            for (specialty, ids) in by_specialty {
                let required_count = *info.requirements.get(specialty).ok_or_else(|| {
                    SchedulerError::validation(
                        format!("patient {}", patient.id),
                        format!(
                            "fixes specialty '{specialty}' for therapy '{therapy_id}', \
                             but the therapy does not require that specialty"
                        ),
                    )
                })?;
                if ids.len() as u32 > required_count {
                    return Err(SchedulerError::validation(
                        format!("patient {}", patient.id),
                        format!(
                            "fixes {} '{specialty}' therapist(s) for therapy '{therapy_id}', \
                             but only {required_count} required",
                            ids.len()
                        ),
                    ));
                }
                let distinct: BTreeSet<&str> = ids.iter().map(|s| s.as_str()).collect();
                if distinct.len() != ids.len() {
                    return Err(SchedulerError::validation(
                        format!("patient {}", patient.id),
                        format!("repeats a fixed therapist for '{therapy_id}' ({specialty})"),
                    ));
                }
                for therapist_id in ids {
                    if !therapist_ids.contains(therapist_id.as_str()) {
                        return Err(SchedulerError::validation(
                            format!("patient {}", patient.id),
                            format!("unknown therapist '{therapist_id}' for therapy '{therapy_id}'"),
                        ));
                    }
                    let therapist = therapists.iter().find(|t| &t.id == therapist_id).unwrap();
                    if !therapist.specialties.contains(specialty) {
                        return Err(SchedulerError::validation(
                            format!("patient {}", patient.id),
                            format!(
                                "fixed therapist '{therapist_id}' lacks specialty '{specialty}' \
                                 for therapy '{therapy_id}'"
                            ),
                        ));
                    }
                }
            }
        }

        for (therapy_id, pins) in &patient.pinned_sessions {
            let required = *patient.therapies.get(therapy_id).unwrap_or(&0);
            if required == 0 {
                return Err(SchedulerError::validation(
                    format!("patient {}", patient.id),
                    format!("pins sessions for '{therapy_id}' but requires none"),
                ));
            }
            if pins.len() as u32 > required {
                return Err(SchedulerError::validation(
                    format!("patient {}", patient.id),
                    format!("pins {} '{therapy_id}' sessions but requires {required}", pins.len()),
                ));
            }
            let mut seen = BTreeSet::new();
            for pin in pins {
                if !time::is_canonical_day(&pin.day) {
                    return Err(SchedulerError::validation(
                        format!("patient {}", patient.id),
                        format!("pins '{therapy_id}' on invalid day '{}'", pin.day),
                    ));
                }
                if !BLOCKS.contains(&pin.block) {
                    return Err(SchedulerError::validation(
                        format!("patient {}", patient.id),
                        format!("pins '{therapy_id}' on invalid block '{}'", pin.block),
                    ));
                }
                if !seen.insert((pin.day.clone(), pin.block)) {
                    return Err(SchedulerError::validation(
                        format!("patient {}", patient.id),
                        format!("repeats pinned '{therapy_id}' on {} block {}", pin.day, pin.block),
                    ));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang_therapy() -> TherapyInfo {
        TherapyInfo {
            requirements: BTreeMap::from([("lang".to_string(), 1)]),
            min_patients: 1,
            max_patients: 1,
        }
    }

    fn minimal_parts() -> (Vec<Therapist>, Vec<Patient>, Vec<Room>, BTreeSet<String>, BTreeMap<String, TherapyInfo>) {
        let specialties = BTreeSet::from(["lang".to_string()]);
        let therapies = BTreeMap::from([("speech".to_string(), lang_therapy())]);
        let therapists = vec![Therapist {
            id: "T1".to_string(),
            specialties: BTreeSet::from(["lang".to_string()]),
            availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0, 1]))]),
        }];
        let patients = vec![Patient {
            id: "P1".to_string(),
            therapies: BTreeMap::from([("speech".to_string(), 1)]),
            availability: BTreeMap::from([("Monday".to_string(), BTreeSet::from([0, 1]))]),
            max_continuous_hours: 3,
            no_same_day_therapies: BTreeSet::new(),
            fixed_therapists: BTreeMap::new(),
            pinned_sessions: BTreeMap::new(),
        }];
        let rooms = vec![Room {
            id: "R1".to_string(),
            therapies: BTreeSet::from(["speech".to_string()]),
            capacity: 1,
        }];
        (therapists, patients, rooms, specialties, therapies)
    }

    #[test]
    fn builds_minimal_instance() {
        let (therapists, patients, rooms, specialties, therapies) = minimal_parts();
        assert!(Instance::build(therapists, patients, rooms, specialties, therapies).is_ok());
    }

    #[test]
    fn rejects_duplicate_patient_ids() {
        let (therapists, mut patients, rooms, specialties, therapies) = minimal_parts();
        let dup = patients[0].clone();
        patients.push(dup);
        let err = Instance::build(therapists, patients, rooms, specialties, therapies).unwrap_err();
        assert!(matches!(err, SchedulerError::Validation { .. }));
    }

    #[test]
    fn rejects_unknown_specialty_on_therapist() {
        let (mut therapists, patients, rooms, specialties, therapies) = minimal_parts();
        therapists[0].specialties.insert("ot".to_string());
        assert!(Instance::build(therapists, patients, rooms, specialties, therapies).is_err());
    }

    #[test]
    fn rejects_fixed_therapist_exceeding_requirement() {
        let (therapists, mut patients, rooms, specialties, therapies) = minimal_parts();
        patients[0].fixed_therapists.insert(
            "speech".to_string(),
            BTreeMap::from([("lang".to_string(), vec!["T1".to_string(), "T1".to_string()])]),
        );
        assert!(Instance::build(therapists, patients, rooms, specialties, therapies).is_err());
    }

    #[test]
    fn rejects_pin_without_requirement() {
        let (therapists, mut patients, rooms, specialties, therapies) = minimal_parts();
        patients[0].therapies.remove("speech");
        patients[0].pinned_sessions.insert(
            "speech".to_string(),
            vec![PinnedSession { day: "Monday".to_string(), block: 0 }],
        );
        assert!(Instance::build(therapists, patients, rooms, specialties, therapies).is_err());
    }

    #[test]
    fn rejects_duplicate_pin() {
        let (therapists, mut patients, rooms, specialties, therapies) = minimal_parts();
        patients[0].therapies.insert("speech".to_string(), 2);
        patients[0].pinned_sessions.insert(
            "speech".to_string(),
            vec![
                PinnedSession { day: "Monday".to_string(), block: 0 },
                PinnedSession { day: "Monday".to_string(), block: 0 },
            ],
        );
        assert!(Instance::build(therapists, patients, rooms, specialties, therapies).is_err());
    }
}
