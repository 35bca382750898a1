//! Materializes the three decision-variable families (§4.1) over exactly the
//! `(entity, room, day, block)` tuples that are feasible a priori.

use std::collections::BTreeMap;

use cp_sat::builder::{BoolVar, CpModelBuilder};

use crate::instance::Instance;
use crate::model::ids::{BlockIdx, DayIdx, Index};
use crate::time::{BLOCKS, DAY_ORDER};

/// Key for `session_active[therapy, room, day, block]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionKey {
    pub therapy: u32,
    pub room: u32,
    pub day: DayIdx,
    pub block: BlockIdx,
}

/// Key for `patient_in_session[patient, therapy, room, day, block]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PatientSessionKey {
    pub patient: u32,
    pub therapy: u32,
    pub room: u32,
    pub day: DayIdx,
    pub block: BlockIdx,
}

/// Key for `staff[therapist, therapy, room, day, block, specialty]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StaffKey {
    pub therapist: u32,
    pub therapy: u32,
    pub room: u32,
    pub day: DayIdx,
    pub block: BlockIdx,
    pub specialty: u32,
}

/// The three variable families, plus the linking constraints between them
/// (already added to `model` by the time this is returned).
pub struct VariableSet {
    pub session_active: BTreeMap<SessionKey, BoolVar>,
    pub patient_in_session: BTreeMap<PatientSessionKey, BoolVar>,
    pub staff: BTreeMap<StaffKey, BoolVar>,
}

impl VariableSet {
    /// All `patient_in_session` entries for one (patient, therapy) pair.
    pub fn patient_therapy_vars(
        &self,
        patient: u32,
        therapy: u32,
    ) -> impl Iterator<Item = (&PatientSessionKey, &BoolVar)> {
        self.patient_in_session
            .iter()
            .filter(move |(k, _)| k.patient == patient && k.therapy == therapy)
    }

    /// All `session_active` entries for one (therapy, room, day, block).
    pub fn session_var(&self, therapy: u32, room: u32, day: DayIdx, block: BlockIdx) -> Option<&BoolVar> {
        self.session_active.get(&SessionKey { therapy, room, day, block })
    }

    /// All `patient_in_session` entries attached to one session.
    pub fn session_patients(
        &self,
        therapy: u32,
        room: u32,
        day: DayIdx,
        block: BlockIdx,
    ) -> impl Iterator<Item = &BoolVar> {
        self.patient_in_session.iter().filter_map(move |(k, v)| {
            (k.therapy == therapy && k.room == room && k.day == day && k.block == block).then_some(v)
        })
    }

    /// All `staff` entries attached to one session and specialty.
    pub fn session_staff(
        &self,
        therapy: u32,
        room: u32,
        day: DayIdx,
        block: BlockIdx,
        specialty: u32,
    ) -> impl Iterator<Item = &BoolVar> {
        self.staff.iter().filter_map(move |(k, v)| {
            (k.therapy == therapy && k.room == room && k.day == day && k.block == block && k.specialty == specialty)
                .then_some(v)
        })
    }

    /// All `staff` entries for one therapist at one (day, block), across
    /// every therapy/room/specialty.
    pub fn therapist_busy_candidates(
        &self,
        therapist: u32,
        day: DayIdx,
        block: BlockIdx,
    ) -> impl Iterator<Item = &BoolVar> {
        self.staff
            .iter()
            .filter_map(move |(k, v)| (k.therapist == therapist && k.day == day && k.block == block).then_some(v))
    }
}

fn get_session_var(
    session_active: &mut BTreeMap<SessionKey, BoolVar>,
    model: &mut CpModelBuilder,
    key: SessionKey,
) -> BoolVar {
    session_active.entry(key).or_insert_with(|| model.new_bool_var()).clone()
}

/// Builds the variable tables for `instance`, pruning by room/therapy
/// compatibility, therapist/patient availability, and specialty match, and
/// linking each `patient_in_session`/`staff` variable to its session.
pub fn build_variables(model: &mut CpModelBuilder, instance: &Instance, idx: &Index) -> VariableSet {
    let mut session_active: BTreeMap<SessionKey, BoolVar> = BTreeMap::new();
    let mut staff: BTreeMap<StaffKey, BoolVar> = BTreeMap::new();
    let mut patient_in_session: BTreeMap<PatientSessionKey, BoolVar> = BTreeMap::new();

    let day_idx = |d: &str| DAY_ORDER.iter().position(|x| *x == d).unwrap() as DayIdx;

    for (therapy_id, therapy) in &instance.therapies {
        let therapy_idx = idx.therapies.idx(therapy_id).unwrap();
        for room in &instance.rooms {
            if !room.therapies.contains(therapy_id) {
                continue;
            }
            let room_idx = idx.rooms.idx(&room.id).unwrap();
            for day in DAY_ORDER {
                let d = day_idx(day);
                for &block in &BLOCKS {
                    let session_key = SessionKey { therapy: therapy_idx, room: room_idx, day: d, block: block as BlockIdx };
                    let session_var = get_session_var(&mut session_active, model, session_key);

                    for specialty in therapy.requirements.keys() {
                        let specialty_idx = idx.specialties.idx(specialty).unwrap();
                        for therapist in &instance.therapists {
                            if !therapist.specialties.contains(specialty) {
                                continue;
                            }
                            let Some(day_blocks) = therapist.availability.get(day) else { continue };
                            if !day_blocks.contains(&block) {
                                continue;
                            }
                            let therapist_idx = idx.therapists.idx(&therapist.id).unwrap();
                            let staff_key = StaffKey {
                                therapist: therapist_idx,
                                therapy: therapy_idx,
                                room: room_idx,
                                day: d,
                                block: block as BlockIdx,
                                specialty: specialty_idx,
                            };
                            if staff.contains_key(&staff_key) {
                                continue;
                            }
                            let staff_var = model.new_bool_var();
                            model.add_le(staff_var.clone(), session_var.clone());
                            staff.insert(staff_key, staff_var);
                        }
                    }
                }
            }
        }
    }

    for patient in &instance.patients {
        let patient_idx = idx.patients.idx(&patient.id).unwrap();
        for (therapy_id, required) in &patient.therapies {
            if *required == 0 {
                continue;
            }
            let therapy_idx = idx.therapies.idx(therapy_id).unwrap();
            for day in DAY_ORDER {
                let d = day_idx(day);
                let Some(day_blocks) = patient.availability.get(day) else { continue };
                for &block in &BLOCKS {
                    if !day_blocks.contains(&block) {
                        continue;
                    }
                    for room in &instance.rooms {
                        if !room.therapies.contains(therapy_id) {
                            continue;
                        }
                        let room_idx = idx.rooms.idx(&room.id).unwrap();
                        let session_key = SessionKey { therapy: therapy_idx, room: room_idx, day: d, block: block as BlockIdx };
                        let session_var = get_session_var(&mut session_active, model, session_key);
                        let assign_key = PatientSessionKey {
                            patient: patient_idx,
                            therapy: therapy_idx,
                            room: room_idx,
                            day: d,
                            block: block as BlockIdx,
                        };
                        if patient_in_session.contains_key(&assign_key) {
                            continue;
                        }
                        let assign_var = model.new_bool_var();
                        model.add_le(assign_var.clone(), session_var.clone());
                        patient_in_session.insert(assign_key, assign_var);
                    }
                }
            }
        }
        // Pins must stay feasible even outside the patient's stated availability.
        for (therapy_id, pins) in &patient.pinned_sessions {
            let therapy_idx = idx.therapies.idx(therapy_id).unwrap();
            for pin in pins {
                let d = day_idx(&pin.day);
                for room in &instance.rooms {
                    if !room.therapies.contains(therapy_id) {
                        continue;
                    }
                    let room_idx = idx.rooms.idx(&room.id).unwrap();
                    let session_key = SessionKey { therapy: therapy_idx, room: room_idx, day: d, block: pin.block as BlockIdx };
                    let session_var = get_session_var(&mut session_active, model, session_key);
                    let assign_key = PatientSessionKey {
                        patient: patient_idx,
                        therapy: therapy_idx,
                        room: room_idx,
                        day: d,
                        block: pin.block as BlockIdx,
                    };
                    if patient_in_session.contains_key(&assign_key) {
                        continue;
                    }
                    let assign_var = model.new_bool_var();
                    model.add_le(assign_var.clone(), session_var.clone());
                    patient_in_session.insert(assign_key, assign_var);
                }
            }
        }
    }

    VariableSet { session_active, patient_in_session, staff }
}
