//! The hard/softenable constraint families of §4.2, expressed against the
//! variable tables from [`super::vars`] through a [`super::emitter::Emitter`]
//! so the primary, assumption-guarded, and soft-slack models share one
//! traversal.
//!
//! Label schema is `kind|id1|id2…` (§4.5.2), using the entities' own string
//! ids so a label is meaningful without consulting the interning tables.

use cp_sat::builder::LinearExpr;

use crate::instance::Instance;
use crate::model::emitter::Emitter;
use crate::model::ids::Index;
use crate::model::vars::VariableSet;
use crate::time::{self, BLOCKS, DAY_ORDER};

fn sum(vars: impl Iterator<Item = cp_sat::builder::BoolVar>) -> LinearExpr {
    let mut expr = LinearExpr::from(0);
    for v in vars {
        expr = expr + LinearExpr::from(v);
    }
    expr
}

/// Emits the per-session capacity/attendance-band and staffing-exactness
/// constraints (§4.2, "For each active session").
pub fn emit_session_constraints(emitter: &mut Emitter, instance: &Instance, idx: &Index, vars: &VariableSet) {
    for (therapy_id, therapy) in &instance.therapies {
        let therapy_idx = idx.therapies.idx(therapy_id).unwrap();
        for room in &instance.rooms {
            if !room.therapies.contains(therapy_id) {
                continue;
            }
            let room_idx = idx.rooms.idx(&room.id).unwrap();
            for (d, day) in DAY_ORDER.iter().enumerate() {
                let _ = day;
                for &block in &BLOCKS {
                    let Some(session_var) = vars.session_var(therapy_idx, room_idx, d as u8, block as u8).cloned() else {
                        continue;
                    };

                    let attendance = sum(vars.session_patients(therapy_idx, room_idx, d as u8, block as u8).cloned());
                    let cap = therapy.max_patients.min(room.capacity as u32) as i64;
                    let candidate_count = vars.session_patients(therapy_idx, room_idx, d as u8, block as u8).count() as i64;
                    emitter.le(
                        format!("session_capacity|{therapy_id}|{}|{}|{}", room.id, DAY_ORDER[d], block),
                        format!("session of '{therapy_id}' in room '{}' on {} block {} exceeds capacity", room.id, DAY_ORDER[d], block),
                        attendance.clone(),
                        cap,
                        candidate_count,
                    );
                    emitter.ge_scaled(
                        format!("session_min_attendance|{therapy_id}|{}|{}|{}", room.id, DAY_ORDER[d], block),
                        format!(
                            "session of '{therapy_id}' in room '{}' on {} block {} under minimum attendance",
                            room.id, DAY_ORDER[d], block
                        ),
                        attendance,
                        therapy.min_patients as i64,
                        session_var.clone(),
                        therapy.min_patients as i64,
                    );

                    for (specialty, &required) in &therapy.requirements {
                        let specialty_idx = idx.specialties.idx(specialty).unwrap();
                        let staff_count = vars
                            .session_staff(therapy_idx, room_idx, d as u8, block as u8, specialty_idx)
                            .count() as i64;
                        let label = format!("staffing|{therapy_id}|{}|{}|{}|{specialty}", room.id, DAY_ORDER[d], block);
                        if staff_count == 0 {
                            emitter.force_zero(
                                label,
                                format!(
                                    "no therapist with '{specialty}' can staff '{therapy_id}' in room '{}' on {} block {}",
                                    room.id, DAY_ORDER[d], block
                                ),
                                session_var.clone(),
                            );
                            continue;
                        }
                        let staffing = sum(vars.session_staff(therapy_idx, room_idx, d as u8, block as u8, specialty_idx).cloned());
                        emitter.eq_scaled(
                            label,
                            format!(
                                "session of '{therapy_id}' in room '{}' on {} block {} needs {required} '{specialty}' staff",
                                room.id, DAY_ORDER[d], block
                            ),
                            staffing,
                            required as i64,
                            session_var.clone(),
                            staff_count.max(required as i64),
                        );
                    }
                }
            }
        }
    }
}

/// Emits the per-patient requirement, pinning, fixed-therapist,
/// no-same-day, one-at-a-time, and continuous-hours constraints (§4.2, "For
/// each patient p").
pub fn emit_patient_constraints(emitter: &mut Emitter, instance: &Instance, idx: &Index, vars: &VariableSet) {
    for patient in &instance.patients {
        let patient_idx = idx.patients.idx(&patient.id).unwrap();

        for (therapy_id, &required) in &patient.therapies {
            let therapy_idx = idx.therapies.idx(therapy_id).unwrap();
            let candidate_count = vars.patient_therapy_vars(patient_idx, therapy_idx).count() as i64;
            let total = sum(vars.patient_therapy_vars(patient_idx, therapy_idx).map(|(_, v)| v.clone()));
            emitter.eq(
                format!("patient_requirement|{}|{therapy_id}", patient.id),
                format!("patient '{}' needs {required} session(s) of '{therapy_id}'", patient.id),
                total,
                required as i64,
                candidate_count.max(required as i64),
            );
        }

        for (therapy_id, pins) in &patient.pinned_sessions {
            let therapy_idx = idx.therapies.idx(therapy_id).unwrap();
            for pin in pins {
                let d = time::day_index(&pin.day).unwrap() as u8;
                let matching = sum(vars
                    .patient_therapy_vars(patient_idx, therapy_idx)
                    .filter(|(k, _)| k.day == d && k.block == pin.block as u8)
                    .map(|(_, v)| v.clone()));
                emitter.hard_eq(
                    format!("pinned_session|{}|{therapy_id}|{}|{}", patient.id, pin.day, pin.block),
                    matching,
                    1,
                );
            }
        }

        for (therapy_id, by_specialty) in &patient.fixed_therapists {
            let therapy_idx = idx.therapies.idx(therapy_id).unwrap();
            for (specialty, therapist_ids) in by_specialty {
                let specialty_idx = idx.specialties.idx(specialty).unwrap();
                for therapist_id in therapist_ids {
                    let therapist_idx = idx.therapists.idx(therapist_id).unwrap();
                    let label = format!("fixed_therapist|{}|{therapy_id}|{specialty}|{therapist_id}", patient.id);
                    for (key, assign_var) in vars.patient_therapy_vars(patient_idx, therapy_idx) {
                        let staff_for_therapist = vars
                            .staff
                            .get(&crate::model::vars::StaffKey {
                                therapist: therapist_idx,
                                therapy: key.therapy,
                                room: key.room,
                                day: key.day,
                                block: key.block,
                                specialty: specialty_idx,
                            })
                            .cloned();
                        match staff_for_therapist {
                            Some(staff_var) => {
                                emitter.le_bool_slack(
                                    label.clone(),
                                    format!(
                                        "patient '{}' requires therapist '{therapist_id}' for '{therapy_id}' ({specialty})",
                                        patient.id
                                    ),
                                    assign_var.clone(),
                                    LinearExpr::from(staff_var),
                                );
                            }
                            None => {
                                emitter.force_zero(
                                    label.clone(),
                                    format!(
                                        "patient '{}' requires therapist '{therapist_id}' for '{therapy_id}' ({specialty}), but that therapist cannot staff this session",
                                        patient.id
                                    ),
                                    assign_var.clone(),
                                );
                            }
                        }
                    }
                }
            }
        }

        for therapy_id in &patient.no_same_day_therapies {
            let therapy_idx = idx.therapies.idx(therapy_id).unwrap();
            for (d, day) in DAY_ORDER.iter().enumerate() {
                let day_count = vars
                    .patient_therapy_vars(patient_idx, therapy_idx)
                    .filter(|(k, _)| k.day == d as u8)
                    .count() as i64;
                let day_total = sum(vars
                    .patient_therapy_vars(patient_idx, therapy_idx)
                    .filter(|(k, _)| k.day == d as u8)
                    .map(|(_, v)| v.clone()));
                emitter.le(
                    format!("no_same_day|{}|{therapy_id}|{day}", patient.id),
                    format!("patient '{}' may not attend '{therapy_id}' twice on {day}", patient.id),
                    day_total,
                    1,
                    day_count.saturating_sub(1).max(0),
                );
            }
        }

        for (d, day) in DAY_ORDER.iter().enumerate() {
            for &block in &BLOCKS {
                let total = sum(vars
                    .patient_in_session
                    .iter()
                    .filter(|(k, _)| k.patient == patient_idx && k.day == d as u8 && k.block == block as u8)
                    .map(|(_, v)| v.clone()));
                emitter.hard_le(
                    format!("patient_one_at_a_time|{}|{day}|{block}", patient.id),
                    total,
                    1,
                );
            }
        }

        for segment in time::segments() {
            for window in segment.windows(4) {
                for (d, day) in DAY_ORDER.iter().enumerate() {
                    let window_total = sum(vars.patient_in_session.iter().filter(|(k, _)| {
                        k.patient == patient_idx && k.day == d as u8 && window.contains(&(k.block as usize))
                    }).map(|(_, v)| v.clone()));
                    emitter.hard_le(
                        format!("continuous_hours|{}|{day}|{}", patient.id, window[0]),
                        window_total,
                        patient.max_continuous_hours as i64,
                    );
                }
            }
        }
    }
}

/// Emits therapist and room one-at-a-time constraints (§4.2, "For each
/// therapist τ" / "For each room r").
pub fn emit_resource_constraints(emitter: &mut Emitter, instance: &Instance, idx: &Index, vars: &VariableSet) {
    for therapist in &instance.therapists {
        let therapist_idx = idx.therapists.idx(&therapist.id).unwrap();
        for (d, day) in DAY_ORDER.iter().enumerate() {
            for &block in &BLOCKS {
                let total = sum(vars.therapist_busy_candidates(therapist_idx, d as u8, block as u8).cloned());
                emitter.hard_le(
                    format!("therapist_one_at_a_time|{}|{day}|{block}", therapist.id),
                    total,
                    1,
                );
            }
        }
    }

    for room in &instance.rooms {
        let room_idx = idx.rooms.idx(&room.id).unwrap();
        for (d, day) in DAY_ORDER.iter().enumerate() {
            for &block in &BLOCKS {
                let total = sum(vars
                    .session_active
                    .iter()
                    .filter(|(k, _)| k.room == room_idx && k.day == d as u8 && k.block == block as u8)
                    .map(|(_, v)| v.clone()));
                emitter.hard_le(format!("room_one_at_a_time|{}|{day}|{block}", room.id), total, 1);
            }
        }
    }
}

/// Runs all three constraint families against `model` in one call.
pub fn emit_all(emitter: &mut Emitter, instance: &Instance, idx: &Index, vars: &VariableSet) {
    emit_session_constraints(emitter, instance, idx, vars);
    emit_patient_constraints(emitter, instance, idx, vars);
    emit_resource_constraints(emitter, instance, idx, vars);
}
