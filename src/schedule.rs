//! The output schema a solve produces: one record per active session.

use serde::{Deserialize, Serialize};

use crate::time;

/// One therapist staffing a specialty role in a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct StaffEntry {
    pub specialty: String,
    pub therapist_id: String,
}

/// One active, scheduled session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    pub therapy_id: String,
    pub room_id: String,
    pub day: String,
    pub time: String,
    pub patient_ids: Vec<String>,
    pub staff: Vec<StaffEntry>,
}

impl SessionRecord {
    /// Sort key matching §5's ordering guarantee: (day-of-week index,
    /// time-range string, room id, therapy id).
    fn sort_key(&self) -> (usize, String, String, String) {
        (
            time::day_index(&self.day).unwrap_or(usize::MAX),
            self.time.clone(),
            self.room_id.clone(),
            self.therapy_id.clone(),
        )
    }
}

/// Sorts a schedule in place per the deterministic ordering in §5, and
/// sorts each record's own patient/staff lists.
pub fn sort_schedule(schedule: &mut Vec<SessionRecord>) {
    for record in schedule.iter_mut() {
        record.patient_ids.sort();
        record.staff.sort_by(|a, b| (&a.specialty, &a.therapist_id).cmp(&(&b.specialty, &b.therapist_id)));
    }
    schedule.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: &str, time: &str, room: &str, therapy: &str) -> SessionRecord {
        SessionRecord {
            therapy_id: therapy.to_string(),
            room_id: room.to_string(),
            day: day.to_string(),
            time: time.to_string(),
            patient_ids: vec![],
            staff: vec![],
        }
    }

    #[test]
    fn sorts_by_day_then_time_then_room_then_therapy() {
        let mut schedule = vec![
            record("Tuesday", "08:00-09:00", "R1", "speech"),
            record("Monday", "09:00-10:00", "R1", "speech"),
            record("Monday", "08:00-09:00", "R2", "speech"),
            record("Monday", "08:00-09:00", "R1", "ot"),
        ];
        sort_schedule(&mut schedule);
        let days_and_rooms: Vec<(&str, &str, &str)> = schedule
            .iter()
            .map(|r| (r.day.as_str(), r.time.as_str(), r.room_id.as_str()))
            .collect();
        assert_eq!(
            days_and_rooms,
            vec![
                ("Monday", "08:00-09:00", "R1"),
                ("Monday", "08:00-09:00", "R2"),
                ("Monday", "09:00-10:00", "R1"),
                ("Tuesday", "08:00-09:00", "R1"),
            ]
        );
    }
}
