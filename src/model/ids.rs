//! Interns the string ids in an [`Instance`](crate::instance::Instance) into
//! small `u32` indices so the hot constraint-building loops compare and hash
//! integers instead of strings, per the flattened-index approach this
//! lineage's solver crates use for their person/group tables.

use std::collections::HashMap;

use crate::instance::Instance;

/// Bidirectional `String <-> u32` mapping for one entity class.
#[derive(Debug, Clone, Default)]
pub struct IdTable {
    idx_to_id: Vec<String>,
    id_to_idx: HashMap<String, u32>,
}

impl IdTable {
    fn from_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Self {
        let mut idx_to_id = Vec::new();
        let mut id_to_idx = HashMap::new();
        for id in ids {
            if !id_to_idx.contains_key(id) {
                id_to_idx.insert(id.to_string(), idx_to_id.len() as u32);
                idx_to_id.push(id.to_string());
            }
        }
        IdTable { idx_to_id, id_to_idx }
    }

    pub fn idx(&self, id: &str) -> Option<u32> {
        self.id_to_idx.get(id).copied()
    }

    pub fn id(&self, idx: u32) -> &str {
        &self.idx_to_id[idx as usize]
    }

    pub fn len(&self) -> usize {
        self.idx_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx_to_id.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> {
        0..(self.idx_to_id.len() as u32)
    }
}

/// The full set of interning tables for one `Instance`.
pub struct Index {
    pub therapists: IdTable,
    pub patients: IdTable,
    pub rooms: IdTable,
    pub therapies: IdTable,
    pub specialties: IdTable,
}

impl Index {
    pub fn build(instance: &Instance) -> Index {
        Index {
            therapists: IdTable::from_ids(instance.therapists.iter().map(|t| t.id.as_str())),
            patients: IdTable::from_ids(instance.patients.iter().map(|p| p.id.as_str())),
            rooms: IdTable::from_ids(instance.rooms.iter().map(|r| r.id.as_str())),
            therapies: IdTable::from_ids(instance.therapies.keys().map(|s| s.as_str())),
            specialties: IdTable::from_ids(instance.specialties.iter().map(|s| s.as_str())),
        }
    }
}

/// A weekday as a small copy-able index into [`crate::time::DAY_ORDER`].
pub type DayIdx = u8;
/// An hour block, `0..=8`.
pub type BlockIdx = u8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_without_duplicates() {
        let table = IdTable::from_ids(["a", "b", "a", "c"].into_iter());
        assert_eq!(table.len(), 3);
        assert_eq!(table.idx("a"), Some(0));
        assert_eq!(table.idx("b"), Some(1));
        assert_eq!(table.idx("c"), Some(2));
        assert_eq!(table.id(1), "b");
    }
}
