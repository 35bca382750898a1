//! The canonical weekly time grid: five days, nine one-hour blocks per day,
//! with a lunch gap between the morning and afternoon segments.

use crate::error::{Result, SchedulerError};

/// Weekday order used for sorting and for validating availability keys.
pub const DAY_ORDER: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// The nine fixed one-hour blocks in a day: 08-13, lunch, 14-18.
pub const BLOCKS: [usize; 9] = [0, 1, 2, 3, 4, 5, 6, 7, 8];

const BLOCK_RANGES: [&str; 9] = [
    "08:00-09:00",
    "09:00-10:00",
    "10:00-11:00",
    "11:00-12:00",
    "12:00-13:00",
    "14:00-15:00",
    "15:00-16:00",
    "16:00-17:00",
    "17:00-18:00",
];

/// Returns `true` if `day` is one of the five canonical weekdays.
pub fn is_canonical_day(day: &str) -> bool {
    DAY_ORDER.contains(&day)
}

/// Index of `day` within [`DAY_ORDER`], for sorting schedule output.
pub fn day_index(day: &str) -> Option<usize> {
    DAY_ORDER.iter().position(|d| *d == day)
}

/// The fixed `"HH:MM-HH:MM"` string for a block index.
pub fn block_to_range(block: usize) -> &'static str {
    BLOCK_RANGES[block]
}

/// Parses one of the nine canonical `"HH:MM-HH:MM"` strings back to a block index.
///
/// Any other string (wrong format, a range that doesn't line up with a
/// canonical block boundary, or the lunch gap itself) is rejected.
pub fn range_to_block(range: &str) -> Result<usize> {
    BLOCK_RANGES
        .iter()
        .position(|r| *r == range)
        .ok_or_else(|| SchedulerError::Validation {
            entity: range.to_string(),
            reason: "not one of the nine canonical HH:MM-HH:MM blocks".to_string(),
        })
}

/// Start/end offsets in minutes-from-midnight for one block.
fn block_minutes(block: usize) -> (u32, u32) {
    let start_hour = if block < 5 { 8 + block as u32 } else { 9 + block as u32 };
    (start_hour * 60, (start_hour + 1) * 60)
}

fn parse_clock(clock: &str) -> Result<u32> {
    let (hours, minutes) = clock.split_once(':').ok_or_else(|| SchedulerError::Validation {
        entity: clock.to_string(),
        reason: "expected HH:MM".to_string(),
    })?;
    let hours: u32 = hours.parse().map_err(|_| SchedulerError::Validation {
        entity: clock.to_string(),
        reason: "non-numeric hour".to_string(),
    })?;
    let minutes: u32 = minutes.parse().map_err(|_| SchedulerError::Validation {
        entity: clock.to_string(),
        reason: "non-numeric minute".to_string(),
    })?;
    Ok(hours * 60 + minutes)
}

/// An availability or pin interval, `[start, end)` in minutes from midnight.
struct Interval {
    start: u32,
    end: u32,
}

impl Interval {
    fn parse(raw: &str) -> Result<Self> {
        let (start_str, end_str) = raw.split_once('-').ok_or_else(|| SchedulerError::Validation {
            entity: raw.to_string(),
            reason: "expected HH:MM-HH:MM".to_string(),
        })?;
        Ok(Interval {
            start: parse_clock(start_str)?,
            end: parse_clock(end_str)?,
        })
    }

    fn contains_block(&self, block: usize) -> bool {
        let (block_start, block_end) = block_minutes(block);
        self.start <= block_start && block_end <= self.end
    }
}

/// Converts a list of `"HH:MM-HH:MM"` interval strings into the set of block
/// indices fully contained by some interval.
pub fn intervals_to_block_set(intervals: &[String]) -> Result<std::collections::BTreeSet<usize>> {
    let parsed: Vec<Interval> = intervals.iter().map(|s| Interval::parse(s)).collect::<Result<_>>()?;
    Ok(BLOCKS
        .iter()
        .copied()
        .filter(|b| parsed.iter().any(|iv| iv.contains_block(*b)))
        .collect())
}

/// Normalizes a `day -> intervals` availability map into a `day -> block set` map,
/// dropping days with no intervals.
pub fn availability_to_blocks_per_day(
    raw: &std::collections::BTreeMap<String, Vec<String>>,
) -> Result<std::collections::BTreeMap<String, std::collections::BTreeSet<usize>>> {
    let mut normalized = std::collections::BTreeMap::new();
    for (day, intervals) in raw {
        if intervals.is_empty() {
            continue;
        }
        normalized.insert(day.clone(), intervals_to_block_set(intervals)?);
    }
    Ok(normalized)
}

/// Morning segment: blocks 0..=4.
pub const MORNING_SEGMENT: [usize; 5] = [0, 1, 2, 3, 4];
/// Afternoon segment: blocks 5..=8.
pub const AFTERNOON_SEGMENT: [usize; 4] = [5, 6, 7, 8];

/// The two maximal runs of consecutive blocks within a day: morning and
/// afternoon. Blocks 4 and 5 straddle the lunch gap and are never in the
/// same segment.
pub fn segments() -> [&'static [usize]; 2] {
    [&MORNING_SEGMENT, &AFTERNOON_SEGMENT]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_range_round_trips() {
        for b in BLOCKS {
            let range = block_to_range(b);
            assert_eq!(range_to_block(range).unwrap(), b);
        }
    }

    #[test]
    fn rejects_non_canonical_range() {
        assert!(range_to_block("13:00-14:00").is_err());
        assert!(range_to_block("garbage").is_err());
    }

    #[test]
    fn lunch_gap_not_consecutive() {
        let segs = segments();
        assert!(!segs[0].contains(&5));
        assert!(!segs[1].contains(&4));
    }

    #[test]
    fn interval_covers_exactly_contained_blocks() {
        let blocks = intervals_to_block_set(&["08:00-10:00".to_string()]).unwrap();
        assert_eq!(blocks, std::collections::BTreeSet::from([0, 1]));
    }

    #[test]
    fn interval_partial_overlap_excludes_block() {
        // 08:30-10:00 does not fully contain block 0 (08:00-09:00).
        let blocks = intervals_to_block_set(&["08:30-10:00".to_string()]).unwrap();
        assert_eq!(blocks, std::collections::BTreeSet::from([1]));
    }

    #[test]
    fn day_order_is_canonical() {
        assert_eq!(day_index("Monday"), Some(0));
        assert_eq!(day_index("Saturday"), None);
        assert!(!is_canonical_day("Saturday"));
    }
}
