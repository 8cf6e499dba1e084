//! Expansion of teacher-submitted date ranges into fixed-duration slots.
//!
//! All arithmetic is in epoch seconds. A range is tiled from its start in
//! `slot_duration_min`-minute steps; a trailing partial slot is truncated,
//! so only full-length slots are ever emitted.

use serde::{Deserialize, Serialize};

pub const SECONDS_PER_MINUTE: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInterval {
    pub start_date: i64,
    pub end_date: i64,
}

/// Tiles `[start_date, end_date)` with slots of `slot_duration_min` minutes,
/// aligned to `start_date`. The last emitted slot is the one starting at
/// `end_date - slot` (inclusive); ranges shorter than one slot emit nothing.
pub fn expand_range(start_date: i64, end_date: i64, slot_duration_min: i64) -> Vec<SlotInterval> {
    let step = slot_duration_min * SECONDS_PER_MINUTE;
    let last_slot_start = end_date - step;

    let mut slots = Vec::new();
    let mut slot_start = start_date;

    while slot_start <= last_slot_start {
        slots.push(SlotInterval {
            start_date: slot_start,
            end_date: slot_start + step,
        });
        slot_start += step;
    }

    slots
}

/// Min start and max end over a slot batch; bounds the single dedup query a
/// multi-range submission issues against the store.
pub fn range_extremum(slots: &[SlotInterval]) -> Option<(i64, i64)> {
    slots.iter().fold(None, |acc, slot| match acc {
        None => Some((slot.start_date, slot.end_date)),
        Some((min_date, max_date)) => Some((
            min_date.min(slot.start_date),
            max_date.max(slot.end_date),
        )),
    })
}
