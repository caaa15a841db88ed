//! Dense ordering for reorderable collections.
//!
//! Ordered records carry an `order` field that, within each group, is a
//! contiguous permutation of `1..=k`. Order values are always recomputed from
//! position after a change; they are never incremented or decremented in
//! place.
//!
//! Carousel items form a single group. Schedule entries are grouped by branch,
//! and touching one branch never changes the order values of another.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{BranchRef, Ordered, ScheduleEntry};

/// Direction of a single-step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(format!("Invalid direction '{}'. Valid options: up, down", s)),
        }
    }
}

/// One `{id, order}` pair of a bulk order update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub id: String,
    pub order: u32,
}

/// Result of a move.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome<T> {
    /// Moving up at the top or down at the bottom.
    Unchanged,
    /// The full collection after the swap, with its group renumbered.
    Moved(Vec<T>),
}

/// Distinct group keys in first-appearance order.
fn group_keys<T: Ordered>(records: &[T]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for record in records {
        if !keys.iter().any(|k| k == record.group_key()) {
            keys.push(record.group_key().to_string());
        }
    }
    keys
}

/// Positions of a group's members in `records`, in display order.
///
/// Display order is by `order`; ties keep their position in the slice.
fn group_positions<T: Ordered>(records: &[T], group: &str) -> Vec<usize> {
    let mut positions: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.group_key() == group)
        .map(|(i, _)| i)
        .collect();
    positions.sort_by_key(|&i| records[i].order());
    positions
}

/// Moves record `id` one step within its group.
///
/// Returns `None` if no record has that id.
pub fn move_record<T: Ordered>(records: &[T], id: &str, direction: Direction) -> Option<MoveOutcome<T>> {
    let target = records.iter().find(|r| r.id() == id)?;
    let mut sequence = group_positions(records, target.group_key());
    let index = sequence.iter().position(|&p| records[p].id() == id)?;

    let neighbor = match direction {
        Direction::Up if index == 0 => return Some(MoveOutcome::Unchanged),
        Direction::Up => index - 1,
        Direction::Down if index + 1 == sequence.len() => return Some(MoveOutcome::Unchanged),
        Direction::Down => index + 1,
    };
    sequence.swap(index, neighbor);

    // Write the group back into the slots it already occupied so other
    // groups keep their positions.
    let mut slots = sequence.clone();
    slots.sort_unstable();

    let mut moved = records.to_vec();
    for (rank, (&slot, &source)) in slots.iter().zip(&sequence).enumerate() {
        let mut record = records[source].clone();
        record.set_order(rank as u32 + 1);
        moved[slot] = record;
    }

    Some(MoveOutcome::Moved(moved))
}

/// Renumbers every group to `1..=k` in display order.
///
/// Returns true if any order value changed.
pub fn renumber<T: Ordered>(records: &mut [T]) -> bool {
    let mut changed = false;

    for group in group_keys(records) {
        let sequence = group_positions(records, &group);
        let mut slots = sequence.clone();
        slots.sort_unstable();

        let members: Vec<T> = sequence.iter().map(|&p| records[p].clone()).collect();
        for (rank, (slot, mut record)) in slots.into_iter().zip(members).enumerate() {
            let order = rank as u32 + 1;
            if record.order() != order {
                changed = true;
                record.set_order(order);
            }
            records[slot] = record;
        }
    }

    changed
}

/// Renumbers every group and returns the pairs whose order changed.
pub fn compact<T: Ordered>(records: &mut [T]) -> Vec<OrderPatch> {
    let before: Vec<(String, u32)> = records
        .iter()
        .map(|r| (r.id().to_string(), r.order()))
        .collect();
    if !renumber(records) {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| !before.iter().any(|(id, order)| id == r.id() && *order == r.order()))
        .map(|r| OrderPatch {
            id: r.id().to_string(),
            order: r.order(),
        })
        .collect()
}

/// Sets the order of every record named in `patch`.
pub fn apply_patch<T: Ordered>(records: &mut [T], patch: &[OrderPatch]) {
    for record in records.iter_mut() {
        if let Some(p) = patch.iter().find(|p| p.id == record.id()) {
            record.set_order(p.order);
        }
    }
}

/// Sorts records by `order`, keeping slice order for ties.
pub fn sort_by_order<T: Ordered>(records: &mut [T]) {
    records.sort_by_key(|r| r.order());
}

/// Order value for a record appended to `group`.
///
/// A group that does not exist yet starts at 1.
pub fn next_order<T: Ordered>(records: &[T], group: &str) -> u32 {
    records
        .iter()
        .filter(|r| r.group_key() == group)
        .map(|r| r.order())
        .max()
        .unwrap_or(0)
        + 1
}

/// Whether every group's order values are exactly `1..=k`.
pub fn is_dense<T: Ordered>(records: &[T]) -> bool {
    group_keys(records).iter().all(|group| {
        let mut orders: Vec<u32> = records
            .iter()
            .filter(|r| r.group_key() == group)
            .map(|r| r.order())
            .collect();
        orders.sort_unstable();
        orders.iter().enumerate().all(|(i, &o)| o == i as u32 + 1)
    })
}

/// The `{id, order}` set of one group, in display order.
pub fn order_patch<T: Ordered>(records: &[T], group: &str) -> Vec<OrderPatch> {
    group_positions(records, group)
        .into_iter()
        .map(|p| OrderPatch {
            id: records[p].id().to_string(),
            order: records[p].order(),
        })
        .collect()
}

/// Schedule rows of one branch.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSchedule {
    pub branch: BranchRef,
    pub entries: Vec<ScheduleEntry>,
}

/// Buckets schedule entries by branch id.
///
/// Branches appear in first-appearance order; entries within a branch are
/// sorted by `order`.
pub fn group_by_branch(entries: &[ScheduleEntry]) -> Vec<BranchSchedule> {
    group_keys(entries)
        .into_iter()
        .filter_map(|key| {
            let positions = group_positions(entries, &key);
            let branch = entries[*positions.first()?].branch.clone();
            Some(BranchSchedule {
                branch,
                entries: positions.into_iter().map(|p| entries[p].clone()).collect(),
            })
        })
        .collect()
}
