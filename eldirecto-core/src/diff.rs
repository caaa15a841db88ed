//! Delta computation between the confirmed and the edited copy of a collection.
//!
//! A delta is the list of records that must be written upstream: records whose
//! fields differ from the confirmed copy, plus records the confirmed copy does
//! not know. Each entry is the full edited record, never a field-level patch.
//!
//! Deletions are never inferred. A record missing from the edited copy is
//! simply not part of the delta; removing it upstream is an explicit call.

use std::collections::HashMap;

use crate::models::Record;

/// Returns the modified-or-new records of `edited` relative to `original`.
///
/// Records are matched by id. Output preserves the order of `edited`.
pub fn compute_delta<T: Record>(original: &[T], edited: &[T]) -> Vec<T> {
    let by_id: HashMap<&str, &T> = original.iter().map(|r| (r.id(), r)).collect();

    edited
        .iter()
        .filter(|record| match by_id.get(record.id()) {
            Some(confirmed) => *confirmed != *record,
            None => true,
        })
        .cloned()
        .collect()
}

/// Whether `id` is already known to the confirmed copy.
///
/// Delta records that are not known are created upstream, the rest updated.
pub fn is_known<T: Record>(original: &[T], id: &str) -> bool {
    original.iter().any(|r| r.id() == id)
}
