use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::{new_record_id, ContentSnapshot, Ordered, Record};
use crate::collection::CollectionKind;
use crate::error::ContentError;
use crate::ordering::{self, OrderPatch};

/// Reference to the branch a schedule row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchRef {
    pub id: String,
    pub name: String,
}

impl BranchRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Opening hours for one day label at one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    #[serde(rename = "branchRef")]
    pub branch: BranchRef,
    pub day_label: String,
    pub hours_text: String,
    #[serde(default)]
    pub order: u32,
}

impl ScheduleEntry {
    pub fn new(
        branch: BranchRef,
        day_label: impl Into<String>,
        hours_text: impl Into<String>,
    ) -> Self {
        Self {
            id: new_record_id(),
            branch,
            day_label: day_label.into(),
            hours_text: hours_text.into(),
            order: 0,
        }
    }
}

impl Record for ScheduleEntry {
    const KIND: CollectionKind = CollectionKind::Schedule;

    fn id(&self) -> &str {
        &self.id
    }

    fn records(snapshot: &ContentSnapshot) -> &[Self] {
        &snapshot.schedule
    }

    fn replace_all(snapshot: &mut ContentSnapshot, records: Vec<Self>) {
        snapshot.schedule = records;
    }

    fn check(records: &[Self]) -> Result<(), ContentError> {
        let mut seen = HashSet::new();
        for entry in records {
            let key = (entry.branch.id.as_str(), entry.day_label.trim().to_lowercase());
            if !seen.insert(key) {
                return Err(ContentError::DuplicateDayLabel {
                    branch: entry.branch.name.clone(),
                    day: entry.day_label.clone(),
                });
            }
        }
        Ok(())
    }

    fn compact(records: &mut [Self]) -> Vec<OrderPatch> {
        ordering::compact(records)
    }
}

impl Ordered for ScheduleEntry {
    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn group_key(&self) -> &str {
        &self.branch.id
    }
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12} {}", self.day_label, self.hours_text)
    }
}
