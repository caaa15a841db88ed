mod about;
mod carousel;
mod contact;
mod schedule;

pub use about::AboutContent;
pub use carousel::{CarouselItem, ImageRef};
pub use contact::ContactEntry;
pub use schedule::{BranchRef, ScheduleEntry};

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collection::CollectionKind;
use crate::error::ContentError;
use crate::ordering::{self, OrderPatch};

/// A record belonging to one of the content collections.
///
/// Equality is field-by-field and is what the diff engine compares.
pub trait Record: Clone + PartialEq + Debug + Serialize + DeserializeOwned {
    const KIND: CollectionKind;

    fn id(&self) -> &str;

    /// This record type's collection inside a snapshot.
    fn records(snapshot: &ContentSnapshot) -> &[Self];

    /// Replaces this record type's collection inside a snapshot.
    fn replace_all(snapshot: &mut ContentSnapshot, records: Vec<Self>);

    /// Validates collection-wide invariants.
    fn check(_records: &[Self]) -> Result<(), ContentError> {
        Ok(())
    }

    /// Restores dense ordering after records were removed.
    ///
    /// Returns the `{id, order}` pairs that changed; empty for unordered
    /// collections.
    fn compact(_records: &mut [Self]) -> Vec<OrderPatch> {
        Vec::new()
    }
}

/// A record with a dense 1..N `order` field, scoped by `group_key`.
pub trait Ordered: Record {
    fn order(&self) -> u32;

    fn set_order(&mut self, order: u32);

    /// Records sharing a group key are ordered together.
    fn group_key(&self) -> &str {
        ""
    }
}

/// Generates an id for a record created locally.
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// The whole content cache: every collection in one value.
///
/// This is what `load_all` returns and what the durable mirror stores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSnapshot {
    pub carousel: Vec<CarouselItem>,
    pub contact: Vec<ContactEntry>,
    pub schedule: Vec<ScheduleEntry>,
    pub about: AboutContent,
}

impl ContentSnapshot {
    /// Replaces the record with id `local_id` by `record`, or appends it.
    ///
    /// Used to merge a gateway-confirmed record, whose id may differ from
    /// the locally generated one, into a copy.
    pub fn replace_id<T: Record>(&mut self, local_id: &str, record: T) {
        let mut records = T::records(self).to_vec();
        if T::KIND == CollectionKind::About {
            records = vec![record];
        } else if let Some(slot) = records.iter_mut().find(|r| r.id() == local_id) {
            *slot = record;
        } else {
            records.push(record);
        }
        T::replace_all(self, records);
    }

    /// Inserts or replaces a record by its own id.
    pub fn upsert<T: Record>(&mut self, record: T) {
        let id = record.id().to_string();
        self.replace_id(&id, record);
    }

    /// Removes the record `id` from collection `kind`. Returns true if found.
    ///
    /// Removing the about record resets it to its default.
    pub fn remove(&mut self, kind: CollectionKind, id: &str) -> bool {
        fn remove_from<T: Record>(records: &mut Vec<T>, id: &str) -> bool {
            let before = records.len();
            records.retain(|r| r.id() != id);
            records.len() != before
        }

        match kind {
            CollectionKind::Carousel => remove_from(&mut self.carousel, id),
            CollectionKind::Contact => remove_from(&mut self.contact, id),
            CollectionKind::Schedule => remove_from(&mut self.schedule, id),
            CollectionKind::About => {
                let found = self.about.id == id;
                if found {
                    self.about = AboutContent::default();
                }
                found
            }
        }
    }

    /// Applies a bulk order update. Returns false for unordered collections.
    pub fn apply_order(&mut self, kind: CollectionKind, patch: &[OrderPatch]) -> bool {
        match kind {
            CollectionKind::Carousel => {
                ordering::apply_patch(&mut self.carousel, patch);
                ordering::sort_by_order(&mut self.carousel);
                true
            }
            CollectionKind::Schedule => {
                ordering::apply_patch(&mut self.schedule, patch);
                ordering::sort_by_order(&mut self.schedule);
                true
            }
            CollectionKind::Contact | CollectionKind::About => false,
        }
    }

    /// Sorts an ordered collection and renumbers each group to `1..=k`.
    ///
    /// Returns the pairs whose order changed; empty for unordered collections.
    pub fn compact_order(&mut self, kind: CollectionKind) -> Vec<OrderPatch> {
        match kind {
            CollectionKind::Carousel => {
                ordering::sort_by_order(&mut self.carousel);
                ordering::compact(&mut self.carousel)
            }
            CollectionKind::Schedule => {
                ordering::sort_by_order(&mut self.schedule);
                ordering::compact(&mut self.schedule)
            }
            CollectionKind::Contact | CollectionKind::About => Vec::new(),
        }
    }
}
