//! Authoritative content storage for the reference gateway.
//!
//! All four collections live in one JSON file:
//! ```text
//! <DATA_DIR>/
//!   content.json
//! ```
//!
//! Every mutation is applied to a copy, validated, written to disk, and only
//! then made visible.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use eldirecto_core::models::{new_record_id, ContentSnapshot, Record};
use eldirecto_core::{CollectionKind, ContentError, OrderPatch};
use serde_json::Value;

const CONTENT_FILE: &str = "content.json";

/// The about collection is a singleton with a fixed id.
pub const ABOUT_ID: &str = "about";

#[derive(Debug)]
pub enum RepositoryError {
    Io(PathBuf, io::Error),
    Corrupt(PathBuf, serde_json::Error),
    /// The request body does not describe a record of the collection.
    Invalid(String),
    NotFound { kind: CollectionKind, id: String },
    /// The change would break a collection invariant.
    Conflict(ContentError),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::Io(path, e) => write!(f, "I/O error for {}: {}", path.display(), e),
            RepositoryError::Corrupt(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
            RepositoryError::Invalid(msg) => write!(f, "Invalid record: {}", msg),
            RepositoryError::NotFound { kind, id } => write!(f, "No {} record '{}'", kind, id),
            RepositoryError::Conflict(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RepositoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepositoryError::Io(_, e) => Some(e),
            RepositoryError::Corrupt(_, e) => Some(e),
            RepositoryError::Conflict(e) => Some(e),
            _ => None,
        }
    }
}

/// File-backed store of the four collections.
#[derive(Debug)]
pub struct ContentRepository {
    path: PathBuf,
    content: Mutex<ContentSnapshot>,
}

impl ContentRepository {
    /// Opens the repository in `data_dir`, starting empty if there is no file.
    pub fn open(data_dir: &Path) -> Result<Self, RepositoryError> {
        fs::create_dir_all(data_dir).map_err(|e| RepositoryError::Io(data_dir.to_path_buf(), e))?;
        let path = data_dir.join(CONTENT_FILE);

        let content = match fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Corrupt(path.clone(), e))?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => ContentSnapshot::default(),
            Err(e) => return Err(RepositoryError::Io(path, e)),
        };

        Ok(Self {
            path,
            content: Mutex::new(content),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ContentSnapshot> {
        self.content.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `change` to a copy of the content and commits it if it
    /// succeeds and the copy was written to disk.
    fn mutate<R>(
        &self,
        change: impl FnOnce(&mut ContentSnapshot) -> Result<R, RepositoryError>,
    ) -> Result<R, RepositoryError> {
        let mut content = self.lock();
        let mut candidate = content.clone();
        let result = change(&mut candidate)?;
        self.write(&candidate)?;
        *content = candidate;
        Ok(result)
    }

    fn write(&self, content: &ContentSnapshot) -> Result<(), RepositoryError> {
        let tmp = self.path.with_extension("json.tmp");
        let bytes =
            serde_json::to_vec_pretty(content).map_err(|e| RepositoryError::Corrupt(self.path.clone(), e))?;
        fs::write(&tmp, bytes).map_err(|e| RepositoryError::Io(tmp.clone(), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| RepositoryError::Io(self.path.clone(), e))
    }

    pub fn snapshot(&self) -> ContentSnapshot {
        self.lock().clone()
    }

    pub fn list<T: Record>(&self) -> Vec<T> {
        T::records(&self.lock()).to_vec()
    }

    /// Stores a new record under a server-assigned id.
    ///
    /// Ordered collections are renumbered afterwards, so an order past the
    /// end of its group is stored as the next free position.
    pub fn create<T: Record>(&self, body: Value) -> Result<T, RepositoryError> {
        let id = if T::KIND == CollectionKind::About {
            ABOUT_ID.to_string()
        } else {
            new_record_id()
        };
        let record: T = with_id(body, &id)?;

        self.mutate(|content| {
            content.upsert(record.clone());
            T::check(T::records(content)).map_err(RepositoryError::Conflict)?;
            content.compact_order(T::KIND);
            Ok(stored(content, record))
        })
    }

    /// Replaces the record `id` with `fields`.
    pub fn update<T: Record>(&self, id: &str, fields: Value) -> Result<T, RepositoryError> {
        let id = if T::KIND == CollectionKind::About { ABOUT_ID } else { id };
        let record: T = with_id(fields, id)?;

        self.mutate(|content| {
            let exists = T::KIND == CollectionKind::About || T::records(content).iter().any(|r| r.id() == id);
            if !exists {
                return Err(RepositoryError::NotFound {
                    kind: T::KIND,
                    id: id.to_string(),
                });
            }
            content.upsert(record.clone());
            T::check(T::records(content)).map_err(RepositoryError::Conflict)?;
            Ok(record)
        })
    }

    /// Applies a bulk order update and renumbers the collection densely.
    /// Every id must exist.
    pub fn update_order<T: Record>(&self, patch: &[OrderPatch]) -> Result<Vec<T>, RepositoryError> {
        if !T::KIND.is_ordered() {
            return Err(RepositoryError::Invalid(format!("{} is not ordered", T::KIND)));
        }

        self.mutate(|content| {
            if let Some(missing) = patch
                .iter()
                .find(|p| !T::records(content).iter().any(|r| r.id() == p.id))
            {
                return Err(RepositoryError::NotFound {
                    kind: T::KIND,
                    id: missing.id.clone(),
                });
            }
            content.apply_order(T::KIND, patch);
            content.compact_order(T::KIND);
            Ok(T::records(content).to_vec())
        })
    }

    pub fn delete(&self, kind: CollectionKind, id: &str) -> Result<(), RepositoryError> {
        self.mutate(|content| {
            if content.remove(kind, id) {
                content.compact_order(kind);
                Ok(())
            } else {
                Err(RepositoryError::NotFound {
                    kind,
                    id: id.to_string(),
                })
            }
        })
    }
}

/// The copy of `record` held in `content`, as renumbered.
fn stored<T: Record>(content: &ContentSnapshot, record: T) -> T {
    T::records(content)
        .iter()
        .find(|r| r.id() == record.id())
        .cloned()
        .unwrap_or(record)
}

/// Decodes `body` as a `T` whose id is `id`, whatever the body said.
fn with_id<T: Record>(body: Value, id: &str) -> Result<T, RepositoryError> {
    let mut body = body;
    let object = body
        .as_object_mut()
        .ok_or_else(|| RepositoryError::Invalid("expected a JSON object".to_string()))?;
    object.insert("id".to_string(), Value::String(id.to_string()));
    serde_json::from_value(body).map_err(|e| RepositoryError::Invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eldirecto_core::{AboutContent, BranchRef, CarouselItem, ImageRef, ScheduleEntry};
    use serde_json::json;
    use tempfile::tempdir;

    fn slide(title: &str, order: u32) -> Value {
        let mut item = CarouselItem::new(ImageRef::uri("https://cdn.example/a.jpg"), title, "");
        item.order = order;
        serde_json::to_value(item).unwrap()
    }

    #[test]
    fn test_create_assigns_id_and_persists() {
        let dir = tempdir().unwrap();
        let repo = ContentRepository::open(dir.path()).unwrap();

        let mut body = slide("Flota", 1);
        body["id"] = json!("client-id");
        let created: CarouselItem = repo.create(body).unwrap();
        assert_ne!(created.id, "client-id");

        let reopened = ContentRepository::open(dir.path()).unwrap();
        assert_eq!(reopened.list::<CarouselItem>(), vec![created]);
    }

    #[test]
    fn test_about_is_singleton() {
        let dir = tempdir().unwrap();
        let repo = ContentRepository::open(dir.path()).unwrap();

        let about: AboutContent = repo.create(json!({"content": "uno"})).unwrap();
        assert_eq!(about.id, ABOUT_ID);
        let about: AboutContent = repo.update("", json!({"content": "dos"})).unwrap();
        assert_eq!(about.content, "dos");
        assert_eq!(repo.list::<AboutContent>().len(), 1);
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let dir = tempdir().unwrap();
        let repo = ContentRepository::open(dir.path()).unwrap();
        let result = repo.update::<CarouselItem>("nope", slide("x", 1));
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[test]
    fn test_duplicate_day_label_conflicts() {
        let dir = tempdir().unwrap();
        let repo = ContentRepository::open(dir.path()).unwrap();
        let ros = BranchRef::new("ros", "Rosario");

        let entry = ScheduleEntry::new(ros.clone(), "Sábado", "07:00 – 11:30");
        repo.create::<ScheduleEntry>(serde_json::to_value(entry).unwrap())
            .unwrap();
        let again = ScheduleEntry::new(ros, "SÁBADO", "Cerrado");
        let result = repo.create::<ScheduleEntry>(serde_json::to_value(again).unwrap());

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(repo.list::<ScheduleEntry>().len(), 1);
    }

    #[test]
    fn test_update_order_requires_known_ids() {
        let dir = tempdir().unwrap();
        let repo = ContentRepository::open(dir.path()).unwrap();
        let a: CarouselItem = repo.create(slide("A", 1)).unwrap();
        let b: CarouselItem = repo.create(slide("B", 2)).unwrap();

        let swapped = repo
            .update_order::<CarouselItem>(&[
                OrderPatch { id: a.id.clone(), order: 2 },
                OrderPatch { id: b.id.clone(), order: 1 },
            ])
            .unwrap();
        assert_eq!(swapped[0].id, b.id);

        let result = repo.update_order::<CarouselItem>(&[OrderPatch {
            id: "ghost".to_string(),
            order: 1,
        }]);
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
        assert_eq!(repo.list::<CarouselItem>()[0].id, b.id);
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let repo = ContentRepository::open(dir.path()).unwrap();
        let a: CarouselItem = repo.create(slide("A", 1)).unwrap();

        repo.delete(CollectionKind::Carousel, &a.id).unwrap();
        assert!(repo.list::<CarouselItem>().is_empty());
        assert!(matches!(
            repo.delete(CollectionKind::Carousel, &a.id),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_create_past_the_end_is_renumbered() {
        let dir = tempdir().unwrap();
        let repo = ContentRepository::open(dir.path()).unwrap();
        repo.create::<CarouselItem>(slide("A", 1)).unwrap();

        let late: CarouselItem = repo.create(slide("B", 9)).unwrap();
        assert_eq!(late.order, 2);
        let orders: Vec<u32> = repo.list::<CarouselItem>().iter().map(|i| i.order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn test_update_order_with_gap_is_renumbered() {
        let dir = tempdir().unwrap();
        let repo = ContentRepository::open(dir.path()).unwrap();
        let a: CarouselItem = repo.create(slide("A", 1)).unwrap();
        let b: CarouselItem = repo.create(slide("B", 2)).unwrap();

        let items = repo
            .update_order::<CarouselItem>(&[OrderPatch { id: a.id.clone(), order: 5 }])
            .unwrap();
        let orders: Vec<(String, u32)> = items.iter().map(|i| (i.id.clone(), i.order)).collect();
        assert_eq!(orders, vec![(b.id, 1), (a.id, 2)]);
    }

    #[test]
    fn test_delete_closes_the_gap() {
        let dir = tempdir().unwrap();
        let repo = ContentRepository::open(dir.path()).unwrap();
        let a: CarouselItem = repo.create(slide("A", 1)).unwrap();
        repo.create::<CarouselItem>(slide("B", 2)).unwrap();
        repo.create::<CarouselItem>(slide("C", 3)).unwrap();

        repo.delete(CollectionKind::Carousel, &a.id).unwrap();
        let reopened = ContentRepository::open(dir.path()).unwrap();
        let orders: Vec<(String, u32)> = reopened
            .list::<CarouselItem>()
            .into_iter()
            .map(|i| (i.title, i.order))
            .collect();
        assert_eq!(orders, vec![("B".to_string(), 1), ("C".to_string(), 2)]);
    }

    #[test]
    fn test_non_object_body_is_invalid() {
        let dir = tempdir().unwrap();
        let repo = ContentRepository::open(dir.path()).unwrap();
        let result = repo.create::<CarouselItem>(json!([1, 2]));
        assert!(matches!(result, Err(RepositoryError::Invalid(_))));
    }
}
