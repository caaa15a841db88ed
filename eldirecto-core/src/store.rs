//! The content store: session, confirmed and working copies, durable mirror.
//!
//! The store keeps two copies of every collection. The *confirmed* copy is
//! what the gateway last acknowledged; the *working* copy is what the operator
//! edits. Saving sends the delta between the two and merges the gateway's
//! answer back into both by id. Nothing reaches the confirmed copy without a
//! successful gateway call.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::collection::{CollectionKind, LoadState};
use crate::diff::{compute_delta, is_known};
use crate::error::ContentError;
use crate::gateway::{Gateway, GatewayError};
use crate::mirror::{DurableMirror, MirroredCache};
use crate::models::{AboutContent, CarouselItem, ContactEntry, ContentSnapshot, Ordered, Record, ScheduleEntry};
use crate::ordering::{self, Direction, MoveOutcome, OrderPatch};
use crate::session::Session;

/// Result of [`ContentStore::load_all`].
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// All four collections as loaded, fallbacks included.
    pub content: ContentSnapshot,
    /// Collections whose read failed, with the reason.
    pub failures: Vec<(CollectionKind, GatewayError)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, kind: CollectionKind) -> bool {
        self.failures.iter().any(|(k, _)| *k == kind)
    }

    /// Whether a read was refused for lack of a valid token.
    pub fn requires_login(&self) -> bool {
        self.failures
            .iter()
            .any(|(_, e)| *e == GatewayError::Unauthorized)
    }
}

/// Result of [`ContentStore::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The working copy matches the confirmed copy. Nothing was sent.
    NoChanges,
    Saved { created: usize, updated: usize },
}

pub struct ContentStore<G> {
    gateway: G,
    session: Session,
    mirror: DurableMirror,
    /// Last cache known to be in the mirror.
    fallback: Option<MirroredCache>,
    confirmed: ContentSnapshot,
    working: ContentSnapshot,
    states: HashMap<CollectionKind, LoadState>,
}

impl<G: Gateway> ContentStore<G> {
    /// Creates a store and reads the mirror once.
    ///
    /// Until the first load completes, the mirrored content is visible but
    /// every collection is `Unloaded`. Edits that were mirrored but never
    /// confirmed are still unsaved.
    pub fn new(gateway: G, mirror: DurableMirror, session: Session) -> Self {
        let fallback = match mirror.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable content mirror");
                None
            }
        };
        let initial = fallback.clone().unwrap_or_default();

        Self {
            gateway,
            session,
            mirror,
            fallback,
            confirmed: initial.confirmed,
            working: initial.working,
            states: HashMap::new(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Logs in and, on success, loads every collection.
    ///
    /// A failed login leaves the store untouched and loads nothing.
    pub async fn login(&mut self, user: &str, pass: &str) -> bool {
        if !self.session.login(&self.gateway, user, pass).await {
            return false;
        }

        if let Err(e) = self.load_all().await {
            warn!(error = %e, "Initial load failed");
        }
        true
    }

    /// Ends the session and drops both in-memory copies.
    ///
    /// The mirror is left as it was.
    pub fn logout(&mut self) {
        self.session.logout();
        self.confirmed = ContentSnapshot::default();
        self.working = ContentSnapshot::default();
        self.states.clear();
        info!("Logged out");
    }

    /// Reads all four collections concurrently.
    ///
    /// A failed read never aborts the others: that collection falls back to
    /// the mirror, or to its default, and is marked `LoadedFromFallback`.
    /// A fallback restores the mirrored confirmed and working copies
    /// separately, so unsaved edits stay unsaved. A successful read replaces
    /// both copies. A 401 on any read also ends the session.
    pub async fn load_all(&mut self) -> Result<LoadReport, ContentError> {
        let token = self.token()?;
        for kind in CollectionKind::ALL {
            self.states.insert(kind, LoadState::Loading);
        }

        let gateway = &self.gateway;
        let (carousel, contact, schedule, about) = futures::join!(
            gateway.read::<CarouselItem>(&token),
            gateway.read::<ContactEntry>(&token),
            gateway.read::<ScheduleEntry>(&token),
            gateway.read::<AboutContent>(&token),
        );

        let mut report = LoadReport::default();
        self.settle(carousel, &mut report);
        self.settle(contact, &mut report);
        self.settle(schedule, &mut report);
        self.settle(about, &mut report);
        for snapshot in [&mut self.confirmed, &mut self.working] {
            ordering::sort_by_order(&mut snapshot.carousel);
            ordering::sort_by_order(&mut snapshot.schedule);
        }

        if report.requires_login() {
            warn!("Gateway rejected the session token");
            self.session.logout();
        }
        if report.failures.len() < CollectionKind::ALL.len() {
            self.persist();
        }

        info!(failed = report.failures.len(), "Content loaded");
        report.content = self.working.clone();
        Ok(report)
    }

    fn settle<T: Record>(&mut self, result: Result<Vec<T>, GatewayError>, report: &mut LoadReport) {
        let kind = T::KIND;
        let (confirmed, working, state) = match result {
            Ok(records) => (records.clone(), records, LoadState::Loaded),
            Err(e) => {
                warn!(
                    collection = %kind,
                    error = %e,
                    mirror = self.fallback.is_some(),
                    "Read failed, using fallback"
                );
                report.failures.push((kind, e));
                let (confirmed, working) = match &self.fallback {
                    Some(cache) => (
                        T::records(&cache.confirmed).to_vec(),
                        T::records(&cache.working).to_vec(),
                    ),
                    None => (Vec::new(), Vec::new()),
                };
                (confirmed, working, LoadState::LoadedFromFallback)
            }
        };

        T::replace_all(&mut self.confirmed, confirmed);
        T::replace_all(&mut self.working, working);
        self.states.insert(kind, state);
    }

    pub fn state(&self, kind: CollectionKind) -> LoadState {
        self.states.get(&kind).copied().unwrap_or_default()
    }

    /// The working copy of every collection.
    pub fn snapshot(&self) -> &ContentSnapshot {
        &self.working
    }

    pub fn working<T: Record>(&self) -> &[T] {
        T::records(&self.working)
    }

    pub fn confirmed<T: Record>(&self) -> &[T] {
        T::records(&self.confirmed)
    }

    pub fn has_unsaved_changes<T: Record>(&self) -> bool {
        !compute_delta(self.confirmed::<T>(), self.working::<T>()).is_empty()
    }

    /// Replaces the working copy of one collection and mirrors the cache.
    ///
    /// The mirror write is best-effort and cannot fail the replacement.
    pub fn update_collection<T: Record>(&mut self, records: Vec<T>) {
        T::replace_all(&mut self.working, records);
        self.persist();
    }

    /// Inserts or replaces one record in the working copy, by id.
    pub fn stage<T: Record>(&mut self, record: T) -> Result<(), ContentError> {
        let mut candidate = self.working.clone();
        candidate.upsert(record);
        T::check(T::records(&candidate))?;

        let records = T::records(&candidate).to_vec();
        self.update_collection(records);
        Ok(())
    }

    /// Stages a new record at the end of its group. Returns its id.
    pub fn append<T: Ordered>(&mut self, mut record: T) -> Result<String, ContentError> {
        let order = ordering::next_order(self.working::<T>(), record.group_key());
        record.set_order(order);
        let id = record.id().to_string();
        self.stage(record)?;
        Ok(id)
    }

    /// Drops unsaved edits to one collection.
    pub fn discard<T: Record>(&mut self) {
        let records = self.confirmed::<T>().to_vec();
        self.update_collection(records);
    }

    /// Sends the delta of one collection to the gateway.
    ///
    /// Records unknown to the confirmed copy are created, the rest updated.
    /// Each confirmed record is merged into both copies by id. The first
    /// failure stops the save; records confirmed before it stay confirmed and
    /// the rest remain unsaved edits.
    pub async fn save<T: Record>(&mut self) -> Result<SaveOutcome, ContentError> {
        let kind = T::KIND;
        let token = self.writable(kind)?;
        T::check(self.working::<T>())?;

        let delta = compute_delta(self.confirmed::<T>(), self.working::<T>());
        if delta.is_empty() {
            debug!(collection = %kind, "Nothing to save");
            return Ok(SaveOutcome::NoChanges);
        }
        debug!(collection = %kind, records = delta.len(), "Saving delta");

        let (mut created, mut updated) = (0, 0);
        for record in delta {
            let known = is_known(self.confirmed::<T>(), record.id());
            let result = if known {
                self.gateway.update(&token, &record).await
            } else {
                self.gateway.create(&token, &record).await
            };

            match result {
                Ok(stored) => {
                    self.confirmed.replace_id(record.id(), stored.clone());
                    self.working.replace_id(record.id(), stored);
                    if known {
                        updated += 1;
                    } else {
                        created += 1;
                    }
                }
                Err(e) => {
                    if created + updated > 0 {
                        self.persist();
                    }
                    return Err(self.write_failed(kind, e));
                }
            }
        }

        self.persist();
        info!(collection = %kind, created, updated, "Saved");
        Ok(SaveOutcome::Saved { created, updated })
    }

    /// Deletes one record. The gateway must confirm before anything changes
    /// locally.
    ///
    /// A record that was never saved is only removed from the working copy.
    /// After any removal from an ordered collection the working copy is
    /// compacted back to `1..=k`, drafts included, and the new order of the
    /// records the gateway knows is pushed. If that push fails the deletion
    /// still stands; the confirmed copy keeps the gateway's order and the
    /// compacted orders remain unsaved edits for the next save.
    pub async fn delete<T: Record>(&mut self, id: &str) -> Result<(), ContentError> {
        let token = self.writable(T::KIND)?;
        let kind = T::KIND;

        if !is_known(self.confirmed::<T>(), id) {
            if !self.working.remove(kind, id) {
                return Err(ContentError::NotFound {
                    kind,
                    id: id.to_string(),
                });
            }
            self.compact_working::<T>();
            self.persist();
            return Ok(());
        }

        if let Err(e) = self.gateway.delete(&token, kind, id).await {
            return Err(self.write_failed(kind, e));
        }
        self.confirmed.remove(kind, id);
        self.working.remove(kind, id);
        info!(collection = %kind, id, "Deleted");

        let changed = self.compact_working::<T>();
        let patch: Vec<OrderPatch> = changed
            .into_iter()
            .filter(|p| is_known(self.confirmed::<T>(), &p.id))
            .collect();
        if patch.is_empty() {
            self.persist();
            return Ok(());
        }

        let pushed = self.gateway.update_order(&token, kind, &patch).await;
        let result = match pushed {
            Ok(()) => {
                self.confirmed.apply_order(kind, &patch);
                Ok(())
            }
            Err(e) => {
                warn!(collection = %kind, error = %e, "Order compaction after delete failed");
                Err(self.order_failed(kind, e))
            }
        };
        self.persist();
        result
    }

    /// Moves one record a step within its group and pushes the new order.
    ///
    /// The working copy changes only after the gateway accepts the order.
    /// Records that were never saved are renumbered locally but not sent.
    pub async fn move_record<T: Ordered>(
        &mut self,
        id: &str,
        direction: Direction,
    ) -> Result<MoveOutcome<T>, ContentError> {
        let token = self.writable(T::KIND)?;
        let kind = T::KIND;

        let outcome = ordering::move_record(self.working::<T>(), id, direction).ok_or_else(|| {
            ContentError::NotFound {
                kind,
                id: id.to_string(),
            }
        })?;
        let MoveOutcome::Moved(records) = outcome else {
            debug!(collection = %kind, id, %direction, "Move at boundary ignored");
            return Ok(MoveOutcome::Unchanged);
        };

        let group = records
            .iter()
            .find(|r| r.id() == id)
            .map(|r| r.group_key().to_string())
            .unwrap_or_default();
        let patch: Vec<_> = ordering::order_patch(&records, &group)
            .into_iter()
            .filter(|p| is_known(self.confirmed::<T>(), &p.id))
            .collect();

        if !patch.is_empty() {
            if let Err(e) = self.gateway.update_order(&token, kind, &patch).await {
                warn!(collection = %kind, id, error = %e, "Order update rejected, keeping previous order");
                return Err(self.order_failed(kind, e));
            }
            self.confirmed.apply_order(kind, &patch);
        }

        self.update_collection(records.clone());
        Ok(MoveOutcome::Moved(records))
    }

    fn token(&self) -> Result<String, ContentError> {
        self.session
            .token()
            .map(str::to_string)
            .ok_or(ContentError::NotAuthenticated)
    }

    /// Token for an upstream write to `kind`, if one is allowed.
    fn writable(&self, kind: CollectionKind) -> Result<String, ContentError> {
        let token = self.token()?;
        if !self.state(kind).is_loaded() {
            return Err(ContentError::NotLoaded(kind));
        }
        Ok(token)
    }

    fn write_failed(&mut self, kind: CollectionKind, source: GatewayError) -> ContentError {
        if source == GatewayError::Unauthorized {
            self.session.logout();
            return ContentError::NotAuthenticated;
        }
        warn!(collection = %kind, error = %source, "Write rejected");
        ContentError::Write { kind, source }
    }

    fn order_failed(&mut self, kind: CollectionKind, source: GatewayError) -> ContentError {
        if source == GatewayError::Unauthorized {
            self.session.logout();
            return ContentError::NotAuthenticated;
        }
        ContentError::OrderSync { kind, source }
    }

    /// Renumbers the working copy of `T` to `1..=k` per group.
    ///
    /// Returns the pairs whose order changed.
    fn compact_working<T: Record>(&mut self) -> Vec<OrderPatch> {
        let mut records = self.working::<T>().to_vec();
        let changed = T::compact(&mut records);
        if !changed.is_empty() {
            T::replace_all(&mut self.working, records);
        }
        changed
    }

    /// Best-effort mirror write of both copies.
    fn persist(&mut self) {
        let cache = MirroredCache {
            confirmed: self.confirmed.clone(),
            working: self.working.clone(),
        };
        match self.mirror.save(&cache) {
            Ok(()) => self.fallback = Some(cache),
            Err(e) => warn!(error = %e, "Could not update content mirror"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::{FakeGateway, PASS, TOKEN, USER};
    use crate::models::{BranchRef, ImageRef};
    use tempfile::{tempdir, TempDir};

    fn slide(n: u32) -> CarouselItem {
        let mut item = CarouselItem::new(
            ImageRef::uri(format!("https://cdn.example/{}.jpg", n)),
            format!("Slide {}", n),
            "",
        );
        item.id = format!("c{}", n);
        item.order = n;
        item
    }

    fn hours(id: &str, branch: &BranchRef, day: &str, order: u32) -> ScheduleEntry {
        let mut entry = ScheduleEntry::new(branch.clone(), day, "07:00 – 15:30");
        entry.id = id.to_string();
        entry.order = order;
        entry
    }

    fn server_content() -> ContentSnapshot {
        let ros = BranchRef::new("ros", "Rosario");
        let mdp = BranchRef::new("mdp", "Mar del Plata");
        ContentSnapshot {
            carousel: (1..=5).map(slide).collect(),
            contact: vec![
                ContactEntry::new("Rosario", "+54 341 439-7465"),
                ContactEntry::new("Mar del Plata", "+54 223 480-1234"),
            ],
            schedule: vec![
                hours("s1", &ros, "Lunes a Viernes", 1),
                hours("s2", &ros, "Sábado", 2),
                hours("s3", &mdp, "Lunes a Viernes", 1),
            ],
            about: AboutContent {
                id: "about".to_string(),
                content: "Transporte de cargas desde 1985.".to_string(),
            },
        }
    }

    fn store_with(gateway: FakeGateway) -> (ContentStore<FakeGateway>, TempDir) {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(gateway, DurableMirror::new(dir.path()), Session::new());
        (store, dir)
    }

    async fn logged_in() -> (ContentStore<FakeGateway>, TempDir) {
        let (mut store, dir) = store_with(FakeGateway::with_content(server_content()));
        assert!(store.login(USER, PASS).await);
        (store, dir)
    }

    fn titles(store: &ContentStore<FakeGateway>) -> Vec<String> {
        store
            .working::<CarouselItem>()
            .iter()
            .map(|i| i.title.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_wrong_password_loads_nothing() {
        let (mut store, _dir) = store_with(FakeGateway::with_content(server_content()));

        assert!(!store.login(USER, "incorrecta").await);
        assert!(!store.is_authenticated());
        assert_eq!(store.gateway().count("read"), 0);
        assert_eq!(store.state(CollectionKind::Carousel), LoadState::Unloaded);
        assert!(store.snapshot().carousel.is_empty());
    }

    #[tokio::test]
    async fn test_load_all_reads_every_collection() {
        let (store, dir) = logged_in().await;

        assert_eq!(store.gateway().count("read"), 4);
        for kind in CollectionKind::ALL {
            assert_eq!(store.state(kind), LoadState::Loaded);
        }
        assert_eq!(store.working::<CarouselItem>().len(), 5);
        assert!(DurableMirror::new(dir.path()).exists());
    }

    #[tokio::test]
    async fn test_about_failure_does_not_block_others() {
        let gateway = FakeGateway::with_content(server_content());
        gateway.fail_reads(CollectionKind::About);
        let (mut store, _dir) = store_with(gateway);

        assert!(store.login(USER, PASS).await);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.carousel.len(), 5);
        assert_eq!(snapshot.contact.len(), 2);
        assert_eq!(snapshot.schedule.len(), 3);
        assert_eq!(snapshot.about, AboutContent::default());
        assert_eq!(store.state(CollectionKind::About), LoadState::LoadedFromFallback);
        assert_eq!(store.state(CollectionKind::Carousel), LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_failed_read_falls_back_to_mirror() {
        let dir = tempdir().unwrap();
        let mirror = DurableMirror::new(dir.path());
        let mut mirrored = MirroredCache::default();
        mirrored.confirmed.about = AboutContent::new("Texto guardado");
        mirrored.working.about = AboutContent::new("Texto guardado");
        mirror.save(&mirrored).unwrap();

        let gateway = FakeGateway::with_content(server_content());
        gateway.fail_reads(CollectionKind::About);
        let mut store = ContentStore::new(gateway, mirror, Session::new());
        assert_eq!(store.snapshot().about.content, "Texto guardado");

        let report = store.load_all().await;
        assert!(matches!(report, Err(ContentError::NotAuthenticated)));

        assert!(store.login(USER, PASS).await);
        assert_eq!(store.snapshot().about.content, "Texto guardado");
        assert_eq!(store.snapshot().carousel.len(), 5);
    }

    #[tokio::test]
    async fn test_report_lists_failures() {
        let gateway = FakeGateway::with_content(server_content());
        gateway.fail_reads(CollectionKind::Contact);
        let (mut store, _dir) = store_with(gateway);
        store.login(USER, PASS).await;

        let report = store.load_all().await.unwrap();
        assert!(!report.is_complete());
        assert!(report.failed(CollectionKind::Contact));
        assert!(!report.requires_login());
        assert_eq!(report.content.carousel.len(), 5);
    }

    #[tokio::test]
    async fn test_expired_token_on_load_ends_session() {
        let (mut store, _dir) = logged_in().await;
        store.gateway().expired.set(true);

        let report = store.load_all().await.unwrap();
        assert!(report.requires_login());
        assert!(!store.is_authenticated());
        assert_eq!(store.snapshot().carousel.len(), 5);
    }

    #[tokio::test]
    async fn test_move_scenario() {
        let (mut store, _dir) = logged_in().await;

        let outcome = store
            .move_record::<CarouselItem>("c3", Direction::Up)
            .await
            .unwrap();
        assert!(matches!(outcome, MoveOutcome::Moved(_)));
        assert_eq!(titles(&store), vec!["Slide 1", "Slide 3", "Slide 2", "Slide 4", "Slide 5"]);
        let orders: Vec<u32> = store.working::<CarouselItem>().iter().map(|i| i.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
        assert_eq!(store.gateway().count("order"), 1);
        assert_eq!(store.gateway().content.borrow().carousel[1].id, "c3");

        let outcome = store
            .move_record::<CarouselItem>("c1", Direction::Up)
            .await
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Unchanged);
        assert_eq!(store.gateway().count("order"), 1);
        assert!(!store.has_unsaved_changes::<CarouselItem>());
    }

    #[tokio::test]
    async fn test_failed_move_keeps_previous_order() {
        let (mut store, _dir) = logged_in().await;
        store.gateway().fail_order.set(true);

        let err = store
            .move_record::<CarouselItem>("c2", Direction::Down)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::OrderSync { .. }));
        assert_eq!(titles(&store)[1], "Slide 2");
        assert_eq!(store.working::<CarouselItem>()[1].order, 2);
    }

    #[tokio::test]
    async fn test_schedule_move_stays_in_branch() {
        let (mut store, _dir) = logged_in().await;

        store
            .move_record::<ScheduleEntry>("s2", Direction::Up)
            .await
            .unwrap();
        let mdp = store
            .working::<ScheduleEntry>()
            .iter()
            .find(|e| e.id == "s3")
            .map(|e| e.order);
        assert_eq!(mdp, Some(1));

        let groups = ordering::group_by_branch(store.working::<ScheduleEntry>());
        assert_eq!(groups[0].entries[0].id, "s2");
        assert_eq!(groups[0].entries[1].order, 2);

        let outcome = store
            .move_record::<ScheduleEntry>("s3", Direction::Down)
            .await
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_save_without_changes_sends_nothing() {
        let (mut store, _dir) = logged_in().await;

        let outcome = store.save::<ContactEntry>().await.unwrap();
        assert_eq!(outcome, SaveOutcome::NoChanges);
        assert_eq!(store.gateway().count("update"), 0);
        assert_eq!(store.gateway().count("create"), 0);
    }

    #[tokio::test]
    async fn test_save_updates_and_creates() {
        let (mut store, _dir) = logged_in().await;

        let mut edited = store.working::<CarouselItem>()[0].clone();
        edited.title = "Flota renovada".to_string();
        store.stage(edited).unwrap();
        let local_id = store
            .append(CarouselItem::new(ImageRef::blob("hero-6"), "Depósito", "Rosario"))
            .unwrap();
        assert!(store.has_unsaved_changes::<CarouselItem>());

        let outcome = store.save::<CarouselItem>().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { created: 1, updated: 1 });

        let items = store.working::<CarouselItem>();
        assert_eq!(items[0].title, "Flota renovada");
        assert_eq!(items[5].id, "srv-1");
        assert_eq!(items[5].order, 6);
        assert!(items.iter().all(|i| i.id != local_id));
        assert!(!store.has_unsaved_changes::<CarouselItem>());
        assert_eq!(store.confirmed::<CarouselItem>(), store.working::<CarouselItem>());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_edits_unconfirmed() {
        let (mut store, _dir) = logged_in().await;
        store.gateway().fail_writes(CollectionKind::About);

        store.stage(AboutContent {
            id: "about".to_string(),
            content: "Nuevo texto".to_string(),
        })
        .unwrap();

        let err = store.save::<AboutContent>().await.unwrap_err();
        assert!(matches!(err, ContentError::Write { kind: CollectionKind::About, .. }));
        assert_eq!(store.snapshot().about.content, "Nuevo texto");
        assert_eq!(
            store.confirmed::<AboutContent>()[0].content,
            "Transporte de cargas desde 1985."
        );
        assert!(store.has_unsaved_changes::<AboutContent>());
    }

    #[tokio::test]
    async fn test_expired_token_on_save_is_not_authenticated() {
        let (mut store, _dir) = logged_in().await;
        store.gateway().expired.set(true);

        let mut edited = store.working::<ContactEntry>()[0].clone();
        edited.phone = "0800-222-3456".to_string();
        store.stage(edited).unwrap();

        let err = store.save::<ContactEntry>().await.unwrap_err();
        assert!(err.is_auth());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_duplicate_day_label_rejected() {
        let (mut store, _dir) = logged_in().await;
        let ros = BranchRef::new("ros", "Rosario");

        let err = store
            .append(ScheduleEntry::new(ros, "sábado", "Cerrado"))
            .unwrap_err();
        assert!(matches!(err, ContentError::DuplicateDayLabel { .. }));
        assert_eq!(store.working::<ScheduleEntry>().len(), 3);
    }

    #[tokio::test]
    async fn test_new_branch_group_starts_at_one() {
        let (mut store, _dir) = logged_in().await;
        let cba = BranchRef::new("cba", "Córdoba");

        let id = store
            .append(ScheduleEntry::new(cba, "Lunes a Viernes", "08:00 – 17:00"))
            .unwrap();
        let entries = store.working::<ScheduleEntry>();
        assert_eq!(entries.iter().find(|e| e.id == id).map(|e| e.order), Some(1));
        assert_eq!(entries.iter().find(|e| e.id == "s2").map(|e| e.order), Some(2));
    }

    #[tokio::test]
    async fn test_delete_compacts_order() {
        let (mut store, _dir) = logged_in().await;

        store.delete::<CarouselItem>("c2").await.unwrap();

        let orders: Vec<(String, u32)> = store
            .working::<CarouselItem>()
            .iter()
            .map(|i| (i.id.clone(), i.order))
            .collect();
        assert_eq!(
            orders,
            vec![
                ("c1".to_string(), 1),
                ("c3".to_string(), 2),
                ("c4".to_string(), 3),
                ("c5".to_string(), 4)
            ]
        );
        assert!(store.gateway().calls().contains(&"order carousel 3".to_string()));
        assert!(ordering::is_dense(&store.gateway().content.borrow().carousel));
    }

    #[tokio::test]
    async fn test_failed_delete_changes_nothing() {
        let (mut store, _dir) = logged_in().await;
        store.gateway().fail_writes(CollectionKind::Carousel);

        let err = store.delete::<CarouselItem>("c2").await.unwrap_err();
        assert!(matches!(err, ContentError::Write { .. }));
        assert_eq!(store.working::<CarouselItem>().len(), 5);
        assert_eq!(store.confirmed::<CarouselItem>().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_compaction_leaves_order_unsaved() {
        let (mut store, _dir) = logged_in().await;
        store.gateway().fail_order.set(true);

        let err = store.delete::<CarouselItem>("c1").await.unwrap_err();
        assert!(matches!(err, ContentError::OrderSync { .. }));
        assert_eq!(store.working::<CarouselItem>().len(), 4);
        assert_eq!(store.working::<CarouselItem>()[0].order, 1);
        assert_eq!(store.confirmed::<CarouselItem>()[0].order, 2);
        assert!(store.has_unsaved_changes::<CarouselItem>());

        store.gateway().fail_order.set(false);
        let outcome = store.save::<CarouselItem>().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { created: 0, updated: 4 });
        assert!(ordering::is_dense(&store.gateway().content.borrow().carousel));
    }

    #[tokio::test]
    async fn test_deleting_a_draft_keeps_later_drafts_dense() {
        let (mut store, _dir) = logged_in().await;
        let first = store
            .append(CarouselItem::new(ImageRef::uri("a"), "Borrador A", ""))
            .unwrap();
        store
            .append(CarouselItem::new(ImageRef::uri("b"), "Borrador B", ""))
            .unwrap();

        store.delete::<CarouselItem>(&first).await.unwrap();
        assert!(ordering::is_dense(store.working::<CarouselItem>()));

        store.save::<CarouselItem>().await.unwrap();
        let server = store.gateway().content.borrow().carousel.clone();
        assert_eq!(server.len(), 6);
        assert!(ordering::is_dense(&server));
        assert_eq!(server.iter().find(|i| i.title == "Borrador B").map(|i| i.order), Some(6));
    }

    #[tokio::test]
    async fn test_delete_renumbers_pending_drafts() {
        let (mut store, _dir) = logged_in().await;
        store
            .append(CarouselItem::new(ImageRef::uri("a"), "Borrador", ""))
            .unwrap();

        store.delete::<CarouselItem>("c2").await.unwrap();
        assert!(ordering::is_dense(store.working::<CarouselItem>()));
        assert!(store.gateway().calls().contains(&"order carousel 3".to_string()));

        store.save::<CarouselItem>().await.unwrap();
        let server = store.gateway().content.borrow().carousel.clone();
        assert_eq!(server.len(), 5);
        assert!(ordering::is_dense(&server));
        assert_eq!(server.iter().find(|i| i.title == "Borrador").map(|i| i.order), Some(5));
    }

    #[tokio::test]
    async fn test_unconfirmed_draft_survives_restart_on_fallback() {
        let dir = tempdir().unwrap();
        let gateway = FakeGateway::with_content(server_content());
        gateway.fail_writes(CollectionKind::Carousel);
        let mut store = ContentStore::new(gateway, DurableMirror::new(dir.path()), Session::new());
        assert!(store.login(USER, PASS).await);
        store
            .append(CarouselItem::new(ImageRef::uri("a"), "Borrador", ""))
            .unwrap();
        assert!(store.save::<CarouselItem>().await.is_err());

        let gateway = FakeGateway::with_content(server_content());
        gateway.fail_reads(CollectionKind::Carousel);
        let mut restarted = ContentStore::new(gateway, DurableMirror::new(dir.path()), Session::new());
        assert!(restarted.login(USER, PASS).await);

        assert_eq!(restarted.state(CollectionKind::Carousel), LoadState::LoadedFromFallback);
        assert_eq!(restarted.working::<CarouselItem>().len(), 6);
        assert_eq!(restarted.confirmed::<CarouselItem>().len(), 5);
        assert!(restarted.has_unsaved_changes::<CarouselItem>());

        let outcome = restarted.save::<CarouselItem>().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { created: 1, updated: 0 });
        assert_eq!(restarted.gateway().content.borrow().carousel.len(), 6);
    }

    #[tokio::test]
    async fn test_malformed_read_falls_back() {
        let (mut store, dir) = logged_in().await;
        store.logout();

        let gateway = FakeGateway::with_content(server_content());
        gateway.fail_reads_with(
            CollectionKind::Schedule,
            GatewayError::Malformed("expected an array".to_string()),
        );
        let mut store = ContentStore::new(gateway, DurableMirror::new(dir.path()), Session::new());
        assert!(store.login(USER, PASS).await);

        let report = store.load_all().await.unwrap();
        assert!(matches!(
            report.failures.as_slice(),
            [(CollectionKind::Schedule, GatewayError::Malformed(_))]
        ));
        assert_eq!(store.state(CollectionKind::Schedule), LoadState::LoadedFromFallback);
        assert_eq!(store.state(CollectionKind::Contact), LoadState::Loaded);
        assert_eq!(store.working::<ScheduleEntry>().len(), 3);
        assert!(!store.has_unsaved_changes::<ScheduleEntry>());
    }

    #[tokio::test]
    async fn test_delete_unsaved_record_is_local() {
        let (mut store, _dir) = logged_in().await;
        let id = store
            .append(CarouselItem::new(ImageRef::uri("u"), "Borrador", ""))
            .unwrap();

        store.delete::<CarouselItem>(&id).await.unwrap();
        assert_eq!(store.gateway().count("delete"), 0);
        assert!(!store.has_unsaved_changes::<CarouselItem>());

        let err = store.delete::<CarouselItem>("nope").await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_writes_require_loaded_collection() {
        let (mut store, dir) = store_with(FakeGateway::with_content(server_content()));
        let err = store.save::<CarouselItem>().await.unwrap_err();
        assert!(err.is_auth());

        let mut store = ContentStore::new(
            FakeGateway::with_content(server_content()),
            DurableMirror::new(dir.path()),
            Session::resume(TOKEN),
        );
        let err = store.save::<CarouselItem>().await.unwrap_err();
        assert!(matches!(err, ContentError::NotLoaded(CollectionKind::Carousel)));
    }

    #[tokio::test]
    async fn test_logout_discards_cache_but_keeps_mirror() {
        let (mut store, dir) = logged_in().await;
        store.logout();

        assert!(!store.is_authenticated());
        assert!(store.snapshot().carousel.is_empty());
        assert_eq!(store.state(CollectionKind::Carousel), LoadState::Unloaded);

        let mirrored = DurableMirror::new(dir.path()).load().unwrap().unwrap();
        assert_eq!(mirrored.confirmed.carousel.len(), 5);
    }

    #[tokio::test]
    async fn test_update_collection_writes_mirror() {
        let (mut store, dir) = logged_in().await;
        let mut items = store.working::<CarouselItem>().to_vec();
        items.truncate(2);
        store.update_collection(items);

        let mirrored = DurableMirror::new(dir.path()).load().unwrap().unwrap();
        assert_eq!(mirrored.working.carousel.len(), 2);
        assert_eq!(mirrored.confirmed.carousel.len(), 5);
        assert_eq!(store.confirmed::<CarouselItem>().len(), 5);
    }

    #[tokio::test]
    async fn test_discard_restores_confirmed() {
        let (mut store, _dir) = logged_in().await;
        let mut edited = store.working::<ContactEntry>()[1].clone();
        edited.address = Some("Av. Colón 1234".to_string());
        store.stage(edited).unwrap();

        store.discard::<ContactEntry>();
        assert!(!store.has_unsaved_changes::<ContactEntry>());
    }
}
