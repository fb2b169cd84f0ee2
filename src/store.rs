//! The subscription store: canonical collection plus change notifications.

use crate::backend::{MemoryBackend, PersistenceBackend};
use crate::config::{StoreConfig, LEGACY_STORAGE_KEY, STORAGE_KEY};
use crate::error::{Result, StoreError};
use crate::events::{Change, ChangeNotifier, ListenerConfig, ListenerHandle, ListenerId};
use crate::summary::Totals;
use crate::types::{sort_for_display, NewSubscription, Subscription, SubscriptionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Owns the persisted subscription collection.
///
/// Every operation re-reads the backend before acting, so a write made
/// directly to the backend (for example by a bulk import) is always seen.
/// Each mutating call performs exactly one full-collection write followed
/// by one [`crate::events::StoreEvent::Changed`]. Calls against the same
/// store are serialized; separate processes sharing a backend are not
/// coordinated and the last writer wins.
pub struct SubscriptionStore<B: PersistenceBackend> {
    backend: B,

    /// Key the collection is persisted under.
    key: String,

    /// Listener buffer size used by `subscribe_default`.
    event_buffer_size: usize,

    notifier: ChangeNotifier,

    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl SubscriptionStore<MemoryBackend> {
    /// Store over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl<B: PersistenceBackend> SubscriptionStore<B> {
    /// Create a store with the canonical key and default settings.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            key: STORAGE_KEY.to_string(),
            event_buffer_size: ListenerConfig::default().buffer_size,
            notifier: ChangeNotifier::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store from configuration, reporting any legacy data left
    /// under the old key.
    pub fn with_config(backend: B, config: &StoreConfig) -> Result<Self> {
        let store = Self {
            backend,
            key: config.storage_key.clone(),
            event_buffer_size: config.event_buffer_size,
            notifier: ChangeNotifier::new(),
            write_lock: Mutex::new(()),
        };
        store.check_legacy_key()?;
        Ok(store)
    }

    fn check_legacy_key(&self) -> Result<()> {
        if self.key == LEGACY_STORAGE_KEY {
            return Ok(());
        }
        if self.backend.get(&self.key)?.is_none() && self.backend.get(LEGACY_STORAGE_KEY)?.is_some() {
            warn!(
                legacy_key = LEGACY_STORAGE_KEY,
                key = %self.key,
                "found data under the legacy key only; it is not loaded"
            );
        }
        Ok(())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    // --- Notifications ---

    pub fn subscribe(&self, config: ListenerConfig) -> ListenerHandle {
        self.notifier.subscribe(config)
    }

    /// Subscribe with the configured buffer size.
    pub fn subscribe_default(&self) -> ListenerHandle {
        self.notifier.subscribe(ListenerConfig {
            buffer_size: self.event_buffer_size,
        })
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.notifier.unsubscribe(id);
    }

    /// Revision of the last write made through this store.
    pub fn revision(&self) -> u64 {
        self.notifier.revision()
    }

    // --- Reads ---

    /// All subscriptions in display order.
    pub fn list(&self) -> Result<Vec<Subscription>> {
        self.load()
    }

    pub fn get(&self, id: &SubscriptionId) -> Result<Option<Subscription>> {
        Ok(self.load()?.into_iter().find(|s| &s.id == id))
    }

    /// Monthly/yearly totals over the current collection.
    pub fn totals(&self) -> Result<Totals> {
        Ok(Totals::compute(&self.load()?))
    }

    fn load(&self) -> Result<Vec<Subscription>> {
        let mut subscriptions: Vec<Subscription> = match self.backend.get(&self.key)? {
            Some(blob) if !blob.is_empty() => serde_json::from_slice(&blob)?,
            _ => Vec::new(),
        };
        sort_for_display(&mut subscriptions);
        Ok(subscriptions)
    }

    /// Persist the full collection, then notify.
    fn save(&self, subscriptions: &[Subscription], change: Change) -> Result<u64> {
        let blob = serde_json::to_vec(subscriptions)?;
        self.backend.set(&self.key, &blob)?;
        let revision = self.notifier.notify(change, subscriptions.len());
        debug!(revision, len = subscriptions.len(), "persisted collection");
        Ok(revision)
    }

    // --- Writes ---

    /// Add a subscription. The store assigns a fresh id, an order one past
    /// the current maximum (or 1 for the first), and marks it active.
    pub fn add(&self, input: NewSubscription) -> Result<Subscription> {
        input.validate()?;
        let _lock = self.write_lock.lock();

        let mut subscriptions = self.load()?;
        let max_order = subscriptions
            .iter()
            .fold(0, |max, s| max.max(s.order.unwrap_or(0)));

        let id = loop {
            let candidate = SubscriptionId::generate();
            if !subscriptions.iter().any(|s| s.id == candidate) {
                break candidate;
            }
        };

        let order = max_order
            .checked_add(1)
            .ok_or(StoreError::OrderOverflow(max_order))?;
        let subscription = Subscription::from_new(id, input, order);
        subscriptions.push(subscription.clone());

        self.save(
            &subscriptions,
            Change::Added {
                id: subscription.id.clone(),
            },
        )?;
        info!(id = %subscription.id, name = %subscription.name, "added subscription");

        Ok(subscription)
    }

    /// Replace the record with the same id. Returns false (and still
    /// writes) when no record matched.
    pub fn update(&self, subscription: Subscription) -> Result<bool> {
        subscription.validate()?;
        let _lock = self.write_lock.lock();

        let mut subscriptions = self.load()?;
        let mut matched = false;
        for existing in subscriptions.iter_mut() {
            if existing.id == subscription.id {
                *existing = subscription.clone();
                matched = true;
            }
        }

        self.save(
            &subscriptions,
            Change::Updated {
                id: subscription.id.clone(),
                matched,
            },
        )?;
        if matched {
            info!(id = %subscription.id, "updated subscription");
        } else {
            debug!(id = %subscription.id, "update matched nothing");
        }

        Ok(matched)
    }

    /// Remove the record with this id. Deleting an unknown id is a no-op.
    pub fn delete(&self, id: &SubscriptionId) -> Result<bool> {
        let _lock = self.write_lock.lock();

        let mut subscriptions = self.load()?;
        let before = subscriptions.len();
        subscriptions.retain(|s| &s.id != id);
        let matched = subscriptions.len() != before;

        self.save(
            &subscriptions,
            Change::Deleted {
                id: id.clone(),
                matched,
            },
        )?;
        info!(id = %id, matched, "deleted subscription");

        Ok(matched)
    }

    /// Set each listed record's order to its index in `ordered_ids`.
    /// Records not listed keep their previous order.
    pub fn reorder(&self, ordered_ids: &[SubscriptionId]) -> Result<()> {
        let _lock = self.write_lock.lock();

        let positions: HashMap<&SubscriptionId, i64> = ordered_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id, i as i64))
            .collect();

        let mut subscriptions = self.load()?;
        for subscription in subscriptions.iter_mut() {
            if let Some(&position) = positions.get(&subscription.id) {
                subscription.order = Some(position);
            }
        }
        sort_for_display(&mut subscriptions);

        self.save(
            &subscriptions,
            Change::Reordered {
                count: ordered_ids.len(),
            },
        )?;
        info!(count = ordered_ids.len(), "reordered subscriptions");

        Ok(())
    }

    /// Flip the active flag. Returns the new flag, or None if no record
    /// matched.
    pub fn toggle_active(&self, id: &SubscriptionId) -> Result<Option<bool>> {
        let _lock = self.write_lock.lock();

        let mut subscriptions = self.load()?;
        let mut is_active = None;
        for subscription in subscriptions.iter_mut().filter(|s| &s.id == id) {
            subscription.is_active = !subscription.is_active;
            is_active = Some(subscription.is_active);
        }

        self.save(
            &subscriptions,
            Change::ActiveToggled {
                id: id.clone(),
                is_active,
            },
        )?;
        info!(id = %id, ?is_active, "toggled subscription");

        Ok(is_active)
    }

    /// Discard the current collection in favor of `subscriptions`.
    pub fn replace_all(&self, subscriptions: Vec<Subscription>) -> Result<()> {
        let _lock = self.write_lock.lock();

        let count = subscriptions.len();
        self.save(&subscriptions, Change::Replaced { count })?;
        info!(count, "replaced collection");

        Ok(())
    }

    /// Append `imported` after the existing records. Orders are kept as-is
    /// and ids are not deduplicated.
    pub fn append_all(&self, imported: Vec<Subscription>) -> Result<()> {
        let _lock = self.write_lock.lock();

        let count = imported.len();
        let mut subscriptions = self.load()?;
        let duplicates = imported
            .iter()
            .filter(|i| subscriptions.iter().any(|s| s.id == i.id))
            .count();
        if duplicates > 0 {
            warn!(duplicates, "appended records reuse existing ids");
        }
        subscriptions.extend(imported);

        self.save(&subscriptions, Change::Appended { count })?;
        info!(count, total = subscriptions.len(), "appended to collection");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StoreEvent;
    use crate::types::{BillingCycle, BillingDate};

    fn input(name: &str, price: f64, cycle: BillingCycle) -> NewSubscription {
        NewSubscription::new(name, price, cycle, BillingDate::parse("2024-01-01").unwrap())
    }

    fn names(subs: &[Subscription]) -> Vec<String> {
        subs.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let store = SubscriptionStore::in_memory();
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_add_after_maximum_order_fails_cleanly() {
        let backend = MemoryBackend::new();
        backend
            .set(
                STORAGE_KEY,
                br#"[{"id":"a","name":"A","price":1,"billingCycle":"monthly","nextBillingDate":"2024-01-01","order":9223372036854775807}]"#,
            )
            .unwrap();
        let store = SubscriptionStore::new(backend);
        let events = store.subscribe_default();

        assert!(matches!(
            store.add(input("B", 1.0, BillingCycle::Monthly)),
            Err(StoreError::OrderOverflow(i64::MAX))
        ));
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_add_assigns_id_order_and_active() {
        let store = SubscriptionStore::in_memory();

        let a = store.add(input("Netflix", 1490.0, BillingCycle::Monthly)).unwrap();
        let b = store.add(input("Spotify", 980.0, BillingCycle::Monthly)).unwrap();

        assert_eq!(a.order, Some(1));
        assert_eq!(b.order, Some(2));
        assert!(a.is_active && b.is_active);
        assert_ne!(a.id, b.id);
        assert_eq!(names(&store.list().unwrap()), vec!["Netflix", "Spotify"]);
    }

    #[test]
    fn test_add_order_follows_max_not_count() {
        let store = SubscriptionStore::in_memory();
        let a = store.add(input("A", 1.0, BillingCycle::Monthly)).unwrap();
        let mut moved = a.clone();
        moved.order = Some(10);
        store.update(moved).unwrap();

        let b = store.add(input("B", 1.0, BillingCycle::Monthly)).unwrap();
        assert_eq!(b.order, Some(11));
    }

    #[test]
    fn test_add_rejects_invalid_input() {
        let store = SubscriptionStore::in_memory();
        assert!(store.add(input("", 1.0, BillingCycle::Monthly)).is_err());
        assert!(store.add(input("X", -5.0, BillingCycle::Monthly)).is_err());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_update_replaces_matching_record() {
        let store = SubscriptionStore::in_memory();
        let sub = store.add(input("Netflix", 1490.0, BillingCycle::Monthly)).unwrap();

        let mut changed = sub.clone();
        changed.price = 1980.0;
        changed.category = Some("Entertainment".into());
        assert!(store.update(changed).unwrap());

        let stored = store.get(&sub.id).unwrap().unwrap();
        assert_eq!(stored.price, 1980.0);
        assert_eq!(stored.category.as_deref(), Some("Entertainment"));
    }

    #[test]
    fn test_update_unknown_id_is_noop_but_writes() {
        let store = SubscriptionStore::in_memory();
        let sub = store.add(input("Netflix", 1490.0, BillingCycle::Monthly)).unwrap();
        let handle = store.subscribe(ListenerConfig::default());

        let mut ghost = sub.clone();
        ghost.id = SubscriptionId::from("ghost");
        assert!(!store.update(ghost).unwrap());

        assert_eq!(store.list().unwrap(), vec![sub]);
        assert_eq!(handle.drain().len(), 1);
    }

    #[test]
    fn test_delete() {
        let store = SubscriptionStore::in_memory();
        let a = store.add(input("A", 1.0, BillingCycle::Monthly)).unwrap();
        store.add(input("B", 1.0, BillingCycle::Monthly)).unwrap();

        assert!(store.delete(&a.id).unwrap());
        assert_eq!(names(&store.list().unwrap()), vec!["B"]);

        assert!(!store.delete(&a.id).unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_reorder_sets_index_order() {
        let store = SubscriptionStore::in_memory();
        let a = store.add(input("A", 1.0, BillingCycle::Monthly)).unwrap();
        let b = store.add(input("B", 1.0, BillingCycle::Monthly)).unwrap();
        let c = store.add(input("C", 1.0, BillingCycle::Monthly)).unwrap();

        store.reorder(&[c.id.clone(), a.id.clone(), b.id.clone()]).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(names(&listed), vec!["C", "A", "B"]);
        let orders: Vec<_> = listed.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_reorder_partial_keeps_unlisted_orders() {
        let store = SubscriptionStore::in_memory();
        let a = store.add(input("A", 1.0, BillingCycle::Monthly)).unwrap();
        let b = store.add(input("B", 1.0, BillingCycle::Monthly)).unwrap();
        let c = store.add(input("C", 1.0, BillingCycle::Monthly)).unwrap();

        // Only B listed: B -> 0, A keeps 1, C keeps 3.
        store.reorder(&[b.id.clone(), SubscriptionId::from("unknown")]).unwrap();

        assert_eq!(store.get(&a.id).unwrap().unwrap().order, Some(1));
        assert_eq!(store.get(&b.id).unwrap().unwrap().order, Some(0));
        assert_eq!(store.get(&c.id).unwrap().unwrap().order, Some(3));
        assert_eq!(names(&store.list().unwrap()), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_toggle_active() {
        let store = SubscriptionStore::in_memory();
        let sub = store.add(input("A", 1.0, BillingCycle::Monthly)).unwrap();

        assert_eq!(store.toggle_active(&sub.id).unwrap(), Some(false));
        assert_eq!(store.toggle_active(&sub.id).unwrap(), Some(true));
        assert_eq!(store.toggle_active(&SubscriptionId::from("nope")).unwrap(), None);
    }

    #[test]
    fn test_toggle_on_record_without_flag() {
        let backend = MemoryBackend::new();
        backend
            .set(
                STORAGE_KEY,
                br#"[{"id":"old","name":"Legacy","price":100,"billingCycle":"yearly","nextBillingDate":"2023-05-01"}]"#,
            )
            .unwrap();
        let store = SubscriptionStore::new(backend);

        assert_eq!(store.toggle_active(&SubscriptionId::from("old")).unwrap(), Some(false));
    }

    #[test]
    fn test_replace_and_append() {
        let store = SubscriptionStore::in_memory();
        for i in 0..5 {
            store.add(input(&format!("S{}", i), 1.0, BillingCycle::Monthly)).unwrap();
        }
        let extra: Vec<Subscription> = (0..2)
            .map(|i| Subscription {
                order: None,
                ..Subscription::from_new(
                    SubscriptionId::from(format!("imp{}", i).as_str()),
                    input(&format!("I{}", i), 2.0, BillingCycle::Yearly),
                    0,
                )
            })
            .collect();

        store.append_all(extra.clone()).unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 7);
        // Imported records have no order and sort last.
        assert_eq!(listed[5].name, "I0");
        assert_eq!(listed[6].name, "I1");

        store.replace_all(extra).unwrap();
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_append_tolerates_duplicate_ids() {
        let store = SubscriptionStore::in_memory();
        let sub = store.add(input("A", 1.0, BillingCycle::Monthly)).unwrap();
        store.append_all(vec![sub.clone()]).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|s| s.id == sub.id));
    }

    #[test]
    fn test_every_write_emits_one_event() {
        let store = SubscriptionStore::in_memory();
        let handle = store.subscribe(ListenerConfig::default());

        let a = store.add(input("A", 1.0, BillingCycle::Monthly)).unwrap();
        store.toggle_active(&a.id).unwrap();
        store.reorder(&[a.id.clone()]).unwrap();
        store.delete(&a.id).unwrap();

        let events = handle.drain();
        assert_eq!(events.len(), 4);
        match &events[3] {
            StoreEvent::Changed { revision, change, len } => {
                assert_eq!(*revision, 4);
                assert_eq!(*len, 0);
                assert_eq!(
                    *change,
                    Change::Deleted {
                        id: a.id.clone(),
                        matched: true
                    }
                );
            }
            other => panic!("Expected Changed, got {:?}", other),
        }
    }

    #[test]
    fn test_reads_see_direct_backend_writes() {
        let backend = MemoryBackend::new();
        let store = SubscriptionStore::new(backend.clone());
        store.add(input("Stale", 1.0, BillingCycle::Monthly)).unwrap();

        backend.set(STORAGE_KEY, b"[]").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_legacy_key_is_ignored() {
        let backend = MemoryBackend::new();
        backend
            .set(
                LEGACY_STORAGE_KEY,
                br#"[{"id":"x","name":"Old","price":1,"billingCycle":"monthly","nextBillingDate":"2020-01-01"}]"#,
            )
            .unwrap();

        let store = SubscriptionStore::with_config(backend, &StoreConfig::default()).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_totals_exclude_inactive() {
        let store = SubscriptionStore::in_memory();
        store.add(input("Netflix", 1490.0, BillingCycle::Monthly)).unwrap();
        store.add(input("Cloud", 12000.0, BillingCycle::Yearly)).unwrap();
        let paused = store.add(input("Gym", 8000.0, BillingCycle::Monthly)).unwrap();
        store.toggle_active(&paused.id).unwrap();

        let totals = store.totals().unwrap();
        assert_eq!(totals.monthly, 2490.0);
        assert_eq!(totals.yearly, 29880.0);
        assert_eq!(totals.count, 3);
        assert_eq!(totals.active_count, 2);
    }
}
