use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use rollstock_core::RollId;
use rollstock_inventory::{NewRoll, Roll, RollFilter, StatsWindow};

use super::{RollStore, StoreError};

#[derive(Debug, Default)]
struct State {
    last_id: i64,
    rolls: BTreeMap<RollId, Roll>,
}

/// In-memory roll store for tests/dev.
///
/// Ids are assigned sequentially from 1. Snapshots are clones taken under the
/// read lock.
#[derive(Debug, Default)]
pub struct InMemoryRollStore {
    inner: RwLock<State>,
}

impl InMemoryRollStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed roll (fixtures and imports); keeps the id sequence
    /// ahead of the highest inserted id.
    pub fn insert(&self, roll: Roll) -> Result<(), StoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        state.last_id = state.last_id.max(roll.id.get());
        state.rolls.insert(roll.id, roll);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|s| s.rolls.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, predicate: impl Fn(&Roll) -> bool) -> Result<Vec<Roll>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.rolls.values().filter(|r| predicate(r)).cloned().collect())
    }
}

fn poisoned() -> StoreError {
    StoreError::Storage("in-memory roll store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl RollStore for InMemoryRollStore {
    async fn create(&self, new: NewRoll, added_at: DateTime<Utc>) -> Result<Roll, StoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        let id = RollId::new(state.last_id + 1);
        let roll = Roll::create(id, new, added_at)?;
        state.last_id = id.get();
        state.rolls.insert(id, roll.clone());
        Ok(roll)
    }

    async fn soft_delete(&self, id: RollId, removed_at: DateTime<Utc>) -> Result<Roll, StoreError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        let roll = state.rolls.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        roll.remove(removed_at)?;
        Ok(roll.clone())
    }

    async fn get(&self, id: RollId) -> Result<Option<Roll>, StoreError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.rolls.get(&id).cloned())
    }

    async fn list(&self, filter: &RollFilter) -> Result<Vec<Roll>, StoreError> {
        self.select(|r| filter.matches(r))
    }

    async fn stats_snapshot(&self, window: &StatsWindow) -> Result<Vec<Roll>, StoreError> {
        self.select(|r| window.admits(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rollstock_core::DomainError;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn new_roll(length: f64, weight: f64) -> NewRoll {
        NewRoll { length, weight }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = InMemoryRollStore::new();
        let a = store.create(new_roll(10.5, 200.0), ts(2023, 1, 1)).await.unwrap();
        let b = store.create(new_roll(15.0, 300.0), ts(2023, 1, 2)).await.unwrap();

        assert_eq!(a.id, RollId::new(1));
        assert_eq!(b.id, RollId::new(2));
        assert!(a.is_active());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_without_consuming_an_id() {
        let store = InMemoryRollStore::new();
        let err = store.create(new_roll(-1.0, 200.0), ts(2023, 1, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Validation(_))));
        assert!(store.is_empty());

        let ok = store.create(new_roll(1.0, 2.0), ts(2023, 1, 1)).await.unwrap();
        assert_eq!(ok.id, RollId::new(1));
    }

    #[tokio::test]
    async fn soft_delete_keeps_the_row() {
        let store = InMemoryRollStore::new();
        let roll = store.create(new_roll(10.0, 100.0), ts(2023, 1, 1)).await.unwrap();

        let removed = store.soft_delete(roll.id, ts(2023, 1, 5)).await.unwrap();
        assert_eq!(removed.removed_date, Some(ts(2023, 1, 5)));

        let stored = store.get(roll.id).await.unwrap().unwrap();
        assert_eq!(stored, removed);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn soft_delete_twice_conflicts() {
        let store = InMemoryRollStore::new();
        let roll = store.create(new_roll(10.0, 100.0), ts(2023, 1, 1)).await.unwrap();
        store.soft_delete(roll.id, ts(2023, 1, 2)).await.unwrap();

        let err = store.soft_delete(roll.id, ts(2023, 1, 3)).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));
        let stored = store.get(roll.id).await.unwrap().unwrap();
        assert_eq!(stored.removed_date, Some(ts(2023, 1, 2)));
    }

    #[tokio::test]
    async fn soft_delete_unknown_roll_is_not_found() {
        let store = InMemoryRollStore::new();
        let err = store.soft_delete(RollId::new(99), ts(2023, 1, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == RollId::new(99)));
    }

    #[tokio::test]
    async fn list_applies_filter_in_id_order() {
        let store = InMemoryRollStore::new();
        for (i, w) in [150.0, 250.0, 120.0].into_iter().enumerate() {
            store
                .create(new_roll(5.0, w), ts(2023, 1, 1) + Duration::days(i as i64))
                .await
                .unwrap();
        }

        let all = store.list(&RollFilter::default()).await.unwrap();
        assert_eq!(all.iter().map(|r| r.id.get()).collect::<Vec<_>>(), vec![1, 2, 3]);

        let filter = RollFilter::from_query(None, Some("100-200"), None, None, None).unwrap();
        let light = store.list(&filter).await.unwrap();
        assert_eq!(light.iter().map(|r| r.id.get()).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn stats_snapshot_uses_window_admission() {
        let store = InMemoryRollStore::new();
        let early = store.create(new_roll(1.0, 1.0), ts(2022, 12, 31)).await.unwrap();
        let inside = store.create(new_roll(1.0, 1.0), ts(2023, 1, 2)).await.unwrap();
        let removed_late = store.create(new_roll(1.0, 1.0), ts(2023, 1, 3)).await.unwrap();
        store.soft_delete(removed_late.id, ts(2023, 3, 1)).await.unwrap();

        let window = StatsWindow::new(ts(2023, 1, 1), ts(2023, 1, 31)).unwrap();
        let snapshot = store.stats_snapshot(&window).await.unwrap();
        let ids: Vec<RollId> = snapshot.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![inside.id]);
        assert!(!ids.contains(&early.id));
    }

    #[tokio::test]
    async fn insert_advances_the_id_sequence() {
        let store = InMemoryRollStore::new();
        store
            .insert(Roll {
                id: RollId::new(10),
                length: 1.0,
                weight: 1.0,
                added_date: ts(2023, 1, 1),
                removed_date: None,
            })
            .unwrap();
        let next = store.create(new_roll(1.0, 1.0), ts(2023, 1, 2)).await.unwrap();
        assert_eq!(next.id, RollId::new(11));
    }
}
