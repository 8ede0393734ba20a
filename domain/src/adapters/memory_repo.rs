use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{CoreError, Item, ItemId, ItemRepository};

/// Simple in-memory repository for tests and local dev. A single mutex
/// guards the map, so individual operations are atomic, but nothing here is
/// persisted and a caller's read-then-write sequence can still interleave
/// with other writers.
///
/// Each instance owns its own collection; tests get isolated stores by
/// constructing their own.
pub struct InMemoryRepo {
    inner: Mutex<BTreeMap<String, Item>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    fn key(id: &ItemId) -> String {
        id.as_str().to_string()
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemRepository for InMemoryRepo {
    fn list(&self) -> Result<Vec<Item>, CoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        Ok(map.values().cloned().collect())
    }

    fn get(&self, id: &ItemId) -> Result<Option<Item>, CoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        Ok(map.get(&Self::key(id)).cloned())
    }

    fn create(&self, item: Item) -> Result<(), CoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        let key = Self::key(&item.id);
        if map.contains_key(&key) {
            return Err(CoreError::AlreadyExists);
        }
        map.insert(key, item);
        Ok(())
    }

    fn update(&self, item: &Item) -> Result<(), CoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        let key = Self::key(&item.id);
        if !map.contains_key(&key) {
            return Err(CoreError::NotFound);
        }
        map.insert(key, item.clone());
        Ok(())
    }

    fn delete(&self, id: &ItemId) -> Result<(), CoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        match map.remove(&Self::key(id)) {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewItem;
    use std::time::SystemTime;

    fn mk_id(n: u8) -> ItemId {
        ItemId::new(format!("00000000-0000-4000-8000-0000000000{:02x}", n)).unwrap()
    }

    fn mk_item(id: ItemId, name: &str, price: f64) -> Item {
        Item::new(
            id,
            NewItem {
                name: name.to_string(),
                description: None,
                price,
            },
            SystemTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn create_get_roundtrip() {
        let repo = InMemoryRepo::new();
        let item = mk_item(mk_id(1), "Potion", 9.0);
        repo.create(item.clone()).unwrap();
        let got = repo.get(&item.id).unwrap().unwrap();
        assert_eq!(got, item);
    }

    #[test]
    fn get_unknown_is_none() {
        let repo = InMemoryRepo::new();
        assert!(repo.get(&mk_id(42)).unwrap().is_none());
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let repo = InMemoryRepo::new();
        let item = mk_item(mk_id(1), "Potion", 9.0);
        repo.create(item.clone()).unwrap();
        let err = repo.create(item).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists));
    }

    #[test]
    fn update_replaces_in_full() {
        let repo = InMemoryRepo::new();
        let item = mk_item(mk_id(1), "Potion", 9.0);
        repo.create(item.clone()).unwrap();

        let replaced = item.replaced_with(NewItem {
            name: "Elixir".into(),
            description: Some("stronger".into()),
            price: 15.0,
        });
        repo.update(&replaced).unwrap();

        let got = repo.get(&item.id).unwrap().unwrap();
        assert_eq!(got.name, "Elixir");
        assert_eq!(got.price, 15.0);
        assert_eq!(got.id, item.id);
        assert_eq!(got.created_date, item.created_date);
    }

    #[test]
    fn update_unknown_is_not_found_and_changes_nothing() {
        let repo = InMemoryRepo::new();
        let item = mk_item(mk_id(1), "Potion", 9.0);
        let err = repo.update(&item).unwrap_err();
        assert!(matches!(err, CoreError::NotFound));
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn delete_removes_item() {
        let repo = InMemoryRepo::new();
        let item = mk_item(mk_id(1), "Potion", 9.0);
        repo.create(item.clone()).unwrap();
        repo.delete(&item.id).unwrap();
        assert!(repo.get(&item.id).unwrap().is_none());
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let repo = InMemoryRepo::new();
        let err = repo.delete(&mk_id(9)).unwrap_err();
        assert!(matches!(err, CoreError::NotFound));
    }

    #[test]
    fn list_tracks_creates_minus_deletes() {
        let repo = InMemoryRepo::new();
        for n in 0..5 {
            repo.create(mk_item(mk_id(n), &format!("item-{}", n), 1.0 + n as f64))
                .unwrap();
        }
        repo.delete(&mk_id(0)).unwrap();
        repo.delete(&mk_id(3)).unwrap();
        let items = repo.list().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.id != mk_id(0) && i.id != mk_id(3)));
    }
}
