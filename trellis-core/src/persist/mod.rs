//! Persistence adapter.
//!
//! Bridges an observable list to a durable key-value store. The store
//! is injected explicitly through the [`KeyValueStore`] trait; the
//! core never touches an ambient store.
//!
//! On attachment, [`persist`] restores prior state if the store holds
//! any, then subscribes a handler that writes the serialized list back
//! under the same key on every change. The store is read exactly once;
//! after that, durability flows one way, from list to store.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Error;
use crate::observable::{Intercepted, ObservableList, Persist};

/// The durable store boundary: a string-keyed, string-valued service.
///
/// The core treats stored values purely as serialized text. Resilience
/// concerns (retrying flaky writes, caching) belong to implementations
/// of this trait, not to the adapter.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Write `value` under `key`, replacing any prior value.
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        (**self).set(key, value)
    }
}

/// An in-process store backed by a map. Useful for tests and for
/// embedding without any real durability layer.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Attach persistence to `list` under `key`.
///
/// If `store` holds a value for `key`, it is parsed and restored into
/// the list before anything else can observe it; malformed stored text
/// is surfaced as [`Error::MalformedSnapshot`] and the list's prior
/// state is left untouched. The adapter then subscribes a write-back
/// handler, which (by the subscribe contract) runs once immediately,
/// so store and list agree from the moment of attachment.
///
/// Store write failures inside the handler are logged and swallowed;
/// they never abort a notification cycle.
pub fn persist<T, S>(
    list: Intercepted<ObservableList<T>>,
    store: S,
    key: impl Into<String>,
) -> Result<Intercepted<ObservableList<T>>, Error>
where
    T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
    S: KeyValueStore + Send + Sync + 'static,
{
    let key = key.into();

    if let Some(text) = store.get(&key)? {
        let data = serde_json::from_str(&text).map_err(|source| Error::MalformedSnapshot {
            key: key.clone(),
            source,
        })?;
        list.restore(data)?;
        debug!(key = %key, "restored list from durable store");
    }

    // The write-back subscriber stays active for the life of the list;
    // dropping the subscription handle does not remove it.
    let _ = list.subscribe(move |current: &ObservableList<T>| {
        let text = match current.serialize() {
            Ok(value) => value.to_string(),
            Err(err) => {
                warn!(key = %key, error = %err, "failed to serialize list for persistence");
                return;
            }
        };
        if let Err(err) = store.set(&key, &text) {
            warn!(key = %key, error = %err, "failed to persist list");
        }
    });

    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::list as make_list;
    use std::sync::Arc;

    #[test]
    fn memory_store_get_and_set() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        assert_eq!(store.len(), 1);

        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn attach_with_empty_store_keeps_initial_state() {
        let store = Arc::new(MemoryStore::new());
        let list = persist(make_list([1, 2, 3]), Arc::clone(&store), "k").unwrap();

        assert_eq!(list.elements(), vec![1, 2, 3]);
        // The initial subscribe invocation wrote the current state back.
        assert_eq!(store.get("k").unwrap(), Some("[1,2,3]".to_string()));
    }

    #[test]
    fn attach_restores_prior_state() {
        let store = Arc::new(MemoryStore::new());
        store.set("k", "[1,2]").unwrap();

        let list = persist(make_list::<i32, _>([]), Arc::clone(&store), "k").unwrap();
        assert_eq!(list.elements(), vec![1, 2]);
    }

    #[test]
    fn changes_flow_back_to_the_store() {
        let store = Arc::new(MemoryStore::new());
        let list = persist(make_list::<i32, _>([]), Arc::clone(&store), "k").unwrap();

        list.replace_all([4, 5, 6]);
        assert_eq!(store.get("k").unwrap(), Some("[4,5,6]".to_string()));

        list.replace_all([]);
        assert_eq!(store.get("k").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn malformed_stored_value_fails_fast() {
        let store = Arc::new(MemoryStore::new());
        store.set("k", "not json {").unwrap();

        let err = persist(make_list([9]), Arc::clone(&store), "k").unwrap_err();
        assert!(matches!(err, Error::MalformedSnapshot { .. }));
        // The stored value was not overwritten by a partial attach.
        assert_eq!(store.get("k").unwrap(), Some("not json {".to_string()));
    }
}
