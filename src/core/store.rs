use std::collections::HashMap;
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};

/// Raw key/value access. Everything the app persists goes through this.
pub trait KvStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// JSON helpers on top of any [`KvStore`], mirroring the Spin store API.
pub trait KvStoreExt {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>>;
    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()>;
}

impl<S: KvStore + ?Sized> KvStoreExt for S {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        self.set(key, &serde_json::to_vec(value)?)
    }
}

/// Default key/value store of the Spin host.
pub struct SpinStore {
    inner: spin_sdk::key_value::Store,
}

impl SpinStore {
    pub fn open_default() -> anyhow::Result<Self> {
        let inner = spin_sdk::key_value::Store::open_default()
            .map_err(|e| anyhow::anyhow!("Failed to open KV store: {:?}", e))?;
        Ok(Self { inner })
    }
}

impl KvStore for SpinStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        self.inner
            .get(key)
            .map_err(|e| anyhow::anyhow!("KV get {} failed: {:?}", key, e))
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.inner
            .set(key, value)
            .map_err(|e| anyhow::anyhow!("KV set {} failed: {:?}", key, e))
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.inner
            .delete(key)
            .map_err(|e| anyhow::anyhow!("KV delete {} failed: {:?}", key, e))
    }
}

/// Process-local store used by the native server and the tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_values_survive_the_store() {
        let store = MemoryStore::new();
        store.set_json("feed", &vec!["a".to_string(), "b".to_string()]).unwrap();

        let feed: Vec<String> = store.get_json("feed").unwrap().unwrap();
        assert_eq!(feed, vec!["a", "b"]);
        assert_eq!(store.get_json::<Vec<String>>("missing").unwrap(), None);
    }

    #[test]
    fn delete_removes_key() {
        let store = MemoryStore::new();
        store.set("k", b"v").unwrap();
        assert_eq!(store.len(), 1);

        store.delete("k").unwrap();
        store.delete("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn works_through_trait_object() {
        let store = MemoryStore::new();
        let dyn_store: &dyn KvStore = &store;
        dyn_store.set_json("n", &42u64).unwrap();
        assert_eq!(dyn_store.get_json::<u64>("n").unwrap(), Some(42));
    }
}
