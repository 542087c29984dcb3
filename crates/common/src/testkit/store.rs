use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::store::{raw_cid, Cid, ContentStore, StoreError};

#[derive(Default)]
struct State {
    blobs: HashMap<Cid, Bytes>,
    puts: usize,
    fail_on_put: Option<usize>,
}

/// A content store held in memory
///
/// Blobs are addressed exactly as the real store addresses them (CIDv1, raw,
/// SHA2-256), so CIDs computed here are valid elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`th put from now on fail (0-based)
    pub fn fail_on_put(&self, n: usize) {
        let mut state = self.state.lock();
        state.fail_on_put = Some(state.puts + n);
    }

    pub fn len(&self) -> usize {
        self.state.lock().blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of put calls seen, failed ones included
    pub fn puts(&self) -> usize {
        self.state.lock().puts
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.state.lock().blobs.contains_key(cid)
    }

    /// Overwrite a stored blob, keeping its CID
    pub fn corrupt(&self, cid: &Cid, data: Bytes) {
        self.state.lock().blobs.insert(*cid, data);
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<Cid, StoreError> {
        let mut state = self.state.lock();
        let attempt = state.puts;
        state.puts += 1;

        if state.fail_on_put == Some(attempt) {
            return Err(StoreError::Upload(format!(
                "injected failure on put #{} ({})",
                attempt, name
            )));
        }

        let cid = raw_cid(&data);
        state.blobs.insert(cid, data);
        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Bytes, StoreError> {
        self.state
            .lock()
            .blobs
            .get(cid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(cid.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryStore::new();
        let cid = store.put("blob", Bytes::from_static(b"abc")).await.unwrap();
        assert_eq!(cid, raw_cid(b"abc"));
        assert_eq!(store.get(&cid).await.unwrap(), Bytes::from_static(b"abc"));
        assert!(matches!(
            store.get(&raw_cid(b"other")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_on_put(1);
        assert!(store.put("a", Bytes::from_static(b"a")).await.is_ok());
        assert!(store.put("b", Bytes::from_static(b"b")).await.is_err());
        assert!(store.put("c", Bytes::from_static(b"c")).await.is_ok());
        assert_eq!(store.len(), 2);
        assert_eq!(store.puts(), 3);
    }
}
