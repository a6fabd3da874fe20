use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{DocumentStore, StoreError};

/// In-memory document store used by tests and the fixtures-backed dev
/// mode. Tracks write counts so tests can assert that a clean save never
/// touches the store.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<(String, String), Value>>,
    writes: AtomicUsize,
    fail_writes_to: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, collection: &str, id: &str, body: Value) {
        self.docs
            .lock()
            .unwrap()
            .insert((collection.to_string(), id.to_string()), body);
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        self.docs
            .lock()
            .unwrap()
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Make every write to the given document id fail, for exercising
    /// partial-failure saves.
    pub fn fail_writes_to(&self, id: &str) {
        *self.fail_writes_to.lock().unwrap() = Some(id.to_string());
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let docs = self.docs.lock().unwrap();
        let mut out: Vec<(String, Value)> = docs
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|((_, id), body)| (id.clone(), body.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.document(collection, id))
    }

    async fn put_document(
        &self,
        collection: &str,
        id: &str,
        body: &Value,
    ) -> Result<(), StoreError> {
        if self.fail_writes_to.lock().unwrap().as_deref() == Some(id) {
            return Err(StoreError::Status { status: 503, detail: "write rejected".into() });
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.seed(collection, id, body.clone());
        Ok(())
    }
}
