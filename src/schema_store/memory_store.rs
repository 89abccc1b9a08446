use crate::cube_model::CubeStoreError;
use crate::schema_store::SchemaStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Schema document held in memory. Clones share the same document.
#[derive(Debug, Clone, Default)]
pub struct MemorySchemaStore {
    content: Arc<Mutex<Option<String>>>,
    read_only: Arc<AtomicBool>,
}

impl MemorySchemaStore {
    /// A store whose document does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: &str) -> Self {
        let store = Self::default();
        store.set_content(content);
        store
    }

    pub fn content(&self) -> Option<String> {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_content(&self, content: &str) {
        *self.content.lock().unwrap_or_else(PoisonError::into_inner) = Some(content.to_string());
    }

    /// Makes every subsequent write fail with `CubeStoreError::Write`.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

impl SchemaStore for MemorySchemaStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn read(&self) -> Result<String, CubeStoreError> {
        self.content()
            .ok_or_else(|| CubeStoreError::DocumentNotFound(self.location()))
    }

    fn write(&self, content: &str) -> Result<(), CubeStoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(CubeStoreError::Write("store is read-only".to_string()));
        }
        self.set_content(content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_content() {
        let store = MemorySchemaStore::new();
        assert!(matches!(
            store.read(),
            Err(CubeStoreError::DocumentNotFound(_))
        ));

        let other = store.clone();
        other.write("<Schema/>").unwrap();
        assert_eq!(store.read().unwrap(), "<Schema/>");
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let store = MemorySchemaStore::with_content("<Schema/>");
        store.set_read_only(true);
        assert!(matches!(
            store.write("<Schema name=\"x\"/>"),
            Err(CubeStoreError::Write(_))
        ));
        assert_eq!(store.content().as_deref(), Some("<Schema/>"));
    }
}
