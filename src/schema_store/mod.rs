pub mod local_store;
pub mod memory_store;

use crate::cube_model::CubeStoreError;
use crate::document::Document;
use log::debug;

pub use local_store::LocalSchemaStore;
pub use memory_store::MemorySchemaStore;

/// Backing storage of the schema document.
///
/// Implementations only move whole documents in and out; every operation
/// reads the current content fresh and writes the full document back.
pub trait SchemaStore {
    /// Human readable location, reported back to callers.
    fn location(&self) -> String;

    /// Raw document content. Fails with `DocumentNotFound` when absent.
    fn read(&self) -> Result<String, CubeStoreError>;

    /// Replaces the whole document. Either the new content is fully
    /// visible afterwards or the previous content is left in place.
    fn write(&self, content: &str) -> Result<(), CubeStoreError>;

    fn load(&self) -> Result<Document, CubeStoreError> {
        let content = self.read()?;
        let doc = Document::parse(&content).map_err(|e| CubeStoreError::Parse(e.to_string()))?;
        debug!("Loaded schema document from {}", self.location());
        Ok(doc)
    }

    fn persist(&self, doc: &Document) -> Result<(), CubeStoreError> {
        let content = doc
            .to_xml_string()
            .map_err(|e| CubeStoreError::Write(e.to_string()))?;
        self.write(&content)?;
        debug!(
            "Persisted schema document to {} ({} bytes)",
            self.location(),
            content.len()
        );
        Ok(())
    }
}
