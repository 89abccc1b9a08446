use crate::cube_model::CubeStoreError;
use crate::schema_store::SchemaStore;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Schema document kept in a single file on local disk.
#[derive(Debug, Clone)]
pub struct LocalSchemaStore {
    path: PathBuf,
}

impl LocalSchemaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl SchemaStore for LocalSchemaStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<String, CubeStoreError> {
        fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CubeStoreError::DocumentNotFound(self.location()),
            ErrorKind::InvalidData => CubeStoreError::Parse(format!(
                "{} is not valid UTF-8",
                self.location()
            )),
            _ => CubeStoreError::Read(e.to_string()),
        })
    }

    fn write(&self, content: &str) -> Result<(), CubeStoreError> {
        // Written next to the target so the final rename stays on one filesystem.
        let mut staged = NamedTempFile::new_in(self.directory())
            .map_err(|e| CubeStoreError::Write(e.to_string()))?;
        staged
            .write_all(content.as_bytes())
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| CubeStoreError::Write(e.to_string()))?;
        staged
            .persist(&self.path)
            .map_err(|e| CubeStoreError::Write(e.error.to_string()))?;
        Ok(())
    }
}
