use crate::cube_model::{builder, CubeIndex, CubeRequest, CubeStoreError};
use crate::document::{format, Document};
use crate::schema_store::SchemaStore;
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How `update_cube` replaces an existing cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStrategy {
    /// Delete and create as two separate load/persist cycles. A failing
    /// create leaves the document without the deleted cube, and the
    /// replacement lands after all other cubes.
    #[default]
    TwoPhase,
    /// Validate against the current document first, then swap the new cube
    /// into the old one's position with a single persist.
    InPlace,
}

impl FromStr for UpdateStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "two-phase" | "two_phase" => Ok(UpdateStrategy::TwoPhase),
            "in-place" | "in_place" => Ok(UpdateStrategy::InPlace),
            other => Err(format!("unknown update strategy: {}", other)),
        }
    }
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStrategy::TwoPhase => write!(f, "two-phase"),
            UpdateStrategy::InPlace => write!(f, "in-place"),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CubeListing {
    pub message: String,
    pub count: usize,
    pub cubes: Vec<String>,
    pub file_path: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CubeDocument {
    pub message: String,
    pub cube_name: String,
    pub xml: String,
    pub file_path: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CreatedCube {
    pub message: String,
    pub cube_name: String,
    pub table_name: String,
    pub dimensions_count: usize,
    pub measures_count: usize,
    pub file_path: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DeletedCube {
    pub message: String,
    pub cube_name: String,
    pub file_path: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ReplacedDocument {
    pub message: String,
    pub filename: String,
}

/// Cube CRUD over a schema document.
///
/// Every call loads the document fresh from the store and, when it mutates,
/// reformats and writes it back in full before returning. No state is kept
/// between calls and concurrent writers are not serialized.
pub struct CubeManager<S> {
    store: S,
    update_strategy: UpdateStrategy,
}

impl<S> CubeManager<S>
where
    S: SchemaStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            update_strategy: UpdateStrategy::default(),
        }
    }

    pub fn with_update_strategy(mut self, update_strategy: UpdateStrategy) -> Self {
        self.update_strategy = update_strategy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn update_strategy(&self) -> UpdateStrategy {
        self.update_strategy
    }

    pub fn enumerate_cubes(&self) -> Result<CubeListing, CubeStoreError> {
        let doc = self.store.load()?;
        let cubes = CubeIndex::build(&doc).list_all();
        Ok(CubeListing {
            message: format!("Found {} cube(s) in {}", cubes.len(), self.store.location()),
            count: cubes.len(),
            cubes,
            file_path: self.store.location(),
        })
    }

    pub fn get_cube(&self, cube_name: &str) -> Result<CubeDocument, CubeStoreError> {
        let doc = self.store.load()?;
        let node = CubeIndex::build(&doc).find(cube_name)?;
        let xml = doc
            .subtree_to_string(node)
            .map_err(|e| CubeStoreError::Parse(e.to_string()))?;
        Ok(CubeDocument {
            message: format!("Retrieved cube '{}'", cube_name),
            cube_name: cube_name.to_string(),
            xml,
            file_path: self.store.location(),
        })
    }

    pub fn create_cube(&self, request: &CubeRequest) -> Result<CreatedCube, CubeStoreError> {
        let mut doc = self.store.load()?;
        let index = CubeIndex::build(&doc);
        if index.exists(&request.cube_name) {
            return Err(CubeStoreError::Conflict(request.cube_name.clone()));
        }

        let cube = builder::build_cube(request)?;
        let node = doc.allocate(&cube);
        // Appended after every existing child of the schema, never in between.
        doc.append_child(index.schema(), node);
        self.commit(&mut doc)?;

        info!(
            "Created cube '{}' on table '{}'",
            request.cube_name, request.table_name
        );
        Ok(self.created(request))
    }

    pub fn delete_cube(&self, cube_name: &str) -> Result<DeletedCube, CubeStoreError> {
        let mut doc = self.store.load()?;
        let node = CubeIndex::build(&doc).find(cube_name)?;
        doc.detach(node);
        self.commit(&mut doc)?;

        info!("Deleted cube '{}'", cube_name);
        Ok(DeletedCube {
            message: format!("Cube '{}' deleted successfully", cube_name),
            cube_name: cube_name.to_string(),
            file_path: self.store.location(),
        })
    }

    /// Replaces the cube named `cube_name` with the one described by
    /// `request`, which may carry a different name.
    pub fn update_cube(
        &self,
        cube_name: &str,
        request: &CubeRequest,
    ) -> Result<CreatedCube, CubeStoreError> {
        debug!(
            "Updating cube '{}' as '{}' ({})",
            cube_name, request.cube_name, self.update_strategy
        );
        match self.update_strategy {
            UpdateStrategy::TwoPhase => {
                self.delete_cube(cube_name)?;
                self.create_cube(request)
            }
            UpdateStrategy::InPlace => self.replace_cube(cube_name, request),
        }
    }

    fn replace_cube(
        &self,
        cube_name: &str,
        request: &CubeRequest,
    ) -> Result<CreatedCube, CubeStoreError> {
        let mut doc = self.store.load()?;
        let index = CubeIndex::build(&doc);
        let old = index.find(cube_name)?;
        if request.cube_name != cube_name && index.exists(&request.cube_name) {
            return Err(CubeStoreError::Conflict(request.cube_name.clone()));
        }

        let cube = builder::build_cube(request)?;
        let node = doc.allocate(&cube);
        let schema = index.schema();
        let position = doc
            .detach(old)
            .unwrap_or_else(|| doc.children(schema).len());
        doc.insert_child(schema, position, node);
        self.commit(&mut doc)?;

        info!("Replaced cube '{}' with '{}'", cube_name, request.cube_name);
        Ok(self.created(request))
    }

    /// The persisted document, byte for byte.
    pub fn document_xml(&self) -> Result<String, CubeStoreError> {
        self.store.read()
    }

    /// Overwrites the whole document with an uploaded one. The upload must be
    /// well-formed XML and is stored without reformatting.
    pub fn replace_document(
        &self,
        filename: &str,
        content: &[u8],
    ) -> Result<ReplacedDocument, CubeStoreError> {
        if !filename.to_ascii_lowercase().ends_with(".xml") {
            return Err(CubeStoreError::InvalidUpload(
                "File must have .xml extension".to_string(),
            ));
        }
        let text = std::str::from_utf8(content)
            .map_err(|e| CubeStoreError::InvalidUpload(format!("File is not valid UTF-8: {}", e)))?;
        Document::parse(text).map_err(|e| {
            CubeStoreError::InvalidUpload(format!("File is not well-formed XML: {}", e))
        })?;

        self.store.write(text)?;
        info!("Replaced schema document with upload '{}'", filename);
        Ok(ReplacedDocument {
            message: "XML file replaced successfully".to_string(),
            filename: filename.to_string(),
        })
    }

    fn commit(&self, doc: &mut Document) -> Result<(), CubeStoreError> {
        format::indent(doc);
        self.store.persist(doc)
    }

    fn created(&self, request: &CubeRequest) -> CreatedCube {
        CreatedCube {
            message: format!("Cube '{}' created successfully", request.cube_name),
            cube_name: request.cube_name.clone(),
            table_name: request.table_name.clone(),
            dimensions_count: request.dimensions.len(),
            measures_count: request.measures.len(),
            file_path: self.store.location(),
        }
    }
}
