pub mod config;
pub mod cube_manager;
pub mod cube_model;
pub mod document;
pub mod schema_store;


pub use cube_manager::{CubeManager, UpdateStrategy};
pub use cube_model::{CubeRequest, CubeStoreError};
pub use schema_store::{LocalSchemaStore, MemorySchemaStore, SchemaStore};
