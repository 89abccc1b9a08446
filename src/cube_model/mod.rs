pub mod builder;
pub mod locator;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use builder::build_cube;
pub use locator::CubeIndex;

/// Declarative description of a cube, as accepted by create and update.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CubeRequest {
    pub cube_name: String,
    pub table_name: String,
    pub dimensions: Vec<Dimension>,
    pub measures: Vec<Measure>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub hierarchies: Vec<Hierarchy>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hierarchy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_has_all")]
    pub has_all: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_member_name: Option<String>,
    pub levels: Vec<Level>,
}

impl Hierarchy {
    pub fn new(levels: Vec<Level>) -> Self {
        Self {
            name: None,
            has_all: default_has_all(),
            all_member_name: None,
            levels,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub name: String,
    pub column: String,
    #[serde(rename = "type", default = "default_level_type")]
    pub level_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_members: Option<bool>,
}

impl Level {
    pub fn new(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            column: column.to_string(),
            level_type: default_level_type(),
            unique_members: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub name: String,
    pub column: String,
    #[serde(default = "default_aggregator")]
    pub aggregator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,
}

impl Measure {
    pub fn new(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            column: column.to_string(),
            aggregator: default_aggregator(),
            format_string: None,
        }
    }
}

fn default_has_all() -> bool {
    true
}

fn default_level_type() -> String {
    "String".to_string()
}

fn default_aggregator() -> String {
    "sum".to_string()
}

#[derive(Error, Debug)]
pub enum CubeStoreError {
    #[error("XML file not found: {0}")]
    DocumentNotFound(String),

    #[error("Error reading XML file: {0}")]
    Read(String),

    #[error("Error parsing XML file: {0}")]
    Parse(String),

    #[error("Cube '{name}' not found. Available cubes: {}", .available.join(", "))]
    CubeNotFound { name: String, available: Vec<String> },

    #[error("Invalid cube request: {0}")]
    Validation(String),

    #[error("Cube '{0}' already exists")]
    Conflict(String),

    #[error("Error writing XML file: {0}")]
    Write(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
}

impl CubeStoreError {
    /// HTTP status the error translates to at the service boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            CubeStoreError::DocumentNotFound(_) | CubeStoreError::CubeNotFound { .. } => 404,
            CubeStoreError::Validation(_)
            | CubeStoreError::Conflict(_)
            | CubeStoreError::InvalidUpload(_) => 400,
            CubeStoreError::Read(_) | CubeStoreError::Parse(_) | CubeStoreError::Write(_) => 500,
        }
    }
}
