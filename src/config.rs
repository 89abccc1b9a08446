use crate::cube_manager::UpdateStrategy;
use envconfig::Envconfig;
use log::{debug, error, warn};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_XML_FILE_PATH: &str = "./Monza.xml";

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "XML_FILE_PATH")]
    pub xml_file_path: Option<String>,

    #[envconfig(from = "CONFIG_FILE", default = "config.json")]
    pub config_file: String,

    #[envconfig(from = "CUBE_UPDATE_STRATEGY", default = "two-phase")]
    pub update_strategy: UpdateStrategy,
}

impl Config {
    pub fn new() -> Result<Self, envconfig::Error> {
        let config = Self::init_from_env()?;
        debug!(
            "Config loaded: xml_file_path={:?}, config_file={}, update_strategy={}",
            config.xml_file_path, config.config_file, config.update_strategy
        );
        Ok(config)
    }

    /// Location of the schema document: the `XML_FILE_PATH` variable, else
    /// the `xml_file_path` key of the JSON config file, else the default.
    pub fn resolve_xml_path(&self) -> PathBuf {
        if let Some(path) = self.xml_file_path.as_deref().filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        let path = FileConfig::load(Path::new(&self.config_file))
            .xml_file_path
            .unwrap_or_else(|| DEFAULT_XML_FILE_PATH.to_string());
        PathBuf::from(path)
    }
}

/// Optional JSON config file shared with the rest of the deployment.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub xml_file_path: Option<String>,
}

impl FileConfig {
    /// Never fails: a missing or malformed file yields the defaults.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "{} not found, using default configuration",
                    path.display()
                );
                return Self::default();
            }
            Err(e) => {
                error!("Error reading {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<FileConfig>(&content) {
            Ok(config) => {
                debug!("FileConfig loaded from {}: {:?}", path.display(), config);
                config
            }
            Err(e) => {
                error!("Error parsing {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::tempdir;

    fn config(xml_file_path: Option<&str>, config_file: &Path) -> Config {
        Config {
            xml_file_path: xml_file_path.map(str::to_string),
            config_file: config_file.display().to_string(),
            update_strategy: UpdateStrategy::TwoPhase,
        }
    }

    #[test]
    fn test_env_path_wins() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("config.json");
        fs::write(&file, r#"{"xml_file_path": "/srv/from_file.xml"}"#).unwrap();

        let config = config(Some("/srv/from_env.xml"), &file);
        assert_eq!(config.resolve_xml_path(), PathBuf::from("/srv/from_env.xml"));
    }

    #[rstest]
    #[case::from_file(Some(r#"{"xml_file_path": "/srv/Monza.xml", "database": {"port": 8123}}"#), "/srv/Monza.xml")]
    #[case::key_missing(Some(r#"{"database": {}}"#), DEFAULT_XML_FILE_PATH)]
    #[case::malformed(Some("{not json"), DEFAULT_XML_FILE_PATH)]
    #[case::file_missing(None, DEFAULT_XML_FILE_PATH)]
    fn test_path_from_config_file(#[case] content: Option<&str>, #[case] expected: &str) {
        let dir = tempdir().unwrap();
        let file = dir.path().join("config.json");
        if let Some(content) = content {
            fs::write(&file, content).unwrap();
        }

        let config = config(None, &file);
        assert_eq!(config.resolve_xml_path(), PathBuf::from(expected));
    }
}
