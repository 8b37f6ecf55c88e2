//! Configuration loading and config file resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `HTAN_RELEASE_CONFIG` environment variable
//! 3. User config file (`~/.config/htan-release/config.toml`)
//! 4. System config file (`/etc/htan-release/config.toml`)
//! 5. Compiled defaults (fallback)
//!
//! A missing config file never terminates the run; compiled defaults are used
//! and a warning is logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "HTAN_RELEASE_CONFIG";

const APP_DIR: &str = "htan-release";

/// Top-level TOML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub inputs: InputsConfig,
    pub storage: StorageConfig,
    pub warehouse: WarehouseConfig,
    pub tickets: TicketsConfig,
    /// Storage projects never ingested (test centers)
    pub excluded_projects: Vec<String>,
    /// Substring tokens selecting file-producing components
    pub file_components: Vec<String>,
    /// Components holding participant-level clinical records
    pub clinical_components: Vec<String>,
    /// Components holding biospecimen records
    pub biospecimen_components: Vec<String>,
    /// Center name -> identifiers
    pub centers: BTreeMap<String, CenterConfig>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            inputs: InputsConfig::default(),
            storage: StorageConfig::default(),
            warehouse: WarehouseConfig::default(),
            tickets: TicketsConfig::default(),
            excluded_projects: Vec::new(),
            file_components: ["Level", "Auxiliary", "Accessory", "Other"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            clinical_components: vec!["Demographics".to_string()],
            biospecimen_components: vec!["Biospecimen".to_string()],
            centers: BTreeMap::new(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Reject configurations that cannot drive a run
    pub fn validate(&self) -> Result<()> {
        if self.file_components.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Config(
                "file_components must not contain empty tokens".to_string(),
            ));
        }
        for (name, center) in &self.centers {
            if center.center_id.trim().is_empty() || center.storage_root_id.trim().is_empty() {
                return Err(Error::Config(format!(
                    "center '{}' needs both center_id and storage_root_id",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Center whose storage root (project) matches `project_id`
    pub fn center_for_project(&self, project_id: &str) -> Option<(&str, &CenterConfig)> {
        self.centers
            .iter()
            .find(|(_, c)| c.storage_root_id == project_id)
            .map(|(name, c)| (name.as_str(), c))
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Local snapshot of the collaborator exports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    pub dir: PathBuf,
    pub manifest_index: String,
    pub fileview: String,
    pub provenance: String,
    pub children: String,
    pub exclusions: String,
    pub data_model: String,
    pub descriptions: String,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./inputs"),
            manifest_index: "manifest_index.csv".to_string(),
            fileview: "fileview.csv".to_string(),
            provenance: "provenance.csv".to_string(),
            children: "children.csv".to_string(),
            exclusions: "exclusions.csv".to_string(),
            data_model: "data_model.csv".to_string(),
            descriptions: "descriptions.csv".to_string(),
        }
    }
}

impl InputsConfig {
    /// Absolute-or-relative path of a named input file
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

/// Storage backend REST access (optional)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the storage REST API; local children listing is used when unset
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the bearer token
    pub auth_token_env: Option<String>,
}

/// Warehouse location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub path: PathBuf,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./htan_release.db"),
        }
    }
}

/// Ticket outbox location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketsConfig {
    pub outbox: PathBuf,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            outbox: PathBuf::from("./tickets.jsonl"),
        }
    }
}

/// Identifiers of one data-producing center
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterConfig {
    /// Short id used as HTAN identifier prefix (e.g. "hta1")
    pub center_id: String,
    /// Storage project / root container id
    pub storage_root_id: String,
}

/// Config file resolver following the documented priority order
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// First existing config file in priority order, if any
    pub fn resolve_path(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3/4: user then system config file
        let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
        if let Some(path) = user_config {
            if path.exists() {
                return Some(path);
            }
        }
        let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load the resolved config, or compiled defaults when no file is found
    ///
    /// An explicitly requested file (CLI or ENV) that cannot be read or parsed
    /// is an error; only absence of any config file degrades to defaults.
    pub fn load(&self) -> Result<TomlConfig> {
        match self.resolve_path() {
            Some(path) => {
                let config = TomlConfig::load(&path)?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            None => {
                warn!("No config file found, using compiled defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_file_levels() {
        let config = TomlConfig::default();
        assert!(config.file_components.contains(&"Level".to_string()));
        assert_eq!(config.logging.level, "info");
        assert!(config.centers.is_empty());
    }

    #[test]
    fn test_parse_centers_and_partial_sections() {
        let config = TomlConfig::from_toml_str(
            r#"
            excluded_projects = ["syn21989705"]

            [warehouse]
            path = "/tmp/release.db"

            [centers."HTAN HTAPP"]
            center_id = "hta1"
            storage_root_id = "syn20000001"
            "#,
        )
        .unwrap();

        assert_eq!(config.excluded_projects, vec!["syn21989705"]);
        assert_eq!(config.warehouse.path, PathBuf::from("/tmp/release.db"));
        // untouched sections keep defaults
        assert_eq!(config.inputs.fileview, "fileview.csv");
        let (name, center) = config.center_for_project("syn20000001").unwrap();
        assert_eq!(name, "HTAN HTAPP");
        assert_eq!(center.center_id, "hta1");
        assert!(config.center_for_project("syn0").is_none());
    }

    #[test]
    fn test_incomplete_center_rejected() {
        let result = TomlConfig::from_toml_str(
            r#"
            [centers.X]
            center_id = ""
            storage_root_id = "syn1"
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_path_wins() {
        let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/explicit.toml")));
        assert_eq!(
            resolver.resolve_path(),
            Some(PathBuf::from("/tmp/explicit.toml"))
        );
    }
}
