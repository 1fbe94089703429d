//! Configuration loading and root folder resolution
//!
//! Resolution priority (highest first):
//! 1. Command-line argument
//! 2. Environment variable (`PSB_ROOT_FOLDER`, then `PSB_ROOT`)
//! 3. TOML config file (`<config_dir>/psb/<module>.toml`)
//! 4. OS-dependent compiled default
//!
//! Missing TOML files never terminate startup: a warning is logged and the
//! compiled defaults are used instead.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Primary root folder environment variable
pub const ROOT_FOLDER_ENV: &str = "PSB_ROOT_FOLDER";

/// Legacy/short alias for [`ROOT_FOLDER_ENV`]
pub const ROOT_ENV: &str = "PSB_ROOT";

/// Snapshot file name used when the TOML file does not name one
pub const DEFAULT_SNAPSHOT_FILE: &str = "data.json";

/// Artifact ledger file name (remembered published message ids)
pub const ARTIFACT_LEDGER_FILE: &str = "artifacts.json";

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            // ~/.local/share/psb (or /var/lib/psb when no home is available)
            dirs::data_local_dir()
                .map(|d| d.join("psb"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/psb"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("psb"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/psb"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("psb"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\psb"))
        } else {
            PathBuf::from("./psb_data")
        };

        Self {
            root_folder,
            log_level: "info".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolves the root folder for a module following the priority order above
pub struct RootFolderResolver {
    module_name: String,
    cli_override: Option<PathBuf>,
    config_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_override: None,
            config_value: None,
        }
    }

    /// Command-line value, takes precedence over everything else
    pub fn with_cli_override(mut self, path: Option<PathBuf>) -> Self {
        self.cli_override = path;
        self
    }

    /// `root_folder` from an already loaded TOML file; used instead of
    /// reading the default config location
    pub fn with_config_value(mut self, path: Option<PathBuf>) -> Self {
        self.config_value = path;
        self
    }

    /// Default TOML location for this module
    pub fn config_file_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("psb").join(format!("{}.toml", self.module_name)))
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_override {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            return PathBuf::from(path);
        }
        if let Ok(path) = std::env::var(ROOT_ENV) {
            return PathBuf::from(path);
        }

        if let Some(path) = &self.config_value {
            return path.clone();
        }

        if let Some(config_path) = self.config_file_path() {
            if let Ok(content) = std::fs::read_to_string(&config_path) {
                if let Ok(value) = toml::from_str::<toml::Value>(&content) {
                    if let Some(root) = value.get("root_folder").and_then(|v| v.as_str()) {
                        return PathBuf::from(root);
                    }
                }
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and names the files that live inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the directory (and parents). Safe to call repeatedly.
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    /// Snapshot path; relative names are resolved against the root folder
    pub fn snapshot_path(&self, file: &str) -> PathBuf {
        let candidate = PathBuf::from(file);
        if candidate.is_absolute() {
            candidate
        } else {
            self.root_folder.join(candidate)
        }
    }

    pub fn artifact_ledger_path(&self) -> PathBuf {
        self.root_folder.join(ARTIFACT_LEDGER_FILE)
    }
}

/// Load a TOML bootstrap file into `T`.
///
/// A missing file yields `T::default()` with a warning. A file that exists
/// but does not parse is a configuration error.
pub fn load_toml_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using compiled defaults");
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)?;
    let parsed = toml::from_str::<T>(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct Sample {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        logging: LoggingConfig,
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let sample: Sample = load_toml_or_default(&dir.path().join("absent.toml")).unwrap();
        assert!(sample.name.is_none());
        assert_eq!(sample.logging.level, "info");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "name = [unterminated").unwrap();

        let err = load_toml_or_default::<Sample>(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_snapshot_path_relative_and_absolute() {
        let init = RootFolderInitializer::new(PathBuf::from("/tmp/psb-root"));
        assert_eq!(init.snapshot_path("data.json"), PathBuf::from("/tmp/psb-root/data.json"));
        assert_eq!(init.snapshot_path("/srv/data.json"), PathBuf::from("/srv/data.json"));
    }

    #[test]
    fn test_cli_override_wins() {
        let resolver = RootFolderResolver::new("psb-bot")
            .with_cli_override(Some(PathBuf::from("/tmp/from-cli")));
        assert_eq!(resolver.resolve(), PathBuf::from("/tmp/from-cli"));
    }
}
