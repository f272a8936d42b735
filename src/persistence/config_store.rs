use super::BridgeConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

const APP_DIR: &str = "pad2osc";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No config directory available on this platform")]
    NoConfigDir,
}

/// Source of configuration snapshots, polled once per tick
pub trait ConfigSource {
    /// True if the persisted settings changed since the last [`load`](ConfigSource::load)
    fn has_changed(&mut self) -> bool;

    /// Reads and sanitizes the current settings
    fn load(&mut self) -> Result<BridgeConfig, ConfigError>;
}

/// TOML file store with modification-time change detection
///
/// `has_changed` only stats the file, so it is cheap enough to call every tick.
/// The mtime seen at the start of a load is recorded whether or not the load
/// succeeds; a broken file is reported once, not on every tick.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    loaded_mtime: Option<SystemTime>,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded_mtime: None,
        }
    }

    /// `<platform config dir>/pad2osc/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push(APP_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    fn current_mtime(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }
}

impl ConfigSource for FileConfigStore {
    fn has_changed(&mut self) -> bool {
        match self.current_mtime() {
            Some(mtime) => self.loaded_mtime != Some(mtime),
            None => false,
        }
    }

    fn load(&mut self) -> Result<BridgeConfig, ConfigError> {
        self.loaded_mtime = self.current_mtime();
        debug!("Loading config from {}", self.path.display());

        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        BridgeConfig::from_toml_str(&content)
    }
}

/// Writes the default settings to `path`.
///
/// With `overwrite == false` an existing file is left alone. Returns whether a
/// file was written.
pub fn ensure_default_config(path: &Path, overwrite: bool) -> Result<bool, ConfigError> {
    if path.exists() && !overwrite {
        debug!("Config file {} already exists", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let content = BridgeConfig::default().to_toml_string()?;
    fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if overwrite {
        warn!("Config file {} reset to defaults", path.display());
    } else {
        info!("Created default config at {}", path.display());
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn bump_mtime(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn missing_file_is_unchanged_and_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileConfigStore::new(dir.path().join("config.toml"));
        assert!(!store.has_changed());
        assert!(matches!(store.load(), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn change_detection_follows_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[network]\nport = 9100\n").unwrap();
        bump_mtime(&path, 1_000_000);

        let mut store = FileConfigStore::new(&path);
        assert!(store.has_changed());
        assert_eq!(store.load().unwrap().network.port, 9100);
        assert!(!store.has_changed());

        fs::write(&path, "[network]\nport = 9200\n").unwrap();
        bump_mtime(&path, 2_000_000);
        assert!(store.has_changed());
        assert_eq!(store.load().unwrap().network.port, 9200);
        assert!(!store.has_changed());
    }

    #[test]
    fn failed_load_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not = [valid").unwrap();

        let mut store = FileConfigStore::new(&path);
        assert!(store.has_changed());
        assert!(matches!(store.load(), Err(ConfigError::Parse(_))));
        assert!(!store.has_changed());
    }

    #[test]
    fn ensure_default_config_respects_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(ensure_default_config(&path, false).unwrap());
        fs::write(&path, "[network]\nport = 9300\n").unwrap();
        assert!(!ensure_default_config(&path, false).unwrap());
        assert!(fs::read_to_string(&path).unwrap().contains("9300"));

        assert!(ensure_default_config(&path, true).unwrap());
        let mut store = FileConfigStore::new(&path);
        assert_eq!(store.load().unwrap(), BridgeConfig::default());
    }
}
