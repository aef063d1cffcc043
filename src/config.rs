use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NotekeepError, Result};

const NOTEKEEP_DIR: &str = ".notekeep";
const CONFIG_FILE: &str = "config.yaml";
const SESSION_FILE: &str = "session.json";

pub const ENV_SERVICE_URL: &str = "NOTEKEEP_SERVICE_URL";
pub const ENV_API_KEY: &str = "NOTEKEEP_API_KEY";

fn default_notes_table() -> String {
    "notes".to_string()
}

fn default_registration_delay_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Client configuration stored in `.notekeep/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the hosted backend, e.g. `https://abc.example.co`
    pub service_url: String,
    /// Public API key sent with every request
    pub api_key: String,
    /// Table holding the notes
    #[serde(default = "default_notes_table")]
    pub notes_table: String,
    /// How long the registration success message stays up before the
    /// workspace opens
    #[serde(default = "default_registration_delay_ms")]
    pub registration_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(service_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            api_key: api_key.into(),
            notes_table: default_notes_table(),
            registration_delay_ms: default_registration_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn registration_delay(&self) -> Duration {
        Duration::from_millis(self.registration_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read a config file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut config: ClientConfig = serde_yaml::from_str(&text)?;
        config.apply_overrides(env::var(ENV_SERVICE_URL).ok(), env::var(ENV_API_KEY).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    fn apply_overrides(&mut self, service_url: Option<String>, api_key: Option<String>) {
        if let Some(url) = service_url.filter(|s| !s.trim().is_empty()) {
            self.service_url = url;
        }
        if let Some(key) = api_key.filter(|s| !s.trim().is_empty()) {
            self.api_key = key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.service_url.trim();
        if url.is_empty() {
            return Err(NotekeepError::Config("service_url is not set".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(NotekeepError::Config(format!(
                "service_url must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(NotekeepError::Config("api_key is not set".to_string()));
        }
        if self.notes_table.trim().is_empty() {
            return Err(NotekeepError::Config("notes_table is not set".to_string()));
        }
        Ok(())
    }
}

/// A directory holding `.notekeep/`.
#[derive(Debug, Clone)]
pub struct Project {
    dir: PathBuf,
    config: PathBuf,
}

impl Project {
    /// Create `.notekeep/` under `root` and write the config.
    pub fn init(root: &Path, config: &ClientConfig) -> Result<Self> {
        let dir = root.join(NOTEKEEP_DIR);
        if dir.exists() {
            return Err(NotekeepError::AlreadyInitialized);
        }
        config.validate()?;

        fs::create_dir_all(&dir)?;
        let project = Self::in_dir(dir);
        config.save(&project.config_path())?;
        Ok(project)
    }

    /// Open an existing project rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(NOTEKEEP_DIR);
        if !dir.join(CONFIG_FILE).exists() {
            return Err(NotekeepError::NotInitialized);
        }
        Ok(Self::in_dir(dir))
    }

    fn in_dir(dir: PathBuf) -> Self {
        let config = dir.join(CONFIG_FILE);
        Self { dir, config }
    }

    /// Open the project owning an explicit config file. The file may have
    /// any name; the session file is kept next to it.
    pub fn from_config_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NotekeepError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            dir,
            config: path.to_path_buf(),
        })
    }

    /// Walk up from `start` to the first directory containing `.notekeep/`.
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = start;
        loop {
            if current.join(NOTEKEEP_DIR).join(CONFIG_FILE).exists() {
                return Self::open(current);
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return Err(NotekeepError::NotInitialized),
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone()
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    pub fn load_config(&self) -> Result<ClientConfig> {
        ClientConfig::load(&self.config_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_applied_when_missing() {
        let yaml = "service_url: https://abc.example.co\napi_key: anon\n";
        let config: ClientConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.notes_table, "notes");
        assert_eq!(config.registration_delay(), Duration::from_secs(2));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_replace_non_empty_values() {
        let mut config = ClientConfig::new("https://a.example.co", "one");
        config.apply_overrides(Some("https://b.example.co".to_string()), Some(" ".to_string()));
        assert_eq!(config.service_url, "https://b.example.co");
        assert_eq!(config.api_key, "one");
    }

    #[test]
    fn test_validate_rejects_bad_url_and_missing_key() {
        assert!(ClientConfig::new("abc.example.co", "k").validate().is_err());
        assert!(ClientConfig::new("https://abc.example.co", "").validate().is_err());
        assert!(ClientConfig::new("http://127.0.0.1:5555", "k").validate().is_ok());
    }

    #[test]
    fn test_init_then_open_and_discover() {
        let tmp = TempDir::new().unwrap();
        let config = ClientConfig::new("https://abc.example.co", "anon");
        let project = Project::init(tmp.path(), &config).unwrap();
        assert!(project.config_path().exists());

        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let found = Project::discover(&nested).unwrap();
        assert_eq!(found.dir(), project.dir());
        assert_eq!(found.load_config().unwrap(), config);
    }

    #[test]
    fn test_init_twice_fails() {
        let tmp = TempDir::new().unwrap();
        let config = ClientConfig::new("https://abc.example.co", "anon");
        Project::init(tmp.path(), &config).unwrap();
        assert!(matches!(
            Project::init(tmp.path(), &config),
            Err(NotekeepError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_explicit_config_file_keeps_its_name() {
        let tmp = TempDir::new().unwrap();
        let custom = tmp.path().join("work.yaml");
        let config = ClientConfig::new("https://abc.example.co", "anon");
        config.save(&custom).unwrap();

        let project = Project::from_config_path(&custom).unwrap();
        assert_eq!(project.config_path(), custom);
        assert_eq!(project.session_path(), tmp.path().join("session.json"));
        assert_eq!(project.load_config().unwrap(), config);
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            Project::from_config_path(&tmp.path().join("nope.yaml")),
            Err(NotekeepError::Config(_))
        ));
    }

    #[test]
    fn test_open_without_init_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            Project::open(tmp.path()),
            Err(NotekeepError::NotInitialized)
        ));
    }
}
