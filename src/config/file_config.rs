//! Configuration file support for trainercentral-mcp.
//!
//! Values in the file only fill settings the environment leaves unset.
//!
//! # Configuration File Format
//!
//! ```toml
//! [zoho]
//! client_id = "1000.XXXX"
//! client_secret = "secret"
//! refresh_token = "1000.refresh"
//! accounts_url = "https://accounts.zoho.in"
//! api_domain = "https://www.zohoapis.in"
//!
//! [trainercentral]
//! domain = "https://myacademy.trainercentral.in"
//! org_id = "60012345678"
//! timeout_secs = 30
//!
//! [server]
//! resource_base_url = "https://mcp.example.com"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{
    ACCOUNTS_URL_VARS, API_DOMAIN_VARS, CLIENT_ID_VARS, CLIENT_SECRET_VARS, DOMAIN_VARS,
    ORG_ID_VARS, REFRESH_TOKEN_VARS, RESOURCE_BASE_URL_VARS, TIMEOUT_VARS,
};

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "trainercentral-mcp.toml";

/// Configuration file structure
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub zoho: ZohoSection,

    #[serde(default)]
    pub trainercentral: TrainerCentralSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Zoho OAuth client section
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ZohoSection {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub accounts_url: Option<String>,

    #[serde(default)]
    pub api_domain: Option<String>,
}

/// TrainerCentral portal section
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TrainerCentralSection {
    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub org_id: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Server section
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub resource_base_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Err(ConfigFileError::Io(format!("{} not found", path.display())));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .build()
            .map_err(|e| ConfigFileError::Parse(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }

    /// Flatten the file into the canonical environment variable names
    pub fn to_env_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        let mut put = |keys: &[&str], value: &Option<String>| {
            if let Some(v) = value {
                map.insert(keys[0].to_string(), v.clone());
            }
        };

        put(CLIENT_ID_VARS, &self.zoho.client_id);
        put(CLIENT_SECRET_VARS, &self.zoho.client_secret);
        put(REFRESH_TOKEN_VARS, &self.zoho.refresh_token);
        put(ACCOUNTS_URL_VARS, &self.zoho.accounts_url);
        put(API_DOMAIN_VARS, &self.zoho.api_domain);
        put(DOMAIN_VARS, &self.trainercentral.domain);
        put(ORG_ID_VARS, &self.trainercentral.org_id);
        put(RESOURCE_BASE_URL_VARS, &self.server.resource_base_url);
        put(
            TIMEOUT_VARS,
            &self.trainercentral.timeout_secs.map(|t| t.to_string()),
        );

        map
    }
}

/// Look for a config file in the working directory, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("trainercentral-mcp").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
