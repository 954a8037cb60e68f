//! Configuration management.
//!
//! Settings come from the process environment first, then a `.env` file
//! (loaded into the environment by `dotenvy`), then an optional TOML file.
//! Within each layer the first non-empty variable of an alias row wins.

mod file_config;

pub use file_config::{find_config_file, ConfigFile, ConfigFileError};

use std::collections::HashMap;
use std::path::Path;

use crate::error::{TcError, TcResult};

/// Default Zoho accounts host (India data center)
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.in";

/// Default public URL advertised in the OAuth protected-resource metadata
pub const DEFAULT_RESOURCE_BASE_URL: &str = "http://localhost:8000";

/// Default HTTP timeout for TrainerCentral and Zoho calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub(crate) const CLIENT_ID_VARS: &[&str] = &["ZOHO_CLIENT_ID", "CLIENT_ID"];
pub(crate) const CLIENT_SECRET_VARS: &[&str] = &["ZOHO_CLIENT_SECRET", "CLIENT_SECRET"];
pub(crate) const REFRESH_TOKEN_VARS: &[&str] = &["ZOHO_REFRESH_TOKEN", "REFRESH_TOKEN"];
pub(crate) const ACCESS_TOKEN_VARS: &[&str] = &["ZOHO_ACCESS_TOKEN", "ACCESS_TOKEN"];
pub(crate) const EXPIRES_AT_VARS: &[&str] = &["ACCESS_TOKEN_EXPIRES_AT"];
pub(crate) const ACCOUNTS_URL_VARS: &[&str] = &["ZOHO_ACCOUNTS_URL", "ACCOUNTS_URL"];
pub(crate) const API_DOMAIN_VARS: &[&str] = &["ZOHO_API_DOMAIN", "API_DOMAIN"];
pub(crate) const DOMAIN_VARS: &[&str] = &["TRAINERCENTRAL_DOMAIN", "TC_DOMAIN", "DOMAIN"];
pub(crate) const ORG_ID_VARS: &[&str] = &["TRAINERCENTRAL_ORG_ID", "TC_ORG_ID", "ORG_ID"];
pub(crate) const RESOURCE_BASE_URL_VARS: &[&str] = &["RESOURCE_BASE_URL"];
pub(crate) const TIMEOUT_VARS: &[&str] = &["TRAINERCENTRAL_TIMEOUT_SECS"];

/// Resolved application settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,

    /// Pre-issued access token, used until `access_token_expires_at`
    pub access_token: Option<String>,

    /// Absolute expiry of `access_token` in epoch seconds (0 = already expired)
    pub access_token_expires_at: i64,

    /// Zoho accounts host, without trailing slash
    pub accounts_url: String,

    /// Region API domain seeded from the environment; a token response overrides it
    pub api_domain: Option<String>,

    /// Explicit TrainerCentral domain override
    pub domain: Option<String>,

    pub org_id: Option<String>,

    pub resource_base_url: String,

    pub timeout_secs: u64,
}

/// Where the effective TrainerCentral domain came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainSource {
    Explicit,
    TokenResponse,
    Environment,
    Default,
}

impl Settings {
    /// Load settings from `.env`, the process environment and an optional config file.
    ///
    /// Fails with [`TcError::Configuration`] before any network activity when
    /// the identity fields are missing.
    pub fn load(config_path: Option<&Path>) -> TcResult<Self> {
        let settings = Self::load_unchecked(config_path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Same layering as [`Settings::load`] without the identity check, for the
    /// OAuth bootstrap commands that run before a refresh token exists.
    pub fn load_unchecked(config_path: Option<&Path>) -> TcResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let file = match config_path {
            Some(path) => Some(ConfigFile::load(path).map_err(|e| {
                TcError::Configuration(format!("{}: {}", path.display(), e))
            })?),
            None => match find_config_file() {
                Some(path) => {
                    tracing::info!("Using config file: {}", path.display());
                    Some(ConfigFile::load(&path).map_err(|e| {
                        TcError::Configuration(format!("{}: {}", path.display(), e))
                    })?)
                }
                None => None,
            },
        };

        let file_vars = file.map(|f| f.to_env_map()).unwrap_or_default();
        Self::from_layers(|key| std::env::var(key).ok(), |key| {
            file_vars.get(key).cloned()
        })
    }

    /// Build settings from a single key lookup (process environment in production,
    /// a map in tests). Does not validate identity.
    pub fn from_lookup<F>(lookup: F) -> TcResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_layers(lookup, |_| None)
    }

    /// Build settings from a map of variables and validate them
    pub fn from_vars(vars: &HashMap<String, String>) -> TcResult<Self> {
        let settings = Self::from_lookup(|key| vars.get(key).cloned())?;
        settings.validate()?;
        Ok(settings)
    }

    fn from_layers<E, F>(env: E, file: F) -> TcResult<Self>
    where
        E: Fn(&str) -> Option<String>,
        F: Fn(&str) -> Option<String>,
    {
        let pick = |keys: &[&str]| -> Option<String> {
            first_non_empty(keys, &env).or_else(|| first_non_empty(keys, &file))
        };

        let access_token_expires_at = match pick(EXPIRES_AT_VARS) {
            Some(raw) => raw.parse::<f64>().map(|v| v as i64).map_err(|_| {
                TcError::Configuration(format!(
                    "ACCESS_TOKEN_EXPIRES_AT must be epoch seconds, got '{}'",
                    raw
                ))
            })?,
            None => 0,
        };

        let timeout_secs = match pick(TIMEOUT_VARS) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                TcError::Configuration(format!(
                    "TRAINERCENTRAL_TIMEOUT_SECS must be an integer, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            client_id: pick(CLIENT_ID_VARS),
            client_secret: pick(CLIENT_SECRET_VARS),
            refresh_token: pick(REFRESH_TOKEN_VARS),
            access_token: pick(ACCESS_TOKEN_VARS),
            access_token_expires_at,
            accounts_url: trim_url(
                &pick(ACCOUNTS_URL_VARS).unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
            ),
            api_domain: pick(API_DOMAIN_VARS).map(|s| trim_url(&s)),
            domain: pick(DOMAIN_VARS).map(|s| trim_url(&s)),
            org_id: pick(ORG_ID_VARS),
            resource_base_url: trim_url(
                &pick(RESOURCE_BASE_URL_VARS)
                    .unwrap_or_else(|| DEFAULT_RESOURCE_BASE_URL.to_string()),
            ),
            timeout_secs,
        })
    }

    /// Whether a refresh-token exchange is possible with these settings
    pub fn can_refresh(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.refresh_token.is_some()
    }

    /// Check that enough identity is present to ever obtain an access token
    pub fn validate(&self) -> TcResult<()> {
        if self.can_refresh() || self.access_token.is_some() {
            if !self.can_refresh() {
                tracing::warn!(
                    "No refresh credentials configured; the supplied access token cannot be renewed"
                );
            }
            return Ok(());
        }

        let mut missing = Vec::new();
        if self.client_id.is_none() {
            missing.push(CLIENT_ID_VARS[0]);
        }
        if self.client_secret.is_none() {
            missing.push(CLIENT_SECRET_VARS[0]);
        }
        if self.refresh_token.is_none() {
            missing.push(REFRESH_TOKEN_VARS[0]);
        }
        Err(TcError::Configuration(format!(
            "missing {} (or provide {})",
            missing.join(", "),
            ACCESS_TOKEN_VARS[0]
        )))
    }

    /// Resolve the effective TrainerCentral domain.
    ///
    /// Precedence: explicit override, then the api domain from the latest token
    /// response, then `API_DOMAIN` from the environment, then a default derived
    /// from the accounts host.
    pub fn resolve_domain(&self, token_api_domain: Option<&str>) -> (String, DomainSource) {
        if let Some(domain) = &self.domain {
            return (domain.clone(), DomainSource::Explicit);
        }
        if let Some(api) = token_api_domain.filter(|s| !s.trim().is_empty()) {
            return (trainercentral_base(api), DomainSource::TokenResponse);
        }
        if let Some(api) = &self.api_domain {
            return (trainercentral_base(api), DomainSource::Environment);
        }
        (
            trainercentral_base(&default_api_domain(&self.accounts_url)),
            DomainSource::Default,
        )
    }
}

fn first_non_empty<F>(keys: &[&str], lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(key))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// `{api_domain}/trainercentral`
pub fn trainercentral_base(api_domain: &str) -> String {
    format!("{}/trainercentral", trim_url(api_domain))
}

/// Map a Zoho accounts host to the region API host,
/// e.g. `https://accounts.zoho.eu` to `https://www.zohoapis.eu`.
pub fn default_api_domain(accounts_url: &str) -> String {
    let trimmed = trim_url(accounts_url);
    match trimmed.split_once("accounts.zoho.") {
        Some((scheme, region)) => format!("{}www.zohoapis.{}", scheme, region),
        None => trimmed,
    }
}
