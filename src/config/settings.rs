//! Application settings and configuration
//!
//! Settings are loaded once at process start and injected into the request
//! handlers through shared state. Sources, lowest to highest precedence:
//! an optional `local.settings.json` file (Azure Functions "Values" format),
//! a `.env` file, and process environment variables.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;

/// Default file probed when no --settings-file is given
const DEFAULT_SETTINGS_FILE: &str = "local.settings.json";

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// Cosmos DB connection and scaling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CosmosSettings {
    /// Account endpoint, e.g. https://myaccount.documents.azure.com:443/
    pub uri: String,

    /// Base64-encoded master key
    #[serde(skip_serializing)]
    pub app_key: String,

    /// Database containing the target collection
    pub database_id: String,

    /// Collection whose offer is scaled
    pub container_id: String,

    /// RU increment, kept as a string and parsed per request so a bad
    /// value yields the dedicated parse-error response instead of a
    /// startup failure
    pub ru_increment: String,

    /// Timeout for control-plane calls, in seconds
    pub request_timeout_seconds: u64,
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    // Cosmos DB settings
    pub cosmos: CosmosSettings,
}

/// Shape of local.settings.json: top-level "Values" object of
/// string-to-string pairs; other keys (IsEncrypted, ...) are ignored.
#[derive(Debug, Default, Deserialize)]
struct LocalSettings {
    #[serde(rename = "Values", default)]
    values: HashMap<String, String>,
}

impl LocalSettings {
    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }
}

impl Settings {
    /// Load settings from environment variables, with an optional
    /// local.settings.json providing fallback values
    pub fn load(settings_file: Option<&Path>) -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let file = match settings_file {
            // An explicitly requested file must exist
            Some(path) => Some(LocalSettings::from_file(path)?),
            None => {
                let default = Path::new(DEFAULT_SETTINGS_FILE);
                if default.exists() {
                    Some(LocalSettings::from_file(default)?)
                } else {
                    None
                }
            }
        };

        Self::load_with(file.unwrap_or_default(), |key| env::var(key).ok())
    }

    /// Load settings from an explicit file layer and environment lookup.
    /// Environment values override file values.
    fn load_with(file: LocalSettings, get_env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| get_env(key).or_else(|| file.values.get(key).cloned());
        let lookup_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key).with_context(|| format!("Missing required configuration key: {}", key))
        };

        let settings = Self {
            // App settings
            app_name: lookup_or("APP_NAME", "cosmos-scale"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: lookup_or("ENVIRONMENT", "development")
                .parse()
                .context("Invalid ENVIRONMENT value")?,
            log_level: lookup_or("LOG_LEVEL", "info"),

            // Server settings
            host: lookup_or("HOST", "0.0.0.0"),
            port: lookup_or("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            // Cosmos DB settings
            cosmos: CosmosSettings {
                uri: required("CosmosDB_Uri")?,
                app_key: required("CosmosDB_appKey")?,
                database_id: required("CosmosDB_DatabaseId")?,
                container_id: required("CosmosDB_ContainerId")?,
                // Missing increment surfaces as a per-request parse error,
                // matching the behavior of an unset app setting
                ru_increment: lookup_or("CosmosDB_RU", ""),
                request_timeout_seconds: lookup_or("COSMOS_REQUEST_TIMEOUT_SECONDS", "30")
                    .parse()
                    .context("Invalid COSMOS_REQUEST_TIMEOUT_SECONDS value")?,
            },
        };

        // Validate settings
        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        // Validate port range
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.cosmos.request_timeout_seconds == 0 {
            anyhow::bail!("COSMOS_REQUEST_TIMEOUT_SECONDS must be > 0");
        }

        // Catch connection mistakes at startup rather than on first request
        reqwest::Url::parse(&self.cosmos.uri)
            .with_context(|| format!("CosmosDB_Uri is not a valid URL: {}", self.cosmos.uri))?;

        BASE64
            .decode(&self.cosmos.app_key)
            .context("CosmosDB_appKey is not valid base64")?;

        if self.cosmos.database_id.is_empty() {
            anyhow::bail!("CosmosDB_DatabaseId cannot be empty");
        }
        if self.cosmos.container_id.is_empty() {
            anyhow::bail!("CosmosDB_ContainerId cannot be empty");
        }

        Ok(())
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
