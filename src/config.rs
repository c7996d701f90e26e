use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::non_empty;

const APP_NAME: &str = "aws-state-client";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AwsConfig {
    #[serde(default)]
    pub region: String,
    /// Custom endpoint for S3-compatible stores. Enables path-style addressing.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QontractConfig {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for QontractConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VaultConfig {
    #[serde(default)]
    pub server: String,
    #[serde(default = "default_auth_type")]
    pub auth_type: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub secret_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            auth_type: default_auth_type(),
            token: None,
            role_id: None,
            secret_id: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_auth_type() -> String {
    "token".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub qontract: QontractConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub log_path: Option<String>,
}

impl AppConfig {
    /// Overlays environment settings on top of the file configuration.
    ///
    /// `lookup` is the environment; unset and empty values leave the file
    /// value untouched.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(non_empty);

        if let Some(region) = get("AWS_REGION") {
            self.aws.region = region;
        }
        if let Some(endpoint) = get("AWS_ENDPOINT_URL") {
            self.aws.endpoint_url = Some(endpoint);
        }
        if let Some(url) = get("QONTRACT_SERVER_URL") {
            self.qontract.server_url = url;
        }
        if let Some(token) = get("QONTRACT_TOKEN") {
            self.qontract.token = Some(token);
        }
        if let Some(server) = get("VAULT_SERVER") {
            self.vault.server = server;
        }
        if let Some(auth_type) = get("VAULT_AUTHTYPE") {
            self.vault.auth_type = auth_type;
        }
        if let Some(token) = get("VAULT_TOKEN") {
            self.vault.token = Some(token);
        }
        if let Some(role_id) = get("VAULT_ROLE_ID") {
            self.vault.role_id = Some(role_id);
        }
        if let Some(secret_id) = get("VAULT_SECRET_ID") {
            self.vault.secret_id = Some(secret_id);
        }
        self
    }
}

/// Load config from file and apply environment overrides.
/// Falls back to defaults if the file doesn't exist or is invalid.
///
/// Runs before logging is set up, so a load failure is returned alongside
/// the fallback for the caller to report.
pub fn load_config() -> (AppConfig, Option<confy::ConfyError>) {
    load_config_with(
        || confy::load(APP_NAME, None),
        |key| std::env::var(key).ok(),
    )
}

fn load_config_with<L, F>(load: L, lookup: F) -> (AppConfig, Option<confy::ConfyError>)
where
    L: FnOnce() -> Result<AppConfig, confy::ConfyError>,
    F: Fn(&str) -> Option<String>,
{
    let (file_config, error) = match load() {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    (file_config.with_overrides(lookup), error)
}

/// Get the config file path for debugging purposes.
pub fn get_config_path() -> Option<PathBuf> {
    confy::get_configuration_file_path(APP_NAME, None).ok()
}
