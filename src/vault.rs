//! Vault secret store access.
//!
//! Automation token paths are `<mount>/<path>`. A read with a version goes
//! to the KV v2 engine for that exact version; a read without one is a
//! KV v1 get. The engine is chosen by the request, never by looking at the
//! keys a secret happens to contain.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use vaultrs::client::{Client, VaultClient as VaultApi, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::{auth::approle, kv1, kv2};

use crate::config::VaultConfig;
use crate::error::{Error, Result};

const APPROLE_MOUNT: &str = "approle";

/// Key-value payload of a secret.
#[derive(Clone, Default, PartialEq)]
pub struct Secret {
    pub data: Map<String, Value>,
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Reads secrets by path.
#[async_trait]
pub trait SecretReader: Send + Sync {
    async fn read_secret(&self, path: &str, version: Option<i64>) -> Result<Secret>;
}

/// The two keys an automation token secret must carry.
///
/// Deserializing fails if either key holds something other than a string;
/// absence is reported as `None` and left for the caller to reject.
#[derive(Deserialize, Default)]
pub struct AccessKeySecret {
    #[serde(default)]
    pub aws_access_key_id: Option<String>,
    #[serde(default)]
    pub aws_secret_access_key: Option<String>,
}

impl AccessKeySecret {
    pub fn from_secret(path: &str, secret: &Secret) -> Result<Self> {
        serde_json::from_value(Value::Object(secret.data.clone()))
            .map_err(|e| Error::secret_format(path, e.to_string()))
    }
}

/// Splits `<mount>/<path>` at the first slash.
fn split_mount(path: &str) -> Result<(&str, &str)> {
    match path.trim_matches('/').split_once('/') {
        Some((mount, rest)) if !mount.is_empty() && !rest.is_empty() => Ok((mount, rest)),
        _ => Err(Error::Configuration(format!(
            "secret path '{path}' must have the form <mount>/<path>"
        ))),
    }
}

fn store_error(path: &str, err: ClientError) -> Error {
    match err {
        ClientError::APIError { code: 404, .. } => {
            Error::SecretStore(format!("no secret found at '{path}'"))
        }
        other => Error::SecretStore(format!("failed to read '{path}': {other}")),
    }
}

pub struct VaultClient {
    config: VaultConfig,
}

impl VaultClient {
    /// Creates a client from configuration. Authentication happens on the
    /// first read, so an unused client needs no server or credentials.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    fn create_client(&self) -> Result<VaultApi> {
        let server = self.config.server.trim_end_matches('/');
        if server.is_empty() {
            return Err(Error::Configuration(
                "Vault server is not set (VAULT_SERVER)".to_string(),
            ));
        }

        let mut settings = VaultClientSettingsBuilder::default();
        settings.address(server);
        settings.timeout(Some(Duration::from_secs(self.config.timeout_secs)));
        let settings = settings
            .build()
            .map_err(|e| Error::Configuration(format!("invalid Vault settings: {e}")))?;

        VaultApi::new(settings)
            .map_err(|e| Error::Configuration(format!("failed to build Vault client: {e}")))
    }

    /// Returns an authenticated client, logging in first for approle.
    async fn authenticated(&self) -> Result<VaultApi> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        match self.config.auth_type.as_str() {
            "token" => {
                let token = non_empty(&self.config.token).ok_or_else(|| {
                    Error::Configuration("VAULT_TOKEN is required for token auth".to_string())
                })?;
                let mut client = self.create_client()?;
                client.set_token(&token);
                Ok(client)
            }
            "approle" => {
                let (Some(role_id), Some(secret_id)) = (
                    non_empty(&self.config.role_id),
                    non_empty(&self.config.secret_id),
                ) else {
                    return Err(Error::Configuration(
                        "VAULT_ROLE_ID and VAULT_SECRET_ID are required for approle auth"
                            .to_string(),
                    ));
                };
                let mut client = self.create_client()?;
                let auth = approle::login(&client, APPROLE_MOUNT, &role_id, &secret_id)
                    .await
                    .map_err(|e| Error::SecretStore(format!("approle login failed: {e}")))?;
                client.set_token(&auth.client_token);
                info!("Logged in to Vault with approle");
                Ok(client)
            }
            other => Err(Error::Configuration(format!(
                "unsupported Vault auth type '{other}'"
            ))),
        }
    }
}

#[async_trait]
impl SecretReader for VaultClient {
    async fn read_secret(&self, path: &str, version: Option<i64>) -> Result<Secret> {
        let (mount, secret_path) = split_mount(path)?;
        let client = self.authenticated().await?;

        let data = match version {
            Some(version) => {
                let version = u64::try_from(version).map_err(|_| {
                    Error::Configuration(format!("invalid secret version {version} for '{path}'"))
                })?;
                kv2::read_version::<Map<String, Value>>(&client, mount, secret_path, version)
                    .await
                    .map_err(|e| store_error(path, e))?
            }
            None => kv1::get::<Map<String, Value>>(&client, mount, secret_path)
                .await
                .map_err(|e| store_error(path, e))?,
        };

        debug!(mount, path = secret_path, ?version, "read secret from Vault");
        Ok(Secret { data })
    }
}
