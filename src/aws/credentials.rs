use std::fmt;
use tracing::{debug, info};

use super::accounts::{AwsAccount, resolve_account, single_account};
use crate::error::{Error, Result};
use crate::qontract::AccountQuery;
use crate::utils::non_empty;
use crate::vault::{AccessKeySecret, SecretReader};

pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const STATE_BUCKET_ACCOUNT_VAR: &str = "APP_INTERFACE_STATE_BUCKET_ACCOUNT";

const ACCESS_KEY_ID_FIELD: &str = "aws_access_key_id";
const SECRET_ACCESS_KEY_FIELD: &str = "aws_secret_access_key";

/// Static AWS access key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
}

impl Credentials {
    /// Both halves of the pair must be non-empty.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();
        if access_key_id.is_empty() || secret_access_key.is_empty() {
            return Err(Error::CredentialConfig(
                "access key id and secret access key must both be set".to_string(),
            ));
        }
        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Reads credentials from `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.
///
/// Returns `None` unless both are set and non-empty.
pub fn credentials_from_env() -> Option<Credentials> {
    credentials_from_lookup(|key| std::env::var(key).ok())
}

/// Same as [`credentials_from_env`] over an arbitrary variable lookup.
pub fn credentials_from_lookup<F>(lookup: F) -> Option<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let access_key_id = lookup(ACCESS_KEY_ID_VAR).and_then(non_empty)?;
    let secret_access_key = lookup(SECRET_ACCESS_KEY_VAR).and_then(non_empty)?;
    Credentials::new(access_key_id, secret_access_key).ok()
}

/// Account name to fall back on when none is given. Empty if unset.
pub fn guess_account_name() -> String {
    std::env::var(STATE_BUCKET_ACCOUNT_VAR).unwrap_or_default()
}

/// Reads the automation token of the single account in `accounts` from the
/// secret store.
///
/// The account list is checked again here even though [`resolve_account`]
/// already guarantees one entry, so the fetcher stays safe to call on a raw
/// query result.
pub async fn fetch_credentials_from_vault<S>(secrets: &S, accounts: &[AwsAccount]) -> Result<Credentials>
where
    S: SecretReader + ?Sized,
{
    let name = accounts.first().map(|a| a.name.as_str()).unwrap_or_default();
    let account = single_account(name, accounts)?;

    let token = &account.automation_token;
    if token.path.is_empty() {
        return Err(Error::Configuration(format!(
            "AWS account '{}' has no automation token path",
            account.name
        )));
    }

    debug!(account = %account.name, path = %token.path, "reading automation token");
    let secret = secrets.read_secret(&token.path, token.version).await?;
    let keys = AccessKeySecret::from_secret(&token.path, &secret)?;

    let require = |value: Option<String>, field: &str| {
        value
            .and_then(non_empty)
            .ok_or_else(|| Error::secret_format(&token.path, format!("missing '{field}'")))
    };
    let access_key_id = require(keys.aws_access_key_id, ACCESS_KEY_ID_FIELD)?;
    let secret_access_key = require(keys.aws_secret_access_key, SECRET_ACCESS_KEY_FIELD)?;

    Credentials::new(access_key_id, secret_access_key)
}

/// Resolves credentials for the storage client.
///
/// Environment credentials win outright and no remote call is made.
/// Otherwise the account (given, or guessed from
/// `APP_INTERFACE_STATE_BUCKET_ACCOUNT`) is looked up and its automation
/// token read from the secret store.
pub async fn resolve_credentials<Q, S>(accounts: &Q, secrets: &S, account: Option<&str>) -> Result<Credentials>
where
    Q: AccountQuery + ?Sized,
    S: SecretReader + ?Sized,
{
    if let Some(credentials) = credentials_from_env() {
        info!("Using AWS credentials from environment");
        return Ok(credentials);
    }

    let account = match account.filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => guess_account_name(),
    };
    if account.is_empty() {
        return Err(Error::Configuration(format!(
            "no AWS account name provided and {STATE_BUCKET_ACCOUNT_VAR} is not set"
        )));
    }

    let record = resolve_account(accounts, &account).await?;
    info!(account = %record.name, region = %record.default_region, "Resolved AWS account");

    fetch_credentials_from_vault(secrets, std::slice::from_ref(&record)).await
}
