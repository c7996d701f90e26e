//! Authenticated S3 client for app-interface managed AWS accounts.
//!
//! Credentials come from `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY` when
//! both are set. Otherwise the account is looked up on the qontract server
//! and its automation token is read from Vault.

pub mod aws;
pub mod cli;
pub mod config;
pub mod error;
pub mod qontract;
pub mod utils;
pub mod vault;

pub use aws::{
    AwsAccount, ConfigOverride, Credentials, ObjectStore, StorageClient, build_client,
    credentials_from_env, fetch_credentials_from_vault, guess_account_name, new_client,
    resolve_account, resolve_credentials,
};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use qontract::{AccountQuery, QontractClient};
pub use vault::{Secret, SecretReader, VaultClient};
