pub mod accounts;
pub mod client;
pub mod credentials;

#[cfg(test)]
pub(crate) mod testing;

pub use accounts::{AutomationToken, AwsAccount, resolve_account};
pub use client::{ConfigOverride, ObjectStore, StorageClient, build_client, new_client};
pub use credentials::{
    Credentials, credentials_from_env, fetch_credentials_from_vault, guess_account_name,
    resolve_credentials,
};
