//! Error types for credential resolution and client construction.

use thiserror::Error;

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required name or setting is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The account query could not be executed or answered.
    #[error("failed to look up AWS account: {0}")]
    Lookup(String),

    /// The account query did not return exactly one record.
    #[error("expected exactly one AWS account named '{account}', found {found}")]
    AmbiguousResult { account: String, found: usize },

    /// The secret store could not be reached or refused the read.
    #[error("failed to read secret: {0}")]
    SecretStore(String),

    /// The secret was read but does not hold usable credentials.
    #[error("secret at '{path}' is malformed: {reason}")]
    SecretFormat { path: String, reason: String },

    /// The storage SDK configuration could not be built.
    #[error("failed to build AWS configuration: {0}")]
    CredentialConfig(String),
}

impl Error {
    pub(crate) fn secret_format(path: &str, reason: impl Into<String>) -> Self {
        Self::SecretFormat {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
