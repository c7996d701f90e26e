use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::qontract::AccountQuery;

/// An AWS account as described in app-interface.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AwsAccount {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "resourcesDefaultRegion")]
    pub default_region: String,
    #[serde(default, rename = "automationToken")]
    pub automation_token: AutomationToken,
}

/// Pointer to the Vault secret holding the account's automation credentials.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AutomationToken {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Returns the only account in `accounts`, or an `AmbiguousResult` error
/// naming `account` and the number of matches.
pub(crate) fn single_account<'a>(account: &str, accounts: &'a [AwsAccount]) -> Result<&'a AwsAccount> {
    match accounts {
        [only] => Ok(only),
        _ => Err(Error::AmbiguousResult {
            account: account.to_string(),
            found: accounts.len(),
        }),
    }
}

/// Looks up exactly one AWS account by name.
pub async fn resolve_account<Q>(query: &Q, account: &str) -> Result<AwsAccount>
where
    Q: AccountQuery + ?Sized,
{
    if account.is_empty() {
        return Err(Error::Configuration("no AWS account name provided".to_string()));
    }

    let accounts = query.get_accounts(account).await?;
    debug!(account, found = accounts.len(), "queried AWS accounts");

    single_account(account, &accounts).cloned()
}
