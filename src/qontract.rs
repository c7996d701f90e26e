//! Account lookups against the qontract GraphQL server.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::aws::AwsAccount;
use crate::config::QontractConfig;
use crate::error::{Error, Result};

pub const GET_ACCOUNTS_QUERY: &str = r#"
query getAccounts($name: String) {
  awsaccounts_v1 (name: $name) {
    name
    resourcesDefaultRegion
    automationToken {
      path
      field
      version
      format
    }
  }
}
"#;

/// Source of AWS account records.
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// Returns every account whose name matches `name`.
    async fn get_accounts(&self, name: &str) -> Result<Vec<AwsAccount>>;
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Variables<'a>,
}

#[derive(Serialize)]
struct Variables<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<AccountsData>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Deserialize)]
struct AccountsData {
    #[serde(default)]
    awsaccounts_v1: Option<Vec<AwsAccount>>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

pub struct QontractClient {
    http: reqwest::Client,
    server_url: String,
    token: Option<String>,
}

impl QontractClient {
    /// Creates a client. The server URL is checked on first use so that a
    /// caller with environment credentials never needs one.
    pub fn new(config: &QontractConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            server_url: config.server_url.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl AccountQuery for QontractClient {
    async fn get_accounts(&self, name: &str) -> Result<Vec<AwsAccount>> {
        if self.server_url.is_empty() {
            return Err(Error::Configuration(
                "qontract server URL is not set (QONTRACT_SERVER_URL)".to_string(),
            ));
        }

        let mut request = self.http.post(&self.server_url).json(&GraphqlRequest {
            query: GET_ACCOUNTS_QUERY,
            variables: Variables { name },
        });
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Lookup(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Lookup(format!("qontract server returned {status}")));
        }

        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| Error::Lookup(format!("invalid response body: {e}")))?;

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::Lookup(messages.join("; ")));
        }

        let accounts = body
            .data
            .and_then(|data| data.awsaccounts_v1)
            .unwrap_or_default();
        debug!(name, found = accounts.len(), "getAccounts query answered");
        Ok(accounts)
    }
}
