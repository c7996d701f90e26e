use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials as SdkCredentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::delete_object::{
    DeleteObjectError, DeleteObjectOutput, builders::DeleteObjectInputBuilder,
};
use aws_sdk_s3::operation::get_object::{
    GetObjectError, GetObjectOutput, builders::GetObjectInputBuilder,
};
use aws_sdk_s3::operation::head_object::{
    HeadObjectError, HeadObjectOutput, builders::HeadObjectInputBuilder,
};
use aws_sdk_s3::operation::put_object::{
    PutObjectError, PutObjectOutput, builders::PutObjectInputBuilder,
};
use std::borrow::Cow;
use tracing::{debug, info};

use super::credentials::{Credentials, resolve_credentials};
use crate::config::{AppConfig, AwsConfig};
use crate::error::{Error, Result};
use crate::qontract::AccountQuery;
use crate::vault::SecretReader;

const PROVIDER_NAME: &str = "app-interface";

/// Per-call change to the client configuration, e.g. another region or
/// endpoint for a single request.
pub type ConfigOverride = Box<dyn FnOnce(S3ConfigBuilder) -> S3ConfigBuilder + Send>;

/// The object operations state handling needs.
///
/// Inputs are the SDK's typed input builders; outputs and errors are the
/// SDK's, unchanged.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(
        &self,
        input: GetObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<GetObjectOutput, SdkError<GetObjectError>>;

    async fn head_object(
        &self,
        input: HeadObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<HeadObjectOutput, SdkError<HeadObjectError>>;

    async fn put_object(
        &self,
        input: PutObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<PutObjectOutput, SdkError<PutObjectError>>;

    async fn delete_object(
        &self,
        input: DeleteObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<DeleteObjectOutput, SdkError<DeleteObjectError>>;
}

/// S3 client built from resolved credentials.
#[derive(Debug, Clone)]
pub struct StorageClient {
    s3: Client,
}

impl StorageClient {
    pub fn from_sdk(s3: Client) -> Self {
        Self { s3 }
    }

    /// The wrapped SDK client.
    pub fn sdk_client(&self) -> &Client {
        &self.s3
    }

    /// The client to send one request with: the shared one, or a copy with
    /// the override applied to its configuration.
    fn client_for(&self, overrides: Option<ConfigOverride>) -> Cow<'_, Client> {
        match overrides {
            Some(apply) => {
                let config = apply(self.s3.config().to_builder()).build();
                Cow::Owned(Client::from_conf(config))
            }
            None => Cow::Borrowed(&self.s3),
        }
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn get_object(
        &self,
        input: GetObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<GetObjectOutput, SdkError<GetObjectError>> {
        input.send_with(&self.client_for(overrides)).await
    }

    async fn head_object(
        &self,
        input: HeadObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<HeadObjectOutput, SdkError<HeadObjectError>> {
        input.send_with(&self.client_for(overrides)).await
    }

    async fn put_object(
        &self,
        input: PutObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<PutObjectOutput, SdkError<PutObjectError>> {
        input.send_with(&self.client_for(overrides)).await
    }

    async fn delete_object(
        &self,
        input: DeleteObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<DeleteObjectOutput, SdkError<DeleteObjectError>> {
        input.send_with(&self.client_for(overrides)).await
    }
}

/// Creates a storage client from already-resolved credentials.
pub async fn build_client(credentials: Credentials, aws: &AwsConfig) -> Result<StorageClient> {
    if aws.region.is_empty() {
        return Err(Error::Configuration(
            "AWS region is not set (AWS_REGION)".to_string(),
        ));
    }
    let endpoint = aws.endpoint_url.as_deref().filter(|e| !e.is_empty());
    if let Some(endpoint) = endpoint {
        reqwest::Url::parse(endpoint).map_err(|e| {
            Error::CredentialConfig(format!("invalid endpoint URL '{endpoint}': {e}"))
        })?;
    }

    let provider = SdkCredentials::new(
        credentials.access_key_id(),
        credentials.secret_access_key(),
        None,
        None,
        PROVIDER_NAME,
    );
    let sdk_config = aws_config::from_env()
        .credentials_provider(provider)
        .region(Region::new(aws.region.clone()))
        .load()
        .await;

    let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
    if let Some(endpoint) = endpoint {
        debug!("Using custom S3 endpoint: {}", endpoint);
        s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
    }

    Ok(StorageClient::from_sdk(Client::from_conf(s3_config.build())))
}

/// Resolves credentials and creates a storage client.
///
/// Any failure is returned; no client is handed out half-configured.
pub async fn new_client<Q, S>(
    config: &AppConfig,
    accounts: &Q,
    secrets: &S,
    account: Option<&str>,
) -> Result<StorageClient>
where
    Q: AccountQuery + ?Sized,
    S: SecretReader + ?Sized,
{
    let credentials = resolve_credentials(accounts, secrets, account).await?;
    let client = build_client(credentials, &config.aws).await?;
    info!(region = %config.aws.region, "Created S3 client");
    Ok(client)
}
