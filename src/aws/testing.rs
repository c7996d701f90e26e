//! In-memory query, secret store and object store doubles that count their
//! calls.

use async_trait::async_trait;
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
use aws_sdk_s3::primitives::ByteStream;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::AwsAccount;
use super::client::{ConfigOverride, ObjectStore};
use crate::error::{Error, Result};
use crate::qontract::AccountQuery;
use crate::vault::{Secret, SecretReader};

pub struct FakeAccounts {
    accounts: Option<Vec<AwsAccount>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl FakeAccounts {
    pub fn new(accounts: Vec<AwsAccount>) -> Self {
        Self {
            accounts: Some(accounts),
            delay: None,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            accounts: None,
            ..Self::new(Vec::new())
        }
    }

    /// Answers with `accounts` only after `delay`.
    pub fn stalled(accounts: Vec<AwsAccount>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(accounts)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries that ran to the end.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountQuery for FakeAccounts {
    async fn get_accounts(&self, _name: &str) -> Result<Vec<AwsAccount>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.accounts
            .clone()
            .ok_or_else(|| Error::Lookup("connection refused".to_string()))
    }
}

pub struct FakeSecrets {
    data: Option<Map<String, Value>>,
    calls: AtomicUsize,
}

impl FakeSecrets {
    pub fn new(data: Value) -> Self {
        Self {
            data: data.as_object().cloned(),
            calls: AtomicUsize::new(0),
        }
    }

    /// A store that fails every read.
    pub fn unreachable() -> Self {
        Self {
            data: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretReader for FakeSecrets {
    async fn read_secret(&self, _path: &str, _version: Option<i64>) -> Result<Secret> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.data
            .clone()
            .map(|data| Secret { data })
            .ok_or_else(|| Error::SecretStore("connection refused".to_string()))
    }
}

/// Objects kept in memory under `bucket/key`.
#[derive(Default)]
pub struct FakeObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    content_types: Mutex<HashMap<String, String>>,
    overrides: AtomicUsize,
}

fn object_key(bucket: Option<&String>, key: Option<&String>) -> String {
    format!(
        "{}/{}",
        bucket.map(String::as_str).unwrap_or_default(),
        key.map(String::as_str).unwrap_or_default()
    )
}

fn no_such_key<E>(name: &str) -> SdkError<E> {
    SdkError::construction_failure(format!("NoSuchKey: {name}"))
}

impl FakeObjectStore {
    pub fn with_object(self, bucket: &str, key: &str, body: &[u8]) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{bucket}/{key}"), body.to_vec());
        self
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&format!("{bucket}/{key}"))
            .cloned()
    }

    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.content_types
            .lock()
            .unwrap()
            .get(&format!("{bucket}/{key}"))
            .cloned()
    }

    /// Calls that carried a config override.
    pub fn overrides(&self) -> usize {
        self.overrides.load(Ordering::SeqCst)
    }

    fn note_override(&self, overrides: Option<ConfigOverride>) {
        if let Some(apply) = overrides {
            let _ = apply(aws_sdk_s3::Config::builder());
            self.overrides.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn get_object(
        &self,
        input: GetObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<GetObjectOutput, SdkError<GetObjectError>> {
        self.note_override(overrides);
        let name = object_key(input.get_bucket().as_ref(), input.get_key().as_ref());
        let body = self.objects.lock().unwrap().get(&name).cloned();
        match body {
            Some(body) => Ok(GetObjectOutput::builder()
                .content_length(body.len() as i64)
                .body(ByteStream::from(body))
                .build()),
            None => Err(no_such_key(&name)),
        }
    }

    async fn head_object(
        &self,
        input: HeadObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<HeadObjectOutput, SdkError<HeadObjectError>> {
        self.note_override(overrides);
        let name = object_key(input.get_bucket().as_ref(), input.get_key().as_ref());
        let size = self.objects.lock().unwrap().get(&name).map(Vec::len);
        let content_type = self.content_types.lock().unwrap().get(&name).cloned();
        match size {
            Some(size) => Ok(HeadObjectOutput::builder()
                .content_length(size as i64)
                .set_content_type(content_type)
                .e_tag("\"fake\"")
                .build()),
            None => Err(no_such_key(&name)),
        }
    }

    async fn put_object(
        &self,
        input: PutObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<PutObjectOutput, SdkError<PutObjectError>> {
        self.note_override(overrides);
        let input = input.build().map_err(SdkError::construction_failure)?;
        let name = object_key(input.bucket.as_ref(), input.key.as_ref());
        let body = input
            .body
            .collect()
            .await
            .map_err(SdkError::construction_failure)?
            .into_bytes();

        if let Some(content_type) = input.content_type {
            self.content_types
                .lock()
                .unwrap()
                .insert(name.clone(), content_type);
        }
        self.objects.lock().unwrap().insert(name, body.to_vec());
        Ok(PutObjectOutput::builder().e_tag("\"fake\"").build())
    }

    async fn delete_object(
        &self,
        input: DeleteObjectInputBuilder,
        overrides: Option<ConfigOverride>,
    ) -> std::result::Result<DeleteObjectOutput, SdkError<DeleteObjectError>> {
        self.note_override(overrides);
        let name = object_key(input.get_bucket().as_ref(), input.get_key().as_ref());
        self.objects.lock().unwrap().remove(&name);
        Ok(DeleteObjectOutput::builder().build())
    }
}
