use anyhow::Context;
use aws_sdk_s3::operation::delete_object::DeleteObjectInput;
use aws_sdk_s3::operation::get_object::GetObjectInput;
use aws_sdk_s3::operation::head_object::HeadObjectInput;
use aws_sdk_s3::operation::put_object::PutObjectInput;
use aws_sdk_s3::primitives::ByteStream;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::aws::ObjectStore;
use crate::utils::content_type_for;

#[derive(Parser, Debug)]
#[command(name = "aws-state-client", version, about = "Object access on app-interface managed S3 buckets")]
pub struct Cli {
    /// AWS account name in app-interface. Defaults to $APP_INTERFACE_STATE_BUCKET_ACCOUNT
    #[arg(long, global = true)]
    pub account: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ObjectTarget {
    #[arg(long)]
    pub bucket: String,

    #[arg(long)]
    pub key: String,
}

impl ObjectTarget {
    fn url(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download an object
    Get {
        #[command(flatten)]
        target: ObjectTarget,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show object metadata
    Head {
        #[command(flatten)]
        target: ObjectTarget,
    },
    /// Upload a file as an object
    Put {
        #[command(flatten)]
        target: ObjectTarget,

        #[arg(long)]
        file: PathBuf,
    },
    /// Delete an object
    Delete {
        #[command(flatten)]
        target: ObjectTarget,
    },
}

impl Command {
    /// Runs the command against `store`. Object bodies and metadata go to
    /// `out` unless a file is named.
    pub async fn execute<S, W>(self, store: &S, out: &mut W) -> anyhow::Result<()>
    where
        S: ObjectStore + ?Sized,
        W: Write,
    {
        match self {
            Command::Get { target, output } => {
                let input = GetObjectInput::builder()
                    .bucket(&target.bucket)
                    .key(&target.key);
                let response = store
                    .get_object(input, None)
                    .await
                    .with_context(|| format!("get {}", target.url()))?;
                let body = response.body.collect().await?.into_bytes();
                match output {
                    Some(path) => tokio::fs::write(&path, &body)
                        .await
                        .with_context(|| format!("write {}", path.display()))?,
                    None => out.write_all(&body)?,
                }
                info!("Downloaded {} bytes from {}", body.len(), target.url());
            }
            Command::Head { target } => {
                let input = HeadObjectInput::builder()
                    .bucket(&target.bucket)
                    .key(&target.key);
                let head = store
                    .head_object(input, None)
                    .await
                    .with_context(|| format!("head {}", target.url()))?;
                writeln!(out, "content-length: {}", head.content_length().unwrap_or_default())?;
                writeln!(out, "content-type: {}", head.content_type().unwrap_or("-"))?;
                writeln!(out, "etag: {}", head.e_tag().unwrap_or("-"))?;
                if let Some(modified) = head.last_modified() {
                    writeln!(out, "last-modified: {modified}")?;
                }
            }
            Command::Put { target, file } => {
                let body = ByteStream::from_path(&file)
                    .await
                    .with_context(|| format!("open {}", file.display()))?;
                let input = PutObjectInput::builder()
                    .bucket(&target.bucket)
                    .key(&target.key)
                    .content_type(content_type_for(&file))
                    .body(body);
                store
                    .put_object(input, None)
                    .await
                    .with_context(|| format!("put {}", target.url()))?;
                info!("Uploaded {} to {}", file.display(), target.url());
            }
            Command::Delete { target } => {
                let input = DeleteObjectInput::builder()
                    .bucket(&target.bucket)
                    .key(&target.key);
                store
                    .delete_object(input, None)
                    .await
                    .with_context(|| format!("delete {}", target.url()))?;
                info!("Deleted {}", target.url());
            }
        }

        Ok(())
    }
}
