//! Amazon S3 and S3-compatible stores (MinIO, LocalStack).
//!
//! Credentials come from the standard AWS provider chain. When an endpoint
//! is configured, path-style addressing is used.

use super::{ObjectStore, object_url};
use crate::core::config::StorageConfig;
use crate::{DocsiftError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_url_base: Option<String>,
}

impl S3ObjectStore {
    /// Build a client from `config`; `bucket` must be set.
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        let bucket = config
            .bucket
            .clone()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| DocsiftError::validation("storage.bucket must be set to upload images"))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::debug!(bucket = %bucket, endpoint = ?config.endpoint, "S3 object store configured");

        Ok(Self::from_client(
            Client::from_conf(builder.build()),
            bucket,
            config.public_url_base.clone(),
        ))
    }

    pub fn from_client(client: Client, bucket: String, public_url_base: Option<String>) -> Self {
        Self {
            client,
            bucket,
            public_url_base,
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if !prefix.is_empty() {
                request = request.prefix(prefix);
            }
            if let Some(token) = continuation.take() {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| {
                DocsiftError::upload(format!(
                    "Failed to list objects in {}: {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

            keys.extend(response.contents().iter().filter_map(|obj| obj.key().map(str::to_string)));

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => continuation = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let keys = self.list_keys(prefix).await?;
        for key in &keys {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    DocsiftError::upload(format!(
                        "Failed to delete {} from {}: {}",
                        key,
                        self.bucket,
                        DisplayErrorContext(&e)
                    ))
                })?;
        }
        Ok(keys.len())
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                DocsiftError::upload(format!(
                    "Failed to upload {} to {}: {}",
                    key,
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(object_url(self.public_url_base.as_deref(), &self.bucket, key))
    }
}
