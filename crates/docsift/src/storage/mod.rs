//! Object storage for extracted PDF images.
//!
//! Images are uploaded under a per-request namespace (the configured
//! `key_prefix`, or a fresh UUID) and returned as public URLs. Before
//! uploading, the destination is cleared according to [`ResetScope`]:
//! only the namespace by default, the whole bucket when explicitly asked.
//!
//! Individual upload failures are logged and the image is left out of the
//! result; the remaining uploads still complete.

pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

pub use memory::MemoryObjectStore;
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;

use crate::core::config::{ResetScope, StorageConfig};
use crate::pdf::ExtractedImage;
use crate::types::ImageRecord;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A bucket of objects addressed by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    /// Delete every object whose key starts with `prefix` and return how many
    /// were removed. An empty prefix clears the bucket.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize>;

    /// Store `data` under `key` and return its public URL.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Public URL of `key`.
///
/// The key is percent-encoded segment by segment, so namespace separators
/// stay readable.
pub fn object_url(public_url_base: Option<&str>, bucket: &str, key: &str) -> String {
    let encoded = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    match public_url_base {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), encoded),
        None => format!("https://{}.s3.amazonaws.com/{}", bucket, encoded),
    }
}

/// Key namespace for one request.
pub fn request_namespace(config: &StorageConfig) -> String {
    match &config.key_prefix {
        Some(prefix) => prefix.trim_matches('/').to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    }
}

fn namespaced_key(namespace: &str, key: &str) -> String {
    if namespace.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", namespace, key)
    }
}

/// Build the store described by `config`.
#[cfg(feature = "s3")]
pub async fn object_store_from_config(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    Ok(Arc::new(S3ObjectStore::from_config(config).await?))
}

/// Build the store described by `config`.
#[cfg(not(feature = "s3"))]
pub async fn object_store_from_config(_config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    Err(crate::DocsiftError::MissingDependency(
        "Image uploads need an object store. Build docsift with the `s3` feature, \
or pass a store to extract_bytes_with_store."
            .to_string(),
    ))
}

async fn reset_destination(store: &dyn ObjectStore, namespace: &str, scope: ResetScope) -> Result<()> {
    match scope {
        ResetScope::Keep => Ok(()),
        ResetScope::Namespace => {
            if namespace.is_empty() {
                tracing::debug!("Empty key namespace, skipping reset");
                return Ok(());
            }
            let prefix = format!("{}/", namespace);
            let removed = store.delete_prefix(&prefix).await?;
            tracing::debug!(bucket = store.bucket(), prefix = %prefix, removed, "Cleared upload namespace");
            Ok(())
        }
        ResetScope::Bucket => {
            tracing::warn!(
                bucket = store.bucket(),
                "Deleting every object in the bucket before upload; uploads from other runs are lost"
            );
            let removed = store.delete_prefix("").await?;
            tracing::info!(bucket = store.bucket(), removed, "Bucket cleared");
            Ok(())
        }
    }
}

/// Reset the destination, upload `images` concurrently and return the
/// records of those that succeeded, ordered by `image_index`.
///
/// A failed reset fails the call. A failed upload only drops that image.
pub async fn upload_images(
    store: Arc<dyn ObjectStore>,
    images: Vec<ExtractedImage>,
    config: &StorageConfig,
) -> Result<Vec<ImageRecord>> {
    let namespace = request_namespace(config);
    reset_destination(store.as_ref(), &namespace, config.reset_scope).await?;

    if images.is_empty() {
        return Ok(Vec::new());
    }

    let semaphore = Arc::new(Semaphore::new(config.upload_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for image in images {
        let store = Arc::clone(&store);
        let semaphore = Arc::clone(&semaphore);
        let key = namespaced_key(&namespace, &image.key);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let content_type = image.content_type();
            let result = store.put(&key, image.data, content_type).await;
            (image.image_index, key, result)
        });
    }

    let mut records = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((image_index, key, Ok(image_url))) => {
                tracing::info!(image = image_index, key = %key, "Uploaded image");
                records.push(ImageRecord { image_index, image_url });
            }
            Ok((image_index, key, Err(err))) => {
                tracing::warn!(image = image_index, key = %key, error = %err, "Image upload failed, omitting it");
            }
            Err(join_err) => {
                tracing::warn!(error = %join_err, "Image upload task aborted, omitting its image");
            }
        }
    }

    records.sort_by_key(|record| record.image_index);
    Ok(records)
}
