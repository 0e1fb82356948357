//! In-process object store.
//!
//! Useful for tests and for embedders that post-process images themselves.
//! Keys registered with [`MemoryObjectStore::fail_on`] make `put` fail, which
//! lets callers exercise partial-upload handling.

use super::{ObjectStore, object_url};
use crate::{DocsiftError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    bucket: String,
    public_url_base: Option<String>,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_public_url_base(mut self, base: impl Into<String>) -> Self {
        self.public_url_base = Some(base.into());
        self
    }

    /// Make uploads whose key ends with `key_suffix` fail.
    pub fn fail_on(&self, key_suffix: impl Into<String>) {
        let mut failing = self.failing.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        failing.insert(key_suffix.into());
    }

    /// Stored keys in lexical order.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock_objects()?.keys().cloned().collect())
    }

    pub fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        Ok(self.lock_objects()?.get(key).cloned())
    }

    fn lock_objects(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, StoredObject>>> {
        self.objects
            .lock()
            .map_err(|e| DocsiftError::LockPoisoned(format!("memory object store: {}", e)))
    }

    fn should_fail(&self, key: &str) -> Result<bool> {
        let failing = self
            .failing
            .lock()
            .map_err(|e| DocsiftError::LockPoisoned(format!("memory object store: {}", e)))?;
        Ok(failing.iter().any(|suffix| key.ends_with(suffix.as_str())))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let mut objects = self.lock_objects()?;
        let before = objects.len();
        objects.retain(|key, _| !key.starts_with(prefix));
        Ok(before - objects.len())
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        if self.should_fail(key)? {
            return Err(DocsiftError::upload(format!(
                "Injected failure uploading {} to {}",
                key, self.bucket
            )));
        }

        self.lock_objects()?.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(object_url(self.public_url_base.as_deref(), &self.bucket, key))
    }
}
