//! In-process `StorageBackend` with S3 listing semantics.
//!
//! Serves `serve --backend memory` (a console without a storage server) and
//! the test suites. Contents are lost when the process exits.

use crate::{
    errors::{StorageError, StorageResult},
    models::{
        bucket::Bucket,
        connection::ConnectionConfig,
        object::{ListEntry, ObjectBody, ObjectInfo},
    },
    services::backend::{Connector, PutObject, StorageBackend},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::Duration,
};
use tokio::sync::RwLock;

/// MinIO's factory credentials, used when none are configured.
pub const DEFAULT_ACCESS_KEY: &str = "minioadmin";
pub const DEFAULT_SECRET_KEY: &str = "minioadmin";

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: String,
    etag: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    created_at: Option<DateTime<Utc>>,
    policy: Option<String>,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    buckets: Arc<RwLock<BTreeMap<String, MemoryBucket>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object with an explicit modification time.
    pub async fn insert_object(
        &self,
        bucket: &str,
        key: &str,
        body: impl Into<Bytes>,
        last_modified: DateTime<Utc>,
    ) -> StorageResult<()> {
        let body = body.into();
        let mut buckets = self.buckets.write().await;
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.objects.insert(
            key.to_string(),
            StoredObject {
                etag: format!("{:x}", md5::compute(&body)),
                content_type: mime_guess::from_path(key)
                    .first_or_octet_stream()
                    .to_string(),
                body,
                last_modified,
            },
        );
        Ok(())
    }
}

fn no_such_bucket(bucket: &str) -> StorageError {
    StorageError::NotFound(format!("bucket `{bucket}` not found"))
}

fn no_such_key(bucket: &str, key: &str) -> StorageError {
    StorageError::NotFound(format!("object `{key}` not found in bucket `{bucket}`"))
}

fn object_info(key: &str, obj: &StoredObject) -> ObjectInfo {
    ObjectInfo {
        key: key.to_string(),
        size: obj.body.len() as i64,
        last_modified: Some(obj.last_modified),
        etag: Some(obj.etag.clone()),
        content_type: Some(obj.content_type.clone()),
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn list_buckets(&self) -> StorageResult<Vec<Bucket>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .map(|(name, bucket)| Bucket {
                name: name.clone(),
                creation_date: bucket.created_at,
            })
            .collect())
    }

    async fn create_bucket(&self, name: &str, _region: &str) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(name) {
            return Err(StorageError::Conflict(format!(
                "bucket `{name}` already exists"
            )));
        }
        buckets.insert(
            name.to_string(),
            MemoryBucket {
                created_at: Some(Utc::now()),
                ..MemoryBucket::default()
            },
        );
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets.get(name).ok_or_else(|| no_such_bucket(name))?;
        if !bucket.objects.is_empty() {
            return Err(StorageError::Conflict(format!(
                "bucket `{name}` is not empty"
            )));
        }
        buckets.remove(name);
        Ok(())
    }

    async fn get_policy(&self, bucket: &str) -> StorageResult<Option<String>> {
        let buckets = self.buckets.read().await;
        let entry = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        Ok(entry.policy.clone())
    }

    async fn put_policy(&self, bucket: &str, policy: &str) -> StorageResult<()> {
        serde_json::from_str::<serde_json::Value>(policy)
            .map_err(|err| StorageError::Validation(format!("malformed policy: {err}")))?;
        let mut buckets = self.buckets.write().await;
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.policy = Some(policy.to_string());
        Ok(())
    }

    async fn delete_policy(&self, bucket: &str) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.policy = None;
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> StorageResult<Vec<ListEntry>> {
        let buckets = self.buckets.read().await;
        let entry = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;

        let mut objects = Vec::new();
        let mut common_prefixes = BTreeSet::new();
        for (key, obj) in entry.objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            if !recursive {
                if let Some(common) = compute_common_prefix(key, prefix, "/") {
                    common_prefixes.insert(common);
                    continue;
                }
            }
            objects.push(ListEntry::Object(object_info(key, obj)));
        }

        Ok(common_prefixes
            .into_iter()
            .map(|prefix| ListEntry::Prefix { prefix })
            .chain(objects)
            .collect())
    }

    async fn put_object(&self, bucket: &str, key: &str, object: PutObject) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.objects.insert(
            key.to_string(),
            StoredObject {
                etag: format!("{:x}", md5::compute(&object.body)),
                body: object.body,
                content_type: object.content_type,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody> {
        let buckets = self.buckets.read().await;
        let entry = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let obj = entry
            .objects
            .get(key)
            .ok_or_else(|| no_such_key(bucket, key))?;

        let body = obj.body.clone();
        Ok(ObjectBody {
            info: object_info(key, obj),
            stream: stream::once(async move { Ok(body) }).boxed(),
        })
    }

    async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectInfo> {
        let buckets = self.buckets.read().await;
        let entry = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        entry
            .objects
            .get(key)
            .map(|obj| object_info(key, obj))
            .ok_or_else(|| no_such_key(bucket, key))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        // S3 reports success for keys that never existed.
        entry.objects.remove(key);
        Ok(())
    }

    async fn presign_get(&self, bucket: &str, key: &str, ttl: Duration) -> StorageResult<String> {
        let expires = Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64);
        Ok(format!(
            "memory://{bucket}/{key}?X-Amz-Expires={}&expires-at={}",
            ttl.as_secs(),
            expires.timestamp()
        ))
    }
}

/// Hands out one shared [`MemoryBackend`] to callers presenting the expected
/// credentials.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    backend: MemoryBackend,
    access_key: String,
    secret_key: String,
}

impl MemoryConnector {
    pub fn new(backend: MemoryBackend) -> Self {
        Self::with_credentials(backend, DEFAULT_ACCESS_KEY, DEFAULT_SECRET_KEY)
    }

    pub fn with_credentials(
        backend: MemoryBackend,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, config: &ConnectionConfig) -> StorageResult<Arc<dyn StorageBackend>> {
        if config.access_key != self.access_key || config.secret_key != self.secret_key {
            return Err(StorageError::Auth(
                "the access key or secret key is not valid".into(),
            ));
        }
        Ok(Arc::new(self.backend.clone()))
    }
}

/// Compute a synthetic "common prefix" for S3 list semantics.
///
/// Returns Some(prefix) if the key continues past `requested_prefix` with a
/// delimiter, otherwise None.
fn compute_common_prefix(key: &str, requested_prefix: &str, delimiter: &str) -> Option<String> {
    let after_prefix = key.strip_prefix(requested_prefix)?;
    let pos = after_prefix.find(delimiter)?;
    let mut combined = String::from(requested_prefix);
    combined.push_str(&after_prefix[..pos + delimiter.len()]);
    Some(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn backend_with(keys: &[&str]) -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.create_bucket("docs", "us-east-1").await.unwrap();
        for key in keys {
            backend
                .insert_object("docs", key, Bytes::from_static(b"x"), Utc::now())
                .await
                .unwrap();
        }
        backend
    }

    #[test]
    fn common_prefix_groups_on_the_next_delimiter() {
        assert_eq!(
            compute_common_prefix("a/c/d.txt", "", "/"),
            Some("a/".to_string())
        );
        assert_eq!(
            compute_common_prefix("a/c/d.txt", "a/", "/"),
            Some("a/c/".to_string())
        );
        assert_eq!(compute_common_prefix("a/b.txt", "a/", "/"), None);
        assert_eq!(compute_common_prefix("e.txt", "a/", "/"), None);
    }

    #[tokio::test]
    async fn delimited_listing_surfaces_one_level() {
        let backend = backend_with(&["a/b.txt", "a/c/d.txt", "e.txt"]).await;
        let entries = backend.list_objects("docs", "", false).await.unwrap();
        assert_eq!(
            entries,
            vec![
                ListEntry::Prefix {
                    prefix: "a/".into()
                },
                ListEntry::Object(
                    backend.head_object("docs", "e.txt").await.unwrap()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn recursive_listing_returns_every_key_under_the_prefix() {
        let backend = backend_with(&["a/b.txt", "a/c/d.txt", "ab.txt", "e.txt"]).await;
        let keys: Vec<String> = backend
            .list_objects("docs", "a/", true)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|e| e.object().map(|o| o.key.clone()))
            .collect();
        assert_eq!(keys, vec!["a/b.txt", "a/c/d.txt"]);
    }

    #[tokio::test]
    async fn non_empty_bucket_cannot_be_deleted() {
        let backend = backend_with(&["keep.txt"]).await;
        assert!(matches!(
            backend.delete_bucket("docs").await,
            Err(StorageError::Conflict(_))
        ));
        backend.delete_object("docs", "keep.txt").await.unwrap();
        backend.delete_bucket("docs").await.unwrap();
        assert!(backend.list_buckets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn connector_checks_credentials() {
        let connector = MemoryConnector::with_credentials(MemoryBackend::new(), "ak", "sk");
        let mut cfg: ConnectionConfig = serde_json::from_value(serde_json::json!({
            "endpoint": "localhost", "accessKey": "ak", "secretKey": "sk"
        }))
        .unwrap();
        assert!(connector.connect(&cfg).await.is_ok());
        cfg.secret_key = "wrong".into();
        assert!(matches!(
            connector.connect(&cfg).await,
            Err(StorageError::Auth(_))
        ));
    }
}
