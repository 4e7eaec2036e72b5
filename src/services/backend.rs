//! The seam between the console and a concrete storage SDK.

use crate::{
    errors::StorageResult,
    models::{
        bucket::Bucket,
        connection::ConnectionConfig,
        object::{ListEntry, ObjectBody, ObjectInfo},
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use std::{sync::Arc, time::Duration};

/// A body to store, together with the headers the server should record.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub body: Bytes,
    pub content_type: String,
    /// Base64 MD5 of `body`, sent as `Content-MD5`.
    pub content_md5: String,
}

/// Raw storage operations. Implementations translate their SDK's failures
/// into [`StorageError`](crate::errors::StorageError) categories and perform
/// no validation of their own.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn list_buckets(&self) -> StorageResult<Vec<Bucket>>;

    async fn create_bucket(&self, name: &str, region: &str) -> StorageResult<()>;

    /// Fails with `Conflict` when the bucket still holds objects.
    async fn delete_bucket(&self, name: &str) -> StorageResult<()>;

    /// `None` when the bucket has no policy attached.
    async fn get_policy(&self, bucket: &str) -> StorageResult<Option<String>>;

    async fn put_policy(&self, bucket: &str, policy: &str) -> StorageResult<()>;

    async fn delete_policy(&self, bucket: &str) -> StorageResult<()>;

    /// Complete listing under `prefix`. Non-recursive listings group deeper
    /// keys into [`ListEntry::Prefix`] entries on "/".
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> StorageResult<Vec<ListEntry>>;

    async fn put_object(&self, bucket: &str, key: &str, object: PutObject) -> StorageResult<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody>;

    async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectInfo>;

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;

    async fn presign_get(&self, bucket: &str, key: &str, ttl: Duration) -> StorageResult<String>;
}

/// Builds a backend for a connection request and proves the credentials work.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ConnectionConfig) -> StorageResult<Arc<dyn StorageBackend>>;
}
