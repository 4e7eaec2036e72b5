//! src/services/console_service.rs
//!
//! ConsoleService — owns the single active connection to a storage server
//! and exposes every console operation on it. Handlers never see the backend
//! directly: they obtain a [`Session`] (or `NotConnected`) and call its
//! methods, which validate input before delegating to the backend.

use crate::{
    errors::{StorageError, StorageResult},
    models::{
        bucket::Bucket,
        connection::{ConnectionConfig, ConnectionStatus},
        object::{ListEntry, ObjectBody, ObjectInfo, file_name},
        policy::AccessLevel,
    },
    services::{
        backend::{Connector, PutObject, StorageBackend},
        validation::{
            ensure_bucket_name_safe, ensure_key_safe, ensure_presign_ttl, ensure_region_valid,
        },
    },
};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared application state: the connector used to open sessions and the
/// slot holding the current one.
#[derive(Clone)]
pub struct ConsoleService {
    connector: Arc<dyn Connector>,
    session: Arc<RwLock<Option<Arc<Session>>>>,
}

/// One live connection. Replaced wholesale by each successful connect.
pub struct Session {
    pub id: Uuid,
    pub config: ConnectionConfig,
    pub connected_at: DateTime<Utc>,
    backend: Arc<dyn StorageBackend>,
}

/// Outcome of a batch delete. Keys that failed are reported with the reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteReport {
    pub deleted: usize,
    pub failed: BTreeMap<String, String>,
}

/// Metadata returned for a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub key: String,
    pub size: usize,
    pub etag: String,
    pub content_type: String,
}

impl ConsoleService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Validate `config`, prove it against the server and make it the active
    /// session. On failure the previous session, if any, stays in place.
    pub async fn connect(&self, config: ConnectionConfig) -> StorageResult<Arc<Session>> {
        config.validate()?;
        ensure_region_valid(&config.region)?;

        let backend = self
            .connector
            .connect(&config)
            .await
            .inspect_err(|err| warn!("connect to {} failed: {}", config.endpoint_url(), err))?;

        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            config,
            connected_at: Utc::now(),
            backend,
        });
        *self.session.write().await = Some(session.clone());
        info!(
            "connected to {} (session {})",
            session.config.endpoint_url(),
            session.id
        );
        Ok(session)
    }

    pub async fn disconnect(&self) {
        if let Some(previous) = self.session.write().await.take() {
            info!("disconnected session {}", previous.id);
        }
    }

    /// The active session, or `NotConnected`.
    pub async fn session(&self) -> StorageResult<Arc<Session>> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(StorageError::NotConnected)
    }

    pub async fn status(&self) -> ConnectionStatus {
        match self.session.read().await.as_ref() {
            Some(session) => ConnectionStatus {
                connected: true,
                config: Some(session.config.summary()),
                session_id: Some(session.id),
                connected_at: Some(session.connected_at),
            },
            None => ConnectionStatus {
                connected: false,
                config: None,
                session_id: None,
                connected_at: None,
            },
        }
    }
}

impl Session {
    pub async fn list_buckets(&self) -> StorageResult<Vec<Bucket>> {
        self.backend.list_buckets().await
    }

    pub async fn create_bucket(&self, name: &str, region: &str) -> StorageResult<()> {
        ensure_bucket_name_safe(name)?;
        ensure_region_valid(region)?;
        self.backend.create_bucket(name, region).await?;
        info!("created bucket {} in {}", name, region);
        Ok(())
    }

    pub async fn delete_bucket(&self, name: &str) -> StorageResult<()> {
        ensure_bucket_name_safe(name)?;
        self.backend.delete_bucket(name).await?;
        info!("deleted bucket {}", name);
        Ok(())
    }

    /// The bucket's policy document; empty when none is attached.
    pub async fn get_policy(&self, bucket: &str) -> StorageResult<String> {
        ensure_bucket_name_safe(bucket)?;
        Ok(self.backend.get_policy(bucket).await?.unwrap_or_default())
    }

    /// Replace the policy wholesale. An empty document removes it.
    pub async fn set_policy(&self, bucket: &str, policy: &str) -> StorageResult<()> {
        ensure_bucket_name_safe(bucket)?;
        if policy.trim().is_empty() {
            self.backend.delete_policy(bucket).await
        } else {
            self.backend.put_policy(bucket, policy).await
        }
    }

    pub async fn set_access(&self, bucket: &str, level: &AccessLevel) -> StorageResult<()> {
        self.set_policy(bucket, &level.to_policy(bucket)).await?;
        info!("bucket {} access set to {}", bucket, level);
        Ok(())
    }

    pub async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> StorageResult<Vec<ListEntry>> {
        ensure_bucket_name_safe(bucket)?;
        let entries = self.backend.list_objects(bucket, prefix, recursive).await?;
        debug!(
            "listed {} entries in {} (prefix {:?}, recursive {})",
            entries.len(),
            bucket,
            prefix,
            recursive
        );
        Ok(entries)
    }

    /// Store a fully buffered body under `key`.
    pub async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: String,
    ) -> StorageResult<UploadReceipt> {
        ensure_bucket_name_safe(bucket)?;
        ensure_key_safe(key)?;

        let digest = md5::compute(&body);
        let receipt = UploadReceipt {
            key: key.to_string(),
            size: body.len(),
            etag: format!("{:x}", digest),
            content_type: content_type.clone(),
        };
        self.backend
            .put_object(
                bucket,
                key,
                PutObject {
                    body,
                    content_type,
                    content_md5: general_purpose::STANDARD.encode(digest.0),
                },
            )
            .await?;
        info!("uploaded {}/{} ({} bytes)", bucket, key, receipt.size);
        Ok(receipt)
    }

    /// Create the zero-byte placeholder that makes `name` show up as a folder.
    pub async fn create_folder(&self, bucket: &str, name: &str) -> StorageResult<String> {
        let trimmed = name.trim();
        if trimmed.trim_matches('/').is_empty() {
            return Err(StorageError::Validation("folder name is required".into()));
        }
        let key = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        self.upload(bucket, &key, Bytes::new(), "application/x-directory".into())
            .await?;
        Ok(key)
    }

    pub async fn download(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody> {
        ensure_bucket_name_safe(bucket)?;
        ensure_key_safe(key)?;
        self.backend.get_object(bucket, key).await
    }

    pub async fn stat(&self, bucket: &str, key: &str) -> StorageResult<ObjectInfo> {
        ensure_bucket_name_safe(bucket)?;
        ensure_key_safe(key)?;
        self.backend.head_object(bucket, key).await
    }

    pub async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        ensure_bucket_name_safe(bucket)?;
        ensure_key_safe(key)?;
        self.backend.delete_object(bucket, key).await?;
        info!("deleted {}/{}", bucket, key);
        Ok(())
    }

    /// Delete every key concurrently. A failing key never stops the others.
    pub async fn delete_many(&self, bucket: &str, keys: &[String]) -> StorageResult<BatchDeleteReport> {
        ensure_bucket_name_safe(bucket)?;
        let results = join_all(keys.iter().map(|key| async move {
            let outcome = match ensure_key_safe(key) {
                Ok(()) => self.backend.delete_object(bucket, key).await,
                Err(err) => Err(err),
            };
            (key, outcome)
        }))
        .await;

        let mut report = BatchDeleteReport::default();
        for (key, outcome) in results {
            match outcome {
                Ok(()) => report.deleted += 1,
                Err(err) => {
                    warn!("batch delete of {}/{} failed: {}", bucket, key, err);
                    report.failed.insert(key.clone(), err.to_string());
                }
            }
        }
        info!(
            "batch delete in {}: {} deleted, {} failed",
            bucket,
            report.deleted,
            report.failed.len()
        );
        Ok(report)
    }

    /// A GET URL for `key` valid for `ttl_secs`. Missing objects are
    /// `NotFound` rather than a URL that would 404 later.
    pub async fn presign(&self, bucket: &str, key: &str, ttl_secs: u64) -> StorageResult<String> {
        ensure_presign_ttl(ttl_secs)?;
        self.stat(bucket, key).await?;
        self.backend
            .presign_get(bucket, key, Duration::from_secs(ttl_secs))
            .await
    }

    /// Presign every key concurrently; failures become `None`.
    pub async fn presign_many(
        &self,
        bucket: &str,
        keys: &[String],
        ttl_secs: u64,
    ) -> StorageResult<BTreeMap<String, Option<String>>> {
        ensure_bucket_name_safe(bucket)?;
        ensure_presign_ttl(ttl_secs)?;
        let results = join_all(keys.iter().map(|key| async move {
            let url = match self.presign(bucket, key, ttl_secs).await {
                Ok(url) => Some(url),
                Err(err) => {
                    debug!("presign of {}/{} failed: {}", bucket, key, err);
                    None
                }
            };
            (key.clone(), url)
        }))
        .await;
        Ok(results.into_iter().collect())
    }
}

/// `Content-Disposition` value for downloading `key` as a file.
pub fn attachment_disposition(key: &str) -> String {
    let name = file_name(key).replace(['"', '\\'], "_");
    format!("attachment; filename=\"{name}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_backend::{MemoryBackend, MemoryConnector};
    use serde_json::json;

    fn config(secret: &str) -> ConnectionConfig {
        serde_json::from_value(json!({
            "endpoint": "localhost",
            "port": 9000,
            "accessKey": "minioadmin",
            "secretKey": secret,
        }))
        .unwrap()
    }

    async fn connected() -> (ConsoleService, Arc<Session>) {
        let service = ConsoleService::new(Arc::new(MemoryConnector::new(MemoryBackend::new())));
        let session = service.connect(config("minioadmin")).await.unwrap();
        session.create_bucket("test-bucket", "us-east-1").await.unwrap();
        (service, session)
    }

    #[tokio::test]
    async fn operations_require_a_session() {
        let service = ConsoleService::new(Arc::new(MemoryConnector::new(MemoryBackend::new())));
        assert!(matches!(
            service.session().await,
            Err(StorageError::NotConnected)
        ));
        assert!(!service.status().await.connected);
    }

    #[tokio::test]
    async fn failed_connect_keeps_the_previous_session() {
        let (service, session) = connected().await;
        let err = service.connect(config("nope")).await.err().unwrap();
        assert!(matches!(err, StorageError::Auth(_)));
        assert_eq!(service.session().await.unwrap().id, session.id);

        service.disconnect().await;
        assert!(service.session().await.is_err());
    }

    #[tokio::test]
    async fn status_reports_a_redacted_config() {
        let (service, session) = connected().await;
        let status = service.status().await;
        assert!(status.connected);
        assert_eq!(status.session_id, Some(session.id));
        let summary = status.config.unwrap();
        assert_eq!(summary.endpoint, "localhost");
        assert_eq!(summary.port, 9000);
        assert!(!summary.use_tls);
    }

    #[tokio::test]
    async fn policy_round_trip_through_access_levels() {
        let (_, session) = connected().await;
        assert_eq!(session.get_policy("test-bucket").await.unwrap(), "");

        session
            .set_access("test-bucket", &AccessLevel::PublicReadWrite)
            .await
            .unwrap();
        let doc = session.get_policy("test-bucket").await.unwrap();
        assert_eq!(AccessLevel::parse(&doc), AccessLevel::PublicReadWrite);

        session
            .set_access("test-bucket", &AccessLevel::Private)
            .await
            .unwrap();
        assert_eq!(session.get_policy("test-bucket").await.unwrap(), "");
    }

    #[tokio::test]
    async fn upload_reports_md5_etag() {
        let (_, session) = connected().await;
        let receipt = session
            .upload(
                "test-bucket",
                "notes/hello.txt",
                Bytes::from_static(b"hello"),
                "text/plain".into(),
            )
            .await
            .unwrap();
        assert_eq!(receipt.etag, "5d41402abc4b2a76b9719d911017c592");
        let info = session.stat("test-bucket", "notes/hello.txt").await.unwrap();
        assert_eq!(info.size, 5);
        assert_eq!(info.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn folders_are_slash_terminated_placeholders() {
        let (_, session) = connected().await;
        let key = session.create_folder("test-bucket", "photos").await.unwrap();
        assert_eq!(key, "photos/");
        assert!(session
            .stat("test-bucket", "photos/")
            .await
            .unwrap()
            .is_folder_placeholder());
        assert!(matches!(
            session.create_folder("test-bucket", " / ").await,
            Err(StorageError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn batch_presign_nulls_missing_keys() {
        let (_, session) = connected().await;
        session
            .upload("test-bucket", "x", Bytes::from_static(b"1"), "text/plain".into())
            .await
            .unwrap();
        let urls = session
            .presign_many("test-bucket", &["x".to_string(), "y".to_string()], 3600)
            .await
            .unwrap();
        assert!(urls["x"].is_some());
        assert_eq!(urls["y"], None);
    }

    #[tokio::test]
    async fn batch_delete_reports_failures_per_key() {
        let (_, session) = connected().await;
        session
            .upload("test-bucket", "a.txt", Bytes::from_static(b"1"), "text/plain".into())
            .await
            .unwrap();
        let report = session
            .delete_many("test-bucket", &["a.txt".to_string(), String::new()])
            .await
            .unwrap();
        assert_eq!(report.deleted, 1);
        assert!(report.failed.contains_key(""));
    }

    #[test]
    fn disposition_uses_the_base_name() {
        assert_eq!(
            attachment_disposition("dir/sub/report \"q1\".pdf"),
            "attachment; filename=\"report _q1_.pdf\""
        );
    }
}
