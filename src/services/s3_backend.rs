//! `StorageBackend` over the AWS SDK, for MinIO and other S3-compatible
//! servers. Requests use path-style addressing so bucket names never have to
//! resolve as DNS labels.

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
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region, http::HttpResponse},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime as S3DateTime},
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::{fmt, sync::Arc, time::Duration};
use tokio_util::io::ReaderStream;
use tracing::debug;

const CREDENTIALS_PROVIDER: &str = "s3-console";
/// The one region where `CreateBucket` must not carry a location constraint.
const DEFAULT_LOCATION: &str = "us-east-1";

#[derive(Clone)]
pub struct S3Backend {
    client: Client,
}

impl S3Backend {
    pub fn new(config: &ConnectionConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(config.endpoint_url())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
        }
    }
}

/// Connects by building an [`S3Backend`] and listing buckets with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct S3Connector;

#[async_trait]
impl Connector for S3Connector {
    async fn connect(&self, config: &ConnectionConfig) -> StorageResult<Arc<dyn StorageBackend>> {
        let backend = S3Backend::new(config);
        backend
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| match classify(err, "probing server") {
                StorageError::Network(msg) => StorageError::Network(msg),
                other => StorageError::Auth(other.to_string()),
            })?;
        debug!("credentials accepted by {}", config.endpoint_url());
        Ok(Arc::new(backend))
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn list_buckets(&self) -> StorageResult<Vec<Bucket>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| classify(err, "listing buckets"))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|bucket| {
                bucket.name().map(|name| Bucket {
                    name: name.to_string(),
                    creation_date: bucket.creation_date().and_then(to_chrono),
                })
            })
            .collect())
    }

    async fn create_bucket(&self, name: &str, region: &str) -> StorageResult<()> {
        let mut request = self.client.create_bucket().bucket(name);
        if region != DEFAULT_LOCATION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|err| classify(err, format!("creating bucket `{name}`")))?;
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> StorageResult<()> {
        self.client
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(|err| classify(err, format!("deleting bucket `{name}`")))?;
        Ok(())
    }

    async fn get_policy(&self, bucket: &str) -> StorageResult<Option<String>> {
        match self.client.get_bucket_policy().bucket(bucket).send().await {
            Ok(response) => Ok(response
                .policy()
                .filter(|p| !p.is_empty())
                .map(str::to_string)),
            Err(err) if err.code() == Some("NoSuchBucketPolicy") => Ok(None),
            Err(err) => Err(classify(err, format!("reading policy of `{bucket}`"))),
        }
    }

    async fn put_policy(&self, bucket: &str, policy: &str) -> StorageResult<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|err| classify(err, format!("setting policy of `{bucket}`")))?;
        Ok(())
    }

    async fn delete_policy(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .delete_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| classify(err, format!("clearing policy of `{bucket}`")))?;
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> StorageResult<Vec<ListEntry>> {
        let mut entries = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
            if !recursive {
                request = request.delimiter("/");
            }
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|err| classify(err, format!("listing `{bucket}`")))?;

            entries.extend(
                response
                    .common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix())
                    .map(|prefix| ListEntry::Prefix {
                        prefix: prefix.to_string(),
                    }),
            );
            entries.extend(response.contents().iter().map(|obj| {
                ListEntry::Object(ObjectInfo {
                    key: obj.key().unwrap_or_default().to_string(),
                    size: obj.size().unwrap_or(0),
                    last_modified: obj.last_modified().and_then(to_chrono),
                    etag: obj.e_tag().map(unquote_etag),
                    content_type: None,
                })
            }));

            if !response.is_truncated().unwrap_or(false) {
                break;
            }
            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(entries)
    }

    async fn put_object(&self, bucket: &str, key: &str, object: PutObject) -> StorageResult<()> {
        let length = object.body.len() as i64;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(object.content_type)
            .content_length(length)
            .content_md5(object.content_md5)
            .body(ByteStream::from(object.body))
            .send()
            .await
            .map_err(|err| classify(err, format!("uploading `{key}`")))?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(err, format!("object `{key}` in `{bucket}`")))?;

        let info = ObjectInfo {
            key: key.to_string(),
            size: response.content_length().unwrap_or(0),
            last_modified: response.last_modified().and_then(to_chrono),
            etag: response.e_tag().map(unquote_etag),
            content_type: response.content_type().map(str::to_string),
        };
        let stream = ReaderStream::new(response.body.into_async_read()).boxed();

        Ok(ObjectBody { info, stream })
    }

    async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectInfo> {
        let response = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(err, format!("object `{key}` in `{bucket}`")))?;

        Ok(ObjectInfo {
            key: key.to_string(),
            size: response.content_length().unwrap_or(0),
            last_modified: response.last_modified().and_then(to_chrono),
            etag: response.e_tag().map(unquote_etag),
            content_type: response.content_type().map(str::to_string),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify(err, format!("deleting `{key}`")))?;
        Ok(())
    }

    async fn presign_get(&self, bucket: &str, key: &str, ttl: Duration) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|err| StorageError::Validation(err.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| classify(err, format!("presigning `{key}`")))?;
        Ok(request.uri().to_string())
    }
}

/// Sort an SDK failure into the console's error categories by its S3 error
/// code, falling back to the HTTP status for body-less (HEAD) responses.
///
/// `AccessDenied` and bare 403s pass through: on a live session they mean the
/// credentials lack a permission, not that they are wrong.
fn classify<E>(err: SdkError<E, HttpResponse>, context: impl fmt::Display) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let message = format!("{context}: {}", DisplayErrorContext(&err));
    if matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    ) {
        return StorageError::Network(message);
    }

    let status = err.raw_response().map(|raw| raw.status().as_u16());
    match err.code() {
        Some("NoSuchBucket" | "NoSuchKey" | "NotFound" | "NoSuchBucketPolicy") => {
            StorageError::NotFound(message)
        }
        Some("BucketNotEmpty" | "BucketAlreadyExists" | "BucketAlreadyOwnedByYou") => {
            StorageError::Conflict(message)
        }
        Some("InvalidAccessKeyId" | "SignatureDoesNotMatch" | "InvalidToken") => {
            StorageError::Auth(message)
        }
        Some("InvalidBucketName" | "InvalidArgument" | "MalformedPolicy" | "InvalidDigest") => {
            StorageError::Validation(message)
        }
        _ if status == Some(404) => StorageError::NotFound(message),
        _ => StorageError::Passthrough(message),
    }
}

fn to_chrono(dt: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

fn unquote_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}
