//! HTTP client for the console's REST API, one method per endpoint.

use crate::{
    browser::pager::ListingSource,
    client::{ClientError, ClientResult},
    handlers::{
        bucket_handlers::PolicyResponse,
        connection_handlers::{AckResponse, ConnectResponse},
        object_handlers::PresignedUrl,
    },
    models::{
        bucket::Bucket,
        connection::{ConnectionConfig, ConnectionStatus},
        object::{ListEntry, ObjectInfo},
        policy::AccessLevel,
    },
    services::console_service::{BatchDeleteReport, UploadReceipt},
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, RequestBuilder, Response, Url, multipart};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use std::{collections::BTreeMap, time::Duration};

/// Every request gives up after this long. The server may still finish the
/// operation on its side.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone, Debug)]
pub struct ConsoleClient {
    http: reqwest::Client,
    base: Url,
}

impl ConsoleClient {
    /// `base_url` is the API root, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| ClientError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, base })
    }

    /// API URL made of the base path followed by `segments`. Each segment is
    /// percent-encoded on its own, so object keys keep their "/" structure.
    pub fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// URL for an object route. Keys with `.` or `..` segments are refused:
    /// URL normalization would fold them into another key.
    fn object_url(&self, route: &[&str], key: &str) -> ClientResult<Url> {
        if key.split('/').any(|segment| matches!(segment, "." | "..")) {
            return Err(ClientError::InvalidUrl(format!(
                "object key `{key}` has a `.` or `..` segment"
            )));
        }
        Ok(self.url(route.iter().copied().chain(key.split('/'))))
    }

    pub async fn connect(&self, config: &ConnectionConfig) -> ClientResult<ConnectResponse> {
        let request = self.http.post(self.url(["connect"])).json(config);
        json_response(request).await
    }

    pub async fn disconnect(&self) -> ClientResult<AckResponse> {
        json_response(self.http.post(self.url(["disconnect"]))).await
    }

    pub async fn status(&self) -> ClientResult<ConnectionStatus> {
        json_response(self.http.get(self.url(["status"]))).await
    }

    pub async fn list_buckets(&self) -> ClientResult<Vec<Bucket>> {
        json_response(self.http.get(self.url(["buckets"]))).await
    }

    pub async fn create_bucket(&self, name: &str, region: Option<&str>) -> ClientResult<AckResponse> {
        let request = self
            .http
            .post(self.url(["buckets"]))
            .json(&json!({ "name": name, "region": region }));
        json_response(request).await
    }

    pub async fn delete_bucket(&self, name: &str) -> ClientResult<AckResponse> {
        json_response(self.http.delete(self.url(["buckets", name]))).await
    }

    pub async fn get_policy(&self, bucket: &str) -> ClientResult<PolicyResponse> {
        json_response(self.http.get(self.url(["buckets", bucket, "policy"]))).await
    }

    /// Replace the policy document; an empty string clears it.
    pub async fn set_policy(&self, bucket: &str, policy: &str) -> ClientResult<AckResponse> {
        let request = self
            .http
            .put(self.url(["buckets", bucket, "policy"]))
            .json(&json!({ "policy": policy }));
        json_response(request).await
    }

    pub async fn set_access(&self, bucket: &str, level: &AccessLevel) -> ClientResult<AckResponse> {
        let request = self
            .http
            .put(self.url(["buckets", bucket, "access"]))
            .json(&json!({ "access": level.name() }));
        json_response(request).await
    }

    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> ClientResult<Vec<ListEntry>> {
        let request = self
            .http
            .get(self.url(["buckets", bucket, "objects"]))
            .query(&[("prefix", prefix), ("recursive", if recursive { "true" } else { "false" })]);
        json_response(request).await
    }

    /// Upload one file as `prefix` + `file_name`.
    pub async fn upload(
        &self,
        bucket: &str,
        prefix: &str,
        file_name: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> ClientResult<UploadReceipt> {
        let mut part = multipart::Part::bytes(body.to_vec()).file_name(file_name.to_string());
        if let Some(content_type) = content_type {
            part = part.mime_str(content_type)?;
        }
        let form = multipart::Form::new()
            .text("prefix", prefix.to_string())
            .part("file", part);
        let request = self
            .http
            .post(self.url(["buckets", bucket, "upload"]))
            .multipart(form);
        json_response(request).await
    }

    pub fn download_url(&self, bucket: &str, key: &str) -> ClientResult<Url> {
        self.object_url(&["buckets", bucket, "download"], key)
    }

    pub fn preview_url(&self, bucket: &str, key: &str) -> ClientResult<Url> {
        self.object_url(&["preview", bucket], key)
    }

    /// Fetch an object's bytes through the download endpoint.
    pub async fn download(&self, bucket: &str, key: &str) -> ClientResult<Bytes> {
        let response = send(self.http.get(self.download_url(bucket, key)?)).await?;
        Ok(response.bytes().await?)
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> ClientResult<AckResponse> {
        let url = self.object_url(&["buckets", bucket, "delete"], key)?;
        json_response(self.http.request(Method::DELETE, url)).await
    }

    pub async fn delete_objects(&self, bucket: &str, keys: &[String]) -> ClientResult<BatchDeleteReport> {
        let request = self
            .http
            .post(self.url(["buckets", bucket, "delete-objects"]))
            .json(&json!({ "keys": keys }));
        json_response(request).await
    }

    pub async fn stat(&self, bucket: &str, key: &str) -> ClientResult<ObjectInfo> {
        let url = self.object_url(&["buckets", bucket, "stat"], key)?;
        json_response(self.http.get(url)).await
    }

    pub async fn presigned_url(&self, bucket: &str, key: &str, expiry_secs: u64) -> ClientResult<String> {
        let url = self.object_url(&["buckets", bucket, "presigned"], key)?;
        let request = self.http.get(url).query(&[("expiry", expiry_secs)]);
        let body: PresignedUrl = json_response(request).await?;
        Ok(body.url)
    }

    pub async fn presigned_urls(
        &self,
        bucket: &str,
        keys: &[String],
        expiry_secs: u64,
    ) -> ClientResult<BTreeMap<String, Option<String>>> {
        let request = self
            .http
            .post(self.url(["buckets", bucket, "presigned-batch"]))
            .json(&json!({ "keys": keys, "expiry": expiry_secs }));
        json_response(request).await
    }

    pub async fn create_folder(&self, bucket: &str, folder_name: &str) -> ClientResult<AckResponse> {
        let request = self
            .http
            .post(self.url(["buckets", bucket, "folder"]))
            .json(&json!({ "folderName": folder_name }));
        json_response(request).await
    }
}

#[async_trait]
impl ListingSource for ConsoleClient {
    async fn list(&self, bucket: &str, prefix: &str, recursive: bool) -> ClientResult<Vec<ListEntry>> {
        self.list_objects(bucket, prefix, recursive).await
    }

    async fn presign_batch(
        &self,
        bucket: &str,
        keys: &[String],
        expiry_secs: u64,
    ) -> ClientResult<BTreeMap<String, Option<String>>> {
        self.presigned_urls(bucket, keys, expiry_secs).await
    }
}

/// Send and turn non-2xx answers into [`ClientError::Api`] carrying the
/// server's message.
async fn send(request: RequestBuilder) -> ClientResult<Response> {
    let response = request.send().await.map_err(ClientError::from_transport)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn json_response<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
    let response = send(request).await?;
    Ok(response.json::<T>().await?)
}
