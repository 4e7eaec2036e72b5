//! HTTP handlers for object operations.
//! Streams object bodies out without buffering; uploads arrive as one
//! multipart file per request and are buffered before forwarding.

use crate::{
    errors::AppError,
    handlers::{connection_handlers::AckResponse, session_guard::Connected},
    models::object::{ListEntry, ObjectInfo},
    services::console_service::{BatchDeleteReport, UploadReceipt, attachment_disposition},
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;

#[derive(Debug, Default, Deserialize)]
pub struct ListObjectsQuery {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExpiryQuery {
    pub expiry: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeysReq {
    #[serde(alias = "objects")]
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresignBatchReq {
    #[serde(alias = "objects")]
    pub keys: Vec<String>,
    pub expiry: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderReq {
    pub folder_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: UploadReceipt,
}

/// `GET /buckets/{bucket}/objects?prefix=&recursive=`
pub async fn list_objects(
    Connected(session): Connected,
    Path(bucket): Path<String>,
    Query(q): Query<ListObjectsQuery>,
) -> Result<Json<Vec<ListEntry>>, AppError> {
    Ok(Json(session.list(&bucket, &q.prefix, q.recursive).await?))
}

/// `POST /buckets/{bucket}/upload` — multipart fields `file` and `prefix`.
/// The object key is `prefix` followed by the uploaded file name.
pub async fn upload_object(
    Connected(session): Connected,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut prefix = String::new();
    let mut file: Option<(String, Option<String>, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("failed to read upload: {err}")))?
    {
        match field.name() {
            Some("prefix") => {
                prefix = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(format!("invalid prefix: {err}")))?;
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| AppError::bad_request("uploaded file has no name"))?;
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(format!("failed to read file: {err}")))?;
                debug!("received {} ({} bytes)", file_name, data.len());
                file = Some((file_name, content_type, data));
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::bad_request("no file provided"))?;
    let key = format!("{prefix}{file_name}");
    let content_type = content_type
        .filter(|ct| ct != "application/octet-stream")
        .unwrap_or_else(|| {
            mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .to_string()
        });

    let receipt = session.upload(&bucket, &key, data, content_type).await?;
    Ok(Json(UploadResponse {
        success: true,
        receipt,
    }))
}

/// `GET /buckets/{bucket}/download/{*key}` — streamed as an attachment.
pub async fn download_object(
    Connected(session): Connected,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let object = session.download(&bucket, &key).await?;

    let mut response = Response::new(Body::from_stream(object.stream));
    *response.status_mut() = StatusCode::OK;
    set_object_headers(response.headers_mut(), &object.info);
    if let Ok(value) = HeaderValue::from_str(&attachment_disposition(&key)) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// `GET /preview/{bucket}/{*key}` — streamed inline, no disposition header.
pub async fn preview_object(
    Connected(session): Connected,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let object = session.download(&bucket, &key).await?;

    let mut response = Response::new(Body::from_stream(object.stream));
    *response.status_mut() = StatusCode::OK;
    set_object_headers(response.headers_mut(), &object.info);
    Ok(response)
}

/// `DELETE /buckets/{bucket}/delete/{*key}`
pub async fn delete_object(
    Connected(session): Connected,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Json<AckResponse>, AppError> {
    session.delete(&bucket, &key).await?;
    Ok(Json(AckResponse {
        success: true,
        message: format!("deleted {key}"),
    }))
}

/// `POST /buckets/{bucket}/delete-objects` — best effort; per-key failures
/// are listed in the response instead of failing the request.
pub async fn delete_objects(
    Connected(session): Connected,
    Path(bucket): Path<String>,
    Json(payload): Json<KeysReq>,
) -> Result<Json<BatchDeleteReport>, AppError> {
    Ok(Json(session.delete_many(&bucket, &payload.keys).await?))
}

/// `GET /buckets/{bucket}/stat/{*key}`
pub async fn stat_object(
    Connected(session): Connected,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Json<ObjectInfo>, AppError> {
    Ok(Json(session.stat(&bucket, &key).await?))
}

/// `GET /buckets/{bucket}/presigned/{*key}?expiry=` — defaults to one hour.
pub async fn presigned_url(
    Connected(session): Connected,
    Path((bucket, key)): Path<(String, String)>,
    Query(q): Query<ExpiryQuery>,
) -> Result<Json<PresignedUrl>, AppError> {
    let expiry = q.expiry.unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS);
    let url = session.presign(&bucket, &key, expiry).await?;
    Ok(Json(PresignedUrl { url }))
}

/// `POST /buckets/{bucket}/presigned-batch` — `{key: url | null}`.
pub async fn presigned_batch(
    Connected(session): Connected,
    Path(bucket): Path<String>,
    Json(payload): Json<PresignBatchReq>,
) -> Result<Json<BTreeMap<String, Option<String>>>, AppError> {
    let expiry = payload.expiry.unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS);
    Ok(Json(
        session
            .presign_many(&bucket, &payload.keys, expiry)
            .await?,
    ))
}

/// `POST /buckets/{bucket}/folder` — zero-byte "name/" placeholder.
pub async fn create_folder(
    Connected(session): Connected,
    Path(bucket): Path<String>,
    Json(payload): Json<CreateFolderReq>,
) -> Result<Json<AckResponse>, AppError> {
    let key = session.create_folder(&bucket, &payload.folder_name).await?;
    Ok(Json(AckResponse {
        success: true,
        message: format!("folder {key} created"),
    }))
}

fn set_object_headers(headers: &mut HeaderMap, meta: &ObjectInfo) {
    let content_type = meta
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.size.max(0)));

    if let Some(etag) = meta.etag.as_ref() {
        let quoted = format!("\"{}\"", etag);
        if let Ok(value) = HeaderValue::from_str(&quoted) {
            headers.insert(header::ETAG, value);
        }
    }

    if let Some(modified) = meta.last_modified {
        if let Ok(value) = HeaderValue::from_str(&modified.to_rfc2822()) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }
}
