//! HTTP handlers for bucket management and bucket policies.

use crate::{
    errors::AppError,
    handlers::{connection_handlers::AckResponse, session_guard::Connected},
    models::{bucket::Bucket, connection::DEFAULT_REGION, policy::AccessLevel},
};
use axum::{Json, body::Bytes, extract::Path};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBucketReq {
    #[serde(alias = "bucketName")]
    pub name: String,
    pub region: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PolicyReq {
    #[serde(default)]
    pub policy: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PolicyResponse {
    pub policy: String,
    /// Classified level: private, public-read, public-read-write or custom.
    pub access: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessReq {
    pub access: String,
}

/// `GET /buckets`
pub async fn list_buckets(Connected(session): Connected) -> Result<Json<Vec<Bucket>>, AppError> {
    Ok(Json(session.list_buckets().await?))
}

/// `POST /buckets` — region defaults to us-east-1.
pub async fn create_bucket(
    Connected(session): Connected,
    Json(payload): Json<CreateBucketReq>,
) -> Result<Json<AckResponse>, AppError> {
    let region = payload
        .region
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());
    session.create_bucket(&payload.name, &region).await?;
    Ok(Json(AckResponse {
        success: true,
        message: format!("bucket {} created", payload.name),
    }))
}

/// `DELETE /buckets/{bucket}` — the server refuses non-empty buckets.
pub async fn delete_bucket(
    Connected(session): Connected,
    Path(bucket): Path<String>,
) -> Result<Json<AckResponse>, AppError> {
    session.delete_bucket(&bucket).await?;
    Ok(Json(AckResponse {
        success: true,
        message: format!("bucket {bucket} deleted"),
    }))
}

/// `GET /buckets/{bucket}/policy` — empty string when no policy is attached.
pub async fn get_policy(
    Connected(session): Connected,
    Path(bucket): Path<String>,
) -> Result<Json<PolicyResponse>, AppError> {
    let policy = session.get_policy(&bucket).await?;
    let access = AccessLevel::parse(&policy).name().to_string();
    Ok(Json(PolicyResponse { policy, access }))
}

/// `PUT /buckets/{bucket}/policy` — an empty body, a null or an empty
/// `policy` field clears the policy.
pub async fn put_policy(
    Connected(session): Connected,
    Path(bucket): Path<String>,
    body: Bytes,
) -> Result<Json<AckResponse>, AppError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        PolicyReq::default()
    } else {
        serde_json::from_slice::<PolicyReq>(&body)
            .map_err(|err| AppError::bad_request(format!("invalid policy request: {err}")))?
    };

    session
        .set_policy(&bucket, request.policy.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(AckResponse {
        success: true,
        message: "policy updated".into(),
    }))
}

/// `PUT /buckets/{bucket}/access` — apply a canned access level.
pub async fn set_access(
    Connected(session): Connected,
    Path(bucket): Path<String>,
    Json(payload): Json<AccessReq>,
) -> Result<Json<AckResponse>, AppError> {
    let level = AccessLevel::from_canned_name(&payload.access)?;
    session.set_access(&bucket, &level).await?;
    Ok(Json(AckResponse {
        success: true,
        message: format!("access set to {level}"),
    }))
}
