//! Defines routes for the console's REST API.
//!
//! ## Structure
//! - **Connection endpoints** (no connection required)
//!   - `POST /api/connect`, `POST /api/disconnect`, `GET /api/status`
//!
//! - **Bucket endpoints**
//!   - `GET|POST /api/buckets`, `DELETE /api/buckets/{bucket}`
//!   - `GET|PUT  /api/buckets/{bucket}/policy`, `PUT /api/buckets/{bucket}/access`
//!
//! - **Object endpoints**
//!   - `GET    /api/buckets/{bucket}/objects` — list (prefix, recursive)
//!   - `POST   /api/buckets/{bucket}/upload` — multipart upload
//!   - `GET    /api/buckets/{bucket}/download/{*key}` — attachment download
//!   - `GET    /api/preview/{bucket}/{*key}` — inline body
//!   - `DELETE /api/buckets/{bucket}/delete/{*key}`
//!   - `POST   /api/buckets/{bucket}/delete-objects` — batch delete
//!   - `GET    /api/buckets/{bucket}/stat/{*key}`
//!   - `GET    /api/buckets/{bucket}/presigned/{*key}`
//!   - `POST   /api/buckets/{bucket}/presigned-batch`
//!   - `POST   /api/buckets/{bucket}/folder`
//!
//! Bucket and object handlers take the `Connected` extractor, so they answer
//! 401 while no connection is active. The wildcard `*key` allows nested keys
//! like `photos/2025/img.jpg`.

use crate::{
    handlers::{
        bucket_handlers::{
            create_bucket, delete_bucket, get_policy, list_buckets, put_policy, set_access,
        },
        connection_handlers::{connect, disconnect, status},
        health_handlers::{healthz, readyz},
        object_handlers::{
            create_folder, delete_object, delete_objects, download_object, list_objects,
            presigned_batch, presigned_url, preview_object, stat_object, upload_object,
        },
    },
    services::console_service::ConsoleService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};
use std::path::Path;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// Build the `/api` router.
///
/// `max_upload_bytes` bounds the multipart upload body, which is buffered in
/// memory before it is forwarded.
pub fn api_routes(max_upload_bytes: usize) -> Router<ConsoleService> {
    Router::new()
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .route("/status", get(status))
        // Bucket-level routes
        .route("/buckets", get(list_buckets).post(create_bucket))
        .route("/buckets/{bucket}", delete(delete_bucket))
        .route("/buckets/{bucket}/policy", get(get_policy).put(put_policy))
        .route("/buckets/{bucket}/access", put(set_access))
        // Object-level routes
        .route("/buckets/{bucket}/objects", get(list_objects))
        .route(
            "/buckets/{bucket}/upload",
            post(upload_object).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/buckets/{bucket}/download/{*key}", get(download_object))
        .route("/preview/{bucket}/{*key}", get(preview_object))
        .route("/buckets/{bucket}/delete/{*key}", delete(delete_object))
        .route("/buckets/{bucket}/delete-objects", post(delete_objects))
        .route("/buckets/{bucket}/stat/{*key}", get(stat_object))
        .route("/buckets/{bucket}/presigned/{*key}", get(presigned_url))
        .route("/buckets/{bucket}/presigned-batch", post(presigned_batch))
        .route("/buckets/{bucket}/folder", post(create_folder))
}

/// Build the complete application: health probes, the API under `/api`,
/// optional single-page-app hosting, CORS and request tracing.
///
/// With `static_dir`, unknown paths are answered from that directory and fall
/// back to its `index.html` so client-side routes survive a reload.
pub fn app(service: ConsoleService, max_upload_bytes: usize, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api", api_routes(max_upload_bytes));

    if let Some(dir) = static_dir {
        let index = dir.join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
