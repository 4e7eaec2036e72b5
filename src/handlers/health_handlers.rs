//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness; probes the storage server when connected

use crate::services::console_service::ConsoleService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// With no active connection the console is ready to accept one and reports
/// 200. With a connection, a bucket listing must succeed; otherwise the
/// response is 503 with the storage error.
pub async fn readyz(State(service): State<ConsoleService>) -> impl IntoResponse {
    let (connected, storage_check) = match service.session().await {
        Ok(session) => match session.list_buckets().await {
            Ok(_) => (true, CheckStatus { ok: true, error: None }),
            Err(e) => (
                true,
                CheckStatus {
                    ok: false,
                    error: Some(e.to_string()),
                },
            ),
        },
        Err(_) => (
            false,
            CheckStatus {
                ok: true,
                error: None,
            },
        ),
    };

    let overall_ok = storage_check.ok;
    let mut checks = HashMap::new();
    checks.insert("storage", storage_check);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        connected,
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    connected: bool,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
