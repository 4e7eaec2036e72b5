//! `POST /connect`, `POST /disconnect` and `GET /status`. These are the only
//! API routes reachable without an active connection.

use crate::{
    errors::AppError,
    models::connection::{ConnectionConfig, ConnectionStatus},
    services::console_service::ConsoleService,
};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub success: bool,
    pub message: String,
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

/// `POST /connect` — replaces the active connection on success.
pub async fn connect(
    State(service): State<ConsoleService>,
    Json(config): Json<ConnectionConfig>,
) -> Result<Json<ConnectResponse>, AppError> {
    let session = service.connect(config).await?;
    Ok(Json(ConnectResponse {
        success: true,
        message: format!("connected to {}", session.config.endpoint_url()),
        session_id: session.id,
    }))
}

/// `POST /disconnect` — always succeeds.
pub async fn disconnect(State(service): State<ConsoleService>) -> Json<AckResponse> {
    service.disconnect().await;
    Json(AckResponse {
        success: true,
        message: "disconnected".into(),
    })
}

/// `GET /status`
pub async fn status(State(service): State<ConsoleService>) -> Json<ConnectionStatus> {
    Json(service.status().await)
}
