//! Extractor that admits a request only while a storage connection is active.

use crate::{
    errors::AppError,
    services::console_service::{ConsoleService, Session},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// The active [`Session`]. Handlers taking this extractor answer
/// `401 Unauthorized` when nothing is connected, before any other extractor
/// or storage call runs.
pub struct Connected(pub Arc<Session>);

impl FromRequestParts<ConsoleService> for Connected {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        service: &ConsoleService,
    ) -> Result<Self, Self::Rejection> {
        let session = service.session().await?;
        Ok(Connected(session))
    }
}
