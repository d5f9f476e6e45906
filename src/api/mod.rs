//! API handlers for the CMMS REST endpoints

pub mod auth;
pub mod components;
pub mod health;
pub mod machines;
pub mod openapi;
pub mod schedules;
pub mod stats;
pub mod users;
pub mod work_orders;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{error::AppError, models::user::Actor, AppState};

/// Extractor for the authenticated actor from a bearer token
pub struct AuthenticatedUser(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Authentication("Invalid authorization header format".to_string())
        })?;

        let actor = state.services.users.authenticate(token)?;
        Ok(AuthenticatedUser(actor))
    }
}

/// Generic message response
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
