//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::user::{CreateUser, LoginRequest, LoginResponse, UserInfo},
    AppState,
};

use super::AuthenticatedUser;

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User registered", body = UserInfo),
        (status = 400, description = "Invalid request"),
        (status = 400, description = "Username already exists")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    let user = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = state
        .services
        .users
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(response))
}

/// Get the currently authenticated user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<UserInfo>> {
    let user = state.services.users.get(actor.id).await?;
    Ok(Json(user))
}
