//! User management endpoints (admin only)

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::user::{Role, UpdateUser, UserInfo},
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = Vec<UserInfo>),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<UserInfo>>> {
    actor.require_role(&[Role::Admin])?;
    let users = state.services.users.list().await?;
    Ok(Json(users))
}

/// Update a user's role or password
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserInfo),
        (status = 400, description = "Nothing to update"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUser>,
) -> AppResult<Json<UserInfo>> {
    actor.require_role(&[Role::Admin])?;
    let user = state.services.users.update(id, request).await?;
    Ok(Json(user))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Cannot delete own account"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    actor.require_role(&[Role::Admin])?;
    state.services.users.delete(&actor, id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}
