//! Machine endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        machine::{CreateMachine, Machine, UpdateMachine},
        user::Role,
    },
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

/// List all machines, newest first
#[utoipa::path(
    get,
    path = "/machines",
    tag = "machines",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All machines", body = Vec<Machine>)
    )
)]
pub async fn list_machines(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
) -> AppResult<Json<Vec<Machine>>> {
    let machines = state.services.machines.list().await?;
    Ok(Json(machines))
}

/// Get a single machine
#[utoipa::path(
    get,
    path = "/machines/{id}",
    tag = "machines",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Machine ID")),
    responses(
        (status = 200, description = "Machine", body = Machine),
        (status = 404, description = "Machine not found")
    )
)]
pub async fn get_machine(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Machine>> {
    let machine = state.services.machines.get(id).await?;
    Ok(Json(machine))
}

/// Create a machine
#[utoipa::path(
    post,
    path = "/machines",
    tag = "machines",
    security(("bearer_auth" = [])),
    request_body = CreateMachine,
    responses(
        (status = 201, description = "Machine created", body = Machine),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_machine(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(request): Json<CreateMachine>,
) -> AppResult<(StatusCode, Json<Machine>)> {
    actor.require_role(&[Role::Admin])?;
    let machine = state.services.machines.create(request).await?;
    Ok((StatusCode::CREATED, Json(machine)))
}

/// Update a machine; blank fields are left untouched
#[utoipa::path(
    put,
    path = "/machines/{id}",
    tag = "machines",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Machine ID")),
    request_body = UpdateMachine,
    responses(
        (status = 200, description = "Machine updated", body = Machine),
        (status = 400, description = "Nothing to update"),
        (status = 404, description = "Machine not found")
    )
)]
pub async fn update_machine(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateMachine>,
) -> AppResult<Json<Machine>> {
    actor.require_role(Role::SUPERVISORS)?;
    let machine = state.services.machines.update(id, request).await?;
    Ok(Json(machine))
}

/// Delete a machine and all of its components
#[utoipa::path(
    delete,
    path = "/machines/{id}",
    tag = "machines",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Machine ID")),
    responses(
        (status = 200, description = "Machine and components deleted", body = MessageResponse),
        (status = 404, description = "Machine not found")
    )
)]
pub async fn delete_machine(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    actor.require_role(&[Role::Admin])?;
    let removed = state.services.machines.delete(id).await?;
    Ok(Json(MessageResponse::new(format!(
        "Machine deleted together with {} component(s)",
        removed
    ))))
}
