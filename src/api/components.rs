//! Component endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        component::{Component, CreateComponent, UpdateComponent},
        user::Role,
    },
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

/// List all components
#[utoipa::path(
    get,
    path = "/components",
    tag = "components",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All components", body = Vec<Component>)
    )
)]
pub async fn list_components(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
) -> AppResult<Json<Vec<Component>>> {
    let components = state.services.components.list().await?;
    Ok(Json(components))
}

/// List the components of one machine, sorted by name
#[utoipa::path(
    get,
    path = "/machines/{id}/components",
    tag = "components",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Machine ID")),
    responses(
        (status = 200, description = "Components of the machine", body = Vec<Component>)
    )
)]
pub async fn list_machine_components(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
    Path(machine_id): Path<i64>,
) -> AppResult<Json<Vec<Component>>> {
    let components = state
        .services
        .components
        .list_by_machine(machine_id)
        .await?;
    Ok(Json(components))
}

/// Create a component under a machine
#[utoipa::path(
    post,
    path = "/machines/{id}/components",
    tag = "components",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Machine ID")),
    request_body = CreateComponent,
    responses(
        (status = 201, description = "Component created", body = Component),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Machine not found")
    )
)]
pub async fn create_component(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(machine_id): Path<i64>,
    Json(request): Json<CreateComponent>,
) -> AppResult<(StatusCode, Json<Component>)> {
    actor.require_role(Role::WORKERS)?;
    let component = state
        .services
        .components
        .create(machine_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(component)))
}

/// Update a component; absent fields are left untouched
#[utoipa::path(
    put,
    path = "/components/{id}",
    tag = "components",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Component ID")),
    request_body = UpdateComponent,
    responses(
        (status = 200, description = "Component updated", body = Component),
        (status = 400, description = "Nothing to update"),
        (status = 404, description = "Component not found")
    )
)]
pub async fn update_component(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateComponent>,
) -> AppResult<Json<Component>> {
    actor.require_role(Role::WORKERS)?;
    let component = state.services.components.update(id, request).await?;
    Ok(Json(component))
}

/// Delete a component
#[utoipa::path(
    delete,
    path = "/components/{id}",
    tag = "components",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Component ID")),
    responses(
        (status = 200, description = "Component deleted", body = MessageResponse),
        (status = 404, description = "Component not found")
    )
)]
pub async fn delete_component(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    actor.require_role(Role::WORKERS)?;
    state.services.components.delete(id).await?;
    Ok(Json(MessageResponse::new("Component deleted")))
}
