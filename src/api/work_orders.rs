//! Work order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{
        user::Role,
        work_order::{
            CreateWorkOrder, UpdateStatus, WorkOrder, WorkOrderDetail, WorkOrderSummary,
        },
    },
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    /// Filter by lifecycle status
    pub status: Option<String>,
}

/// List active work orders, newest first (capped at 50)
#[utoipa::path(
    get,
    path = "/workorders",
    tag = "workorders",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Active work orders", body = Vec<WorkOrderSummary>),
        (status = 400, description = "Invalid status filter")
    )
)]
pub async fn list_work_orders(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<WorkOrderSummary>>> {
    let work_orders = state.services.work_orders.list(query.status).await?;
    Ok(Json(work_orders))
}

/// Create a work order
#[utoipa::path(
    post,
    path = "/workorders",
    tag = "workorders",
    security(("bearer_auth" = [])),
    request_body = CreateWorkOrder,
    responses(
        (status = 201, description = "Work order created", body = WorkOrder),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Machine or component not found")
    )
)]
pub async fn create_work_order(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(request): Json<CreateWorkOrder>,
) -> AppResult<(StatusCode, Json<WorkOrder>)> {
    actor.require_role(Role::WORKERS)?;
    let work_order = state.services.work_orders.create(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(work_order)))
}

/// Get a single work order with full history
#[utoipa::path(
    get,
    path = "/workorders/{id}",
    tag = "workorders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order", body = WorkOrderDetail),
        (status = 404, description = "Work order not found")
    )
)]
pub async fn get_work_order(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<WorkOrderDetail>> {
    let detail = state.services.work_orders.get(id).await?;
    Ok(Json(detail))
}

/// Delete a work order
#[utoipa::path(
    delete,
    path = "/workorders/{id}",
    tag = "workorders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order deleted", body = MessageResponse),
        (status = 404, description = "Work order not found")
    )
)]
pub async fn delete_work_order(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    actor.require_role(Role::SUPERVISORS)?;
    state.services.work_orders.delete(id).await?;
    Ok(Json(MessageResponse::new("Work order deleted")))
}

/// Exclusively claim an open work order
#[utoipa::path(
    post,
    path = "/workorders/{id}/claim",
    tag = "workorders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order claimed", body = WorkOrder),
        (status = 400, description = "No longer claimable"),
        (status = 403, description = "Already claimed by someone else"),
        (status = 404, description = "Work order not found")
    )
)]
pub async fn claim_work_order(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<WorkOrder>> {
    actor.require_role(Role::WORKERS)?;
    let work_order = state.services.work_orders.claim(&actor, id).await?;
    Ok(Json(work_order))
}

/// Change the status of a work order
#[utoipa::path(
    put,
    path = "/workorders/{id}/status",
    tag = "workorders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Work order ID")),
    request_body = UpdateStatus,
    responses(
        (status = 200, description = "Status updated", body = WorkOrder),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Not owner, or closing without supervisor role"),
        (status = 404, description = "Work order not found")
    )
)]
pub async fn update_work_order_status(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatus>,
) -> AppResult<Json<WorkOrder>> {
    actor.require_role(Role::WORKERS)?;
    let work_order = state
        .services
        .work_orders
        .update_status(&actor, id, request)
        .await?;
    Ok(Json(work_order))
}

/// Archive a completed or closed work order
#[utoipa::path(
    post,
    path = "/workorders/{id}/archive",
    tag = "workorders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order archived", body = MessageResponse),
        (status = 400, description = "Not completed or closed"),
        (status = 404, description = "Work order not found")
    )
)]
pub async fn archive_work_order(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    actor.require_role(Role::SUPERVISORS)?;
    state.services.work_orders.archive(id).await?;
    Ok(Json(MessageResponse::new("Work order archived")))
}

/// List archived work orders
#[utoipa::path(
    get,
    path = "/workorders/archive",
    tag = "workorders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Archived work orders", body = Vec<WorkOrderSummary>)
    )
)]
pub async fn list_archived_work_orders(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<WorkOrderSummary>>> {
    actor.require_role(Role::WORKERS)?;
    let work_orders = state.services.work_orders.list_archive().await?;
    Ok(Json(work_orders))
}

/// Restore an archived work order to the active set
#[utoipa::path(
    post,
    path = "/workorders/archive/{id}/restore",
    tag = "workorders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order restored", body = WorkOrder),
        (status = 400, description = "An active work order with this id already exists"),
        (status = 404, description = "Not found in archive")
    )
)]
pub async fn restore_work_order(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<WorkOrder>> {
    actor.require_role(Role::SUPERVISORS)?;
    let work_order = state.services.work_orders.restore(id).await?;
    Ok(Json(work_order))
}
