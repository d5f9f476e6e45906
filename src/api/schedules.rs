//! Maintenance schedule endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{
        schedule::{
            MaintenanceSchedule, MaintenanceStats, ScheduleHistoryEntry, ScheduleInput,
            ScheduleWithStatus,
        },
        user::Role,
    },
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

#[derive(Deserialize, utoipa::IntoParams)]
pub struct HistoryQuery {
    /// Restrict the history to one machine
    pub machine_id: Option<i64>,
}

/// List all schedules with days left and urgency
#[utoipa::path(
    get,
    path = "/schedules",
    tag = "schedules",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Schedules with urgency", body = Vec<ScheduleWithStatus>)
    )
)]
pub async fn list_schedules(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
) -> AppResult<Json<Vec<ScheduleWithStatus>>> {
    let schedules = state.services.schedules.list_with_status().await?;
    Ok(Json(schedules))
}

/// Get a single schedule
#[utoipa::path(
    get,
    path = "/schedules/{id}",
    tag = "schedules",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule", body = MaintenanceSchedule),
        (status = 404, description = "Schedule not found")
    )
)]
pub async fn get_schedule(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MaintenanceSchedule>> {
    let schedule = state.services.schedules.get(id).await?;
    Ok(Json(schedule))
}

/// Create a schedule; the due date is derived from `last_done` and
/// `frequency_days`
#[utoipa::path(
    post,
    path = "/schedules",
    tag = "schedules",
    security(("bearer_auth" = [])),
    request_body = ScheduleInput,
    responses(
        (status = 201, description = "Schedule created", body = MaintenanceSchedule),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn create_schedule(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(request): Json<ScheduleInput>,
) -> AppResult<(StatusCode, Json<MaintenanceSchedule>)> {
    actor.require_role(Role::SUPERVISORS)?;
    let schedule = state
        .services
        .schedules
        .create(&actor.username, request)
        .await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

/// Replace a schedule; the due date is re-derived
#[utoipa::path(
    put,
    path = "/schedules/{id}",
    tag = "schedules",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Schedule ID")),
    request_body = ScheduleInput,
    responses(
        (status = 200, description = "Schedule updated", body = MaintenanceSchedule),
        (status = 404, description = "Schedule not found")
    )
)]
pub async fn update_schedule(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<ScheduleInput>,
) -> AppResult<Json<MaintenanceSchedule>> {
    actor.require_role(Role::SUPERVISORS)?;
    let schedule = state.services.schedules.update(id, request).await?;
    Ok(Json(schedule))
}

/// Delete a schedule
#[utoipa::path(
    delete,
    path = "/schedules/{id}",
    tag = "schedules",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule deleted", body = MessageResponse),
        (status = 404, description = "Schedule not found")
    )
)]
pub async fn delete_schedule(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    actor.require_role(Role::SUPERVISORS)?;
    state.services.schedules.delete(id).await?;
    Ok(Json(MessageResponse::new("Schedule deleted")))
}

/// Aggregate urgency counts over all schedules
#[utoipa::path(
    get,
    path = "/maintenance-stats",
    tag = "schedules",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Schedule statistics", body = MaintenanceStats)
    )
)]
pub async fn maintenance_stats(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
) -> AppResult<Json<MaintenanceStats>> {
    let stats = state.services.schedules.stats().await?;
    Ok(Json(stats))
}

/// Completion history, most recently done first
#[utoipa::path(
    get,
    path = "/maintenance-history",
    tag = "schedules",
    security(("bearer_auth" = [])),
    params(HistoryQuery),
    responses(
        (status = 200, description = "Schedule history", body = Vec<ScheduleHistoryEntry>)
    )
)]
pub async fn maintenance_history(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<ScheduleHistoryEntry>>> {
    let history = state.services.schedules.history(query.machine_id).await?;
    Ok(Json(history))
}
