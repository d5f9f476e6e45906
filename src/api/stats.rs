//! Dashboard endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult, models::schedule::MaintenanceSchedule, services::stats::DashboardStats,
    AppState,
};

use super::AuthenticatedUser;

/// Top-level dashboard counters
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats)
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.stats.dashboard().await?;
    Ok(Json(stats))
}

/// Schedules already due (at most ten, soonest first)
#[utoipa::path(
    get,
    path = "/dashboard/alerts",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Due schedules", body = Vec<MaintenanceSchedule>)
    )
)]
pub async fn alerts(
    State(state): State<AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
) -> AppResult<Json<Vec<MaintenanceSchedule>>> {
    let alerts = state.services.stats.alerts().await?;
    Ok(Json(alerts))
}
