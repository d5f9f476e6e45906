//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, components, health, machines, schedules, stats, users, work_orders};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CMMS API",
        version = "0.3.0",
        description = "Maintenance Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Users
        users::list_users,
        users::update_user,
        users::delete_user,
        // Machines
        machines::list_machines,
        machines::get_machine,
        machines::create_machine,
        machines::update_machine,
        machines::delete_machine,
        // Components
        components::list_components,
        components::list_machine_components,
        components::create_component,
        components::update_component,
        components::delete_component,
        // Work orders
        work_orders::list_work_orders,
        work_orders::create_work_order,
        work_orders::get_work_order,
        work_orders::delete_work_order,
        work_orders::claim_work_order,
        work_orders::update_work_order_status,
        work_orders::archive_work_order,
        work_orders::list_archived_work_orders,
        work_orders::restore_work_order,
        // Schedules
        schedules::list_schedules,
        schedules::get_schedule,
        schedules::create_schedule,
        schedules::update_schedule,
        schedules::delete_schedule,
        schedules::maintenance_stats,
        schedules::maintenance_history,
        // Dashboard
        stats::dashboard,
        stats::alerts,
    ),
    components(
        schemas(
            // Auth and users
            crate::models::user::UserInfo,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            crate::models::user::Role,
            // Machines
            crate::models::machine::Machine,
            crate::models::machine::CreateMachine,
            crate::models::machine::UpdateMachine,
            // Components
            crate::models::component::Component,
            crate::models::component::CreateComponent,
            crate::models::component::UpdateComponent,
            // Work orders
            crate::models::work_order::WorkOrder,
            crate::models::work_order::WorkOrderStatus,
            crate::models::work_order::WorkOrderSummary,
            crate::models::work_order::WorkOrderDetail,
            crate::models::work_order::HistoryEntry,
            crate::models::work_order::CreateWorkOrder,
            crate::models::work_order::UpdateStatus,
            // Schedules
            crate::models::schedule::MaintenanceSchedule,
            crate::models::schedule::ScheduleInput,
            crate::models::schedule::ScheduleWithStatus,
            crate::models::schedule::ScheduleHistoryEntry,
            crate::models::schedule::MaintenanceStats,
            crate::models::schedule::UrgencyBucket,
            // Dashboard
            crate::services::stats::DashboardStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management"),
        (name = "machines", description = "Machine management"),
        (name = "components", description = "Component management"),
        (name = "workorders", description = "Work order lifecycle"),
        (name = "schedules", description = "Preventive maintenance scheduling"),
        (name = "dashboard", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
