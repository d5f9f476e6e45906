//! CMMS Server - Maintenance Management System
//!
//! REST API server for machines, components, preventive-maintenance
//! schedules and work orders.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cmms_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("cmms_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CMMS Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::postgres(pool.clone());
    let services = Services::new(repository, config.auth.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        db: pool,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users/:id", put(api::users::update_user))
        .route("/users/:id", delete(api::users::delete_user))
        // Machines
        .route("/machines", get(api::machines::list_machines))
        .route("/machines", post(api::machines::create_machine))
        .route("/machines/:id", get(api::machines::get_machine))
        .route("/machines/:id", put(api::machines::update_machine))
        .route("/machines/:id", delete(api::machines::delete_machine))
        // Components
        .route("/components", get(api::components::list_components))
        .route(
            "/machines/:id/components",
            get(api::components::list_machine_components),
        )
        .route(
            "/machines/:id/components",
            post(api::components::create_component),
        )
        .route("/components/:id", put(api::components::update_component))
        .route("/components/:id", delete(api::components::delete_component))
        // Work orders
        .route("/workorders", get(api::work_orders::list_work_orders))
        .route("/workorders", post(api::work_orders::create_work_order))
        .route(
            "/workorders/archive",
            get(api::work_orders::list_archived_work_orders),
        )
        .route(
            "/workorders/archive/:id/restore",
            post(api::work_orders::restore_work_order),
        )
        .route("/workorders/:id", get(api::work_orders::get_work_order))
        .route(
            "/workorders/:id",
            delete(api::work_orders::delete_work_order),
        )
        .route(
            "/workorders/:id/claim",
            post(api::work_orders::claim_work_order),
        )
        .route(
            "/workorders/:id/status",
            put(api::work_orders::update_work_order_status),
        )
        .route(
            "/workorders/:id/archive",
            post(api::work_orders::archive_work_order),
        )
        // Schedules
        .route("/schedules", get(api::schedules::list_schedules))
        .route("/schedules", post(api::schedules::create_schedule))
        .route("/schedules/:id", get(api::schedules::get_schedule))
        .route("/schedules/:id", put(api::schedules::update_schedule))
        .route("/schedules/:id", delete(api::schedules::delete_schedule))
        .route(
            "/maintenance-stats",
            get(api::schedules::maintenance_stats),
        )
        .route(
            "/maintenance-history",
            get(api::schedules::maintenance_history),
        )
        // Dashboard
        .route("/dashboard", get(api::stats::dashboard))
        .route("/dashboard/alerts", get(api::stats::alerts))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
