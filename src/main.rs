use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod lifecycle;
mod middleware;
mod schedule;
mod services;

use handlers::AppState;
use middleware::jwt_auth_middleware;
use schedule::GeminiGenerator;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, GEMINI_API_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = crate::config::config();
    tracing::info!("Starting Rota API in {:?} mode", config.environment);

    let state = AppState {
        generator: Arc::new(GeminiGenerator::from_config()),
    };

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("ROTA_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Rota API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/auth", auth_routes())
        .nest("/api/users", user_routes())
        .nest("/api/profile", profile_routes())
        .nest("/api/preferences", preference_routes())
        .nest("/api/shifts", shift_routes())
        .nest("/api/ai-schedule", ai_schedule_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/register", post(auth::register))
        .route("/me", get(auth::me).route_layer(from_fn(jwt_auth_middleware)))
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        // Fixed paths registered before the parameterized ones
        .route("/managers", get(users::managers))
        .route("/managers/:manager_id/staff", get(users::staff_by_manager))
        .route("/assign", post(users::assign))
        .route("/:staff_id/assign-manager", put(users::assign_manager))
        .route("/:staff_id/manager", delete(users::remove_manager))
        .route("/", get(users::list).post(users::create))
        .route(
            "/:id",
            get(users::get).put(users::update).delete(users::deactivate),
        )
        .route_layer(from_fn(jwt_auth_middleware))
}

fn profile_routes() -> Router<AppState> {
    use handlers::profile;

    Router::new()
        .route("/", get(profile::get).put(profile::update))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn preference_routes() -> Router<AppState> {
    use handlers::preferences;

    Router::new()
        .route("/staff", get(preferences::staff))
        .route("/:user_id", get(preferences::get).put(preferences::update))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn shift_routes() -> Router<AppState> {
    use handlers::shifts;

    Router::new()
        .route("/", get(shifts::list).post(shifts::create))
        .route("/my-shifts", get(shifts::my_shifts))
        .route("/propose-preview", post(shifts::propose_preview))
        .route("/propose-save", post(shifts::propose_save))
        .route(
            "/:id",
            get(shifts::get).put(shifts::update).delete(shifts::delete),
        )
        .route("/:id/assign", post(shifts::assign))
        .route("/:id/status", post(shifts::status))
        .route("/:id/approve", post(shifts::approve))
        .route("/:id/cancel", post(shifts::cancel))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn ai_schedule_routes() -> Router<AppState> {
    use handlers::ai_schedule;

    Router::new()
        .route("/generate", post(ai_schedule::generate))
        .route("/preview", post(ai_schedule::preview))
        .route("/save-preview", post(ai_schedule::save_preview))
        .route("/stats", get(ai_schedule::stats))
        .route_layer(from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Rota API",
            "version": version,
            "description": "Staff scheduling backend with AI-assisted planning",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth",
                "users": "/api/users",
                "profile": "/api/profile",
                "preferences": "/api/preferences",
                "shifts": "/api/shifts",
                "ai_schedule": "/api/ai-schedule"
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
