pub mod config;
pub mod db;
pub mod handlers;
pub mod models;

use axum::{
    routing::{delete, get},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state; handlers build their repositories from the pool
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<SqlitePool>,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            db_pool: Arc::new(pool),
        }
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/patients",
            get(handlers::list_patients).post(handlers::create_patient),
        )
        .route(
            "/api/patients/:id",
            get(handlers::get_patient)
                .put(handlers::update_patient)
                .delete(handlers::delete_patient),
        )
        .route(
            "/api/patients-in-need",
            get(handlers::list_patients_in_need).post(handlers::create_patient_in_need),
        )
        .route(
            "/api/patients-in-need/:id",
            get(handlers::get_patient_in_need)
                .put(handlers::update_patient_in_need)
                .delete(handlers::delete_patient_in_need),
        )
        .route(
            "/api/assignments",
            get(handlers::list_assignments).post(handlers::create_assignment),
        )
        .route("/api/assignments/:id", delete(handlers::delete_assignment))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
