use std::sync::Arc;

use axum::{http::Method, routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod classes;
pub mod courses;
pub mod error;
pub mod instructors;
pub mod paths;
pub mod state;
pub mod workers;

pub use state::AppState;

use skola_store::app_config::Config;
use skola_store::{
    DbClient, EventProducer, StoreClassRepository, StoreCoursePathRepository,
    StoreCourseRepository, StoreError, StoreInstructorRepository,
};

/// Everything a service binary needs after the shared boot sequence.
pub struct Bootstrap {
    pub config: Config,
    pub state: AppState,
    pub producer: EventProducer,
}

/// Loads config, connects the store, runs migrations, and wires Kafka.
/// All three service binaries start here; each then keeps only the router
/// and consumer it owns.
pub async fn bootstrap() -> Result<Bootstrap, StoreError> {
    let config = Config::load()?;

    let db = DbClient::new(&config.database.url).await?;
    db.migrate().await?;

    let producer = EventProducer::new(&config.kafka.brokers)?;

    let state = AppState {
        producer: Arc::new(producer.clone()),
        classes: Arc::new(StoreClassRepository::new(db.pool.clone())),
        courses: Arc::new(StoreCourseRepository::new(db.pool.clone())),
        instructors: Arc::new(StoreInstructorRepository::new(db.pool.clone())),
        paths: Arc::new(StoreCoursePathRepository::new(db.pool.clone())),
    };

    Ok(Bootstrap {
        config,
        state,
        producer,
    })
}

pub fn class_app(state: AppState) -> Router {
    service_router(classes::routes(), state)
}

/// Courses and instructors share a service and a topic.
pub fn course_app(state: AppState) -> Router {
    service_router(courses::routes().merge(instructors::routes()), state)
}

pub fn path_app(state: AppState) -> Router {
    service_router(paths::routes(), state)
}

fn service_router(routes: Router<AppState>, state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .merge(routes)
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
