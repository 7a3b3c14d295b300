pub mod app_config;
pub mod class_repo;
pub mod course_repo;
pub mod database;
pub mod events;
pub mod instructor_repo;
pub mod path_repo;

pub use class_repo::StoreClassRepository;
pub use course_repo::StoreCourseRepository;
pub use database::DbClient;
pub use events::{settle_message, EventConsumer, EventProducer};
pub use instructor_repo::StoreInstructorRepository;
pub use path_repo::StoreCoursePathRepository;

/// Infrastructure failure during startup wiring.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}
