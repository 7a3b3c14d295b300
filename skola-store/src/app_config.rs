use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub class: ServiceConfig,
    pub course: ServiceConfig,
    pub course_path: ServiceConfig,
}

/// Per-service HTTP settings; one block per deployable binary.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    /// Consumer group ids are `{group_prefix}-{service}`.
    pub group_prefix: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Layering: defaults, then the RUN_MODE file, then an untracked local
        // file, then SKOLA__-prefixed environment variables.
        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("SKOLA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
