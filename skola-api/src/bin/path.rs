use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skola_api::workers::{PathWorker, RetryPolicy};
use skola_api::{bootstrap, path_app};
use skola_shared::COURSE_PATH_TOPIC;
use skola_store::EventConsumer;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skola_api=debug,skola_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let boot = bootstrap().await.expect("Failed to initialize service");
    tracing::info!(
        "Starting course path service on port {}",
        boot.config.course_path.port
    );

    let group_id = format!("{}-course-path", boot.config.kafka.group_prefix);
    let consumer = EventConsumer::new(
        &boot.config.kafka.brokers,
        &group_id,
        COURSE_PATH_TOPIC,
        boot.producer.clone(),
    )
    .expect("Failed to create Kafka consumer");

    let worker = PathWorker::new(boot.state.paths.clone(), RetryPolicy::default());
    tokio::spawn(consumer.run(worker));

    let app = path_app(boot.state);

    let addr = SocketAddr::from(([0, 0, 0, 0], boot.config.course_path.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
