use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skola_api::workers::{ClassWorker, RetryPolicy};
use skola_api::{bootstrap, class_app};
use skola_shared::CLASS_TOPIC;
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
    tracing::info!("Starting class service on port {}", boot.config.class.port);

    let group_id = format!("{}-class", boot.config.kafka.group_prefix);
    let consumer = EventConsumer::new(
        &boot.config.kafka.brokers,
        &group_id,
        CLASS_TOPIC,
        boot.producer.clone(),
    )
    .expect("Failed to create Kafka consumer");

    let worker = ClassWorker::new(boot.state.classes.clone(), RetryPolicy::default());
    tokio::spawn(consumer.run(worker));

    let app = class_app(boot.state);

    let addr = SocketAddr::from(([0, 0, 0, 0], boot.config.class.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
