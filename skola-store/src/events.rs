use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{Header, Message, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info, warn};

use skola_core::{EventHandler, EventPublisher, Handled};
use skola_shared::dlq_topic;

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    async fn send_record(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        headers: Option<OwnedHeaders>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut record = FutureRecord::to(topic).key(key).payload(payload);
        if let Some(headers) = headers {
            record = record.headers(headers);
        }

        match self
            .producer
            .send(record, Timeout::After(Duration::from_secs(0)))
            .await
        {
            Ok(delivery) => {
                info!(
                    "Sent message to {}/{}: partition {} offset {}",
                    topic, key, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(Box::new(e))
            }
        }
    }
}

#[async_trait]
impl EventPublisher for EventProducer {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.send_record(topic, key, payload, None).await
    }

    async fn publish_dead_letter(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        reason: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let headers = OwnedHeaders::new().insert(Header {
            key: "reason",
            value: Some(reason),
        });
        self.send_record(topic, key, payload, Some(headers)).await
    }
}

/// Forwards a dead-lettered outcome and reports whether the offset may be
/// committed. `Applied` and `Skipped` commit straight away; `Poison` and
/// `Failed` commit only once the message sits on the dead-letter topic with
/// its reason header. A failed forward holds the offset so the broker
/// redelivers the message.
pub async fn settle_message(
    publisher: &dyn EventPublisher,
    topic: &str,
    key: &str,
    payload: &[u8],
    outcome: &Handled,
) -> bool {
    let Some(reason) = outcome.dead_letter_reason() else {
        return true;
    };

    let dlq = dlq_topic(topic);
    warn!("Forwarding message to {}: {}", dlq, reason);
    match publisher.publish_dead_letter(&dlq, key, payload, reason).await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to forward message to {}: {}", dlq, e);
            false
        }
    }
}

/// One topic's draining loop. Auto-commit is off: the offset moves only after
/// the handler reaches a terminal outcome, so a crash mid-apply redelivers
/// and the dedup ledger turns the replay into a no-op.
pub struct EventConsumer {
    consumer: StreamConsumer,
    producer: EventProducer,
    topic: String,
}

impl EventConsumer {
    pub fn new(
        brokers: &str,
        group_id: &str,
        topic: &str,
        producer: EventProducer,
    ) -> Result<Self, rdkafka::error::KafkaError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()?;

        consumer.subscribe(&[topic])?;

        Ok(Self {
            consumer,
            producer,
            topic: topic.to_string(),
        })
    }

    /// Runs for process lifetime. Poison and repeatedly failing messages are
    /// forwarded to `<topic>.dlq` before their offset is committed, so the
    /// loop keeps draining behind a bad message. When the forward itself
    /// fails the offset stays put and the broker redelivers; the dedup
    /// ledger keeps the replayed apply harmless.
    pub async fn run<H: EventHandler>(self, handler: H) {
        info!("Consumer started, listening to {}...", self.topic);

        loop {
            match self.consumer.recv().await {
                Err(e) => error!("Kafka error on {}: {}", self.topic, e),
                Ok(m) => {
                    let payload = m.payload().unwrap_or_default();
                    let key = m
                        .key()
                        .map(|k| String::from_utf8_lossy(k).into_owned())
                        .unwrap_or_default();
                    let outcome = handler.handle(payload).await;

                    let commit =
                        settle_message(&self.producer, &self.topic, &key, payload, &outcome).await;
                    if !commit {
                        continue;
                    }

                    if let Err(e) = self.consumer.commit_message(&m, CommitMode::Async) {
                        error!("Failed to commit offset on {}: {}", self.topic, e);
                    }
                }
            }
        }
    }
}
