use async_trait::async_trait;

/// Fire-and-forget publisher for entity events. The API handlers publish
/// through this and answer before any consumer applies the change.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Forwards an unprocessable message to a dead-letter topic, original
    /// bytes untouched, with the failure reason attached to the record.
    async fn publish_dead_letter(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        reason: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Terminal outcome of handling one consumed message. `Poison` and `Failed`
/// carry the failure reason and are routed to the topic's dead-letter twin;
/// the consumer loop commits the offset only once that forward, when one is
/// due, has succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// Mutation applied to the store.
    Applied,
    /// Recognized but intentionally not applied (duplicate event id,
    /// unknown event type, missing target row). Logged, never dead-lettered.
    Skipped,
    /// Message cannot be decoded.
    Poison(String),
    /// Apply kept failing after retries.
    Failed(String),
}

impl Handled {
    pub fn is_dead_letter(&self) -> bool {
        self.dead_letter_reason().is_some()
    }

    /// The reason to attach to the dead-letter forward, when one is due.
    pub fn dead_letter_reason(&self) -> Option<&str> {
        match self {
            Handled::Poison(reason) | Handled::Failed(reason) => Some(reason),
            Handled::Applied | Handled::Skipped => None,
        }
    }
}

/// One topic's message handler, driven by the consumer loop.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, payload: &[u8]) -> Handled;
}
