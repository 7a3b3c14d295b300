use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use skola_class::{ClassDraft, ClassPatch, ENTITY};
use skola_core::{ClassRepository, EventHandler, Handled};
use skola_shared::{split_event_type, EventAction, RawEnvelope, CLASS_TOPIC};

use super::{apply_with_retries, decode_payload, RetryPolicy};

/// Applies `class.*` events from the class topic.
pub struct ClassWorker {
    repo: Arc<dyn ClassRepository>,
    retry: RetryPolicy,
}

impl ClassWorker {
    pub fn new(repo: Arc<dyn ClassRepository>, retry: RetryPolicy) -> Self {
        Self { repo, retry }
    }
}

#[async_trait]
impl EventHandler for ClassWorker {
    async fn handle(&self, payload: &[u8]) -> Handled {
        let envelope: RawEnvelope = match serde_json::from_slice(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Undecodable envelope on {}: {}", CLASS_TOPIC, e);
                return Handled::Poison(format!("undecodable envelope: {}", e));
            }
        };

        let label = format!("{} {}", envelope.event_type, envelope.event_id);

        let action = match split_event_type(&envelope.event_type) {
            Some((entity, action)) if entity == ENTITY => action,
            _ => {
                warn!(
                    "Ignoring unknown event type {:?} on {}",
                    envelope.event_type, CLASS_TOPIC
                );
                return Handled::Skipped;
            }
        };

        match action {
            EventAction::Created => {
                let draft: ClassDraft = match decode_payload(&envelope) {
                    Ok(draft) => draft,
                    Err(e) => {
                        error!("Undecodable payload for {}: {}", label, e);
                        return Handled::Poison(format!("undecodable payload: {}", e));
                    }
                };

                apply_with_retries(self.retry, &label, || {
                    self.repo.create(envelope.event_id, &draft)
                })
                .await
            }
            EventAction::Updated => {
                let Some(id) = envelope.id else {
                    error!("Missing target id for {}", label);
                    return Handled::Poison("missing target id".to_string());
                };
                let patch: ClassPatch = match decode_payload(&envelope) {
                    Ok(patch) => patch,
                    Err(e) => {
                        error!("Undecodable payload for {}: {}", label, e);
                        return Handled::Poison(format!("undecodable payload: {}", e));
                    }
                };

                apply_with_retries(self.retry, &label, || {
                    self.repo.update(envelope.event_id, id, &patch)
                })
                .await
            }
            EventAction::Deleted => {
                let Some(id) = envelope.id else {
                    error!("Missing target id for {}", label);
                    return Handled::Poison("missing target id".to_string());
                };

                apply_with_retries(self.retry, &label, || {
                    self.repo.delete(envelope.event_id, id)
                })
                .await
            }
        }
    }
}
