use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use skola_course::{
    CourseDraft, CoursePatch, InstructorDraft, InstructorPatch, COURSE_ENTITY, INSTRUCTOR_ENTITY,
};
use skola_core::{CourseRepository, EventHandler, Handled, InstructorRepository};
use skola_shared::{split_event_type, EventAction, RawEnvelope, COURSE_TOPIC};

use super::{apply_with_retries, decode_payload, RetryPolicy};

/// Applies `course.*` and `instructor.*` events, which share one topic.
pub struct CourseWorker {
    courses: Arc<dyn CourseRepository>,
    instructors: Arc<dyn InstructorRepository>,
    retry: RetryPolicy,
}

impl CourseWorker {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        instructors: Arc<dyn InstructorRepository>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            courses,
            instructors,
            retry,
        }
    }
}

#[async_trait]
impl EventHandler for CourseWorker {
    async fn handle(&self, payload: &[u8]) -> Handled {
        let envelope: RawEnvelope = match serde_json::from_slice(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Undecodable envelope on {}: {}", COURSE_TOPIC, e);
                return Handled::Poison(format!("undecodable envelope: {}", e));
            }
        };

        let label = format!("{} {}", envelope.event_type, envelope.event_id);

        let Some((entity, action)) = split_event_type(&envelope.event_type) else {
            warn!(
                "Ignoring unknown event type {:?} on {}",
                envelope.event_type, COURSE_TOPIC
            );
            return Handled::Skipped;
        };

        match (entity, action) {
            (COURSE_ENTITY, EventAction::Created) => {
                let draft: CourseDraft = match decode_payload(&envelope) {
                    Ok(draft) => draft,
                    Err(e) => {
                        error!("Undecodable payload for {}: {}", label, e);
                        return Handled::Poison(format!("undecodable payload: {}", e));
                    }
                };

                apply_with_retries(self.retry, &label, || {
                    self.courses.create(envelope.event_id, &draft)
                })
                .await
            }
            (COURSE_ENTITY, EventAction::Updated) => {
                let Some(id) = envelope.id else {
                    error!("Missing target id for {}", label);
                    return Handled::Poison("missing target id".to_string());
                };
                let patch: CoursePatch = match decode_payload(&envelope) {
                    Ok(patch) => patch,
                    Err(e) => {
                        error!("Undecodable payload for {}: {}", label, e);
                        return Handled::Poison(format!("undecodable payload: {}", e));
                    }
                };

                apply_with_retries(self.retry, &label, || {
                    self.courses.update(envelope.event_id, id, &patch)
                })
                .await
            }
            (COURSE_ENTITY, EventAction::Deleted) => {
                let Some(id) = envelope.id else {
                    error!("Missing target id for {}", label);
                    return Handled::Poison("missing target id".to_string());
                };

                apply_with_retries(self.retry, &label, || {
                    self.courses.delete(envelope.event_id, id)
                })
                .await
            }
            (INSTRUCTOR_ENTITY, EventAction::Created) => {
                let draft: InstructorDraft = match decode_payload(&envelope) {
                    Ok(draft) => draft,
                    Err(e) => {
                        error!("Undecodable payload for {}: {}", label, e);
                        return Handled::Poison(format!("undecodable payload: {}", e));
                    }
                };

                apply_with_retries(self.retry, &label, || {
                    self.instructors.create(envelope.event_id, &draft)
                })
                .await
            }
            (INSTRUCTOR_ENTITY, EventAction::Updated) => {
                let Some(id) = envelope.id else {
                    error!("Missing target id for {}", label);
                    return Handled::Poison("missing target id".to_string());
                };
                let patch: InstructorPatch = match decode_payload(&envelope) {
                    Ok(patch) => patch,
                    Err(e) => {
                        error!("Undecodable payload for {}: {}", label, e);
                        return Handled::Poison(format!("undecodable payload: {}", e));
                    }
                };

                apply_with_retries(self.retry, &label, || {
                    self.instructors.update(envelope.event_id, id, &patch)
                })
                .await
            }
            (INSTRUCTOR_ENTITY, EventAction::Deleted) => {
                let Some(id) = envelope.id else {
                    error!("Missing target id for {}", label);
                    return Handled::Poison("missing target id".to_string());
                };

                apply_with_retries(self.retry, &label, || {
                    self.instructors.delete(envelope.event_id, id)
                })
                .await
            }
            _ => {
                warn!(
                    "Ignoring unknown event type {:?} on {}",
                    envelope.event_type, COURSE_TOPIC
                );
                Handled::Skipped
            }
        }
    }
}
