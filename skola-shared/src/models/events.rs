use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One durable topic per entity family. Instructor events ride the course
/// topic since both belong to the course service.
pub const CLASS_TOPIC: &str = "class_events";
pub const COURSE_TOPIC: &str = "course_events";
pub const COURSE_PATH_TOPIC: &str = "course_path_events";

/// Dead-letter companion of a family topic.
pub fn dlq_topic(topic: &str) -> String {
    format!("{}.dlq", topic)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Created => "created",
            EventAction::Updated => "updated",
            EventAction::Deleted => "deleted",
        }
    }
}

/// Builds an `{entity}.{action}` tag, e.g. `course.created`.
pub fn event_type(entity: &str, action: EventAction) -> String {
    format!("{}.{}", entity, action.as_str())
}

/// Splits a tag back into entity and action. `None` for anything that does
/// not follow the `{entity}.{action}` scheme; consumers treat that as an
/// unknown event type, not a parse failure.
pub fn split_event_type(tag: &str) -> Option<(&str, EventAction)> {
    let (entity, action) = tag.split_once('.')?;
    let action = match action {
        "created" => EventAction::Created,
        "updated" => EventAction::Updated,
        "deleted" => EventAction::Deleted,
        _ => return None,
    };
    Some((entity, action))
}

/// JSON wrapper carried by every broker message.
///
/// `payload` holds the draft (create) or patch (update) and is absent for
/// deletes; `id` names the target row for updates and deletes. `event_id` is
/// the dedup key: the store refuses to apply the same id twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<P> {
    pub event_id: Uuid,
    pub event_type: String,
    pub service_name: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<P>,
}

/// Envelope with the payload still undecoded. Consumers parse this first and
/// decode `payload` only after dispatching on `event_type`.
pub type RawEnvelope = EventEnvelope<serde_json::Value>;

impl<P> EventEnvelope<P> {
    pub fn created(service_name: &str, entity: &str, payload: P) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type(entity, EventAction::Created),
            service_name: service_name.to_string(),
            timestamp: Utc::now().timestamp(),
            id: None,
            payload: Some(payload),
        }
    }

    pub fn updated(service_name: &str, entity: &str, id: i64, payload: P) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type(entity, EventAction::Updated),
            service_name: service_name.to_string(),
            timestamp: Utc::now().timestamp(),
            id: Some(id),
            payload: Some(payload),
        }
    }
}

impl RawEnvelope {
    pub fn deleted(service_name: &str, entity: &str, id: i64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type(entity, EventAction::Deleted),
            service_name: service_name.to_string(),
            timestamp: Utc::now().timestamp(),
            id: Some(id),
            payload: None,
        }
    }
}

impl<P: Serialize> EventEnvelope<P> {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_round_trip() {
        let tag = event_type("course", EventAction::Updated);
        assert_eq!(tag, "course.updated");

        let (entity, action) = split_event_type(&tag).unwrap();
        assert_eq!(entity, "course");
        assert_eq!(action, EventAction::Updated);
    }

    #[test]
    fn test_split_rejects_unknown_tags() {
        assert!(split_event_type("course.archived").is_none());
        assert!(split_event_type("no_dot_here").is_none());
        assert!(split_event_type("").is_none());
    }

    #[test]
    fn test_delete_envelope_omits_payload() {
        let envelope = RawEnvelope::deleted("skola-course", "course", 7);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["event_type"], "course.deleted");
        assert_eq!(json["id"], 7);
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_envelope_tolerates_missing_optionals() {
        // A delete envelope off the wire has neither payload nor, for
        // malformed producers, an id.
        let raw = r#"{
            "event_id": "a2b4c61e-8c1e-4a32-9a70-57d5f1f2a111",
            "event_type": "class.deleted",
            "service_name": "skola-class",
            "timestamp": 1718000000
        }"#;

        let envelope: RawEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.event_type, "class.deleted");
        assert!(envelope.id.is_none());
        assert!(envelope.payload.is_none());
    }

    #[test]
    fn test_created_envelope_carries_payload() {
        let envelope =
            EventEnvelope::created("skola-course", "course", serde_json::json!({"title": "Go"}));
        let bytes = envelope.to_bytes().unwrap();
        let back: RawEnvelope = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(back.event_type, "course.created");
        assert_eq!(back.payload.unwrap()["title"], "Go");
        assert!(back.id.is_none());
    }
}
