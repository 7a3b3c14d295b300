pub mod models;

pub use models::events::{
    dlq_topic, event_type, split_event_type, EventAction, EventEnvelope, RawEnvelope,
    CLASS_TOPIC, COURSE_PATH_TOPIC, COURSE_TOPIC,
};
