use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event-type prefix for the class family (`class.created` etc.).
pub const ENTITY: &str = "class";

/// A scheduled session of a course, run by one instructor for one company.
///
/// The company/course/instructor/class-type columns are plain foreign keys;
/// nothing checks the referenced rows exist before an event is published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company_id: i64,
    pub course_id: i64,
    pub instructor_id: i64,
    pub class_type_id: Option<i64>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub max_participants: i32,
    pub current_enrolled: i32,
    pub waitlist_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Class {
    /// Materializes the row a draft describes, with `id` assigned by the store.
    pub fn from_draft(id: i64, draft: &ClassDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            company_id: draft.company_id,
            course_id: draft.course_id,
            instructor_id: draft.instructor_id,
            class_type_id: draft.class_type_id,
            scheduled_at: draft.scheduled_at,
            duration_minutes: draft.duration_minutes,
            max_participants: draft.max_participants,
            current_enrolled: draft.current_enrolled,
            waitlist_enabled: draft.waitlist_enabled,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create payload carried inside a `class.created` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub company_id: i64,
    pub course_id: i64,
    pub instructor_id: i64,
    pub class_type_id: Option<i64>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub max_participants: i32,
    #[serde(default)]
    pub current_enrolled: i32,
    #[serde(default)]
    pub waitlist_enabled: bool,
}

/// Field-mask update payload: absent fields leave the row untouched, present
/// fields overwrite, zero values included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_type_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_enrolled: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_enabled: Option<bool>,
}

impl ClassPatch {
    /// In-memory application of the mask, mirroring what the store does in SQL.
    pub fn apply(&self, class: &mut Class) {
        if let Some(title) = &self.title {
            class.title = title.clone();
        }
        if let Some(description) = &self.description {
            class.description = description.clone();
        }
        if let Some(company_id) = self.company_id {
            class.company_id = company_id;
        }
        if let Some(course_id) = self.course_id {
            class.course_id = course_id;
        }
        if let Some(instructor_id) = self.instructor_id {
            class.instructor_id = instructor_id;
        }
        if let Some(class_type_id) = self.class_type_id {
            class.class_type_id = Some(class_type_id);
        }
        if let Some(scheduled_at) = self.scheduled_at {
            class.scheduled_at = scheduled_at;
        }
        if let Some(duration_minutes) = self.duration_minutes {
            class.duration_minutes = duration_minutes;
        }
        if let Some(max_participants) = self.max_participants {
            class.max_participants = max_participants;
        }
        if let Some(current_enrolled) = self.current_enrolled {
            class.current_enrolled = current_enrolled;
        }
        if let Some(waitlist_enabled) = self.waitlist_enabled {
            class.waitlist_enabled = waitlist_enabled;
        }
        class.updated_at = Utc::now();
    }
}
