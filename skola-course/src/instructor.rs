use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event-type prefix for instructor events. They ride the course topic, so
/// consumers on `course_events` dispatch on this prefix too.
pub const INSTRUCTOR_ENTITY: &str = "instructor";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instructor {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub biography: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Instructor {
    pub fn from_draft(id: i64, draft: &InstructorDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            biography: draft.biography.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create payload carried inside an `instructor.created` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub biography: String,
}

/// Field-mask update payload for instructors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstructorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
}

impl InstructorPatch {
    pub fn apply(&self, instructor: &mut Instructor) {
        if let Some(name) = &self.name {
            instructor.name = name.clone();
        }
        if let Some(email) = &self.email {
            instructor.email = email.clone();
        }
        if let Some(biography) = &self.biography {
            instructor.biography = biography.clone();
        }
        instructor.updated_at = Utc::now();
    }
}
