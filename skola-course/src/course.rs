use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::instructor::Instructor;

/// Event-type prefix for the course family (`course.created` etc.).
pub const COURSE_ENTITY: &str = "course";

/// Free-form label attached to courses by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A course in the catalog. Courses nest one level: a root course carries its
/// sub-courses, a sub-course points back via `parent_course_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub enrollment_limit: i32,
    pub parent_course_id: Option<i64>,
    pub instructors: Vec<Instructor>,
    pub tags: Vec<Tag>,
    pub sub_courses: Vec<Course>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Materializes the row a draft describes, with `id` assigned by the
    /// store. Join collections (instructors, tags, sub-courses) resolve at
    /// read time, so they start empty here.
    pub fn from_draft(id: i64, draft: &CourseDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            enrollment_limit: draft.enrollment_limit,
            parent_course_id: draft.parent_course_id,
            instructors: Vec::new(),
            tags: Vec::new(),
            sub_courses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_course_id.is_none()
    }
}

/// Create payload carried inside a `course.created` envelope. Instructors are
/// linked by id, tags by name (missing tags are created on apply).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub enrollment_limit: i32,
    pub parent_course_id: Option<i64>,
    #[serde(default)]
    pub instructor_ids: Vec<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Field-mask update payload. Scalar fields overwrite when present;
/// `instructor_ids` and `tags` replace the whole join set when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoursePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_course_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl CoursePatch {
    /// In-memory application of the scalar part of the mask. Join-set
    /// replacement is the store's job.
    pub fn apply(&self, course: &mut Course) {
        if let Some(title) = &self.title {
            course.title = title.clone();
        }
        if let Some(description) = &self.description {
            course.description = description.clone();
        }
        if let Some(category) = &self.category {
            course.category = category.clone();
        }
        if let Some(enrollment_limit) = self.enrollment_limit {
            course.enrollment_limit = enrollment_limit;
        }
        if let Some(parent_course_id) = self.parent_course_id {
            course.parent_course_id = Some(parent_course_id);
        }
        course.updated_at = Utc::now();
    }
}
