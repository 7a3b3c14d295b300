use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event-type prefix for path events (`course_path.created` etc.).
pub const ENTITY: &str = "course_path";

/// One course inside a path. `position` orders the steps; `mandatory` marks
/// whether the course can be skipped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathStep {
    pub course_id: i64,
    pub position: i32,
    #[serde(default)]
    pub mandatory: bool,
}

/// An ordered sequence of courses forming a curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoursePath {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub steps: Vec<PathStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CoursePath {
    pub fn from_draft(id: i64, draft: &CoursePathDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            steps: draft.steps.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create payload carried inside a `course_path.created` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoursePathDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<PathStep>,
}

/// Field-mask update payload. A present `steps` replaces the whole sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoursePathPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<PathStep>>,
}

impl CoursePathPatch {
    pub fn apply(&self, path: &mut CoursePath) {
        if let Some(title) = &self.title {
            path.title = title.clone();
        }
        if let Some(description) = &self.description {
            path.description = description.clone();
        }
        if let Some(steps) = &self.steps {
            path.steps = steps.clone();
        }
        path.updated_at = Utc::now();
    }
}
