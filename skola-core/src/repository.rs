use async_trait::async_trait;
use uuid::Uuid;

use skola_class::{Class, ClassDraft, ClassPatch};
use skola_course::{Course, CourseDraft, CoursePatch, Instructor, InstructorDraft, InstructorPatch};
use skola_path::{CoursePath, CoursePathDraft, CoursePathPatch};

/// Outcome of applying one event to the store. Every mutation records its
/// `event_id` in the same transaction, so replays surface as `Duplicate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Mutation committed; `id` is the affected row.
    Applied { id: i64 },
    /// This event id was already applied; nothing changed.
    Duplicate,
    /// Update or delete targeted a row that does not exist.
    Missing,
}

/// Repository trait for class data access
#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn create(
        &self,
        event_id: Uuid,
        draft: &ClassDraft,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &ClassPatch,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn delete(
        &self,
        event_id: Uuid,
        id: i64,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn list(&self) -> Result<Vec<Class>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get(&self, id: i64)
        -> Result<Option<Class>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for course data access. `list` returns root courses with
/// instructors, tags and one level of sub-courses resolved.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(
        &self,
        event_id: Uuid,
        draft: &CourseDraft,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &CoursePatch,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn delete(
        &self,
        event_id: Uuid,
        id: i64,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn list(&self) -> Result<Vec<Course>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get(
        &self,
        id: i64,
    ) -> Result<Option<Course>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for instructor data access
#[async_trait]
pub trait InstructorRepository: Send + Sync {
    async fn create(
        &self,
        event_id: Uuid,
        draft: &InstructorDraft,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &InstructorPatch,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn delete(
        &self,
        event_id: Uuid,
        id: i64,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn list(&self) -> Result<Vec<Instructor>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get(
        &self,
        id: i64,
    ) -> Result<Option<Instructor>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for course-path data access. Reads resolve the ordered
/// step sequence.
#[async_trait]
pub trait CoursePathRepository: Send + Sync {
    async fn create(
        &self,
        event_id: Uuid,
        draft: &CoursePathDraft,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &CoursePathPatch,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn delete(
        &self,
        event_id: Uuid,
        id: i64,
    ) -> Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn list(&self) -> Result<Vec<CoursePath>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get(
        &self,
        id: i64,
    ) -> Result<Option<CoursePath>, Box<dyn std::error::Error + Send + Sync>>;
}
