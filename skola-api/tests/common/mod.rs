//! In-memory fakes for exercising routers and workers without Kafka or
//! Postgres. The fakes mirror the store's dedup contract: every mutation
//! consumes its event id first, so replays surface as `Duplicate`.

// Shared by several test binaries; not every helper is used in each.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use skola_api::AppState;
use skola_class::{Class, ClassDraft, ClassPatch};
use skola_core::{
    ApplyOutcome, ClassRepository, CoursePathRepository, CourseRepository, EventPublisher,
    InstructorRepository,
};
use skola_course::{Course, CourseDraft, CoursePatch, Instructor, InstructorDraft, InstructorPatch};
use skola_path::{CoursePath, CoursePathDraft, CoursePathPatch, PathStep};
use skola_shared::RawEnvelope;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Publisher
// ============================================================================

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: String,
    pub bytes: Vec<u8>,
    // Set only on dead-letter forwards.
    pub reason: Option<String>,
}

/// Captures published messages instead of talking to Kafka.
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<PublishedMessage>>,
}

impl RecordingPublisher {
    pub fn count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    pub fn envelopes(&self) -> Vec<RawEnvelope> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|m| serde_json::from_slice(&m.bytes).unwrap())
            .collect()
    }

    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), BoxError> {
        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            bytes: payload.to_vec(),
            reason: None,
        });
        Ok(())
    }

    async fn publish_dead_letter(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        reason: &str,
    ) -> Result<(), BoxError> {
        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            bytes: payload.to_vec(),
            reason: Some(reason.to_string()),
        });
        Ok(())
    }
}

/// Publisher whose sends always fail, for the offset-holding path.
#[derive(Default)]
pub struct FailingPublisher {
    pub calls: AtomicU32,
}

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _topic: &str, _key: &str, _payload: &[u8]) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err("broker unreachable".into())
    }

    async fn publish_dead_letter(
        &self,
        _topic: &str,
        _key: &str,
        _payload: &[u8],
        _reason: &str,
    ) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err("broker unreachable".into())
    }
}

// ============================================================================
// Repositories
// ============================================================================

#[derive(Default)]
pub struct InMemoryClasses {
    rows: Mutex<HashMap<i64, Class>>,
    seen: Mutex<HashSet<Uuid>>,
    next_id: AtomicI64,
}

impl InMemoryClasses {
    pub fn insert(&self, class: Class) {
        self.next_id.fetch_max(class.id, Ordering::SeqCst);
        self.rows.lock().unwrap().insert(class.id, class);
    }

    pub fn row(&self, id: i64) -> Option<Class> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn consume(&self, event_id: Uuid) -> bool {
        self.seen.lock().unwrap().insert(event_id)
    }
}

#[async_trait]
impl ClassRepository for InMemoryClasses {
    async fn create(&self, event_id: Uuid, draft: &ClassDraft) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows
            .lock()
            .unwrap()
            .insert(id, Class::from_draft(id, draft));
        Ok(ApplyOutcome::Applied { id })
    }

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &ClassPatch,
    ) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        match self.rows.lock().unwrap().get_mut(&id) {
            Some(class) => {
                patch.apply(class);
                Ok(ApplyOutcome::Applied { id })
            }
            None => Ok(ApplyOutcome::Missing),
        }
    }

    async fn delete(&self, event_id: Uuid, id: i64) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        match self.rows.lock().unwrap().remove(&id) {
            Some(_) => Ok(ApplyOutcome::Applied { id }),
            None => Ok(ApplyOutcome::Missing),
        }
    }

    async fn list(&self) -> Result<Vec<Class>, BoxError> {
        let mut data: Vec<Class> = self.rows.lock().unwrap().values().cloned().collect();
        data.sort_by_key(|c| c.id);
        Ok(data)
    }

    async fn get(&self, id: i64) -> Result<Option<Class>, BoxError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCourses {
    rows: Mutex<HashMap<i64, Course>>,
    // instructor ids and tag names linked to each course
    links: Mutex<HashMap<i64, (Vec<i64>, Vec<String>)>>,
    seen: Mutex<HashSet<Uuid>>,
    next_id: AtomicI64,
}

impl InMemoryCourses {
    pub fn insert(&self, course: Course) {
        self.next_id.fetch_max(course.id, Ordering::SeqCst);
        self.links.lock().unwrap().entry(course.id).or_default();
        self.rows.lock().unwrap().insert(course.id, course);
    }

    pub fn row(&self, id: i64) -> Option<Course> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn links(&self, id: i64) -> Option<(Vec<i64>, Vec<String>)> {
        self.links.lock().unwrap().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn consume(&self, event_id: Uuid) -> bool {
        self.seen.lock().unwrap().insert(event_id)
    }

    fn with_children(&self, rows: &HashMap<i64, Course>, mut course: Course) -> Course {
        course.sub_courses = rows
            .values()
            .filter(|c| c.parent_course_id == Some(course.id))
            .cloned()
            .collect();
        course.sub_courses.sort_by_key(|c| c.id);
        course
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourses {
    async fn create(&self, event_id: Uuid, draft: &CourseDraft) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.links
            .lock()
            .unwrap()
            .insert(id, (draft.instructor_ids.clone(), draft.tags.clone()));
        self.rows
            .lock()
            .unwrap()
            .insert(id, Course::from_draft(id, draft));
        Ok(ApplyOutcome::Applied { id })
    }

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &CoursePatch,
    ) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        let mut rows = self.rows.lock().unwrap();
        let Some(course) = rows.get_mut(&id) else {
            return Ok(ApplyOutcome::Missing);
        };
        patch.apply(course);

        let mut links = self.links.lock().unwrap();
        let entry = links.entry(id).or_default();
        if let Some(instructor_ids) = &patch.instructor_ids {
            entry.0 = instructor_ids.clone();
        }
        if let Some(tags) = &patch.tags {
            entry.1 = tags.clone();
        }
        Ok(ApplyOutcome::Applied { id })
    }

    async fn delete(&self, event_id: Uuid, id: i64) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.remove(&id) {
            Some(_) => {
                // Orphaned sub-courses become roots, like the FK's SET NULL.
                for course in rows.values_mut() {
                    if course.parent_course_id == Some(id) {
                        course.parent_course_id = None;
                    }
                }
                self.links.lock().unwrap().remove(&id);
                Ok(ApplyOutcome::Applied { id })
            }
            None => Ok(ApplyOutcome::Missing),
        }
    }

    async fn list(&self) -> Result<Vec<Course>, BoxError> {
        let rows = self.rows.lock().unwrap();
        let mut data: Vec<Course> = rows
            .values()
            .filter(|c| c.is_root())
            .cloned()
            .map(|course| self.with_children(&rows, course))
            .collect();
        data.sort_by_key(|c| c.id);
        Ok(data)
    }

    async fn get(&self, id: i64) -> Result<Option<Course>, BoxError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(&id)
            .cloned()
            .map(|course| self.with_children(&rows, course)))
    }
}

#[derive(Default)]
pub struct InMemoryInstructors {
    rows: Mutex<HashMap<i64, Instructor>>,
    seen: Mutex<HashSet<Uuid>>,
    next_id: AtomicI64,
}

impl InMemoryInstructors {
    pub fn insert(&self, instructor: Instructor) {
        self.next_id.fetch_max(instructor.id, Ordering::SeqCst);
        self.rows.lock().unwrap().insert(instructor.id, instructor);
    }

    pub fn row(&self, id: i64) -> Option<Instructor> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn consume(&self, event_id: Uuid) -> bool {
        self.seen.lock().unwrap().insert(event_id)
    }
}

#[async_trait]
impl InstructorRepository for InMemoryInstructors {
    async fn create(
        &self,
        event_id: Uuid,
        draft: &InstructorDraft,
    ) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows
            .lock()
            .unwrap()
            .insert(id, Instructor::from_draft(id, draft));
        Ok(ApplyOutcome::Applied { id })
    }

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &InstructorPatch,
    ) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        match self.rows.lock().unwrap().get_mut(&id) {
            Some(instructor) => {
                patch.apply(instructor);
                Ok(ApplyOutcome::Applied { id })
            }
            None => Ok(ApplyOutcome::Missing),
        }
    }

    async fn delete(&self, event_id: Uuid, id: i64) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        match self.rows.lock().unwrap().remove(&id) {
            Some(_) => Ok(ApplyOutcome::Applied { id }),
            None => Ok(ApplyOutcome::Missing),
        }
    }

    async fn list(&self) -> Result<Vec<Instructor>, BoxError> {
        let mut data: Vec<Instructor> = self.rows.lock().unwrap().values().cloned().collect();
        data.sort_by_key(|i| i.id);
        Ok(data)
    }

    async fn get(&self, id: i64) -> Result<Option<Instructor>, BoxError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryPaths {
    rows: Mutex<HashMap<i64, CoursePath>>,
    seen: Mutex<HashSet<Uuid>>,
    next_id: AtomicI64,
}

impl InMemoryPaths {
    pub fn insert(&self, path: CoursePath) {
        self.next_id.fetch_max(path.id, Ordering::SeqCst);
        self.rows.lock().unwrap().insert(path.id, path);
    }

    pub fn row(&self, id: i64) -> Option<CoursePath> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn consume(&self, event_id: Uuid) -> bool {
        self.seen.lock().unwrap().insert(event_id)
    }
}

#[async_trait]
impl CoursePathRepository for InMemoryPaths {
    async fn create(
        &self,
        event_id: Uuid,
        draft: &CoursePathDraft,
    ) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows
            .lock()
            .unwrap()
            .insert(id, CoursePath::from_draft(id, draft));
        Ok(ApplyOutcome::Applied { id })
    }

    async fn update(
        &self,
        event_id: Uuid,
        id: i64,
        patch: &CoursePathPatch,
    ) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        match self.rows.lock().unwrap().get_mut(&id) {
            Some(path) => {
                patch.apply(path);
                Ok(ApplyOutcome::Applied { id })
            }
            None => Ok(ApplyOutcome::Missing),
        }
    }

    async fn delete(&self, event_id: Uuid, id: i64) -> Result<ApplyOutcome, BoxError> {
        if !self.consume(event_id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        match self.rows.lock().unwrap().remove(&id) {
            Some(_) => Ok(ApplyOutcome::Applied { id }),
            None => Ok(ApplyOutcome::Missing),
        }
    }

    async fn list(&self) -> Result<Vec<CoursePath>, BoxError> {
        let mut data: Vec<CoursePath> = self.rows.lock().unwrap().values().cloned().collect();
        data.sort_by_key(|p| p.id);
        Ok(data)
    }

    async fn get(&self, id: i64) -> Result<Option<CoursePath>, BoxError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }
}

/// Always errors, counting calls, for exercising the retry budget.
#[derive(Default)]
pub struct FailingClasses {
    pub calls: AtomicU32,
}

#[async_trait]
impl ClassRepository for FailingClasses {
    async fn create(&self, _event_id: Uuid, _draft: &ClassDraft) -> Result<ApplyOutcome, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err("connection refused".into())
    }

    async fn update(
        &self,
        _event_id: Uuid,
        _id: i64,
        _patch: &ClassPatch,
    ) -> Result<ApplyOutcome, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err("connection refused".into())
    }

    async fn delete(&self, _event_id: Uuid, _id: i64) -> Result<ApplyOutcome, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err("connection refused".into())
    }

    async fn list(&self) -> Result<Vec<Class>, BoxError> {
        Err("connection refused".into())
    }

    async fn get(&self, _id: i64) -> Result<Option<Class>, BoxError> {
        Err("connection refused".into())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub state: AppState,
    pub publisher: Arc<RecordingPublisher>,
    pub classes: Arc<InMemoryClasses>,
    pub courses: Arc<InMemoryCourses>,
    pub instructors: Arc<InMemoryInstructors>,
    pub paths: Arc<InMemoryPaths>,
}

pub fn harness() -> Harness {
    let publisher = Arc::new(RecordingPublisher::default());
    let classes = Arc::new(InMemoryClasses::default());
    let courses = Arc::new(InMemoryCourses::default());
    let instructors = Arc::new(InMemoryInstructors::default());
    let paths = Arc::new(InMemoryPaths::default());

    let state = AppState {
        producer: publisher.clone(),
        classes: classes.clone(),
        courses: courses.clone(),
        instructors: instructors.clone(),
        paths: paths.clone(),
    };

    Harness {
        state,
        publisher,
        classes,
        courses,
        instructors,
        paths,
    }
}

// ============================================================================
// Sample payloads
// ============================================================================

pub fn class_draft(title: &str) -> ClassDraft {
    ClassDraft {
        title: title.to_string(),
        description: "Hands-on session".to_string(),
        company_id: 1,
        course_id: 2,
        instructor_id: 3,
        class_type_id: None,
        scheduled_at: Utc::now(),
        duration_minutes: 60,
        max_participants: 15,
        current_enrolled: 0,
        waitlist_enabled: false,
    }
}

pub fn course_draft(title: &str) -> CourseDraft {
    CourseDraft {
        title: title.to_string(),
        description: String::new(),
        category: "engineering".to_string(),
        enrollment_limit: 30,
        parent_course_id: None,
        instructor_ids: Vec::new(),
        tags: Vec::new(),
    }
}

pub fn instructor_draft(name: &str) -> InstructorDraft {
    InstructorDraft {
        name: name.to_string(),
        email: format!("{}@skola.dev", name.to_lowercase().replace(' ', ".")),
        biography: String::new(),
    }
}

pub fn path_draft(title: &str) -> CoursePathDraft {
    CoursePathDraft {
        title: title.to_string(),
        description: String::new(),
        steps: vec![
            PathStep {
                course_id: 1,
                position: 1,
                mandatory: true,
            },
            PathStep {
                course_id: 2,
                position: 2,
                mandatory: false,
            },
        ],
    }
}

// ============================================================================
// Request helpers
// ============================================================================

pub fn json_request(
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> http::Request<axum::body::Body> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> http::Request<axum::body::Body> {
    http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

pub async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
