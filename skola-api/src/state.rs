use std::sync::Arc;

use skola_core::{
    ClassRepository, CoursePathRepository, CourseRepository, EventPublisher, InstructorRepository,
};

/// Shared handler state. Trait objects throughout so tests can swap in
/// in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    pub producer: Arc<dyn EventPublisher>,
    pub classes: Arc<dyn ClassRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub instructors: Arc<dyn InstructorRepository>,
    pub paths: Arc<dyn CoursePathRepository>,
}
