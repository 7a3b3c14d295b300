pub mod models;

pub use models::{CoursePath, CoursePathDraft, CoursePathPatch, PathStep, ENTITY};
