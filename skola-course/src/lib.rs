pub mod course;
pub mod instructor;

pub use course::{Course, CourseDraft, CoursePatch, Tag, COURSE_ENTITY};
pub use instructor::{Instructor, InstructorDraft, InstructorPatch, INSTRUCTOR_ENTITY};
