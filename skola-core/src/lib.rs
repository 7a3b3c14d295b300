pub mod events;
pub mod repository;

pub use events::{EventHandler, EventPublisher, Handled};
pub use repository::{
    ApplyOutcome, ClassRepository, CoursePathRepository, CourseRepository, InstructorRepository,
};
