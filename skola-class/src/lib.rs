pub mod models;

pub use models::{Class, ClassDraft, ClassPatch, ENTITY};
