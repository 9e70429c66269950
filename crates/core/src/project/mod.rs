//! Project aggregate and its persistent store.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteProjectStore;
pub use store::{NewProject, ProjectError, ProjectStore};
pub use types::{FileCategory, FileRef, Project};
