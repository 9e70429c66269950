//! Pipeline task records and their persistent store.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTaskStore;
pub use store::{NewTask, TaskError, TaskStore};
pub use types::{Task, TaskKind};
