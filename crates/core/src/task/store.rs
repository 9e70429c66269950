//! Task storage trait.

use thiserror::Error;

use super::{Task, TaskKind};

/// Error type for task store operations.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Fields for a task about to be created.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: String,
    pub user_id: String,
    pub kind: TaskKind,
    pub prompt: Option<String>,
}

impl NewTask {
    pub fn new(project_id: &str, user_id: &str, kind: TaskKind, prompt: Option<String>) -> Self {
        Self {
            project_id: project_id.to_string(),
            user_id: user_id.to_string(),
            kind,
            prompt,
        }
    }
}

/// Trait for task storage backends.
///
/// Writes happen within one transaction per logical operation; in
/// particular `create_family` commits the whole fan-out atomically so a
/// dispatch failure can never leave a partially created family behind.
pub trait TaskStore: Send + Sync {
    /// Create a single root task.
    fn create(&self, task: NewTask) -> Result<Task, TaskError>;

    /// Atomically create a parent task plus one child per entry in
    /// `children`, each referencing the parent. Returns the parent and the
    /// children in input order.
    fn create_family(
        &self,
        parent: NewTask,
        children: Vec<NewTask>,
    ) -> Result<(Task, Vec<Task>), TaskError>;

    /// Get a task by id.
    fn get(&self, id: &str) -> Result<Option<Task>, TaskError>;

    /// All tasks of a project, newest first.
    fn get_by_project(&self, project_id: &str) -> Result<Vec<Task>, TaskError>;

    /// All children of a parent task.
    fn get_by_parent(&self, parent_id: &str) -> Result<Vec<Task>, TaskError>;

    /// Flip the done flag. Idempotent: marking an already-done task done
    /// again succeeds without effect.
    fn mark_done(&self, id: &str) -> Result<(), TaskError>;

    /// Add to a parent's subtask count.
    fn add_subtask_count(&self, id: &str, n: i64) -> Result<(), TaskError>;

    /// Delete every task belonging to a project.
    fn delete_by_project(&self, project_id: &str) -> Result<(), TaskError>;
}
