//! Key namespace builders for the status cache.
//!
//! All ephemeral state is namespaced by kind so that prefix scans stay
//! cheap and unrelated entries never collide.

use crate::task::TaskKind;

/// Marker for an in-flight task of a given kind on a project.
pub fn active_task(project_id: &str, kind: TaskKind) -> String {
    format!("active_task:{}:{}", project_id, kind.as_str())
}

/// Prefix matching every active-task marker of a project.
pub fn active_task_prefix(project_id: &str) -> String {
    format!("active_task:{}:", project_id)
}

/// Latest progress fraction reported by the worker for a task.
pub fn task_progress(task_id: &str) -> String {
    format!("task_progress:{}", task_id)
}

/// Terminal error payload for a task.
pub fn task_error(task_id: &str) -> String {
    format!("task_error:{}", task_id)
}

/// Done marker for a task.
pub fn task_done(task_id: &str) -> String {
    format!("task_done:{}", task_id)
}

/// Marker bumped whenever the set of tasks of a project changes.
pub fn project_tasks_changed(project_id: &str) -> String {
    format!("project_tasks_changed:{}", project_id)
}

/// Marker bumped on project metadata edits; the value is the editing
/// user's id so viewers can suppress their own echo.
pub fn project_changed(project_id: &str) -> String {
    format!("project_changed:{}", project_id)
}

/// Live collaborative document bytes, keyed per writer.
pub fn doc_bytes(project_id: &str, user_id: &str) -> String {
    format!("doc_bytes:{}:{}", project_id, user_id)
}

/// Prefix matching every writer's document bytes for a project.
pub fn doc_bytes_prefix(project_id: &str) -> String {
    format!("doc_bytes:{}:", project_id)
}

/// Extract the writer's user id back out of a `doc_bytes` key.
pub fn doc_bytes_writer<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix).filter(|rest| !rest.is_empty())
}

/// Extract the task kind back out of an `active_task` key.
pub fn active_task_kind(key: &str, prefix: &str) -> Option<TaskKind> {
    key.strip_prefix(prefix).and_then(TaskKind::parse)
}
