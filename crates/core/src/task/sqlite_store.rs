//! SQLite-backed task store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{NewTask, Task, TaskError, TaskKind, TaskStore};

/// SQLite-backed task store.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Open (creating tables if needed) at the given path.
    pub fn new(path: &Path) -> Result<Self, TaskError> {
        let conn = Connection::open(path).map_err(|e| TaskError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, for tests.
    pub fn in_memory() -> Result<Self, TaskError> {
        let conn = Connection::open_in_memory().map_err(|e| TaskError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TaskError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                prompt TEXT,
                parent_id TEXT,
                done INTEGER NOT NULL DEFAULT 0,
                subtask_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_id);
            "#,
        )
        .map_err(|e| TaskError::Database(e.to_string()))?;
        Ok(())
    }

    fn insert_task(
        conn: &Connection,
        new: &NewTask,
        parent_id: Option<&str>,
    ) -> Result<Task, TaskError> {
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: new.project_id.clone(),
            user_id: new.user_id.clone(),
            kind: new.kind,
            prompt: new.prompt.clone(),
            parent_id: parent_id.map(String::from),
            done: false,
            subtask_count: 0,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO tasks (id, project_id, user_id, kind, prompt, parent_id, done, subtask_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, ?7)",
            params![
                task.id,
                task.project_id,
                task.user_id,
                task.kind.as_str(),
                task.prompt,
                task.parent_id,
                task.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| TaskError::Database(e.to_string()))?;

        Ok(task)
    }

    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let kind_str: String = row.get(3)?;
        let created_at_str: String = row.get(8)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Task {
            id: row.get(0)?,
            project_id: row.get(1)?,
            user_id: row.get(2)?,
            kind: TaskKind::parse(&kind_str).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    format!("unknown task kind: {}", kind_str).into(),
                )
            })?,
            prompt: row.get(4)?,
            parent_id: row.get(5)?,
            done: row.get::<_, i64>(6)? != 0,
            subtask_count: row.get(7)?,
            created_at,
        })
    }
}

const SELECT_COLS: &str =
    "id, project_id, user_id, kind, prompt, parent_id, done, subtask_count, created_at";

impl TaskStore for SqliteTaskStore {
    fn create(&self, task: NewTask) -> Result<Task, TaskError> {
        let conn = self.conn.lock().unwrap();
        Self::insert_task(&conn, &task, None)
    }

    fn create_family(
        &self,
        parent: NewTask,
        children: Vec<NewTask>,
    ) -> Result<(Task, Vec<Task>), TaskError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| TaskError::Database(e.to_string()))?;

        let parent_task = Self::insert_task(&tx, &parent, None)?;
        let mut child_tasks = Vec::with_capacity(children.len());
        for child in &children {
            child_tasks.push(Self::insert_task(&tx, child, Some(&parent_task.id))?);
        }

        tx.commit().map_err(|e| TaskError::Database(e.to_string()))?;
        Ok((parent_task, child_tasks))
    }

    fn get(&self, id: &str) -> Result<Option<Task>, TaskError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", SELECT_COLS);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TaskError::Database(e.to_string()))?;

        let mut rows = stmt
            .query_map(params![id], Self::row_to_task)
            .map_err(|e| TaskError::Database(e.to_string()))?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(|e| TaskError::Database(e.to_string()))?)),
            None => Ok(None),
        }
    }

    fn get_by_project(&self, project_id: &str) -> Result<Vec<Task>, TaskError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM tasks WHERE project_id = ?1 ORDER BY created_at DESC",
            SELECT_COLS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TaskError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![project_id], Self::row_to_task)
            .map_err(|e| TaskError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TaskError::Database(e.to_string()))
    }

    fn get_by_parent(&self, parent_id: &str) -> Result<Vec<Task>, TaskError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM tasks WHERE parent_id = ?1 ORDER BY created_at",
            SELECT_COLS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TaskError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![parent_id], Self::row_to_task)
            .map_err(|e| TaskError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TaskError::Database(e.to_string()))
    }

    fn mark_done(&self, id: &str) -> Result<(), TaskError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute("UPDATE tasks SET done = 1 WHERE id = ?1", params![id])
            .map_err(|e| TaskError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(TaskError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn add_subtask_count(&self, id: &str, n: i64) -> Result<(), TaskError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE tasks SET subtask_count = subtask_count + ?2 WHERE id = ?1",
                params![id, n],
            )
            .map_err(|e| TaskError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(TaskError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete_by_project(&self, project_id: &str) -> Result<(), TaskError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM tasks WHERE project_id = ?1", params![project_id])
            .map_err(|e| TaskError::Database(e.to_string()))?;
        Ok(())
    }
}
