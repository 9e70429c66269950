//! SQLite-backed project store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{FileCategory, FileRef, NewProject, Project, ProjectError, ProjectStore};

/// SQLite-backed project store.
pub struct SqliteProjectStore {
    conn: Mutex<Connection>,
}

impl SqliteProjectStore {
    /// Open (creating tables if needed) at the given path.
    pub fn new(path: &Path) -> Result<Self, ProjectError> {
        let conn = Connection::open(path).map_err(|e| ProjectError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, for tests.
    pub fn in_memory() -> Result<Self, ProjectError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ProjectError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ProjectError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                origin_file_id TEXT,
                origin_file_name TEXT,
                origin_file_category TEXT,
                transcription_file TEXT,
                summary_file TEXT,
                frames_extracted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_projects_user ON projects(user_id);
            "#,
        )
        .map_err(|e| ProjectError::Database(e.to_string()))?;
        Ok(())
    }

    fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
        let origin_id: Option<String> = row.get(4)?;
        let origin_name: Option<String> = row.get(5)?;
        let origin_category: Option<String> = row.get(6)?;

        let origin_file = match (origin_id, origin_name, origin_category) {
            (Some(id), Some(name), Some(category)) => {
                let category = FileCategory::parse(&category).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        format!("unknown file category: {}", category).into(),
                    )
                })?;
                Some(FileRef { id, name, category })
            }
            _ => None,
        };

        let created_at: String = row.get(10)?;
        let updated_at: String = row.get(11)?;

        Ok(Project {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            origin_file,
            transcription_file: row.get(7)?,
            summary_file: row.get(8)?,
            frames_extracted: row.get::<_, i64>(9)? != 0,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    }

    /// Run a set-once column update; `guard` is the SQL predicate the row
    /// must satisfy for the write to be legal (the column still unset).
    fn set_once(
        &self,
        id: &str,
        field: &'static str,
        sql: &str,
        value: Option<&str>,
    ) -> Result<(), ProjectError> {
        let conn = self.conn.lock().unwrap();

        let exists: Option<String> = conn
            .query_row("SELECT id FROM projects WHERE id = ?1", params![id], |r| {
                r.get(0)
            })
            .optional()
            .map_err(|e| ProjectError::Database(e.to_string()))?;
        if exists.is_none() {
            return Err(ProjectError::NotFound(id.to_string()));
        }

        let now = Utc::now().to_rfc3339();
        let changed = match value {
            Some(v) => conn
                .execute(sql, params![id, v, now])
                .map_err(|e| ProjectError::Database(e.to_string()))?,
            None => conn
                .execute(sql, params![id, now])
                .map_err(|e| ProjectError::Database(e.to_string()))?,
        };

        if changed == 0 {
            return Err(ProjectError::AlreadySet {
                project_id: id.to_string(),
                field,
            });
        }
        Ok(())
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

const SELECT_COLS: &str = "id, user_id, name, description, origin_file_id, origin_file_name, \
     origin_file_category, transcription_file, summary_file, frames_extracted, created_at, updated_at";

impl ProjectStore for SqliteProjectStore {
    fn create(&self, new: NewProject) -> Result<Project, ProjectError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let project = Project {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            name: new.name,
            description: new.description,
            origin_file: None,
            transcription_file: None,
            summary_file: None,
            frames_extracted: false,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO projects (id, user_id, name, description, frames_extracted, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
            params![
                project.id,
                project.user_id,
                project.name,
                project.description,
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| ProjectError::Database(e.to_string()))?;

        Ok(project)
    }

    fn get(&self, id: &str) -> Result<Option<Project>, ProjectError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", SELECT_COLS);
        conn.query_row(&sql, params![id], Self::row_to_project)
            .optional()
            .map_err(|e| ProjectError::Database(e.to_string()))
    }

    fn list_by_user(&self, user_id: &str) -> Result<Vec<Project>, ProjectError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM projects WHERE user_id = ?1 ORDER BY created_at DESC",
            SELECT_COLS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ProjectError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id], Self::row_to_project)
            .map_err(|e| ProjectError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ProjectError::Database(e.to_string()))
    }

    fn update(&self, id: &str, name: &str, description: &str) -> Result<(), ProjectError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE projects SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
                params![id, name, description, Utc::now().to_rfc3339()],
            )
            .map_err(|e| ProjectError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(ProjectError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), ProjectError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])
            .map_err(|e| ProjectError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(ProjectError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn set_origin_file(&self, id: &str, file: &FileRef) -> Result<(), ProjectError> {
        let conn = self.conn.lock().unwrap();

        let exists: Option<String> = conn
            .query_row("SELECT id FROM projects WHERE id = ?1", params![id], |r| {
                r.get(0)
            })
            .optional()
            .map_err(|e| ProjectError::Database(e.to_string()))?;
        if exists.is_none() {
            return Err(ProjectError::NotFound(id.to_string()));
        }

        let changed = conn
            .execute(
                "UPDATE projects SET origin_file_id = ?2, origin_file_name = ?3,
                 origin_file_category = ?4, updated_at = ?5
                 WHERE id = ?1 AND origin_file_id IS NULL",
                params![
                    id,
                    file.id,
                    file.name,
                    file.category.as_str(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| ProjectError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(ProjectError::AlreadySet {
                project_id: id.to_string(),
                field: "origin file",
            });
        }
        Ok(())
    }

    fn set_transcription_file(&self, id: &str, file_id: &str) -> Result<(), ProjectError> {
        self.set_once(
            id,
            "transcription",
            "UPDATE projects SET transcription_file = ?2, updated_at = ?3
             WHERE id = ?1 AND transcription_file IS NULL",
            Some(file_id),
        )
    }

    fn set_summary_file(&self, id: &str, file_id: &str) -> Result<(), ProjectError> {
        self.set_once(
            id,
            "summary",
            "UPDATE projects SET summary_file = ?2, updated_at = ?3
             WHERE id = ?1 AND summary_file IS NULL",
            Some(file_id),
        )
    }

    fn set_frames_extracted(&self, id: &str) -> Result<(), ProjectError> {
        self.set_once(
            id,
            "extracted frames",
            "UPDATE projects SET frames_extracted = 1, updated_at = ?2
             WHERE id = ?1 AND frames_extracted = 0",
            None,
        )
    }
}
